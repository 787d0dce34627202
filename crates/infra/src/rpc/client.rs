//! `ListRpcClient` over JSON-over-HTTP

use std::time::Duration;

use async_trait::async_trait;
use listsync_core::{
    ListRpcClient, RemoteError, RemoteResult, RemovalFlags, SubscribeFlags, SubscribeRequest,
};
use listsync_domain::constants::FAULT_NOT_FOUND;
use listsync_domain::{
    BatchResult, EmailType, ListSummary, ListSyncError, MemberInfo, MergeVar, MergedFields,
    RemoteConfig, Result, TransportErrorCodes,
};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use super::errors::{fault_from, transport_error};
use super::wire::{
    BatchSubscribeReply, BatchUnsubscribeReply, ListsReply, MemberEntry, MemberInfoReply,
};
use crate::http::HttpClient;

/// Remote list client.
///
/// Holds the API key and list id for its lifetime; no call is retried.
pub struct JsonRpcListClient {
    http: HttpClient,
    endpoint: Url,
    api_key: String,
    list_id: String,
    transport_codes: TransportErrorCodes,
}

impl JsonRpcListClient {
    /// Build a client with its own HTTP transport from `config`.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(config: &RemoteConfig, http: HttpClient) -> Result<Self> {
        let endpoint = Url::parse(&config.api_url)
            .map_err(|e| ListSyncError::Config(format!("Invalid remote.api_url: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            list_id: config.list_id.clone(),
            transport_codes: config.transport_codes,
        })
    }

    /// Issue one RPC call and decode its result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Map<String, Value>) -> RemoteResult<T> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("method", method).append_pair("output", "json");

        let mut body = Map::with_capacity(params.len() + 1);
        body.insert("apikey".to_string(), Value::String(self.api_key.clone()));
        body.extend(params);

        let builder = self.http.request(Method::POST, url).json(&body);
        let response = self
            .http
            .send(builder)
            .await
            .map_err(|err| transport_error(err, &self.transport_codes))?;
        let status = response.status();
        let text =
            response.text().await.map_err(|err| transport_error(err, &self.transport_codes))?;

        let value: Value = serde_json::from_str(&text).map_err(|err| {
            RemoteError::Protocol(format!("{method}: HTTP {status} with non-JSON body: {err}"))
        })?;
        if let Some(fault) = fault_from(&value) {
            debug!(method, code = ?fault.fault_code(), "rpc.fault");
            return Err(fault);
        }
        if !status.is_success() {
            return Err(RemoteError::Protocol(format!("{method}: HTTP {status}")));
        }

        serde_json::from_value(value).map_err(|err| {
            RemoteError::Protocol(format!("{method}: unexpected response shape: {err}"))
        })
    }

    /// Parameters for a call on the configured list.
    fn list_params(&self, extra: Value) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("id".to_string(), Value::String(self.list_id.clone()));
        if let Value::Object(extra) = extra {
            params.extend(extra);
        }
        params
    }
}

fn removal_params(flags: RemovalFlags) -> Value {
    json!({
        "delete_member": flags.delete_member,
        "send_goodbye": flags.send_goodbye,
        "send_notify": flags.send_notify,
    })
}

fn merge_params(extra: Value, more: Value) -> Value {
    match (extra, more) {
        (Value::Object(mut left), Value::Object(right)) => {
            left.extend(right);
            Value::Object(left)
        }
        (left, _) => left,
    }
}

#[async_trait]
impl ListRpcClient for JsonRpcListClient {
    fn list_id(&self) -> &str {
        &self.list_id
    }

    async fn ping(&self) -> RemoteResult<String> {
        self.call("ping", Map::new()).await
    }

    #[instrument(skip(self, request), fields(address = %request.address))]
    async fn list_subscribe(&self, request: &SubscribeRequest) -> RemoteResult<bool> {
        let params = self.list_params(json!({
            "email_address": request.address,
            "merge_vars": request.merges,
            "email_type": request.email_type.as_code(),
            "double_optin": request.flags.double_opt_in,
            "update_existing": request.flags.update_existing,
            "replace_interests": request.flags.replace_interests,
            "send_welcome": request.send_welcome,
        }));
        self.call("listSubscribe", params).await
    }

    #[instrument(skip(self, flags))]
    async fn list_unsubscribe(&self, address: &str, flags: RemovalFlags) -> RemoteResult<bool> {
        let params = self.list_params(merge_params(
            json!({ "email_address": address }),
            removal_params(flags),
        ));
        self.call("listUnsubscribe", params).await
    }

    #[instrument(skip_all, fields(count = records.len()))]
    async fn list_batch_subscribe(
        &self,
        records: &[MergedFields],
        flags: SubscribeFlags,
    ) -> RemoteResult<BatchResult> {
        let params = self.list_params(json!({
            "batch": records,
            "double_optin": flags.double_opt_in,
            "update_existing": flags.update_existing,
            "replace_interests": flags.replace_interests,
        }));
        let reply: BatchSubscribeReply = self.call("listBatchSubscribe", params).await?;
        Ok(reply.into())
    }

    #[instrument(skip_all, fields(count = addresses.len()))]
    async fn list_batch_unsubscribe(
        &self,
        addresses: &[String],
        flags: RemovalFlags,
    ) -> RemoteResult<BatchResult> {
        let params =
            self.list_params(merge_params(json!({ "emails": addresses }), removal_params(flags)));
        let reply: BatchUnsubscribeReply = self.call("listBatchUnsubscribe", params).await?;
        Ok(reply.into())
    }

    async fn list_member_info(&self, address: &str) -> RemoteResult<MemberInfo> {
        let params = self.list_params(json!({ "email_address": [address] }));
        let reply: MemberInfoReply = self.call("listMemberInfo", params).await?;

        let mut lookup_error = None;
        for entry in reply.data {
            match entry {
                MemberEntry::Found(member) if !member.status.is_empty() => return Ok(member),
                MemberEntry::Found(_) => {}
                MemberEntry::Missing(error) => {
                    lookup_error.get_or_insert(error);
                }
            }
        }
        Err(lookup_error.map_or_else(
            || RemoteError::fault(FAULT_NOT_FOUND, format!("no member record for {address}")),
            |error| RemoteError::fault(error.code.unwrap_or(FAULT_NOT_FOUND), error.error),
        ))
    }

    async fn list_update_member(
        &self,
        address: &str,
        merges: &MergedFields,
        email_type: Option<EmailType>,
        replace_interests: bool,
    ) -> RemoteResult<bool> {
        let params = self.list_params(json!({
            "email_address": address,
            "merge_vars": merges,
            "email_type": email_type.map_or("", |kind| kind.as_code()),
            "replace_interests": replace_interests,
        }));
        self.call("listUpdateMember", params).await
    }

    async fn list_merge_vars(&self) -> RemoteResult<Vec<MergeVar>> {
        self.call("listMergeVars", self.list_params(Value::Null)).await
    }

    async fn lists(&self) -> RemoteResult<Vec<ListSummary>> {
        let reply: ListsReply = self.call("lists", Map::new()).await?;
        Ok(reply.data.into_iter().map(ListSummary::from).collect())
    }
}
