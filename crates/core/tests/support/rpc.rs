//! Recording fake of the remote RPC client

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use listsync_core::{
    ListRpcClient, RemoteError, RemoteResult, RemovalFlags, SubscribeFlags, SubscribeRequest,
};
use listsync_domain::constants::DEFAULT_PING_SENTINEL;
use listsync_domain::{
    BatchError, BatchErrorCode, BatchResult, EmailType, ListSummary, MemberInfo, MergeVar,
    MergedFields,
};
use tokio::sync::Mutex;

pub const LIST_ID: &str = "list-1";

/// One call received by [`MockListRpc`].
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Ping,
    Subscribe(SubscribeRequest),
    Unsubscribe { address: String, flags: RemovalFlags },
    BatchSubscribe { records: Vec<MergedFields>, flags: SubscribeFlags },
    BatchUnsubscribe { addresses: Vec<String>, flags: RemovalFlags },
    MemberInfo(String),
    UpdateMember { address: String, merges: MergedFields, email_type: Option<EmailType> },
    MergeVars,
    Lists,
}

/// In-memory remote list.
///
/// Every call is recorded. Replies default to a healthy service that accepts
/// everything; individual addresses or calls can be scripted to fail.
pub struct MockListRpc {
    calls: Mutex<Vec<RpcCall>>,
    ping: Mutex<RemoteResult<String>>,
    scripted_pings: Mutex<VecDeque<RemoteResult<String>>>,
    subscribe_replies: Mutex<HashMap<String, RemoteResult<bool>>>,
    unsubscribe_replies: Mutex<HashMap<String, RemoteResult<bool>>>,
    batch_faults: Mutex<HashMap<String, i32>>,
    batch_error: Mutex<Option<RemoteError>>,
    update_reply: Mutex<RemoteResult<bool>>,
    members: Mutex<HashMap<String, MemberInfo>>,
}

impl Default for MockListRpc {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            ping: Mutex::new(Ok(DEFAULT_PING_SENTINEL.to_string())),
            scripted_pings: Mutex::new(VecDeque::new()),
            subscribe_replies: Mutex::new(HashMap::new()),
            unsubscribe_replies: Mutex::new(HashMap::new()),
            batch_faults: Mutex::new(HashMap::new()),
            batch_error: Mutex::new(None),
            update_reply: Mutex::new(Ok(true)),
            members: Mutex::new(HashMap::new()),
        }
    }
}

impl MockListRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose ping times out.
    pub fn unreachable() -> Self {
        Self {
            ping: Mutex::new(Err(RemoteError::transport(28, "operation timed out"))),
            ..Self::default()
        }
    }

    pub async fn set_ping(&self, reply: RemoteResult<String>) {
        *self.ping.lock().await = reply;
    }

    /// Answer the next ping with `reply`, then fall back to the standing
    /// reply.
    pub async fn push_ping(&self, reply: RemoteResult<String>) {
        self.scripted_pings.lock().await.push_back(reply);
    }

    pub async fn set_subscribe_reply(&self, address: &str, reply: RemoteResult<bool>) {
        self.subscribe_replies.lock().await.insert(address.to_string(), reply);
    }

    pub async fn set_unsubscribe_reply(&self, address: &str, reply: RemoteResult<bool>) {
        self.unsubscribe_replies.lock().await.insert(address.to_string(), reply);
    }

    /// Make batch calls report `address` as failed with `code`.
    pub async fn set_batch_fault(&self, address: &str, code: i32) {
        self.batch_faults.lock().await.insert(address.to_string(), code);
    }

    /// Make every batch call fail with `error`.
    pub async fn fail_batches(&self, error: RemoteError) {
        *self.batch_error.lock().await = Some(error);
    }

    pub async fn set_update_reply(&self, reply: RemoteResult<bool>) {
        *self.update_reply.lock().await = reply;
    }

    pub async fn add_member(&self, address: &str, status: &str) {
        let member = MemberInfo {
            email: address.to_string(),
            status: status.to_string(),
            ..MemberInfo::default()
        };
        self.members.lock().await.insert(address.to_string(), member);
    }

    pub async fn calls(&self) -> Vec<RpcCall> {
        self.calls.lock().await.clone()
    }

    /// Calls other than `ping`.
    pub async fn remote_calls(&self) -> Vec<RpcCall> {
        self.calls().await.into_iter().filter(|call| *call != RpcCall::Ping).collect()
    }

    pub async fn subscribe_calls(&self) -> Vec<SubscribeRequest> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                RpcCall::Subscribe(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Sizes of the batch subscribe and batch unsubscribe calls, in order.
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                RpcCall::BatchSubscribe { records, .. } => Some(records.len()),
                RpcCall::BatchUnsubscribe { addresses, .. } => Some(addresses.len()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: RpcCall) {
        self.calls.lock().await.push(call);
    }

    async fn batch_result<'a>(
        &self,
        addresses: impl Iterator<Item = &'a str> + Send,
    ) -> RemoteResult<BatchResult> {
        if let Some(error) = self.batch_error.lock().await.clone() {
            return Err(error);
        }
        let faults = self.batch_faults.lock().await;
        let mut result = BatchResult::new();
        for address in addresses {
            match faults.get(address) {
                Some(code) => result.record_error(BatchError {
                    code: BatchErrorCode::Fault(*code),
                    message: "rejected".to_string(),
                    address: Some(address.to_string()),
                }),
                None => result.record_success(),
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl ListRpcClient for MockListRpc {
    fn list_id(&self) -> &str {
        LIST_ID
    }

    async fn ping(&self) -> RemoteResult<String> {
        self.record(RpcCall::Ping).await;
        if let Some(reply) = self.scripted_pings.lock().await.pop_front() {
            return reply;
        }
        self.ping.lock().await.clone()
    }

    async fn list_subscribe(&self, request: &SubscribeRequest) -> RemoteResult<bool> {
        self.record(RpcCall::Subscribe(request.clone())).await;
        self.subscribe_replies.lock().await.get(&request.address).cloned().unwrap_or(Ok(true))
    }

    async fn list_unsubscribe(&self, address: &str, flags: RemovalFlags) -> RemoteResult<bool> {
        self.record(RpcCall::Unsubscribe { address: address.to_string(), flags }).await;
        self.unsubscribe_replies.lock().await.get(address).cloned().unwrap_or(Ok(true))
    }

    async fn list_batch_subscribe(
        &self,
        records: &[MergedFields],
        flags: SubscribeFlags,
    ) -> RemoteResult<BatchResult> {
        self.record(RpcCall::BatchSubscribe { records: records.to_vec(), flags }).await;
        let addresses = records.iter().map(|record| {
            record.get("EMAIL").and_then(|value| value.as_text()).unwrap_or_default()
        });
        self.batch_result(addresses).await
    }

    async fn list_batch_unsubscribe(
        &self,
        addresses: &[String],
        flags: RemovalFlags,
    ) -> RemoteResult<BatchResult> {
        self.record(RpcCall::BatchUnsubscribe { addresses: addresses.to_vec(), flags }).await;
        self.batch_result(addresses.iter().map(String::as_str)).await
    }

    async fn list_member_info(&self, address: &str) -> RemoteResult<MemberInfo> {
        self.record(RpcCall::MemberInfo(address.to_string())).await;
        self.members
            .lock()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| RemoteError::fault(232, "There is no record of that email"))
    }

    async fn list_update_member(
        &self,
        address: &str,
        merges: &MergedFields,
        email_type: Option<EmailType>,
        _replace_interests: bool,
    ) -> RemoteResult<bool> {
        self.record(RpcCall::UpdateMember {
            address: address.to_string(),
            merges: merges.clone(),
            email_type,
        })
        .await;
        self.update_reply.lock().await.clone()
    }

    async fn list_merge_vars(&self) -> RemoteResult<Vec<MergeVar>> {
        self.record(RpcCall::MergeVars).await;
        Ok(vec![MergeVar {
            name: "Email Address".to_string(),
            tag: "EMAIL".to_string(),
            req: true,
            field_type: Some("email".to_string()),
        }])
    }

    async fn lists(&self) -> RemoteResult<Vec<ListSummary>> {
        self.record(RpcCall::Lists).await;
        Ok(vec![
            ListSummary { id: "other".to_string(), name: "Other".to_string(), member_count: 3 },
            ListSummary { id: LIST_ID.to_string(), name: "Newsletter".to_string(), member_count: 42 },
        ])
    }
}
