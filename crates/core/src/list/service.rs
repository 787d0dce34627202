//! List service: single and batch operations with queue fallback

use std::sync::Arc;

use async_trait::async_trait;
use listsync_domain::constants::{DEFAULT_BATCH_SIZE, DEFAULT_PING_SENTINEL};
use listsync_domain::{
    BatchError, BatchOutcome, BatchResult, Config, EmailType, ListSummary, MemberInfo, MergeVar,
    MergedFields, Outcome, QueuedSubscriber, SubscribeOptions, SubscriberInfo, TransportErrorCodes,
};
use tracing::{debug, error, info, instrument, warn};

use super::batch;
use super::classifier::{Disposition, RequestClassifier, RequestKind};
use super::errors::{ListError, RemoteResult};
use super::merge::{FieldMap, FieldOverrides};
use super::ports::{ListRpcClient, MailingList, RemovalFlags, SubscribeFlags, SubscribeRequest};
use crate::queue::SubscriptionQueue;

/// Construction-time settings of a [`ListService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListServiceConfig {
    pub options: SubscribeOptions,
    pub batch_size: usize,
    pub ping_sentinel: String,
    pub transport_codes: TransportErrorCodes,
}

impl Default for ListServiceConfig {
    fn default() -> Self {
        Self {
            options: SubscribeOptions::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            ping_sentinel: DEFAULT_PING_SENTINEL.to_string(),
            transport_codes: TransportErrorCodes::default(),
        }
    }
}

impl From<&Config> for ListServiceConfig {
    fn from(config: &Config) -> Self {
        Self {
            options: config.subscribe.clone(),
            batch_size: config.reconcile.batch_size,
            ping_sentinel: config.remote.ping_sentinel.clone(),
            transport_codes: config.remote.transport_codes,
        }
    }
}

/// [`MailingList`] implementation on top of a [`ListRpcClient`].
///
/// With a queue attached, requests that cannot reach the remote service are
/// written to the queue and reported as [`Outcome::Queued`].
pub struct ListService {
    client: Arc<dyn ListRpcClient>,
    queue: Option<Arc<dyn SubscriptionQueue>>,
    options: SubscribeOptions,
    field_map: FieldMap,
    classifier: RequestClassifier,
    batch_size: usize,
    ping_sentinel: String,
}

impl ListService {
    pub fn new(client: Arc<dyn ListRpcClient>, config: ListServiceConfig) -> Self {
        Self {
            client,
            queue: None,
            field_map: FieldMap::with_overrides(&config.options.field_overrides),
            options: config.options,
            classifier: RequestClassifier::new(config.transport_codes),
            batch_size: config.batch_size.max(1),
            ping_sentinel: config.ping_sentinel,
        }
    }

    /// Attach the durable queue used when the remote service is unreachable.
    #[must_use]
    pub fn with_queue(mut self, queue: Arc<dyn SubscriptionQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn options(&self) -> &SubscribeOptions {
        &self.options
    }

    pub fn set_double_opt_in(&mut self, enabled: bool) {
        self.options.double_opt_in = enabled;
    }

    pub fn set_update_existing(&mut self, enabled: bool) {
        self.options.update_existing = enabled;
    }

    pub fn set_replace_interests(&mut self, enabled: bool) {
        self.options.replace_interests = enabled;
    }

    pub fn set_email_type(&mut self, email_type: EmailType) {
        self.options.email_type = email_type;
    }

    /// Update an existing member's merge fields.
    ///
    /// No availability check and no queue fallback: any remote error is
    /// returned to the caller. The member's email type is left unchanged.
    #[instrument(skip(self, info, overrides), fields(address = %address))]
    pub async fn update_member_info(
        &self,
        address: &str,
        info: &SubscriberInfo,
        overrides: &FieldOverrides,
    ) -> Result<Outcome, ListError> {
        let merges = self.field_map.merge(info, overrides);
        let accepted = self
            .client
            .list_update_member(address, &merges, None, self.options.replace_interests)
            .await
            .map_err(|err| {
                error!(error = %err, "list.update_member.failed");
                ListError::from(err)
            })?;
        Ok(Outcome::from_remote(accepted))
    }

    /// Member record, or `None` when the address is unknown or the lookup
    /// fails for any reason.
    pub async fn member_info(&self, address: &str) -> Option<MemberInfo> {
        match self.client.list_member_info(address).await {
            Ok(member) => Some(member),
            Err(err) => {
                debug!(address = %address, error = %err, "list.member_info.unavailable");
                None
            }
        }
    }

    /// Every list on the account.
    pub async fn all_lists(&self) -> Result<Vec<ListSummary>, ListError> {
        Ok(self.client.lists().await?)
    }

    /// Member count of the configured list, `None` when the account does not
    /// report that list.
    pub async fn member_count(&self) -> Result<Option<u64>, ListError> {
        let lists = self.all_lists().await?;
        let list_id = self.client.list_id();
        Ok(lists.into_iter().find(|list| list.id == list_id).map(|list| list.member_count))
    }

    pub async fn merge_vars(&self) -> Result<Vec<MergeVar>, ListError> {
        Ok(self.client.list_merge_vars().await?)
    }

    /// Turn a remote answer into an outcome.
    ///
    /// `Ok(None)` means the request should be queued; that is only returned
    /// when a queue is attached.
    fn settle(
        &self,
        kind: RequestKind,
        address: &str,
        result: RemoteResult<bool>,
    ) -> Result<Option<Outcome>, ListError> {
        let err = match result {
            Ok(accepted) => return Ok(Some(Outcome::from_remote(accepted))),
            Err(err) => err,
        };

        match self.classifier.classify_error(kind, &err) {
            Disposition::Report(outcome) => {
                info!(address = %address, outcome = %outcome, error = %err, "list.request.rejected");
                Ok(Some(outcome))
            }
            Disposition::Queue if self.queue.is_some() => {
                warn!(address = %address, error = %err, "list.request.transient_failure");
                Ok(None)
            }
            Disposition::Queue | Disposition::Fatal => {
                error!(address = %address, error = %err, "list.request.failed");
                Err(err.into())
            }
        }
    }

    async fn attempt_subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
        overrides: &FieldOverrides,
    ) -> Result<Outcome, ListError> {
        let request = SubscribeRequest {
            address: address.to_string(),
            merges: self.field_map.merge(info, overrides),
            email_type: self.options.email_type,
            flags: SubscribeFlags::from(&self.options),
            send_welcome,
        };
        let result = self.client.list_subscribe(&request).await;

        match self.settle(RequestKind::Subscribe, address, result)? {
            Some(outcome) => Ok(outcome),
            None => self.queue_subscribe(address, info, send_welcome).await,
        }
    }

    async fn queue_subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
    ) -> Result<Outcome, ListError> {
        let Some(queue) = &self.queue else {
            warn!(address = %address, "list.subscribe.no_queue");
            return Ok(Outcome::Failure);
        };
        queue.enqueue_subscribe(address, info, send_welcome).await?;
        info!(address = %address, send_welcome, "list.subscribe.queued");
        Ok(Outcome::Queued)
    }

    async fn queue_unsubscribe(&self, address: &str) -> Result<Outcome, ListError> {
        let Some(queue) = &self.queue else {
            warn!(address = %address, "list.unsubscribe.no_queue");
            return Ok(Outcome::Failure);
        };
        queue.enqueue_unsubscribe(address).await?;
        info!(address = %address, "list.unsubscribe.queued");
        Ok(Outcome::Queued)
    }

    /// Fold sequential single subscribes into a batch result. Used for
    /// welcome batches since the remote batch call cannot send welcomes.
    async fn subscribe_each(
        &self,
        subscribers: &[QueuedSubscriber],
        overrides: &FieldOverrides,
    ) -> Result<BatchResult, ListError> {
        let mut total = BatchResult::new();
        for subscriber in subscribers {
            let outcome =
                self.attempt_subscribe(&subscriber.address, &subscriber.info, true, overrides).await?;
            if outcome.is_success() {
                total.record_success();
            } else {
                total.record_error(BatchError::from_outcome(&subscriber.address, outcome));
            }
        }
        Ok(total)
    }

    async fn subscribe_chunked(
        &self,
        subscribers: &[QueuedSubscriber],
        overrides: &FieldOverrides,
    ) -> Result<BatchResult, ListError> {
        let flags = SubscribeFlags::from(&self.options);
        let mut total = BatchResult::new();

        for (index, chunk) in batch::chunks(subscribers, self.batch_size).enumerate() {
            let records: Vec<MergedFields> = chunk
                .iter()
                .map(|subscriber| self.batch_record(subscriber, overrides))
                .filter(|record| !record.is_empty())
                .collect();
            if records.is_empty() {
                debug!(chunk = index, "list.batch_subscribe.chunk_skipped");
                continue;
            }

            let result =
                self.client.list_batch_subscribe(&records, flags).await.map_err(|err| {
                    error!(
                        chunk = index,
                        size = records.len(),
                        error = %err,
                        "list.batch_subscribe.failed"
                    );
                    ListError::from(err)
                })?;
            debug!(
                chunk = index,
                size = records.len(),
                success_count = result.success_count,
                error_count = result.error_count,
                "list.batch_subscribe.chunk_done"
            );
            total.absorb(result);
        }

        Ok(total)
    }

    fn batch_record(&self, subscriber: &QueuedSubscriber, overrides: &FieldOverrides) -> MergedFields {
        let mut info = subscriber.info.clone();
        info.insert("email", subscriber.address.as_str());
        self.field_map.merge(&info, overrides)
    }
}

#[async_trait]
impl MailingList for ListService {
    async fn is_available(&self) -> bool {
        match self.client.ping().await {
            Ok(reply) if reply == self.ping_sentinel => true,
            Ok(reply) => {
                warn!(reply = %reply, "list.ping.unexpected_reply");
                false
            }
            Err(err) if self.classifier.is_transient(&err) => {
                debug!(error = %err, "list.ping.unreachable");
                false
            }
            Err(err) => {
                warn!(error = %err, "list.ping.failed");
                false
            }
        }
    }

    #[instrument(skip(self, info, overrides), fields(address = %address))]
    async fn subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
        overrides: &FieldOverrides,
    ) -> Result<Outcome, ListError> {
        if !self.is_available().await {
            return self.queue_subscribe(address, info, send_welcome).await;
        }
        self.attempt_subscribe(address, info, send_welcome, overrides).await
    }

    #[instrument(skip(self), fields(address = %address))]
    async fn unsubscribe(&self, address: &str) -> Result<Outcome, ListError> {
        if !self.is_available().await {
            return self.queue_unsubscribe(address).await;
        }

        let result = self.client.list_unsubscribe(address, RemovalFlags::default()).await;
        match self.settle(RequestKind::Unsubscribe, address, result)? {
            Some(outcome) => Ok(outcome),
            None => self.queue_unsubscribe(address).await,
        }
    }

    #[instrument(skip(self, subscribers, overrides), fields(count = subscribers.len()))]
    async fn batch_subscribe(
        &self,
        subscribers: &[QueuedSubscriber],
        send_welcome: bool,
        overrides: &FieldOverrides,
    ) -> Result<BatchOutcome, ListError> {
        if subscribers.is_empty() {
            return Ok(BatchOutcome::Completed(BatchResult::new()));
        }

        if !self.is_available().await {
            let queue = self.queue.as_ref().ok_or(ListError::Unavailable)?;
            for subscriber in subscribers {
                queue.enqueue_subscribe(&subscriber.address, &subscriber.info, send_welcome).await?;
            }
            info!(count = subscribers.len(), send_welcome, "list.batch_subscribe.queued");
            return Ok(BatchOutcome::Queued);
        }

        let result = if send_welcome {
            self.subscribe_each(subscribers, overrides).await?
        } else {
            self.subscribe_chunked(subscribers, overrides).await?
        };
        info!(
            success_count = result.success_count,
            error_count = result.error_count,
            "list.batch_subscribe.completed"
        );
        Ok(BatchOutcome::Completed(result))
    }

    #[instrument(skip(self, addresses), fields(count = addresses.len()))]
    async fn batch_unsubscribe(&self, addresses: &[String]) -> Result<BatchOutcome, ListError> {
        if addresses.is_empty() {
            return Ok(BatchOutcome::Completed(BatchResult::new()));
        }

        if !self.is_available().await {
            let queue = self.queue.as_ref().ok_or(ListError::Unavailable)?;
            for address in addresses {
                queue.enqueue_unsubscribe(address).await?;
            }
            info!(count = addresses.len(), "list.batch_unsubscribe.queued");
            return Ok(BatchOutcome::Queued);
        }

        let mut total = BatchResult::new();
        for (index, chunk) in batch::chunks(addresses, self.batch_size).enumerate() {
            let result = self
                .client
                .list_batch_unsubscribe(chunk, RemovalFlags::default())
                .await
                .map_err(|err| {
                    error!(
                        chunk = index,
                        size = chunk.len(),
                        error = %err,
                        "list.batch_unsubscribe.failed"
                    );
                    ListError::from(err)
                })?;
            total.absorb(result);
        }
        info!(
            success_count = total.success_count,
            error_count = total.error_count,
            "list.batch_unsubscribe.completed"
        );
        Ok(BatchOutcome::Completed(total))
    }

    async fn is_member(&self, address: &str) -> bool {
        self.member_info(address).await.is_some_and(|member| member.is_subscribed())
    }
}
