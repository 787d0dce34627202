//! Port interfaces for the remote list service

use async_trait::async_trait;
use listsync_domain::{
    BatchOutcome, BatchResult, EmailType, ListSummary, MemberInfo, MergeVar, MergedFields,
    Outcome, QueuedSubscriber, SubscribeOptions, SubscriberInfo,
};

use super::errors::{ListError, RemoteResult};
use super::merge::FieldOverrides;

/// Flags shared by single and batch subscribe calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeFlags {
    pub double_opt_in: bool,
    pub update_existing: bool,
    pub replace_interests: bool,
}

impl From<&SubscribeOptions> for SubscribeFlags {
    fn from(options: &SubscribeOptions) -> Self {
        Self {
            double_opt_in: options.double_opt_in,
            update_existing: options.update_existing,
            replace_interests: options.replace_interests,
        }
    }
}

/// Flags for unsubscribe calls. Everything off means "unsubscribe quietly and
/// keep the member record".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalFlags {
    pub delete_member: bool,
    pub send_goodbye: bool,
    pub send_notify: bool,
}

/// Arguments of a single `listSubscribe` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeRequest {
    pub address: String,
    pub merges: MergedFields,
    pub email_type: EmailType,
    pub flags: SubscribeFlags,
    pub send_welcome: bool,
}

/// Raw RPC surface of the remote list service.
///
/// Implementations hold the API key and list id; every method operates on
/// that one list.
#[async_trait]
pub trait ListRpcClient: Send + Sync {
    /// Identifier of the list this client operates on.
    fn list_id(&self) -> &str;

    /// Health check; a healthy service answers with a fixed sentinel string.
    async fn ping(&self) -> RemoteResult<String>;

    async fn list_subscribe(&self, request: &SubscribeRequest) -> RemoteResult<bool>;

    async fn list_unsubscribe(&self, address: &str, flags: RemovalFlags) -> RemoteResult<bool>;

    /// Subscribe many members at once. Each record carries its address under
    /// `EMAIL`. The remote batch call cannot send welcome emails.
    async fn list_batch_subscribe(
        &self,
        records: &[MergedFields],
        flags: SubscribeFlags,
    ) -> RemoteResult<BatchResult>;

    async fn list_batch_unsubscribe(
        &self,
        addresses: &[String],
        flags: RemovalFlags,
    ) -> RemoteResult<BatchResult>;

    async fn list_member_info(&self, address: &str) -> RemoteResult<MemberInfo>;

    /// Update an existing member. `email_type: None` keeps the member's
    /// current preference.
    async fn list_update_member(
        &self,
        address: &str,
        merges: &MergedFields,
        email_type: Option<EmailType>,
        replace_interests: bool,
    ) -> RemoteResult<bool>;

    async fn list_merge_vars(&self) -> RemoteResult<Vec<MergeVar>>;

    /// All lists on the account.
    async fn lists(&self) -> RemoteResult<Vec<ListSummary>>;
}

/// Capability interface of a mailing-list provider.
///
/// The reconciliation driver depends only on this trait.
#[async_trait]
pub trait MailingList: Send + Sync {
    /// Whether the remote service is reachable. Never fails.
    async fn is_available(&self) -> bool;

    async fn subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
        overrides: &FieldOverrides,
    ) -> Result<Outcome, ListError>;

    async fn unsubscribe(&self, address: &str) -> Result<Outcome, ListError>;

    async fn batch_subscribe(
        &self,
        subscribers: &[QueuedSubscriber],
        send_welcome: bool,
        overrides: &FieldOverrides,
    ) -> Result<BatchOutcome, ListError>;

    async fn batch_unsubscribe(&self, addresses: &[String]) -> Result<BatchOutcome, ListError>;

    /// Best-effort membership check; any remote error reads as `false`.
    async fn is_member(&self, address: &str) -> bool;
}
