//! FanoutDispatcher - change event to push notification

use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use contracts::{
    ChangeEvent, DocumentStore, MulticastReport, PushMessage, PushTransport, TxRecord, TxRef,
    TxStatus, DEFAULT_DISPLAY_TITLE, EXPENSE_KIND,
};

use crate::error::Result;
use crate::message::{self, Draft};
use crate::outcome::{DispatchOutcome, FilterReason};

/// Dispatcher settings
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Title prefix
    pub app_name: String,
    /// Record kind that triggers notifications
    pub expected_kind: String,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_DISPLAY_TITLE.to_string(),
            expected_kind: EXPENSE_KIND.to_string(),
        }
    }
}

impl From<&contracts::AppConfig> for DispatcherSettings {
    fn from(app: &contracts::AppConfig) -> Self {
        Self {
            app_name: app.name.clone(),
            expected_kind: app.expected_kind.clone(),
        }
    }
}

/// Turns qualifying record changes into one multicast per event
///
/// Holds no mutable state; one instance can serve any number of events
/// concurrently.
pub struct FanoutDispatcher<S, T> {
    store: S,
    transport: T,
    settings: DispatcherSettings,
}

impl<S, T> FanoutDispatcher<S, T>
where
    S: DocumentStore + Sync,
    T: PushTransport + Sync,
{
    /// Create a dispatcher over explicit collaborators
    pub fn new(store: S, transport: T, settings: DispatcherSettings) -> Self {
        Self {
            store,
            transport,
            settings,
        }
    }

    /// Document store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Push transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Route an event to its handler
    pub async fn handle_event(&self, event: &ChangeEvent) -> Result<DispatchOutcome> {
        match event {
            ChangeEvent::Created { path, record } => self.handle_create(path, record).await,
            ChangeEvent::Updated {
                path,
                before,
                after,
            } => self.handle_transition(path, before, after).await,
        }
    }

    /// A transaction was created: ask the group to approve it
    #[instrument(name = "dispatcher_handle_create", skip(self, record), fields(path = %tx_ref))]
    pub async fn handle_create(&self, tx_ref: &TxRef, record: &TxRecord) -> Result<DispatchOutcome> {
        if !record.is_kind(&self.settings.expected_kind) {
            return Ok(filtered(FilterReason::WrongKind {
                kind: record.kind.clone(),
            }));
        }
        if record.status != Some(TxStatus::Pending) {
            return Ok(filtered(FilterReason::NotPending {
                status: status_text(record),
            }));
        }

        let draft = message::approval_needed(&self.settings.app_name, tx_ref, record);
        self.notify_group(tx_ref, draft).await
    }

    /// A transaction changed: announce approval or rejection
    #[instrument(
        name = "dispatcher_handle_transition",
        skip(self, before, after),
        fields(path = %tx_ref)
    )]
    pub async fn handle_transition(
        &self,
        tx_ref: &TxRef,
        before: &TxRecord,
        after: &TxRecord,
    ) -> Result<DispatchOutcome> {
        if before.status == after.status {
            return Ok(filtered(FilterReason::StatusUnchanged));
        }
        if !after.is_kind(&self.settings.expected_kind) {
            return Ok(filtered(FilterReason::WrongKind {
                kind: after.kind.clone(),
            }));
        }

        match message::decision(&self.settings.app_name, tx_ref, after) {
            Some(draft) => self.notify_group(tx_ref, draft).await,
            None => Ok(filtered(FilterReason::UnhandledStatus {
                status: status_text(after),
            })),
        }
    }

    /// Member ids of the group; empty if the group or its member list is missing
    #[instrument(name = "dispatcher_resolve_audience", skip(self))]
    pub async fn resolve_audience(&self, group_id: &str) -> Result<Vec<String>> {
        let group = self.store.get_group(group_id).await?;
        Ok(group.map(|g| g.member_uids).unwrap_or_default())
    }

    /// Tokens of every member, looked up concurrently, in member order
    ///
    /// No deduplication across members. The first failed lookup fails the
    /// whole resolution.
    #[instrument(name = "dispatcher_resolve_tokens", skip(self, member_ids), fields(members = member_ids.len()))]
    pub async fn resolve_tokens(&self, member_ids: &[String]) -> Result<Vec<String>> {
        let lookups = member_ids
            .iter()
            .map(|uid| self.store.list_token_ids(uid));
        let per_member = try_join_all(lookups).await?;
        Ok(per_member.into_iter().flatten().collect())
    }

    /// Send one multicast
    ///
    /// Per-token rejections come back in the report; only transport-level
    /// failures are errors.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, tokens, draft),
        fields(transport = self.transport.name(), tokens = tokens.len())
    )]
    pub async fn dispatch(&self, tokens: Vec<String>, draft: Draft) -> Result<MulticastReport> {
        let message = PushMessage::new(tokens, draft.notification, &draft.metadata)
            .with_idempotency_key(draft.idempotency_key);
        let report = self.transport.send_multicast(&message).await?;

        if report.failure_count() > 0 {
            warn!(
                succeeded = report.success_count(),
                failed = report.failure_count(),
                "Some tokens were rejected"
            );
        }
        Ok(report)
    }

    async fn notify_group(&self, tx_ref: &TxRef, draft: Draft) -> Result<DispatchOutcome> {
        let members = self.resolve_audience(tx_ref.group_id()).await?;
        if members.is_empty() {
            debug!(group_id = tx_ref.group_id(), "Group has no members");
            return Ok(DispatchOutcome::EmptyAudience);
        }

        let tokens = self.resolve_tokens(&members).await?;
        if tokens.is_empty() {
            debug!(members = members.len(), "No tokens registered for group");
            return Ok(DispatchOutcome::NoTokens);
        }

        let report = self.dispatch(tokens, draft).await?;
        info!(
            succeeded = report.success_count(),
            failed = report.failure_count(),
            "Notification sent"
        );
        Ok(DispatchOutcome::Delivered(report))
    }
}

fn filtered(reason: FilterReason) -> DispatchOutcome {
    debug!(reason = %reason, "Event filtered");
    DispatchOutcome::Filtered(reason)
}

fn status_text(record: &TxRecord) -> Option<String> {
    record.status.as_ref().map(|s| s.as_str().to_string())
}
