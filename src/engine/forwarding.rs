//! The forwarding pipeline: format a matched message, pick the best account
//! per destination, send with one fallback retry, and record the results.
//! Failures are captured into the report, never thrown out of the pipeline.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::time::Instant;

use crate::{
    account::registry::AccountRegistry,
    engine::balancer::LoadBalancer,
    models::{ForwardedMessage, ForwardingDestination, ForwardingStatus, Group, InboundMessage},
    persistence::traits::SessionStore,
};

/// Per-message outcome across all destinations.
#[derive(Debug, Clone, Default)]
pub struct ForwardReport {
    /// Destinations that received the alert.
    pub success_count: u32,

    /// Destinations that failed after the fallback retry.
    pub failed_count: u32,

    /// Names of the destinations that received the alert.
    pub forwarded_to: Vec<String>,

    /// Errors captured along the way.
    pub errors: Vec<String>,
}

impl ForwardReport {
    /// Status of the audit record, when one is warranted.
    pub fn status(&self) -> ForwardingStatus {
        if self.failed_count > 0 {
            ForwardingStatus::Partial
        } else {
            ForwardingStatus::Success
        }
    }
}

/// Input to one forwarding run.
pub struct ForwardRequest<'a> {
    /// Tenant the message belongs to.
    pub tenant_id: &'a str,

    /// Id of the already-written message log to update.
    pub message_log_id: &'a str,

    /// The matched message.
    pub message: &'a InboundMessage,

    /// The resolved source group.
    pub group: &'a Group,

    /// Destination ids from the matched watchlist entry. Empty means "all
    /// active tenant destinations", filtered by their source-group and user
    /// restrictions.
    pub destination_ids: &'a [String],

    /// Keywords that matched, included in the alert.
    pub matched_keywords: &'a [String],
}

/// Formats and delivers matched messages.
pub struct ForwardingPipeline {
    store: Arc<dyn SessionStore>,
    registry: Arc<AccountRegistry>,
    balancer: Arc<LoadBalancer>,
    send_timeout: Duration,
}

impl ForwardingPipeline {
    /// Creates a pipeline.
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<AccountRegistry>,
        balancer: Arc<LoadBalancer>,
        send_timeout: Duration,
    ) -> Self {
        Self { store, registry, balancer, send_timeout }
    }

    /// Runs the pipeline for one matched message. At-least-once per
    /// destination: one attempt on the best account plus at most one retry on
    /// the first other registered account.
    pub async fn forward(&self, request: ForwardRequest<'_>) -> ForwardReport {
        let mut report = ForwardReport::default();

        let destinations = self.resolve_destinations(&request, &mut report.errors).await;
        if destinations.is_empty() {
            if report.errors.is_empty() {
                report.errors.push("no forwarding destinations resolved".to_string());
            }
            self.finish(&request, &report).await;
            return report;
        }

        let text = render_alert(request.message, request.group, request.matched_keywords);

        for destination in &destinations {
            let candidates = self.registry.ids();
            let Some(primary) = self.balancer.select_best(&candidates) else {
                tracing::warn!(
                    destination = %destination.name,
                    "no available accounts for forwarding"
                );
                report.errors.push("no available accounts".to_string());
                continue;
            };

            let mut delivered_by = None;
            match self.attempt_send(&primary, destination, &text).await {
                Ok(()) => delivered_by = Some(primary.clone()),
                Err(error) => {
                    report
                        .errors
                        .push(format!("destination '{}': {error}", destination.name));
                    // One retry on any other registered account.
                    if let Some(fallback) =
                        self.registry.ids().into_iter().find(|id| *id != primary)
                    {
                        tracing::info!(
                            destination = %destination.name,
                            primary_account = %primary,
                            fallback_account = %fallback,
                            "retrying with fallback account"
                        );
                        match self.attempt_send(&fallback, destination, &text).await {
                            Ok(()) => delivered_by = Some(fallback),
                            Err(error) => report.errors.push(format!(
                                "destination '{}' (fallback): {error}",
                                destination.name
                            )),
                        }
                    }
                }
            }

            match delivered_by {
                Some(account_id) => {
                    report.success_count += 1;
                    report.forwarded_to.push(destination.name.clone());
                    tracing::info!(
                        destination = %destination.name,
                        account_id = %account_id,
                        "alert forwarded"
                    );
                    if let Err(error) =
                        self.store.record_destination_forward(&destination.id, Utc::now()).await
                    {
                        tracing::warn!(
                            destination_id = %destination.id,
                            %error,
                            "failed to update destination counters"
                        );
                    }
                }
                None => report.failed_count += 1,
            }
        }

        self.finish(&request, &report).await;
        report
    }

    /// Resolves the destination records for a request, skipping missing or
    /// inactive ones with a captured error instead of failing the run.
    async fn resolve_destinations(
        &self,
        request: &ForwardRequest<'_>,
        errors: &mut Vec<String>,
    ) -> Vec<ForwardingDestination> {
        if request.destination_ids.is_empty() {
            return match self.store.list_active_destinations(request.tenant_id).await {
                Ok(destinations) => destinations
                    .into_iter()
                    .filter(|d| {
                        d.accepts(
                            &request.group.id,
                            request.message.sender_username.as_deref(),
                        )
                    })
                    .collect(),
                Err(error) => {
                    errors.push(format!("failed to list destinations: {error}"));
                    Vec::new()
                }
            };
        }

        let mut resolved = Vec::new();
        for destination_id in request.destination_ids {
            match self.store.get_destination(destination_id).await {
                Ok(Some(destination))
                    if destination.active && destination.tenant_id == request.tenant_id =>
                {
                    resolved.push(destination);
                }
                Ok(Some(_)) => {
                    errors.push(format!("destination {destination_id} is not active"));
                }
                Ok(None) => errors.push(format!("destination {destination_id} not found")),
                Err(error) => {
                    errors.push(format!("destination {destination_id}: {error}"));
                }
            }
        }
        resolved
    }

    /// One bounded send on one account. Records the elapsed time with the
    /// balancer on success.
    async fn attempt_send(
        &self,
        account_id: &str,
        destination: &ForwardingDestination,
        text: &str,
    ) -> Result<(), String> {
        let Some(connection) = self.registry.get(account_id) else {
            return Err(format!("account {account_id} is no longer registered"));
        };
        let started = Instant::now();
        match tokio::time::timeout(
            self.send_timeout,
            connection.client.send_message(destination.chat_id, text),
        )
        .await
        {
            Ok(Ok(())) => {
                self.balancer.record_processed(account_id, started.elapsed());
                Ok(())
            }
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err(format!("send timed out after {:?}", self.send_timeout)),
        }
    }

    /// Updates the message log and, when anything succeeded, writes the
    /// forwarded-message audit record.
    async fn finish(&self, request: &ForwardRequest<'_>, report: &ForwardReport) {
        if let Err(error) =
            self.store.mark_log_forwarded(request.message_log_id, report.success_count).await
        {
            tracing::warn!(
                message_log_id = %request.message_log_id,
                %error,
                "failed to update message log"
            );
        }
        if report.success_count > 0 {
            let record = ForwardedMessage::new(
                request.tenant_id,
                request.message_log_id,
                report.status(),
                report.forwarded_to.clone(),
                &report.errors,
            );
            if let Err(error) = self.store.insert_forwarded_message(record).await {
                tracing::warn!(%error, "failed to write forwarded-message record");
            }
        }
    }
}

/// Renders the human-readable alert for a matched message. The quoted
/// original text is escaped for the Telegram markdown dialect.
pub fn render_alert(message: &InboundMessage, group: &Group, matched_keywords: &[String]) -> String {
    let mut alert = String::from("Watchlist match\n");
    alert.push_str(&format!("Group: {}\n", group.name));

    let mut sender = message.sender_name.clone();
    if let Some(username) = &message.sender_username {
        sender.push_str(&format!(" (@{username})"));
    }
    if let Some(id) = message.sender_id {
        sender.push_str(&format!(" [id {id}]"));
    }
    alert.push_str(&format!("From: {sender}\n"));
    alert.push_str(&format!("Time: {} UTC\n", message.received_at.format("%Y-%m-%d %H:%M:%S")));

    if !matched_keywords.is_empty() {
        alert.push_str(&format!("Keywords: {}\n", matched_keywords.join(", ")));
    }
    if let Some(media) = message.media {
        alert.push_str(&format!("Media: {}\n", media.label()));
    }
    if message.edited {
        alert.push_str("(edited)\n");
    }
    alert.push('\n');
    alert.push_str(&escape_markdown(&message.text));
    alert
}

/// Escapes the characters the Telegram markdown dialect treats specially.
fn escape_markdown(text: &str) -> String {
    const SPECIAL: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        '\\',
    ];
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::{ChatKind, DiscoverySource, MediaKind};

    fn message() -> InboundMessage {
        InboundMessage {
            chat_id: -100123,
            chat_name: "ops".into(),
            chat_kind: ChatKind::Supergroup,
            message_id: 7,
            sender_id: Some(42),
            sender_username: Some("alice".into()),
            sender_name: "Alice".into(),
            text: "deploy *now*".into(),
            media: Some(MediaKind::Photo),
            edited: true,
            received_at: Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 0).unwrap(),
        }
    }

    fn group() -> Group {
        Group {
            id: "group-1".into(),
            tenant_id: "tenant-a".into(),
            chat_id: -100123,
            name: "Ops room".into(),
            kind: ChatKind::Supergroup,
            active: true,
            source: DiscoverySource::Manual,
        }
    }

    #[test]
    fn alert_carries_all_context() {
        let alert = render_alert(&message(), &group(), &["deploy".to_string()]);
        assert!(alert.contains("Group: Ops room"));
        assert!(alert.contains("From: Alice (@alice) [id 42]"));
        assert!(alert.contains("Time: 2025-06-01 14:30:00 UTC"));
        assert!(alert.contains("Keywords: deploy"));
        assert!(alert.contains("Media: photo"));
        assert!(alert.contains("(edited)"));
        assert!(alert.contains("deploy \\*now\\*"));
    }

    #[test]
    fn markdown_escaping_covers_specials() {
        assert_eq!(escape_markdown("a_b*c."), "a\\_b\\*c\\.");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn partial_status_requires_a_failure() {
        let mut report = ForwardReport { success_count: 2, ..Default::default() };
        assert_eq!(report.status(), ForwardingStatus::Success);
        report.failed_count = 1;
        assert_eq!(report.status(), ForwardingStatus::Partial);
    }
}
