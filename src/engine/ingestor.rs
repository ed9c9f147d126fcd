//! Message ingestion: the per-event entry point driving the filter engine and
//! the forwarding pipeline. A single bad message never kills the event loop.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;

use crate::{
    account::registry::AccountConnection,
    engine::{
        balancer::LoadBalancer,
        filtering::{FilterEngine, FilterError, FilterVerdict},
        forwarding::{ForwardRequest, ForwardingPipeline},
    },
    models::MessageLog,
    persistence::{error::PersistenceError, traits::SessionStore},
    providers::traits::SessionEvent,
};

/// Errors raised while handling one event.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The store failed.
    #[error(transparent)]
    Store(#[from] PersistenceError),

    /// The filter engine failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Consumes inbound events for all account connections.
pub struct MessageIngestor {
    store: Arc<dyn SessionStore>,
    filter: Arc<dyn FilterEngine>,
    pipeline: Arc<ForwardingPipeline>,
    balancer: Arc<LoadBalancer>,
}

impl MessageIngestor {
    /// Creates an ingestor.
    pub fn new(
        store: Arc<dyn SessionStore>,
        filter: Arc<dyn FilterEngine>,
        pipeline: Arc<ForwardingPipeline>,
        balancer: Arc<LoadBalancer>,
    ) -> Self {
        Self { store, filter, pipeline, balancer }
    }

    /// Processes one event from a connection. Failures are logged with
    /// account and message context and never propagate; the elapsed
    /// wall-clock time is recorded even for filtered-out messages so idle
    /// accounts don't look artificially fast.
    pub async fn process(&self, connection: &AccountConnection, event: SessionEvent) {
        let started = Instant::now();
        let message = match event {
            SessionEvent::NewMessage(message) => message,
            SessionEvent::EditedMessage(mut message) => {
                message.edited = true;
                message
            }
        };

        if let Err(error) = self.handle(connection, &message).await {
            tracing::error!(
                account_id = %connection.account_id,
                chat_id = message.chat_id,
                message_id = message.message_id,
                %error,
                "failed to process inbound message"
            );
        }
        self.balancer.record_processed(&connection.account_id, started.elapsed());
    }

    async fn handle(
        &self,
        connection: &AccountConnection,
        message: &crate::models::InboundMessage,
    ) -> Result<(), IngestError> {
        if !message.chat_kind.is_monitorable() {
            return Ok(());
        }

        let Some(group) =
            self.store.find_active_group(&connection.tenant_id, message.chat_id).await?
        else {
            // The chat is visible but not monitored for this tenant.
            return Ok(());
        };

        let verdict = self
            .filter
            .evaluate(&connection.tenant_id, &connection.account_id, &group, message)
            .await?;

        match verdict {
            FilterVerdict::Skip => Ok(()),
            FilterVerdict::LogOnly { matched_keywords, .. } => {
                let log = MessageLog::from_message(
                    &connection.tenant_id,
                    &connection.account_id,
                    &group,
                    message,
                    matched_keywords,
                );
                self.store.insert_message_log(log).await?;
                Ok(())
            }
            FilterVerdict::Forward(matched) => {
                self.filter.execute_actions(&matched.tags);

                let log = MessageLog::from_message(
                    &connection.tenant_id,
                    &connection.account_id,
                    &group,
                    message,
                    matched.matched_keywords.clone(),
                );
                let log_id = log.id.clone();
                self.store.insert_message_log(log).await?;

                let report = self
                    .pipeline
                    .forward(ForwardRequest {
                        tenant_id: &connection.tenant_id,
                        message_log_id: &log_id,
                        message,
                        group: &group,
                        destination_ids: &matched.entry.destination_ids,
                        matched_keywords: &matched.matched_keywords,
                    })
                    .await;
                tracing::info!(
                    account_id = %connection.account_id,
                    entry_id = %matched.entry.id,
                    success = report.success_count,
                    failed = report.failed_count,
                    forwarded_to = ?report.forwarded_to,
                    "forwarding complete"
                );

                self.store.touch_account_activity(&connection.account_id, Utc::now()).await?;
                Ok(())
            }
        }
    }
}
