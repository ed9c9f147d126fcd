//! Append-only audit records: one `MessageLog` per message that passed the
//! filter engine, one `ForwardedMessage` per message with at least one
//! successful forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{group::Group, message::InboundMessage, message::MediaKind};

/// Audit record written for every message the filter engine found relevant.
/// Immutable once written except for the forwarded flag and count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLog {
    /// Store id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// Account the message arrived through.
    pub account_id: String,

    /// Store id of the source group.
    pub group_id: String,

    /// Telegram chat id of the source group.
    pub chat_id: i64,

    /// Message id within the chat.
    pub message_id: i64,

    /// Sender user id, when visible.
    pub sender_id: Option<i64>,

    /// Sender username, when set.
    pub sender_username: Option<String>,

    /// Sender display name.
    pub sender_name: String,

    /// Message text or caption.
    pub text: String,

    /// Attached media, if any.
    pub media: Option<MediaKind>,

    /// True when the event was an edit.
    pub edited: bool,

    /// Keywords that matched, empty when the entry had no keyword filter.
    pub matched_keywords: Vec<String>,

    /// Whether at least one forward succeeded.
    pub is_forwarded: bool,

    /// Number of destinations the message reached.
    pub forwarded_count: u32,

    /// When the log was written.
    pub logged_at: DateTime<Utc>,
}

impl MessageLog {
    /// Builds a log row for a message that passed filtering. The forwarded
    /// flag and count start at zero and are updated by the pipeline.
    pub fn from_message(
        tenant_id: &str,
        account_id: &str,
        group: &Group,
        message: &InboundMessage,
        matched_keywords: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            account_id: account_id.to_string(),
            group_id: group.id.clone(),
            chat_id: message.chat_id,
            message_id: message.message_id,
            sender_id: message.sender_id,
            sender_username: message.sender_username.clone(),
            sender_name: message.sender_name.clone(),
            text: message.text.clone(),
            media: message.media,
            edited: message.edited,
            matched_keywords,
            is_forwarded: false,
            forwarded_count: 0,
            logged_at: Utc::now(),
        }
    }
}

/// Outcome classification of a forwarding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingStatus {
    /// Every attempted destination succeeded.
    Success,
    /// At least one destination succeeded and at least one failed.
    Partial,
}

/// Audit record written when at least one forward succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardedMessage {
    /// Store id.
    pub id: String,

    /// Owning tenant.
    pub tenant_id: String,

    /// The originating message log.
    pub message_log_id: String,

    /// Success or partial.
    pub status: ForwardingStatus,

    /// Names of the destinations that received the alert.
    pub forwarded_to: Vec<String>,

    /// Concatenated error messages from failed attempts, if any.
    pub error_details: Option<String>,

    /// When the record was written.
    pub forwarded_at: DateTime<Utc>,
}

impl ForwardedMessage {
    /// Creates the audit record for a completed forwarding run.
    pub fn new(
        tenant_id: &str,
        message_log_id: &str,
        status: ForwardingStatus,
        forwarded_to: Vec<String>,
        errors: &[String],
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            message_log_id: message_log_id.to_string(),
            status,
            forwarded_to,
            error_details: if errors.is_empty() { None } else { Some(errors.join("; ")) },
            forwarded_at: Utc::now(),
        }
    }
}
