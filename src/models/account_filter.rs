//! Advanced per-account conditional filters. Each filter ANDs its conditions;
//! a matching filter tags the message with its actions and a priority score.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use super::message::{InboundMessage, MediaKind};

/// One condition inside an advanced filter. All conditions of a filter must
/// hold for the filter to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterCondition {
    /// Message text contains the value, case-insensitively.
    TextContains(String),
    /// Message text equals the value, case-insensitively.
    TextEquals(String),
    /// Message text matches the pattern; an invalid pattern degrades to a
    /// case-insensitive substring match.
    TextRegex(String),
    /// Sender user id equals the value.
    SenderId(i64),
    /// Sender username equals the value, case-insensitively.
    SenderUsername(String),
    /// Source chat id equals the value.
    ChatId(i64),
    /// Attached media is of the given kind.
    Media(MediaKind),
    /// Receipt hour of day (UTC) falls in the range. `start <= end` is the
    /// inclusive range `[start, end]`; `start > end` wraps past midnight.
    HourRange {
        /// First hour of the range, 0-23.
        start: u32,
        /// Last hour of the range, 0-23.
        end: u32,
    },
}

impl FilterCondition {
    /// Evaluates the condition against a message.
    pub fn matches(&self, message: &InboundMessage) -> bool {
        match self {
            FilterCondition::TextContains(needle) => {
                message.text.to_lowercase().contains(&needle.to_lowercase())
            }
            FilterCondition::TextEquals(expected) => message.text.eq_ignore_ascii_case(expected),
            FilterCondition::TextRegex(pattern) => {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => re.is_match(&message.text),
                    Err(error) => {
                        tracing::warn!(
                            pattern,
                            %error,
                            "filter condition pattern failed to compile, using substring match"
                        );
                        message.text.to_lowercase().contains(&pattern.to_lowercase())
                    }
                }
            }
            FilterCondition::SenderId(expected) => message.sender_id == Some(*expected),
            FilterCondition::SenderUsername(expected) => message
                .sender_username
                .as_deref()
                .map(|u| u.eq_ignore_ascii_case(expected))
                .unwrap_or(false),
            FilterCondition::ChatId(expected) => message.chat_id == *expected,
            FilterCondition::Media(expected) => message.media == Some(*expected),
            FilterCondition::HourRange { start, end } => {
                use chrono::Timelike;
                let hour = message.received_at.hour();
                if start <= end {
                    (*start..=*end).contains(&hour)
                } else {
                    hour >= *start || hour <= *end
                }
            }
        }
    }
}

/// A named advanced filter attached to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountFilter {
    /// Filter name, unique per account by convention.
    pub name: String,

    /// Conditions, all of which must hold.
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,

    /// Action names attached to matching messages. Collected into tags;
    /// dispatch is an extension point.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Whether the filter is evaluated.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// The tag a matching filter contributes to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTag {
    /// Name of the matching filter.
    pub filter_name: String,

    /// Actions the filter requests.
    pub actions: Vec<String>,

    /// Priority score, ten per condition.
    pub priority: u32,
}

impl AccountFilter {
    /// Evaluates the filter; returns its tag when every condition holds.
    pub fn evaluate(&self, message: &InboundMessage) -> Option<FilterTag> {
        if self.conditions.iter().all(|c| c.matches(message)) {
            Some(FilterTag {
                filter_name: self.name.clone(),
                actions: self.actions.clone(),
                priority: 10 * self.conditions.len() as u32,
            })
        } else {
            None
        }
    }
}
