//! This module defines the `FilterEngine` and its watchlist-backed
//! implementation. Two layers gate forwarding: the tenant watchlist match and
//! the account's advanced conditional filters.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use regex::RegexBuilder;
use thiserror::Error;

use crate::{
    models::{FilterTag, Group, InboundMessage, WatchlistEntry},
    persistence::{error::PersistenceError, traits::SessionStore},
};

/// Errors raised while evaluating filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The store failed while loading rules.
    #[error(transparent)]
    Store(#[from] PersistenceError),
}

/// A watchlist match eligible for forwarding.
#[derive(Debug, Clone)]
pub struct WatchlistMatch {
    /// The matched rule.
    pub entry: WatchlistEntry,

    /// Keywords of the rule that matched the text; empty when the rule has no
    /// keyword filter.
    pub matched_keywords: Vec<String>,

    /// Tags contributed by the account's advanced filters.
    pub tags: Vec<FilterTag>,
}

/// Outcome of filtering one message.
#[derive(Debug, Clone)]
pub enum FilterVerdict {
    /// No watchlist rule cares about this message.
    Skip,

    /// A rule matched the sender but a keyword or advanced-filter gate
    /// failed: log the message, do not forward it.
    LogOnly {
        /// Id of the matched rule.
        entry_id: String,
        /// Keywords that matched before the gate failed.
        matched_keywords: Vec<String>,
    },

    /// Forward via the matched rule's destinations.
    Forward(WatchlistMatch),
}

/// A trait for an engine that decides whether an inbound message is relevant.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FilterEngine: Send + Sync {
    /// Evaluates a message against the tenant watchlist and the account's
    /// advanced filters.
    async fn evaluate(
        &self,
        tenant_id: &str,
        account_id: &str,
        group: &Group,
        message: &InboundMessage,
    ) -> Result<FilterVerdict, FilterError>;

    /// Extension hook for the actions of matching advanced filters. The
    /// default implementation only logs the tags.
    fn execute_actions(&self, tags: &[FilterTag]) {
        for tag in tags {
            tracing::debug!(
                filter = %tag.filter_name,
                actions = ?tag.actions,
                priority = tag.priority,
                "filter actions collected"
            );
        }
    }
}

/// Store-backed implementation of the filter engine.
pub struct WatchlistFilterEngine {
    store: Arc<dyn SessionStore>,
}

impl WatchlistFilterEngine {
    /// Creates an engine reading rules from the given store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

/// Whether a keyword matches the text. The keyword is tried as a
/// case-insensitive regex first; a keyword that fails to compile degrades to
/// a case-insensitive substring match rather than erroring.
pub fn keyword_matches(keyword: &str, text: &str) -> bool {
    match RegexBuilder::new(keyword).case_insensitive(true).build() {
        Ok(re) => re.is_match(text),
        Err(error) => {
            tracing::warn!(keyword, %error, "keyword failed to compile, using substring match");
            text.to_lowercase().contains(&keyword.to_lowercase())
        }
    }
}

#[async_trait]
impl FilterEngine for WatchlistFilterEngine {
    async fn evaluate(
        &self,
        tenant_id: &str,
        account_id: &str,
        group: &Group,
        message: &InboundMessage,
    ) -> Result<FilterVerdict, FilterError> {
        let entries = self.store.list_watch_entries(tenant_id).await?;

        // First matching rule wins.
        let entry = entries.into_iter().filter(|e| e.active).find(|e| {
            e.matches_sender(message.sender_id, message.sender_username.as_deref())
                && e.in_scope(&group.id)
        });
        let Some(entry) = entry else {
            return Ok(FilterVerdict::Skip);
        };

        let matched_keywords: Vec<String> = entry
            .keywords
            .iter()
            .filter(|keyword| keyword_matches(keyword, &message.text))
            .cloned()
            .collect();
        if !entry.keywords.is_empty() && matched_keywords.is_empty() {
            tracing::debug!(
                entry_id = %entry.id,
                "watched sender matched but no keyword did, logging without forwarding"
            );
            return Ok(FilterVerdict::LogOnly { entry_id: entry.id, matched_keywords });
        }

        let filters = self.store.list_account_filters(account_id).await?;
        let active_filters: Vec<_> = filters.into_iter().filter(|f| f.active).collect();
        let tags: Vec<FilterTag> =
            active_filters.iter().filter_map(|f| f.evaluate(message)).collect();
        if !active_filters.is_empty() && tags.is_empty() {
            tracing::debug!(
                entry_id = %entry.id,
                account_id,
                "message blocked by advanced account filters"
            );
            return Ok(FilterVerdict::LogOnly { entry_id: entry.id, matched_keywords });
        }

        Ok(FilterVerdict::Forward(WatchlistMatch { entry, matched_keywords, tags }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_as_regex() {
        assert!(keyword_matches("urg.nt", "this is URGENT"));
        assert!(!keyword_matches("urg.nt", "nothing"));
    }

    #[test]
    fn invalid_regex_falls_back_to_substring() {
        assert!(keyword_matches("(", "left ( paren"));
        assert!(!keyword_matches("(", "no paren"));
    }

    #[test]
    fn substring_fallback_is_case_insensitive() {
        assert!(keyword_matches("(URGENT", "some (urgent thing"));
    }
}
