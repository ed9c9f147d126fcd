//! Typed records for every entity the daemon works with.

pub mod account;
pub mod account_filter;
pub mod destination;
pub mod group;
pub mod health;
pub mod message;
pub mod message_log;
pub mod watchlist;

pub use account::{Account, AccountProfile, AccountStatus, HealthStatus};
pub use account_filter::{AccountFilter, FilterCondition, FilterTag};
pub use destination::ForwardingDestination;
pub use group::{DiscoverySource, Group};
pub use health::{AccountHealthRecord, HealthSummary, LoadSummary};
pub use message::{ChatKind, InboundMessage, MediaKind};
pub use message_log::{ForwardedMessage, ForwardingStatus, MessageLog};
pub use watchlist::WatchlistEntry;
