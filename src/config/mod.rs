//! Configuration module for Vigil.

mod account_loader;
mod app_config;
mod destination_loader;
mod helpers;
mod watchlist_loader;

pub use account_loader::{AccountConfigEntry, AccountLoader, AccountLoaderError};
pub use app_config::AppConfig;
pub use destination_loader::{DestinationLoader, DestinationLoaderError};
pub use helpers::{deserialize_duration_from_seconds, serialize_duration_to_seconds};
pub use watchlist_loader::{WatchlistLoader, WatchlistLoaderError};
