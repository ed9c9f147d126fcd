//! A set of helpers for testing

mod account;
mod client;
mod destination;
mod group;
mod message;
mod watchlist;

pub use account::AccountBuilder;
pub use client::{StubSessionClient, StubSessionProvider};
pub use destination::DestinationBuilder;
pub use group::GroupBuilder;
pub use message::MessageBuilder;
pub use watchlist::WatchlistEntryBuilder;
