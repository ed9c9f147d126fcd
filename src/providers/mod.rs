//! Network session providers. The core depends only on the traits in
//! [`traits`]; the grammers-backed Telegram implementation lives in
//! [`telegram`].

pub mod telegram;
pub mod traits;
