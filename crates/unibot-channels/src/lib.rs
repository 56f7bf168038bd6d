//! # unibot-channels
//!
//! Messaging platform integrations for unibot.

pub mod telegram;
pub(crate) mod utils;
