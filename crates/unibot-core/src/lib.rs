//! # unibot-core
//!
//! Core types, traits, configuration, and error handling for unibot.

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod filter;
pub mod message;
pub mod traits;
