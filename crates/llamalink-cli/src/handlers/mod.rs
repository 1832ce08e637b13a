//! Command handlers.
//!
//! Each handler takes the [`CliContext`](crate::CliContext) plus its own
//! arguments, calls into `llamalink-runtime` and prints the result.

pub mod chat;
pub mod health;
pub mod inspect;
pub mod models;
pub mod serve;
