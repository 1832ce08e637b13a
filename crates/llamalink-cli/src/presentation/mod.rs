//! Terminal formatting shared by command handlers.
//!
//! Format-only: no requests are made from here.

pub mod events;
pub mod tables;

pub use events::EventRenderer;
pub use tables::{format_optional, print_separator, truncate_string};
