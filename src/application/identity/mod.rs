//! Identity module: account creation and identifier resolution
//!
//! Contains the `AccountService`, the single entry point both transport
//! adapters use.

pub mod service;

pub use service::{AccountService, SharedAccountService};
