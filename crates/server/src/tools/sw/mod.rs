//! Platform event tools.

pub mod fetch;
pub mod message;
pub mod status;
pub mod update;

pub use fetch::{SwFetchParams, fetch_impl};
pub use message::{SwMessageParams, message_impl};
pub use status::status_impl;
pub use update::{SwUpdateParams, update_impl};
