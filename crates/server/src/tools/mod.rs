//! MCP tool implementations.
//!
//! `sw_*` tools play the platform's part: they deliver fetch, message and
//! update events to the registration. `cache_*` tools inspect partitions.

pub mod cache;
pub mod sw;
