//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Sweeper: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::{spawn_sweeper, Sweeper};
