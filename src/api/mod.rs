//! API Module
//!
//! HTTP handlers and routing exposing the cache as JSON.
//!
//! # Endpoints
//! - `PUT /set` - Store a value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `GET /stats` - Get cache statistics
//! - `PUT /config/max-entries` - Change the cache capacity
//! - `GET /health` - Health check endpoint

pub mod codec;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
