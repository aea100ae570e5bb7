//! Folio Gateway HTTP API Server
//!
//! Rate limiting, request validation, and the portfolio REST API.

pub mod auth;
pub mod client_ip;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod session_registry;
pub mod state;
pub mod validation;

pub use auth::AdminCredentials;
pub use error::ApiError;
pub use rate_limit::{RateLimitPolicy, RateLimitResult, RateLimiter};
pub use server::{build_router, start_server};
pub use state::{GatewayState, SiteInfo};
