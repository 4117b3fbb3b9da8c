//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, signed cookies, memory store)
//! 5. Edge guard (page routes only: cookie-based redirect before render)

pub mod auth;
pub mod edge_guard;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, OptionalUser, RequireUser};
pub use edge_guard::edge_guard;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
