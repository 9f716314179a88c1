//! HTTP middleware and extractors for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: protected handlers take the
//! [`RequireUser`] extractor, so public routes need no exemption list.

pub mod auth;
pub mod request_id;

pub use auth::{BasicCredentials, RequireUser};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
