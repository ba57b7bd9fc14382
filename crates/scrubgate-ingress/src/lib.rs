//! Scrubgate Ingress
//!
//! HTTP binding of the masking pipeline:
//! - `POST /mask` guarded by size, authentication and rate-limit checks
//! - request context, security header and CORS layers
//! - error to response mapping

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod types;

pub use handlers::AppState;
pub use router::{RouterConfig, build_router};
pub use types::{IngressError, IngressResult, RequestId, RequestMetadata};
