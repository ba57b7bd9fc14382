//! Scrubgate Security Guard
//!
//! Checks that wrap every pipeline invocation, cheapest first:
//! 1. payload size
//! 2. authentication (optional)
//! 3. per-client rate limiting (optional)
//! 4. entity-count ceiling (after analysis)
//! 5. processing deadline (around analysis and masking)

pub mod auth;
pub mod guard;
pub mod limits;
pub mod rate_limit;

pub use auth::{AuthConfig, Authenticator, Credentials};
pub use guard::{ClientContext, GuardConfig, SecurityGuard};
pub use limits::{ResourceLimits, run_with_deadline};
pub use rate_limit::{RateLimitConfig, RateLimiter};
