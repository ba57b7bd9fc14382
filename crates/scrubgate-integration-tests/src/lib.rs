//! End-to-end integration tests for Scrubgate
//!
//! The tests under `tests/` assemble the recognizer registry, guard,
//! orchestrator and HTTP router the way the server binary does, then drive
//! requests through the full stack with `tower::ServiceExt::oneshot`.
