pub mod assignments;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the router builder so the binary and the integration tests share one wiring.
pub use middleware::require_auth;
pub use router::build_router;
