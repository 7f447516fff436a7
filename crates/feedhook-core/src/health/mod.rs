//! Liveness endpoint
//!
//! Serves `GET /healthz` with a fixed body. It never reflects feed or
//! webhook failures; it only tells whether the process is up.

mod server;

pub use server::{router, HealthServer, HEALTH_PATH};
