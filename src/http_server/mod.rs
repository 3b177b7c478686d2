//! HTTP API over the export and rollback flows.

pub mod routes;
pub mod server;

pub use routes::{api_routes, ApiState};
pub use server::{build_router, HttpServer};
