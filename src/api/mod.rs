//! HTTP API layer

mod handlers;
mod registry;
mod response;
mod routes;
mod validate;

pub use response::{ErrorResponse, Payload};
pub use routes::{create_router, ApiDoc, AppState};
