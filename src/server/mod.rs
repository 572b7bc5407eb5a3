//! HTTP layer: routes, handlers, shared state, and server lifecycle.

pub mod handlers;
pub mod routes;
pub mod runtime;
pub mod state;

pub use state::AppState;
