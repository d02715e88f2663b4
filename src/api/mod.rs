//! HTTP API: generative proxy, per-user data endpoints, health and metrics.

pub mod handlers;
pub mod identity;
pub mod routes;

pub use handlers::{GenerateState, StoreState};
pub use identity::UserId;
pub use routes::{data_proxy_router, gateway_router, RouterOptions};
