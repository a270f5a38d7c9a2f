/// Tower middleware wrapped around the router service.
pub mod tower_timeout_handler;

pub use tower_timeout_handler::{TimeoutLayer, TimeoutService};
