pub mod admin;
pub mod auth;
pub mod profile;
pub mod routes;
pub mod utils;

pub use routes::{Router, build_router};
