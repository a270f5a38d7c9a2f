pub mod body;
pub mod headers;
pub mod json_response;
pub mod session;

// Re-export commonly used utilities
pub use body::*;
pub use headers::*;
pub use json_response::*;
pub use session::*;
