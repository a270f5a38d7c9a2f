pub mod login;
pub mod logout;
pub mod register;
pub mod session;

pub use login::handle_login;
pub use logout::handle_logout;
pub use register::handle_register;
pub use session::{handle_get_session, handle_update_session};
