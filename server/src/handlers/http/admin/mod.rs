pub mod users;

pub use users::{handle_change_role, handle_delete_user, handle_get_users};
