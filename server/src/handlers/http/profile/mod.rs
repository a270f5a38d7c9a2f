pub mod settings;

pub use settings::handle_update_settings;
