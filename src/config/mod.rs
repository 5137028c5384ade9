//! Configuration: project settings (`.lockbox.toml` + `LOCKBOX_*`
//! overrides) and the persisted app config holding the KeyUUID.

pub mod app_config;
pub mod settings;

pub use app_config::AppConfig;
pub use settings::{Environment, Settings};
