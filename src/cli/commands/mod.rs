mod config;

pub use config::{cmd_config_check, cmd_config_init};
