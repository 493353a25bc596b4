pub mod config;
pub mod logging;

pub const APP_NAME: &str = "FrontDesk";

pub use config::{ConfigError, FrontdeskConfig, LiveKitConfig};
