pub mod app_config;
pub mod url_list;

pub use app_config::{AppConfig, Args, load_config, setup_resolver, setup_tls_connector};
