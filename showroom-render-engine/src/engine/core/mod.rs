pub mod app_setup;
pub mod app_state;
pub mod frame;
pub mod window_config;
