pub mod audio;
pub mod cache;
pub mod config;
pub mod i18n;
pub mod quiz;
pub mod render;
pub mod security;
pub mod server;
pub mod site;
pub mod translations;
