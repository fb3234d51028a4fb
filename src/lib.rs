pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod i18n;
pub mod search;
pub mod state;
pub mod storage;
pub mod utils;
