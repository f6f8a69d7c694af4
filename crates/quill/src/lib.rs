pub mod agent;
pub mod errors;
pub mod key_manager;
pub mod models;
pub mod providers;
pub mod toolkit;
