pub mod catalog;
pub mod config;
pub mod logging;
pub mod sync;
pub mod version;
