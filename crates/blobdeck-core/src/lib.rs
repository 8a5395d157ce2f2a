pub mod browser;
pub mod bulk;
pub mod config;
pub mod doctor;
pub mod env;
pub mod executor;
pub mod format;
pub mod memory;
pub mod modal;
pub mod nav;
pub mod page;
pub mod store;
pub mod time;
