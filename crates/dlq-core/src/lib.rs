pub mod config;
pub mod control;
pub mod executor;
pub mod item;
pub mod logging;
pub mod observer;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod url_model;
