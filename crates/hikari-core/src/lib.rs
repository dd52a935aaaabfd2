pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod normalize;
pub mod storage;
pub mod view;
