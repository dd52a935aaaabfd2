pub mod client;
pub mod error;
pub mod types;

pub use client::{BiliClient, ClientOptions};
pub use error::BiliError;
