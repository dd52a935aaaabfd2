pub mod bili;
pub mod traits;

pub use bili::{BiliClient, BiliError};
pub use traits::{MediaInfo, MetadataSource, StreamResolver};
