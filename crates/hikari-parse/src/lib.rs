//! Classify free-form user input as a bangumi season, episode or media id.

pub mod entrance;

pub use entrance::{classify, BangumiInput};
