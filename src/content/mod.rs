//! Content sources: article folder discovery and front-matter.

pub mod discover;
pub mod meta;

pub use discover::{ArticleFolder, discover};
pub use meta::{Article, ArticleMetadata, MetadataError};
