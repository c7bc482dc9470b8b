pub mod core;
pub mod models;
pub mod theme;
pub mod utils;

// Re-export commonly used types and traits
pub use crate::core::{resolve, ContentRepository, Engine, PageRepository, PostQuery, QueryError};
pub use crate::models::{Author, Category, ListingPage, Post, PostKind, Tag};
pub use crate::theme::renderer::ThemeRenderer;
