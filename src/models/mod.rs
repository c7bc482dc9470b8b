pub mod blocks;
pub mod config;
pub mod types;

pub use blocks::{CardItem, StreamBlock};
pub use config::Config;
pub use types::{Author, Category, GalleryImage, ListingPage, Post, PostKind, Tag};
