//! Data model types shared by both store backends.

pub mod gallery;
pub mod job;

pub use gallery::{GalleryItem, GalleryPage, GalleryQuery, NewGalleryItem};
pub use job::GenerationJob;
