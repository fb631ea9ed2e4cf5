pub mod gallery;
pub mod jobs;
pub mod models;
pub mod styles;
