//! Pure domain logic for the easel gateway.
//!
//! Everything here is synchronous and I/O-free: the preset catalog, the
//! model-name resolver, parameter clamping, prompt handling, sampler
//! translation, and media URL/kind normalization. The grid, chain, and
//! storage crates build on these types; the api crate wires them to HTTP.

pub mod catalog;
pub mod error;
pub mod media;
pub mod params;
pub mod prompts;
pub mod resolve;
pub mod sampler;
pub mod status;

pub use error::CoreError;
