//! HTTP client for the distributed compute grid.
//!
//! Wraps the grid's REST surface (model telemetry, async job submission,
//! job status polling) behind the [`GridApi`] trait so handlers and tests
//! can swap in scripted doubles.

pub mod client;
pub mod wire;

pub use client::{GridApi, GridClient, GridError};
