//! Core library for side-by-side map comparison.
//!
//! Keeps two map viewports on the same camera, maps named scales to zoom
//! levels, measures drawn shapes geodesically and loads a shared dataset
//! into both viewports.

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geodesy;
pub mod loader;
pub mod notify;
pub mod scale;
pub mod session;
pub mod sync;
pub mod viewport;

pub use error::{MapError, Result};
pub use session::MapSession;
