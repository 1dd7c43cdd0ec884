//! Folio: a local photo gallery for a personal portfolio.
//!
//! Photos are kept in a string-keyed local store (see [`storage`]), managed
//! by [`store::PhotoStore`] and projected onto any UI through the surfaces
//! in [`ui`].

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod store;
pub mod ui;
pub mod upload;

pub use error::{GalleryError, Result};
