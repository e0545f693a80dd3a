//! Overlay a development cover watermark on app icons at build time and
//! revert afterward.
//!
//! Development builds get a fixed cover image blended over every application
//! icon so they are visually distinct from release builds. The blend keeps
//! only the alpha the cover does not claim (`source.a - cover.a`), producing
//! a cutout rather than a standard over-blend. Every modified icon slot is
//! tracked and restored to its exact original pixels when the build finishes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use icon_cover_overlay::fs_store::{DirectoryAssetStore, DirectoryIconStore};
//! use icon_cover_overlay::{CoverImage, IconSetManager, DEFAULT_COVER_PATH};
//!
//! let cover = CoverImage::load(Path::new(DEFAULT_COVER_PATH)).expect("cover image");
//! let store = DirectoryIconStore::new("icons", "iOS");
//! let assets = DirectoryAssetStore::new("icons/combined");
//! let mut manager = IconSetManager::new(store, assets, cover);
//!
//! manager.run_overwrite().expect("overwrite icons");
//! // ... run the build ...
//! manager.run_revert().expect("revert icons");
//! ```
//!
//! # Collaborators
//!
//! Icon enumeration and asset persistence are behind the [`store::IconStore`]
//! and [`store::AssetStore`] traits; [`fs_store`] provides directory-backed
//! implementations used by the `icon-cover` CLI and by hosts without their
//! own icon database.

#![deny(missing_docs)]

pub mod compositing;
pub mod cover;
pub mod error;
pub mod fs_store;
mod manager;
pub mod store;

pub use compositing::combine;
pub use cover::{CoverImage, DEFAULT_COVER_PATH};
pub use error::{Error, Result};
pub use manager::IconSetManager;
pub use store::{
    AssetRef, AssetStore, IconImages, IconSlot, IconStore, ImportSettings, VariantKind,
};
