//! Collaborator interfaces for icon slots and asset persistence.
//!
//! The manager never talks to a concrete icon database; it goes through
//! [`IconStore`] (slot enumeration and replacement) and [`AssetStore`]
//! (saving, configuring and deleting generated assets). A directory-backed
//! implementation of both lives in [`crate::fs_store`].

use std::fmt;

use image::Rgba32FImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An icon image sequence; `None` marks an explicitly absent entry.
///
/// Absent entries are skipped by compositing and by revert-deletion, and
/// stay absent in combined sequences.
pub type IconImages = Vec<Option<Rgba32FImage>>;

/// A platform-defined category of icon within one platform's icon set.
///
/// Kinds are opaque keys owned by the icon store; the manager only groups,
/// orders and reports by them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantKind(String);

impl VariantKind {
    /// Create a kind from its store-defined name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The kind's name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One platform icon slot: a named location holding a sequence of
/// size-variant images.
#[derive(Debug, Clone, Default)]
pub struct IconSlot {
    name: String,
    images: IconImages,
}

impl IconSlot {
    /// Create a slot with its image sequence.
    pub fn new(name: impl Into<String>, images: IconImages) -> Self {
        Self {
            name: name.into(),
            images,
        }
    }

    /// The slot's store-defined name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The slot's current image sequence.
    #[must_use]
    pub fn images(&self) -> &[Option<Rgba32FImage>] {
        &self.images
    }

    /// Replace the slot's image sequence.
    pub fn set_images(&mut self, images: IconImages) {
        self.images = images;
    }
}

/// Opaque reference to a persisted asset, produced by
/// [`AssetStore::save_named_image`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRef(String);

impl AssetRef {
    /// Create a reference from a store-defined identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a saved icon asset should be imported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    /// Plain texture, store defaults apply.
    Default,
    /// UI icon texture.
    UiIcon,
}

/// Texture compression applied on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    /// Store the texture uncompressed.
    None,
    /// Store-default compression.
    Normal,
}

/// Import configuration applied to every generated combined icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Import category of the asset.
    pub kind: ImportKind,
    /// Treat the alpha channel as transparency.
    pub alpha_is_transparency: bool,
    /// Compression applied on import.
    pub compression: Compression,
}

impl ImportSettings {
    /// Settings for a generated UI icon: alpha is transparency, uncompressed.
    #[must_use]
    pub fn ui_icon() -> Self {
        Self {
            kind: ImportKind::UiIcon,
            alpha_is_transparency: true,
            compression: Compression::None,
        }
    }
}

/// Access to the icon slots of the active build context.
pub trait IconStore {
    /// Name of the active build target, used in generated asset names.
    /// Empty for a target-agnostic store.
    fn target_name(&self) -> &str;

    /// The default (platform-agnostic) icon sequence.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read.
    fn default_icons(&self) -> Result<IconImages>;

    /// Replace the default icon sequence.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be written.
    fn set_default_icons(&mut self, icons: IconImages) -> Result<()>;

    /// Variant-kinds supported by the active build context.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read.
    fn supported_variant_kinds(&self) -> Result<Vec<VariantKind>>;

    /// Current slots for one variant-kind.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read.
    fn platform_icon_slots(&self, kind: &VariantKind) -> Result<Vec<IconSlot>>;

    /// Persist updated slots for one variant-kind.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be written.
    fn set_platform_icon_slots(&mut self, kind: &VariantKind, slots: Vec<IconSlot>) -> Result<()>;
}

/// Persistence for generated combined-icon assets.
pub trait AssetStore {
    /// Save `image` under `name` and return a reference to the new asset.
    ///
    /// # Errors
    ///
    /// Fails if the asset cannot be written.
    fn save_named_image(&mut self, name: &str, image: &Rgba32FImage) -> Result<AssetRef>;

    /// Apply import settings to a freshly saved asset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetConfiguration`](crate::Error::AssetConfiguration)
    /// if no configurable handle exists for the asset. This aborts the pass.
    fn configure_imported_asset(&mut self, asset: &AssetRef, settings: ImportSettings)
        -> Result<()>;

    /// Delete a previously saved asset.
    ///
    /// # Errors
    ///
    /// Fails if the asset cannot be removed.
    fn delete_asset(&mut self, asset: &AssetRef) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_kind_displays_its_name() {
        let kind = VariantKind::new("Notification");
        assert_eq!(kind.as_str(), "Notification");
        assert_eq!(kind.to_string(), "Notification");
    }

    #[test]
    fn ui_icon_settings() {
        let settings = ImportSettings::ui_icon();
        assert_eq!(settings.kind, ImportKind::UiIcon);
        assert!(settings.alpha_is_transparency);
        assert_eq!(settings.compression, Compression::None);
    }

    #[test]
    fn slot_sequence_replacement() {
        let mut slot = IconSlot::new("spotlight", vec![None, None]);
        assert_eq!(slot.name(), "spotlight");
        assert_eq!(slot.images().len(), 2);

        slot.set_images(vec![None]);
        assert_eq!(slot.images().len(), 1);
    }
}
