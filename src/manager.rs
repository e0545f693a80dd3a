//! Overwrite/revert lifecycle for the icon set.

use std::collections::BTreeMap;

use image::Rgba32FImage;

use crate::compositing;
use crate::cover::CoverImage;
use crate::error::Result;
use crate::store::{
    AssetRef, AssetStore, IconImages, IconStore, ImportSettings, VariantKind,
};

/// A generated combined icon together with its persisted asset.
#[derive(Debug, Clone)]
struct CombinedIcon {
    image: Rgba32FImage,
    asset: AssetRef,
}

/// A combined sequence, positionally parallel to the originals it replaced.
type CombinedImages = Vec<Option<CombinedIcon>>;

/// State recorded by an overwrite pass and consumed by the matching revert.
///
/// Lives only inside one [`IconSetManager`] value; a second overwrite without
/// an intervening revert replaces it wholesale, so the true originals are
/// recoverable at most once per cycle.
#[derive(Debug, Default)]
struct TrackingState {
    default_originals: Option<IconImages>,
    default_combined: Option<CombinedImages>,
    platform_originals: BTreeMap<VariantKind, Vec<IconImages>>,
    platform_combined: BTreeMap<VariantKind, Vec<CombinedImages>>,
}

/// Orchestrates blending the cover over every icon slot and restoring the
/// originals afterward.
///
/// One manager owns one overwrite/revert cycle: the build-pipeline host calls
/// [`run_overwrite`](Self::run_overwrite) before the build and
/// [`run_revert`](Self::run_revert) after it, on the same value. Reverting
/// without a prior overwrite (or twice in a row) is a safe no-op.
pub struct IconSetManager<S, A> {
    store: S,
    assets: A,
    cover: CoverImage,
    tracking: TrackingState,
}

impl<S: IconStore, A: AssetStore> IconSetManager<S, A> {
    /// Create a manager over the given stores with an already-loaded cover.
    pub fn new(store: S, assets: A, cover: CoverImage) -> Self {
        Self {
            store,
            assets,
            cover,
            tracking: TrackingState::default(),
        }
    }

    /// The icon store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The asset store.
    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// Consume the manager, returning its stores.
    pub fn into_parts(self) -> (S, A) {
        (self.store, self.assets)
    }

    /// Overwrite the default icons, then every platform variant-kind.
    ///
    /// # Errors
    ///
    /// Fails on any store error; the pass stops at the failure point with no
    /// rollback of changes already applied.
    pub fn run_overwrite(&mut self) -> Result<()> {
        self.overwrite_default_icons()?;
        self.overwrite_platform_icons()
    }

    /// Revert in mirrored order: platform variant-kinds, then the default
    /// icons.
    ///
    /// # Errors
    ///
    /// Fails on any store error; the pass stops at the failure point.
    pub fn run_revert(&mut self) -> Result<()> {
        self.revert_platform_icons()?;
        self.revert_default_icons()
    }

    /// Blend the cover over the default icon sequence.
    ///
    /// A slot with no non-absent image is left untouched and untracked.
    ///
    /// # Errors
    ///
    /// Fails if a combined asset cannot be saved or configured, or if the
    /// store cannot be read or written.
    pub fn overwrite_default_icons(&mut self) -> Result<()> {
        let icons = self.store.default_icons()?;
        if icons.iter().all(Option::is_none) {
            log::debug!("default icon slot is empty, nothing to overwrite");
            return Ok(());
        }

        let combined = self.combine_and_save(&icons, None, None)?;
        self.store.set_default_icons(replacement_images(&combined))?;
        log::info!("overwrote {} default icon(s)", count_present(&icons));

        self.tracking.default_originals = Some(icons);
        self.tracking.default_combined = Some(combined);
        Ok(())
    }

    /// Blend the cover over every supported platform variant-kind.
    ///
    /// Kinds whose slots hold no non-absent image are skipped without store
    /// writes or tracking entries.
    ///
    /// # Errors
    ///
    /// Fails if a combined asset cannot be saved or configured, or if the
    /// store cannot be read or written.
    pub fn overwrite_platform_icons(&mut self) -> Result<()> {
        let kinds = self.store.supported_variant_kinds()?;
        let scope = self.store.target_name().to_string();

        for kind in kinds {
            let mut slots = self.store.platform_icon_slots(&kind)?;
            if slots
                .iter()
                .all(|slot| slot.images().iter().all(Option::is_none))
            {
                log::debug!("variant-kind '{kind}' holds no icons, skipping");
                continue;
            }

            let mut originals = Vec::with_capacity(slots.len());
            let mut combined = Vec::with_capacity(slots.len());
            for slot in &mut slots {
                let images = slot.images().to_vec();
                let slot_combined = self.combine_and_save(&images, Some(&scope), Some(&kind))?;
                slot.set_images(replacement_images(&slot_combined));
                originals.push(images);
                combined.push(slot_combined);
            }

            self.store.set_platform_icon_slots(&kind, slots)?;
            log::info!("overwrote icons for variant-kind '{kind}'");

            self.tracking.platform_originals.insert(kind.clone(), originals);
            self.tracking.platform_combined.insert(kind, combined);
        }
        Ok(())
    }

    /// Delete the generated default-icon assets and restore the recorded
    /// originals. No-op when nothing is tracked.
    ///
    /// # Errors
    ///
    /// Fails if an asset cannot be deleted or the store cannot be written.
    pub fn revert_default_icons(&mut self) -> Result<()> {
        let (Some(originals), Some(combined)) = (
            self.tracking.default_originals.take(),
            self.tracking.default_combined.take(),
        ) else {
            return Ok(());
        };

        for entry in combined.iter().flatten() {
            self.assets.delete_asset(&entry.asset)?;
        }
        self.store.set_default_icons(originals)?;
        log::info!("reverted default icons");
        Ok(())
    }

    /// Delete every tracked variant-kind's generated assets and restore the
    /// recorded originals. No-op when nothing is tracked.
    ///
    /// A kind with deletions recorded but no originals has its assets deleted
    /// and its restoration skipped.
    ///
    /// # Errors
    ///
    /// Fails if an asset cannot be deleted or the store cannot be read or
    /// written.
    pub fn revert_platform_icons(&mut self) -> Result<()> {
        if self.tracking.platform_combined.is_empty() {
            return Ok(());
        }

        let combined_map = std::mem::take(&mut self.tracking.platform_combined);
        let originals_map = std::mem::take(&mut self.tracking.platform_originals);

        for (kind, slot_sequences) in combined_map {
            for entry in slot_sequences.iter().flatten().flatten() {
                self.assets.delete_asset(&entry.asset)?;
            }

            let Some(original_slots) = originals_map.get(&kind) else {
                log::warn!("no originals recorded for variant-kind '{kind}', skipping restore");
                continue;
            };

            let mut slots = self.store.platform_icon_slots(&kind)?;
            for (slot, originals) in slots.iter_mut().zip(original_slots) {
                slot.set_images(originals.clone());
            }
            self.store.set_platform_icon_slots(&kind, slots)?;
            log::info!("reverted icons for variant-kind '{kind}'");
        }
        Ok(())
    }

    /// Combine each non-absent image with the cover, persist and configure
    /// the result, and return the positionally parallel combined sequence.
    fn combine_and_save(
        &mut self,
        images: &[Option<Rgba32FImage>],
        scope: Option<&str>,
        kind: Option<&VariantKind>,
    ) -> Result<CombinedImages> {
        let many = images.len() > 1;
        let mut combined = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let Some(source) = image else {
                combined.push(None);
                continue;
            };

            let cover = self.cover.resampled(source.width(), source.height());
            let blended = compositing::combine(source, &cover);

            let name = asset_name(scope, kind, index, many);
            let asset = self.assets.save_named_image(&name, &blended)?;
            self.assets
                .configure_imported_asset(&asset, ImportSettings::ui_icon())?;
            log::debug!("saved combined icon asset '{asset}'");

            combined.push(Some(CombinedIcon {
                image: blended,
                asset,
            }));
        }
        Ok(combined)
    }
}

/// Generated asset name: `Combined.Icon[.<scope>][.<kind>][.<index>].png`.
///
/// The index appears only when the slot's sequence holds more than one entry.
fn asset_name(scope: Option<&str>, kind: Option<&VariantKind>, index: usize, many: bool) -> String {
    let scope_part = scope
        .filter(|s| !s.is_empty())
        .map(|s| format!(".{s}"))
        .unwrap_or_default();
    let kind_part = kind.map(|k| format!(".{k}")).unwrap_or_default();
    let index_part = if many {
        format!(".{index}")
    } else {
        String::new()
    };
    format!("Combined.Icon{scope_part}{kind_part}{index_part}.png")
}

/// The image sequence a slot receives in place of its originals.
fn replacement_images(combined: &[Option<CombinedIcon>]) -> IconImages {
    combined
        .iter()
        .map(|entry| entry.as_ref().map(|c| c.image.clone()))
        .collect()
}

fn count_present(images: &[Option<Rgba32FImage>]) -> usize {
    images.iter().flatten().count()
}
