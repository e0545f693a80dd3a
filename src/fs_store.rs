//! Directory-backed implementations of the store traits.
//!
//! Layout understood by [`DirectoryIconStore`]:
//!
//! ```text
//! icons/
//!   AppIcon.png           default icons (PNGs directly under the root)
//!   Notification/         one variant-kind per subdirectory
//!     main/               one slot per nested subdirectory
//!       20.png
//!       40.png
//!   Settings/             a kind holding loose PNGs is one implicit slot
//!     29.png
//! ```
//!
//! Sequences are ordered by filename. Writes go back positionally onto the
//! same files, so a pass must not race with external directory changes
//! (the build pipeline invokes passes serially).

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, Rgba32FImage, RgbaImage};

use crate::error::{Error, Result};
use crate::store::{
    AssetRef, AssetStore, IconImages, IconSlot, IconStore, ImportSettings, VariantKind,
};

/// Icon store reading and writing PNG files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryIconStore {
    root: PathBuf,
    target: String,
}

impl DirectoryIconStore {
    /// Create a store over `root` for the named build target.
    pub fn new(root: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            target: target.into(),
        }
    }

    fn kind_dir(&self, kind: &VariantKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    fn slot_dir(&self, kind: &VariantKind, slot: &IconSlot) -> PathBuf {
        let nested = self.kind_dir(kind).join(slot.name());
        if nested.is_dir() {
            nested
        } else {
            // Implicit slot: the kind directory itself.
            self.kind_dir(kind)
        }
    }
}

impl IconStore for DirectoryIconStore {
    fn target_name(&self) -> &str {
        &self.target
    }

    fn default_icons(&self) -> Result<IconImages> {
        list_pngs(&self.root)?
            .iter()
            .map(|path| load_image(path).map(Some))
            .collect()
    }

    fn set_default_icons(&mut self, icons: IconImages) -> Result<()> {
        write_sequence(&self.root, &icons)
    }

    fn supported_variant_kinds(&self) -> Result<Vec<VariantKind>> {
        Ok(list_subdirs(&self.root)?
            .iter()
            .filter_map(|dir| dir.file_name())
            .map(|name| VariantKind::new(name.to_string_lossy()))
            .collect())
    }

    fn platform_icon_slots(&self, kind: &VariantKind) -> Result<Vec<IconSlot>> {
        let kind_dir = self.kind_dir(kind);
        let slot_dirs = list_subdirs(&kind_dir)?;

        if slot_dirs.is_empty() {
            let images = load_sequence(&kind_dir)?;
            return Ok(vec![IconSlot::new(kind.as_str(), images)]);
        }

        slot_dirs
            .iter()
            .map(|dir| {
                let name = dir.file_name().unwrap_or_default().to_string_lossy();
                Ok(IconSlot::new(name, load_sequence(dir)?))
            })
            .collect()
    }

    fn set_platform_icon_slots(&mut self, kind: &VariantKind, slots: Vec<IconSlot>) -> Result<()> {
        for slot in &slots {
            write_sequence(&self.slot_dir(kind, slot), slot.images())?;
        }
        Ok(())
    }
}

/// Asset store writing clamped 8-bit PNGs plus a JSON import sidecar.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
}

impl DirectoryAssetStore {
    /// Create a store writing assets under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirectoryAssetStore {
    fn save_named_image(&mut self, name: &str, image: &Rgba32FImage) -> Result<AssetRef> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(name);
        to_rgba8_clamped(image).save(&path)?;
        Ok(AssetRef::new(path.to_string_lossy()))
    }

    fn configure_imported_asset(
        &mut self,
        asset: &AssetRef,
        settings: ImportSettings,
    ) -> Result<()> {
        let path = Path::new(asset.as_str());
        if !path.is_file() {
            return Err(Error::AssetConfiguration {
                path: asset.as_str().to_string(),
            });
        }
        let json = serde_json::to_string_pretty(&settings)?;
        fs::write(meta_path(asset), json)?;
        Ok(())
    }

    fn delete_asset(&mut self, asset: &AssetRef) -> Result<()> {
        fs::remove_file(asset.as_str())?;
        let meta = meta_path(asset);
        if meta.is_file() {
            fs::remove_file(meta)?;
        }
        Ok(())
    }
}

fn meta_path(asset: &AssetRef) -> PathBuf {
    PathBuf::from(format!("{}.meta", asset.as_str()))
}

/// PNG files directly under `dir`, sorted by filename. Missing directories
/// read as empty.
fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Immediate subdirectories of `dir`, sorted. Missing directories read as
/// empty.
fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn load_image(path: &Path) -> Result<Rgba32FImage> {
    Ok(image::open(path)?.to_rgba32f())
}

fn load_sequence(dir: &Path) -> Result<IconImages> {
    list_pngs(dir)?
        .iter()
        .map(|path| load_image(path).map(Some))
        .collect()
}

/// Write `images` positionally over the PNGs currently listed in `dir`.
/// Absent entries leave their file untouched.
fn write_sequence(dir: &Path, images: &[Option<Rgba32FImage>]) -> Result<()> {
    let paths = list_pngs(dir)?;
    if paths.len() != images.len() {
        log::warn!(
            "sequence length {} does not match {} file(s) in '{}'",
            images.len(),
            paths.len(),
            dir.display()
        );
    }
    for (path, image) in paths.iter().zip(images) {
        if let Some(image) = image {
            to_rgba8_clamped(image).save(path)?;
        }
    }
    Ok(())
}

/// Convert to 8-bit RGBA, clamping each channel into `[0, 1]` first.
///
/// This is the storage-layer clamp: the compositor lets color channels leave
/// the unit range and relies on the write path to bring them back.
fn to_rgba8_clamped(image: &Rgba32FImage) -> RgbaImage {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn unit_to_u8(channel: f32) -> u8 {
        (channel.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        Rgba(image.get_pixel(x, y).0.map(unit_to_u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_png(path: &Path, rgba: [u8; 4]) {
        RgbaImage::from_pixel(4, 4, Rgba(rgba)).save(path).unwrap();
    }

    #[test]
    fn default_icons_are_listed_in_filename_order() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("b.png"), [0, 255, 0, 255]);
        write_png(&dir.path().join("a.png"), [255, 0, 0, 255]);

        let store = DirectoryIconStore::new(dir.path(), "iOS");
        let icons = store.default_icons().unwrap();
        assert_eq!(icons.len(), 2);
        let first = icons[0].as_ref().unwrap().get_pixel(0, 0).0;
        assert_eq!(first, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_root_reads_as_empty() {
        let store = DirectoryIconStore::new("/nonexistent/icons", "iOS");
        assert!(store.default_icons().unwrap().is_empty());
        assert!(store.supported_variant_kinds().unwrap().is_empty());
    }

    #[test]
    fn kinds_and_slots_are_discovered_from_subdirectories() {
        let dir = tempdir().unwrap();
        let notify = dir.path().join("Notification").join("main");
        fs::create_dir_all(&notify).unwrap();
        write_png(&notify.join("20.png"), [10, 20, 30, 255]);
        write_png(&notify.join("40.png"), [40, 50, 60, 255]);

        let settings = dir.path().join("Settings");
        fs::create_dir_all(&settings).unwrap();
        write_png(&settings.join("29.png"), [70, 80, 90, 255]);

        let store = DirectoryIconStore::new(dir.path(), "iOS");
        let kinds = store.supported_variant_kinds().unwrap();
        assert_eq!(
            kinds,
            vec![VariantKind::new("Notification"), VariantKind::new("Settings")]
        );

        let notify_slots = store.platform_icon_slots(&kinds[0]).unwrap();
        assert_eq!(notify_slots.len(), 1);
        assert_eq!(notify_slots[0].name(), "main");
        assert_eq!(notify_slots[0].images().len(), 2);

        // Loose PNGs form one implicit slot named after the kind.
        let settings_slots = store.platform_icon_slots(&kinds[1]).unwrap();
        assert_eq!(settings_slots.len(), 1);
        assert_eq!(settings_slots[0].name(), "Settings");
        assert_eq!(settings_slots[0].images().len(), 1);
    }

    #[test]
    fn asset_save_configure_delete_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryAssetStore::new(dir.path());
        let image = Rgba32FImage::from_pixel(4, 4, Rgba([0.5, 0.5, 0.5, 1.0]));

        let asset = store.save_named_image("Combined.Icon.png", &image).unwrap();
        assert!(Path::new(asset.as_str()).is_file());

        store
            .configure_imported_asset(&asset, ImportSettings::ui_icon())
            .unwrap();
        let meta = fs::read_to_string(meta_path(&asset)).unwrap();
        assert!(meta.contains("UiIcon"));
        assert!(meta.contains("alpha_is_transparency"));

        store.delete_asset(&asset).unwrap();
        assert!(!Path::new(asset.as_str()).exists());
        assert!(!meta_path(&asset).exists());
    }

    #[test]
    fn configure_without_saved_file_is_fatal() {
        let mut store = DirectoryAssetStore::new("/tmp");
        let missing = AssetRef::new("/nonexistent/Combined.Icon.png");
        let err = store
            .configure_imported_asset(&missing, ImportSettings::ui_icon())
            .unwrap_err();
        assert!(matches!(err, Error::AssetConfiguration { .. }));
    }

    #[test]
    fn out_of_range_channels_are_clamped_on_write() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryAssetStore::new(dir.path());
        let image = Rgba32FImage::from_pixel(2, 2, Rgba([1.5, -0.2, 0.5, 1.0]));

        let asset = store.save_named_image("hot.png", &image).unwrap();
        let reloaded = load_image(Path::new(asset.as_str())).unwrap();
        let px = reloaded.get_pixel(0, 0).0;
        assert_eq!(px[0], 1.0);
        assert_eq!(px[1], 0.0);
    }
}
