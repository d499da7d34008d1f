use std::fmt;

use foundation::arena::Arena;
use foundation::handles::Handle;
use runtime::theme::Theme;

use crate::region_map::RegionSet;

/// What a texture was built for: the base land layer (`regions: None`) or a
/// highlight of specific regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureTag {
    pub theme: Theme,
    pub regions: Option<RegionSet>,
}

impl TextureTag {
    pub fn land(theme: Theme) -> Self {
        Self {
            theme,
            regions: None,
        }
    }

    pub fn highlight(theme: Theme, regions: RegionSet) -> Self {
        Self {
            theme,
            regions: Some(regions),
        }
    }

    pub fn is_highlight(&self) -> bool {
        self.regions.is_some()
    }
}

impl fmt::Display for TextureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.regions {
            None => write!(f, "land/{}", self.theme),
            Some(set) => write!(f, "highlight/{}/{set}", self.theme),
        }
    }
}

/// Equirectangular RGBA8 texture ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub tag: TextureTag,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// blake3 of the pixel bytes, lowercase hex.
    pub digest: String,
    /// 1×1 stand-in produced when the full-size surface was unavailable.
    pub fallback: bool,
}

impl TextureAsset {
    pub fn new(tag: TextureTag, width: u32, height: u32, pixels: Vec<u8>, fallback: bool) -> Self {
        let digest = blake3::hash(&pixels).to_hex().to_string();
        Self {
            tag,
            width,
            height,
            pixels,
            digest,
            fallback,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Owner of every live texture. Handles stay valid until released.
#[derive(Debug, Default)]
pub struct TextureStore {
    assets: Arena<TextureAsset>,
    built: u64,
    released: u64,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: TextureAsset) -> Handle {
        tracing::debug!(
            tag = %asset.tag,
            size = %format_args!("{}x{}", asset.width, asset.height),
            digest = %asset.digest,
            "texture registered"
        );
        self.built += 1;
        self.assets.insert(asset)
    }

    pub fn get(&self, handle: Handle) -> Option<&TextureAsset> {
        self.assets.get(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.assets.contains(handle)
    }

    pub fn release(&mut self, handle: Handle) -> Option<TextureAsset> {
        let asset = self.assets.remove(handle)?;
        tracing::debug!(tag = %asset.tag, handle = %handle, "texture released");
        self.released += 1;
        Some(asset)
    }

    pub fn find_by_tag(&self, tag: &TextureTag) -> Option<Handle> {
        self.assets
            .iter()
            .find(|(_, asset)| &asset.tag == tag)
            .map(|(handle, _)| handle)
    }

    pub fn live_count(&self) -> usize {
        self.assets.len()
    }

    pub fn live_bytes(&self) -> usize {
        self.assets.iter().map(|(_, a)| a.byte_len()).sum()
    }

    pub fn built_count(&self) -> u64 {
        self.built
    }

    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// Releases everything; returns how many textures were dropped.
    pub fn release_all(&mut self) -> usize {
        let drained = self.assets.drain();
        self.released += drained.len() as u64;
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "released all textures");
        }
        drained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{TextureAsset, TextureStore, TextureTag};
    use crate::region_map::RegionSet;
    use foundation::ids::RegionId;
    use runtime::theme::Theme;

    fn asset(tag: TextureTag) -> TextureAsset {
        TextureAsset::new(tag, 1, 1, vec![1, 2, 3, 4], false)
    }

    #[test]
    fn digest_depends_on_pixels_only() {
        let a = asset(TextureTag::land(Theme::Dark));
        let b = asset(TextureTag::land(Theme::Light));
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn release_invalidates_handle_and_counts() {
        let mut store = TextureStore::new();
        let land = store.insert(asset(TextureTag::land(Theme::Dark)));
        let tag = TextureTag::highlight(Theme::Dark, RegionSet::new([RegionId(4)]));
        let hl = store.insert(asset(tag.clone()));
        assert_eq!(store.find_by_tag(&tag), Some(hl));
        assert_eq!(store.live_count(), 2);

        assert!(store.release(hl).is_some());
        assert!(store.release(hl).is_none());
        assert!(!store.contains(hl));
        assert!(store.find_by_tag(&tag).is_none());

        let again = store.insert(asset(tag));
        assert_ne!(again, hl);
        assert!(store.contains(land));
        assert_eq!(store.release_all(), 2);
        assert_eq!(store.live_count(), 0);
        assert_eq!((store.built_count(), store.released_count()), (3, 3));
    }

    #[test]
    fn tags_display_readably() {
        let tag = TextureTag::highlight(Theme::Light, RegionSet::new([RegionId(76), RegionId(4)]));
        assert_eq!(tag.to_string(), "highlight/light/[4,76]");
        assert_eq!(TextureTag::land(Theme::Dark).to_string(), "land/dark");
    }
}
