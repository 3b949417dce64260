use crate::textures::{Texture, TextureKey, TextureResource};
use slotmap::SlotMap;
use tracing::{trace, warn};

/// Owns every live texture of a session.
#[derive(Debug, Default)]
pub struct TextureStore {
    data: SlotMap<TextureKey, Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, texture: impl Into<Texture>) -> TextureKey {
        let texture = texture.into();
        let kind = texture.kind();
        let handle = texture.handle().raw();
        let key = self.data.insert(texture);

        trace!("[Texture Store] Added element: {kind} {key:?} (name {handle})");

        key
    }

    pub fn try_get(&self, key: TextureKey) -> Option<&Texture> {
        self.data.get(key).or_else(|| {
            warn!("[Texture Store] Invalid Reference: {key:?} not found");
            None
        })
    }

    pub fn try_get_mut(&mut self, key: TextureKey) -> Option<&mut Texture> {
        let texture = self.data.get_mut(key);
        if texture.is_none() {
            warn!("[Texture Store] Invalid Reference: {key:?} not found");
        }
        texture
    }

    /// Like [`try_get_mut`](Self::try_get_mut), for keys that may legitimately be gone.
    pub(crate) fn get_mut_quiet(&mut self, key: TextureKey) -> Option<&mut Texture> {
        self.data.get_mut(key)
    }

    pub fn contains(&self, key: TextureKey) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&mut self, key: TextureKey) -> Option<Texture> {
        let texture = self.data.remove(key)?;
        trace!("[Texture Store] Removed element: {} {key:?}", texture.kind());
        Some(texture)
    }

    /// Forgets every texture without releasing it.
    pub fn clear(&mut self) -> usize {
        let dropped = self.data.len();
        self.data.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (TextureKey, &Texture)> {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingContext;
    use crate::textures::{ExternalTexture, SolidTexture, TextureKind};

    #[test]
    fn stale_keys_stay_stale() {
        let mut ctx = RecordingContext::default();
        let mut store = TextureStore::new();

        let key = store.add(SolidTexture::new(&mut ctx, [1, 2, 3, 4]).unwrap());
        assert_eq!(store.try_get(key).map(Texture::kind), Some(TextureKind::Solid));

        assert!(store.remove(key).is_some());
        assert!(store.remove(key).is_none());
        assert!(store.try_get(key).is_none());

        let reused = store.add(SolidTexture::new(&mut ctx, [0; 4]).unwrap());
        assert_ne!(reused, key);
        assert!(!store.contains(key));
    }

    #[test]
    fn items_lists_live_textures() {
        let mut ctx = RecordingContext::default();
        let mut store = TextureStore::new();

        let solid = store.add(SolidTexture::new(&mut ctx, [1, 1, 1, 1]).unwrap());
        let external = store.add(ExternalTexture::new_2d(&mut ctx).unwrap());
        let gone = store.add(SolidTexture::new(&mut ctx, [2, 2, 2, 2]).unwrap());
        store.remove(gone);

        let mut items: Vec<_> = store
            .items()
            .map(|(key, texture)| (key, texture.kind()))
            .collect();
        items.sort_by_key(|(key, _)| *key);
        assert_eq!(
            items,
            vec![(solid, TextureKind::Solid), (external, TextureKind::External)]
        );
    }
}
