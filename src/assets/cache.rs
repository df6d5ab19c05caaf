use std::collections::HashMap;

use crate::{
    assets::{datauri::ImageSource, decode::DecodedImage},
    foundation::math::Fnv1a64,
};

/// Content address of an [`ImageSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageKey(u64);

impl ImageKey {
    pub fn of(source: &ImageSource) -> Self {
        let mut hasher = Fnv1a64::new_default();
        hasher.write_u8(b'I');
        hasher.write_bytes(source.as_str().as_bytes());
        Self(hasher.finish())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Decoded pixels keyed by source.
///
/// Entries are inserted once per distinct source and live for the whole session; nothing is
/// evicted.
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    entries: HashMap<ImageKey, DecodedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ImageKey) -> Option<&DecodedImage> {
        self.entries.get(&key)
    }

    pub fn resolve(&self, source: &ImageSource) -> Option<&DecodedImage> {
        self.get(ImageKey::of(source))
    }

    pub fn contains(&self, key: ImageKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Returns `false` (and keeps the existing entry) when the key is already cached.
    pub fn insert(&mut self, key: ImageKey, image: DecodedImage) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        tracing::debug!(
            key = key.as_u64(),
            width = image.width,
            height = image.height,
            "cached decoded image"
        );
        self.entries.insert(key, image);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
