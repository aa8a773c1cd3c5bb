use std::collections::HashMap;

use crate::{
    sprite::{ImageInfo, SpriteImage},
    Result, StagehandError,
};

/// Registry of images referenced by actors.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<String, ImageInfo>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
        }
    }

    /// Registers an image, replacing any previous entry with the same id.
    pub fn register(&mut self, image: ImageInfo) {
        if self.images.insert(image.id.clone(), image).is_some() {
            tracing::debug!("replaced previously registered image");
        }
    }

    pub fn get(&self, id: &str) -> Result<&ImageInfo> {
        self.images
            .get(id)
            .ok_or_else(|| StagehandError::not_found("image", id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Builds a sprite sheet over a registered image.
    pub fn sprite(&self, id: &str, rows: usize, columns: usize) -> Result<SpriteImage> {
        SpriteImage::initialize(self.get(id)?.clone(), rows, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_images() {
        let mut store = ImageStore::new();
        store.register(ImageInfo::new("hero", 64.0, 32.0));

        assert_eq!(store.get("hero").unwrap().width, 64.0);
        let sprite = store.sprite("hero", 1, 2).unwrap();
        assert_eq!(sprite.frame_width(), 32.0);
    }

    #[test]
    fn errors_on_missing_images() {
        let store = ImageStore::new();
        let err = store.get("missing.png").unwrap_err();
        assert!(matches!(err, StagehandError::ResourceNotFound { kind: "image", .. }));
        assert!(format!("{err}").contains("missing.png"));
        assert!(store.sprite("missing.png", 1, 1).is_err());
    }
}
