use serde::{Deserialize, Serialize};

use crate::{Rect, Result, StagehandError};

/// Metadata for a loaded image. Pixel data is owned by the rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

impl ImageInfo {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// An image split into a `rows x columns` grid of equally sized frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteImage {
    image: ImageInfo,
    rows: usize,
    columns: usize,
    sprite_index: usize,
    animation_indices: Vec<usize>,
    /// Milliseconds each animation frame stays on screen.
    change_fps: f64,
}

impl SpriteImage {
    pub fn initialize(image: ImageInfo, rows: usize, columns: usize) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(StagehandError::InvalidInput(format!(
                "sprite grid for `{}` needs at least one row and column",
                image.id
            )));
        }
        Ok(Self {
            image,
            rows,
            columns,
            sprite_index: 0,
            animation_indices: Vec::new(),
            change_fps: 1000.0,
        })
    }

    /// Treats the whole image as a single frame.
    pub fn single(image: ImageInfo) -> Self {
        Self {
            image,
            rows: 1,
            columns: 1,
            sprite_index: 0,
            animation_indices: Vec::new(),
            change_fps: 1000.0,
        }
    }

    pub fn image(&self) -> &ImageInfo {
        &self.image
    }

    pub fn frame_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn frame_width(&self) -> f64 {
        self.image.width / self.columns as f64
    }

    pub fn frame_height(&self) -> f64 {
        self.image.height / self.rows as f64
    }

    pub fn sprite_index(&self) -> usize {
        self.sprite_index
    }

    pub fn set_sprite_index(&mut self, index: usize) -> Result<&mut Self> {
        self.check_index(index)?;
        self.sprite_index = index;
        Ok(self)
    }

    /// Sets the frame sequence played over time. An empty list stops animation.
    pub fn set_animation_image_index(&mut self, indices: Vec<usize>) -> Result<&mut Self> {
        for &index in &indices {
            self.check_index(index)?;
        }
        self.animation_indices = indices;
        Ok(self)
    }

    pub fn set_change_fps(&mut self, millis_per_frame: f64) -> &mut Self {
        self.change_fps = millis_per_frame;
        self
    }

    /// Frame shown at actor time `time`.
    pub fn index_at(&self, time: f64) -> usize {
        if self.animation_indices.is_empty() || self.change_fps <= 0.0 {
            return self.sprite_index;
        }
        let step = (time.max(0.0) / self.change_fps) as usize;
        self.animation_indices[step % self.animation_indices.len()]
    }

    /// Source rectangle of frame `index` inside the image.
    pub fn sub_image(&self, index: usize) -> Option<Rect> {
        if index >= self.frame_count() {
            return None;
        }
        let width = self.frame_width();
        let height = self.frame_height();
        Some(Rect::new(
            (index % self.columns) as f64 * width,
            (index / self.columns) as f64 * height,
            width,
            height,
        ))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.frame_count() {
            Ok(())
        } else {
            Err(StagehandError::InvalidInput(format!(
                "sprite index {index} out of range for `{}` with {} frames",
                self.image.id,
                self.frame_count()
            )))
        }
    }
}

/// Destination rectangle for drawing `image` into a `width x height`
/// thumbnail. With `best_fit` the aspect ratio is kept and the result centred.
pub fn create_thumb(image: &ImageInfo, width: f64, height: f64, best_fit: bool) -> Rect {
    if !best_fit || image.width <= 0.0 || image.height <= 0.0 {
        return Rect::new(0.0, 0.0, width, height);
    }
    let scale = (width / image.width).min(height / image.height);
    let w = image.width * scale;
    let h = image.height * scale;
    Rect::new((width - w) * 0.5, (height - h) * 0.5, w, h)
}
