use image::RgbaImage;

/// CPU-side texture: an RGBA8 image waiting to be uploaded by the host.
#[derive(Debug, Clone)]
pub struct Texture {
    pub label: String,
    pub image: RgbaImage,
    pub generate_mipmaps: bool,
}

impl Texture {
    #[must_use]
    pub fn new(label: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            label: label.into(),
            image,
            generate_mipmaps: false,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
