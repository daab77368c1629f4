use std::{io, path::Path, rc::Rc};

use tracing::debug;

use super::{
    driver::{SharedDriver, TextureId},
    errors::TextureError,
};

const RGBA_BYTES: usize = 4;

/// Decoded RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl TextureData {
    /// Wraps an RGBA8 buffer whose rows are `stride` bytes apart. Only
    /// tightly packed rows can be uploaded.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if stride != width as usize * RGBA_BYTES {
            return Err(TextureError::UnsupportedStride { width, stride });
        }
        let expected = stride * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::MalformedPixels {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    /// Decodes a PNG, JPEG or GIF image into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_raw(
            width,
            height,
            width as usize * RGBA_BYTES,
            image.into_raw(),
        )
    }

    pub fn open<P>(path: P) -> Result<Self, TextureError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TextureError::NotFound {
                path: path.to_path_buf(),
            },
            _ => TextureError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A 2D texture on the driver. Deleted when dropped.
pub struct Texture {
    driver: SharedDriver,
    texture_id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn load<P>(driver: &SharedDriver, path: P) -> Result<Self, TextureError>
    where
        P: AsRef<Path>,
    {
        let data = TextureData::open(path.as_ref())?;
        debug!(
            path = %path.as_ref().display(),
            width = data.width,
            height = data.height,
            "decoded texture"
        );
        Ok(Self::upload(driver, &data))
    }

    /// Uploads `data` on texture unit 0 and generates its mipmaps.
    pub fn upload(driver: &SharedDriver, data: &TextureData) -> Self {
        let texture = Self {
            driver: Rc::clone(driver),
            texture_id: driver.create_texture(),
            width: data.width,
            height: data.height,
        };
        texture.bind();
        driver.upload_texture_2d(data.width, data.height, &data.pixels);
        texture
    }

    pub fn id(&self) -> TextureId {
        self.texture_id
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bind(&self) {
        self.driver.bind_texture(0, self.texture_id);
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.driver.delete_texture(self.texture_id);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;
    use crate::common::headless::HeadlessDriver;

    fn encode<I>(image: I, format: ImageFormat) -> Vec<u8>
    where
        I: Into<image::DynamicImage>,
    {
        let image: image::DynamicImage = image.into();
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn jpeg_decodes_to_tightly_packed_rgba() {
        let image = RgbImage::from_pixel(13, 7, Rgb([200, 120, 40]));
        let data = TextureData::decode(&encode(image, ImageFormat::Jpeg)).unwrap();
        assert_eq!((data.width(), data.height()), (13, 7));
        assert_eq!(data.stride(), 13 * 4);
        assert_eq!(data.pixels().len(), 13 * 7 * 4);
        assert!(data.pixels().chunks(4).all(|pixel| pixel[3] == 255));
    }

    #[test]
    fn png_keeps_exact_pixels() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(1, 0, Rgba([1, 2, 3, 4]));
        let data = TextureData::decode(&encode(image, ImageFormat::Png)).unwrap();
        assert_eq!(&data.pixels()[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn padded_rows_are_rejected() {
        let result = TextureData::from_raw(3, 2, 16, vec![0; 32]);
        assert!(matches!(
            result,
            Err(TextureError::UnsupportedStride {
                width: 3,
                stride: 16
            })
        ));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let result = TextureData::from_raw(2, 2, 8, vec![0; 12]);
        assert!(matches!(
            result,
            Err(TextureError::MalformedPixels {
                expected: 16,
                actual: 12
            })
        ));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            TextureData::decode(b"definitely not an image"),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let driver: SharedDriver = Rc::new(HeadlessDriver::new());
        let result = Texture::load(&driver, "does/not/exist.jpg");
        assert!(matches!(result, Err(TextureError::NotFound { .. })));
    }

    #[test]
    fn upload_binds_and_releases() {
        let headless = Rc::new(HeadlessDriver::new());
        let driver: SharedDriver = headless.clone();
        let data = TextureData::from_raw(2, 1, 8, vec![255; 8]).unwrap();
        let texture = Texture::upload(&driver, &data);
        assert_eq!(texture.dimensions(), (2, 1));

        let uploads = headless.texture_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].texture, texture.id());
        assert_eq!((uploads[0].width, uploads[0].height, uploads[0].len), (2, 1, 8));
        assert_eq!(headless.live_objects().textures, 1);

        drop(texture);
        assert!(headless.live_objects().is_empty());
        assert!(headless.errors().is_empty(), "{:?}", headless.errors());
    }
}
