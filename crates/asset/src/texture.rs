//! Texture decoding and CPU-side pixel data.
//! LDR images decode to RGBA8, EXR images to RGBA32F.

use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use image::{DynamicImage, ImageFormat, ImageReader};

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Channel count of the source image (before expansion to RGBA).
    pub channels: u8,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgba32F,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba32F => 16,
        }
    }
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        ensure!(
            data.len() == (width as usize) * (height as usize) * 4,
            "Data size {} doesn't match RGBA8 {}x{}",
            data.len(),
            width,
            height
        );
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
            channels: 4,
        })
    }

    /// Decode an encoded image held in memory. `name` is the file name the
    /// bytes came from; its extension selects the decoder, content sniffing
    /// is used when the extension is unknown.
    pub fn decode(bytes: &[u8], name: &str) -> Result<Self> {
        let mut reader = ImageReader::new(std::io::Cursor::new(bytes));
        match ImageFormat::from_path(Path::new(name)) {
            Ok(format) => reader.set_format(format),
            Err(_) => {
                reader = reader
                    .with_guessed_format()
                    .with_context(|| format!("Failed to sniff image format of {}", name))?;
            }
        }
        let img = reader
            .decode()
            .map_err(|e| anyhow!("Failed to decode image {}: {}", name, e))?;
        let texture = Self::from_image(img);
        log::debug!(
            "Decoded {} ({}x{}, {} channels, {:?})",
            name,
            texture.width,
            texture.height,
            texture.channels,
            texture.format
        );
        Ok(texture)
    }

    fn from_image(img: DynamicImage) -> Self {
        let channels = img.color().channel_count();
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let rgba = img.into_rgba32f();
                let data = rgba
                    .into_raw()
                    .into_iter()
                    .flat_map(f32::to_ne_bytes)
                    .collect();
                Self {
                    data,
                    width,
                    height,
                    format: TextureFormat::Rgba32F,
                    channels,
                }
            }
            other => Self {
                data: other.into_rgba8().into_raw(),
                width,
                height,
                format: TextureFormat::Rgba8,
                channels,
            },
        }
    }

    /// Create a simple placeholder texture (checkerboard pattern).
    pub fn checkerboard(size: u32) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let texel = if ((x / 8) + (y / 8)) % 2 == 0 {
                    [255, 0, 255, 255]
                } else {
                    [32, 32, 32, 255]
                };
                data.extend_from_slice(&texel);
            }
        }
        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
            channels: 4,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.bytes_per_pixel()
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([10u8, 20, 30]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba8() {
        let tex = TextureData::decode(&encode_png(3, 2), "stone.png").expect("decode");
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.format, TextureFormat::Rgba8);
        assert_eq!(tex.channels, 3);
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
        assert!(tex.is_valid());
    }

    #[test]
    fn unknown_extension_falls_back_to_sniffing() {
        let tex = TextureData::decode(&encode_png(1, 1), "blob.dat").expect("sniff");
        assert_eq!(tex.width, 1);
    }

    #[test]
    fn corrupt_bytes_are_an_error() {
        assert!(TextureData::decode(b"not an image", "broken.png").is_err());
    }

    #[test]
    fn rgba8_size_is_checked() {
        assert!(TextureData::new_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn checkerboard_is_valid() {
        let tex = TextureData::checkerboard(16);
        assert!(tex.is_valid());
        assert_ne!(&tex.data[..4], &tex.data[8 * 4..8 * 4 + 4]);
    }
}
