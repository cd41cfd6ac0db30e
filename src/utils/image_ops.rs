use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Decode an uploaded photo into RGB on the blocking pool.
///
/// Alpha and palette formats are flattened so every model sees the same layout.
pub async fn load_rgb_image_async(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || {
        let img = image::load_from_memory(&bytes).context("Failed to decode uploaded image")?;
        Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
    })
    .await
    .context("Failed to spawn blocking task for image decoding")?
}

/// Encode an image to PNG bytes on the blocking pool.
///
/// The image is cloned into the task so callers can keep asking questions about it.
pub async fn encode_png_async(img: &DynamicImage) -> Result<Vec<u8>> {
    let img = img.clone();
    tokio::task::spawn_blocking(move || encode_png(&img))
        .await
        .context("Failed to spawn blocking task for PNG encoding")?
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .context("Failed to encode image as PNG")?;
    Ok(png_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 128])));
        encode_png(&img).unwrap()
    }

    #[tokio::test]
    async fn test_load_converts_to_rgb() {
        let img = load_rgb_image_async(red_png()).await.unwrap();
        assert!(matches!(img, DynamicImage::ImageRgb8(_)));
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let result = load_rgb_image_async(b"definitely not an image".to_vec()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_encode_png_async() {
        let img = load_rgb_image_async(red_png()).await.unwrap();
        let png = encode_png_async(&img).await.unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
