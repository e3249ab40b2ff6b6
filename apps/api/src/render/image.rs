//! Aspect-ratio-preserving image placement.

use thiserror::Error;

use crate::render::model::{Picture, Rect, Slide};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("request for {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("image could not be decoded: {0}")]
    Decode(String),
}

impl ImageError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ImageError::Status { status: 429, .. })
    }
}

/// Pixel dimensions read from the image header. The format (PNG, JPEG,
/// GIF, WebP, ...) is detected from the bytes, not the URL.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let size = imagesize::blob_size(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let (Ok(width), Ok(height)) = (u32::try_from(size.width), u32::try_from(size.height)) else {
        return Err(ImageError::Decode("image dimensions out of range".to_string()));
    };
    if width == 0 || height == 0 {
        return Err(ImageError::Decode("zero-sized image".to_string()));
    }
    Ok((width, height))
}

/// Largest rectangle with the image's aspect ratio that fits inside
/// `bounds`, centred in the unused space.
pub fn fit(bounds: Rect, image_width: u32, image_height: u32) -> Rect {
    let scale = f64::min(
        bounds.width as f64 / image_width as f64,
        bounds.height as f64 / image_height as f64,
    );
    let width = ((image_width as f64 * scale).floor() as i64).min(bounds.width);
    let height = ((image_height as f64 * scale).floor() as i64).min(bounds.height);
    Rect {
        left: bounds.left + (bounds.width - width) / 2,
        top: bounds.top + (bounds.height - height) / 2,
        width,
        height,
    }
}

/// Places the image over container `index` and clears that container's
/// text. The container stays on the slide.
pub fn place_image(
    slide: &mut Slide,
    index: usize,
    source_url: &str,
    bytes: &[u8],
) -> Result<(), ImageError> {
    let (pixel_width, pixel_height) = dimensions(bytes)?;
    let Some(container) = slide.containers.get_mut(index) else {
        return Err(ImageError::Decode(format!("no container at index {index}")));
    };
    let bounds = fit(container.bounds, pixel_width, pixel_height);
    container.clear();
    slide.pictures.push(Picture {
        source_url: source_url.to_string(),
        bounds,
        pixel_width,
        pixel_height,
    });
    Ok(())
}

#[cfg(test)]
pub mod testing {
    /// Encodes a blank RGB PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&vec![0u8; (width * height * 3) as usize])
                .unwrap();
        }
        buf
    }

    /// Baseline JPEG header (SOI, JFIF APP0, SOF0) declaring the given size.
    pub fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut buf = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        buf.extend_from_slice(b"JFIF\0");
        buf.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
        buf.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        buf.extend_from_slice(&height.to_be_bytes());
        buf.extend_from_slice(&width.to_be_bytes());
        buf.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        buf.extend_from_slice(&[0xFF, 0xD9]);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{jpeg_header, png_bytes};
    use super::*;
    use crate::render::model::Container;

    #[test]
    fn test_dimensions_from_png() {
        assert_eq!(dimensions(&png_bytes(40, 20)).unwrap(), (40, 20));
    }

    #[test]
    fn test_dimensions_from_jpeg() {
        assert_eq!(dimensions(&jpeg_header(20, 10)).unwrap(), (20, 10));
    }

    #[test]
    fn test_jpeg_is_placed_with_its_aspect_ratio() {
        let mut slide = Slide::titled("Shop UI");
        slide
            .containers
            .push(Container::with_text(Rect::new(0, 0, 400, 400), "![m](https://x/a.jpg)"));
        place_image(&mut slide, 0, "https://x/a.jpg", &jpeg_header(20, 10)).unwrap();
        assert_eq!(slide.pictures.len(), 1);
        assert_eq!(slide.pictures[0].bounds, Rect::new(0, 100, 400, 200));
        assert!(slide.containers[0].is_empty());
    }

    #[test]
    fn test_dimensions_rejects_unknown_data() {
        assert!(matches!(
            dimensions(b"<html>not an image</html>"),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_wide_image_is_letterboxed() {
        let placed = fit(Rect::new(100, 100, 1000, 1000), 200, 100);
        assert_eq!(placed, Rect::new(100, 350, 1000, 500));
    }

    #[test]
    fn test_tall_image_is_pillarboxed() {
        let placed = fit(Rect::new(0, 0, 1000, 500), 100, 200);
        assert_eq!(placed, Rect::new(375, 0, 250, 500));
    }

    #[test]
    fn test_fit_never_overflows() {
        let bounds = Rect::new(7, 11, 333, 97);
        for (w, h) in [(1, 1), (3, 7), (1920, 1080), (17, 4000), (333, 97)] {
            let placed = fit(bounds, w, h);
            assert!(bounds.contains(&placed), "{w}x{h} -> {placed:?}");
        }
    }

    #[test]
    fn test_place_image_clears_but_keeps_container() {
        let mut slide = Slide::titled("Login UI");
        slide
            .containers
            .push(Container::with_text(Rect::new(0, 0, 1000, 1000), "<add mock link here>"));
        place_image(&mut slide, 0, "https://x/a.png", &png_bytes(10, 10)).unwrap();
        assert_eq!(slide.containers.len(), 1);
        assert!(slide.containers[0].is_empty());
        assert_eq!(slide.pictures[0].bounds, Rect::new(0, 0, 1000, 1000));
        assert_eq!(slide.pictures[0].source_url, "https://x/a.png");
    }
}
