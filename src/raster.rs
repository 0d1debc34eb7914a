//! CPU-side rasterization of vector assets into atlas-sized bitmaps.
//!
//! An asset's intrinsic size times the requested scale gives the content
//! rectangle; the canvas around it is the smallest square power-of-two
//! atlas that fits. Everything outside the content rectangle stays fully
//! transparent, and the UV coordinates built in [`crate::sprite`] never
//! sample it.

use log::debug;
use resvg::{tiny_skia, usvg};

use crate::atlas::atlas_size;
use crate::error::{Error, Result};

/// A byte-stream provider for named assets.
///
/// This is the boundary to the host's resource store: the crate asks for
/// bytes by identifier and never touches the filesystem itself.
pub trait AssetSource {
    /// Return the raw bytes for `id`, or `None` if the identifier resolves
    /// to no data.
    fn load(&self, id: &str) -> Option<Vec<u8>>;
}

/// In-memory asset packs, handy for hosts with embedded resources and for
/// tests.
impl AssetSource for std::collections::HashMap<String, Vec<u8>> {
    fn load(&self, id: &str) -> Option<Vec<u8>> {
        self.get(id).cloned()
    }
}

/// A named vector description, consumed by [`rasterize`].
pub struct VectorAsset {
    /// Identifier the asset was resolved under, e.g. `"box.svg"`.
    pub id: String,
    /// The raw SVG bytes.
    pub data: Vec<u8>,
}

/// A rasterized asset on its power-of-two canvas, ready for texture upload.
///
/// The content occupies the top-left `content_width x content_height`
/// sub-rectangle; the rest of the canvas is transparent padding. Pixels are
/// RGBA8 with straight (non-premultiplied) alpha, matching the
/// source-over blend factors used at draw time.
///
/// This is a transient value: it exists between rasterization and
/// [`crate::texture::upload`], which consumes it.
pub struct RasterizedImage {
    /// Canvas width, a power of two.
    pub atlas_width: u32,
    /// Canvas height, a power of two (equal to the width).
    pub atlas_height: u32,
    /// Occupied width, `<= atlas_width`.
    pub content_width: u32,
    /// Occupied height, `<= atlas_height`.
    pub content_height: u32,
    /// `atlas_width * atlas_height` RGBA samples, row-major.
    pub pixels: Vec<u8>,
}

/// Rasterize a vector asset at the given scale.
///
/// The asset is consumed; nothing of it is retained after this call.
///
/// # Errors
///
/// [`Error::AssetParse`] if the bytes are not a well-formed SVG, or if the
/// scaled content is too large for a CPU canvas.
pub fn rasterize(asset: VectorAsset, scale: f32) -> Result<RasterizedImage> {
    let VectorAsset { id, data } = asset;

    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|source| Error::AssetParse {
            id: id.clone(),
            source,
        })?;

    let intrinsic = tree.size();
    // Sub-pixel content still needs one pixel of canvas.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let content_width = ((intrinsic.width() * scale).ceil() as u32).max(1);
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let content_height = ((intrinsic.height() * scale).ceil() as u32).max(1);

    let atlas = atlas_size(content_width.max(content_height));

    let mut pixmap =
        tiny_skia::Pixmap::new(atlas, atlas).ok_or_else(|| Error::AssetParse {
            id: id.clone(),
            source: usvg::Error::InvalidSize,
        })?;

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    // tiny-skia renders premultiplied; convert to straight alpha for the
    // (SRC_ALPHA, ONE_MINUS_SRC_ALPHA) blend used at draw time.
    let mut pixels = Vec::with_capacity((atlas as usize) * (atlas as usize) * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    debug!("rasterized `{id}`: content {content_width}x{content_height} in {atlas}x{atlas} atlas");

    Ok(RasterizedImage {
        atlas_width: atlas,
        atlas_height: atlas,
        content_width,
        content_height,
        pixels,
    })
}

/// Resolve `id` through `source` and rasterize it at `scale`.
///
/// # Errors
///
/// [`Error::AssetNotFound`] if the identifier resolves to no data, plus
/// everything [`rasterize`] can return.
pub fn rasterize_from(source: &dyn AssetSource, id: &str, scale: f32) -> Result<RasterizedImage> {
    let data = source
        .load(id)
        .ok_or_else(|| Error::AssetNotFound(id.to_owned()))?;
    rasterize(
        VectorAsset {
            id: id.to_owned(),
            data,
        },
        scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const BOX_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="150"><rect width="200" height="150" fill="#ff0000"/></svg>"##;

    fn box_asset() -> VectorAsset {
        VectorAsset {
            id: "box.svg".into(),
            data: BOX_SVG.to_vec(),
        }
    }

    fn pixel(image: &RasterizedImage, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * image.atlas_width + x) * 4) as usize;
        image.pixels[idx..idx + 4].try_into().expect("4 bytes")
    }

    #[test]
    fn content_lands_in_power_of_two_atlas() {
        let image = rasterize(box_asset(), 1.0).expect("rasterize");
        assert_eq!(image.content_width, 200);
        assert_eq!(image.content_height, 150);
        assert_eq!(image.atlas_width, 256);
        assert_eq!(image.atlas_height, 256);
        assert_eq!(image.pixels.len(), 256 * 256 * 4);
    }

    #[test]
    fn content_is_opaque_and_padding_transparent() {
        let image = rasterize(box_asset(), 1.0).expect("rasterize");
        assert_eq!(pixel(&image, 10, 10), [255, 0, 0, 255]);
        // Right of the content rectangle.
        assert_eq!(pixel(&image, 250, 10), [0, 0, 0, 0]);
        // Below the content rectangle.
        assert_eq!(pixel(&image, 10, 200), [0, 0, 0, 0]);
    }

    #[test]
    fn scale_multiplies_content_dimensions() {
        let image = rasterize(box_asset(), 2.0).expect("rasterize");
        assert_eq!(image.content_width, 400);
        assert_eq!(image.content_height, 300);
        assert_eq!(image.atlas_width, 512);
    }

    #[test]
    fn malformed_bytes_are_a_parse_error() {
        let asset = VectorAsset {
            id: "junk.svg".into(),
            data: b"definitely not an svg".to_vec(),
        };
        let err = rasterize(asset, 1.0).err().expect("must fail");
        match err {
            Error::AssetParse { id, .. } => assert_eq!(id, "junk.svg"),
            other => panic!("expected AssetParse, got {other:?}"),
        }
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let empty: HashMap<String, Vec<u8>> = HashMap::new();
        let err = rasterize_from(&empty, "missing.svg", 1.0)
            .err()
            .expect("must fail");
        match err {
            Error::AssetNotFound(id) => assert_eq!(id, "missing.svg"),
            other => panic!("expected AssetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn in_memory_source_resolves() {
        let mut pack = HashMap::new();
        pack.insert("box.svg".to_owned(), BOX_SVG.to_vec());
        let image = rasterize_from(&pack, "box.svg", 1.0).expect("rasterize");
        assert_eq!(image.atlas_width, 256);
    }
}
