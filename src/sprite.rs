//! Sprite geometry and sprite lifecycle.
//!
//! A sprite is a screen-space quad backed by one atlas texture. Its
//! geometry carries UV coordinates scaled to the content/atlas ratio, so
//! the transparent padding of a power-of-two atlas is never sampled.

use bytemuck::{Pod, Zeroable};

use crate::texture::TextureHandle;

/// A quad vertex: pixel-space position plus UV, interleaved for the GPU.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Corner position in pixel space.
    pub position: [f32; 2],
    /// Texture coordinate within the atlas content region.
    pub uv: [f32; 2],
}

/// The vertex and index data for one sprite quad.
///
/// Immutable once built; rebuilt only when the sprite's logical rectangle
/// or its backing texture's content ratio changes.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteGeometry {
    /// Corners in the order top-left, bottom-left, bottom-right, top-right
    /// (y grows downward).
    pub vertices: [Vertex; 4],
    /// Two triangles with fixed winding.
    pub indices: [u16; 6],
}

impl SpriteGeometry {
    /// Build quad geometry for the rectangle at `(x, y)` with the given
    /// size, sampling only the content portion of the atlas.
    #[must_use]
    pub fn build(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        [content_width, content_height]: [u32; 2],
        [atlas_width, atlas_height]: [u32; 2],
    ) -> Self {
        // Content and atlas dims are small relative to f32 mantissa range.
        #[expect(clippy::cast_precision_loss)]
        let u_max = content_width as f32 / atlas_width as f32;
        #[expect(clippy::cast_precision_loss)]
        let v_max = content_height as f32 / atlas_height as f32;

        Self {
            vertices: [
                Vertex {
                    position: [x, y],
                    uv: [0.0, 0.0],
                },
                Vertex {
                    position: [x, y + height],
                    uv: [0.0, v_max],
                },
                Vertex {
                    position: [x + width, y + height],
                    uv: [u_max, v_max],
                },
                Vertex {
                    position: [x + width, y],
                    uv: [u_max, 0.0],
                },
            ],
            indices: [0, 1, 2, 2, 3, 0],
        }
    }
}

/// Whether a sprite currently has a texture it may be drawn with.
///
/// A sprite whose asset failed to rasterize or upload sits in `Failed`
/// rather than drawing garbage; the host decides whether to retry,
/// substitute, or drop it.
pub enum TextureState {
    /// No texture yet; the asset is still being loaded.
    Pending,
    /// Uploaded and drawable.
    Ready(TextureHandle),
    /// Loading or upload failed; the sprite is skipped at draw time.
    Failed,
}

/// One visual entity: a quad rectangle plus the texture backing it.
pub struct Sprite {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    /// Content and atlas dimensions of the backing texture; unit until a
    /// texture is attached.
    content: [u32; 2],
    atlas: [u32; 2],
    geometry: SpriteGeometry,
    texture: TextureState,
}

impl Sprite {
    /// Create a sprite at `(x, y)` with the given size, in the
    /// [`TextureState::Pending`] state.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            content: [1, 1],
            atlas: [1, 1],
            geometry: SpriteGeometry::build(x, y, width, height, [1, 1], [1, 1]),
            texture: TextureState::Pending,
        }
    }

    /// The quad geometry to stream at draw time.
    #[must_use]
    pub fn geometry(&self) -> &SpriteGeometry {
        &self.geometry
    }

    /// The sprite's current texture state.
    #[must_use]
    pub fn texture(&self) -> &TextureState {
        &self.texture
    }

    /// Attach an uploaded texture, rebuilding geometry for its
    /// content/atlas ratio.
    ///
    /// Returns the previously attached handle, if any; the caller owns it
    /// and must release it (handles are single-owner and never released
    /// implicitly).
    pub fn attach_texture(
        &mut self,
        handle: TextureHandle,
        content_width: u32,
        content_height: u32,
    ) -> Option<TextureHandle> {
        self.content = [content_width, content_height];
        self.atlas = [handle.atlas_width, handle.atlas_height];
        self.geometry = SpriteGeometry::build(
            self.x,
            self.y,
            self.width,
            self.height,
            self.content,
            self.atlas,
        );
        match std::mem::replace(&mut self.texture, TextureState::Ready(handle)) {
            TextureState::Ready(old) => Some(old),
            TextureState::Pending | TextureState::Failed => None,
        }
    }

    /// Record that this sprite's asset could not be loaded.
    ///
    /// Returns the previously attached handle, if any, for the caller to
    /// release.
    pub fn mark_failed(&mut self) -> Option<TextureHandle> {
        match std::mem::replace(&mut self.texture, TextureState::Failed) {
            TextureState::Ready(old) => Some(old),
            TextureState::Pending | TextureState::Failed => None,
        }
    }

    /// Move the sprite to a new rectangle, rebuilding geometry with the
    /// current texture's content ratio preserved.
    pub fn set_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self.geometry = SpriteGeometry::build(x, y, width, height, self.content, self.atlas);
    }

    /// Release the sprite's GPU resources.
    ///
    /// # Safety
    ///
    /// Requires the same current GL context the texture was uploaded with,
    /// and no in-flight draw may still reference it. Call this before
    /// destroying the renderer.
    pub unsafe fn destroy(self, gl: &glow::Context) {
        if let TextureState::Ready(handle) = self.texture {
            unsafe { handle.release(gl) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn fake_handle(atlas_width: u32, atlas_height: u32) -> TextureHandle {
        TextureHandle {
            texture: glow::NativeTexture(NonZeroU32::new(1).expect("nonzero")),
            atlas_width,
            atlas_height,
        }
    }

    #[test]
    fn quad_corners_and_winding() {
        let geometry = SpriteGeometry::build(0.0, 0.0, 200.0, 200.0, [200, 200], [256, 256]);
        let positions: Vec<[f32; 2]> = geometry.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            [[0.0, 0.0], [0.0, 200.0], [200.0, 200.0], [200.0, 0.0]]
        );
        assert_eq!(geometry.indices, [0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn uvs_clamp_to_content_ratio() {
        let geometry = SpriteGeometry::build(0.0, 0.0, 200.0, 150.0, [200, 150], [256, 256]);
        let uvs: Vec<[f32; 2]> = geometry.vertices.iter().map(|v| v.uv).collect();
        let u_max: f32 = 200.0 / 256.0;
        let v_max: f32 = 150.0 / 256.0;
        assert!((u_max - 0.781_25).abs() < f32::EPSILON);
        assert!((v_max - 0.585_937_5).abs() < f32::EPSILON);
        assert_eq!(uvs, [[0.0, 0.0], [0.0, v_max], [u_max, v_max], [u_max, 0.0]]);
    }

    #[test]
    fn corners_are_independent_of_atlas_size() {
        let small = SpriteGeometry::build(0.0, 0.0, 200.0, 200.0, [200, 200], [256, 256]);
        let large = SpriteGeometry::build(0.0, 0.0, 200.0, 200.0, [200, 200], [1024, 1024]);
        for (a, b) in small.vertices.iter().zip(&large.vertices) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn attach_texture_rebuilds_uvs() {
        let mut sprite = Sprite::new(0.0, 0.0, 200.0, 200.0);
        assert!(matches!(sprite.texture(), TextureState::Pending));

        let displaced = sprite.attach_texture(fake_handle(256, 256), 200, 150);
        assert!(displaced.is_none());
        assert!(matches!(sprite.texture(), TextureState::Ready(_)));
        let uv_max = sprite.geometry().vertices[2].uv;
        assert_eq!(uv_max, [200.0 / 256.0, 150.0 / 256.0]);
    }

    #[test]
    fn attach_over_existing_returns_displaced_handle() {
        let mut sprite = Sprite::new(0.0, 0.0, 64.0, 64.0);
        assert!(sprite.attach_texture(fake_handle(64, 64), 64, 64).is_none());
        let displaced = sprite.attach_texture(fake_handle(128, 128), 100, 100);
        assert!(displaced.is_some());
        assert_eq!(displaced.map(|h| h.atlas_width), Some(64));
    }

    #[test]
    fn mark_failed_from_pending_displaces_nothing() {
        let mut sprite = Sprite::new(0.0, 0.0, 64.0, 64.0);
        assert!(sprite.mark_failed().is_none());
        assert!(matches!(sprite.texture(), TextureState::Failed));
    }

    #[test]
    fn set_rect_keeps_content_ratio() {
        let mut sprite = Sprite::new(0.0, 0.0, 200.0, 200.0);
        sprite.attach_texture(fake_handle(256, 256), 200, 150);
        sprite.set_rect(50.0, 60.0, 100.0, 100.0);
        let vertices = &sprite.geometry().vertices;
        assert_eq!(vertices[0].position, [50.0, 60.0]);
        assert_eq!(vertices[2].position, [150.0, 160.0]);
        assert_eq!(vertices[2].uv, [200.0 / 256.0, 150.0 / 256.0]);
    }
}
