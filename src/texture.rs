//! GPU texture upload and release.

use glow::HasContext;

use crate::error::{Error, Result};
use crate::raster::RasterizedImage;
use crate::render::gl_size;

/// GL internal format for RGBA8 textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA8_INTERNAL_FORMAT: i32 = glow::RGBA8 as i32;

/// An uploaded atlas texture.
///
/// Carries the dimensions the texture was created with so geometry can be
/// rebuilt against the content/atlas ratio without re-querying the GPU.
/// The handle is valid from a successful [`upload`] until
/// [`release`](Self::release); both transitions consume their input, so a
/// released handle cannot be bound again.
pub struct TextureHandle {
    pub(crate) texture: glow::Texture,
    /// Width the texture was allocated with, a power of two.
    pub atlas_width: u32,
    /// Height the texture was allocated with, a power of two.
    pub atlas_height: u32,
}

impl TextureHandle {
    /// The raw GL texture name, for binding during a draw.
    #[must_use]
    pub fn raw(&self) -> glow::Texture {
        self.texture
    }

    /// Delete the GL texture.
    ///
    /// # Safety
    ///
    /// Requires the same current GL context the handle was created with,
    /// and no in-flight draw call may still reference the texture.
    pub unsafe fn release(self, gl: &glow::Context) {
        unsafe { gl.delete_texture(self.texture) };
    }
}

/// Upload a rasterized image into a new GL texture.
///
/// The image is consumed: its CPU pixel buffer is gone after this call
/// whether the upload succeeds or fails, so there is no window in which a
/// caller can reuse a buffer the GPU already owns.
///
/// Both filters are nearest-neighbor, keeping vector edges crisp at the
/// power-of-two boundary, and wrapping clamps to the edge so the
/// transparent padding never bleeds.
///
/// # Safety
///
/// Requires a valid, current GL context.
///
/// # Errors
///
/// [`Error::TextureUpload`] if the GPU refuses to allocate a texture
/// object.
pub unsafe fn upload(gl: &glow::Context, image: RasterizedImage) -> Result<TextureHandle> {
    let texture = unsafe { gl.create_texture() }.map_err(Error::TextureUpload)?;

    unsafe {
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            RGBA8_INTERNAL_FORMAT,
            gl_size(image.atlas_width),
            gl_size(image.atlas_height),
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelUnpackData::Slice(Some(&image.pixels)),
        );

        // GL constant values are small enough that the cast is always safe.
        #[expect(clippy::cast_possible_wrap)]
        {
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );
        }

        gl.bind_texture(glow::TEXTURE_2D, None);
    }

    Ok(TextureHandle {
        texture,
        atlas_width: image.atlas_width,
        atlas_height: image.atlas_height,
    })
}
