//! The frame renderer: owns the GL state, the sprite program, and the
//! projection matrix, and issues the per-frame draw protocol.

use glow::HasContext;
use log::debug;
use std::sync::Arc;

use crate::error::Result;
use crate::shaders::{self, SpriteProgram};
use crate::sprite::{Sprite, SpriteGeometry, TextureState, Vertex};
use crate::texture::TextureHandle;

/// Fixed background color cleared at the start of every frame.
const CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Modulation color for sprite draws: opaque white, texture shown as-is.
const SPRITE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Identity matrix held until the first resize delivers a viewport.
const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Convert a `u32` to `i32` for GL API calls.
///
/// # Panics
///
/// Panics if `value > i32::MAX`. In practice, this is unreachable for
/// normal viewport dimensions and atlas sizes.
pub(crate) fn gl_size(value: u32) -> i32 {
    i32::try_from(value).expect("dimension exceeds i32::MAX")
}

/// Column-major orthographic projection mapping `[0, width] x [height, 0]`
/// (pixel coordinates, y growing downward) to clip space, with near 1 and
/// far -1.
#[must_use]
pub fn orthographic_projection(width: f32, height: f32) -> [f32; 16] {
    [
        2.0 / width, 0.0, 0.0, 0.0, //
        0.0, -2.0 / height, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        -1.0, 1.0, 0.0, 1.0,
    ]
}

/// A renderer for textured sprite quads over OpenGL.
///
/// Construction compiles and links the sprite shader program, resolves its
/// bindings, and creates the vertex-array/buffer objects; once
/// [`new`](Self::new) succeeds the renderer is ready, and nothing is drawn
/// if it fails. [`resize`](Self::resize) recomputes the projection matrix for
/// the current viewport, and [`render`](Self::render) runs the per-frame
/// protocol. The host delivers those calls from its surface-ready, resize,
/// and frame-tick callbacks; this type never touches the window system.
///
/// The renderer is the sole owner of the program, bindings, and projection:
/// they are mutated only between frames, never mid-draw, and independent
/// renderers can coexist on separate contexts.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use svg_sprite_glow::{Sprite, SpriteRenderer};
/// # fn example(gl: Arc<glow::Context>, sprites: &[Sprite]) {
/// // During setup (with a current GL context):
/// let mut renderer = unsafe { SpriteRenderer::new(gl) }.expect("shader pipeline");
///
/// // On each host resize:
/// renderer.resize(800, 600);
///
/// // Each frame:
/// unsafe { renderer.render(sprites) };
/// # }
/// ```
pub struct SpriteRenderer {
    /// The OpenGL context, shared via [`Arc`] so hosts can keep using it
    /// for uploads alongside the renderer.
    gl: Arc<glow::Context>,

    /// Compiled sprite program with resolved bindings.
    program: SpriteProgram,

    /// Vertex array object with position and UV attributes at the resolved
    /// locations.
    vao: glow::VertexArray,
    /// Vertex buffer for streaming quad vertex data each draw.
    vbo: glow::Buffer,
    /// Element (index) buffer for streaming quad indices each draw.
    ebo: glow::Buffer,

    /// Shared orthographic projection, recomputed on resize.
    projection: [f32; 16],
    /// Current viewport dimensions, zero until the first resize.
    viewport: [u32; 2],
}

impl SpriteRenderer {
    /// Create a renderer using the built-in sprite shaders.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current and valid. The caller must ensure
    /// that [`destroy`](Self::destroy) is called before the context is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Any shader pipeline failure; see [`shaders::build_program`]. A
    /// failure here is fatal for the render session.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Result<Self> {
        unsafe {
            Self::with_sources(
                gl,
                shaders::SPRITE_VERTEX_SRC,
                shaders::SPRITE_FRAGMENT_SRC,
            )
        }
    }

    /// Create a renderer from caller-supplied shader source text.
    ///
    /// The sources must declare the five sprite bindings; construction
    /// fails naming the first missing one.
    ///
    /// # Safety
    ///
    /// Same contract as [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Any shader pipeline failure; see [`shaders::build_program`].
    ///
    /// # Panics
    ///
    /// Panics if the GL context refuses to create buffer objects, which
    /// indicates a lost context.
    pub unsafe fn with_sources(
        gl: Arc<glow::Context>,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self> {
        let program = unsafe { shaders::build_program(&gl, vertex_src, fragment_src) }?;

        let (vao, vbo, ebo) = unsafe {
            let vao = gl
                .create_vertex_array()
                .expect("GL context lost: create_vertex_array");
            let vbo = gl.create_buffer().expect("GL context lost: create_buffer");
            let ebo = gl.create_buffer().expect("GL context lost: create_buffer");

            // Interleaved position + UV at the resolved attribute locations.
            // The element buffer binding is captured by the VAO.
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));

            // Vertex is 16 bytes — well within i32 range.
            #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let stride = std::mem::size_of::<Vertex>() as i32;

            gl.enable_vertex_attrib_array(program.bindings.position);
            gl.vertex_attrib_pointer_f32(
                program.bindings.position,
                2,
                glow::FLOAT,
                false,
                stride,
                0,
            );
            gl.enable_vertex_attrib_array(program.bindings.tex_coord);
            gl.vertex_attrib_pointer_f32(
                program.bindings.tex_coord,
                2,
                glow::FLOAT,
                false,
                stride,
                8,
            );
            gl.bind_vertex_array(None);

            (vao, vbo, ebo)
        };

        Ok(Self {
            gl,
            program,
            vao,
            vbo,
            ebo,
            projection: IDENTITY,
            viewport: [0, 0],
        })
    }

    /// The GL context the renderer was created with.
    #[must_use]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// The shared projection matrix currently applied to every draw.
    #[must_use]
    pub fn projection(&self) -> &[f32; 16] {
        &self.projection
    }

    /// Current viewport dimensions, `[0, 0]` before the first resize.
    #[must_use]
    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }

    /// Recompute the projection matrix for a new viewport size.
    ///
    /// Pure CPU work; the host calls this from its resize callback, before
    /// the next frame. Never called mid-frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = [width, height];
        // Viewport dimensions are small relative to f32 mantissa range.
        #[expect(clippy::cast_precision_loss)]
        {
            self.projection = orthographic_projection(width as f32, height as f32);
        }
        debug!("viewport resized to {width}x{height}");
    }

    /// Draw one frame.
    ///
    /// Protocol, in order: enable back-face culling and source-over alpha
    /// blending with depth writes off; clear to the background color; for
    /// each sprite with a ready texture, stream its quad and issue the
    /// indexed draw with the shared projection; then unbind the geometry
    /// and restore the rasterization state.
    ///
    /// Sprites without a valid texture (pending or failed) are skipped,
    /// never drawn with stale or garbage data.
    ///
    /// # Safety
    ///
    /// Requires a current GL context matching the one passed at
    /// construction, and every `Ready` sprite's texture handle must still
    /// be live (sprites are destroyed before their textures, never after).
    pub unsafe fn render(&mut self, sprites: &[Sprite]) {
        let gl = &self.gl;

        unsafe {
            gl.enable(glow::CULL_FACE);
            gl.cull_face(glow::BACK);
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.depth_mask(false);

            gl.clear_color(
                CLEAR_COLOR[0],
                CLEAR_COLOR[1],
                CLEAR_COLOR[2],
                CLEAR_COLOR[3],
            );
            gl.clear(glow::COLOR_BUFFER_BIT);

            gl.use_program(Some(self.program.program));
            gl.bind_vertex_array(Some(self.vao));

            for sprite in sprites {
                if let TextureState::Ready(handle) = sprite.texture() {
                    self.draw_quad(sprite.geometry(), handle);
                }
            }

            gl.bind_vertex_array(None);

            gl.disable(glow::CULL_FACE);
            gl.disable(glow::BLEND);
            gl.depth_mask(true);
        }
    }

    /// Stream one quad's data and issue its indexed draw call.
    unsafe fn draw_quad(&self, geometry: &SpriteGeometry, handle: &TextureHandle) {
        let gl = &self.gl;
        let bindings = &self.program.bindings;

        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&geometry.vertices),
                glow::STREAM_DRAW,
            );
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&geometry.indices),
                glow::STREAM_DRAW,
            );

            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(handle.raw()));
            gl.uniform_1_i32(Some(&bindings.sampler), 0);

            gl.uniform_4_f32(
                Some(&bindings.color),
                SPRITE_COLOR[0],
                SPRITE_COLOR[1],
                SPRITE_COLOR[2],
                SPRITE_COLOR[3],
            );
            gl.uniform_matrix_4_f32_slice(Some(&bindings.mvp), false, &self.projection);

            gl.draw_elements(glow::TRIANGLES, 6, glow::UNSIGNED_SHORT, 0);
        }
    }

    /// Clean up all GL resources owned by this renderer.
    ///
    /// Sprites must be destroyed first; their texture handles are owned
    /// elsewhere and are not released here.
    ///
    /// # Safety
    ///
    /// Must be called with the same GL context that was used to create the
    /// renderer, and must be called exactly once.
    pub unsafe fn destroy(&self) {
        let gl = &self.gl;
        unsafe {
            gl.delete_program(self.program.program);
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
            gl.delete_buffer(self.ebo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Multiply a column-major 4x4 matrix by a column vector.
    fn transform(m: &[f32; 16], v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = m[row] * v[0] + m[4 + row] * v[1] + m[8 + row] * v[2] + m[12 + row] * v[3];
        }
        out
    }

    /// Helper to compare `[f32; 4]` with tolerance.
    fn assert_vec4_eq(actual: [f32; 4], expected: [f32; 4]) {
        for (a, e) in actual.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-5, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn projection_maps_viewport_corners_to_clip_space() {
        let m = orthographic_projection(800.0, 600.0);

        let top_left = transform(&m, [0.0, 0.0, 0.0, 1.0]);
        assert_vec4_eq(top_left, [-1.0, 1.0, 0.0, 1.0]);

        let bottom_right = transform(&m, [800.0, 600.0, 0.0, 1.0]);
        assert_vec4_eq(bottom_right, [1.0, -1.0, 0.0, 1.0]);
    }

    #[test]
    fn projection_center_maps_to_origin() {
        let m = orthographic_projection(200.0, 200.0);
        let center = transform(&m, [100.0, 100.0, 0.0, 1.0]);
        assert_vec4_eq(center, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn gl_size_roundtrips_small_values() {
        assert_eq!(gl_size(0), 0);
        assert_eq!(gl_size(4096), 4096);
    }
}
