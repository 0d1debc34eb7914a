//! GLSL shader sources, compilation, and binding resolution for the sprite
//! pipeline.
//!
//! Shaders target GLSL 1.40 (OpenGL 3.1), which is widely supported on
//! desktop platforms. One program serves every sprite draw for the lifetime
//! of the render session; there is no hot-swapping.

use glow::HasContext;

use crate::error::{Error, Result, ShaderStage};

/// Vertex shader for sprite quads.
///
/// Transforms pixel-space positions by the orthographic MVP matrix and
/// forwards the UV coordinate untouched.
///
/// # Bindings
///
/// | Name              | Kind      | Type   | Description                  |
/// |-------------------|-----------|--------|------------------------------|
/// | `vPosition`       | attribute | `vec2` | Quad corner in pixel space   |
/// | `a_TexCoordinate` | attribute | `vec2` | UV within the content region |
/// | `uMVPMatrix`      | uniform   | `mat4` | Orthographic projection      |
pub const SPRITE_VERTEX_SRC: &str = r"#version 140

in vec2 vPosition;
in vec2 a_TexCoordinate;

uniform mat4 uMVPMatrix;

out vec2 v_TexCoordinate;

void main() {
    v_TexCoordinate = a_TexCoordinate;
    gl_Position = uMVPMatrix * vec4(vPosition, 0.0, 1.0);
}
";

/// Fragment shader for sprite quads.
///
/// Samples the atlas texture and modulates it by a color uniform.
///
/// # Bindings
///
/// | Name        | Kind    | Type        | Description               |
/// |-------------|---------|-------------|---------------------------|
/// | `vColor`    | uniform | `vec4`      | Modulation color          |
/// | `u_Texture` | uniform | `sampler2D` | Bound atlas texture unit  |
pub const SPRITE_FRAGMENT_SRC: &str = r"#version 140

in vec2 v_TexCoordinate;

uniform vec4 vColor;
uniform sampler2D u_Texture;

out vec4 frag_color;

void main() {
    frag_color = vColor * texture(u_Texture, v_TexCoordinate);
}
";

/// Attribute and uniform locations resolved from a linked sprite program.
pub struct SpriteBindings {
    /// `vPosition` — quad corner attribute.
    pub position: u32,
    /// `a_TexCoordinate` — UV attribute.
    pub tex_coord: u32,
    /// `vColor` — modulation color uniform.
    pub color: glow::UniformLocation,
    /// `u_Texture` — texture sampler uniform.
    pub sampler: glow::UniformLocation,
    /// `uMVPMatrix` — projection matrix uniform.
    pub mvp: glow::UniformLocation,
}

/// A linked and activated sprite program with its resolved bindings.
pub struct SpriteProgram {
    /// The GL program object.
    pub program: glow::Program,
    /// Locations resolved by exact name match.
    pub bindings: SpriteBindings,
}

/// Compile, link, resolve, and activate a sprite program.
///
/// Each stage compiles independently so a failure names the stage it came
/// from. After a successful link the stage objects are detached and
/// deleted; only the program handle remains to clean up. The program is
/// bound as current before returning, and a binding failure deletes the
/// program so no unusable program escapes.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// [`Error::ShaderCompile`] with the failing stage and its diagnostic,
/// [`Error::ShaderLink`] with the linker diagnostic, or
/// [`Error::ShaderBinding`] naming the unresolved symbol.
pub unsafe fn build_program(
    gl: &glow::Context,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<SpriteProgram> {
    let program = unsafe { gl.create_program() }.map_err(Error::ShaderLink)?;

    let vs = match unsafe { compile_shader(gl, ShaderStage::Vertex, vertex_src) } {
        Ok(vs) => vs,
        Err(err) => {
            unsafe { gl.delete_program(program) };
            return Err(err);
        }
    };
    let fs = match unsafe { compile_shader(gl, ShaderStage::Fragment, fragment_src) } {
        Ok(fs) => fs,
        Err(err) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_program(program);
            }
            return Err(err);
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(Error::ShaderLink(log));
        }

        // Stage objects can go after a successful link.
        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    match unsafe { resolve_bindings(gl, program) } {
        Ok(bindings) => {
            unsafe { gl.use_program(Some(program)) };
            Ok(SpriteProgram { program, bindings })
        }
        Err(err) => {
            unsafe { gl.delete_program(program) };
            Err(err)
        }
    }
}

/// Resolve the five sprite bindings by exact name match.
unsafe fn resolve_bindings(gl: &glow::Context, program: glow::Program) -> Result<SpriteBindings> {
    unsafe {
        Ok(SpriteBindings {
            position: attrib_location(gl, program, "vPosition")?,
            tex_coord: attrib_location(gl, program, "a_TexCoordinate")?,
            color: uniform_location(gl, program, "vColor")?,
            sampler: uniform_location(gl, program, "u_Texture")?,
            mvp: uniform_location(gl, program, "uMVPMatrix")?,
        })
    }
}

unsafe fn attrib_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &'static str,
) -> Result<u32> {
    unsafe { gl.get_attrib_location(program, name) }.ok_or(Error::ShaderBinding(name))
}

unsafe fn uniform_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &'static str,
) -> Result<glow::UniformLocation> {
    unsafe { gl.get_uniform_location(program, name) }.ok_or(Error::ShaderBinding(name))
}

/// Compile a single shader stage from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader> {
    let shader_type = match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    };

    unsafe {
        let shader = gl
            .create_shader(shader_type)
            .map_err(|log| Error::ShaderCompile { stage, log })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(Error::ShaderCompile { stage, log });
        }

        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The GL-dependent paths need a live context and are exercised by
    // hosts; these pin the contract the built-in sources must uphold.

    #[test]
    fn sources_declare_every_binding() {
        for name in ["vPosition", "a_TexCoordinate", "uMVPMatrix"] {
            assert!(SPRITE_VERTEX_SRC.contains(name), "{name} missing");
        }
        for name in ["vColor", "u_Texture"] {
            assert!(SPRITE_FRAGMENT_SRC.contains(name), "{name} missing");
        }
    }
}
