//! SVG sprites on the GPU, rendered with OpenGL via [glow].
//!
//! This crate turns a named vector asset into a GPU texture and draws it as
//! a screen-space quad:
//!
//! 1. [`rasterize_from`] parses the SVG bytes and rasterizes them onto the
//!    smallest square power-of-two atlas that fits ([`atlas_size`]),
//!    recording the occupied content rectangle separately from the padded
//!    canvas.
//! 2. [`texture::upload`] moves the bitmap into GPU texture memory with
//!    nearest-neighbor filtering and hands back a [`TextureHandle`]; the
//!    CPU-side pixels are gone after the call.
//! 3. [`Sprite`] pairs the handle with quad geometry whose UV coordinates
//!    stop at the content/atlas ratio, so the transparent padding is never
//!    sampled.
//! 4. [`SpriteRenderer`] compiles the sprite shader program once, owns the
//!    orthographic projection for the current viewport, and issues the
//!    indexed draw calls each frame.
//!
//! The host owns the window and GL context; it calls
//! [`SpriteRenderer::new`] when the surface is ready,
//! [`SpriteRenderer::resize`] when the viewport changes, and
//! [`SpriteRenderer::render`] on each frame tick. For assets too slow to
//! rasterize on the render thread, [`AssetLoader`] moves that stage onto a
//! worker thread and delivers finished images back for upload.
//!
//! # Safety
//!
//! Creating and using a [`SpriteRenderer`], uploading textures, and
//! releasing handles all require a valid, current OpenGL context. Those
//! methods are `unsafe` because they issue raw GL calls.
//!
//! [glow]: https://docs.rs/glow

pub mod atlas;
pub mod error;
pub mod loader;
pub mod raster;
pub mod render;
pub mod shaders;
pub mod sprite;
pub mod texture;

pub use atlas::{atlas_size, MIN_ATLAS_SIZE};
pub use error::{Error, Result, ShaderStage};
pub use loader::{AssetLoader, LoadResult, LoaderDisconnected};
pub use raster::{rasterize, rasterize_from, AssetSource, RasterizedImage, VectorAsset};
pub use render::{orthographic_projection, SpriteRenderer};
pub use sprite::{Sprite, SpriteGeometry, TextureState, Vertex};
pub use texture::TextureHandle;
