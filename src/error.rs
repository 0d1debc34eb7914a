//! Error taxonomy for asset loading, texture upload, and shader pipeline
//! construction.

use resvg::usvg;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Which shader stage a compile failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,
    /// The fragment stage.
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Everything that can go wrong between an asset identifier and a drawn
/// sprite.
///
/// Shader variants are fatal for the render session: [`crate::SpriteRenderer::new`]
/// fails before any frame is drawn. Asset and texture variants are scoped to
/// the affected sprite; the host decides whether to retry, substitute, or
/// drop it. Nothing in this crate retries internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The asset identifier resolved to no data in the [`crate::AssetSource`].
    #[error("no asset data found for `{0}`")]
    AssetNotFound(String),

    /// The asset bytes were not a well-formed vector description.
    #[error("malformed vector asset `{id}`: {source}")]
    AssetParse {
        /// Identifier of the offending asset.
        id: String,
        /// The underlying parser diagnostic.
        source: usvg::Error,
    },

    /// The GPU rejected texture allocation or the pixel copy.
    #[error("GPU texture upload failed: {0}")]
    TextureUpload(String),

    /// A shader stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile {
        /// The stage that failed.
        stage: ShaderStage,
        /// The compiler's diagnostic output.
        log: String,
    },

    /// The compiled stages failed to link into a program.
    #[error("shader program failed to link: {0}")]
    ShaderLink(String),

    /// A required attribute or uniform was missing from the linked program.
    #[error("shader binding `{0}` not found in linked program")]
    ShaderBinding(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_error_names_the_missing_symbol() {
        let err = Error::ShaderBinding("vColor");
        assert!(err.to_string().contains("vColor"));
    }

    #[test]
    fn compile_error_names_the_stage() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:3: syntax error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fragment"));
        assert!(msg.contains("syntax error"));
    }
}
