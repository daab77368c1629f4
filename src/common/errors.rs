use std::path::PathBuf;

use super::shader::Stage;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("engine initialisation failed: {0}")]
    Init(String),

    #[error("improper gl call occurred: {0}")]
    Gl(#[from] GlError),

    #[error("texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("window surface error: {0}")]
    Surface(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GlError {
    #[error("{stage} shader compilation error: {log}")]
    ShaderCompile { stage: Stage, log: String },

    #[error("program link error: {0}")]
    ProgramLink(String),

    #[error("uniform `{0}` does not exist in the active program")]
    UnknownUniform(String),

    #[error("{len} floats cannot be split into vertices of {components} components")]
    MalformedVertices { len: usize, components: usize },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum TextureError {
    #[error("texture {path:?} not found on disk")]
    NotFound { path: PathBuf },

    #[error("failed to read texture {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported stride {stride} for a row of {width} rgba pixels")]
    UnsupportedStride { width: u32, stride: usize },

    #[error("expected {expected} bytes of pixel data, got {actual}")]
    MalformedPixels { expected: usize, actual: usize },
}
