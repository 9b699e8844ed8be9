use std::fmt;

use thiserror::Error;

use super::{BufferHandle, BufferTarget, ElementType, ProgramHandle};

/// Failure reported by a graphics device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferHandle),

    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramHandle),

    #[error("no buffer bound to {0:?}")]
    NothingBound(BufferTarget),

    #[error("no program in use")]
    NoActiveProgram,

    #[error("range {offset}..{end} exceeds buffer size {size}")]
    OutOfRange { offset: usize, end: usize, size: usize },

    #[error("unsupported vertex format: {count} x {element_type:?} (normalized: {normalized})")]
    UnsupportedVertexFormat {
        count: u8,
        element_type: ElementType,
        normalized: bool,
    },

    #[error("unsupported vertex layout: {0}")]
    UnsupportedLayout(String),

    #[error("unsupported index type {0:?}")]
    UnsupportedIndexType(ElementType),

    #[error("uniform data does not match the declared member: {0}")]
    UniformMismatch(String),

    #[error("surface error: {0}")]
    Surface(String),
}

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Compilation or link failure of one stage, with the compiler's log.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{stage} stage failed to compile:\n{log}")]
pub struct ShaderCompileError {
    pub stage: ShaderStage,
    pub log: String,
}

impl ShaderCompileError {
    pub fn new(stage: ShaderStage, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
        }
    }
}
