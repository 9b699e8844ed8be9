//! Engine error type.
//!
//! Lookup misses (absent game object, component, buffer or attribute) are not
//! errors: they are logged and reported through `bool`/`Option` returns. The
//! variants below are the failures that must stop the operation that hit them.

use thiserror::Error;

use crate::device::{DeviceError, ShaderCompileError, ShaderStage};

#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Preconditions
    // ========================================================================
    /// A buffer was synced without a compiled program to bind against.
    #[error("cannot sync buffer: shader program is not compiled")]
    ShaderNotCompiled,

    /// A material was pushed to the device before its shader compiled.
    #[error("material used before its shader was compiled")]
    UncompiledMaterial,

    /// A buffer was bound before it ever received device storage.
    #[error("buffer has no device storage yet")]
    BufferNotAllocated,

    // ========================================================================
    // Shader compilation
    // ========================================================================
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to load shader source `{path}`: {message}")]
    ShaderSource { path: String, message: String },

    // ========================================================================
    // Data shape
    // ========================================================================
    /// A scalar/vector uniform or attribute holds fewer values than its shape needs.
    #[error("`{name}` needs {expected} components but holds {actual}")]
    InsufficientComponents {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Attribute data length is not a whole number of vertices.
    #[error("attribute data of length {len} does not split into {components}-component elements")]
    AttributeShape { components: u8, len: usize },

    #[error("failed to upload attribute `{attribute}`: {reason}")]
    BufferUpload { attribute: String, reason: String },

    // ========================================================================
    // Device
    // ========================================================================
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl From<ShaderCompileError> for Error {
    fn from(err: ShaderCompileError) -> Self {
        Error::ShaderCompile {
            stage: err.stage,
            log: err.log,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
