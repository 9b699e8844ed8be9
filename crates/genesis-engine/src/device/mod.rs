//! Graphics device interface.
//!
//! Everything above this module talks to the GPU through the [`Device`] and
//! [`ShaderCompiler`] traits. The wgpu implementation lives in
//! [`crate::gpu`]; tests use an in-memory recorder.

mod error;
mod interface;
mod types;

#[cfg(test)]
pub(crate) mod recording;

pub use error::{DeviceError, ShaderCompileError, ShaderStage};
pub use interface::{Device, ShaderCompiler};
pub use types::{
    BufferHandle, BufferTarget, BufferUsage, ElementType, EncodeError, PrimitiveKind,
    ProgramHandle, ShapeTag, Slot, VertexAttributeLayout,
};
