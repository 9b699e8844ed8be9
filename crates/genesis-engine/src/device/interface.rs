use crate::math::Color;

use super::{
    BufferHandle, BufferTarget, BufferUsage, DeviceError, ElementType, PrimitiveKind,
    ProgramHandle, ShaderCompileError, ShapeTag, Slot, VertexAttributeLayout,
};

/// Turns a vertex + fragment source pair into a linked program.
pub trait ShaderCompiler {
    fn compile(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, ShaderCompileError>;
}

/// Immediate-mode graphics device.
///
/// The contract mirrors a bind-then-operate API: buffer operations act on
/// whatever buffer was last bound to the given target, and uniform/attribute
/// value calls act on the program last passed to [`Device::use_program`].
pub trait Device: ShaderCompiler {
    fn create_buffer(&mut self) -> Result<BufferHandle, DeviceError>;

    /// Deleting an unknown handle is a no-op.
    fn delete_buffer(&mut self, handle: BufferHandle);

    fn bind_buffer(&mut self, handle: BufferHandle, target: BufferTarget)
        -> Result<(), DeviceError>;

    /// (Re)creates zero-filled storage for the buffer bound to `target`.
    fn allocate(
        &mut self,
        target: BufferTarget,
        size_bytes: usize,
        usage: BufferUsage,
    ) -> Result<(), DeviceError>;

    fn upload_sub_range(
        &mut self,
        target: BufferTarget,
        offset_bytes: usize,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;

    /// Input slot of the named vertex attribute, if the program consumes it.
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<Slot>;

    /// Slot of the named uniform, if the program declares it.
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<Slot>;

    /// Points `slot` at the buffer currently bound to the vertex-array target.
    fn bind_vertex_attribute(
        &mut self,
        slot: Slot,
        layout: VertexAttributeLayout,
    ) -> Result<(), DeviceError>;

    fn enable_vertex_attribute(&mut self, slot: Slot) -> Result<(), DeviceError>;

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DeviceError>;

    fn set_uniform(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
        transpose: bool,
    ) -> Result<(), DeviceError>;

    /// Constant value used for `slot` while no buffer feeds it.
    fn set_vertex_attrib_value(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
    ) -> Result<(), DeviceError>;

    /// Indexed draw from the buffer bound to the element-array target.
    ///
    /// `index_offset` is in bytes.
    fn draw(
        &mut self,
        primitive: PrimitiveKind,
        index_count: usize,
        index_type: ElementType,
        index_offset: usize,
    ) -> Result<(), DeviceError>;

    fn clear(&mut self, color: Color) -> Result<(), DeviceError>;

    fn viewport(&mut self, width: u32, height: u32) -> Result<(), DeviceError>;

    /// Current drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Finishes the frame. Called once per tick after every object rendered.
    fn present(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}
