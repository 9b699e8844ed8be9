//! In-memory [`Device`] used by unit tests.
//!
//! Clones share state, so a test can hand one clone to a scene and inspect
//! the recorded calls through another.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::math::Color;

use super::{
    BufferHandle, BufferTarget, BufferUsage, Device, DeviceError, ElementType, PrimitiveKind,
    ProgramHandle, ShaderCompileError, ShaderCompiler, ShapeTag, Slot, VertexAttributeLayout,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Compile(ProgramHandle),
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer(BufferHandle, BufferTarget),
    Allocate(BufferTarget, usize, BufferUsage),
    Upload(BufferTarget, usize, Vec<u8>),
    BindVertexAttribute(Slot, VertexAttributeLayout),
    EnableVertexAttribute(Slot),
    UseProgram(ProgramHandle),
    SetUniform(Slot, ShapeTag, Vec<f32>, bool),
    SetVertexAttribValue(Slot, ShapeTag, Vec<f32>),
    Draw(PrimitiveKind, usize, ElementType, usize),
    Clear(Color),
    Viewport(u32, u32),
    Resize(u32, u32),
    Present,
}

#[derive(Default)]
pub(crate) struct Recording {
    pub calls: Vec<Call>,
    pub buffers: HashMap<BufferHandle, Vec<u8>>,
    bound: HashMap<BufferTarget, BufferHandle>,
    attributes: HashMap<String, Slot>,
    uniforms: HashMap<String, Slot>,
    fail_compile: Option<ShaderCompileError>,
    next_handle: u32,
    size: (u32, u32),
}

#[derive(Clone, Default)]
pub(crate) struct RecordingDevice {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        let device = Self::default();
        device.inner.borrow_mut().size = (800, 600);
        device
    }

    /// Programs resolve these attribute names to the given slots.
    pub fn with_attributes(self, names: &[(&str, Slot)]) -> Self {
        self.inner
            .borrow_mut()
            .attributes
            .extend(names.iter().map(|(n, s)| (n.to_string(), *s)));
        self
    }

    /// Programs resolve these uniform names to the given slots.
    pub fn with_uniforms(self, names: &[(&str, Slot)]) -> Self {
        self.inner
            .borrow_mut()
            .uniforms
            .extend(names.iter().map(|(n, s)| (n.to_string(), *s)));
        self
    }

    pub fn failing_compile(self, error: ShaderCompileError) -> Self {
        self.inner.borrow_mut().fail_compile = Some(error);
        self
    }

    pub fn state(&self) -> Ref<'_, Recording> {
        self.inner.borrow()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.inner.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn buffer(&self, handle: BufferHandle) -> Vec<u8> {
        self.inner
            .borrow()
            .buffers
            .get(&handle)
            .cloned()
            .unwrap_or_default()
    }

    pub fn boxed(&self) -> Box<dyn Device> {
        Box::new(self.clone())
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn bound(&self, target: BufferTarget) -> Result<BufferHandle, DeviceError> {
        self.inner
            .borrow()
            .bound
            .get(&target)
            .copied()
            .ok_or(DeviceError::NothingBound(target))
    }
}

impl ShaderCompiler for RecordingDevice {
    fn compile(
        &mut self,
        _vertex_source: &str,
        _fragment_source: &str,
    ) -> Result<ProgramHandle, ShaderCompileError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(err) = inner.fail_compile.clone() {
            return Err(err);
        }
        inner.next_handle += 1;
        let program = ProgramHandle::from_raw(inner.next_handle);
        inner.calls.push(Call::Compile(program));
        Ok(program)
    }
}

impl Device for RecordingDevice {
    fn create_buffer(&mut self) -> Result<BufferHandle, DeviceError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_handle += 1;
        let handle = BufferHandle::from_raw(inner.next_handle);
        inner.buffers.insert(handle, Vec::new());
        inner.calls.push(Call::CreateBuffer(handle));
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.buffers.remove(&handle);
        inner.bound.retain(|_, h| *h != handle);
        inner.calls.push(Call::DeleteBuffer(handle));
    }

    fn bind_buffer(
        &mut self,
        handle: BufferHandle,
        target: BufferTarget,
    ) -> Result<(), DeviceError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.buffers.contains_key(&handle) {
            return Err(DeviceError::UnknownBuffer(handle));
        }
        inner.bound.insert(target, handle);
        inner.calls.push(Call::BindBuffer(handle, target));
        Ok(())
    }

    fn allocate(
        &mut self,
        target: BufferTarget,
        size_bytes: usize,
        usage: BufferUsage,
    ) -> Result<(), DeviceError> {
        let handle = self.bound(target)?;
        let mut inner = self.inner.borrow_mut();
        inner.buffers.insert(handle, vec![0; size_bytes]);
        inner.calls.push(Call::Allocate(target, size_bytes, usage));
        Ok(())
    }

    fn upload_sub_range(
        &mut self,
        target: BufferTarget,
        offset_bytes: usize,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let handle = self.bound(target)?;
        let mut inner = self.inner.borrow_mut();
        let storage = inner
            .buffers
            .get_mut(&handle)
            .ok_or(DeviceError::UnknownBuffer(handle))?;
        let end = offset_bytes + bytes.len();
        if end > storage.len() {
            return Err(DeviceError::OutOfRange {
                offset: offset_bytes,
                end,
                size: storage.len(),
            });
        }
        storage[offset_bytes..end].copy_from_slice(bytes);
        inner
            .calls
            .push(Call::Upload(target, offset_bytes, bytes.to_vec()));
        Ok(())
    }

    fn attribute_location(&self, _program: ProgramHandle, name: &str) -> Option<Slot> {
        self.inner.borrow().attributes.get(name).copied()
    }

    fn uniform_location(&self, _program: ProgramHandle, name: &str) -> Option<Slot> {
        self.inner.borrow().uniforms.get(name).copied()
    }

    fn bind_vertex_attribute(
        &mut self,
        slot: Slot,
        layout: VertexAttributeLayout,
    ) -> Result<(), DeviceError> {
        self.bound(BufferTarget::VertexArray)?;
        self.record(Call::BindVertexAttribute(slot, layout));
        Ok(())
    }

    fn enable_vertex_attribute(&mut self, slot: Slot) -> Result<(), DeviceError> {
        self.record(Call::EnableVertexAttribute(slot));
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DeviceError> {
        self.record(Call::UseProgram(program));
        Ok(())
    }

    fn set_uniform(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
        transpose: bool,
    ) -> Result<(), DeviceError> {
        self.record(Call::SetUniform(slot, shape, data.to_vec(), transpose));
        Ok(())
    }

    fn set_vertex_attrib_value(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
    ) -> Result<(), DeviceError> {
        self.record(Call::SetVertexAttribValue(slot, shape, data.to_vec()));
        Ok(())
    }

    fn draw(
        &mut self,
        primitive: PrimitiveKind,
        index_count: usize,
        index_type: ElementType,
        index_offset: usize,
    ) -> Result<(), DeviceError> {
        self.bound(BufferTarget::ElementArray)?;
        self.record(Call::Draw(primitive, index_count, index_type, index_offset));
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<(), DeviceError> {
        self.record(Call::Clear(color));
        Ok(())
    }

    fn viewport(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        self.record(Call::Viewport(width, height));
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.inner.borrow().size
    }

    fn resize(&mut self, width: u32, height: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.size = (width, height);
        inner.calls.push(Call::Resize(width, height));
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.record(Call::Present);
        Ok(())
    }
}
