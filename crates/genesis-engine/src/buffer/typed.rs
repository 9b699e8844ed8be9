use indexmap::IndexMap;

use crate::device::{
    BufferHandle, BufferTarget, BufferUsage, Device, ProgramHandle, VertexAttributeLayout,
};
use crate::error::{Error, Result};
use crate::math::Vector;

use super::BufferAttribute;

/// Named attributes packed into one device buffer.
///
/// Attributes are uploaded back to back in insertion order; each one starts
/// where the previous one's data ends. For vertex-array buffers every
/// attribute is additionally bound to the program input of the same name
/// with the buffer-wide stride.
///
/// Storage is created lazily by the first [`TypedBuffer::sync_to_device`]. The
/// device handle is kept for the buffer's lifetime: later syncs re-upload into
/// it, and grow its storage in place when the data outgrows it.
#[derive(Debug)]
pub struct TypedBuffer {
    attributes: IndexMap<String, BufferAttribute>,
    target: BufferTarget,
    usage: BufferUsage,
    stride: usize,
    dirty: bool,
    handle: Option<BufferHandle>,
    allocated: usize,
}

impl TypedBuffer {
    pub fn new<K: Into<String>>(
        attributes: impl IntoIterator<Item = (K, BufferAttribute)>,
        target: BufferTarget,
        usage: BufferUsage,
    ) -> Self {
        let attributes: IndexMap<String, BufferAttribute> = attributes
            .into_iter()
            .map(|(name, attribute)| (name.into(), attribute))
            .collect();
        let stride = byte_stride(attributes.values());

        Self {
            attributes,
            target,
            usage,
            stride,
            dirty: false,
            handle: None,
            allocated: 0,
        }
    }

    #[inline]
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cached [`TypedBuffer::byte_stride`], refreshed whenever attributes are
    /// added or removed.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sum over attributes of `component_count * size_of(element_type)`.
    pub fn byte_stride(&self) -> usize {
        byte_stride(self.attributes.values())
    }

    /// Total encoded size of all attribute data.
    pub fn byte_size(&self) -> usize {
        self.attributes.values().map(BufferAttribute::byte_len).sum()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &BufferAttribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        let found = self.attributes.get(name);
        if found.is_none() {
            log::warn!("buffer has no attribute `{name}`");
        }
        found
    }

    #[inline]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Adds or replaces an attribute; returns the replaced one.
    pub fn insert_attribute(
        &mut self,
        name: impl Into<String>,
        attribute: BufferAttribute,
    ) -> Option<BufferAttribute> {
        let previous = self.attributes.insert(name.into(), attribute);
        self.attributes_changed();
        previous
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        if self.attributes.shift_remove(name).is_none() {
            log::warn!("cannot remove attribute `{name}`: not present");
            return false;
        }
        self.attributes_changed();
        true
    }

    /// Replaces one attribute's data and marks the buffer dirty.
    ///
    /// Returns `Ok(false)` if no such attribute exists.
    pub fn set_attribute_data(&mut self, name: &str, data: Vec<f32>) -> Result<bool> {
        let Some(attribute) = self.attributes.get_mut(name) else {
            log::warn!("cannot update attribute `{name}`: not present");
            return Ok(false);
        };
        attribute.set_data(data)?;
        self.dirty = true;
        Ok(true)
    }

    /// Schedules a full re-upload on the next sync.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Brings device storage up to date with the attribute data.
    ///
    /// Allocates on first use (which forces a full upload). Without pending
    /// changes this makes no device calls at all.
    pub fn sync_to_device(
        &mut self,
        device: &mut dyn Device,
        program: Option<ProgramHandle>,
    ) -> Result<()> {
        let program = program.ok_or(Error::ShaderNotCompiled)?;

        let size = self.byte_size();
        let handle = match self.handle {
            None => {
                let handle = device.create_buffer()?;
                device.bind_buffer(handle, self.target)?;
                device.allocate(self.target, size, self.usage)?;
                self.handle = Some(handle);
                self.allocated = size;
                self.dirty = true;
                handle
            }
            Some(handle) if size > self.allocated => {
                device.bind_buffer(handle, self.target)?;
                device.allocate(self.target, size, self.usage)?;
                self.allocated = size;
                self.dirty = true;
                handle
            }
            Some(handle) => handle,
        };

        if !self.dirty {
            return Ok(());
        }

        device.bind_buffer(handle, self.target)?;

        let mut offset = 0;
        let mut va_offset = 0;
        for (name, attribute) in &self.attributes {
            if attribute.is_empty() {
                va_offset += attribute.element_size();
                continue;
            }

            let bytes = attribute
                .element_type()
                .encode(attribute.data())
                .map_err(|e| Error::BufferUpload {
                    attribute: name.clone(),
                    reason: e.to_string(),
                })?;
            device.upload_sub_range(self.target, offset, &bytes)?;

            if self.target == BufferTarget::VertexArray {
                self.bind_attribute(device, program, name, attribute, va_offset)?;
            }

            offset += bytes.len();
            va_offset += attribute.element_size();
        }

        self.dirty = false;
        Ok(())
    }

    /// Re-binds the buffer (and, for vertex data, its attribute pointers)
    /// without uploading anything.
    pub fn bind(&self, device: &mut dyn Device, program: ProgramHandle) -> Result<()> {
        let handle = self.handle.ok_or(Error::BufferNotAllocated)?;
        device.bind_buffer(handle, self.target)?;

        if self.target == BufferTarget::VertexArray {
            let mut va_offset = 0;
            for (name, attribute) in &self.attributes {
                if !attribute.is_empty() {
                    self.bind_attribute(device, program, name, attribute, va_offset)?;
                }
                va_offset += attribute.element_size();
            }
        }
        Ok(())
    }

    /// Deletes the device buffer. The next sync allocates a fresh one.
    pub fn release(&mut self, device: &mut dyn Device) {
        if let Some(handle) = self.handle.take() {
            device.delete_buffer(handle);
        }
        self.allocated = 0;
        self.dirty = false;
    }

    /// Flattens vectors into a component array, e.g. for attribute data.
    pub fn flatten<const N: usize>(vectors: &[Vector<N>]) -> Vec<f32> {
        vectors.iter().flat_map(|v| v.0).collect()
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn attributes_changed(&mut self) {
        self.stride = byte_stride(self.attributes.values());
        self.dirty = true;
    }

    fn bind_attribute(
        &self,
        device: &mut dyn Device,
        program: ProgramHandle,
        name: &str,
        attribute: &BufferAttribute,
        offset: usize,
    ) -> Result<()> {
        let Some(slot) = device.attribute_location(program, name) else {
            log::debug!("attribute `{name}` is not an input of program {program:?}");
            return Ok(());
        };

        device.bind_vertex_attribute(
            slot,
            VertexAttributeLayout {
                component_count: attribute.component_count(),
                element_type: attribute.element_type(),
                normalized: attribute.normalized(),
                stride: self.stride,
                offset,
            },
        )?;
        device.enable_vertex_attribute(slot)?;
        Ok(())
    }
}

/// Bytes per vertex for a set of attributes.
pub fn byte_stride<'a>(attributes: impl IntoIterator<Item = &'a BufferAttribute>) -> usize {
    attributes
        .into_iter()
        .map(BufferAttribute::element_size)
        .sum()
}
