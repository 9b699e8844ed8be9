use crate::device::ElementType;
use crate::error::{Error, Result};

/// One named data channel of a [`TypedBuffer`](super::TypedBuffer).
///
/// `data.len()` is always a multiple of `component_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferAttribute {
    data: Vec<f32>,
    element_type: ElementType,
    component_count: u8,
    normalized: bool,
}

impl BufferAttribute {
    pub fn new(
        data: Vec<f32>,
        element_type: ElementType,
        component_count: u8,
        normalized: bool,
    ) -> Result<Self> {
        check_shape(component_count, data.len())?;
        Ok(Self {
            data,
            element_type,
            component_count,
            normalized,
        })
    }

    pub fn float32(data: Vec<f32>, component_count: u8) -> Result<Self> {
        Self::new(data, ElementType::Float32, component_count, false)
    }

    pub fn uint16(data: Vec<f32>, component_count: u8) -> Result<Self> {
        Self::new(data, ElementType::Uint16, component_count, false)
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    #[inline]
    pub fn component_count(&self) -> u8 {
        self.component_count
    }

    #[inline]
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of `component_count`-sized elements.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.data.len() / self.component_count as usize
    }

    /// Bytes one element of this attribute occupies within a vertex.
    #[inline]
    pub fn element_size(&self) -> usize {
        self.component_count as usize * self.element_type.size_of()
    }

    /// Bytes of the encoded data.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len() * self.element_type.size_of()
    }

    /// Replaces the data, keeping the layout.
    pub fn set_data(&mut self, data: Vec<f32>) -> Result<()> {
        check_shape(self.component_count, data.len())?;
        self.data = data;
        Ok(())
    }
}

fn check_shape(component_count: u8, len: usize) -> Result<()> {
    if !(1..=4).contains(&component_count) || len % component_count as usize != 0 {
        return Err(Error::AttributeShape {
            components: component_count,
            len,
        });
    }
    Ok(())
}
