use thiserror::Error;

/// Opaque device buffer name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u32);

impl BufferHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque linked shader program name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(u32);

impl ProgramHandle {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Resolved shader input or uniform location.
pub type Slot = u32;

/// Binding point a buffer is attached to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex data.
    VertexArray,
    /// Index data.
    ElementArray,
}

/// Expected update frequency of a buffer's storage.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

// ── element types ─────────────────────────────────────────────────────────

/// Binary representation of one buffer component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Float32,
}

/// A value that cannot be represented by the target element type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("value {value} at index {index} is not representable as {element_type:?}")]
pub struct EncodeError {
    pub index: usize,
    pub value: f32,
    pub element_type: ElementType,
}

impl ElementType {
    /// Size of one component in bytes.
    #[inline]
    pub const fn size_of(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Float32 => 4,
        }
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, ElementType::Float32)
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, ElementType::Int8 | ElementType::Int16 | ElementType::Float32)
    }

    fn int_range(self) -> (f32, f32) {
        match self {
            ElementType::Int8 => (i8::MIN as f32, i8::MAX as f32),
            ElementType::Uint8 => (0.0, u8::MAX as f32),
            ElementType::Int16 => (i16::MIN as f32, i16::MAX as f32),
            ElementType::Uint16 => (0.0, u16::MAX as f32),
            ElementType::Float32 => (f32::MIN, f32::MAX),
        }
    }

    /// Encodes `values` in native byte order (little-endian on every wgpu target).
    ///
    /// Integer types truncate toward zero; non-finite or out-of-range values
    /// are rejected.
    pub fn encode(self, values: &[f32]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(values.len() * self.size_of());
        let (min, max) = self.int_range();

        for (index, &value) in values.iter().enumerate() {
            let reject = || EncodeError {
                index,
                value,
                element_type: self,
            };

            if self == ElementType::Float32 {
                out.extend_from_slice(bytemuck::bytes_of(&value));
                continue;
            }

            if !value.is_finite() {
                return Err(reject());
            }
            let v = value.trunc();
            if v < min || v > max {
                return Err(reject());
            }

            match self {
                ElementType::Int8 => out.extend_from_slice(&(v as i8).to_le_bytes()),
                ElementType::Uint8 => out.push(v as u8),
                ElementType::Int16 => out.extend_from_slice(&(v as i16).to_le_bytes()),
                ElementType::Uint16 => out.extend_from_slice(&(v as u16).to_le_bytes()),
                ElementType::Float32 => unreachable!("handled above"),
            }
        }

        Ok(out)
    }

    /// Inverse of [`ElementType::encode`]. Trailing partial elements are ignored.
    pub fn decode(self, bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(self.size_of())
            .map(|c| match self {
                ElementType::Int8 => bytemuck::pod_read_unaligned::<i8>(c) as f32,
                ElementType::Uint8 => c[0] as f32,
                ElementType::Int16 => bytemuck::pod_read_unaligned::<i16>(c) as f32,
                ElementType::Uint16 => bytemuck::pod_read_unaligned::<u16>(c) as f32,
                ElementType::Float32 => bytemuck::pod_read_unaligned::<f32>(c),
            })
            .collect()
    }
}

/// Vertex attribute pointer description.
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttributeLayout {
    pub component_count: u8,
    pub element_type: ElementType,
    pub normalized: bool,
    pub stride: usize,
    pub offset: usize,
}

// ── shape tags ────────────────────────────────────────────────────────────

/// Arity/rank of a uniform or constant attribute value.
///
/// Scalar and vector tags consume exactly their component count; array tags
/// consume as many whole elements as the data holds. Matrix tags are always
/// arrays of row-major `N x N` blocks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    Float,
    Float2,
    Float3,
    Float4,
    FloatArray,
    Float2Array,
    Float3Array,
    Float4Array,
    Int,
    Int2,
    Int3,
    Int4,
    IntArray,
    Int2Array,
    Int3Array,
    Int4Array,
    Mat2Array,
    Mat3Array,
    Mat4Array,
}

impl ShapeTag {
    /// Number of values in one element.
    pub const fn components(self) -> usize {
        use ShapeTag::*;
        match self {
            Float | FloatArray | Int | IntArray => 1,
            Float2 | Float2Array | Int2 | Int2Array => 2,
            Float3 | Float3Array | Int3 | Int3Array => 3,
            Float4 | Float4Array | Int4 | Int4Array | Mat2Array => 4,
            Mat3Array => 9,
            Mat4Array => 16,
        }
    }

    pub const fn is_array(self) -> bool {
        use ShapeTag::*;
        matches!(
            self,
            FloatArray
                | Float2Array
                | Float3Array
                | Float4Array
                | IntArray
                | Int2Array
                | Int3Array
                | Int4Array
                | Mat2Array
                | Mat3Array
                | Mat4Array
        )
    }

    pub const fn is_int(self) -> bool {
        use ShapeTag::*;
        matches!(
            self,
            Int | Int2 | Int3 | Int4 | IntArray | Int2Array | Int3Array | Int4Array
        )
    }

    /// Side length for matrix tags.
    pub const fn matrix_dim(self) -> Option<usize> {
        match self {
            ShapeTag::Mat2Array => Some(2),
            ShapeTag::Mat3Array => Some(3),
            ShapeTag::Mat4Array => Some(4),
            _ => None,
        }
    }

    /// Minimum data length accepted for this tag.
    ///
    /// Array tags accept any length.
    pub const fn required_len(self) -> usize {
        if self.is_array() { 0 } else { self.components() }
    }
}
