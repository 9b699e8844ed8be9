use crate::device::ShapeTag;
use crate::math::{Mat2, Mat3, Mat4, Matrix, Vector};

/// Per-draw constant bound to a named shader uniform.
///
/// Matrix data is row-major; `transpose` is forwarded to the device unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    shape: ShapeTag,
    data: Vec<f32>,
    transpose: bool,
}

impl Uniform {
    pub fn new(shape: ShapeTag, data: impl Into<Vec<f32>>) -> Self {
        Self {
            shape,
            data: data.into(),
            transpose: false,
        }
    }

    pub fn float(value: f32) -> Self {
        Self::new(ShapeTag::Float, vec![value])
    }

    pub fn vec2(value: Vector<2>) -> Self {
        Self::new(ShapeTag::Float2, value.0)
    }

    pub fn vec3(value: Vector<3>) -> Self {
        Self::new(ShapeTag::Float3, value.0)
    }

    pub fn vec4(value: Vector<4>) -> Self {
        Self::new(ShapeTag::Float4, value.0)
    }

    pub fn int(value: i32) -> Self {
        Self::new(ShapeTag::Int, vec![value as f32])
    }

    pub fn float_array(values: impl Into<Vec<f32>>) -> Self {
        Self::new(ShapeTag::FloatArray, values)
    }

    pub fn mat2(value: Mat2) -> Self {
        Self::matrices(ShapeTag::Mat2Array, &[value])
    }

    pub fn mat3(value: Mat3) -> Self {
        Self::matrices(ShapeTag::Mat3Array, &[value])
    }

    pub fn mat3_array(values: &[Mat3]) -> Self {
        Self::matrices(ShapeTag::Mat3Array, values)
    }

    pub fn mat4(value: Mat4) -> Self {
        Self::matrices(ShapeTag::Mat4Array, &[value])
    }

    fn matrices<const N: usize>(shape: ShapeTag, values: &[Matrix<N>]) -> Self {
        let data: Vec<f32> = values.iter().flat_map(|m| m.to_flat()).collect();
        Self::new(shape, data)
    }

    pub fn with_transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }

    #[inline]
    pub fn shape(&self) -> ShapeTag {
        self.shape
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn transpose(&self) -> bool {
        self.transpose
    }
}

/// Shape of a constant vertex attribute. Matrices are not allowed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttributeShape {
    Float,
    Float2,
    Float3,
    Float4,
    FloatArray,
    Float2Array,
    Float3Array,
    Float4Array,
}

impl AttributeShape {
    pub const fn tag(self) -> ShapeTag {
        match self {
            AttributeShape::Float => ShapeTag::Float,
            AttributeShape::Float2 => ShapeTag::Float2,
            AttributeShape::Float3 => ShapeTag::Float3,
            AttributeShape::Float4 => ShapeTag::Float4,
            AttributeShape::FloatArray => ShapeTag::FloatArray,
            AttributeShape::Float2Array => ShapeTag::Float2Array,
            AttributeShape::Float3Array => ShapeTag::Float3Array,
            AttributeShape::Float4Array => ShapeTag::Float4Array,
        }
    }
}

/// Value used for a shader input that no vertex buffer feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    shape: AttributeShape,
    data: Vec<f32>,
}

impl Attribute {
    pub fn new(shape: AttributeShape, data: impl Into<Vec<f32>>) -> Self {
        Self {
            shape,
            data: data.into(),
        }
    }

    pub fn float(value: f32) -> Self {
        Self::new(AttributeShape::Float, vec![value])
    }

    pub fn vec2(value: Vector<2>) -> Self {
        Self::new(AttributeShape::Float2, value.0)
    }

    pub fn vec3(value: Vector<3>) -> Self {
        Self::new(AttributeShape::Float3, value.0)
    }

    pub fn vec4(value: Vector<4>) -> Self {
        Self::new(AttributeShape::Float4, value.0)
    }

    #[inline]
    pub fn shape(&self) -> AttributeShape {
        self.shape
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
