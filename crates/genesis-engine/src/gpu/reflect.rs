//! WGSL front-end and layout reflection.
//!
//! Sources are parsed and validated with naga before wgpu sees them, so a bad
//! shader becomes a [`ShaderCompileError`] instead of a device panic. The
//! reflected vertex inputs and uniform block drive attribute/uniform slot
//! lookup and the byte layout of uniform uploads.

use indexmap::IndexMap;
use naga::{
    AddressSpace, ArraySize, Binding, Module, ScalarKind, StructMember, Type, TypeInner,
};

use crate::device::{
    DeviceError, ElementType, ShaderCompileError, ShaderStage, ShapeTag, VertexAttributeLayout,
};

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";

// ── parsing ───────────────────────────────────────────────────────────────

pub(crate) fn parse(stage: ShaderStage, source: &str) -> Result<Module, ShaderCompileError> {
    if source.trim().is_empty() {
        return Err(ShaderCompileError::new(stage, "empty shader source"));
    }

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderCompileError::new(stage, e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ShaderCompileError::new(stage, e.as_inner().to_string()))?;

    let entry = match stage {
        ShaderStage::Vertex => (naga::ShaderStage::Vertex, VERTEX_ENTRY),
        ShaderStage::Fragment => (naga::ShaderStage::Fragment, FRAGMENT_ENTRY),
    };
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.stage == entry.0 && ep.name == entry.1)
    {
        return Err(ShaderCompileError::new(
            stage,
            format!("missing entry point `{}`", entry.1),
        ));
    }

    Ok(module)
}

// ── vertex inputs ─────────────────────────────────────────────────────────

/// Base type of a shader input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum InputKind {
    Float,
    Sint,
    Uint,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct VertexInput {
    pub location: u32,
    pub kind: InputKind,
    pub components: u8,
}

impl VertexInput {
    /// Format used when the input is fed a constant value.
    pub(crate) fn constant_format(&self) -> wgpu::VertexFormat {
        use wgpu::VertexFormat as F;
        match (self.kind, self.components) {
            (InputKind::Float, 1) => F::Float32,
            (InputKind::Float, 2) => F::Float32x2,
            (InputKind::Float, 3) => F::Float32x3,
            (InputKind::Float, _) => F::Float32x4,
            (InputKind::Sint, 1) => F::Sint32,
            (InputKind::Sint, 2) => F::Sint32x2,
            (InputKind::Sint, 3) => F::Sint32x3,
            (InputKind::Sint, _) => F::Sint32x4,
            (InputKind::Uint, 1) => F::Uint32,
            (InputKind::Uint, 2) => F::Uint32x2,
            (InputKind::Uint, 3) => F::Uint32x3,
            (InputKind::Uint, _) => F::Uint32x4,
        }
    }

    /// Encodes `value` in [`VertexInput::constant_format`].
    pub(crate) fn encode_constant(&self, value: [f32; 4]) -> Vec<u8> {
        value[..self.components as usize]
            .iter()
            .flat_map(|&v| match self.kind {
                InputKind::Float => v.to_le_bytes(),
                InputKind::Sint => (v as i32).to_le_bytes(),
                InputKind::Uint => (v as u32).to_le_bytes(),
            })
            .collect()
    }
}

/// `@location` inputs of the vertex entry point, keyed by name.
pub(crate) fn vertex_inputs(module: &Module) -> IndexMap<String, VertexInput> {
    let mut inputs = IndexMap::new();
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Vertex && ep.name == VERTEX_ENTRY)
    else {
        return inputs;
    };

    for argument in &entry.function.arguments {
        match (&argument.binding, &module.types[argument.ty].inner) {
            (Some(binding), inner) => {
                if let (Some(name), Some(input)) =
                    (argument.name.as_ref(), location_input(binding, inner))
                {
                    inputs.insert(name.clone(), input);
                }
            }
            (None, TypeInner::Struct { members, .. }) => {
                for member in members {
                    let Some(binding) = member.binding.as_ref() else {
                        continue;
                    };
                    let inner = &module.types[member.ty].inner;
                    if let (Some(name), Some(input)) =
                        (member.name.as_ref(), location_input(binding, inner))
                    {
                        inputs.insert(name.clone(), input);
                    }
                }
            }
            (None, _) => {}
        }
    }
    inputs
}

fn location_input(binding: &Binding, inner: &TypeInner) -> Option<VertexInput> {
    let Binding::Location { location, .. } = binding else {
        return None;
    };
    let (scalar, components) = match *inner {
        TypeInner::Scalar(scalar) => (scalar, 1),
        TypeInner::Vector { size, scalar } => (scalar, size as u8),
        _ => return None,
    };
    let kind = match scalar.kind {
        ScalarKind::Sint => InputKind::Sint,
        ScalarKind::Uint => InputKind::Uint,
        _ => InputKind::Float,
    };
    Some(VertexInput {
        location: *location,
        kind,
        components,
    })
}

/// Locations written by the vertex entry point (`true`) or read by the
/// fragment entry point (`false`).
pub(crate) fn stage_locations(module: &Module, outputs: bool) -> Vec<u32> {
    let (stage, name) = if outputs {
        (naga::ShaderStage::Vertex, VERTEX_ENTRY)
    } else {
        (naga::ShaderStage::Fragment, FRAGMENT_ENTRY)
    };
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
    else {
        return Vec::new();
    };

    let slots: Vec<(Option<&Binding>, naga::Handle<Type>)> = if outputs {
        entry
            .function
            .result
            .iter()
            .map(|r| (r.binding.as_ref(), r.ty))
            .collect()
    } else {
        entry
            .function
            .arguments
            .iter()
            .map(|a| (a.binding.as_ref(), a.ty))
            .collect()
    };

    let mut locations = Vec::new();
    for (binding, ty) in slots {
        match (binding, &module.types[ty].inner) {
            (Some(Binding::Location { location, .. }), _) => locations.push(*location),
            (None, TypeInner::Struct { members, .. }) => {
                locations.extend(members.iter().filter_map(|m| match m.binding {
                    Some(Binding::Location { location, .. }) => Some(location),
                    _ => None,
                }));
            }
            _ => {}
        }
    }
    locations
}

// ── uniform block ─────────────────────────────────────────────────────────

/// Layout of one uniform element (a vector or a matrix).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ElementLayout {
    Vector { components: u8, int: bool },
    Matrix { columns: u8, rows: u8, column_stride: u32 },
}

/// One member of the uniform struct. Non-array members have `count == 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformField {
    pub name: String,
    pub offset: u32,
    pub element: ElementLayout,
    pub count: u32,
    pub stride: u32,
}

/// The program's single `var<uniform>` struct at `@group(0) @binding(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct UniformBlock {
    pub size: u32,
    pub fields: Vec<UniformField>,
}

impl UniformBlock {
    pub(crate) fn slot_of(&self, name: &str) -> Option<u32> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as u32)
    }

    /// Combines the blocks of both stages; members must agree on offsets.
    pub(crate) fn merge(mut self, other: UniformBlock) -> Result<Self, String> {
        for field in other.fields {
            match self.fields.iter().find(|f| f.name == field.name) {
                Some(existing) if *existing != field => {
                    return Err(format!(
                        "uniform member `{}` is laid out differently in the two stages",
                        field.name
                    ));
                }
                Some(_) => {}
                None => self.fields.push(field),
            }
        }
        self.size = self.size.max(other.size);
        Ok(self)
    }
}

pub(crate) fn uniform_block(
    module: &Module,
    stage: ShaderStage,
) -> Result<Option<UniformBlock>, ShaderCompileError> {
    let mut found = None;
    for (_, global) in module.global_variables.iter() {
        if global.space != AddressSpace::Uniform {
            continue;
        }
        let name = global.name.as_deref().unwrap_or("<unnamed>");
        match global.binding {
            Some(ref rb) if rb.group == 0 && rb.binding == 0 && found.is_none() => {}
            _ => {
                return Err(ShaderCompileError::new(
                    stage,
                    format!(
                        "uniform `{name}`: only one uniform struct at @group(0) @binding(0) is supported"
                    ),
                ));
            }
        }

        let TypeInner::Struct { ref members, span } = module.types[global.ty].inner else {
            return Err(ShaderCompileError::new(
                stage,
                format!("uniform `{name}` must be a struct"),
            ));
        };

        let fields = members
            .iter()
            .map(|m| uniform_field(module, m))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ShaderCompileError::new(stage, e))?;
        found = Some(UniformBlock { size: span, fields });
    }
    Ok(found)
}

fn uniform_field(module: &Module, member: &StructMember) -> Result<UniformField, String> {
    let name = member
        .name
        .clone()
        .ok_or_else(|| "unnamed uniform member".to_string())?;

    let inner = &module.types[member.ty].inner;
    let (element, count, stride) = match *inner {
        TypeInner::Array { base, size, stride } => {
            let ArraySize::Constant(len) = size else {
                return Err(format!("uniform array `{name}` must have a constant size"));
            };
            let element = element_layout(&module.types[base].inner)
                .ok_or_else(|| format!("unsupported element type for uniform `{name}`"))?;
            (element, len.get(), stride)
        }
        ref other => {
            let element = element_layout(other)
                .ok_or_else(|| format!("unsupported type for uniform `{name}`"))?;
            (element, 1, 0)
        }
    };

    Ok(UniformField {
        name,
        offset: member.offset,
        element,
        count,
        stride,
    })
}

fn element_layout(inner: &TypeInner) -> Option<ElementLayout> {
    match *inner {
        TypeInner::Scalar(scalar) => Some(ElementLayout::Vector {
            components: 1,
            int: scalar_is_int(scalar.kind)?,
        }),
        TypeInner::Vector { size, scalar } => Some(ElementLayout::Vector {
            components: size as u8,
            int: scalar_is_int(scalar.kind)?,
        }),
        TypeInner::Matrix { columns, rows, .. } => Some(ElementLayout::Matrix {
            columns: columns as u8,
            rows: rows as u8,
            column_stride: if rows as u8 == 2 { 8 } else { 16 },
        }),
        _ => None,
    }
}

fn scalar_is_int(kind: ScalarKind) -> Option<bool> {
    match kind {
        ScalarKind::Float => Some(false),
        ScalarKind::Sint | ScalarKind::Uint => Some(true),
        _ => None,
    }
}

// ── uniform upload ────────────────────────────────────────────────────────

/// Writes `data` into the member's bytes of `staging`.
///
/// Matrix data is `N x N` row-major blocks read the way an OpenGL-style
/// `uniformMatrix*fv` reads them: each run of `N` values fills one column,
/// unless `transpose` is set, in which case each run fills one row.
pub(crate) fn write_uniform(
    staging: &mut [u8],
    field: &UniformField,
    shape: ShapeTag,
    data: &[f32],
    transpose: bool,
) -> Result<(), DeviceError> {
    let per_element = shape.components();
    let mismatch = || {
        DeviceError::UniformMismatch(format!(
            "`{}` cannot take {shape:?} data",
            field.name
        ))
    };

    match (field.element, shape.matrix_dim()) {
        (ElementLayout::Matrix { columns, rows, .. }, Some(n))
            if columns as usize == n && rows as usize == n => {}
        (ElementLayout::Vector { components, int }, None)
            if components as usize == per_element && int == shape.is_int() => {}
        _ => return Err(mismatch()),
    }
    if shape.is_array() != (field.count > 1 || field.stride > 0) && shape.matrix_dim().is_none() {
        return Err(mismatch());
    }

    let elements = (data.len() / per_element).min(field.count as usize);
    for i in 0..elements {
        let base = field.offset as usize + i * field.stride as usize;
        let values = &data[i * per_element..(i + 1) * per_element];

        match field.element {
            ElementLayout::Vector { int, .. } => {
                for (c, &v) in values.iter().enumerate() {
                    let bytes = if int {
                        (v as i32).to_le_bytes()
                    } else {
                        v.to_le_bytes()
                    };
                    put(staging, base + c * 4, bytes)?;
                }
            }
            ElementLayout::Matrix {
                columns,
                rows,
                column_stride,
            } => {
                let n = rows as usize;
                for c in 0..columns as usize {
                    for r in 0..n {
                        let v = if transpose {
                            values[r * n + c]
                        } else {
                            values[c * n + r]
                        };
                        put(staging, base + c * column_stride as usize + r * 4, v.to_le_bytes())?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn put(staging: &mut [u8], at: usize, bytes: [u8; 4]) -> Result<(), DeviceError> {
    let end = at + 4;
    let size = staging.len();
    let dst = staging
        .get_mut(at..end)
        .ok_or(DeviceError::OutOfRange { offset: at, end, size })?;
    dst.copy_from_slice(&bytes);
    Ok(())
}

// ── vertex formats ────────────────────────────────────────────────────────

/// wgpu format for a buffer-fed attribute, plus the input kind it can feed.
pub(crate) fn vertex_format(
    layout: &VertexAttributeLayout,
) -> Result<(wgpu::VertexFormat, InputKind), DeviceError> {
    use wgpu::VertexFormat as F;

    let unsupported = || DeviceError::UnsupportedVertexFormat {
        count: layout.component_count,
        element_type: layout.element_type,
        normalized: layout.normalized,
    };

    let (norm, int) = (layout.normalized, layout.element_type);
    let format = match (int, norm, layout.component_count) {
        (ElementType::Float32, _, 1) => F::Float32,
        (ElementType::Float32, _, 2) => F::Float32x2,
        (ElementType::Float32, _, 3) => F::Float32x3,
        (ElementType::Float32, _, 4) => F::Float32x4,

        (ElementType::Uint8, true, 1) => F::Unorm8,
        (ElementType::Uint8, true, 2) => F::Unorm8x2,
        (ElementType::Uint8, true, 4) => F::Unorm8x4,
        (ElementType::Uint8, false, 1) => F::Uint8,
        (ElementType::Uint8, false, 2) => F::Uint8x2,
        (ElementType::Uint8, false, 4) => F::Uint8x4,

        (ElementType::Int8, true, 1) => F::Snorm8,
        (ElementType::Int8, true, 2) => F::Snorm8x2,
        (ElementType::Int8, true, 4) => F::Snorm8x4,
        (ElementType::Int8, false, 1) => F::Sint8,
        (ElementType::Int8, false, 2) => F::Sint8x2,
        (ElementType::Int8, false, 4) => F::Sint8x4,

        (ElementType::Uint16, true, 1) => F::Unorm16,
        (ElementType::Uint16, true, 2) => F::Unorm16x2,
        (ElementType::Uint16, true, 4) => F::Unorm16x4,
        (ElementType::Uint16, false, 1) => F::Uint16,
        (ElementType::Uint16, false, 2) => F::Uint16x2,
        (ElementType::Uint16, false, 4) => F::Uint16x4,

        (ElementType::Int16, true, 1) => F::Snorm16,
        (ElementType::Int16, true, 2) => F::Snorm16x2,
        (ElementType::Int16, true, 4) => F::Snorm16x4,
        (ElementType::Int16, false, 1) => F::Sint16,
        (ElementType::Int16, false, 2) => F::Sint16x2,
        (ElementType::Int16, false, 4) => F::Sint16x4,

        _ => return Err(unsupported()),
    };

    let kind = match (int, norm) {
        (ElementType::Float32, _) | (_, true) => InputKind::Float,
        (ElementType::Uint8 | ElementType::Uint16, false) => InputKind::Uint,
        (ElementType::Int8 | ElementType::Int16, false) => InputKind::Sint,
    };
    Ok((format, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct Uniforms {
    p_mat: mat3x3<f32>,
    m_mat: mat3x3<f32>,
    iResolution: vec2<f32>,
    iTime: f32,
    blendForce: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) vertex: vec2<f32>, @location(3) id: u32) -> VsOut {
    let p = u.p_mat * u.m_mat * vec3<f32>(vertex, 1.0);
    var out: VsOut;
    out.position = vec4<f32>(p.xy, 0.0, 1.0);
    out.uv = vertex * f32(id);
    return out;
}
"#;

    const FRAGMENT: &str = r#"
struct Uniforms {
    p_mat: mat3x3<f32>,
    m_mat: mat3x3<f32>,
    iResolution: vec2<f32>,
    iTime: f32,
    blendForce: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, sin(u.iTime), 1.0);
}
"#;

    fn block() -> UniformBlock {
        let module = parse(ShaderStage::Vertex, VERTEX).unwrap();
        uniform_block(&module, ShaderStage::Vertex).unwrap().unwrap()
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn syntax_errors_name_the_stage() {
        let err = parse(ShaderStage::Fragment, "fn fs_main( {").unwrap_err();
        assert_eq!(err.stage, ShaderStage::Fragment);
        assert!(!err.log.is_empty());

        let err = parse(ShaderStage::Vertex, "   ").unwrap_err();
        assert_eq!(err.stage, ShaderStage::Vertex);
    }

    #[test]
    fn entry_point_is_required() {
        let err = parse(ShaderStage::Vertex, FRAGMENT).unwrap_err();
        assert!(err.log.contains("vs_main"));
    }

    // ── reflection ────────────────────────────────────────────────────────

    #[test]
    fn reflects_vertex_inputs() {
        let module = parse(ShaderStage::Vertex, VERTEX).unwrap();
        let inputs = vertex_inputs(&module);

        assert_eq!(
            inputs.get("vertex"),
            Some(&VertexInput {
                location: 0,
                kind: InputKind::Float,
                components: 2
            })
        );
        assert_eq!(inputs.get("id").map(|i| (i.location, i.kind)), Some((3, InputKind::Uint)));
    }

    #[test]
    fn stage_interfaces_line_up() {
        let vs = parse(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = parse(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert_eq!(stage_locations(&vs, true), vec![0]);
        assert_eq!(stage_locations(&fs, false), vec![0]);
    }

    #[test]
    fn reflects_wgsl_uniform_layout() {
        let block = block();
        let offsets: Vec<(&str, u32)> = block
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![("p_mat", 0), ("m_mat", 48), ("iResolution", 96), ("iTime", 104), ("blendForce", 108)]
        );
        assert_eq!(block.size, 112);
        assert_eq!(block.slot_of("iTime"), Some(3));
        assert_eq!(
            block.fields[1].element,
            ElementLayout::Matrix {
                columns: 3,
                rows: 3,
                column_stride: 16
            }
        );
    }

    #[test]
    fn merge_rejects_conflicting_offsets() {
        let a = block();
        let mut b = block();
        b.fields[3].offset = 0;
        assert!(a.clone().merge(block()).is_ok());
        assert!(a.merge(b).is_err());
    }

    // ── uniform upload ────────────────────────────────────────────────────

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn matrix_runs_fill_columns() {
        let block = block();
        let mut staging = vec![0u8; block.size as usize];
        let rows = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

        write_uniform(&mut staging, &block.fields[0], ShapeTag::Mat3Array, &rows, false).unwrap();
        assert_eq!(floats(&staging[0..12]), vec![1.0, 2.0, 3.0]);
        assert_eq!(floats(&staging[32..44]), vec![7.0, 8.0, 9.0]);

        write_uniform(&mut staging, &block.fields[0], ShapeTag::Mat3Array, &rows, true).unwrap();
        assert_eq!(floats(&staging[0..12]), vec![1.0, 4.0, 7.0]);
    }

    #[test]
    fn scalars_and_vectors_land_at_their_offsets() {
        let block = block();
        let mut staging = vec![0u8; block.size as usize];

        write_uniform(&mut staging, &block.fields[2], ShapeTag::Float2, &[640.0, 480.0], false)
            .unwrap();
        write_uniform(&mut staging, &block.fields[3], ShapeTag::Float, &[1.5], false).unwrap();

        assert_eq!(floats(&staging[96..108]), vec![640.0, 480.0, 1.5]);
    }

    #[test]
    fn shape_must_match_member() {
        let block = block();
        let mut staging = vec![0u8; block.size as usize];
        let err = write_uniform(&mut staging, &block.fields[3], ShapeTag::Float3, &[0.0; 3], false)
            .unwrap_err();
        assert!(matches!(err, DeviceError::UniformMismatch(_)));
    }

    // ── vertex formats ────────────────────────────────────────────────────

    fn layout(count: u8, element_type: ElementType, normalized: bool) -> VertexAttributeLayout {
        VertexAttributeLayout {
            component_count: count,
            element_type,
            normalized,
            stride: 8,
            offset: 0,
        }
    }

    #[test]
    fn maps_vertex_formats() {
        assert_eq!(
            vertex_format(&layout(2, ElementType::Float32, false)).unwrap(),
            (wgpu::VertexFormat::Float32x2, InputKind::Float)
        );
        assert_eq!(
            vertex_format(&layout(4, ElementType::Uint8, true)).unwrap(),
            (wgpu::VertexFormat::Unorm8x4, InputKind::Float)
        );
        assert_eq!(
            vertex_format(&layout(2, ElementType::Int16, false)).unwrap(),
            (wgpu::VertexFormat::Sint16x2, InputKind::Sint)
        );
        assert!(matches!(
            vertex_format(&layout(3, ElementType::Uint16, false)),
            Err(DeviceError::UnsupportedVertexFormat { count: 3, .. })
        ));
    }

    #[test]
    fn constants_encode_in_input_kind() {
        let input = VertexInput {
            location: 1,
            kind: InputKind::Sint,
            components: 2,
        };
        assert_eq!(input.constant_format(), wgpu::VertexFormat::Sint32x2);
        assert_eq!(
            input.encode_constant([-1.0, 2.0, 0.0, 1.0]),
            [(-1i32).to_le_bytes(), 2i32.to_le_bytes()].concat()
        );
    }
}
