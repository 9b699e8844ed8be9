use indexmap::IndexMap;

use crate::buffer::{BufferAttribute, TypedBuffer};
use crate::device::{BufferTarget, BufferUsage, PrimitiveKind};
use crate::error::Result;
use crate::material::Material;
use crate::math::Vec2;
use crate::scene::{Component, GameObject, SceneCtx};

pub const VERTEX_BUFFER: &str = "vertex_buffer";
pub const INDEX_BUFFER: &str = "index_buffer";
pub const VERTEX_ATTRIBUTE: &str = "vertex";
pub const INDEX_ATTRIBUTE: &str = "indices";

/// Named geometry buffers drawn with the owner's [`Material`].
///
/// Each render syncs every buffer, rebinds its layout and issues one indexed
/// draw from the first element-array buffer.
#[derive(Debug)]
pub struct Mesh {
    buffers: IndexMap<String, TypedBuffer>,
    primitive: PrimitiveKind,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(PrimitiveKind::Triangles)
    }
}

impl Mesh {
    pub fn new(primitive: PrimitiveKind) -> Self {
        Self {
            buffers: IndexMap::new(),
            primitive,
        }
    }

    /// Triangle mesh with 2D `vertices` and one index triple per triangle.
    ///
    /// `dynamic` picks the usage hint for both buffers.
    pub fn from_2d(vertices: &[Vec2], triangles: &[[u16; 3]], dynamic: bool) -> Result<Self> {
        let usage = if dynamic {
            BufferUsage::Dynamic
        } else {
            BufferUsage::Static
        };

        let vertex = TypedBuffer::new(
            [(
                VERTEX_ATTRIBUTE,
                BufferAttribute::float32(TypedBuffer::flatten(vertices), 2)?,
            )],
            BufferTarget::VertexArray,
            usage,
        );
        let index = TypedBuffer::new(
            [(INDEX_ATTRIBUTE, BufferAttribute::uint16(flatten_indices(triangles), 3)?)],
            BufferTarget::ElementArray,
            usage,
        );

        let mut mesh = Self::default();
        mesh.add_buffer(VERTEX_BUFFER, vertex);
        mesh.add_buffer(INDEX_BUFFER, index);
        Ok(mesh)
    }

    #[inline]
    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    pub fn set_primitive(&mut self, primitive: PrimitiveKind) {
        self.primitive = primitive;
    }

    /// Returns `false` if `name` is taken.
    pub fn add_buffer(&mut self, name: impl Into<String>, buffer: TypedBuffer) -> bool {
        let name = name.into();
        if self.buffers.contains_key(&name) {
            log::warn!("mesh already has a buffer named `{name}`");
            return false;
        }
        self.buffers.insert(name, buffer);
        true
    }

    /// Inserts or replaces; returns the replaced buffer.
    ///
    /// The replaced buffer still owns its device handle; release it or it
    /// leaks until the device goes away.
    pub fn replace_buffer(
        &mut self,
        name: impl Into<String>,
        buffer: TypedBuffer,
    ) -> Option<TypedBuffer> {
        self.buffers.insert(name.into(), buffer)
    }

    pub fn remove_buffer(&mut self, name: &str) -> Option<TypedBuffer> {
        let removed = self.buffers.shift_remove(name);
        if removed.is_none() {
            log::warn!("cannot remove buffer `{name}`: not present");
        }
        removed
    }

    pub fn get_buffer(&self, name: &str) -> Option<&TypedBuffer> {
        let found = self.buffers.get(name);
        if found.is_none() {
            log::warn!("mesh has no buffer named `{name}`");
        }
        found
    }

    pub fn get_buffer_mut(&mut self, name: &str) -> Option<&mut TypedBuffer> {
        let found = self.buffers.get_mut(name);
        if found.is_none() {
            log::warn!("mesh has no buffer named `{name}`");
        }
        found
    }

    pub fn buffers(&self) -> impl Iterator<Item = (&str, &TypedBuffer)> {
        self.buffers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replaces one attribute's data in one buffer and marks it dirty.
    ///
    /// Returns `Ok(false)` when the buffer or attribute does not exist.
    pub fn update_buffer_attribute_data(
        &mut self,
        buffer: &str,
        attribute: &str,
        data: Vec<f32>,
    ) -> Result<bool> {
        match self.get_buffer_mut(buffer) {
            Some(buffer) => buffer.set_attribute_data(attribute, data),
            None => Ok(false),
        }
    }

    pub fn set_vertices(&mut self, vertices: &[Vec2]) -> Result<bool> {
        self.update_buffer_attribute_data(
            VERTEX_BUFFER,
            VERTEX_ATTRIBUTE,
            TypedBuffer::flatten(vertices),
        )
    }

    pub fn set_indices(&mut self, triangles: &[[u16; 3]]) -> Result<bool> {
        self.update_buffer_attribute_data(INDEX_BUFFER, INDEX_ATTRIBUTE, flatten_indices(triangles))
    }

    /// Syncs and binds every buffer, then draws.
    pub fn draw(&mut self, ctx: &mut SceneCtx, material: &Material) -> Result<()> {
        let program = material.program();
        let device = ctx.device();

        for buffer in self.buffers.values_mut() {
            buffer.sync_to_device(device, program)?;
        }

        let Some(program) = program else {
            return Ok(());
        };
        for buffer in self.buffers.values() {
            buffer.bind(device, program)?;
        }

        // Rebinding the index buffer last leaves it current for the draw.
        let Some(indices) = self
            .buffers
            .values()
            .find(|b| b.target() == BufferTarget::ElementArray)
        else {
            log::warn!("mesh has no element-array buffer; nothing to draw");
            return Ok(());
        };
        indices.bind(device, program)?;

        let Some((_, attribute)) = indices.attributes().next() else {
            return Ok(());
        };
        let count = indices.attributes().map(|(_, a)| a.data().len()).sum();
        device.draw(self.primitive, count, attribute.element_type(), 0)?;
        Ok(())
    }

    pub fn release(&mut self, ctx: &mut SceneCtx) {
        for buffer in self.buffers.values_mut() {
            buffer.release(ctx.device());
        }
    }
}

fn flatten_indices(triangles: &[[u16; 3]]) -> Vec<f32> {
    triangles
        .iter()
        .flat_map(|t| t.map(f32::from))
        .collect()
}

impl Component for Mesh {
    fn on_render(&mut self, ctx: &mut SceneCtx, object: &mut GameObject) -> Result<()> {
        if !object.has_component::<Material>() {
            log::warn!("mesh has no sibling material; skipping draw");
            return Ok(());
        }
        let Some(material) = object.get_component::<Material>() else {
            return Ok(());
        };
        self.draw(ctx, material)
    }

    fn on_destroy(&mut self, ctx: &mut SceneCtx, _object: &mut GameObject) {
        self.release(ctx);
    }
}
