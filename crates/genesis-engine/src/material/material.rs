use indexmap::IndexMap;

use crate::device::{Device, ProgramHandle, ShaderCompiler, ShapeTag};
use crate::error::{Error, Result};
use crate::scene::{Component, GameObject, SceneCtx};

use super::{Attribute, Shader, Uniform};

/// A shader plus the named values pushed to it before every draw.
///
/// Setting a value only updates the mapping; the device sees it on the next
/// [`Material::push_to_device`] (run automatically in `on_before_render`).
#[derive(Debug, Clone)]
pub struct Material {
    shader: Shader,
    attributes: IndexMap<String, Attribute>,
    uniforms: IndexMap<String, Uniform>,
}

impl Material {
    pub fn new(shader: Shader) -> Self {
        Self {
            shader,
            attributes: IndexMap::new(),
            uniforms: IndexMap::new(),
        }
    }

    pub fn with_uniform(mut self, name: impl Into<String>, value: Uniform) -> Self {
        self.set_uniform(name, value);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Attribute) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Inserts or overwrites.
    pub fn set_uniform(&mut self, name: impl Into<String>, value: Uniform) {
        self.uniforms.insert(name.into(), value);
    }

    /// Inserts or overwrites.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Attribute) {
        self.attributes.insert(name.into(), value);
    }

    pub fn remove_uniform(&mut self, name: &str) -> bool {
        self.uniforms.shift_remove(name).is_some()
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        self.attributes.shift_remove(name).is_some()
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    #[inline]
    pub fn program(&self) -> Option<ProgramHandle> {
        self.shader.program()
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.shader.is_compiled()
    }

    pub fn compile<C>(&mut self, compiler: &mut C) -> Result<ProgramHandle>
    where
        C: ShaderCompiler + ?Sized,
    {
        self.shader.compile(compiler)
    }

    /// Activates the program and pushes every attribute, then every uniform.
    ///
    /// Names the program does not consume are skipped.
    pub fn push_to_device(&self, device: &mut dyn Device) -> Result<()> {
        let program = self.program().ok_or(Error::UncompiledMaterial)?;
        device.use_program(program)?;

        for (name, attribute) in &self.attributes {
            let shape = attribute.shape().tag();
            check_len(name, shape, attribute.data())?;

            let Some(slot) = device.attribute_location(program, name) else {
                log::debug!("attribute `{name}` is not consumed by {program:?}");
                continue;
            };
            device.set_vertex_attrib_value(slot, shape, attribute.data())?;
        }

        for (name, uniform) in &self.uniforms {
            check_len(name, uniform.shape(), uniform.data())?;

            let Some(slot) = device.uniform_location(program, name) else {
                log::debug!("uniform `{name}` is not declared by {program:?}");
                continue;
            };
            device.set_uniform(slot, uniform.shape(), uniform.data(), uniform.transpose())?;
        }

        Ok(())
    }
}

fn check_len(name: &str, shape: ShapeTag, data: &[f32]) -> Result<()> {
    let expected = shape.required_len();
    if data.len() < expected {
        return Err(Error::InsufficientComponents {
            name: name.to_string(),
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

impl Component for Material {
    fn on_init(&mut self, ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
        self.compile(ctx.device())?;
        Ok(())
    }

    fn on_before_render(&mut self, ctx: &mut SceneCtx, _object: &mut GameObject) -> Result<()> {
        self.push_to_device(ctx.device())
    }
}
