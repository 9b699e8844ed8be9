use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use wgpu::util::DeviceExt;

use crate::device::{
    BufferHandle, BufferTarget, BufferUsage, Device, DeviceError, ElementType, PrimitiveKind,
    ProgramHandle, ShaderCompileError, ShaderCompiler, ShaderStage, ShapeTag, Slot,
    VertexAttributeLayout,
};
use crate::math::Color;

use super::reflect::{self, UniformBlock, VertexInput};
use super::{Gpu, GpuFrame, SurfaceErrorAction};

/// Value a shader input reads while no buffer feeds it.
const DEFAULT_CONSTANT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// [`Device`] on top of wgpu.
///
/// Emulates the bind-then-operate contract: buffer contents live in a CPU
/// shadow copy that is flushed to the GPU before the draws that read it,
/// uniforms are staged per program and uploaded with each draw, and vertex
/// attribute pointers are global state resolved into a pipeline per draw.
///
/// A frame starts with the first clear or draw and ends at `present`. Each
/// clear and each draw is its own render pass.
pub struct WgpuDevice {
    gpu: Gpu,
    next_handle: u32,

    buffers: HashMap<BufferHandle, GpuBuffer>,
    bound_vertex: Option<BufferHandle>,
    bound_element: Option<BufferHandle>,

    programs: HashMap<ProgramHandle, Program>,
    current_program: Option<ProgramHandle>,

    pointers: HashMap<Slot, (BufferHandle, VertexAttributeLayout)>,
    enabled: HashSet<Slot>,
    constants: HashMap<Slot, [f32; 4]>,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    frame: Option<GpuFrame>,
    frame_skipped: bool,
    used_this_frame: HashSet<BufferHandle>,
    viewport: (u32, u32),
}

#[derive(Default)]
struct GpuBuffer {
    shadow: Vec<u8>,
    usage: BufferUsage,
    gpu: Option<wgpu::Buffer>,
    dirty: bool,
}

struct Program {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    inputs: IndexMap<String, VertexInput>,
    uniforms: Option<UniformBlock>,
    staging: Vec<u8>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VertexBufferKey {
    stride: u64,
    step_mode: wgpu::VertexStepMode,
    attributes: Vec<(wgpu::VertexFormat, u64, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramHandle,
    buffers: Vec<VertexBufferKey>,
    topology: wgpu::PrimitiveTopology,
    strip_index_format: Option<wgpu::IndexFormat>,
    format: wgpu::TextureFormat,
}

impl WgpuDevice {
    pub fn new(gpu: Gpu) -> Self {
        let viewport = gpu.size();
        Self {
            gpu,
            next_handle: 0,
            buffers: HashMap::new(),
            bound_vertex: None,
            bound_element: None,
            programs: HashMap::new(),
            current_program: None,
            pointers: HashMap::new(),
            enabled: HashSet::new(),
            constants: HashMap::new(),
            pipelines: HashMap::new(),
            frame: None,
            frame_skipped: false,
            used_this_frame: HashSet::new(),
            viewport,
        }
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn next_raw(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn bound(&self, target: BufferTarget) -> Result<BufferHandle, DeviceError> {
        match target {
            BufferTarget::VertexArray => self.bound_vertex,
            BufferTarget::ElementArray => self.bound_element,
        }
        .ok_or(DeviceError::NothingBound(target))
    }

    fn bound_buffer(&mut self, target: BufferTarget) -> Result<&mut GpuBuffer, DeviceError> {
        let handle = self.bound(target)?;
        self.buffers
            .get_mut(&handle)
            .ok_or(DeviceError::UnknownBuffer(handle))
    }

    fn current_program_mut(&mut self) -> Result<&mut Program, DeviceError> {
        let handle = self.current_program.ok_or(DeviceError::NoActiveProgram)?;
        self.programs
            .get_mut(&handle)
            .ok_or(DeviceError::UnknownProgram(handle))
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Acquires the swapchain texture on first use within a frame.
    ///
    /// Returns `false` when this frame cannot be drawn (minimised window or a
    /// recoverable surface error); the remaining calls of the frame no-op.
    fn ensure_frame(&mut self) -> Result<bool, DeviceError> {
        if self.frame.is_some() {
            return Ok(true);
        }
        if self.frame_skipped || !self.gpu.is_drawable() {
            return Ok(false);
        }

        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                Ok(true)
            }
            Err(err) => {
                let message = err.to_string();
                match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(DeviceError::Surface(message)),
                    action => {
                        log::debug!("dropping frame ({action:?}): {message}");
                        self.frame_skipped = true;
                        Ok(false)
                    }
                }
            }
        }
    }

    /// Uploads the shadow copy of `handle` if it changed.
    ///
    /// A buffer already read by this frame's recorded passes forces those
    /// passes to be submitted first, so they keep seeing the old contents.
    fn flush_buffer(&mut self, handle: BufferHandle) -> Result<wgpu::Buffer, DeviceError> {
        let needs_split = {
            let buffer = self
                .buffers
                .get(&handle)
                .ok_or(DeviceError::UnknownBuffer(handle))?;
            buffer.dirty && self.used_this_frame.contains(&handle)
        };
        if needs_split {
            if let Some(frame) = self.frame.as_mut() {
                self.gpu.flush(frame);
            }
            self.used_this_frame.clear();
        }

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        let buffer = self
            .buffers
            .get_mut(&handle)
            .ok_or(DeviceError::UnknownBuffer(handle))?;

        let padded = (buffer.shadow.len().max(4) as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let recreate = buffer.gpu.as_ref().is_none_or(|b| b.size() < padded);
        if recreate {
            buffer.gpu = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(match buffer.usage {
                    BufferUsage::Static => "genesis static buffer",
                    BufferUsage::Dynamic => "genesis dynamic buffer",
                }),
                size: padded,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            buffer.dirty = true;
        }

        let Some(gpu_buffer) = buffer.gpu.clone() else {
            return Err(DeviceError::UnknownBuffer(handle));
        };
        if buffer.dirty {
            let mut bytes = buffer.shadow.clone();
            bytes.resize(padded as usize, 0);
            queue.write_buffer(&gpu_buffer, 0, &bytes);
            buffer.dirty = false;
        }

        self.used_this_frame.insert(handle);
        Ok(gpu_buffer)
    }

    fn begin_pass<'e>(
        encoder: &'e mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        load: wgpu::LoadOp<wgpu::Color>,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("genesis pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    // ── draw preparation ──────────────────────────────────────────────────

    /// Resolves every shader input to a vertex buffer: attribute pointers for
    /// enabled slots, one-vertex instance buffers for the rest.
    fn vertex_buffers(
        &mut self,
        program: ProgramHandle,
    ) -> Result<(Vec<VertexBufferKey>, Vec<wgpu::Buffer>), DeviceError> {
        let inputs: Vec<VertexInput> = self
            .programs
            .get(&program)
            .ok_or(DeviceError::UnknownProgram(program))?
            .inputs
            .values()
            .copied()
            .collect();

        let mut fed: IndexMap<(BufferHandle, u64), Vec<(wgpu::VertexFormat, u64, u32)>> =
            IndexMap::new();
        let mut constants = Vec::new();

        for input in inputs {
            let pointer = self
                .enabled
                .contains(&input.location)
                .then(|| self.pointers.get(&input.location))
                .flatten();

            match pointer {
                Some(&(handle, layout)) => {
                    let (format, kind) = reflect::vertex_format(&layout)?;
                    if kind != input.kind {
                        return Err(DeviceError::UnsupportedLayout(format!(
                            "slot {} is fed {format:?} but the shader reads {:?}",
                            input.location, input.kind
                        )));
                    }
                    fed.entry((handle, layout.stride as u64))
                        .or_default()
                        .push((format, layout.offset as u64, input.location));
                }
                None => {
                    let value = self
                        .constants
                        .get(&input.location)
                        .copied()
                        .unwrap_or(DEFAULT_CONSTANT);
                    constants.push((input, value));
                }
            }
        }

        let mut keys = Vec::new();
        let mut buffers = Vec::new();

        for ((handle, stride), attributes) in fed {
            buffers.push(self.flush_buffer(handle)?);
            keys.push(VertexBufferKey {
                stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            });
        }

        for (input, value) in constants {
            let bytes = input.encode_constant(value);
            buffers.push(
                self.gpu
                    .device()
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("genesis constant attribute"),
                        contents: &bytes,
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
            );
            keys.push(VertexBufferKey {
                stride: bytes.len() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: vec![(input.constant_format(), 0, input.location)],
            });
        }

        Ok((keys, buffers))
    }

    fn pipeline(&mut self, key: PipelineKey) -> Result<wgpu::RenderPipeline, DeviceError> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline.clone());
        }

        let program = self
            .programs
            .get(&key.program)
            .ok_or(DeviceError::UnknownProgram(key.program))?;

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = key
            .buffers
            .iter()
            .map(|b| {
                b.attributes
                    .iter()
                    .map(|&(format, offset, shader_location)| wgpu::VertexAttribute {
                        format,
                        offset,
                        shader_location,
                    })
                    .collect()
            })
            .collect();
        let layouts: Vec<wgpu::VertexBufferLayout<'_>> = key
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: b.step_mode,
                attributes: attrs,
            })
            .collect();

        let pipeline = self
            .gpu
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("genesis pipeline"),
                layout: Some(&program.pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(reflect::VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &layouts,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(reflect::FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: key.format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: key.topology,
                    strip_index_format: key.strip_index_format,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("created pipeline for {:?}", key.program);
        self.pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Fresh uniform buffer + bind group holding the program's staged values.
    fn uniform_bind_group(&self, program: ProgramHandle) -> Option<wgpu::BindGroup> {
        let program = self.programs.get(&program)?;
        let layout = program.bind_group_layout.as_ref()?;

        let device = self.gpu.device();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("genesis uniforms"),
            contents: &program.staging,
            usage: wgpu::BufferUsages::UNIFORM,
        });
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("genesis uniform bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        }))
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn topology(primitive: PrimitiveKind) -> (wgpu::PrimitiveTopology, Option<wgpu::IndexFormat>) {
    use wgpu::PrimitiveTopology as T;
    match primitive {
        PrimitiveKind::Points => (T::PointList, None),
        PrimitiveKind::Lines => (T::LineList, None),
        PrimitiveKind::LineStrip => (T::LineStrip, Some(wgpu::IndexFormat::Uint16)),
        PrimitiveKind::Triangles => (T::TriangleList, None),
        PrimitiveKind::TriangleStrip => (T::TriangleStrip, Some(wgpu::IndexFormat::Uint16)),
    }
}

// ── Device impl ───────────────────────────────────────────────────────────

impl ShaderCompiler for WgpuDevice {
    fn compile(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle, ShaderCompileError> {
        let vs = reflect::parse(ShaderStage::Vertex, vertex_source)?;
        let fs = reflect::parse(ShaderStage::Fragment, fragment_source)?;

        let outputs = reflect::stage_locations(&vs, true);
        if let Some(missing) = reflect::stage_locations(&fs, false)
            .into_iter()
            .find(|l| !outputs.contains(l))
        {
            return Err(ShaderCompileError::new(
                ShaderStage::Fragment,
                format!("input @location({missing}) is not written by `vs_main`"),
            ));
        }

        let uniforms = match (
            reflect::uniform_block(&vs, ShaderStage::Vertex)?,
            reflect::uniform_block(&fs, ShaderStage::Fragment)?,
        ) {
            (Some(a), Some(b)) => Some(
                a.merge(b)
                    .map_err(|log| ShaderCompileError::new(ShaderStage::Fragment, log))?,
            ),
            (a, b) => a.or(b),
        };

        let device = self.gpu.device();
        let module = |label, source: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_owned())),
            })
        };
        let vertex = module("genesis vertex shader", vertex_source);
        let fragment = module("genesis fragment shader", fragment_source);

        let bind_group_layout = uniforms.as_ref().map(|_| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("genesis uniform bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        });
        let group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("genesis pipeline layout"),
            bind_group_layouts: &group_layouts,
            immediate_size: 0,
        });

        let staging_len = uniforms
            .as_ref()
            .map_or(0, |u| (u.size as usize).next_multiple_of(16));
        let inputs = reflect::vertex_inputs(&vs);

        let handle = ProgramHandle::from_raw(self.next_raw());
        log::debug!(
            "compiled {handle:?}: {} inputs, {} uniforms",
            inputs.len(),
            uniforms.as_ref().map_or(0, |u| u.fields.len())
        );
        self.programs.insert(
            handle,
            Program {
                vertex,
                fragment,
                inputs,
                uniforms,
                staging: vec![0; staging_len],
                bind_group_layout,
                pipeline_layout,
            },
        );
        Ok(handle)
    }
}

impl Device for WgpuDevice {
    fn create_buffer(&mut self) -> Result<BufferHandle, DeviceError> {
        let handle = BufferHandle::from_raw(self.next_raw());
        self.buffers.insert(handle, GpuBuffer::default());
        Ok(handle)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        // Dropped rather than destroyed: passes recorded this frame may still read it.
        self.buffers.remove(&handle);
        if self.bound_vertex == Some(handle) {
            self.bound_vertex = None;
        }
        if self.bound_element == Some(handle) {
            self.bound_element = None;
        }
        self.pointers.retain(|_, (h, _)| *h != handle);
        self.used_this_frame.remove(&handle);
    }

    fn bind_buffer(
        &mut self,
        handle: BufferHandle,
        target: BufferTarget,
    ) -> Result<(), DeviceError> {
        if !self.buffers.contains_key(&handle) {
            return Err(DeviceError::UnknownBuffer(handle));
        }
        match target {
            BufferTarget::VertexArray => self.bound_vertex = Some(handle),
            BufferTarget::ElementArray => self.bound_element = Some(handle),
        }
        Ok(())
    }

    fn allocate(
        &mut self,
        target: BufferTarget,
        size_bytes: usize,
        usage: BufferUsage,
    ) -> Result<(), DeviceError> {
        let buffer = self.bound_buffer(target)?;
        buffer.shadow = vec![0; size_bytes];
        buffer.usage = usage;
        buffer.dirty = true;
        Ok(())
    }

    fn upload_sub_range(
        &mut self,
        target: BufferTarget,
        offset_bytes: usize,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        let buffer = self.bound_buffer(target)?;
        let end = offset_bytes + bytes.len();
        let size = buffer.shadow.len();
        let dst = buffer
            .shadow
            .get_mut(offset_bytes..end)
            .ok_or(DeviceError::OutOfRange {
                offset: offset_bytes,
                end,
                size,
            })?;
        dst.copy_from_slice(bytes);
        buffer.dirty = true;
        Ok(())
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<Slot> {
        self.programs.get(&program)?.inputs.get(name).map(|i| i.location)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<Slot> {
        self.programs.get(&program)?.uniforms.as_ref()?.slot_of(name)
    }

    fn bind_vertex_attribute(
        &mut self,
        slot: Slot,
        layout: VertexAttributeLayout,
    ) -> Result<(), DeviceError> {
        let handle = self.bound(BufferTarget::VertexArray)?;
        reflect::vertex_format(&layout)?;
        if layout.stride % 4 != 0 || layout.offset % 4 != 0 {
            return Err(DeviceError::UnsupportedLayout(format!(
                "stride {} and offset {} must be multiples of 4",
                layout.stride, layout.offset
            )));
        }
        self.pointers.insert(slot, (handle, layout));
        Ok(())
    }

    fn enable_vertex_attribute(&mut self, slot: Slot) -> Result<(), DeviceError> {
        self.enabled.insert(slot);
        Ok(())
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<(), DeviceError> {
        if !self.programs.contains_key(&program) {
            return Err(DeviceError::UnknownProgram(program));
        }
        self.current_program = Some(program);
        Ok(())
    }

    fn set_uniform(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
        transpose: bool,
    ) -> Result<(), DeviceError> {
        let program = self.current_program_mut()?;
        let field = program
            .uniforms
            .as_ref()
            .and_then(|u| u.fields.get(slot as usize))
            .ok_or_else(|| DeviceError::UniformMismatch(format!("no uniform at slot {slot}")))?;
        reflect::write_uniform(&mut program.staging, field, shape, data, transpose)
    }

    fn set_vertex_attrib_value(
        &mut self,
        slot: Slot,
        shape: ShapeTag,
        data: &[f32],
    ) -> Result<(), DeviceError> {
        if shape.matrix_dim().is_some() || shape.is_int() {
            return Err(DeviceError::UniformMismatch(format!(
                "constant attribute at slot {slot} cannot be {shape:?}"
            )));
        }
        let mut value = DEFAULT_CONSTANT;
        for (dst, src) in value.iter_mut().zip(data.iter().take(shape.components())) {
            *dst = *src;
        }
        self.constants.insert(slot, value);
        Ok(())
    }

    fn draw(
        &mut self,
        primitive: PrimitiveKind,
        index_count: usize,
        index_type: ElementType,
        index_offset: usize,
    ) -> Result<(), DeviceError> {
        let program = self.current_program.ok_or(DeviceError::NoActiveProgram)?;
        let index_handle = self.bound(BufferTarget::ElementArray)?;
        if index_type != ElementType::Uint16 {
            return Err(DeviceError::UnsupportedIndexType(index_type));
        }

        let index_len = self
            .buffers
            .get(&index_handle)
            .ok_or(DeviceError::UnknownBuffer(index_handle))?
            .shadow
            .len();
        let end = index_offset + index_count * 2;
        if index_offset % 2 != 0 || end > index_len {
            return Err(DeviceError::OutOfRange {
                offset: index_offset,
                end,
                size: index_len,
            });
        }
        if index_count == 0 || !self.ensure_frame()? {
            return Ok(());
        }

        let (keys, vertex_buffers) = self.vertex_buffers(program)?;
        let index_buffer = self.flush_buffer(index_handle)?;
        let (topology, strip_index_format) = topology(primitive);
        let pipeline = self.pipeline(PipelineKey {
            program,
            buffers: keys,
            topology,
            strip_index_format,
            format: self.gpu.surface_format(),
        })?;
        let bind_group = self.uniform_bind_group(program);

        let (width, height) = self.gpu.size();
        let (vw, vh) = (self.viewport.0.min(width), self.viewport.1.min(height));
        if vw == 0 || vh == 0 {
            return Ok(());
        }
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        let mut pass = Self::begin_pass(&mut frame.encoder, &frame.view, wgpu::LoadOp::Load);
        pass.set_viewport(0.0, 0.0, vw as f32, vh as f32, 0.0, 1.0);
        pass.set_pipeline(&pipeline);
        if let Some(bind_group) = bind_group.as_ref() {
            pass.set_bind_group(0, bind_group, &[]);
        }
        for (slot, buffer) in vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        let first = (index_offset / 2) as u32;
        pass.draw_indexed(first..first + index_count as u32, 0, 0..1);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<(), DeviceError> {
        if !self.ensure_frame()? {
            return Ok(());
        }
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        let load = wgpu::LoadOp::Clear(wgpu::Color {
            r: color.r as f64,
            g: color.g as f64,
            b: color.b as f64,
            a: color.a as f64,
        });
        drop(Self::begin_pass(&mut frame.encoder, &frame.view, load));
        Ok(())
    }

    fn viewport(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        self.viewport = (width, height);
        Ok(())
    }

    fn surface_size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        // An unpresented frame would pin the old swapchain texture.
        if self.frame.take().is_some() {
            self.used_this_frame.clear();
        }
        self.gpu.resize(width, height);
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.frame_skipped = false;
        self.used_this_frame.clear();
        if let Some(frame) = self.frame.take() {
            self.gpu.submit(frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_use_restart_index_format() {
        for kind in [PrimitiveKind::LineStrip, PrimitiveKind::TriangleStrip] {
            assert_eq!(topology(kind).1, Some(wgpu::IndexFormat::Uint16));
        }
        for kind in [PrimitiveKind::Points, PrimitiveKind::Lines, PrimitiveKind::Triangles] {
            assert_eq!(topology(kind).1, None);
        }
        assert_eq!(
            topology(PrimitiveKind::Triangles).0,
            wgpu::PrimitiveTopology::TriangleList
        );
    }

    #[test]
    fn blend_is_premultiplied_over() {
        let blend = premul_alpha_blend();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.color, blend.alpha);
    }
}
