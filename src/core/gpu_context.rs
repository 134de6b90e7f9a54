use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use wgpu::{
    Adapter, BindGroup, BindGroupLayout, Buffer, Device, DeviceDescriptor, Features, Instance,
    Limits, Queue, RenderPipeline, Sampler, Surface, SurfaceConfiguration, SurfaceTexture,
    Texture, TextureFormat, TextureView,
};
use winit::window::Window;

use super::context::{
    OffscreenTarget, Primitive, ProgramId, RenderContext, RenderState, TargetId, TextureId,
    VertexArrayId,
};
use super::error::{Error, Result, ShaderStage};
use super::program::{
    ProgramDescriptor, ProgramInterface, UniformBlock, UniformValue, FRAGMENT_ENTRY,
    VERTEX_ENTRY,
};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
pub const OFFSCREEN_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

const UNIFORM_SIZE: u64 = std::mem::size_of::<UniformBlock>() as u64;

/// Which kind of color attachment a pipeline writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TargetKind {
    Surface,
    Offscreen,
}

struct GpuProgram {
    label: String,
    interface: ProgramInterface,
    layout: BindGroupLayout,
    pipelines: HashMap<(Primitive, TargetKind), RenderPipeline>,
    uniforms: UniformBlock,
    textures: Vec<(String, TextureId)>,
}

#[derive(Default)]
struct GpuVertexArray {
    buffers: Vec<(String, Buffer)>,
}

struct GpuTarget {
    _color: Texture,
    color_view: TextureView,
    _depth: Texture,
    depth_view: TextureView,
}

/// Draw recorded while a target is bound, replayed when it is unbound
struct PendingDraw {
    program: ProgramId,
    vertex_array: VertexArrayId,
    primitive: Primitive,
    vertex_count: u32,
    uniforms: UniformBlock,
    textures: Vec<(String, TextureId)>,
}

struct BoundTarget {
    target: Option<TargetId>,
    clear: Option<[f64; 4]>,
    draws: Vec<PendingDraw>,
}

/// `RenderContext` backed by a wgpu device and a window surface.
///
/// Program state (uniform values, texture bindings) lives on the CPU and is
/// snapshotted per draw. Draws issued between `bind_target` and
/// `unbind_target` become one render pass. The surface frame is acquired by
/// the first pass that targets it and stays open until [`GpuContext::present`]
/// so an overlay can be drawn on top.
pub struct GpuContext {
    device: Device,
    queue: Queue,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    surface_depth: TextureView,
    frame: Option<SurfaceTexture>,
    frame_view: Option<TextureView>,
    uniform_stride: u64,
    placeholder: TextureView,
    sampler: Sampler,
    render_state: RenderState,
    programs: Vec<GpuProgram>,
    vertex_arrays: Vec<GpuVertexArray>,
    targets: Vec<Option<GpuTarget>>,
    bound: Option<BoundTarget>,
    current_program: Option<ProgramId>,
    current_vertex_array: Option<VertexArrayId>,
}

impl GpuContext {
    /// Create a context rendering into `window`
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| Error::ContextCreation(format!("failed to create surface: {e}")))?;

        let adapter = Self::request_adapter(&instance, &surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;
        info!("Using adapter {:?}", adapter.get_info().name);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats)
            .ok_or_else(|| Error::ContextCreation("surface reports no formats".to_string()))?;

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (_, surface_depth) = create_depth_texture(&device, width, height, "Surface Depth");
        let placeholder = create_placeholder_texture(&device, &queue);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Texture Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let align = u64::from(device.limits().min_uniform_buffer_offset_alignment).max(1);
        let uniform_stride = UNIFORM_SIZE.div_ceil(align) * align;

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            surface_depth,
            frame: None,
            frame_view: None,
            uniform_stride,
            placeholder,
            sampler,
            render_state: RenderState::default(),
            programs: Vec::new(),
            vertex_arrays: Vec::new(),
            targets: Vec::new(),
            bound: None,
            current_program: None,
            current_vertex_array: None,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_config.format
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// View of the frame acquired by the last surface pass, if any
    pub fn frame_view(&self) -> Option<&TextureView> {
        self.frame_view.as_ref()
    }

    /// Present the acquired frame. No-op when nothing was drawn to the surface.
    pub fn present(&mut self) {
        self.frame_view = None;
        if let Some(frame) = self.frame.take() {
            frame.present();
        }
    }

    /// Reconfigure the surface and its depth buffer
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.frame_view = None;
        self.frame = None;
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);

        let (_, depth_view) = create_depth_texture(&self.device, width, height, "Surface Depth");
        self.surface_depth = depth_view;
        debug!("Surface resized to {}x{}", width, height);
    }

    async fn request_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::ContextCreation(format!("no suitable adapter: {e:?}")))
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        adapter
            .request_device(&DeviceDescriptor {
                label: Some("Shadow Scene Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| Error::ContextCreation(format!("failed to create device: {e:?}")))
    }

    /// Run `build` inside a validation error scope, mapping a failure to `stage`
    fn scoped<T>(
        &self,
        descriptor: &ProgramDescriptor,
        stage: ShaderStage,
        build: impl FnOnce(&Device) -> T,
    ) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let built = build(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(descriptor.compile_error(stage, err.to_string())),
            None => Ok(built),
        }
    }

    fn create_layout(&self, label: &str, interface: &ProgramInterface) -> BindGroupLayout {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(UNIFORM_SIZE),
            },
            count: None,
        }];

        for index in 0..interface.textures.len() as u32 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + index * 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + index * 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            });
        }

        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} Bind Group Layout")),
                entries: &entries,
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_pipeline(
        device: &Device,
        label: &str,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        attribute_count: usize,
        primitive: Primitive,
        format: TextureFormat,
        state: RenderState,
    ) -> RenderPipeline {
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = (0..attribute_count as u32)
            .map(|location| {
                [wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .map(|attribute| wgpu::VertexBufferLayout {
                array_stride: (3 * std::mem::size_of::<f32>()) as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let topology = match primitive {
            Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Primitive::Points => wgpu::PrimitiveTopology::PointList,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: state.cull_back_faces.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: state.depth_test,
                depth_compare: if state.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn program(&self, program: ProgramId) -> Result<&GpuProgram> {
        self.programs
            .get(program.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "program",
                id: program.0,
            })
    }

    fn bound_program(&mut self) -> Result<&mut GpuProgram> {
        let id = self.current_program.ok_or(Error::NoProgramBound)?;
        self.programs
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "program",
                id: id.0,
            })
    }

    fn live_target(&self, target: TargetId) -> Result<&GpuTarget> {
        self.targets
            .get(target.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownHandle {
                kind: "target",
                id: target.0,
            })
    }

    fn acquire_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Ok(());
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };

        self.frame_view = Some(
            frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        self.frame = Some(frame);
        Ok(())
    }

    /// Replay the draws recorded for `bound` as a single render pass
    fn flush(&mut self, bound: BoundTarget) -> Result<()> {
        if bound.target.is_none() {
            self.acquire_frame()?;
        }

        let (color_view, depth_view) = match bound.target {
            None => (
                self.frame_view
                    .as_ref()
                    .ok_or(Error::Surface(wgpu::SurfaceError::Lost))?,
                &self.surface_depth,
            ),
            Some(id) => {
                let target = self.live_target(id)?;
                (&target.color_view, &target.depth_view)
            }
        };
        let kind = match bound.target {
            None => TargetKind::Surface,
            Some(_) => TargetKind::Offscreen,
        };

        let mut uniform_data = vec![0u8; (self.uniform_stride as usize) * bound.draws.len().max(1)];
        for (index, draw) in bound.draws.iter().enumerate() {
            let start = index * self.uniform_stride as usize;
            uniform_data[start..start + UNIFORM_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&draw.uniforms));
        }
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniforms"),
                contents: &uniform_data,
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let mut bind_groups: Vec<BindGroup> = Vec::with_capacity(bound.draws.len());
        for draw in &bound.draws {
            let program = self.program(draw.program)?;
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_SIZE),
                }),
            }];

            for (index, name) in program.interface.textures.iter().enumerate() {
                let texture = draw
                    .textures
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, texture)| *texture);
                let view = match (texture, bound.target) {
                    (Some(texture), Some(current)) if texture.0 == current.0 => {
                        warn!(
                            "Program `{}` samples the target it draws into; using placeholder",
                            program.label
                        );
                        &self.placeholder
                    }
                    (Some(texture), _) => {
                        &self.live_target(TargetId(texture.0))?.color_view
                    }
                    (None, _) => &self.placeholder,
                };
                entries.push(wgpu::BindGroupEntry {
                    binding: 1 + index as u32 * 2,
                    resource: wgpu::BindingResource::TextureView(view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: 2 + index as u32 * 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                });
            }

            bind_groups.push(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Draw Bind Group"),
                layout: &program.layout,
                entries: &entries,
            }));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let color_load = match bound.clear {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = match bound.clear {
                Some(_) => wgpu::LoadOp::Clear(1.0),
                None => wgpu::LoadOp::Load,
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (index, (draw, bind_group)) in bound.draws.iter().zip(&bind_groups).enumerate() {
                let program = self.program(draw.program)?;
                let pipeline = program
                    .pipelines
                    .get(&(draw.primitive, kind))
                    .ok_or(Error::UnknownHandle {
                        kind: "pipeline",
                        id: draw.program.0,
                    })?;
                let vertex_array = self
                    .vertex_arrays
                    .get(draw.vertex_array.0 as usize)
                    .ok_or(Error::UnknownHandle {
                        kind: "vertex array",
                        id: draw.vertex_array.0,
                    })?;

                render_pass.set_pipeline(pipeline);
                let offset = (index as u64 * self.uniform_stride) as u32;
                render_pass.set_bind_group(0, bind_group, &[offset]);
                for (location, attribute) in program.interface.attributes.iter().enumerate() {
                    if let Some((_, buffer)) =
                        vertex_array.buffers.iter().find(|(name, _)| name == attribute)
                    {
                        render_pass.set_vertex_buffer(location as u32, buffer.slice(..));
                    }
                }
                render_pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        debug!(
            "Flushed {} draws into {:?}",
            bound.draws.len(),
            bound.target
        );
        Ok(())
    }
}

impl RenderContext for GpuContext {
    fn set_render_state(&mut self, state: RenderState) {
        self.render_state = state;
    }

    fn compile_program(&mut self, descriptor: &ProgramDescriptor) -> Result<ProgramId> {
        descriptor.validate()?;

        let label = descriptor.label.as_str();
        let vertex = self.scoped(descriptor, ShaderStage::Vertex, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{label} Vertex")),
                source: wgpu::ShaderSource::Wgsl(descriptor.vertex.clone()),
            })
        })?;
        let fragment = self.scoped(descriptor, ShaderStage::Fragment, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{label} Fragment")),
                source: wgpu::ShaderSource::Wgsl(descriptor.fragment.clone()),
            })
        })?;

        let layout = self.create_layout(label, &descriptor.interface);
        let surface_format = self.surface_config.format;
        let state = self.render_state;
        let attribute_count = descriptor.interface.attributes.len();

        let pipelines = self.scoped(descriptor, ShaderStage::Link, |device| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label} Pipeline Layout")),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

            let mut pipelines = HashMap::new();
            for primitive in [Primitive::Triangles, Primitive::Points] {
                for (kind, format) in [
                    (TargetKind::Surface, surface_format),
                    (TargetKind::Offscreen, OFFSCREEN_FORMAT),
                ] {
                    let pipeline = Self::create_pipeline(
                        device,
                        &format!("{label} {primitive:?} {kind:?} Pipeline"),
                        &pipeline_layout,
                        &vertex,
                        &fragment,
                        attribute_count,
                        primitive,
                        format,
                        state,
                    );
                    pipelines.insert((primitive, kind), pipeline);
                }
            }
            pipelines
        })?;

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            label: descriptor.label.clone(),
            interface: descriptor.interface.clone(),
            layout,
            pipelines,
            uniforms: UniformBlock::default(),
            textures: Vec::new(),
        });
        info!("Compiled program `{}` as {:?}", descriptor.label, id);
        Ok(id)
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(GpuVertexArray::default());
        id
    }

    fn buffer_attribute(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        attribute: &str,
        data: &[f32],
    ) -> Result<()> {
        let declared = self.program(program)?;
        if !declared.interface.has_attribute(attribute) {
            return Err(Error::AttributeNotFound {
                program: declared.label.clone(),
                name: attribute.to_string(),
            });
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(attribute),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let array = self
            .vertex_arrays
            .get_mut(vertex_array.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "vertex array",
                id: vertex_array.0,
            })?;
        array.buffers.retain(|(name, _)| name != attribute);
        array.buffers.push((attribute.to_string(), buffer));
        Ok(())
    }

    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<OffscreenTarget> {
        let width = width.max(1);
        let height = height.max(1);

        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let (depth, depth_view) = create_depth_texture(&self.device, width, height, "Offscreen Depth");

        // Texture handles share the index of the target that owns them
        let index = self.targets.len() as u32;
        self.targets.push(Some(GpuTarget {
            _color: color,
            color_view,
            _depth: depth,
            depth_view,
        }));
        debug!("Created {}x{} offscreen target {}", width, height, index);

        Ok(OffscreenTarget {
            target: TargetId(index),
            texture: TextureId(index),
            width,
            height,
        })
    }

    fn release_offscreen_target(&mut self, target: &OffscreenTarget) -> Result<()> {
        self.live_target(target.target)?;
        self.targets[target.target.0 as usize] = None;
        Ok(())
    }

    fn bind_target(&mut self, target: Option<TargetId>) -> Result<()> {
        if let Some(id) = target {
            self.live_target(id)?;
        }
        if let Some(previous) = self.bound.take() {
            self.flush(previous)?;
        }
        self.bound = Some(BoundTarget {
            target,
            clear: None,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn clear(&mut self, color: [f64; 4]) -> Result<()> {
        let bound = self.bound.as_mut().ok_or(Error::NoTargetBound)?;
        // Clearing discards everything drawn so far in this binding
        bound.draws.clear();
        bound.clear = Some(color);
        Ok(())
    }

    fn unbind_target(&mut self) -> Result<()> {
        let bound = self.bound.take().ok_or(Error::NoTargetBound)?;
        self.flush(bound)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.current_vertex_array = vertex_array;
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let program = self.bound_program()?;
        if !program.interface.has_uniform(name) {
            return Err(Error::UniformNotFound {
                program: program.label.clone(),
                name: name.to_string(),
            });
        }
        program.uniforms.set(name, value)
    }

    fn bind_texture(&mut self, name: &str, texture: TextureId) -> Result<()> {
        let program = self.bound_program()?;
        if !program.interface.has_texture(name) {
            return Err(Error::UniformNotFound {
                program: program.label.clone(),
                name: name.to_string(),
            });
        }
        program.textures.retain(|(n, _)| n != name);
        program.textures.push((name.to_string(), texture));
        Ok(())
    }

    fn draw_arrays(&mut self, primitive: Primitive, vertex_count: u32) -> Result<()> {
        if self.bound.is_none() {
            return Err(Error::NoTargetBound);
        }
        let program_id = self.current_program.ok_or(Error::NoProgramBound)?;
        let vertex_array = self
            .current_vertex_array
            .ok_or(Error::NoVertexArrayBound)?;

        let program = self.program(program_id)?;
        let array = self
            .vertex_arrays
            .get(vertex_array.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "vertex array",
                id: vertex_array.0,
            })?;
        if let Some(missing) = program
            .interface
            .attributes
            .iter()
            .find(|a| !array.buffers.iter().any(|(name, _)| name == *a))
        {
            return Err(Error::AttributeNotFound {
                program: program.label.clone(),
                name: missing.clone(),
            });
        }

        let draw = PendingDraw {
            program: program_id,
            vertex_array,
            primitive,
            vertex_count,
            uniforms: program.uniforms,
            textures: program.textures.clone(),
        };
        if let Some(bound) = self.bound.as_mut() {
            bound.draws.push(draw);
        }
        Ok(())
    }
}

fn create_depth_texture(
    device: &Device,
    width: u32,
    height: u32,
    label: &str,
) -> (Texture, TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// 1x1 texture bound to sampler slots that have nothing assigned.
/// Encodes the farthest depth so nothing reads as shadowed.
fn create_placeholder_texture(device: &Device, queue: &Queue) -> TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Placeholder Texture"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        texture.as_image_copy(),
        &[255, 255, 255, 255],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Shaders write colors without gamma encoding, so a linear format shows
/// them as authored
fn choose_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}
