use crate::shaders;
use scenery_render::{
    BindGroupId, BindGroupSource, BindTier, BufferId, BufferUsage, CommandList, FrameAcquisitionError,
    GpuBackend, InitializationError, PassCommand, PassDesc, PipelineDesc, PipelineId,
    PipelineStatus, Shading, TextureData, TextureId, Vertex,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

type ErrorScope = Pin<Box<dyn Future<Output = Option<wgpu::Error>>>>;

struct PipelineSlot {
    pipeline: wgpu::RenderPipeline,
    status: PipelineStatus,
    /// Validation scope around pipeline creation, resolved on a later poll.
    scope: Option<ErrorScope>,
}

struct TextureSlot {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct Layouts {
    frame: wgpu::BindGroupLayout,
    object: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    material_textured: wgpu::BindGroupLayout,
    plain_pipeline: wgpu::PipelineLayout,
    textured_pipeline: wgpu::PipelineLayout,
}

impl Layouts {
    fn bind_group(&self, tier: BindTier, textured: bool) -> &wgpu::BindGroupLayout {
        match tier {
            BindTier::Frame => &self.frame,
            BindTier::Object => &self.object,
            BindTier::Material if textured => &self.material_textured,
            BindTier::Material => &self.material,
        }
    }
}

/// [`GpuBackend`] over a wgpu surface.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    adapter_info: wgpu::AdapterInfo,
    shader: wgpu::ShaderModule,
    layouts: Layouts,
    sampler: wgpu::Sampler,
    depth_view: Option<wgpu::TextureView>,
    next_id: u64,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, TextureSlot>,
    bind_groups: HashMap<BindGroupId, wgpu::BindGroup>,
    pipelines: HashMap<PipelineId, PipelineSlot>,
}

impl WgpuBackend {
    /// Pick an adapter for `surface`, open a device and configure the surface
    /// at `width` x `height`.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, InitializationError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(InitializationError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("scenery_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| InitializationError::Device(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|e| {
            tracing::error!(error = %e, "uncaptured wgpu error");
        }));

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| InitializationError::Surface("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let layouts = Layouts::new(&device);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let adapter_info = adapter.get_info();
        tracing::info!(
            backend = adapter_info.backend.to_str(),
            adapter = %adapter_info.name,
            format = ?surface_format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_info,
            shader,
            layouts,
            sampler,
            depth_view: None,
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            bind_groups: HashMap::new(),
            pipelines: HashMap::new(),
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Reconfigure the surface for a new window size. The renderer picks the
    /// change up on its next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn replay(&self, pass: &mut wgpu::RenderPass<'_>, commands: &CommandList) {
        for command in commands.commands() {
            match command {
                PassCommand::SetPipeline(id) => match self.pipelines.get(id) {
                    Some(slot) => pass.set_pipeline(&slot.pipeline),
                    None => tracing::trace!(pipeline = id.0, "unknown pipeline ignored"),
                },
                PassCommand::SetBindGroup { slot, group } => match self.bind_groups.get(group) {
                    Some(bind_group) => pass.set_bind_group(*slot, bind_group, &[]),
                    None => tracing::trace!(group = group.0, "unknown bind group ignored"),
                },
                PassCommand::SetVertexBuffer { slot, buffer } => match self.buffers.get(buffer) {
                    Some(b) => pass.set_vertex_buffer(*slot, b.slice(..)),
                    None => tracing::trace!(buffer = buffer.0, "unknown vertex buffer ignored"),
                },
                PassCommand::SetIndexBuffer(buffer) => match self.buffers.get(buffer) {
                    Some(b) => pass.set_index_buffer(b.slice(..), wgpu::IndexFormat::Uint32),
                    None => tracing::trace!(buffer = buffer.0, "unknown index buffer ignored"),
                },
                PassCommand::DrawIndexed {
                    indices,
                    base_vertex,
                    instances,
                } => pass.draw_indexed(indices.clone(), *base_vertex, instances.clone()),
            }
        }
    }
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });
        let material_textured = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_textured_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let plain_pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("plain_pipeline_layout"),
            bind_group_layouts: &[&frame, &object, &material],
            push_constant_ranges: &[],
        });
        let textured_pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("textured_pipeline_layout"),
            bind_group_layouts: &[&frame, &object, &material_textured],
            push_constant_ranges: &[],
        });

        Self {
            frame,
            object,
            material,
            material_textured,
            plain_pipeline,
            textured_pipeline,
        }
    }
}

fn fragment_entry(shading: Shading) -> &'static str {
    match shading {
        Shading::Flat => "fs_flat",
        Shading::Lambert => "fs_lambert",
        Shading::Textured => "fs_textured",
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> FrameAcquisitionError {
    match err {
        wgpu::SurfaceError::Timeout => FrameAcquisitionError::Timeout,
        wgpu::SurfaceError::Outdated => FrameAcquisitionError::Outdated,
        wgpu::SurfaceError::Lost => FrameAcquisitionError::Lost,
        wgpu::SurfaceError::OutOfMemory => FrameAcquisitionError::OutOfMemory,
        other => FrameAcquisitionError::Other(other.to_string()),
    }
}

impl GpuBackend for WgpuBackend {
    type Frame = wgpu::SurfaceTexture;

    fn output_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize_depth_target(&mut self, width: u32, height: u32) {
        self.depth_view = Some(self.create_depth_texture(width, height));
    }

    fn release_depth_target(&mut self) {
        self.depth_view = None;
    }

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferId {
        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let id = BufferId(self.next_id());
        self.buffers.insert(id, buffer);
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[u8]) {
        if let Some(b) = self.buffers.get(&buffer) {
            self.queue.write_buffer(b, 0, data);
        }
    }

    fn create_texture(&mut self, label: &str, data: &TextureData) -> TextureId {
        let expected = data.width as usize * data.height as usize * 4;
        let fallback;
        let data = if data.width == 0 || data.height == 0 || data.rgba.len() != expected {
            tracing::warn!(
                texture = label,
                width = data.width,
                height = data.height,
                bytes = data.rgba.len(),
                "malformed texture data, substituting white"
            );
            fallback = TextureData {
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            };
            &fallback
        } else {
            data
        };

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.rgba,
        );
        let view = texture.create_view(&Default::default());
        let id = TextureId(self.next_id());
        self.textures.insert(
            id,
            TextureSlot {
                _texture: texture,
                view,
            },
        );
        id
    }

    fn create_bind_group(&mut self, label: &str, source: &BindGroupSource) -> BindGroupId {
        let id = BindGroupId(self.next_id());
        let (uniforms, texture) = match source {
            BindGroupSource::Frame { uniforms } | BindGroupSource::Object { uniforms } => {
                (uniforms, None)
            }
            BindGroupSource::Material { uniforms, texture } => (uniforms, texture.as_ref()),
        };

        let mut entries = Vec::with_capacity(3);
        let resolved = match self.buffers.get(uniforms) {
            Some(buffer) => {
                entries.push(wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                });
                match texture.map(|t| self.textures.get(t)) {
                    None => true,
                    Some(Some(slot)) => {
                        entries.push(wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&slot.view),
                        });
                        entries.push(wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        });
                        true
                    }
                    Some(None) => false,
                }
            }
            None => false,
        };

        if resolved {
            let layout = self.layouts.bind_group(source.tier(), texture.is_some());
            let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &entries,
            });
            self.bind_groups.insert(id, group);
        } else {
            tracing::warn!(bind_group = label, "bind group references released resources");
        }
        id
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineId, InitializationError> {
        let layout = match desc.shading {
            Shading::Textured => &self.layouts.textured_pipeline,
            Shading::Flat | Shading::Lambert => &self.layouts.plain_pipeline,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&desc.label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some(fragment_entry(desc.shading)),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });
        let scope: ErrorScope = Box::pin(self.device.pop_error_scope());

        let id = PipelineId(self.next_id());
        self.pipelines.insert(
            id,
            PipelineSlot {
                pipeline,
                status: PipelineStatus::Compiling,
                scope: Some(scope),
            },
        );
        tracing::debug!(pipeline = %desc.label, shading = ?desc.shading, "pipeline submitted");
        Ok(id)
    }

    fn pipeline_status(&mut self, pipeline: PipelineId) -> PipelineStatus {
        let _ = self.device.poll(wgpu::Maintain::Poll);
        let Some(slot) = self.pipelines.get_mut(&pipeline) else {
            return PipelineStatus::Failed("unknown pipeline".into());
        };
        if let Some(scope) = slot.scope.as_mut() {
            let mut cx = Context::from_waker(Waker::noop());
            if let Poll::Ready(result) = scope.as_mut().poll(&mut cx) {
                slot.status = match result {
                    None => PipelineStatus::Ready,
                    Some(err) => PipelineStatus::Failed(err.to_string()),
                };
                slot.scope = None;
            }
        }
        slot.status.clone()
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn release_bind_group(&mut self, group: BindGroupId) {
        self.bind_groups.remove(&group);
    }

    fn release_pipeline(&mut self, pipeline: PipelineId) {
        self.pipelines.remove(&pipeline);
    }

    fn acquire_frame(&mut self) -> Result<wgpu::SurfaceTexture, FrameAcquisitionError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.config);
                Err(map_surface_error(err))
            }
            Err(err) => Err(map_surface_error(err)),
        }
    }

    fn submit(&mut self, frame: wgpu::SurfaceTexture, pass: &PassDesc, commands: &CommandList) {
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b, a] = pass.clear_color;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("forward_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: self.depth_view.as_ref().map(|depth| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: depth,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(pass.clear_depth),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                ..Default::default()
            });
            self.replay(&mut render_pass, commands);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}
