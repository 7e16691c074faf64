//! wgpu render backend
//!
//! One vertex buffer per scene geometry, one bind group per scene texture, and a
//! shared instance buffer rewritten every frame. Four pipelines cover the
//! {line, triangle} x {normal, additive} combinations; there is no depth buffer
//! since every effect is translucent and drawn back-to-front by batch order.

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::{
    build_camera_uniform, collect_batches, CameraUniform, FrameBatches, InstanceRaw,
    RenderBackend, RenderStats, ResidentResources,
};
use crate::error::{graphics_unavailable, gpu_operation_error, EngineError, EngineResult, GpuErrorContext};
use crate::scene::{Blending, Camera, EffectVertex, GeometryId, Scene, TextureData, TextureId, Topology};
use crate::viewport::SurfaceSize;

const MIN_INSTANCE_CAPACITY: u64 = 64;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4];

fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<EffectVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

fn instance_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
};

struct EffectPipelines {
    normal_lines: wgpu::RenderPipeline,
    normal_triangles: wgpu::RenderPipeline,
    additive_lines: wgpu::RenderPipeline,
    additive_triangles: wgpu::RenderPipeline,
}

impl EffectPipelines {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Effect Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("effect.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Effect Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let build = |blending: Blending, topology: Topology| {
            let (blend, primitive) = (
                match blending {
                    Blending::Normal => wgpu::BlendState::ALPHA_BLENDING,
                    Blending::Additive => ADDITIVE_BLENDING,
                },
                match topology {
                    Topology::Lines => wgpu::PrimitiveTopology::LineList,
                    Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
                },
            );
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Effect Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[vertex_buffer_layout(), instance_buffer_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: primitive,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
        };

        Self {
            normal_lines: build(Blending::Normal, Topology::Lines),
            normal_triangles: build(Blending::Normal, Topology::Triangles),
            additive_lines: build(Blending::Additive, Topology::Lines),
            additive_triangles: build(Blending::Additive, Topology::Triangles),
        }
    }

    fn get(&self, blending: Blending, topology: Topology) -> &wgpu::RenderPipeline {
        match (blending, topology) {
            (Blending::Normal, Topology::Lines) => &self.normal_lines,
            (Blending::Normal, Topology::Triangles) => &self.normal_triangles,
            (Blending::Additive, Topology::Lines) => &self.additive_lines,
            (Blending::Additive, Topology::Triangles) => &self.additive_triangles,
        }
    }
}

struct GpuGeometry {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
    pipelines: EffectPipelines,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    geometries: FxHashMap<GeometryId, GpuGeometry>,
    textures: FxHashMap<TextureId, GpuTexture>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
}

impl WgpuBackend {
    /// Create a device and configure `target` as a `size` render surface
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: SurfaceSize,
        clear_color: [f32; 4],
    ) -> EngineResult<Self> {
        log::info!("[WgpuBackend::new] Starting GPU initialization at {}", size);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target).gpu_context("create_surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| graphics_unavailable("no compatible GPU adapter"))?;
        let info = adapter.get_info();
        log::info!("[WgpuBackend::new] Adapter: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let base_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::downlevel_defaults()
        };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Weather FX Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: base_limits.using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .gpu_context("request_device")?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("[GPU] Uncaptured device error: {}", error);
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| graphics_unavailable("surface reports no supported formats"))?;
        let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        let max_dimension = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.clamp(1, max_dimension),
            height: size.height.clamp(1, max_dimension),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "[WgpuBackend::new] Surface configured: {:?} {}x{} alpha {:?}",
            format,
            config.width,
            config.height,
            alpha_mode
        );

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
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
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("effect_texture_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Effect Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipelines = EffectPipelines::new(&device, format, &[&camera_layout, &texture_layout]);
        let white = upload_texture(&device, &queue, &texture_layout, &sampler, &TextureData::white());
        let instance_capacity = MIN_INSTANCE_CAPACITY;
        let instance_buffer = create_instance_buffer(&device, instance_capacity);

        let [r, g, b, a] = clear_color.map(f64::from);
        log::info!("[WgpuBackend::new] GPU initialization complete");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            clear_color: wgpu::Color { r, g, b, a },
            pipelines,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            sampler,
            white,
            geometries: FxHashMap::default(),
            textures: FxHashMap::default(),
            instance_buffer,
            instance_capacity,
        })
    }

    /// Mirror geometries and textures referenced by this frame that are not yet resident
    fn upload_missing(&mut self, scene: &Scene, frame: &FrameBatches) {
        for batch in &frame.batches {
            let key = batch.key;
            if !self.geometries.contains_key(&key.geometry) {
                if let Some(geometry) = scene.geometry(key.geometry) {
                    let vertices = geometry.vertices();
                    if vertices.is_empty() {
                        continue;
                    }
                    let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Effect Geometry"),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    });
                    self.geometries.insert(
                        key.geometry,
                        GpuGeometry {
                            buffer,
                            vertex_count: vertices.len() as u32,
                        },
                    );
                }
            }

            if let Some(texture_id) = key.texture {
                if self.textures.contains_key(&texture_id) {
                    continue;
                }
                if let Some(texture) = scene.texture(texture_id) {
                    let gpu = upload_texture(
                        &self.device,
                        &self.queue,
                        &self.texture_layout,
                        &self.sampler,
                        texture,
                    );
                    self.textures.insert(texture_id, gpu);
                }
            }
        }
    }

    fn write_instances(&mut self, instances: &[InstanceRaw]) {
        let needed = instances.len() as u64;
        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two().max(MIN_INSTANCE_CAPACITY);
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
            log::debug!(
                "[WgpuBackend::write_instances] Instance buffer grown to {} instances",
                self.instance_capacity
            );
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    fn acquire_frame(&mut self) -> EngineResult<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(output) => Ok(Some(output)),
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("[WgpuBackend::render] Surface timeout, skipping frame");
                Ok(None)
            }
            Err(wgpu::SurfaceError::Lost) => {
                log::warn!("[WgpuBackend::render] Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Err(EngineError::SurfaceLost)
            }
            Err(e) => Err(gpu_operation_error("get_current_texture", e)),
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let width = size.width.min(max_dimension);
        let height = size.height.min(max_dimension);
        if width < size.width || height < size.height {
            log::warn!(
                "[WgpuBackend::resize] Requested {} exceeds max texture dimension {}, clamped to {}x{}",
                size,
                max_dimension,
                width,
                height
            );
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.config.width, self.config.height)
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> EngineResult<RenderStats> {
        let frame = collect_batches(scene);
        self.upload_missing(scene, &frame);
        self.write_instances(&frame.instances);
        let uniform = build_camera_uniform(camera, scene.fog());
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let Some(output) = self.acquire_frame()? else {
            return Ok(RenderStats {
                skipped: true,
                ..RenderStats::default()
            });
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Effect Encoder"),
            });

        let mut stats = RenderStats::default();
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Effect Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for batch in &frame.batches {
                let Some(geometry) = self.geometries.get(&batch.key.geometry) else {
                    continue;
                };
                let texture = batch
                    .key
                    .texture
                    .and_then(|id| self.textures.get(&id))
                    .unwrap_or(&self.white);
                render_pass.set_pipeline(self.pipelines.get(batch.key.blending, batch.key.topology));
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                render_pass.set_vertex_buffer(0, geometry.buffer.slice(..));
                render_pass.draw(0..geometry.vertex_count, batch.instances.clone());
                stats.draw_calls += 1;
                stats.instances += batch.instances.len() as u32;
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(stats)
    }

    fn release_geometry(&mut self, id: GeometryId) -> bool {
        match self.geometries.remove(&id) {
            Some(geometry) => {
                geometry.buffer.destroy();
                true
            }
            None => false,
        }
    }

    fn release_texture(&mut self, id: TextureId) -> bool {
        match self.textures.remove(&id) {
            Some(texture) => {
                texture.texture.destroy();
                true
            }
            None => false,
        }
    }

    fn resident(&self) -> ResidentResources {
        ResidentResources {
            geometries: self.geometries.len(),
            textures: self.textures.len(),
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: capacity * std::mem::size_of::<InstanceRaw>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    data: &TextureData,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Effect Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("effect_texture_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        texture,
        bind_group,
    }
}
