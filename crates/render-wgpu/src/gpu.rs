use crate::queue::{DrawQueue, UNIFORM_SIZE, uniform_stride};
use crate::shaders;
use crate::textures::TextureRegistry;
use bytemuck::{Pod, Zeroable};
use panorama_common::TextureId;
use panorama_render::{Batch, DrawBackend, DrawState, RenderError, ShaderProgram, Vertex};

/// Vertex as uploaded: color packed as `0xAARRGGBB`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: u32,
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.to_array(),
            uv: v.uv.to_array(),
            color: v.color.pack(),
        }
    }
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x2, // uv
        2 => Uint32     // packed color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// wgpu implementation of [`DrawBackend`].
///
/// Draw calls are queued on the CPU as they arrive and recorded into a render
/// pass by [`encode`](Self::encode), one `draw_indexed` per batch, each with
/// its own view-projection slot. Only [`TEXTURE_SLOT`](crate::TEXTURE_SLOT)
/// exists; other slots are rejected and the fallback lands on it.
pub struct WgpuSkyboxBackend {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u64,
    uniform_stride: u64,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    index_buffer: wgpu::Buffer,
    index_capacity: u64,
    textures: TextureRegistry,
    queued: DrawQueue,
}

impl WgpuSkyboxBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let textures = TextureRegistry::new(device, queue);
        let uniform_stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox_uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, textures.layout()],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let uniform_capacity = 8;
        let uniform_buffer = create_buffer(
            device,
            "skybox_uniform_buffer",
            uniform_capacity * uniform_stride,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let uniform_bind_group = create_uniform_bind_group(device, &uniform_layout, &uniform_buffer);

        let vertex_capacity = 64;
        let vertex_buffer = create_buffer(
            device,
            "skybox_vertex_buffer",
            vertex_capacity * std::mem::size_of::<GpuVertex>() as u64,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );
        let index_capacity = 96;
        let index_buffer = create_buffer(
            device,
            "skybox_index_buffer",
            index_capacity * std::mem::size_of::<u32>() as u64,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        );

        Self {
            pipeline,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
            uniform_stride,
            vertex_buffer,
            vertex_capacity,
            index_buffer,
            index_capacity,
            textures,
            queued: DrawQueue::new(uniform_stride),
        }
    }

    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        &mut self.textures
    }

    /// Upload queued geometry and record every queued draw into one render
    /// pass on `target`. `clear` clears the target first; `None` loads it.
    ///
    /// Returns the number of draw calls recorded.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) -> usize {
        self.ensure_capacity(device);

        if !self.queued.is_empty() {
            let queued = &self.queued;
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(queued.vertices()));
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(queued.indices()));
            queue.write_buffer(&self.uniform_buffer, 0, queued.uniforms());
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("skybox_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if !self.queued.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                for draw in self.queued.draws() {
                    pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                    pass.set_bind_group(1, self.textures.bind_group(draw.texture.as_ref()), &[]);
                    pass.draw_indexed(
                        draw.first_index..draw.first_index + draw.index_count,
                        0,
                        0..1,
                    );
                }
            }
        }

        let recorded = self.queued.draws().len();
        self.queued.clear();
        recorded
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device) {
        let vertices = self.queued.vertices().len() as u64;
        if vertices > self.vertex_capacity {
            self.vertex_capacity = vertices.next_power_of_two();
            self.vertex_buffer = create_buffer(
                device,
                "skybox_vertex_buffer",
                self.vertex_capacity * std::mem::size_of::<GpuVertex>() as u64,
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            );
        }

        let indices = self.queued.indices().len() as u64;
        if indices > self.index_capacity {
            self.index_capacity = indices.next_power_of_two();
            self.index_buffer = create_buffer(
                device,
                "skybox_index_buffer",
                self.index_capacity * std::mem::size_of::<u32>() as u64,
                wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            );
        }

        let slots = self.queued.draws().len() as u64;
        if slots > self.uniform_capacity {
            self.uniform_capacity = slots.next_power_of_two();
            self.uniform_buffer = create_buffer(
                device,
                "skybox_uniform_buffer",
                self.uniform_capacity * self.uniform_stride,
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            );
            self.uniform_bind_group =
                create_uniform_bind_group(device, &self.uniform_layout, &self.uniform_buffer);
        }
    }
}

impl DrawBackend for WgpuSkyboxBackend {
    fn use_program(&mut self, program: ShaderProgram) {
        self.queued.use_program(program);
    }

    fn bind_texture(&mut self, slot: u32, texture: &TextureId) -> Result<(), RenderError> {
        if !self.textures.contains(texture) {
            return Err(RenderError::ResourceUnavailable(texture.clone()));
        }
        self.queued.bind_texture(slot, texture)
    }

    fn bind_fallback_texture(&mut self, slot: u32) {
        self.queued.bind_fallback_texture(slot);
    }

    fn draw(&mut self, batch: &Batch, state: &DrawState) -> Result<(), RenderError> {
        self.queued.draw(batch, state)
    }
}

fn create_buffer(
    device: &wgpu::Device,
    label: &str,
    size: u64,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("skybox_uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    })
}
