use super::{
    engine::{
        AddressMode, AlphaMode, MaterialId, MeshId, MeshUpload, NodeId, RenderEngine,
        SamplingMode, SubMesh, TextureId,
    },
    scene::SceneNodes,
    util::{DynamicBuffer, GpuMat4},
};
use crate::math::uv;

use std::{borrow::Cow, mem::size_of};
use thunderdome as td;
use wgpu::util::DeviceExt;
use zerocopy::AsBytes;

/// Creation parameters for a [`WgpuEngine`].
///
/// Target formats must match the render pass the engine's meshes are drawn in.
#[derive(Clone, Copy, Debug)]
pub struct WgpuEngineParams {
    pub target_format: wgpu::TextureFormat,
    /// Format of the depth attachment, if the render pass has one.
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
    /// Whether atlas pages are uploaded as sRGB-encoded textures.
    ///
    /// Keep this on with an sRGB target format so pixels are decoded on sampling
    /// and encoded again on write. Turn it off with a non-sRGB target
    /// to keep everything in gamma space.
    pub srgb_textures: bool,
}

impl Default for WgpuEngineParams {
    fn default() -> Self {
        Self {
            target_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            depth_format: None,
            sample_count: 1,
            srgb_textures: true,
        }
    }
}

impl WgpuEngineParams {
    /// Format atlas pages are uploaded in.
    #[inline]
    pub fn texture_format(&self) -> wgpu::TextureFormat {
        if self.srgb_textures {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

/// A [`RenderEngine`] that draws with wgpu.
///
/// The engine doesn't own a surface or run render passes itself.
/// Call [`prepare`][Self::prepare] once per frame before encoding,
/// then [`draw`][Self::draw] inside a render pass
/// compatible with the [`WgpuEngineParams`] it was created with.
pub struct WgpuEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,
    params: WgpuEngineParams,

    nodes: SceneNodes,
    meshes: td::Arena<GpuMesh>,
    materials: td::Arena<GpuMaterial>,
    textures: td::Arena<GpuTexture>,
    // bound by materials whose texture doesn't exist
    blank_texture: GpuTexture,

    camera_buf: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    pipelines: Pipelines,

    // uploaded in place of dark colors for meshes that don't have them
    zeros: Vec<f32>,
}

struct Pipelines {
    combine: wgpu::RenderPipeline,
    add: wgpu::RenderPipeline,
    multiply: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, mode: AlphaMode) -> &wgpu::RenderPipeline {
        match mode {
            AlphaMode::Combine => &self.combine,
            AlphaMode::Add => &self.add,
            AlphaMode::Multiply => &self.multiply,
        }
    }
}

struct GpuMesh {
    parent: Option<NodeId>,
    enabled: bool,
    positions: DynamicBuffer,
    colors: DynamicBuffer,
    uvs: DynamicBuffer,
    dark_colors: DynamicBuffer,
    indices: DynamicBuffer,
    index_count: u32,
    submeshes: Vec<SubMesh>,
    materials: Vec<MaterialId>,
    model_buf: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

struct GpuMaterial {
    texture: TextureId,
    alpha_mode: AlphaMode,
    bind_group: wgpu::BindGroup,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    min: SamplingMode,
    mag: SamplingMode,
    u: AddressMode,
    v: AddressMode,
}

//
// mode conversions
//

fn filter_mode(mode: SamplingMode) -> wgpu::FilterMode {
    match mode {
        SamplingMode::Nearest => wgpu::FilterMode::Nearest,
        SamplingMode::Bilinear | SamplingMode::Trilinear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::Clamp => wgpu::AddressMode::ClampToEdge,
        AddressMode::Wrap => wgpu::AddressMode::Repeat,
        AddressMode::Mirror => wgpu::AddressMode::MirrorRepeat,
    }
}

fn blend_state(mode: AlphaMode) -> wgpu::BlendState {
    match mode {
        AlphaMode::Combine => wgpu::BlendState::ALPHA_BLENDING,
        AlphaMode::Add => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
        AlphaMode::Multiply => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        },
    }
}

/// Number of mip levels down to 1x1 and the pixels of every level, largest first.
fn mip_chain(image: &image::RgbaImage) -> (u32, Vec<u8>) {
    let (width, height) = image.dimensions();
    let level_count = width.max(height).max(1).ilog2() + 1;

    let mut pixels = image.as_raw().clone();
    let mut level = image.clone();
    for _ in 1..level_count {
        let (w, h) = ((level.width() / 2).max(1), (level.height() / 2).max(1));
        level = image::imageops::resize(&level, w, h, image::imageops::FilterType::Triangle);
        pixels.extend_from_slice(level.as_raw());
    }
    (level_count, pixels)
}

impl GpuTexture {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        label: Option<&str>,
        image: &image::RgbaImage,
    ) -> Self {
        let blank;
        let image = if image.width() == 0 || image.height() == 0 {
            log::warn!("Texture {:?} is empty, replacing it with a blank pixel", label);
            blank = image::RgbaImage::new(1, 1);
            &blank
        } else {
            image
        };
        let (width, height) = image.dimensions();
        let (mip_level_count, pixels) = mip_chain(image);

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label,
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let (min, mag) = (SamplingMode::Bilinear, SamplingMode::Bilinear);
        let (u, v) = (AddressMode::Clamp, AddressMode::Clamp);
        let sampler = Self::create_sampler(device, min, mag, u, v);

        Self {
            _texture: texture,
            view,
            sampler,
            min,
            mag,
            u,
            v,
        }
    }

    fn create_sampler(
        device: &wgpu::Device,
        min: SamplingMode,
        mag: SamplingMode,
        u: AddressMode,
        v: AddressMode,
    ) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: address_mode(u),
            address_mode_v: address_mode(v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(mag),
            min_filter: filter_mode(min),
            mipmap_filter: match min {
                SamplingMode::Trilinear => wgpu::FilterMode::Linear,
                SamplingMode::Nearest | SamplingMode::Bilinear => wgpu::FilterMode::Nearest,
            },
            // only the full-size level unless mipmapping was asked for
            lod_max_clamp: match min {
                SamplingMode::Trilinear => 32.,
                SamplingMode::Nearest | SamplingMode::Bilinear => 0.,
            },
            ..Default::default()
        })
    }

    fn rebuild_sampler(&mut self, device: &wgpu::Device) {
        self.sampler = Self::create_sampler(device, self.min, self.mag, self.u, self.v);
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &GpuTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("skeleton material"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}

impl WgpuEngine {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, params: WgpuEngineParams) -> Self {
        let label = Some("skeleton");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "shaders/skeleton.wgsl"
            ))),
        });

        // bind groups

        let mat4_uniform_layout = |label: &str| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<GpuMat4>() as _),
                    },
                    count: None,
                }],
            })
        };
        let camera_layout = mat4_uniform_layout("skeleton camera");
        let model_layout = mat4_uniform_layout("skeleton model");

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skeleton material"),
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

        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skeleton camera"),
            contents: GpuMat4::from(uv::Mat4::identity()).as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skeleton camera"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        //
        // pipelines
        //

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label,
            bind_group_layouts: &[&camera_layout, &model_layout, &material_layout],
            push_constant_ranges: &[],
        });

        // every attribute has its own buffer
        // so that mesh uploads can be copied without interleaving
        let vertex_buffers = [
            // position
            wgpu::VertexBufferLayout {
                array_stride: 3 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                }],
            },
            // color
            wgpu::VertexBufferLayout {
                array_stride: 4 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 1,
                }],
            },
            // texture coordinates
            wgpu::VertexBufferLayout {
                array_stride: 2 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 2,
                }],
            },
            // dark color
            wgpu::VertexBufferLayout {
                array_stride: 4 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 3,
                }],
            },
        ];

        let pipeline = |mode: AlphaMode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(match mode {
                    AlphaMode::Combine => "skeleton combine",
                    AlphaMode::Add => "skeleton add",
                    AlphaMode::Multiply => "skeleton multiply",
                }),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: params.target_format,
                        blend: Some(blend_state(mode)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                // skeletons are flat and may be mirrored by bone scale
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                // blended geometry is tested against depth but doesn't write it;
                // draw order takes care of sorting within a skeleton
                depth_stencil: params.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: params.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            })
        };

        let pipelines = Pipelines {
            combine: pipeline(AlphaMode::Combine),
            add: pipeline(AlphaMode::Add),
            multiply: pipeline(AlphaMode::Multiply),
        };

        let blank = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let blank_texture = GpuTexture::upload(
            &device,
            &queue,
            params.texture_format(),
            Some("blank"),
            &blank,
        );

        Self {
            device,
            queue,
            params,
            nodes: SceneNodes::new(),
            meshes: td::Arena::new(),
            materials: td::Arena::new(),
            textures: td::Arena::new(),
            blank_texture,
            camera_buf,
            camera_bind_group,
            model_layout,
            material_layout,
            pipelines,
            zeros: Vec::new(),
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn params(&self) -> &WgpuEngineParams {
        &self.params
    }

    /// Upload the camera and the world transforms of all enabled meshes.
    pub fn prepare(&mut self, view_proj: uv::Mat4) {
        self.queue.write_buffer(
            &self.camera_buf,
            0,
            GpuMat4::from(view_proj).as_bytes(),
        );
        for (_, mesh) in self.meshes.iter().filter(|(_, mesh)| mesh.enabled) {
            let world = self.nodes.world_transform(mesh.parent);
            self.queue
                .write_buffer(&mesh.model_buf, 0, GpuMat4::from(world).as_bytes());
        }
    }

    /// Draw every enabled mesh, one sub-mesh at a time.
    pub fn draw<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>) {
        pass.set_bind_group(0, &self.camera_bind_group, &[]);

        for (_, mesh) in self.meshes.iter() {
            if !mesh.enabled || mesh.index_count == 0 {
                continue;
            }
            pass.set_bind_group(1, &mesh.model_bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.positions.slice());
            pass.set_vertex_buffer(1, mesh.colors.slice());
            pass.set_vertex_buffer(2, mesh.uvs.slice());
            pass.set_vertex_buffer(3, mesh.dark_colors.slice());
            pass.set_index_buffer(mesh.indices.slice(), wgpu::IndexFormat::Uint16);

            for sub in &mesh.submeshes {
                let Some(material) = mesh
                    .materials
                    .get(sub.material_index)
                    .and_then(|id| self.materials.get(id.0))
                else {
                    continue;
                };
                pass.set_pipeline(self.pipelines.get(material.alpha_mode));
                pass.set_bind_group(2, &material.bind_group, &[]);
                pass.draw_indexed(sub.index_start..sub.index_start + sub.index_count, 0, 0..1);
            }
        }
    }

    /// Recreate the bind groups of every material using `texture`
    /// after its sampler has changed.
    fn rebuild_material_bind_groups(&mut self, texture: TextureId) {
        let Some(tex) = self.textures.get(texture.0) else {
            return;
        };
        for (_, material) in self.materials.iter_mut() {
            if material.texture == texture {
                material.bind_group = material_bind_group(&self.device, &self.material_layout, tex);
            }
        }
    }
}

impl RenderEngine for WgpuEngine {
    fn create_node(&mut self, label: &str) -> NodeId {
        self.nodes.insert(label)
    }

    fn set_node_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        self.nodes.set_parent(node, parent);
    }

    fn set_node_transform(&mut self, node: NodeId, transform: uv::Mat4) {
        self.nodes.set_transform(node, transform);
    }

    fn dispose_node(&mut self, node: NodeId) {
        self.nodes.remove(node);
        for (_, mesh) in self.meshes.iter_mut() {
            if mesh.parent == Some(node) {
                mesh.parent = None;
            }
        }
    }

    fn create_mesh(&mut self, label: &str, max_vertices: usize, max_indices: usize) -> MeshId {
        let device = &self.device;
        let vertex_buf = |components: usize| {
            DynamicBuffer::new(
                device,
                Some(label),
                wgpu::BufferUsages::VERTEX,
                (max_vertices * components * size_of::<f32>()) as _,
            )
        };
        let positions = vertex_buf(3);
        let colors = vertex_buf(4);
        let uvs = vertex_buf(2);
        let dark_colors = vertex_buf(4);
        let indices = DynamicBuffer::new(
            device,
            Some(label),
            wgpu::BufferUsages::INDEX,
            (max_indices * size_of::<u16>()) as _,
        );

        let model_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: GpuMat4::from(uv::Mat4::identity()).as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: model_buf.as_entire_binding(),
            }],
        });

        MeshId(self.meshes.insert(GpuMesh {
            parent: None,
            enabled: true,
            positions,
            colors,
            uvs,
            dark_colors,
            indices,
            index_count: 0,
            submeshes: Vec::new(),
            materials: Vec::new(),
            model_buf,
            model_bind_group,
        }))
    }

    fn set_mesh_parent(&mut self, mesh: MeshId, parent: Option<NodeId>) {
        if let Some(mesh) = self.meshes.get_mut(mesh.0) {
            mesh.parent = parent;
        }
    }

    fn set_mesh_enabled(&mut self, mesh: MeshId, enabled: bool) {
        if let Some(mesh) = self.meshes.get_mut(mesh.0) {
            mesh.enabled = enabled;
        }
    }

    fn set_mesh_materials(&mut self, mesh: MeshId, materials: &[MaterialId]) {
        if let Some(mesh) = self.meshes.get_mut(mesh.0) {
            mesh.materials.clear();
            mesh.materials.extend_from_slice(materials);
        }
    }

    fn update_mesh(&mut self, mesh: MeshId, data: MeshUpload<'_>) {
        let Some(gpu) = self.meshes.get_mut(mesh.0) else {
            return;
        };
        let (device, queue) = (&self.device, &self.queue);

        gpu.positions.write(device, queue, data.positions);
        gpu.colors.write(device, queue, data.colors);
        gpu.uvs.write(device, queue, data.uvs);
        match data.dark_colors {
            Some(dark) => gpu.dark_colors.write(device, queue, dark),
            None => {
                let len = data.vertex_count() * 4;
                if self.zeros.len() < len {
                    self.zeros.resize(len, 0.);
                }
                gpu.dark_colors.write(device, queue, &self.zeros[..len])
            }
        };
        gpu.indices.write(device, queue, data.indices);
        gpu.index_count = data.indices.len() as u32;

        gpu.submeshes.clear();
        gpu.submeshes.extend_from_slice(data.submeshes);
    }

    fn dispose_mesh(&mut self, mesh: MeshId) {
        self.meshes.remove(mesh.0);
    }

    fn create_material(&mut self, texture: TextureId, alpha_mode: AlphaMode) -> MaterialId {
        let tex = self.textures.get(texture.0).unwrap_or(&self.blank_texture);
        let bind_group = material_bind_group(&self.device, &self.material_layout, tex);
        MaterialId(self.materials.insert(GpuMaterial {
            texture,
            alpha_mode,
            bind_group,
        }))
    }

    fn dispose_material(&mut self, material: MaterialId) {
        self.materials.remove(material.0);
    }

    fn create_texture(&mut self, label: Option<&str>, image: &image::RgbaImage) -> TextureId {
        let tex = GpuTexture::upload(
            &self.device,
            &self.queue,
            self.params.texture_format(),
            label,
            image,
        );
        TextureId(self.textures.insert(tex))
    }

    fn set_texture_sampling(&mut self, texture: TextureId, min: SamplingMode, mag: SamplingMode) {
        let Some(tex) = self.textures.get_mut(texture.0) else {
            return;
        };
        if (tex.min, tex.mag) == (min, mag) {
            return;
        }
        (tex.min, tex.mag) = (min, mag);
        tex.rebuild_sampler(&self.device);
        self.rebuild_material_bind_groups(texture);
    }

    fn set_texture_addressing(&mut self, texture: TextureId, u: AddressMode, v: AddressMode) {
        let Some(tex) = self.textures.get_mut(texture.0) else {
            return;
        };
        if (tex.u, tex.v) == (u, v) {
            return;
        }
        (tex.u, tex.v) = (u, v);
        tex.rebuild_sampler(&self.device);
        self.rebuild_material_bind_groups(texture);
    }

    fn dispose_texture(&mut self, texture: TextureId) {
        // materials keep the GPU resources alive until they're disposed too
        self.textures.remove(texture.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_map_to_wgpu() {
        assert_eq!(filter_mode(SamplingMode::Trilinear), wgpu::FilterMode::Linear);
        assert_eq!(filter_mode(SamplingMode::Nearest), wgpu::FilterMode::Nearest);
        assert_eq!(address_mode(AddressMode::Mirror), wgpu::AddressMode::MirrorRepeat);
        assert_ne!(blend_state(AlphaMode::Add), blend_state(AlphaMode::Combine));
    }

    #[test]
    fn mip_chain_goes_down_to_one_pixel() {
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 100, 50, 255]));
        let (levels, pixels) = mip_chain(&image);
        // 4x2, 2x1, 1x1
        assert_eq!(levels, 3);
        assert_eq!(pixels.len(), (8 + 2 + 1) * 4);
        assert_eq!(&pixels[..32], image.as_raw().as_slice());
        // a solid color stays solid
        assert!(pixels[40..]
            .iter()
            .zip([200u8, 100, 50, 255])
            .all(|(&px, expected)| px.abs_diff(expected) <= 1));

        let (levels, pixels) = mip_chain(&image::RgbaImage::new(1, 1));
        assert_eq!(levels, 1);
        assert_eq!(pixels.len(), 4);
    }

    #[test]
    fn texture_color_space_follows_params() {
        let params = WgpuEngineParams::default();
        assert!(params.target_format.is_srgb());
        assert_eq!(params.texture_format(), wgpu::TextureFormat::Rgba8UnormSrgb);

        let params = WgpuEngineParams {
            target_format: wgpu::TextureFormat::Bgra8Unorm,
            srgb_textures: false,
            ..Default::default()
        };
        assert_eq!(params.texture_format(), wgpu::TextureFormat::Rgba8Unorm);
    }
}
