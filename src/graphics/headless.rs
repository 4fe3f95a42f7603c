//! A render engine that keeps everything on the CPU.
//!
//! Nothing is drawn; uploads are stored as-is so they can be inspected.
//! Useful for tests and for tools that need batching results without a GPU.

use super::{
    engine::{
        AddressMode, AlphaMode, MaterialId, MeshId, MeshUpload, NodeId, RenderEngine,
        SamplingMode, SubMesh, TextureId,
    },
    scene::{SceneNode, SceneNodes},
};
use crate::math::{uv, NodeTransform};
use thunderdome as td;

/// Last state uploaded to a mesh.
#[derive(Debug, Clone)]
pub struct HeadlessMesh {
    pub label: String,
    pub max_vertices: usize,
    pub max_indices: usize,
    pub parent: Option<NodeId>,
    pub enabled: bool,
    pub materials: Vec<MaterialId>,
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub uvs: Vec<f32>,
    pub dark_colors: Option<Vec<f32>>,
    pub indices: Vec<u16>,
    pub submeshes: Vec<SubMesh>,
    /// Number of times [`RenderEngine::update_mesh`] has been called on this mesh.
    pub upload_count: usize,
}

impl HeadlessMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessMaterial {
    pub texture: TextureId,
    pub alpha_mode: AlphaMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTexture {
    pub label: Option<String>,
    pub dimensions: (u32, u32),
    pub min_sampling: SamplingMode,
    pub mag_sampling: SamplingMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
}

/// See the [module-level documentation][self].
pub struct HeadlessEngine {
    nodes: SceneNodes,
    meshes: td::Arena<HeadlessMesh>,
    materials: td::Arena<HeadlessMaterial>,
    textures: td::Arena<HeadlessTexture>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self {
            nodes: SceneNodes::new(),
            meshes: td::Arena::new(),
            materials: td::Arena::new(),
            textures: td::Arena::new(),
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Transform from the space of `node` to world space.
    #[inline]
    pub fn world_transform(&self, node: NodeId) -> NodeTransform {
        self.nodes.world_transform(Some(node))
    }

    #[inline]
    pub fn mesh(&self, id: MeshId) -> Option<&HeadlessMesh> {
        self.meshes.get(id.0)
    }

    #[inline]
    pub fn material(&self, id: MaterialId) -> Option<&HeadlessMaterial> {
        self.materials.get(id.0)
    }

    #[inline]
    pub fn texture(&self, id: TextureId) -> Option<&HeadlessTexture> {
        self.textures.get(id.0)
    }

    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Iterate over the meshes that would currently be drawn.
    pub fn enabled_meshes(&self) -> impl Iterator<Item = (MeshId, &HeadlessMesh)> + '_ {
        self.meshes
            .iter()
            .filter(|(_, mesh)| mesh.enabled)
            .map(|(idx, mesh)| (MeshId(idx), mesh))
    }
}

impl RenderEngine for HeadlessEngine {
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
        MeshId(self.meshes.insert(HeadlessMesh {
            label: label.to_string(),
            max_vertices,
            max_indices,
            parent: None,
            enabled: true,
            materials: Vec::new(),
            positions: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
            dark_colors: None,
            indices: Vec::new(),
            submeshes: Vec::new(),
            upload_count: 0,
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
            mesh.materials = materials.to_vec();
        }
    }

    fn update_mesh(&mut self, mesh: MeshId, data: MeshUpload<'_>) {
        let Some(mesh) = self.meshes.get_mut(mesh.0) else {
            return;
        };
        assert!(
            data.vertex_count() <= mesh.max_vertices && data.indices.len() <= mesh.max_indices,
            "Mesh upload larger than the mesh was created for"
        );
        mesh.positions = data.positions.to_vec();
        mesh.colors = data.colors.to_vec();
        mesh.uvs = data.uvs.to_vec();
        mesh.dark_colors = data.dark_colors.map(<[f32]>::to_vec);
        mesh.indices = data.indices.to_vec();
        mesh.submeshes = data.submeshes.to_vec();
        mesh.upload_count += 1;
    }

    fn dispose_mesh(&mut self, mesh: MeshId) {
        self.meshes.remove(mesh.0);
    }

    fn create_material(&mut self, texture: TextureId, alpha_mode: AlphaMode) -> MaterialId {
        MaterialId(self.materials.insert(HeadlessMaterial {
            texture,
            alpha_mode,
        }))
    }

    fn dispose_material(&mut self, material: MaterialId) {
        self.materials.remove(material.0);
    }

    fn create_texture(&mut self, label: Option<&str>, image: &image::RgbaImage) -> TextureId {
        TextureId(self.textures.insert(HeadlessTexture {
            label: label.map(str::to_string),
            dimensions: image.dimensions(),
            min_sampling: SamplingMode::Bilinear,
            mag_sampling: SamplingMode::Bilinear,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
        }))
    }

    fn set_texture_sampling(&mut self, texture: TextureId, min: SamplingMode, mag: SamplingMode) {
        if let Some(tex) = self.textures.get_mut(texture.0) {
            tex.min_sampling = min;
            tex.mag_sampling = mag;
        }
    }

    fn set_texture_addressing(&mut self, texture: TextureId, u: AddressMode, v: AddressMode) {
        if let Some(tex) = self.textures.get_mut(texture.0) {
            tex.address_u = u;
            tex.address_v = v;
        }
    }

    fn dispose_texture(&mut self, texture: TextureId) {
        self.textures.remove(texture.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposed_ids_are_ignored() {
        let mut engine = HeadlessEngine::new();
        let mesh = engine.create_mesh("mesh", 4, 6);
        engine.dispose_mesh(mesh);
        engine.set_mesh_enabled(mesh, false);
        engine.update_mesh(
            mesh,
            MeshUpload {
                positions: &[],
                colors: &[],
                uvs: &[],
                dark_colors: None,
                indices: &[],
                submeshes: &[],
            },
        );
        assert!(engine.mesh(mesh).is_none());
        assert_eq!(engine.mesh_count(), 0);
    }

    #[test]
    fn disposing_a_node_detaches_meshes() {
        let mut engine = HeadlessEngine::new();
        let node = engine.create_node("node");
        let mesh = engine.create_mesh("mesh", 4, 6);
        engine.set_mesh_parent(mesh, Some(node));
        engine.dispose_node(node);
        assert_eq!(engine.mesh(mesh).unwrap().parent, None);
        assert!(engine.node(node).is_none());
    }
}
