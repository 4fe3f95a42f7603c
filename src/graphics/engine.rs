//! The interface between skeleton rendering and the render engine.

use crate::{math::uv, runtime::BlendMode};
use thunderdome as td;

//
// id types
//

/// Identifier for a scene node in a [`RenderEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub(crate) td::Index);

/// Identifier for a dynamic mesh in a [`RenderEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MeshId(pub(crate) td::Index);

/// Identifier for a material in a [`RenderEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) td::Index);

/// Identifier for a texture in a [`RenderEngine`].
///
/// Two atlas regions share a material only if their texture ids are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextureId(pub(crate) td::Index);

//
// modes
//

/// How a material's output is combined with the render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum AlphaMode {
    /// Standard "over" alpha blending.
    Combine,
    Add,
    Multiply,
}

impl From<BlendMode> for AlphaMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Normal => AlphaMode::Combine,
            BlendMode::Additive => AlphaMode::Add,
            BlendMode::Multiply => AlphaMode::Multiply,
            // no screen blending in the engine, closest approximation
            BlendMode::Screen => AlphaMode::Combine,
        }
    }
}

/// Texture sampling quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum SamplingMode {
    Nearest,
    Bilinear,
    /// Bilinear with linear interpolation between mip levels.
    Trilinear,
}

/// What happens to texture coordinates outside `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum AddressMode {
    Clamp,
    Wrap,
    Mirror,
}

//
// mesh data
//

/// A range of a mesh's index buffer drawn with one of its materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubMesh {
    /// Index into the material list set with [`RenderEngine::set_mesh_materials`].
    pub material_index: usize,
    pub vertex_start: u32,
    pub vertex_count: u32,
    pub index_start: u32,
    pub index_count: u32,
}

/// Vertex attributes, indices and draw ranges for one mesh update.
///
/// Attribute arrays are tightly packed:
/// three floats per position, four per color and dark color, two per uv.
#[derive(Clone, Copy, Debug)]
pub struct MeshUpload<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    pub uvs: &'a [f32],
    /// Second tint color; treated as all zeros if not given.
    pub dark_colors: Option<&'a [f32]>,
    pub indices: &'a [u16],
    pub submeshes: &'a [SubMesh],
}

impl<'a> MeshUpload<'a> {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// The operations skeleton rendering needs from a render engine.
///
/// Operations on ids that have already been disposed are ignored.
pub trait RenderEngine {
    fn create_node(&mut self, label: &str) -> NodeId;
    fn set_node_parent(&mut self, node: NodeId, parent: Option<NodeId>);
    fn set_node_transform(&mut self, node: NodeId, transform: uv::Mat4);
    fn dispose_node(&mut self, node: NodeId);

    /// Create an empty, enabled mesh with room for the given amount of data.
    fn create_mesh(&mut self, label: &str, max_vertices: usize, max_indices: usize) -> MeshId;
    fn set_mesh_parent(&mut self, mesh: MeshId, parent: Option<NodeId>);
    /// Disabled meshes keep their data but aren't drawn.
    fn set_mesh_enabled(&mut self, mesh: MeshId, enabled: bool);
    /// Replace the list of materials sub-meshes refer to.
    fn set_mesh_materials(&mut self, mesh: MeshId, materials: &[MaterialId]);
    /// Replace the mesh's vertex data, indices and sub-meshes.
    fn update_mesh(&mut self, mesh: MeshId, data: MeshUpload<'_>);
    fn dispose_mesh(&mut self, mesh: MeshId);

    /// Create an unlit, double-sided material sampling `texture`.
    fn create_material(&mut self, texture: TextureId, alpha_mode: AlphaMode) -> MaterialId;
    fn dispose_material(&mut self, material: MaterialId);

    fn create_texture(&mut self, label: Option<&str>, image: &image::RgbaImage) -> TextureId;
    fn set_texture_sampling(&mut self, texture: TextureId, min: SamplingMode, mag: SamplingMode);
    fn set_texture_addressing(&mut self, texture: TextureId, u: AddressMode, v: AddressMode);
    fn dispose_texture(&mut self, texture: TextureId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_modes_map_to_alpha_modes() {
        let normal = AlphaMode::from(BlendMode::Normal);
        let additive = AlphaMode::from(BlendMode::Additive);
        let multiply = AlphaMode::from(BlendMode::Multiply);
        assert_ne!(normal, additive);
        assert_ne!(normal, multiply);
        assert_ne!(additive, multiply);
        assert_eq!(AlphaMode::from(BlendMode::Screen), normal);
    }
}
