//! Batching of attachment geometry into dynamic engine meshes.

use super::engine::{
    AlphaMode, MaterialId, MeshId, MeshUpload, NodeId, RenderEngine, SubMesh, TextureId,
};
use crate::runtime::BlendMode;

use itertools::izip;

/// Default number of vertices a batcher can hold.
pub const MAX_VERTICES: usize = 10920;
/// Floats per vertex in batch input: `x y z r g b a u v`.
pub const VERTEX_SIZE: usize = 9;
/// Floats per vertex with two-color tint: `x y z r g b a u v dr dg db da`.
pub const TWO_COLOR_VERTEX_SIZE: usize = 13;

/// A range of the batcher's indices drawn with one of its materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialGroup {
    pub index_start: usize,
    pub index_count: usize,
    pub material_index: usize,
}

/// A material created by a batcher, along with what it was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchMaterial {
    pub texture: TextureId,
    pub alpha_mode: AlphaMode,
    pub material: MaterialId,
}

/// Fixed-capacity buffers of vertex attributes and indices
/// that are uploaded into a single engine mesh,
/// split into sub-meshes by material.
///
/// Usage per frame is `begin`, then for every attachment
/// `can_batch`, `find_material_index`, `add_material_group` and `batch`,
/// and finally `end`.
pub struct MeshBatcher {
    mesh: MeshId,
    capacity: usize,

    positions: Vec<f32>,
    colors: Vec<f32>,
    uvs: Vec<f32>,
    dark_colors: Option<Vec<f32>>,
    indices: Vec<u16>,

    vertex_count: usize,
    index_count: usize,

    material_groups: Vec<MaterialGroup>,
    materials: Vec<BatchMaterial>,
    // reused to build the upload every frame
    submeshes: Vec<SubMesh>,
}

impl MeshBatcher {
    /// Create a batcher and the engine mesh it uploads into.
    ///
    /// With `two_color_tint` the batcher expects vertices of
    /// [`TWO_COLOR_VERTEX_SIZE`] floats and uploads dark colors,
    /// otherwise vertices are [`VERTEX_SIZE`] floats.
    pub fn new(
        engine: &mut dyn RenderEngine,
        label: &str,
        max_vertices: usize,
        two_color_tint: bool,
    ) -> Self {
        assert!(
            max_vertices > 0 && max_vertices <= u16::MAX as usize,
            "Batcher capacity must be between 1 and {} vertices",
            u16::MAX
        );
        let max_indices = max_vertices * 3;
        let mesh = engine.create_mesh(label, max_vertices, max_indices);

        Self {
            mesh,
            capacity: max_vertices,
            positions: vec![0.; max_vertices * 3],
            colors: vec![0.; max_vertices * 4],
            uvs: vec![0.; max_vertices * 2],
            dark_colors: two_color_tint.then(|| vec![0.; max_vertices * 4]),
            indices: vec![0; max_indices],
            vertex_count: 0,
            index_count: 0,
            material_groups: Vec::new(),
            materials: Vec::new(),
            submeshes: Vec::new(),
        }
    }

    /// Reset the batch, keeping storage and materials.
    pub fn clear(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
        self.material_groups.clear();
    }

    /// Start a new batch.
    #[inline]
    pub fn begin(&mut self) {
        self.clear();
    }

    /// Check whether the given amount of geometry fits in the batch.
    ///
    /// A batch is never filled to its exact capacity.
    pub fn can_batch(&self, num_vertices: usize, num_indices: usize) -> bool {
        self.vertex_count + num_vertices < self.capacity
            && self.index_count + num_indices < self.indices.len()
    }

    /// Append interleaved vertices and triangle indices to the batch.
    ///
    /// Indices are relative to the first of the given vertices.
    /// `z` is added to the z coordinate of every vertex.
    ///
    /// # Panics
    ///
    /// Panics if the data doesn't fit in the batch;
    /// check with [`can_batch`][Self::can_batch] first.
    pub fn batch(&mut self, vertices: &[f32], indices: &[u16], z: f32) {
        let stride = self.stride();
        assert!(
            vertices.len() % stride == 0,
            "Vertex data must be a whole number of {stride}-float vertices"
        );
        let vert_count = vertices.len() / stride;
        assert!(
            self.vertex_count + vert_count <= self.capacity
                && self.index_count + indices.len() <= self.indices.len(),
            "Batch capacity exceeded"
        );

        let vert_range = self.vertex_count..self.vertex_count + vert_count;
        for (vert, pos, color, uv) in izip!(
            vertices.chunks_exact(stride),
            self.positions[vert_range.start * 3..vert_range.end * 3].chunks_exact_mut(3),
            self.colors[vert_range.start * 4..vert_range.end * 4].chunks_exact_mut(4),
            self.uvs[vert_range.start * 2..vert_range.end * 2].chunks_exact_mut(2),
        ) {
            pos[0] = vert[0];
            pos[1] = vert[1];
            pos[2] = vert[2] + z;
            color.copy_from_slice(&vert[3..7]);
            uv.copy_from_slice(&vert[7..9]);
        }
        if let Some(dark_colors) = &mut self.dark_colors {
            for (vert, dark) in izip!(
                vertices.chunks_exact(stride),
                dark_colors[vert_range.start * 4..vert_range.end * 4].chunks_exact_mut(4),
            ) {
                dark.copy_from_slice(&vert[9..13]);
            }
        }

        let base = self.vertex_count as u16;
        let idx_start = self.index_count;
        for (dst, &idx) in izip!(
            &mut self.indices[idx_start..idx_start + indices.len()],
            indices,
        ) {
            debug_assert!(
                (idx as usize) < vert_count,
                "Index {idx} out of range of {vert_count} vertices"
            );
            *dst = idx + base;
        }

        self.vertex_count += vert_count;
        self.index_count += indices.len();
    }

    /// Record that the next `index_count` indices are drawn with the given material.
    ///
    /// Call this before the corresponding [`batch`][Self::batch].
    pub fn add_material_group(&mut self, index_count: usize, material_index: usize) {
        self.material_groups.push(MaterialGroup {
            index_start: self.index_count,
            index_count,
            material_index,
        });
    }

    /// Get the index of a material for the texture and blend mode,
    /// creating one if this batcher doesn't have one yet.
    ///
    /// Blend modes the engine renders identically share a material.
    pub fn find_material_index(
        &mut self,
        engine: &mut dyn RenderEngine,
        texture: TextureId,
        blend_mode: BlendMode,
    ) -> usize {
        let alpha_mode = AlphaMode::from(blend_mode);
        if let Some(idx) = self
            .materials
            .iter()
            .position(|mat| mat.texture == texture && mat.alpha_mode == alpha_mode)
        {
            return idx;
        }

        let material = engine.create_material(texture, alpha_mode);
        log::debug!(
            "Created material {:?} for texture {:?} with {:?}",
            material,
            texture,
            alpha_mode
        );
        self.materials.push(BatchMaterial {
            texture,
            alpha_mode,
            material,
        });
        let ids: Vec<MaterialId> = self.materials.iter().map(|mat| mat.material).collect();
        engine.set_mesh_materials(self.mesh, &ids);

        self.materials.len() - 1
    }

    /// Upload the batch to the engine mesh,
    /// one sub-mesh per material group.
    pub fn end(&mut self, engine: &mut dyn RenderEngine) {
        let vc = self.vertex_count;
        self.submeshes.clear();
        self.submeshes
            .extend(self.material_groups.iter().map(|group| SubMesh {
                material_index: group.material_index,
                vertex_start: 0,
                vertex_count: vc as u32,
                index_start: group.index_start as u32,
                index_count: group.index_count as u32,
            }));

        engine.update_mesh(
            self.mesh,
            MeshUpload {
                positions: &self.positions[..vc * 3],
                colors: &self.colors[..vc * 4],
                uvs: &self.uvs[..vc * 2],
                dark_colors: self.dark_colors.as_deref().map(|dark| &dark[..vc * 4]),
                indices: &self.indices[..self.index_count],
                submeshes: &self.submeshes,
            },
        );
    }

    /// Release the engine mesh and the materials this batcher created.
    pub fn dispose(self, engine: &mut dyn RenderEngine) {
        for mat in &self.materials {
            engine.dispose_material(mat.material);
        }
        engine.dispose_mesh(self.mesh);
    }

    #[inline]
    pub fn set_enabled(&self, engine: &mut dyn RenderEngine, enabled: bool) {
        engine.set_mesh_enabled(self.mesh, enabled);
    }

    #[inline]
    pub fn set_parent(&self, engine: &mut dyn RenderEngine, parent: Option<NodeId>) {
        engine.set_mesh_parent(self.mesh, parent);
    }

    //
    // accessors
    //

    #[inline]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// Maximum number of vertices the batcher was created with.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of floats per vertex expected by [`batch`][Self::batch].
    #[inline]
    pub fn stride(&self) -> usize {
        if self.dark_colors.is_some() {
            TWO_COLOR_VERTEX_SIZE
        } else {
            VERTEX_SIZE
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Indices written so far, offset to refer to the whole batch.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices[..self.index_count]
    }

    #[inline]
    pub fn material_groups(&self) -> &[MaterialGroup] {
        &self.material_groups
    }

    #[inline]
    pub fn materials(&self) -> &[BatchMaterial] {
        &self.materials
    }
}
