//! Scene node that renders a skeleton through a pool of [`MeshBatcher`]s.

use crate::{
    graphics::{
        batcher::{MAX_VERTICES, TWO_COLOR_VERTEX_SIZE, VERTEX_SIZE},
        EngineTexture, MeshBatcher, NodeId, RenderEngine,
    },
    math::NodeTransform,
    runtime::{
        AnimationState, Attachment, Clipper, Color, MeshAttachment, Physics, RegionAttachment,
        Runtime, Skeleton, Slot, SlotOf,
    },
};

/// Triangles of a region attachment's quad.
static QUAD_TRIANGLES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Creation parameters for a [`SkeletonMesh`].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SkeletonMeshParams {
    /// Label of the scene node, also used as a prefix for batch mesh labels.
    pub label: String,
    /// Whether to upload the slots' dark colors for two-color tinting.
    pub two_color_tint: bool,
    /// Distance along the z axis between consecutive slots in draw order.
    pub z_offset: f32,
    /// Capacity of each batch mesh in vertices.
    pub max_vertices: usize,
}

impl Default for SkeletonMeshParams {
    fn default() -> Self {
        Self {
            label: "skeleton".to_string(),
            two_color_tint: false,
            z_offset: 0.1,
            max_vertices: MAX_VERTICES,
        }
    }
}

/// Batchers reused from frame to frame.
/// The pool only grows; batchers unused on a frame are disabled.
struct BatcherPool {
    batchers: Vec<MeshBatcher>,
    next_batch_index: usize,
    label: String,
    max_vertices: usize,
    two_color_tint: bool,
}

impl BatcherPool {
    fn clear(&mut self, engine: &mut dyn RenderEngine) {
        for batcher in &mut self.batchers {
            batcher.clear();
            batcher.set_enabled(engine, false);
        }
        self.next_batch_index = 0;
    }

    fn next_batcher(&mut self, engine: &mut dyn RenderEngine, parent: NodeId) -> &mut MeshBatcher {
        if self.batchers.len() <= self.next_batch_index {
            let label = format!("{} batch {}", self.label, self.batchers.len());
            let batcher =
                MeshBatcher::new(engine, &label, self.max_vertices, self.two_color_tint);
            batcher.set_parent(engine, Some(parent));
            log::debug!("Added {label} to the batcher pool");
            self.batchers.push(batcher);
        }
        let batcher = &mut self.batchers[self.next_batch_index];
        self.next_batch_index += 1;
        batcher.set_enabled(engine, true);
        batcher
    }
}

/// Buffers reused between attachments to avoid per-slot allocation.
#[derive(Default)]
struct Scratch {
    vertices: Vec<f32>,
    clipped_vertices: Vec<f32>,
    clipped_triangles: Vec<u16>,
}

/// A skeleton, its animation state, and the meshes it's drawn with.
///
/// Call [`update`][Self::update] once per frame
/// to advance animation and rebuild the meshes.
pub struct SkeletonMesh<R: Runtime> {
    pub skeleton: R::Skeleton,
    pub animation_state: R::AnimationState,
    /// Distance along the z axis between consecutive slots in draw order.
    pub z_offset: f32,
    clipper: R::Clipper,
    pool: BatcherPool,
    node: NodeId,
    stride: usize,
    scratch: Scratch,
}

impl<R> SkeletonMesh<R>
where
    R: Runtime,
    SlotOf<R>: Slot<Texture = EngineTexture>,
{
    pub fn new(
        engine: &mut dyn RenderEngine,
        data: &R::SkeletonData,
        params: SkeletonMeshParams,
    ) -> Self {
        let node = engine.create_node(&params.label);
        Self {
            skeleton: R::new_skeleton(data),
            animation_state: R::new_animation_state(data),
            z_offset: params.z_offset,
            clipper: R::new_clipper(),
            pool: BatcherPool {
                batchers: Vec::new(),
                next_batch_index: 0,
                label: params.label,
                max_vertices: params.max_vertices,
                two_color_tint: params.two_color_tint,
            },
            node,
            stride: if params.two_color_tint {
                TWO_COLOR_VERTEX_SIZE
            } else {
                VERTEX_SIZE
            },
            scratch: Scratch::default(),
        }
    }

    /// Advance animation by `delta` seconds, pose the skeleton and rebuild its meshes.
    pub fn update(&mut self, engine: &mut dyn RenderEngine, delta: f32) {
        self.animation_state.update(delta);
        self.animation_state.apply(&mut self.skeleton);
        self.skeleton.update(delta);
        self.skeleton.update_world_transform(Physics::Update);

        self.update_geometry(engine);
    }

    fn update_geometry(&mut self, engine: &mut dyn RenderEngine) {
        let Self {
            skeleton,
            z_offset,
            clipper,
            pool,
            node,
            stride,
            scratch,
            ..
        } = self;
        let (node, stride, z_offset) = (*node, *stride, *z_offset);
        let two_color = stride == TWO_COLOR_VERTEX_SIZE;

        pool.clear(engine);
        let mut batch = pool.next_batcher(engine, node);
        batch.begin();

        let skeleton_color = skeleton.color();
        let mut z = 0.;

        for slot in skeleton.draw_order() {
            if !slot.is_bone_active() {
                clipper.clip_end_with_slot(slot);
                continue;
            }

            let (texture, color, triangles): (&EngineTexture, Color, &[u16]) =
                match slot.attachment() {
                    Some(Attachment::Clipping(clip)) => {
                        clipper.clip_start(slot, clip);
                        continue;
                    }
                    Some(Attachment::Region(region)) => {
                        let Some(texture) = region.texture() else {
                            clipper.clip_end_with_slot(slot);
                            continue;
                        };
                        reset_vertices(&mut scratch.vertices, 4 * stride);
                        region.compute_world_vertices(slot, &mut scratch.vertices, 0, stride);
                        copy_uvs(&mut scratch.vertices, region.uvs(), stride);
                        (texture, region.color(), &QUAD_TRIANGLES[..])
                    }
                    Some(Attachment::Mesh(mesh)) => {
                        let Some(texture) = mesh.texture() else {
                            clipper.clip_end_with_slot(slot);
                            continue;
                        };
                        let len = mesh.world_vertices_length();
                        reset_vertices(&mut scratch.vertices, (len / 2) * stride);
                        mesh.compute_world_vertices(slot, 0, len, &mut scratch.vertices, 0, stride);
                        copy_uvs(&mut scratch.vertices, mesh.uvs(), stride);
                        (texture, mesh.color(), mesh.triangles())
                    }
                    Some(Attachment::Other) | None => {
                        clipper.clip_end_with_slot(slot);
                        continue;
                    }
                };

            let tint = (skeleton_color * slot.color() * color).as_array();
            let dark = slot.dark_color().unwrap_or(Color::TRANSPARENT).as_array();
            for vert in scratch.vertices.chunks_exact_mut(stride) {
                vert[3..7].copy_from_slice(&tint);
                if two_color {
                    vert[9..13].copy_from_slice(&dark);
                }
            }

            let (vertices, triangles): (&[f32], &[u16]) = if clipper.is_clipping() {
                scratch.clipped_vertices.clear();
                scratch.clipped_triangles.clear();
                clipper.clip_triangles(
                    &scratch.vertices,
                    triangles,
                    stride,
                    &mut scratch.clipped_vertices,
                    &mut scratch.clipped_triangles,
                );
                if scratch.clipped_triangles.is_empty() {
                    clipper.clip_end_with_slot(slot);
                    continue;
                }
                (&scratch.clipped_vertices[..], &scratch.clipped_triangles[..])
            } else {
                (&scratch.vertices[..], triangles)
            };

            let vert_count = vertices.len() / stride;
            if !batch.can_batch(vert_count, triangles.len()) {
                if batch.index_count() > 0 {
                    batch.end(engine);
                    batch = pool.next_batcher(engine, node);
                    batch.begin();
                }
                if !batch.can_batch(vert_count, triangles.len()) {
                    log::warn!(
                        "Skipping an attachment with {} vertices and {} indices, \
                        too large for a batch of {} vertices",
                        vert_count,
                        triangles.len(),
                        batch.capacity()
                    );
                    clipper.clip_end_with_slot(slot);
                    continue;
                }
            }

            let material = batch.find_material_index(engine, texture.id(), slot.blend_mode());
            batch.add_material_group(triangles.len(), material);
            batch.batch(vertices, triangles, z);

            z += z_offset;
            clipper.clip_end_with_slot(slot);
        }

        clipper.clip_end();
        batch.end(engine);
    }

    /// Release every batch mesh and the scene node.
    pub fn dispose(self, engine: &mut dyn RenderEngine) {
        for batcher in self.pool.batchers {
            batcher.dispose(engine);
        }
        engine.dispose_node(self.node);
    }
}

impl<R: Runtime> SkeletonMesh<R> {
    /// All batchers in the pool, including ones unused on the last frame.
    #[inline]
    pub fn batchers(&self) -> &[MeshBatcher] {
        &self.pool.batchers
    }

    /// Number of batchers used on the last frame.
    #[inline]
    pub fn active_batch_count(&self) -> usize {
        self.pool.next_batch_index
    }

    /// The scene node the batch meshes are parented to.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn set_parent(&self, engine: &mut dyn RenderEngine, parent: Option<NodeId>) {
        engine.set_node_parent(self.node, parent);
    }

    pub fn set_transform(&self, engine: &mut dyn RenderEngine, transform: NodeTransform) {
        engine.set_node_transform(self.node, transform);
    }
}

/// Resize the scratch vertices to `len` floats, all zero.
fn reset_vertices(vertices: &mut Vec<f32>, len: usize) {
    vertices.clear();
    vertices.resize(len, 0.);
}

/// Write `u v` pairs into the uv fields of interleaved vertices.
fn copy_uvs(vertices: &mut [f32], uvs: &[f32], stride: usize) {
    for (vert, uv) in vertices.chunks_exact_mut(stride).zip(uvs.chunks_exact(2)) {
        vert[7..9].copy_from_slice(uv);
    }
}
