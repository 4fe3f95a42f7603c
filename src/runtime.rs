//! Interfaces to the skeletal animation runtime.
//!
//! Posing, constraints, animation mixing and clipping math all happen inside the runtime.
//! The traits here only describe what a [`SkeletonMesh`][crate::SkeletonMesh]
//! reads from it and asks of it once per frame.

mod texture;
pub use texture::{AtlasTexture, TextureConfigError, TextureFilter, TextureWrap};

use std::ops::Mul;

/// RGBA color with components in the range `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1., 1., 1., 1.);
    pub const TRANSPARENT: Self = Self::new(0., 0., 0., 0.);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn as_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Componentwise product, the way tints are combined.
impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color {
            r: self.r * rhs.r,
            g: self.g * rhs.g,
            b: self.b * rhs.b,
            a: self.a * rhs.a,
        }
    }
}

/// How a slot's attachment is composited with what's behind it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
}

/// Physics behavior requested from a world transform update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Physics {
    /// Physics is not updated or applied.
    None,
    /// Physics is reset to the current pose.
    Reset,
    /// Physics is stepped and applied.
    Update,
    /// Physics is applied without stepping.
    Pose,
}

/// The attachment currently shown by a slot.
///
/// This is the one place where attachment kinds are told apart;
/// everything the runtime supports beyond regions, meshes and clipping
/// (bounding boxes, paths, points) ends up in `Other`.
pub enum Attachment<'a, S: Slot> {
    Region(&'a S::Region),
    Mesh(&'a S::Mesh),
    Clipping(&'a S::Clipping),
    Other,
}

/// A textured quad.
pub trait RegionAttachment<S: Slot> {
    /// Texture of the atlas page the region lives on, if it could be resolved.
    fn texture(&self) -> Option<&S::Texture>;
    fn color(&self) -> Color;
    /// Texture coordinates of the four corners as `u v` pairs.
    fn uvs(&self) -> &[f32];
    /// Write the world positions of the four corners into `out`
    /// as `x y` pairs, the first at `offset` and each subsequent one `stride` floats later.
    fn compute_world_vertices(&self, slot: &S, out: &mut [f32], offset: usize, stride: usize);
}

/// A free-form triangle mesh, possibly weighted to several bones.
pub trait MeshAttachment<S: Slot> {
    fn texture(&self) -> Option<&S::Texture>;
    fn color(&self) -> Color;
    /// Number of floats in the world vertex array, i.e. twice the vertex count.
    fn world_vertices_length(&self) -> usize;
    fn uvs(&self) -> &[f32];
    fn triangles(&self) -> &[u16];
    /// Write `count` floats worth of world positions starting from vertex float `start`,
    /// laid out the same way as in [`RegionAttachment::compute_world_vertices`].
    fn compute_world_vertices(
        &self,
        slot: &S,
        start: usize,
        count: usize,
        out: &mut [f32],
        offset: usize,
        stride: usize,
    );
}

/// Per-slot pose state.
pub trait Slot: Sized {
    /// Renderer object attached to atlas pages.
    type Texture;
    type Region: RegionAttachment<Self>;
    type Mesh: MeshAttachment<Self>;
    type Clipping;

    fn is_bone_active(&self) -> bool;
    fn color(&self) -> Color;
    /// Second tint color for two-color tinting, if the slot has one.
    fn dark_color(&self) -> Option<Color>;
    fn blend_mode(&self) -> BlendMode;
    fn attachment(&self) -> Option<Attachment<'_, Self>>;
}

/// A posed skeleton.
pub trait Skeleton {
    type Slot: Slot;

    fn color(&self) -> Color;
    /// Advance time-dependent state such as physics by `delta` seconds.
    fn update(&mut self, delta: f32);
    /// Propagate bone transforms from the root down.
    fn update_world_transform(&mut self, physics: Physics);
    /// Slots in the order they should be drawn, back to front.
    fn draw_order(&self) -> impl Iterator<Item = &Self::Slot>;
}

/// Animation mixing and timing for one skeleton.
pub trait AnimationState {
    type Skeleton;

    fn update(&mut self, delta: f32);
    /// Pose `skeleton` with the current animations.
    /// Returns whether anything was applied.
    fn apply(&mut self, skeleton: &mut Self::Skeleton) -> bool;
}

/// Clipping of attachment triangles against clipping attachment polygons.
pub trait Clipper<S: Slot> {
    fn clip_start(&mut self, slot: &S, clip: &S::Clipping);
    /// End clipping if `slot` is the end slot of the active clipping attachment.
    fn clip_end_with_slot(&mut self, slot: &S);
    fn clip_end(&mut self);
    fn is_clipping(&self) -> bool;
    /// Clip interleaved vertices of `stride` floats against the active clipping polygon,
    /// appending the surviving geometry in the same layout to the output buffers.
    ///
    /// Positions are the first two floats of a vertex;
    /// everything else in the vertex is interpolated.
    fn clip_triangles(
        &mut self,
        vertices: &[f32],
        triangles: &[u16],
        stride: usize,
        out_vertices: &mut Vec<f32>,
        out_triangles: &mut Vec<u16>,
    );
}

/// Ties together the types one animation runtime provides.
pub trait Runtime {
    /// Shared, immutable skeleton definition.
    type SkeletonData: ?Sized;
    type Skeleton: Skeleton;
    type AnimationState: AnimationState<Skeleton = Self::Skeleton>;
    type Clipper: Clipper<<Self::Skeleton as Skeleton>::Slot>;

    fn new_skeleton(data: &Self::SkeletonData) -> Self::Skeleton;
    fn new_animation_state(data: &Self::SkeletonData) -> Self::AnimationState;
    fn new_clipper() -> Self::Clipper;
}

/// Slot type of a [`Runtime`].
pub type SlotOf<R> = <<R as Runtime>::Skeleton as Skeleton>::Slot;
