//! Math types, re-exported from `ultraviolet`.
pub use ultraviolet as uv;

/// Transform of a scene node relative to its parent.
pub type NodeTransform = uv::Mat4;

/// Build a node transform for a flat object on the XY plane.
#[inline]
pub fn transform_2d(position: uv::Vec2, angle: f32, scale: f32) -> NodeTransform {
    uv::Mat4::from_translation(uv::Vec3::new(position.x, position.y, 0.))
        * uv::Mat4::from_rotation_z(angle)
        * uv::Mat4::from_nonuniform_scale(uv::Vec3::new(scale, scale, 1.))
}
