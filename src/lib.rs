pub mod runtime;
pub use runtime::{
    AnimationState, Attachment, AtlasTexture, BlendMode, Clipper, Color, MeshAttachment, Physics,
    RegionAttachment, Runtime, Skeleton, Slot, TextureConfigError, TextureFilter, TextureWrap,
};

pub mod math;
pub use math::{uv, NodeTransform};

pub mod graphics;
pub use graphics::{
    EngineTexture, HeadlessEngine, MeshBatcher, NodeId, RenderEngine, WgpuEngine,
    WgpuEngineParams,
};

pub mod atlas;
pub use atlas::{AtlasPage, AtlasPageInfo, TextureAtlas};

pub mod skeleton_mesh;
pub use skeleton_mesh::{SkeletonMesh, SkeletonMeshParams};

pub mod asset_manager;
pub use asset_manager::{Asset, AssetManager, AssetManagerBase, LoadError};

// Re-exported wgpu and image to guarantee versions match
pub use image;
pub use wgpu;
