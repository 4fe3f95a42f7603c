pub mod engine;
pub use engine::{
    AddressMode, AlphaMode, MaterialId, MeshId, MeshUpload, NodeId, RenderEngine, SamplingMode,
    SubMesh, TextureId,
};

mod scene;
pub use scene::SceneNode;

pub mod util;

pub mod batcher;
pub use batcher::{BatchMaterial, MaterialGroup, MeshBatcher};

mod texture;
pub use texture::EngineTexture;

pub mod headless;
pub use headless::HeadlessEngine;

mod wgpu_engine;
pub use wgpu_engine::{WgpuEngine, WgpuEngineParams};
