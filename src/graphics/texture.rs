use super::engine::{AddressMode, RenderEngine, SamplingMode, TextureId};
use crate::runtime::{AtlasTexture, TextureConfigError, TextureFilter, TextureWrap};

impl From<TextureFilter> for SamplingMode {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => SamplingMode::Nearest,
            TextureFilter::Linear => SamplingMode::Bilinear,
            TextureFilter::MipMap
            | TextureFilter::MipMapNearestNearest
            | TextureFilter::MipMapLinearNearest
            | TextureFilter::MipMapNearestLinear
            | TextureFilter::MipMapLinearLinear => SamplingMode::Trilinear,
        }
    }
}

impl From<TextureWrap> for AddressMode {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::ClampToEdge => AddressMode::Clamp,
            TextureWrap::Repeat => AddressMode::Wrap,
            TextureWrap::MirroredRepeat => AddressMode::Mirror,
        }
    }
}

/// An atlas page image uploaded into a [`RenderEngine`].
///
/// The decoded image is kept on the CPU alongside the engine texture.
/// Regions on the same page share materials because they share the texture id.
#[derive(Debug)]
pub struct EngineTexture {
    image: image::RgbaImage,
    id: TextureId,
}

impl EngineTexture {
    pub fn new(engine: &mut dyn RenderEngine, image: image::RgbaImage, label: &str) -> Self {
        let id = engine.create_texture(Some(label), &image);
        Self { image, id }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Set filters from the OpenGL codes stored in atlas data.
    pub fn set_filters_gl(
        &mut self,
        engine: &mut dyn RenderEngine,
        min: u32,
        mag: u32,
    ) -> Result<(), TextureConfigError> {
        let min = TextureFilter::try_from(min)?;
        let mag = TextureFilter::try_from(mag)?;
        engine.set_texture_sampling(self.id, min.into(), mag.into());
        Ok(())
    }

    /// Set wraps from the OpenGL codes stored in atlas data.
    pub fn set_wraps_gl(
        &mut self,
        engine: &mut dyn RenderEngine,
        u: u32,
        v: u32,
    ) -> Result<(), TextureConfigError> {
        let u = TextureWrap::try_from(u)?;
        let v = TextureWrap::try_from(v)?;
        engine.set_texture_addressing(self.id, u.into(), v.into());
        Ok(())
    }
}

impl AtlasTexture for EngineTexture {
    type Context = dyn RenderEngine;

    fn set_filters(&mut self, engine: &mut Self::Context, min: TextureFilter, mag: TextureFilter) {
        engine.set_texture_sampling(self.id, min.into(), mag.into());
    }

    fn set_wraps(&mut self, engine: &mut Self::Context, u: TextureWrap, v: TextureWrap) {
        engine.set_texture_addressing(self.id, u.into(), v.into());
    }

    fn dispose(self, engine: &mut Self::Context) {
        engine.dispose_texture(self.id);
    }
}
