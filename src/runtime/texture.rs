use std::str::FromStr;

/// Texture filtering as stored in atlas data.
///
/// The numeric values used by the runtime are OpenGL enum codes;
/// see [`gl_code`][Self::gl_code] and the `TryFrom<u32>` implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TextureFilter {
    Nearest,
    Linear,
    MipMap,
    MipMapNearestNearest,
    MipMapLinearNearest,
    MipMapNearestLinear,
    MipMapLinearLinear,
}

/// Texture coordinate wrapping as stored in atlas data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TextureWrap {
    MirroredRepeat,
    ClampToEdge,
    Repeat,
}

/// A filter or wrap value that doesn't exist in the runtime's enumeration.
///
/// This means the atlas data was written by a runtime version this crate doesn't know about.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureConfigError {
    #[error("Unknown texture filter code {0}")]
    UnknownFilter(u32),
    #[error("Unknown texture wrap code {0}")]
    UnknownWrap(u32),
    #[error("Unknown texture filter name {0:?}")]
    UnknownFilterName(String),
    #[error("Unknown texture wrap name {0:?}")]
    UnknownWrapName(String),
}

impl TextureFilter {
    pub fn gl_code(self) -> u32 {
        match self {
            TextureFilter::Nearest => 9728,
            TextureFilter::Linear => 9729,
            // MipMap is an alias of MipMapLinearLinear
            TextureFilter::MipMap | TextureFilter::MipMapLinearLinear => 9987,
            TextureFilter::MipMapNearestNearest => 9984,
            TextureFilter::MipMapLinearNearest => 9985,
            TextureFilter::MipMapNearestLinear => 9986,
        }
    }
}

impl TryFrom<u32> for TextureFilter {
    type Error = TextureConfigError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            9728 => Ok(TextureFilter::Nearest),
            9729 => Ok(TextureFilter::Linear),
            9987 => Ok(TextureFilter::MipMap),
            9984 => Ok(TextureFilter::MipMapNearestNearest),
            9985 => Ok(TextureFilter::MipMapLinearNearest),
            9986 => Ok(TextureFilter::MipMapNearestLinear),
            other => Err(TextureConfigError::UnknownFilter(other)),
        }
    }
}

impl FromStr for TextureFilter {
    type Err = TextureConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Nearest" => Ok(TextureFilter::Nearest),
            "Linear" => Ok(TextureFilter::Linear),
            "MipMap" => Ok(TextureFilter::MipMap),
            "MipMapNearestNearest" => Ok(TextureFilter::MipMapNearestNearest),
            "MipMapLinearNearest" => Ok(TextureFilter::MipMapLinearNearest),
            "MipMapNearestLinear" => Ok(TextureFilter::MipMapNearestLinear),
            "MipMapLinearLinear" => Ok(TextureFilter::MipMapLinearLinear),
            other => Err(TextureConfigError::UnknownFilterName(other.to_string())),
        }
    }
}

impl TextureWrap {
    pub fn gl_code(self) -> u32 {
        match self {
            TextureWrap::MirroredRepeat => 33648,
            TextureWrap::ClampToEdge => 33071,
            TextureWrap::Repeat => 10497,
        }
    }
}

impl TryFrom<u32> for TextureWrap {
    type Error = TextureConfigError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            33648 => Ok(TextureWrap::MirroredRepeat),
            33071 => Ok(TextureWrap::ClampToEdge),
            10497 => Ok(TextureWrap::Repeat),
            other => Err(TextureConfigError::UnknownWrap(other)),
        }
    }
}

impl FromStr for TextureWrap {
    type Err = TextureConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MirroredRepeat" => Ok(TextureWrap::MirroredRepeat),
            "ClampToEdge" => Ok(TextureWrap::ClampToEdge),
            "Repeat" => Ok(TextureWrap::Repeat),
            other => Err(TextureConfigError::UnknownWrapName(other.to_string())),
        }
    }
}

/// What the runtime expects to be able to do with the renderer object of an atlas page.
///
/// `Context` is whatever the implementation needs access to
/// in order to change its backing texture, typically a render engine.
pub trait AtlasTexture {
    type Context: ?Sized;

    fn set_filters(&mut self, ctx: &mut Self::Context, min: TextureFilter, mag: TextureFilter);
    fn set_wraps(&mut self, ctx: &mut Self::Context, u: TextureWrap, v: TextureWrap);
    fn dispose(self, ctx: &mut Self::Context);
}
