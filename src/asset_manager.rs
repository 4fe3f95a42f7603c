//! Loading of atlas and skeleton files.
//!
//! Loads are queued and performed in [`AssetManagerBase::update`].
//! A failed load still counts as loaded; its error is kept under the asset's path.

use crate::{
    atlas::{self, AtlasPage, TextureAtlas},
    graphics::{EngineTexture, RenderEngine},
    runtime::{AtlasTexture, TextureConfigError},
};
use std::collections::HashMap;

/// A loaded asset.
#[derive(Debug)]
pub enum Asset<T> {
    Text(String),
    Binary(Vec<u8>),
    Texture(T),
    /// An atlas with every page texture loaded and configured.
    Atlas(TextureAtlas<T>),
}

impl<T> Asset<T> {
    fn kind_name(&self) -> &'static str {
        match self {
            Asset::Text(_) => "text",
            Asset::Binary(_) => "binary",
            Asset::Texture(_) => "texture",
            Asset::Atlas(_) => "atlas",
        }
    }
}

/// An error that occurred loading or accessing an asset.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {path}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{path} is not valid UTF-8")]
    Utf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Invalid page settings in atlas {path}")]
    Atlas {
        path: String,
        #[source]
        source: TextureConfigError,
    },
    #[error("Asset {0} has not been loaded")]
    NotLoaded(String),
    #[error("Asset {path} is not {expected}")]
    WrongKind { path: String, expected: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Text,
    Binary,
    Texture,
    Atlas,
}

/// Queued asset loading, generic over the texture type
/// and the context needed to create textures.
///
/// All paths given to the manager are relative to its path prefix.
pub struct AssetManagerBase<T, C: ?Sized> {
    path_prefix: String,
    texture_factory: Box<dyn FnMut(&mut C, image::RgbaImage, &str) -> T>,
    raw_data: HashMap<String, Vec<u8>>,
    queue: Vec<(String, Pending)>,
    assets: HashMap<String, Asset<T>>,
    errors: HashMap<String, LoadError>,
    to_load: usize,
    loaded: usize,
}

/// Asset manager producing [`EngineTexture`]s.
pub type AssetManager = AssetManagerBase<EngineTexture, dyn RenderEngine>;

impl AssetManager {
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self::with_texture_factory(path_prefix, |engine, image, path| {
            EngineTexture::new(engine, image, path)
        })
    }
}

impl<T, C: ?Sized> AssetManagerBase<T, C> {
    /// Create a manager that turns decoded images into textures with `texture_factory`.
    /// The factory receives the full path of the image.
    pub fn with_texture_factory(
        path_prefix: impl Into<String>,
        texture_factory: impl FnMut(&mut C, image::RgbaImage, &str) -> T + 'static,
    ) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            texture_factory: Box::new(texture_factory),
            raw_data: HashMap::new(),
            queue: Vec::new(),
            assets: HashMap::new(),
            errors: HashMap::new(),
            to_load: 0,
            loaded: 0,
        }
    }

    #[inline]
    fn full_path(&self, path: &str) -> String {
        format!("{}{}", self.path_prefix, path)
    }

    /// Provide the contents of a file in memory.
    /// Loads of `path` use this data instead of reading the file system.
    pub fn set_raw_data(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        let path = self.full_path(path);
        self.raw_data.insert(path, data.into());
    }

    fn enqueue(&mut self, path: &str, kind: Pending) {
        let path = self.full_path(path);
        if self.assets.contains_key(&path) || self.queue.iter().any(|(p, _)| *p == path) {
            return;
        }
        self.queue.push((path, kind));
        self.to_load += 1;
    }

    pub fn load_text(&mut self, path: &str) {
        self.enqueue(path, Pending::Text);
    }

    pub fn load_binary(&mut self, path: &str) {
        self.enqueue(path, Pending::Binary);
    }

    pub fn load_texture(&mut self, path: &str) {
        self.enqueue(path, Pending::Texture);
    }

    /// Queue an atlas file and the page images it names.
    ///
    /// Page images are looked up next to the atlas file.
    /// Each page texture gets the filters and wraps from the atlas.
    pub fn load_texture_atlas(&mut self, path: &str) {
        self.enqueue(path, Pending::Atlas);
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, LoadError> {
        match self.raw_data.get(path) {
            Some(data) => Ok(data.clone()),
            None => std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        String::from_utf8(self.read(path)?).map_err(|source| LoadError::Utf8 {
            path: path.to_string(),
            source,
        })
    }

    fn read_image(&self, path: &str) -> Result<image::RgbaImage, LoadError> {
        let bytes = self.read(path)?;
        Ok(image::load_from_memory(&bytes)
            .map_err(|source| LoadError::Image {
                path: path.to_string(),
                source,
            })?
            .to_rgba8())
    }

    /// Whether every queued load has been performed.
    #[inline]
    pub fn is_loading_complete(&self) -> bool {
        self.to_load == 0
    }

    /// Number of loads still queued.
    #[inline]
    pub fn to_load(&self) -> usize {
        self.to_load
    }

    /// Number of loads performed, successful or not.
    #[inline]
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn get(&self, path: &str) -> Option<&Asset<T>> {
        self.assets.get(&self.full_path(path))
    }

    pub fn require(&self, path: &str) -> Result<&Asset<T>, LoadError> {
        let full = self.full_path(path);
        self.assets.get(&full).ok_or(LoadError::NotLoaded(full))
    }

    pub fn require_text(&self, path: &str) -> Result<&str, LoadError> {
        match self.require(path)? {
            Asset::Text(text) => Ok(text.as_str()),
            _ => Err(self.wrong_kind(path, "text")),
        }
    }

    pub fn require_binary(&self, path: &str) -> Result<&[u8], LoadError> {
        match self.require(path)? {
            Asset::Binary(data) => Ok(data.as_slice()),
            _ => Err(self.wrong_kind(path, "binary")),
        }
    }

    pub fn require_texture(&self, path: &str) -> Result<&T, LoadError> {
        match self.require(path)? {
            Asset::Texture(tex) => Ok(tex),
            _ => Err(self.wrong_kind(path, "a texture")),
        }
    }

    pub fn require_atlas(&self, path: &str) -> Result<&TextureAtlas<T>, LoadError> {
        match self.require(path)? {
            Asset::Atlas(atlas) => Ok(atlas),
            _ => Err(self.wrong_kind(path, "an atlas")),
        }
    }

    fn wrong_kind(&self, path: &str, expected: &'static str) -> LoadError {
        LoadError::WrongKind {
            path: self.full_path(path),
            expected,
        }
    }

    /// Errors of failed loads, keyed by full path.
    #[inline]
    pub fn errors(&self) -> &HashMap<String, LoadError> {
        &self.errors
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take an asset out of the manager.
    /// Textures removed this way are no longer disposed by the manager.
    pub fn remove(&mut self, path: &str) -> Option<Asset<T>> {
        let full = self.full_path(path);
        self.assets.remove(&full)
    }
}

impl<T, C> AssetManagerBase<T, C>
where
    T: AtlasTexture<Context = C>,
    C: ?Sized,
{
    /// Perform every queued load.
    pub fn update(&mut self, ctx: &mut C) {
        for (path, kind) in std::mem::take(&mut self.queue) {
            match self.load(ctx, &path, kind) {
                Ok(asset) => {
                    log::debug!("Loaded {} {}", asset.kind_name(), path);
                    self.errors.remove(&path);
                    self.assets.insert(path, asset);
                }
                Err(err) => {
                    log::warn!("{err}");
                    self.errors.insert(path, err);
                }
            }
            self.to_load -= 1;
            self.loaded += 1;
        }
    }

    fn load(&mut self, ctx: &mut C, path: &str, kind: Pending) -> Result<Asset<T>, LoadError> {
        Ok(match kind {
            Pending::Text => Asset::Text(self.read_text(path)?),
            Pending::Binary => Asset::Binary(self.read(path)?),
            Pending::Texture => {
                let image = self.read_image(path)?;
                Asset::Texture((self.texture_factory)(ctx, image, path))
            }
            Pending::Atlas => Asset::Atlas(self.load_atlas(ctx, path)?),
        })
    }

    fn load_atlas(&mut self, ctx: &mut C, path: &str) -> Result<TextureAtlas<T>, LoadError> {
        let text = self.read_text(path)?;
        let infos = atlas::parse_pages(&text).map_err(|source| LoadError::Atlas {
            path: path.to_string(),
            source,
        })?;
        let dir = path.rfind('/').map_or("", |idx| &path[..=idx]);

        let mut pages = Vec::with_capacity(infos.len());
        for info in infos {
            let page_path = format!("{dir}{}", info.name);
            let image = match self.read_image(&page_path) {
                Ok(image) => image,
                Err(err) => {
                    // pages loaded so far aren't reachable by anyone else
                    TextureAtlas::new(pages).dispose(ctx);
                    return Err(err);
                }
            };
            let mut texture = (self.texture_factory)(ctx, image, &page_path);
            texture.set_filters(ctx, info.min_filter, info.mag_filter);
            texture.set_wraps(ctx, info.u_wrap, info.v_wrap);
            log::debug!("Loaded atlas page {page_path}");
            pages.push(AtlasPage { info, texture });
        }
        Ok(TextureAtlas::new(pages))
    }

    /// Remove every asset, disposing textures and atlas pages.
    pub fn remove_all(&mut self, ctx: &mut C) {
        for (_, asset) in self.assets.drain() {
            match asset {
                Asset::Texture(tex) => tex.dispose(ctx),
                Asset::Atlas(atlas) => atlas.dispose(ctx),
                Asset::Text(_) | Asset::Binary(_) => {}
            }
        }
        self.errors.clear();
    }
}
