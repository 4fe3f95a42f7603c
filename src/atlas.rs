//! Texture atlas pages.
//!
//! Only the page headers of an atlas file are read here,
//! which is all that's needed to load and configure page textures.
//! Regions are left to the animation runtime.

use crate::runtime::{AtlasTexture, TextureConfigError, TextureFilter, TextureWrap};

/// Settings of one atlas page as written in the atlas file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtlasPageInfo {
    /// Image file name, relative to the atlas file.
    pub name: String,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub u_wrap: TextureWrap,
    pub v_wrap: TextureWrap,
}

impl AtlasPageInfo {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            min_filter: TextureFilter::Nearest,
            mag_filter: TextureFilter::Nearest,
            u_wrap: TextureWrap::ClampToEdge,
            v_wrap: TextureWrap::ClampToEdge,
        }
    }
}

/// Read the page headers of an atlas file.
///
/// A page starts with its image name after a blank line (or at the start of the file)
/// and its header is the `key: value` lines that follow,
/// up to the first region name.
pub fn parse_pages(text: &str) -> Result<Vec<AtlasPageInfo>, TextureConfigError> {
    let mut pages: Vec<AtlasPageInfo> = Vec::new();
    let mut expect_page = true;
    let mut in_header = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            expect_page = true;
            in_header = false;
            continue;
        }
        if expect_page {
            pages.push(AtlasPageInfo::new(line));
            expect_page = false;
            in_header = true;
            continue;
        }
        if !in_header {
            continue;
        }
        let (Some((key, value)), Some(page)) = (line.split_once(':'), pages.last_mut()) else {
            in_header = false;
            continue;
        };

        let value = value.trim();
        match key.trim() {
            "filter" => {
                let (min, mag) = value.split_once(',').unwrap_or((value, value));
                page.min_filter = min.trim().parse()?;
                page.mag_filter = mag.trim().parse()?;
            }
            "repeat" => {
                use TextureWrap::{ClampToEdge, Repeat};
                (page.u_wrap, page.v_wrap) = match value {
                    "x" => (Repeat, ClampToEdge),
                    "y" => (ClampToEdge, Repeat),
                    "xy" => (Repeat, Repeat),
                    _ => (ClampToEdge, ClampToEdge),
                };
            }
            _ => {}
        }
    }

    Ok(pages)
}

/// An atlas page with its texture loaded.
#[derive(Debug)]
pub struct AtlasPage<T> {
    pub info: AtlasPageInfo,
    pub texture: T,
}

/// The loaded pages of an atlas file, in file order.
#[derive(Debug)]
pub struct TextureAtlas<T> {
    pages: Vec<AtlasPage<T>>,
}

impl<T> TextureAtlas<T> {
    pub fn new(pages: Vec<AtlasPage<T>>) -> Self {
        Self { pages }
    }

    #[inline]
    pub fn pages(&self) -> &[AtlasPage<T>] {
        &self.pages
    }

    /// Find a page by its image name.
    pub fn page(&self, name: &str) -> Option<&AtlasPage<T>> {
        self.pages.iter().find(|page| page.info.name == name)
    }

    pub fn into_pages(self) -> Vec<AtlasPage<T>> {
        self.pages
    }
}

impl<T: AtlasTexture> TextureAtlas<T> {
    /// Dispose every page texture.
    pub fn dispose(self, ctx: &mut T::Context) {
        for page in self.pages {
            page.texture.dispose(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_headers_are_read() {
        let text = "
hero.png
size: 64,64
format: RGBA8888
filter: MipMapLinearLinear,Linear
repeat: xy
head
  rotate: false
  xy: 2, 2
  size: 10, 10

hero2.png
size: 32,32
filter: Linear,Linear
repeat: y
body
bounds: 0,0,10,10
offsets: 0,0,10,10

hero3.png
pma: true
";
        let pages = parse_pages(text).unwrap();
        itertools::assert_equal(
            pages.iter().map(|p| p.name.as_str()),
            ["hero.png", "hero2.png", "hero3.png"],
        );

        assert_eq!(pages[0].min_filter, TextureFilter::MipMapLinearLinear);
        assert_eq!(pages[0].mag_filter, TextureFilter::Linear);
        assert_eq!(
            (pages[0].u_wrap, pages[0].v_wrap),
            (TextureWrap::Repeat, TextureWrap::Repeat)
        );
        assert_eq!(
            (pages[1].u_wrap, pages[1].v_wrap),
            (TextureWrap::ClampToEdge, TextureWrap::Repeat)
        );
        // no header values means defaults
        assert_eq!(pages[2], AtlasPageInfo::new("hero3.png"));
    }

    #[test]
    fn region_fields_are_not_page_settings() {
        // a region's "filter"-like keys come after the region name and must be ignored
        let text = "page.png\nfilter: Nearest,Nearest\nregion\nrepeat: xy\n";
        let pages = parse_pages(text).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].u_wrap, TextureWrap::ClampToEdge);
    }

    #[test]
    fn unknown_filter_names_are_errors() {
        assert_eq!(
            parse_pages("page.png\nfilter: Linear,Bicubic\n"),
            Err(TextureConfigError::UnknownFilterName("Bicubic".to_string()))
        );
    }
}
