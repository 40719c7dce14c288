//! Read-only image bundle handed to every surface renderer

/// Natural pixel dimensions of a decoded image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    /// Used whenever the real dimensions cannot be determined
    pub const FALLBACK: NaturalSize = NaturalSize {
        width: 1,
        height: 1,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height over width. Degenerate sizes behave like the square fallback.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.height as f64 / self.width as f64
    }
}

/// Resolution state of the image bytes behind a block's URL
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ImageSource {
    /// Not resolved yet; surfaces show the raw URL
    #[default]
    Pending,
    Resolved {
        download_url: String,
    },
    Failed,
}

/// Everything a surface needs to know about the image under the annotations
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageContext {
    /// URL stored on the block
    pub url: String,
    pub source: ImageSource,
    /// Known once the image has been decoded
    pub natural_size: Option<NaturalSize>,
    /// Width the user gave the preview in the editor; `None` means full width
    pub preview_width_px: Option<f64>,
    pub caption: String,
    /// File name, preferred over the caption for alt text
    pub name: String,
}

impl ImageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_natural_size(mut self, size: NaturalSize) -> Self {
        self.natural_size = Some(size);
        self
    }

    pub fn with_preview_width(mut self, width_px: f64) -> Self {
        self.preview_width_px = Some(width_px);
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Source the live editor should display
    pub fn display_src(&self) -> &str {
        match &self.source {
            ImageSource::Resolved { download_url } => download_url,
            ImageSource::Pending | ImageSource::Failed => &self.url,
        }
    }

    /// Height over width, square when unknown
    pub fn aspect(&self) -> f64 {
        self.natural_size.unwrap_or(NaturalSize::FALLBACK).aspect()
    }

    pub fn alt_text(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.caption.is_empty() {
            &self.caption
        } else {
            "Annotated image"
        }
    }

    /// Preview width with zero/negative/non-finite values treated as absent
    pub fn desired_width_px(&self) -> Option<f64> {
        self.preview_width_px.filter(|w| w.is_finite() && *w > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_falls_back_to_square() {
        assert_eq!(NaturalSize::new(400, 200).aspect(), 0.5);
        assert_eq!(NaturalSize::new(0, 200).aspect(), 1.0);
        assert_eq!(ImageContext::new("a.png").aspect(), 1.0);
    }

    #[test]
    fn test_display_src_prefers_resolved_url() {
        let mut ctx = ImageContext::new("blob:raw");
        assert_eq!(ctx.display_src(), "blob:raw");
        ctx.source = ImageSource::Resolved {
            download_url: "https://cdn/x.png".to_string(),
        };
        assert_eq!(ctx.display_src(), "https://cdn/x.png");
    }

    #[test]
    fn test_alt_text_order() {
        let mut ctx = ImageContext::new("a.png").with_caption("A caption");
        assert_eq!(ctx.alt_text(), "A caption");
        ctx.name = "a.png".to_string();
        assert_eq!(ctx.alt_text(), "a.png");
        assert_eq!(ImageContext::new("a.png").alt_text(), "Annotated image");
    }

    #[test]
    fn test_desired_width_ignores_zero() {
        assert_eq!(ImageContext::new("a").with_preview_width(0.0).desired_width_px(), None);
        assert_eq!(
            ImageContext::new("a").with_preview_width(320.0).desired_width_px(),
            Some(320.0)
        );
    }
}
