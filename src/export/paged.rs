//! Paginated vector export
//!
//! Image blocks are laid out top to bottom inside the page padding. A figure
//! is never split: one that does not fit the remaining space starts a new
//! page. Each page yields a PDF content stream and the image XObjects it
//! draws.

use serde::Serialize;

use super::document::{Block, Document};
use crate::capture::ImageResolver;
use crate::render::{PageLayout, VectorFigure, VectorPageRenderer, WidthResolver};

/// Image XObject referenced from a page's content stream
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageImage {
    /// Resource name, e.g. `Im0`
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Page {
    pub content: String,
    pub images: Vec<PageImage>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PagedExport {
    pub width_pt: f64,
    pub height_pt: f64,
    pub pages: Vec<Page>,
}

/// Horizontal placement taken from the block's `textAlignment`
fn figure_x(block: &Block, layout: &PageLayout, width_pt: f64) -> f64 {
    let free = (layout.printable_width_pt() - width_pt).max(0.0);
    let offset = match block.prop_str("textAlignment") {
        Some("center") => free / 2.0,
        Some("right") => free,
        _ => 0.0,
    };
    layout.padding_horizontal_pt + offset
}

struct Cursor {
    layout: PageLayout,
    pages: Vec<Page>,
    y_top: f64,
}

impl Cursor {
    fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            pages: vec![Page::default()],
            y_top: layout.height_pt - layout.padding_vertical_pt,
        }
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().is_none_or(|p| p.content.is_empty())
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y_top = self.layout.height_pt - self.layout.padding_vertical_pt;
    }

    /// Place a figure, returning its top-left corner
    fn place(&mut self, height_pt: f64, spacing_pt: f64) -> f64 {
        let bottom = self.layout.padding_vertical_pt;
        if self.y_top - height_pt < bottom && !self.page_is_empty() {
            self.new_page();
        }
        if height_pt > self.layout.printable_height_pt() {
            log::debug!("Figure of {}pt overflows the page", height_pt);
        }
        let y_top = self.y_top;
        self.y_top -= height_pt + spacing_pt;
        y_top
    }
}

/// Lays out every image block of a document
pub struct PagedExporter<'a> {
    widths: WidthResolver,
    block_spacing_pt: f64,
    images: &'a dyn ImageResolver,
}

impl<'a> PagedExporter<'a> {
    pub fn new(
        widths: WidthResolver,
        block_spacing_pt: f64,
        images: &'a dyn ImageResolver,
    ) -> Self {
        Self {
            widths,
            block_spacing_pt: block_spacing_pt.max(0.0),
            images,
        }
    }

    /// Render one block's figure, resolving the image's natural size
    pub async fn figure(&self, block: &Block) -> VectorFigure {
        let ctx = block.image_context();
        let width_pt = self.widths.resolve(ctx.desired_width_px());
        VectorPageRenderer::new(width_pt)
            .render_resolving(&ctx, &block.annotations(), self.images)
            .await
    }

    pub async fn export(&self, doc: &Document) -> PagedExport {
        let layout = self.widths.layout;
        let mut cursor = Cursor::new(layout);

        for block in doc.walk().into_iter().filter(|b| b.is_image()) {
            let Some(url) = block.prop_str("url").filter(|u| !u.is_empty()) else {
                log::debug!("Skipping image block {} without a URL", block.id);
                continue;
            };
            let figure = self.figure(block).await;
            let y_top = cursor.place(figure.total_height_pt(), self.block_spacing_pt);
            let x = figure_x(block, &layout, figure.width_pt);

            let Some(page) = cursor.pages.last_mut() else {
                continue;
            };
            let name = format!("Im{}", page.images.len());
            page.content.push_str(&figure.content_stream(x, y_top, Some(&name)));
            page.images.push(PageImage {
                name,
                url: url.to_string(),
            });
        }

        log::debug!("Laid out {} pages", cursor.pages.len());
        PagedExport {
            width_pt: layout.width_pt,
            height_pt: layout.height_pt,
            pages: cursor.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::KnownSizes;
    use crate::domain::NaturalSize;

    /// 180 x 280pt printable area, editor exactly as wide
    fn widths() -> WidthResolver {
        let layout = PageLayout {
            width_pt: 200.0,
            height_pt: 300.0,
            padding_horizontal_pt: 10.0,
            padding_vertical_pt: 10.0,
            px_per_pt: 0.75,
        };
        WidthResolver::new(240.0, layout)
    }

    fn image(id: &str, url: &str) -> Block {
        Block::new(id, "image").with_prop("url", url)
    }

    #[tokio::test]
    async fn test_figures_never_split() {
        let mut known = KnownSizes::new();
        known.insert("wide.png", NaturalSize::new(200, 100));
        let doc = Document::new(vec![
            image("a", "wide.png"),
            image("b", "wide.png"),
            image("c", "wide.png"),
        ]);
        let export = PagedExporter::new(widths(), 6.0, &known).export(&doc).await;

        assert_eq!(export.pages.len(), 2);
        assert_eq!(export.pages[0].images.len(), 2);
        assert_eq!(export.pages[1].images.len(), 1);
        assert_eq!(export.pages[1].images[0].name, "Im0");
        assert!(export.pages[0].content.starts_with("q 1 0 0 -1 10 290 cm\n"));
        assert!(export.pages[0].content.contains("q 1 0 0 -1 10 194 cm\n"));
        assert!(export.pages[1].content.starts_with("q 1 0 0 -1 10 290 cm\n"));
    }

    #[tokio::test]
    async fn test_narrow_image_alignment_and_skips() {
        let known = KnownSizes::new();
        let doc = Document::new(vec![
            Block::new("p", "paragraph"),
            Block::new("empty", "image"),
            image("n", "sq.png")
                .with_prop("previewWidth", 120)
                .with_prop("textAlignment", "center"),
        ]);
        let export = PagedExporter::new(widths(), 6.0, &known).export(&doc).await;

        assert_eq!(export.pages.len(), 1);
        let page = &export.pages[0];
        assert_eq!(
            page.images,
            vec![PageImage {
                name: "Im0".into(),
                url: "sq.png".into()
            }]
        );
        // 120px -> 90pt, centred in 180pt; unresolved images are square
        assert!(page.content.starts_with("q 1 0 0 -1 55 290 cm\n"));
        assert!(page.content.contains("q 90 0 0 -90 0 90 cm /Im0 Do Q\n"));
    }

    #[tokio::test]
    async fn test_annotations_in_content_and_json() {
        let known = KnownSizes::new();
        let doc = Document::new(vec![
            Block::new("ai", "annotated_image")
                .with_prop("url", "x.png")
                .with_prop(
                    "annotations",
                    r#"[{"type":"arrow","id":"a","x":0,"y":0.5,"x2":1,"y2":0.5}]"#,
                ),
        ]);
        let export = PagedExporter::new(widths(), 6.0, &known).export(&doc).await;
        assert!(export.pages[0].content.contains("0 90 m 180 90 l S\n"));

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["pages"][0]["images"][0]["url"], "x.png");
        assert_eq!(json["width_pt"], 200.0);
    }

    #[tokio::test]
    async fn test_empty_document_has_one_blank_page() {
        let known = KnownSizes::new();
        let export = PagedExporter::new(widths(), 6.0, &known)
            .export(&Document::default())
            .await;
        assert_eq!(export.pages, vec![Page::default()]);
    }
}
