//! Full-document markup export

use super::document::{Block, Document};
use crate::capture::ImageResolver;
use crate::domain::{ImageContext, ImageSource};
use crate::render::{MarkupFragment, StaticMarkupRenderer, SurfaceRenderer};

/// Image context for `block`, with the natural size filled in when the
/// resolver knows it
pub async fn resolve_context(block: &Block, resolver: Option<&dyn ImageResolver>) -> ImageContext {
    let mut ctx = block.image_context();
    let Some(resolver) = resolver.filter(|_| ctx.has_url()) else {
        return ctx;
    };
    match resolver.resolve(&ctx.url).await {
        Ok(resolved) => {
            ctx.natural_size = Some(resolved.natural_size);
            ctx.source = ImageSource::Resolved {
                download_url: resolved.download_url,
            };
        }
        Err(e) => {
            log::warn!("Failed to resolve image for block {}: {}", block.id, e);
            ctx.source = ImageSource::Failed;
        }
    }
    ctx
}

pub fn render_block(block: &Block, ctx: &ImageContext) -> MarkupFragment {
    StaticMarkupRenderer.render(ctx, &block.annotations())
}

/// One figure per image block, depth-first in document order, joined by
/// newlines. Without a resolver every image is laid out as a square.
pub async fn export_markup(doc: &Document, resolver: Option<&dyn ImageResolver>) -> String {
    let mut fragments = Vec::new();
    for block in doc.walk().into_iter().filter(|b| b.is_image()) {
        let ctx = resolve_context(block, resolver).await;
        fragments.push(render_block(block, &ctx).into_string());
    }
    log::debug!("Exported {} figures", fragments.len());
    fragments.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::KnownSizes;
    use crate::domain::NaturalSize;

    fn doc() -> Document {
        Document::new(vec![
            Block::new("p", "paragraph"),
            Block::new("i", "image").with_prop("url", "a.png"),
            Block::new("g", "group"),
            Block::new("e", "annotated_image"),
        ])
    }

    #[tokio::test]
    async fn test_export_in_document_order() {
        let mut doc = doc();
        if let Some(group) = doc.find_mut("g") {
            group.children.push(
                Block::new("n", "annotated_image")
                    .with_prop("url", "n.png")
                    .with_prop("annotations", r#"[{"type":"dot","id":"x","x":0.1,"y":0.2}]"#),
            );
        }
        let out = export_markup(&doc, None).await;
        let parts: Vec<&str> = out.split('\n').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains(r#"src="a.png""#));
        assert!(parts[1].contains(r#"src="n.png""#));
        assert!(parts[1].contains("left:10%;top:20%"));
        assert_eq!(parts[2], "<p>Add image</p>");
    }

    #[tokio::test]
    async fn test_export_uses_resolved_aspect() {
        let mut known = KnownSizes::new();
        known.insert("a.png", NaturalSize::new(400, 100));
        let out = export_markup(&doc(), Some(&known)).await;
        assert!(out.contains(r#"viewBox="0 0 100 25""#));

        let out = export_markup(&doc(), Some(&KnownSizes::new())).await;
        assert!(out.contains(r#"viewBox="0 0 100 100""#));
    }
}
