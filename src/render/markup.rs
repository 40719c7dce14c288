//! Static markup export
//!
//! Produces a self-contained `<figure>` whose overlay uses the same percentage
//! positioning as the live editor. Output is a pure function of its input.

use std::fmt::Write;

use super::SurfaceRenderer;
use super::geometry::{ArrowHead, PercentSpace, annotation_hex, arrow, dot};
use crate::domain::{Annotation, AnnotationSet, ImageContext, Point, fmt_num, normalized_to_percent};

/// A rendered HTML fragment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupFragment(pub String);

impl MarkupFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Arrow primitives in [`PercentSpace`] units
#[derive(Clone, Debug, PartialEq)]
pub struct MarkupArrow {
    pub id: String,
    pub from: Point,
    pub head: ArrowHead,
}

/// Geometry of the fragment before it is written out
#[derive(Clone, Debug, PartialEq)]
pub struct MarkupScene {
    pub space: PercentSpace,
    pub arrows: Vec<MarkupArrow>,
    /// Dots keep normalized positions; they are placed with CSS percentages
    pub dots: Vec<(String, Point)>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StaticMarkupRenderer;

impl StaticMarkupRenderer {
    /// Compute the primitives without writing any markup
    pub fn scene(&self, image: &ImageContext, annotations: &AnnotationSet) -> MarkupScene {
        let space = PercentSpace::new(image.aspect());
        let mut scene = MarkupScene {
            space,
            arrows: Vec::new(),
            dots: Vec::new(),
        };
        for annotation in annotations {
            match annotation {
                Annotation::Dot(d) => scene.dots.push((d.id().to_string(), d.position())),
                Annotation::Arrow(a) => scene.arrows.push(MarkupArrow {
                    id: a.id().to_string(),
                    from: space.project(a.origin()),
                    head: space.arrowhead(a.origin(), a.terminus()),
                }),
            }
        }
        scene
    }
}

impl SurfaceRenderer for StaticMarkupRenderer {
    type Output = MarkupFragment;

    fn render(&self, image: &ImageContext, annotations: &AnnotationSet) -> MarkupFragment {
        if !image.has_url() {
            return MarkupFragment("<p>Add image</p>".to_string());
        }

        let scene = self.scene(image, annotations);
        let color = annotation_hex();
        let mut html = String::new();

        html.push_str(r#"<figure style="position:relative;display:inline-block;margin:0">"#);
        html.push_str(r#"<div style="position:relative">"#);
        write_img(&mut html, image);

        html.push_str(r#"<div style="position:absolute;inset:0">"#);
        let _ = write!(
            html,
            r#"<svg width="100%" height="100%" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;inset:0;overflow:visible">"#,
            fmt_num(scene.space.width()),
            fmt_num(scene.space.height()),
        );
        for a in &scene.arrows {
            let [tip, left, right] = a.head.points();
            let _ = write!(
                html,
                r#"<g data-annotation-id="{id}"><line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{color}" stroke-width="{w}" vector-effect="non-scaling-stroke"/><polygon points="{points}" fill="{color}"/></g>"#,
                id = escape_html(&a.id),
                x1 = fmt_num(a.from.x),
                y1 = fmt_num(a.from.y),
                x2 = fmt_num(tip.x),
                y2 = fmt_num(tip.y),
                w = fmt_num(arrow::STROKE_WIDTH),
                points = [tip, left, right]
                    .iter()
                    .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        html.push_str("</svg>");

        let size = fmt_num(dot::MARKER_PX);
        for (id, position) in &scene.dots {
            let _ = write!(
                html,
                r#"<div data-annotation-id="{id}" style="position:absolute;left:{left};top:{top};transform:translate(-50%, -50%);width:{size}px;height:{size}px;border-radius:999px;background:{color};border:2px solid white;box-shadow:0 0 0 1px {color}"></div>"#,
                id = escape_html(id),
                left = normalized_to_percent(position.x),
                top = normalized_to_percent(position.y),
            );
        }
        html.push_str("</div></div>");

        if !image.caption.is_empty() {
            let _ = write!(html, "<figcaption>{}</figcaption>", escape_html(&image.caption));
        }
        html.push_str("</figure>");

        MarkupFragment(html)
    }
}

/// `<img>` with a pixel width kept inline so it survives without stylesheets
fn write_img(html: &mut String, image: &ImageContext) {
    let _ = write!(
        html,
        r#"<img src="{}" alt="{}""#,
        escape_html(image.display_src()),
        escape_html(image.alt_text())
    );
    match image.desired_width_px() {
        Some(width) => {
            let width = fmt_num(width);
            let _ = write!(
                html,
                r#" width="{width}" style="display:block;width:{width}px;height:auto">"#
            );
        }
        None => html.push_str(r#" style="display:block;width:100%;height:auto">"#),
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
