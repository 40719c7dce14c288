//! Vector page export
//!
//! Annotations are drawn in point space over an image scaled to the resolved
//! width. Output is a list of primitives plus a PDF content stream writer.

use std::fmt::Write;

use tiny_skia::{PathBuilder, PathSegment};

use super::SurfaceRenderer;
use super::geometry::{ANNOTATION_RGB, arrow, arrowhead, dot};
use crate::capture::ImageResolver;
use crate::domain::{
    Annotation, AnnotationSet, ImageContext, NaturalSize, Point, fmt_num, normalized_to_point,
    rendered_height_pt,
};

/// Caption font size, in points
pub const CAPTION_FONT_PT: f64 = 10.0;
/// Vertical space reserved below the image for a caption
pub const CAPTION_LINE_PT: f64 = 14.0;

/// A drawing primitive in point space, origin at the image's top-left
#[derive(Clone, Debug, PartialEq)]
pub enum VectorOp {
    Stroke {
        annotation_id: String,
        from: Point,
        to: Point,
    },
    Dot {
        annotation_id: String,
        center: Point,
        radius: f64,
    },
}

/// An image with its annotation layer, ready to be placed on a page
#[derive(Clone, Debug, PartialEq)]
pub struct VectorFigure {
    pub width_pt: f64,
    /// Height of the image box, caption excluded
    pub height_pt: f64,
    pub natural_size: NaturalSize,
    pub ops: Vec<VectorOp>,
    pub caption: Option<String>,
}

impl VectorFigure {
    /// Height including the caption line
    pub fn total_height_pt(&self) -> f64 {
        match self.caption {
            Some(_) => self.height_pt + CAPTION_LINE_PT,
            None => self.height_pt,
        }
    }

    /// PDF content stream drawing the figure with its top-left at
    /// (`x`, `y_top`) in page coordinates (origin bottom-left).
    ///
    /// `image_name` is the XObject resource of the image, if it is embedded.
    pub fn content_stream(&self, x: f64, y_top: f64, image_name: Option<&str>) -> String {
        let mut out = String::new();
        let (w, h) = (fmt_num(self.width_pt), fmt_num(self.height_pt));

        // Flip so the figure can be drawn top-down like the other surfaces
        let _ = writeln!(out, "q 1 0 0 -1 {} {} cm", fmt_num(x), fmt_num(y_top));
        if let Some(name) = image_name {
            let _ = writeln!(out, "q {w} 0 0 -{h} 0 {h} cm /{name} Do Q");
        }

        let [r, g, b] = ANNOTATION_RGB.map(|c| fmt_num(c as f64 / 255.0));
        let _ = writeln!(
            out,
            "{r} {g} {b} RG {r} {g} {b} rg {} w 1 J 1 j",
            fmt_num(arrow::STROKE_WIDTH)
        );
        for op in &self.ops {
            match op {
                VectorOp::Stroke { from, to, .. } => {
                    let _ = writeln!(
                        out,
                        "{} {} m {} {} l S",
                        fmt_num(from.x),
                        fmt_num(from.y),
                        fmt_num(to.x),
                        fmt_num(to.y)
                    );
                }
                VectorOp::Dot { center, radius, .. } => write_circle(&mut out, *center, *radius),
            }
        }
        out.push_str("Q\n");

        if let Some(caption) = &self.caption {
            let baseline = y_top - self.height_pt - CAPTION_FONT_PT;
            let _ = writeln!(
                out,
                "BT /F1 {} Tf {} {} Td ({}) Tj ET",
                fmt_num(CAPTION_FONT_PT),
                fmt_num(x),
                fmt_num(baseline),
                escape_pdf_string(caption)
            );
        }
        out
    }
}

/// Build a circle path using cubic bezier curves
fn build_circle_path(cx: f32, cy: f32, r: f32) -> Option<tiny_skia::Path> {
    let k = r * dot::BEZIER_K;
    let mut pb = PathBuilder::new();

    pb.move_to(cx, cy - r);
    pb.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy);
    pb.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r);
    pb.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy);
    pb.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r);
    pb.close();

    pb.finish()
}

fn write_circle(out: &mut String, center: Point, radius: f64) {
    let Some(path) = build_circle_path(center.x as f32, center.y as f32, radius as f32) else {
        log::debug!("Skipping degenerate dot at {:?}", center);
        return;
    };
    let num = |v: f32| fmt_num(v as f64);
    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                let _ = write!(out, "{} {} m ", num(p.x), num(p.y));
            }
            PathSegment::LineTo(p) => {
                let _ = write!(out, "{} {} l ", num(p.x), num(p.y));
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let _ = write!(
                    out,
                    "{} {} {} {} {} {} c ",
                    num(c1.x),
                    num(c1.y),
                    num(c2.x),
                    num(c2.y),
                    num(p.x),
                    num(p.y)
                );
            }
            // Never produced by build_circle_path
            PathSegment::QuadTo(_, p) => {
                let _ = write!(out, "{} {} l ", num(p.x), num(p.y));
            }
            PathSegment::Close => out.push_str("h "),
        }
    }
    out.push_str("f\n");
}

/// Escape a PDF literal string
fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Renders figures at a fixed width in points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorPageRenderer {
    pub width_pt: f64,
}

impl VectorPageRenderer {
    pub fn new(width_pt: f64) -> Self {
        Self {
            width_pt: width_pt.max(1.0),
        }
    }

    /// Like [`SurfaceRenderer::render`], but first resolves the image's
    /// natural size when it is not known yet.
    ///
    /// Resolution failure degrades to a square image box.
    pub async fn render_resolving(
        &self,
        image: &ImageContext,
        annotations: &AnnotationSet,
        resolver: &dyn ImageResolver,
    ) -> VectorFigure {
        if image.natural_size.is_some() || !image.has_url() {
            return self.render(image, annotations);
        }

        let natural = match resolver.resolve(&image.url).await {
            Ok(resolved) => resolved.natural_size,
            Err(e) => {
                log::warn!("Failed to resolve image {}: {}", image.url, e);
                NaturalSize::FALLBACK
            }
        };
        let image = image.clone().with_natural_size(natural);
        self.render(&image, annotations)
    }
}

impl SurfaceRenderer for VectorPageRenderer {
    type Output = VectorFigure;

    fn render(&self, image: &ImageContext, annotations: &AnnotationSet) -> VectorFigure {
        let natural = image.natural_size.unwrap_or(NaturalSize::FALLBACK);
        let width = self.width_pt;
        let height = rendered_height_pt(width, Some(natural));
        let head_length = arrow::HEAD_LENGTH_FRACTION * width;
        let to_pt = |p: Point| {
            Point::new(normalized_to_point(p.x, width), normalized_to_point(p.y, height))
        };

        let mut ops = Vec::new();
        // Arrows below dots, matching the other surfaces
        for annotation in annotations {
            if let Annotation::Arrow(a) = annotation {
                let from = to_pt(a.origin());
                let to = to_pt(a.terminus());
                let head = arrowhead(from, to, head_length, arrow::DEFAULT_WING_ANGLE_DEG);
                let id = a.id().to_string();
                ops.push(VectorOp::Stroke {
                    annotation_id: id.clone(),
                    from,
                    to: head.tip,
                });
                for wing in [head.left_wing, head.right_wing] {
                    ops.push(VectorOp::Stroke {
                        annotation_id: id.clone(),
                        from: head.tip,
                        to: wing,
                    });
                }
            }
        }
        for annotation in annotations {
            if let Annotation::Dot(d) = annotation {
                ops.push(VectorOp::Dot {
                    annotation_id: d.id().to_string(),
                    center: to_pt(d.position()),
                    radius: dot::RADIUS_PT,
                });
            }
        }

        VectorFigure {
            width_pt: width,
            height_pt: height,
            natural_size: natural,
            ops,
            caption: (!image.caption.is_empty()).then(|| image.caption.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::KnownSizes;
    use crate::domain::{Arrow, Dot};

    fn annotations() -> AnnotationSet {
        AnnotationSet::from(vec![
            Annotation::Dot(Dot::new("d", Point::new(0.5, 0.5))),
            Annotation::Arrow(Arrow::new("a", Point::new(0.0, 0.5), Point::new(1.0, 0.5))),
        ])
    }

    #[test]
    fn test_render_point_space() {
        let ctx = ImageContext::new("a.png").with_natural_size(NaturalSize::new(400, 200));
        let figure = VectorPageRenderer::new(500.0).render(&ctx, &annotations());
        assert_eq!(figure.height_pt, 250.0);
        assert_eq!(figure.ops.len(), 4);

        let VectorOp::Stroke { from, to, .. } = &figure.ops[0] else {
            panic!("expected the shaft first");
        };
        assert_eq!(*from, Point::new(0.0, 125.0));
        assert_eq!(*to, Point::new(500.0, 125.0));

        let VectorOp::Stroke { to: wing, .. } = &figure.ops[1] else {
            panic!("expected a head stroke");
        };
        let head = 0.022 * 500.0;
        assert!((to.distance(*wing) - head).abs() < 1e-9);

        assert_eq!(
            figure.ops[3],
            VectorOp::Dot {
                annotation_id: "d".to_string(),
                center: Point::new(250.0, 125.0),
                radius: 5.0,
            }
        );
    }

    #[test]
    fn test_unknown_size_is_square() {
        let ctx = ImageContext::new("a.png");
        let figure = VectorPageRenderer::new(300.0).render(&ctx, &AnnotationSet::new());
        assert_eq!(figure.height_pt, 300.0);
        assert_eq!(figure.natural_size, NaturalSize::FALLBACK);
        assert!(figure.ops.is_empty());
    }

    #[tokio::test]
    async fn test_render_resolving() {
        let mut known = KnownSizes::new();
        known.insert("a.png", NaturalSize::new(100, 300));
        let renderer = VectorPageRenderer::new(100.0);

        let figure = renderer
            .render_resolving(&ImageContext::new("a.png"), &annotations(), &known)
            .await;
        assert_eq!(figure.height_pt, 300.0);

        let figure = renderer
            .render_resolving(&ImageContext::new("missing.png"), &annotations(), &known)
            .await;
        assert_eq!(figure.height_pt, 100.0);
    }

    #[test]
    fn test_content_stream() {
        let ctx = ImageContext::new("a.png")
            .with_natural_size(NaturalSize::new(200, 100))
            .with_caption("Fig (1)");
        let figure = VectorPageRenderer::new(200.0).render(&ctx, &annotations());
        let stream = figure.content_stream(35.0, 800.0, Some("Im0"));

        assert!(stream.starts_with("q 1 0 0 -1 35 800 cm\n"));
        assert!(stream.contains("q 200 0 0 -100 0 100 cm /Im0 Do Q\n"));
        assert!(stream.contains("1 0.4784 0 RG 1 0.4784 0 rg 3 w 1 J 1 j\n"));
        assert!(stream.contains("0 50 m 200 50 l S\n"));
        assert!(stream.contains("100 45 m "));
        assert_eq!(stream.matches(" c ").count(), 4);
        assert!(stream.contains("h f\n"));
        assert!(stream.ends_with("BT /F1 10 Tf 35 690 Td (Fig \\(1\\)) Tj ET\n"));
        assert_eq!(figure.total_height_pt(), 114.0);
    }

    #[test]
    fn test_content_stream_without_image() {
        let figure =
            VectorPageRenderer::new(50.0).render(&ImageContext::new("x"), &AnnotationSet::new());
        let stream = figure.content_stream(0.0, 0.0, None);
        assert!(!stream.contains("Do"));
        assert!(!stream.contains("BT"));
    }
}
