//! Snapshot of the host editor's block tree
//!
//! Blocks are kept as loosely typed JSON so that properties and fields this
//! crate does not know about survive a load/save cycle.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::annotations::BlockPropertyStore;
use crate::domain::{AnnotationSet, ImageContext};

pub const IMAGE: &str = "image";
pub const ANNOTATED_IMAGE: &str = "annotated_image";

/// Block property holding the encoded annotation set
pub const ANNOTATIONS_PROP: &str = "annotations";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Numbers, and strings holding numbers
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.kind == ANNOTATED_IMAGE
    }

    /// Plain and annotated images
    pub fn is_image(&self) -> bool {
        self.kind == IMAGE || self.is_annotated()
    }

    pub fn image_context(&self) -> ImageContext {
        let mut ctx = ImageContext::new(self.prop_str("url").unwrap_or_default());
        ctx.preview_width_px = self.prop_f64("previewWidth");
        ctx.caption = self.prop_str("caption").unwrap_or_default().to_string();
        ctx.name = self.prop_str("name").unwrap_or_default().to_string();
        ctx
    }

    /// Plain images carry no annotations
    pub fn annotations(&self) -> AnnotationSet {
        if self.is_annotated() {
            AnnotationSet::decode(self.prop_str(ANNOTATIONS_PROP))
        } else {
            AnnotationSet::new()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("parsing document")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing document")
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Every block, depth-first in document order
    pub fn walk(&self) -> Vec<&Block> {
        fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for block in blocks {
                out.push(block);
                visit(&block.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.blocks, &mut out);
        out
    }

    pub fn find(&self, id: &str) -> Option<&Block> {
        self.walk().into_iter().find(|b| b.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Block> {
        fn search<'a>(blocks: &'a mut [Block], id: &str) -> Option<&'a mut Block> {
            for block in blocks {
                if block.id == id {
                    return Some(block);
                }
                if let Some(found) = search(&mut block.children, id) {
                    return Some(found);
                }
            }
            None
        }
        search(&mut self.blocks, id)
    }

    /// Replace an `image` block with an `annotated_image` showing the same
    /// picture and no annotations. Returns false if there is no such block.
    pub fn convert_to_annotated(&mut self, id: &str) -> bool {
        let Some(block) = self.find_mut(id) else {
            return false;
        };
        if block.kind != IMAGE {
            log::debug!("Block {} is {:?}, not an image", id, block.kind);
            return false;
        }

        let old = std::mem::take(&mut block.props);
        let text = |key: &str, default: &str| {
            old.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let mut props = Map::new();
        props.insert("url".into(), text("url", "").into());
        if let Some(width) = old.get("previewWidth") {
            props.insert("previewWidth".into(), width.clone());
        }
        props.insert("caption".into(), text("caption", "").into());
        props.insert("name".into(), text("name", "").into());
        props.insert("textAlignment".into(), text("textAlignment", "left").into());
        props.insert("backgroundColor".into(), text("backgroundColor", "default").into());
        props.insert("showPreview".into(), true.into());
        props.insert(ANNOTATIONS_PROP.into(), "[]".into());

        block.kind = ANNOTATED_IMAGE.to_string();
        block.props = props;
        true
    }

    /// Overwrite `previewWidth` of image blocks with widths measured in the
    /// editor, keyed by block id.
    pub fn apply_measured_widths(&mut self, measured: &HashMap<String, f64>) {
        fn apply(blocks: &mut [Block], measured: &HashMap<String, f64>) {
            for block in blocks {
                let width = measured.get(&block.id).filter(|w| w.is_finite());
                if let (true, Some(width)) = (block.is_image(), width) {
                    let width = width.round().max(1.0) as u64;
                    block.props.insert("previewWidth".into(), width.into());
                }
                apply(&mut block.children, measured);
            }
        }
        apply(&mut self.blocks, measured);
    }
}

impl BlockPropertyStore for Document {
    fn get(&self, block_id: &str) -> Option<String> {
        self.find(block_id)
            .filter(|b| b.is_annotated())
            .and_then(|b| b.prop_str(ANNOTATIONS_PROP))
            .map(str::to_string)
    }

    fn set(&mut self, block_id: &str, value: String) {
        match self.find_mut(block_id) {
            Some(block) if block.is_annotated() => {
                block.props.insert(ANNOTATIONS_PROP.into(), value.into());
            }
            _ => log::warn!("No annotated image block {}", block_id),
        }
    }
}
