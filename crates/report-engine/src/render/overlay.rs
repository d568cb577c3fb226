//! Page records and the stamping pass
//!
//! The layout pass produces one [`PageRecord`] per page: the drawing
//! operations that are already final plus placeholders for anything that
//! depends on document totals. Stamping is a pure function of a record and
//! the totals, so pages are never revisited after they are committed.

use serde::{Deserialize, Serialize};

use crate::layout::fonts::{text_width, FontFace};
use crate::layout::styles::{ParagraphStyle, Rgb, StyleName, StyleSheet};
use crate::layout::templates::{PageTemplateSet, TemplateKind};
use crate::layout::toc::TocEntry;

/// One drawing primitive in page coordinates (points, origin bottom-left)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline
        y: f32,
        font: FontFace,
        size: f32,
        color: Rgb,
        text: String,
        /// Extra space added to each ASCII space, for justified lines
        word_spacing: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
        line_width: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
        width: f32,
    },
    Image {
        resource: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawOp {
    pub fn text(x: f32, y: f32, style: &ParagraphStyle, text: &str, word_spacing: f32) -> Self {
        DrawOp::Text {
            x,
            y,
            font: style.font,
            size: style.size,
            color: style.color,
            text: text.to_string(),
            word_spacing,
        }
    }
}

/// Content whose text is only known after the layout pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deferred {
    /// Contents entries, drawn downward from `top` across `width`
    TableOfContents { x: f32, top: f32, width: f32 },
}

/// Snapshot of one laid-out page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based
    pub number: usize,
    pub template: TemplateKind,
    pub ops: Vec<DrawOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<Deferred>,
}

impl PageRecord {
    pub fn new(number: usize, template: TemplateKind) -> Self {
        Self {
            number,
            template,
            ops: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Nothing has been drawn or reserved on this page
    pub fn is_blank(&self) -> bool {
        self.ops.is_empty() && self.deferred.is_empty()
    }
}

/// Totals and lookups available once the layout pass is complete
pub struct StampContext<'a> {
    pub styles: &'a StyleSheet,
    pub templates: &'a PageTemplateSet,
    pub total_pages: usize,
    /// Preformatted generation date for the footer
    pub generated_on: &'a str,
    pub toc: &'a [TocEntry],
}

/// A page ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPage {
    pub number: usize,
    pub template: TemplateKind,
    pub ops: Vec<DrawOp>,
}

/// Resolve a recorded page against the document totals
pub fn stamp(record: &PageRecord, ctx: &StampContext<'_>) -> StampedPage {
    let template = ctx.templates.get(record.template);
    let mut ops = record.ops.clone();
    for deferred in &record.deferred {
        ops.extend(resolve(deferred, ctx));
    }
    ops.extend(template.decorations(
        record.number,
        ctx.total_pages,
        ctx.generated_on,
        ctx.styles,
    ));
    StampedPage {
        number: record.number,
        template: record.template,
        ops,
    }
}

/// Stamp every page in order; an empty record list stamps nothing
pub fn stamp_all(records: &[PageRecord], ctx: &StampContext<'_>) -> Vec<StampedPage> {
    records.iter().map(|record| stamp(record, ctx)).collect()
}

/// Vertical space one contents entry occupies
pub fn toc_row_height(styles: &StyleSheet) -> f32 {
    let style = styles.get(StyleName::TocEntry);
    style.space_before + style.leading + style.space_after
}

fn resolve(deferred: &Deferred, ctx: &StampContext<'_>) -> Vec<DrawOp> {
    match deferred {
        Deferred::TableOfContents { x, top, width } => {
            let style = ctx.styles.get(StyleName::TocEntry);
            let row = toc_row_height(ctx.styles);
            let mut ops = Vec::with_capacity(ctx.toc.len() * 2);
            for (i, entry) in ctx.toc.iter().enumerate() {
                let baseline = top - i as f32 * row - style.space_before - style.size;
                ops.push(DrawOp::text(*x, baseline, style, &entry.leader(), 0.0));
                let page = entry.page.to_string();
                let page_x = x + width - text_width(&page, style.font, style.size);
                ops.push(DrawOp::text(page_x, baseline, style, &page, 0.0));
            }
            ops
        }
    }
}
