//! First render pass: flow content into page records
//!
//! Flowables are placed top to bottom in the frame of the current page's
//! template. A page is started lazily when something needs to be drawn and
//! its template is chosen at that moment, so a template switch queued with
//! [`Flowable::NextTemplate`] takes effect on the next page that starts and
//! never on the one already in progress.

use tracing::{debug, warn};

use super::fonts::{text_width, wrap_text};
use super::styles::{Alignment, BoxStyle, ParagraphStyle, StyleName, StyleSheet, INCH};
use super::templates::{
    select_template, DocumentPhase, Frame, PageTemplateSet, PAGE_HEIGHT, PAGE_WIDTH,
};
use crate::errors::RenderError;
use crate::render::overlay::{toc_row_height, Deferred, DrawOp, PageRecord};
use crate::render::resources::ResourceLookup;
use crate::text::LayoutBlock;

const EPSILON: f32 = 0.01;
const TABLE_LABEL_WIDTH: f32 = 1.5 * INCH;
const TABLE_CELL_PADDING: f32 = 8.0;
const TABLE_GAP: f32 = 0.3 * INCH;

/// One unit of document content
#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Block(LayoutBlock),
    Text { text: String, style: StyleName },
    Spacer(f32),
    PageBreak,
    /// Queue the phase for the next page that starts
    NextTemplate(DocumentPhase),
    /// The next drawn content starts the named section
    SectionStart(String),
    /// Full-bleed image, or the fallback content when the resource is missing.
    /// A blank page is re-templated for `fallback_phase` before the fallback
    /// is laid out.
    FullPageImage {
        resource: String,
        fallback: Vec<Flowable>,
        fallback_phase: DocumentPhase,
    },
    /// Space for the contents entries, filled in by the stamping pass
    TocPlaceholder { entries: usize },
    /// Two-column label/value grid
    KeyValueTable(Vec<(String, String)>),
    /// Shaded full-width box around a single paragraph
    Banner { text: String, style: StyleName },
}

/// Everything the layout pass reads
pub struct LayoutContext<'a> {
    pub styles: &'a StyleSheet,
    pub templates: &'a PageTemplateSet,
    pub resources: &'a dyn ResourceLookup,
}

/// Result of the first pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutOutcome {
    pub pages: Vec<PageRecord>,
    /// Section key and the page its first content landed on
    pub section_starts: Vec<(String, usize)>,
}

impl LayoutOutcome {
    pub fn section_page(&self, key: &str) -> Option<usize> {
        self.section_starts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, page)| *page)
    }
}

/// Lay out flowables into page records
pub fn layout(flowables: &[Flowable], ctx: &LayoutContext<'_>) -> Result<LayoutOutcome, RenderError> {
    let mut engine = Engine::new(ctx);
    for flowable in flowables {
        engine.place(flowable)?;
    }
    Ok(engine.finish())
}

struct Engine<'c, 'a> {
    ctx: &'c LayoutContext<'a>,
    finished: Vec<PageRecord>,
    current: Option<PageRecord>,
    cursor: f32,
    phase: DocumentPhase,
    pending_phase: Option<DocumentPhase>,
    pending_section: Option<String>,
    section_starts: Vec<(String, usize)>,
}

impl<'c, 'a> Engine<'c, 'a> {
    fn new(ctx: &'c LayoutContext<'a>) -> Self {
        Self {
            ctx,
            finished: Vec::new(),
            current: None,
            cursor: 0.0,
            phase: DocumentPhase::Cover,
            pending_phase: None,
            pending_section: None,
            section_starts: Vec::new(),
        }
    }

    fn page_number(&self) -> usize {
        self.finished.len() + 1
    }

    fn frame(&self) -> Frame {
        let template = self
            .current
            .as_ref()
            .map(|page| page.template)
            .unwrap_or_else(|| select_template(self.page_number(), self.phase));
        self.ctx.templates.get(template).frame
    }

    fn start_page(&mut self) {
        if let Some(phase) = self.pending_phase.take() {
            if phase != self.phase {
                debug!(?phase, page = self.page_number(), "Switching document phase");
            }
            self.phase = phase;
        }
        let number = self.page_number();
        let template = select_template(number, self.phase);
        self.current = Some(PageRecord::new(number, template));
        self.cursor = self.frame().top();
    }

    fn ensure_page(&mut self) {
        if self.current.is_none() {
            self.start_page();
        }
    }

    fn new_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.finished.push(page);
        }
        self.start_page();
    }

    fn page_break(&mut self) {
        match &self.current {
            None => {}
            // A break on a blank page only re-templates it if a switch is queued
            Some(page) if page.is_blank() => {
                if self.pending_phase.is_some() {
                    self.current = None;
                    self.start_page();
                }
            }
            Some(_) => self.new_page(),
        }
    }

    fn at_top(&self) -> bool {
        self.cursor >= self.frame().top() - EPSILON
    }

    fn available(&self) -> f32 {
        self.cursor - self.frame().y
    }

    fn push(&mut self, op: DrawOp) {
        let number = self.page_number();
        if let Some(key) = self.pending_section.take() {
            self.section_starts.push((key, number));
        }
        if let Some(page) = self.current.as_mut() {
            page.ops.push(op);
        }
    }

    fn finish(mut self) -> LayoutOutcome {
        match self.current.take() {
            Some(page) if !page.is_blank() => self.finished.push(page),
            _ => {}
        }
        if let Some(key) = self.pending_section.take() {
            debug!(section = %key, "Section has no content");
        }
        LayoutOutcome {
            pages: self.finished,
            section_starts: self.section_starts,
        }
    }

    fn place(&mut self, flowable: &Flowable) -> Result<(), RenderError> {
        match flowable {
            Flowable::Block(block) => self.place_block(block),
            Flowable::Text { text, style } => {
                let style = self.ctx.styles.get(*style);
                self.paragraph(text, style)
            }
            Flowable::Spacer(height) => self.spacer(*height),
            Flowable::PageBreak => {
                self.page_break();
                Ok(())
            }
            Flowable::NextTemplate(phase) => {
                self.pending_phase = Some(*phase);
                Ok(())
            }
            Flowable::SectionStart(key) => {
                self.pending_section = Some(key.clone());
                Ok(())
            }
            Flowable::FullPageImage {
                resource,
                fallback,
                fallback_phase,
            } => {
                if self.ctx.resources.image(resource).is_some() {
                    self.ensure_page();
                    self.push(DrawOp::Image {
                        resource: resource.clone(),
                        x: 0.0,
                        y: 0.0,
                        width: PAGE_WIDTH,
                        height: PAGE_HEIGHT,
                    });
                    self.cursor = self.frame().y;
                    Ok(())
                } else {
                    warn!(resource = %resource, "Image resource missing or unreadable, using fallback content");
                    if self.current.as_ref().map_or(true, PageRecord::is_blank) {
                        self.current = None;
                        self.pending_phase = Some(*fallback_phase);
                    }
                    fallback.iter().try_for_each(|f| self.place(f))
                }
            }
            Flowable::TocPlaceholder { entries } => {
                self.toc_placeholder(*entries);
                Ok(())
            }
            Flowable::KeyValueTable(rows) => self.table(rows),
            Flowable::Banner { text, style } => {
                let style = self.ctx.styles.get(*style);
                let banner = self.ctx.styles.banner.clone();
                self.boxed(text, style, &banner)?;
                self.cursor -= style.space_after;
                Ok(())
            }
        }
    }

    fn place_block(&mut self, block: &LayoutBlock) -> Result<(), RenderError> {
        if let Some(text) = block.text() {
            if text.trim().is_empty() {
                return Err(RenderError::MalformedBlock(format!(
                    "{:?} carries no text",
                    block
                )));
            }
        }
        let styles = self.ctx.styles;
        match block {
            LayoutBlock::Heading(text)
            | LayoutBlock::SubHeading(text)
            | LayoutBlock::Paragraph(text) => {
                let style = styles
                    .for_block(block)
                    .ok_or_else(|| RenderError::Layout(format!("no style for {:?}", block)))?;
                self.paragraph(text, style)
            }
            LayoutBlock::BulletItem(text) => {
                self.paragraph(&format!("• {}", text), styles.get(StyleName::Bullet))
            }
            LayoutBlock::HighlightedPoint(text) => {
                let highlight = styles.highlight.clone();
                self.boxed(
                    &format!("• {}", text),
                    styles.get(StyleName::Content),
                    &highlight,
                )
            }
            LayoutBlock::Spacer(height) => self.spacer(*height),
            LayoutBlock::PageBreak | LayoutBlock::SectionBreak => {
                self.page_break();
                Ok(())
            }
        }
    }

    fn spacer(&mut self, height: f32) -> Result<(), RenderError> {
        if !height.is_finite() || height < 0.0 {
            return Err(RenderError::MalformedBlock(format!(
                "spacer height {}",
                height
            )));
        }
        self.ensure_page();
        let bottom = self.frame().y;
        self.cursor = (self.cursor - height).max(bottom);
        Ok(())
    }

    /// Horizontal position and word spacing of one line within `width`
    fn line_position(
        style: &ParagraphStyle,
        line: &str,
        left: f32,
        width: f32,
        last_line: bool,
    ) -> (f32, f32) {
        let line_width = text_width(line, style.font, style.size);
        match style.alignment {
            Alignment::Left => (left, 0.0),
            Alignment::Center => (left + ((width - line_width) / 2.0).max(0.0), 0.0),
            Alignment::Right => (left + (width - line_width).max(0.0), 0.0),
            Alignment::Justify => {
                let gaps = line.matches(' ').count();
                if last_line || gaps == 0 {
                    (left, 0.0)
                } else {
                    (left, ((width - line_width) / gaps as f32).max(0.0))
                }
            }
        }
    }

    fn paragraph(&mut self, text: &str, style: &ParagraphStyle) -> Result<(), RenderError> {
        self.ensure_page();
        let width = self.frame().width - style.left_indent;
        if width <= 0.0 {
            return Err(RenderError::Layout(format!(
                "style {} leaves no room for text",
                style.name
            )));
        }
        let lines = wrap_text(text, style.font, style.size, width);
        if lines.is_empty() {
            return Ok(());
        }
        if !self.at_top() {
            self.cursor -= style.space_before;
        }

        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            if self.available() < style.leading - EPSILON && !self.at_top() {
                self.new_page();
            }
            let left = self.frame().x + style.left_indent;
            let (x, word_spacing) = Self::line_position(style, line, left, width, i == last);
            let baseline = self.cursor - style.size;
            self.push(DrawOp::text(x, baseline, style, line, word_spacing));
            self.cursor -= style.leading;
        }
        self.cursor -= style.space_after;
        Ok(())
    }

    /// Paragraph inside a shaded box; splits across pages only when taller
    /// than a whole frame
    fn boxed(&mut self, text: &str, style: &ParagraphStyle, boxed: &BoxStyle) -> Result<(), RenderError> {
        self.ensure_page();
        let inner_width = boxed.width - 2.0 * boxed.padding;
        if inner_width <= 0.0 {
            return Err(RenderError::Layout("box padding exceeds its width".to_string()));
        }
        let lines = wrap_text(text, style.font, style.size, inner_width);
        let mut remaining = lines.as_slice();

        while !remaining.is_empty() {
            let needed = remaining.len() as f32 * style.leading + 2.0 * boxed.padding;
            let available = self.available();
            let take = if needed <= available + EPSILON {
                remaining.len()
            } else if !self.at_top() {
                self.new_page();
                continue;
            } else {
                let fit = ((available - 2.0 * boxed.padding) / style.leading).floor();
                (fit.max(1.0) as usize).min(remaining.len())
            };
            let (chunk, rest) = remaining.split_at(take);
            self.draw_box(chunk, style, boxed);
            remaining = rest;
            if !remaining.is_empty() {
                self.new_page();
            }
        }
        Ok(())
    }

    fn draw_box(&mut self, lines: &[String], style: &ParagraphStyle, boxed: &BoxStyle) {
        let frame = self.frame();
        let height = lines.len() as f32 * style.leading + 2.0 * boxed.padding;
        let x = frame.x + ((frame.width - boxed.width) / 2.0).max(0.0);
        let y = self.cursor - height;
        self.push(DrawOp::Rect {
            x,
            y,
            width: boxed.width,
            height,
            fill: Some(boxed.background),
            stroke: boxed.border,
            line_width: boxed.border_width,
        });

        let inner_width = boxed.width - 2.0 * boxed.padding;
        let mut line_top = self.cursor - boxed.padding;
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            let (lx, word_spacing) =
                Self::line_position(style, line, x + boxed.padding, inner_width, i == last);
            self.push(DrawOp::text(lx, line_top - style.size, style, line, word_spacing));
            line_top -= style.leading;
        }
        self.cursor = y;
    }

    fn table(&mut self, rows: &[(String, String)]) -> Result<(), RenderError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.ensure_page();
        let styles = self.ctx.styles;
        let label_style = styles.get(StyleName::TableLabel);
        let value_style = styles.get(StyleName::TableValue);
        let grid = styles.table_grid;
        let shade = styles.highlight.background;

        for (label, value) in rows {
            let frame = self.frame();
            let value_width = frame.width - TABLE_LABEL_WIDTH;
            let label_lines = wrap_text(
                label,
                label_style.font,
                label_style.size,
                TABLE_LABEL_WIDTH - 2.0 * TABLE_CELL_PADDING,
            );
            let value_lines = wrap_text(
                value,
                value_style.font,
                value_style.size,
                value_width - 2.0 * TABLE_CELL_PADDING,
            );
            let line_count = label_lines.len().max(value_lines.len()).max(1);
            let height = line_count as f32 * value_style.leading + 2.0 * TABLE_CELL_PADDING;
            if height > self.available() + EPSILON && !self.at_top() {
                self.new_page();
            }

            let frame = self.frame();
            let top = self.cursor;
            let y = top - height;
            self.push(DrawOp::Rect {
                x: frame.x,
                y,
                width: TABLE_LABEL_WIDTH,
                height,
                fill: Some(shade),
                stroke: Some(grid),
                line_width: 0.5,
            });
            self.push(DrawOp::Rect {
                x: frame.x + TABLE_LABEL_WIDTH,
                y,
                width: value_width,
                height,
                fill: None,
                stroke: Some(grid),
                line_width: 0.5,
            });
            for (column_x, lines, style) in [
                (frame.x, &label_lines, label_style),
                (frame.x + TABLE_LABEL_WIDTH, &value_lines, value_style),
            ] {
                let mut line_top = top - TABLE_CELL_PADDING;
                for line in lines.iter() {
                    self.push(DrawOp::text(
                        column_x + TABLE_CELL_PADDING,
                        line_top - style.size,
                        style,
                        line,
                        0.0,
                    ));
                    line_top -= style.leading;
                }
            }
            self.cursor = y;
        }
        self.cursor -= TABLE_GAP;
        Ok(())
    }

    fn toc_placeholder(&mut self, entries: usize) {
        self.ensure_page();
        let height = entries as f32 * toc_row_height(self.ctx.styles);
        if height > self.available() + EPSILON && !self.at_top() {
            self.new_page();
        }
        let frame = self.frame();
        let top = self.cursor;
        if let Some(page) = self.current.as_mut() {
            page.deferred.push(Deferred::TableOfContents {
                x: frame.x,
                top,
                width: frame.width,
            });
        }
        self.cursor -= height;
    }
}
