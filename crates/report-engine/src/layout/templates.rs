//! Page templates and the rule that picks one for each page
//!
//! Three layouts exist: a full-bleed cover (also used for the back cover),
//! the standard body page with running header and footer, and the
//! disclaimer page, which shares the body chrome under its own title.

use serde::{Deserialize, Serialize};

use super::fonts::text_width;
use super::styles::{StyleName, StyleSheet, INCH};
use crate::render::overlay::DrawOp;

/// US Letter, in points
pub const PAGE_WIDTH: f32 = 8.5 * INCH;
pub const PAGE_HEIGHT: f32 = 11.0 * INCH;

pub const LEFT_MARGIN: f32 = INCH;
pub const RIGHT_MARGIN: f32 = INCH;
pub const TOP_MARGIN: f32 = 1.5 * INCH;
pub const BOTTOM_MARGIN: f32 = INCH;

/// Edge length of a header logo
pub const LOGO_SIZE: f32 = 0.5 * INCH;
const LOGO_GAP: f32 = 0.1 * INCH;

/// Named page layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    Cover,
    Body,
    Disclaimer,
}

impl TemplateKind {
    /// Short template id
    pub fn id(&self) -> &'static str {
        match self {
            TemplateKind::Cover => "First",
            TemplateKind::Body => "Later",
            TemplateKind::Disclaimer => "dis",
        }
    }
}

/// Part of the document a page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentPhase {
    Cover,
    Body,
    Disclaimer,
    BackCover,
}

/// Template for a page, from its 1-based number and the current phase
///
/// Page 1 is always the cover. The phase decides every other page.
pub fn select_template(page_number: usize, phase: DocumentPhase) -> TemplateKind {
    if page_number <= 1 {
        return TemplateKind::Cover;
    }
    match phase {
        DocumentPhase::Cover | DocumentPhase::BackCover => TemplateKind::Cover,
        DocumentPhase::Body => TemplateKind::Body,
        DocumentPhase::Disclaimer => TemplateKind::Disclaimer,
    }
}

/// Rectangle that receives flowing content; origin at bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub kind: TemplateKind,
    pub frame: Frame,
    /// Running header title; `None` means no header or footer at all
    pub header_title: Option<String>,
    /// Logo resource names, drawn right to left
    pub logos: Vec<String>,
}

impl PageTemplate {
    /// Full-bleed page without chrome
    pub fn cover() -> Self {
        Self {
            kind: TemplateKind::Cover,
            frame: Frame {
                x: 0.0,
                y: 0.0,
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
            },
            header_title: None,
            logos: Vec::new(),
        }
    }

    /// Margined page with running header and footer
    pub fn running(kind: TemplateKind, header_title: impl Into<String>, logos: &[String]) -> Self {
        Self {
            kind,
            frame: Frame {
                x: LEFT_MARGIN,
                y: BOTTOM_MARGIN,
                width: PAGE_WIDTH - LEFT_MARGIN - RIGHT_MARGIN,
                height: PAGE_HEIGHT - TOP_MARGIN - BOTTOM_MARGIN,
            },
            header_title: Some(header_title.into()),
            logos: logos.iter().take(3).cloned().collect(),
        }
    }

    /// Header and footer are never drawn on the first page of the document
    pub fn has_chrome(&self, page_number: usize) -> bool {
        self.header_title.is_some() && page_number > 1
    }

    /// Header and footer drawing for one page
    ///
    /// Needs the final page count, so this only runs in the stamping pass.
    pub fn decorations(
        &self,
        page_number: usize,
        total_pages: usize,
        generated_on: &str,
        styles: &StyleSheet,
    ) -> Vec<DrawOp> {
        let Some(title) = self.header_title.as_deref().filter(|_| self.has_chrome(page_number))
        else {
            return Vec::new();
        };
        let frame = self.frame;
        let mut ops = Vec::new();

        // Measured from the frame size plus one margin
        let header_base = frame.height + TOP_MARGIN;
        let right_edge = frame.width + RIGHT_MARGIN;

        let header_y = header_base - 0.1 * INCH;
        let logo_x = right_edge - INCH;
        for (i, logo) in self.logos.iter().enumerate() {
            ops.push(DrawOp::Image {
                resource: logo.clone(),
                x: logo_x - i as f32 * (LOGO_SIZE + LOGO_GAP),
                y: header_y,
                width: LOGO_SIZE,
                height: LOGO_SIZE,
            });
        }

        let header = styles.get(StyleName::HeaderTitle);
        ops.push(DrawOp::text(frame.x, header_y, header, title, 0.0));

        let rule_y = header_base - 0.3 * INCH;
        ops.push(DrawOp::Line {
            x1: frame.x,
            y1: rule_y,
            x2: right_edge,
            y2: rule_y,
            color: header.color,
            width: 0.5,
        });

        let footer = styles.get(StyleName::Footer);
        let footer_y = 0.5 * INCH;
        ops.push(DrawOp::text(
            frame.x,
            footer_y,
            footer,
            &format!("Generated on {}", generated_on),
            0.0,
        ));
        let page_label = format!("Page {} of {}", page_number, total_pages);
        let label_width = text_width(&page_label, footer.font, footer.size);
        ops.push(DrawOp::text(
            right_edge - label_width,
            footer_y,
            footer,
            &page_label,
            0.0,
        ));
        ops
    }
}

/// The three templates used by one render
#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplateSet {
    cover: PageTemplate,
    body: PageTemplate,
    disclaimer: PageTemplate,
}

impl PageTemplateSet {
    pub fn new(header_title: &str, disclaimer_title: &str, logos: &[String]) -> Self {
        Self {
            cover: PageTemplate::cover(),
            body: PageTemplate::running(TemplateKind::Body, header_title, logos),
            disclaimer: PageTemplate::running(TemplateKind::Disclaimer, disclaimer_title, logos),
        }
    }

    pub fn get(&self, kind: TemplateKind) -> &PageTemplate {
        match kind {
            TemplateKind::Cover => &self.cover,
            TemplateKind::Body => &self.body,
            TemplateKind::Disclaimer => &self.disclaimer,
        }
    }
}
