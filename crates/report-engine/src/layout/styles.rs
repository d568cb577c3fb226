//! Named paragraph and box styles for the report
//!
//! The sheet is resolved once per render and looked up by block type, so
//! every heading, bullet and call-out in a document shares one definition.

use serde::{Deserialize, Serialize};

use super::fonts::FontFace;
use crate::text::LayoutBlock;

pub const INCH: f32 = 72.0;

/// RGB color with components in the 0-1 range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);

    /// Parse "#RRGGBB" or "RRGGBB"; anything malformed is black
    pub fn from_hex(color: &str) -> Rgb {
        let hex = color.trim_start_matches('#');
        if hex.len() >= 6 && hex.is_ascii() {
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f32 / 255.0
            };
            Rgb(channel(0..2), channel(2..4), channel(4..6))
        } else {
            Rgb::BLACK
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Visual style of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub name: &'static str,
    pub font: FontFace,
    pub size: f32,
    pub leading: f32,
    pub color: Rgb,
    pub space_before: f32,
    pub space_after: f32,
    pub alignment: Alignment,
    pub left_indent: f32,
}

impl ParagraphStyle {
    fn new(name: &'static str, font: FontFace, size: f32, color: &str) -> Self {
        Self {
            name,
            font,
            size,
            leading: size * 1.2,
            color: Rgb::from_hex(color),
            space_before: 0.0,
            space_after: 0.0,
            alignment: Alignment::Left,
            left_indent: 0.0,
        }
    }

    fn spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn indented(mut self, left_indent: f32) -> Self {
        self.left_indent = left_indent;
        self
    }

    fn leading(mut self, leading: f32) -> Self {
        self.leading = leading;
        self
    }
}

/// Visual style of a shaded box around a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStyle {
    pub background: Rgb,
    pub border: Option<Rgb>,
    pub border_width: f32,
    pub padding: f32,
    pub width: f32,
}

/// Style names the assembler and layout engine refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleName {
    Title,
    CoverDetail,
    Heading,
    SubHeading,
    Content,
    Bullet,
    TocEntry,
    TableLabel,
    TableValue,
    ThankYou,
    HeaderTitle,
    Footer,
}

/// The fixed set of styles used by one render
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    title: ParagraphStyle,
    cover_detail: ParagraphStyle,
    heading: ParagraphStyle,
    subheading: ParagraphStyle,
    content: ParagraphStyle,
    bullet: ParagraphStyle,
    toc_entry: ParagraphStyle,
    table_label: ParagraphStyle,
    table_value: ParagraphStyle,
    thank_you: ParagraphStyle,
    header_title: ParagraphStyle,
    footer: ParagraphStyle,
    /// Box drawn around highlighted points
    pub highlight: BoxStyle,
    /// Full-width banner on the contact page
    pub banner: BoxStyle,
    /// Grid around key/value tables
    pub table_grid: Rgb,
}

impl StyleSheet {
    /// The report's house style
    pub fn standard() -> Self {
        Self {
            title: ParagraphStyle::new("CustomTitle", FontFace::HelveticaBold, 24.0, "#2B6CB0")
                .spacing(0.0, 30.0)
                .aligned(Alignment::Center),
            cover_detail: ParagraphStyle::new("CoverDetail", FontFace::Helvetica, 12.0, "#1a1a1a")
                .spacing(0.0, 8.0)
                .aligned(Alignment::Center),
            heading: ParagraphStyle::new("CustomHeading", FontFace::HelveticaBold, 20.0, "#1a1a1a")
                .spacing(20.0, 15.0),
            subheading: ParagraphStyle::new(
                "CustomSubheading",
                FontFace::HelveticaBold,
                13.0,
                "#4A5568",
            )
            .spacing(15.0, 10.0),
            content: ParagraphStyle::new("CustomContent", FontFace::Helvetica, 10.0, "#1a1a1a")
                .spacing(6.0, 6.0)
                .aligned(Alignment::Justify)
                .leading(14.0),
            bullet: ParagraphStyle::new("CustomBullet", FontFace::Helvetica, 10.0, "#1a1a1a")
                .indented(20.0)
                .leading(14.0),
            toc_entry: ParagraphStyle::new("TocEntry", FontFace::Helvetica, 11.0, "#1a1a1a")
                .spacing(4.0, 4.0)
                .leading(16.0),
            table_label: ParagraphStyle::new("TableLabel", FontFace::HelveticaBold, 10.0, "#2B6CB0")
                .leading(14.0),
            table_value: ParagraphStyle::new("TableValue", FontFace::Helvetica, 10.0, "#1a1a1a")
                .leading(14.0),
            thank_you: ParagraphStyle::new("ThankYou", FontFace::HelveticaBold, 13.0, "#2B6CB0")
                .aligned(Alignment::Center),
            header_title: ParagraphStyle::new("Header", FontFace::HelveticaBold, 10.0, "#000000"),
            footer: ParagraphStyle::new("Footer", FontFace::Helvetica, 9.0, "#000000"),
            highlight: BoxStyle {
                background: Rgb::from_hex("#F7FAFC"),
                border: Some(Rgb::from_hex("#90CDF4")),
                border_width: 1.0,
                padding: 12.0,
                width: 6.0 * INCH,
            },
            banner: BoxStyle {
                background: Rgb::from_hex("#F0F9FF"),
                border: None,
                border_width: 0.0,
                padding: 20.0,
                width: 6.5 * INCH,
            },
            table_grid: Rgb::from_hex("#E2E8F0"),
        }
    }

    pub fn get(&self, name: StyleName) -> &ParagraphStyle {
        match name {
            StyleName::Title => &self.title,
            StyleName::CoverDetail => &self.cover_detail,
            StyleName::Heading => &self.heading,
            StyleName::SubHeading => &self.subheading,
            StyleName::Content => &self.content,
            StyleName::Bullet => &self.bullet,
            StyleName::TocEntry => &self.toc_entry,
            StyleName::TableLabel => &self.table_label,
            StyleName::TableValue => &self.table_value,
            StyleName::ThankYou => &self.thank_you,
            StyleName::HeaderTitle => &self.header_title,
            StyleName::Footer => &self.footer,
        }
    }

    /// Paragraph style for a text-bearing block; `None` for breaks and spacers
    pub fn for_block(&self, block: &LayoutBlock) -> Option<&ParagraphStyle> {
        match block {
            LayoutBlock::Heading(_) => Some(&self.heading),
            LayoutBlock::SubHeading(_) => Some(&self.subheading),
            LayoutBlock::HighlightedPoint(_) | LayoutBlock::Paragraph(_) => Some(&self.content),
            LayoutBlock::BulletItem(_) => Some(&self.bullet),
            LayoutBlock::Spacer(_) | LayoutBlock::PageBreak | LayoutBlock::SectionBreak => None,
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        let c = Rgb::from_hex("#FF8000");
        assert_eq!(c.0, 1.0);
        assert!((c.1 - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.2, 0.0);
        assert_eq!(Rgb::from_hex("fff"), Rgb::BLACK);
        assert_eq!(Rgb::from_hex("#ééé"), Rgb::BLACK);
    }

    #[test]
    fn test_block_lookup() {
        let sheet = StyleSheet::standard();
        let heading = sheet
            .for_block(&LayoutBlock::Heading("Intro".into()))
            .unwrap();
        assert_eq!(heading.name, "CustomHeading");
        assert_eq!(heading.size, 20.0);

        let highlight = sheet
            .for_block(&LayoutBlock::HighlightedPoint("x".into()))
            .unwrap();
        assert_eq!(highlight.name, "CustomContent");
        assert!(sheet.for_block(&LayoutBlock::PageBreak).is_none());
    }

    #[test]
    fn test_bullets_are_indented() {
        let sheet = StyleSheet::standard();
        assert_eq!(sheet.get(StyleName::Bullet).left_indent, 20.0);
    }
}
