//! Line classification into typed layout blocks
//!
//! Generated narrative arrives as loosely formatted text. Each source line
//! is cleaned on its own and then matched against an ordered rule table;
//! the first matching rule decides the block type. The order is part of
//! the contract: marker phrases win over numbering, numbering wins over
//! bullets, and anything left is a plain paragraph.

use lazy_static::lazy_static;
use regex::Regex;

use super::normalize::normalize;

/// Vertical gap around a highlighted point, in points (0.1in)
pub const HIGHLIGHT_GAP: f32 = 7.2;
/// Vertical gap after a plain paragraph, in points (0.05in)
pub const PARAGRAPH_GAP: f32 = 3.6;

/// Phrases that turn a line into a sub-heading
pub const SUBHEADING_MARKERS: &[&str] = &[
    "Summary",
    "Strengths and Advantages",
    "Skills and Competencies",
    PAGE_BREAK_MARKER,
];

/// Marker phrase that additionally starts a new page
pub const PAGE_BREAK_MARKER: &str = "Compatible Personality and Behavioral Insights";

const BULLET_GLYPHS: &[char] = &['•', '-', '*'];

lazy_static! {
    static ref NUMBERED: Regex = Regex::new(r"^\d+\.?\s+(.+)").unwrap();
}

/// A typed unit of layout content
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutBlock {
    Heading(String),
    SubHeading(String),
    HighlightedPoint(String),
    BulletItem(String),
    Paragraph(String),
    /// Vertical gap in points
    Spacer(f32),
    PageBreak,
    /// End of a report section; starts a new page
    SectionBreak,
}

impl LayoutBlock {
    /// Text carried by the block, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            LayoutBlock::Heading(t)
            | LayoutBlock::SubHeading(t)
            | LayoutBlock::HighlightedPoint(t)
            | LayoutBlock::BulletItem(t)
            | LayoutBlock::Paragraph(t) => Some(t),
            LayoutBlock::Spacer(_) | LayoutBlock::PageBreak | LayoutBlock::SectionBreak => None,
        }
    }
}

/// One entry of the classification table
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub build: fn(&str) -> Vec<LayoutBlock>,
}

/// Classification rules, evaluated top to bottom
pub static RULES: &[Rule] = &[
    Rule {
        name: "marker-phrase",
        matches: is_marker_phrase,
        build: build_subheading,
    },
    Rule {
        name: "numbered-point",
        matches: is_numbered,
        build: build_highlight,
    },
    Rule {
        name: "bullet",
        matches: is_bullet,
        build: build_bullet,
    },
    Rule {
        name: "paragraph",
        matches: |_| true,
        build: build_paragraph,
    },
];

fn is_marker_phrase(line: &str) -> bool {
    SUBHEADING_MARKERS.iter().any(|m| line.contains(m))
}

fn is_numbered(line: &str) -> bool {
    NUMBERED.is_match(line)
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(BULLET_GLYPHS) && !strip_bullet(line).is_empty()
}

fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(|c: char| BULLET_GLYPHS.contains(&c) || c == ' ')
}

fn build_subheading(line: &str) -> Vec<LayoutBlock> {
    let heading = LayoutBlock::SubHeading(line.to_string());
    if line.contains(PAGE_BREAK_MARKER) {
        vec![LayoutBlock::PageBreak, heading]
    } else {
        vec![heading]
    }
}

fn build_highlight(line: &str) -> Vec<LayoutBlock> {
    let text = NUMBERED
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| line.to_string());
    vec![
        LayoutBlock::Spacer(HIGHLIGHT_GAP),
        LayoutBlock::HighlightedPoint(text),
        LayoutBlock::Spacer(HIGHLIGHT_GAP),
    ]
}

fn build_bullet(line: &str) -> Vec<LayoutBlock> {
    vec![LayoutBlock::BulletItem(strip_bullet(line).to_string())]
}

fn build_paragraph(line: &str) -> Vec<LayoutBlock> {
    vec![
        LayoutBlock::Paragraph(line.to_string()),
        LayoutBlock::Spacer(PARAGRAPH_GAP),
    ]
}

/// Classify a single already-cleaned line
pub fn classify_line(line: &str) -> Vec<LayoutBlock> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(line))
        .map(|rule| (rule.build)(line))
        .unwrap_or_default()
}

/// Turn a section's raw narrative into layout blocks
///
/// The raw text is split on newlines first and every line is normalized
/// independently, so line structure survives whitespace collapsing.
/// Blank lines produce nothing; `None` or blank input yields no blocks.
pub fn classify(section_text: Option<&str>) -> Vec<LayoutBlock> {
    let Some(text) = section_text else {
        return Vec::new();
    };
    text.trim()
        .split('\n')
        .map(|line| normalize(Some(line)))
        .filter(|line| !line.is_empty())
        .flat_map(|line| classify_line(&line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input_has_no_blocks() {
        assert!(classify(None).is_empty());
        assert!(classify(Some("")).is_empty());
        assert!(classify(Some("\n  \n")).is_empty());
    }

    #[test]
    fn test_marker_phrase_beats_paragraph() {
        assert_eq!(
            classify(Some("Summary of findings")),
            vec![LayoutBlock::SubHeading("Summary of findings".into())]
        );
    }

    #[test]
    fn test_numbered_line_becomes_highlight() {
        assert_eq!(
            classify(Some("1. Improve reporting")),
            vec![
                LayoutBlock::Spacer(HIGHLIGHT_GAP),
                LayoutBlock::HighlightedPoint("Improve reporting".into()),
                LayoutBlock::Spacer(HIGHLIGHT_GAP),
            ]
        );
        let blocks = classify(Some("12 Engage suppliers"));
        assert_eq!(
            blocks[1],
            LayoutBlock::HighlightedPoint("Engage suppliers".into())
        );
    }

    #[test]
    fn test_bullet_glyph_is_stripped() {
        assert_eq!(
            classify(Some("• Reduce waste")),
            vec![LayoutBlock::BulletItem("Reduce waste".into())]
        );
        assert_eq!(
            classify(Some("- Track energy use")),
            vec![LayoutBlock::BulletItem("Track energy use".into())]
        );
    }

    #[test]
    fn test_emphasis_asterisk_is_removed_before_bullet_check() {
        // "*" is emphasis to the normalizer, so "* item" ends up a paragraph
        assert_eq!(
            classify(Some("* Item")),
            vec![
                LayoutBlock::Paragraph("Item".into()),
                LayoutBlock::Spacer(PARAGRAPH_GAP)
            ]
        );
    }

    #[test]
    fn test_marker_phrase_beats_numbering() {
        assert_eq!(
            classify(Some("3. Executive Summary")),
            vec![LayoutBlock::SubHeading("3. Executive Summary".into())]
        );
    }

    #[test]
    fn test_page_break_marker_forces_break_first() {
        assert_eq!(
            classify(Some("## Compatible Personality and Behavioral Insights")),
            vec![
                LayoutBlock::PageBreak,
                LayoutBlock::SubHeading("Compatible Personality and Behavioral Insights".into()),
            ]
        );
    }

    #[test]
    fn test_plain_paragraph_gets_spacing() {
        assert_eq!(
            classify(Some("Our **supply chain** is local.")),
            vec![
                LayoutBlock::Paragraph("Our supply chain is local.".into()),
                LayoutBlock::Spacer(PARAGRAPH_GAP),
            ]
        );
    }

    #[test]
    fn test_lines_are_classified_independently() {
        let text = "### Overview\nThe firm is early.\n\n1. Appoint an ESG lead\n- Budget\n";
        let kinds: Vec<_> = classify(Some(text))
            .into_iter()
            .filter(|b| !matches!(b, LayoutBlock::Spacer(_)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                LayoutBlock::Paragraph("Overview".into()),
                LayoutBlock::Paragraph("The firm is early.".into()),
                LayoutBlock::HighlightedPoint("Appoint an ESG lead".into()),
                LayoutBlock::BulletItem("Budget".into()),
            ]
        );
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["marker-phrase", "numbered-point", "bullet", "paragraph"]
        );
    }

    #[test]
    fn test_non_empty_input_yields_blocks() {
        for line in ["x", "Summary", "7 a", "- a", "• b", "-", "•"] {
            assert!(!classify(Some(line)).is_empty(), "{line}");
        }
    }
}
