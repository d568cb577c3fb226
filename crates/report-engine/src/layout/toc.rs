//! Table of contents entries
//!
//! Page numbers come from the first layout pass; the profile page is the
//! one fixed entry.

use serde::{Deserialize, Serialize};

/// Title of the synthetic first entry
pub const PROFILE_ANALYSIS_TITLE: &str = "Profile Analysis";
/// The profile page always follows the cover and the contents page
pub const PROFILE_ANALYSIS_PAGE: usize = 3;

const DOT_FILL_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub number: usize,
    pub title: String,
    pub page: usize,
}

impl TocEntry {
    /// "{n}. {title}"
    pub fn label(&self) -> String {
        format!("{}. {}", self.number, self.title)
    }

    /// Number of dots between label and page number
    pub fn dot_fill(&self) -> usize {
        DOT_FILL_WIDTH.saturating_sub(self.label().chars().count())
    }

    /// Label followed by its dot fill
    pub fn leader(&self) -> String {
        format!("{}{}", self.label(), ".".repeat(self.dot_fill()))
    }

    pub fn display_line(&self) -> String {
        format!("{} {}", self.leader(), self.page)
    }
}

/// Number sections for the contents page
///
/// Entry 1 is always the profile analysis on its fixed page; the supplied
/// sections follow as 2..=N in the order given.
pub fn build_toc(sections: &[(String, usize)]) -> Vec<TocEntry> {
    std::iter::once(TocEntry {
        number: 1,
        title: PROFILE_ANALYSIS_TITLE.to_string(),
        page: PROFILE_ANALYSIS_PAGE,
    })
    .chain(sections.iter().enumerate().map(|(i, (title, page))| TocEntry {
        number: i + 2,
        title: title.clone(),
        page: *page,
    }))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_profile_entry_is_prepended() {
        let toc = build_toc(&[
            ("A".to_string(), 4),
            ("B".to_string(), 6),
            ("C".to_string(), 8),
        ]);
        let summary: Vec<_> = toc
            .iter()
            .map(|e| (e.number, e.title.as_str(), e.page))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "Profile Analysis", 3),
                (2, "A", 4),
                (3, "B", 6),
                (4, "C", 8)
            ]
        );
        assert_eq!(toc[1].label(), "2. A");
        assert_eq!(toc[1].dot_fill(), 46);
    }

    #[test]
    fn test_long_titles_get_no_dots() {
        let toc = build_toc(&[("x".repeat(60), 5)]);
        assert_eq!(toc[1].dot_fill(), 0);
        assert_eq!(toc[1].display_line(), format!("2. {} 5", "x".repeat(60)));
    }

    #[test]
    fn test_empty_section_list_keeps_profile_entry() {
        let toc = build_toc(&[]);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].display_line(), format!("1. Profile Analysis{} 3", ".".repeat(31)));
    }

    proptest! {
        #[test]
        fn prop_numbering_and_fill(titles in prop::collection::vec("[A-Za-z ]{1,70}", 0..10)) {
            let input: Vec<(String, usize)> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| (t.clone(), i + 4))
                .collect();
            let toc = build_toc(&input);
            prop_assert_eq!(toc.len(), input.len() + 1);
            for (i, entry) in toc.iter().enumerate() {
                prop_assert_eq!(entry.number, i + 1);
                let label_len = format!("{}. {}", entry.number, entry.title).chars().count();
                prop_assert_eq!(entry.dot_fill(), 50usize.saturating_sub(label_len));
            }
            for (entry, (title, page)) in toc.iter().skip(1).zip(&input) {
                prop_assert_eq!(&entry.title, title);
                prop_assert_eq!(entry.page, *page);
            }
        }
    }
}
