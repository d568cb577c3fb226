//! Fonts, styles, page templates, contents entries and the layout pass

pub mod flow;
pub mod fonts;
pub mod styles;
pub mod templates;
pub mod toc;

pub use flow::{layout, Flowable, LayoutContext, LayoutOutcome};
pub use styles::{Alignment, BoxStyle, ParagraphStyle, Rgb, StyleName, StyleSheet};
pub use templates::{select_template, DocumentPhase, Frame, PageTemplate, PageTemplateSet, TemplateKind};
pub use toc::{build_toc, TocEntry, PROFILE_ANALYSIS_PAGE, PROFILE_ANALYSIS_TITLE};
