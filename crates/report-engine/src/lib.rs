//! ESG report layout and rendering
//!
//! Generated narrative goes through three stages here:
//! - [`text`]: normalize each line and classify it into layout blocks
//! - [`layout`]: flow blocks into page records under the page templates
//! - [`render`]: stamp totals onto each record and commit the PDF
//!
//! [`render_report`] drives all of it for a finished [`ReportDocument`].

pub mod assembler;
pub mod errors;
pub mod layout;
pub mod render;
pub mod text;

pub use assembler::{
    assemble, render_report, report_filename, ContactDetails, RenderOptions, RenderedReport,
    ReportDocument, DISCLAIMER_PARAGRAPHS, REPORT_TITLE,
};
pub use errors::RenderError;
pub use layout::{
    build_toc, layout, select_template, DocumentPhase, Flowable, LayoutContext, LayoutOutcome,
    StyleName, StyleSheet, TemplateKind, TocEntry,
};
pub use render::{
    stamp, stamp_all, DirectoryResources, DrawOp, MemoryResources, PageRecord, ResourceLookup,
    StampContext, StampedPage,
};
pub use text::{classify, normalize, LayoutBlock};
