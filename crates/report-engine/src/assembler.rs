//! Report assembly and the two-pass render driver
//!
//! The report always has the same shape: cover, contents, profile page,
//! one body section per generated narrative, disclaimer, back cover. The
//! assembler turns a [`ReportDocument`] into that flowable sequence;
//! [`render_report`] lays it out, stamps totals and commits the PDF.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared_types::{CompletedSections, OrganizationClassification, OrganizationProfile};
use tracing::{debug, info, warn};

use crate::errors::RenderError;
use crate::layout::flow::{layout, Flowable, LayoutContext};
use crate::layout::styles::{StyleName, StyleSheet, INCH};
use crate::layout::templates::{DocumentPhase, PageTemplateSet};
use crate::layout::toc::{build_toc, TocEntry, PROFILE_ANALYSIS_PAGE, PROFILE_ANALYSIS_TITLE};
use crate::render::overlay::{stamp_all, StampContext};
use crate::render::pdf::{write_pdf, DocumentInfo};
use crate::render::resources::{names, ResourceLookup};
use crate::text::{classify, LayoutBlock};

pub const REPORT_TITLE: &str = "ESG Assessment Report";
pub const DEFAULT_HEADER_TITLE: &str = "ESG Starter's Kit";
pub const DEFAULT_DISCLAIMER_TITLE: &str = "Disclaimer";

const PROFILE_SECTION_KEY: &str = "profile-analysis";

/// Fixed legal text of the disclaimer page
pub const DISCLAIMER_PARAGRAPHS: &[&str] = &[
    "This report has been generated with the assistance of automated text generation \
     based solely on the information supplied by the organization. It is provided for \
     general guidance on ESG readiness and does not constitute legal, financial, \
     investment or professional advice.",
    "No representation or warranty, express or implied, is given as to the accuracy, \
     completeness or fitness for purpose of the analysis, frameworks or recommendations \
     contained in this report. Framework references are indicative and should be \
     verified against the current published standards.",
    "The organization remains solely responsible for its sustainability disclosures, \
     regulatory filings and any decisions taken on the basis of this report. Qualified \
     advisors should be consulted before implementing any recommendation.",
    "Neither the authors nor the providers of this report accept any liability for loss \
     or damage arising from its use. This report may not be reproduced or distributed \
     to third parties without prior written consent.",
];

/// Contact rows shown on the back page when no back cover image exists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetails {
    pub address: String,
    pub telephone: String,
    pub email: String,
    pub website: String,
}

impl ContactDetails {
    /// Non-empty rows in display order
    pub fn rows(&self) -> Vec<(String, String)> {
        [
            ("Address:", &self.address),
            ("Tel:", &self.telephone),
            ("Email:", &self.email),
            ("Website:", &self.website),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| (label.to_string(), value.clone()))
        .collect()
    }
}

/// Everything a report is built from
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub profile: OrganizationProfile,
    pub classification: OrganizationClassification,
    pub sections: CompletedSections,
    pub contact: ContactDetails,
    /// Date printed on the fallback cover
    pub report_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub header_title: String,
    pub disclaimer_title: String,
    /// Drives the footer date
    pub generated_at: NaiveDateTime,
}

impl RenderOptions {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self {
            header_title: DEFAULT_HEADER_TITLE.to_string(),
            disclaimer_title: DEFAULT_DISCLAIMER_TITLE.to_string(),
            generated_at,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new(Local::now().naive_local())
    }
}

/// A finished report
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub toc: Vec<TocEntry>,
}

/// Output file name, e.g. `esg_assessment_20260501_1430.pdf`
pub fn report_filename(at: &NaiveDateTime) -> String {
    format!("esg_assessment_{}.pdf", at.format("%Y%m%d_%H%M"))
}

fn text(text: impl Into<String>, style: StyleName) -> Flowable {
    Flowable::Text {
        text: text.into(),
        style,
    }
}

fn cover(doc: &ReportDocument) -> Vec<Flowable> {
    vec![
        Flowable::NextTemplate(DocumentPhase::Cover),
        Flowable::FullPageImage {
            resource: names::COVER.to_string(),
            fallback: vec![
                Flowable::Spacer(2.0 * INCH),
                text(REPORT_TITLE, StyleName::Title),
                Flowable::Spacer(INCH),
                text(
                    format!("Organization: {}", doc.profile.name),
                    StyleName::CoverDetail,
                ),
                text(
                    format!("Date: {}", doc.report_date.format("%B %d, %Y")),
                    StyleName::CoverDetail,
                ),
            ],
            fallback_phase: DocumentPhase::Cover,
        },
    ]
}

fn profile_page(doc: &ReportDocument) -> Vec<Flowable> {
    let profile = &doc.profile;
    let types: Vec<&str> = doc.classification.types().iter().map(|t| t.label()).collect();
    let mut rows = vec![
        ("Organization".to_string(), profile.name.clone()),
        ("Industry".to_string(), profile.industry.clone()),
        ("Core Activities".to_string(), profile.core_activities.clone()),
        ("Organization Types".to_string(), types.join(", ")),
        (
            "Frameworks".to_string(),
            doc.classification.frameworks().join("; "),
        ),
    ];
    rows.retain(|(_, value)| !value.trim().is_empty());

    let mut flowables = vec![
        Flowable::SectionStart(PROFILE_SECTION_KEY.to_string()),
        Flowable::Block(LayoutBlock::Heading(PROFILE_ANALYSIS_TITLE.to_string())),
        Flowable::KeyValueTable(rows),
    ];
    let answers = profile.answers.in_question_order();
    if !answers.is_empty() {
        flowables.push(Flowable::Block(LayoutBlock::SubHeading(
            "ESG Readiness Responses".to_string(),
        )));
        for (question, answer) in answers {
            flowables.push(text(question, StyleName::TableLabel));
            flowables.push(Flowable::Block(LayoutBlock::BulletItem(answer.to_string())));
            flowables.push(Flowable::Spacer(6.0));
        }
    }
    flowables
}

fn contact_page(doc: &ReportDocument) -> Vec<Flowable> {
    let mut flowables = vec![
        Flowable::Banner {
            text: "Get in Touch".to_string(),
            style: StyleName::Heading,
        },
        Flowable::Spacer(0.3 * INCH),
    ];
    let rows = doc.contact.rows();
    if !rows.is_empty() {
        flowables.push(Flowable::KeyValueTable(rows));
    }
    flowables.push(Flowable::Spacer(0.5 * INCH));
    flowables.push(Flowable::Banner {
        text: "Thank you for your interest!".to_string(),
        style: StyleName::ThankYou,
    });
    flowables
}

/// The full flowable sequence for a report
///
/// Template switches are queued before the break that starts the new
/// template's first page.
pub fn assemble(doc: &ReportDocument, options: &RenderOptions) -> Vec<Flowable> {
    let mut flowables = cover(doc);

    flowables.push(Flowable::NextTemplate(DocumentPhase::Body));
    flowables.push(Flowable::PageBreak);
    flowables.push(Flowable::Block(LayoutBlock::Heading(
        "Table of Contents".to_string(),
    )));
    flowables.push(Flowable::TocPlaceholder {
        entries: doc.sections.len() + 1,
    });
    flowables.push(Flowable::PageBreak);

    flowables.extend(profile_page(doc));
    flowables.push(Flowable::PageBreak);

    let last = doc.sections.len().saturating_sub(1);
    for (i, (section, narrative)) in doc.sections.iter().enumerate() {
        flowables.push(Flowable::SectionStart(section.id.slug().to_string()));
        flowables.push(Flowable::Block(LayoutBlock::Heading(section.title.clone())));
        flowables.extend(classify(Some(narrative)).into_iter().map(Flowable::Block));
        if i == last {
            flowables.push(Flowable::NextTemplate(DocumentPhase::Disclaimer));
        }
        flowables.push(Flowable::Block(LayoutBlock::SectionBreak));
    }

    flowables.push(Flowable::Block(LayoutBlock::Heading(
        options.disclaimer_title.clone(),
    )));
    flowables.extend(
        DISCLAIMER_PARAGRAPHS
            .iter()
            .map(|p| text(*p, StyleName::Content)),
    );

    flowables.push(Flowable::NextTemplate(DocumentPhase::BackCover));
    flowables.push(Flowable::PageBreak);
    flowables.push(Flowable::FullPageImage {
        resource: names::BACK_COVER.to_string(),
        fallback: contact_page(doc),
        fallback_phase: DocumentPhase::Body,
    });
    flowables
}

/// Render a report in two passes and return the finished PDF
///
/// Nothing is returned unless both passes and the commit succeed.
pub fn render_report(
    doc: &ReportDocument,
    resources: &dyn ResourceLookup,
    options: &RenderOptions,
) -> Result<RenderedReport, RenderError> {
    let styles = StyleSheet::standard();
    let logos: Vec<String> = names::LOGOS.iter().map(|l| l.to_string()).collect();
    let templates = PageTemplateSet::new(&options.header_title, &options.disclaimer_title, &logos);

    let flowables = assemble(doc, options);
    debug!(flowables = flowables.len(), "Assembled report");

    let ctx = LayoutContext {
        styles: &styles,
        templates: &templates,
        resources,
    };
    let outcome = layout(&flowables, &ctx)?;

    if outcome.section_page(PROFILE_SECTION_KEY) != Some(PROFILE_ANALYSIS_PAGE) {
        warn!(
            page = ?outcome.section_page(PROFILE_SECTION_KEY),
            expected = PROFILE_ANALYSIS_PAGE,
            "Profile page is not where the contents page says it is"
        );
    }

    let mut section_pages = Vec::with_capacity(doc.sections.len());
    for (section, _) in doc.sections.iter() {
        let page = outcome.section_page(section.id.slug()).ok_or_else(|| {
            RenderError::Layout(format!("section {} was never placed", section.id))
        })?;
        section_pages.push((section.title.clone(), page));
    }
    let toc = build_toc(&section_pages);

    let generated_on = options.generated_at.format("%B %d, %Y").to_string();
    let stamp_ctx = StampContext {
        styles: &styles,
        templates: &templates,
        total_pages: outcome.pages.len(),
        generated_on: &generated_on,
        toc: &toc,
    };
    let pages = stamp_all(&outcome.pages, &stamp_ctx);

    let info = DocumentInfo {
        title: REPORT_TITLE.to_string(),
        author: doc.profile.name.clone(),
        subject: options.header_title.clone(),
    };
    let bytes = write_pdf(&pages, resources, &info)?;

    info!(
        pages = pages.len(),
        bytes = bytes.len(),
        organization = %doc.profile.name,
        "Report rendered"
    );
    Ok(RenderedReport {
        bytes,
        page_count: pages.len(),
        toc,
    })
}
