use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Local;
use report_engine::{
    render_report, report_filename, DirectoryResources, RenderOptions, ReportDocument,
};
use report_pipeline::{
    OpenAiClient, Pipeline, PipelineError, Session, StageOutcome, TextGenerator, WithTimeout,
};
use shared_types::{catalog, OrganizationType, SectionId, INDUSTRIES, READINESS_QUESTIONS};
use tracing::{info, warn};

use crate::config::Config;
use crate::profile::ProfileFile;

/// Read a saved session, if the file exists
pub fn load_session(path: &Path) -> anyhow::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session: {}", path.display()))?;
    let session = Session::from_json(&json)
        .with_context(|| format!("Failed to load session: {}", path.display()))?;
    Ok(Some(session))
}

/// Write the session to a temporary file, then move it into place
pub fn save_session(path: &Path, session: &Session) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, session.to_json()?)
        .with_context(|| format!("Failed to write session: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace session: {}", path.display()))?;
    Ok(())
}

/// Resume the saved session or start one from the profile file
pub fn prepare_session(profile: Option<&Path>, session_path: &Path) -> anyhow::Result<Session> {
    let file = profile.map(ProfileFile::from_file).transpose()?;

    let mut session = match load_session(session_path)? {
        Some(mut session) => {
            info!(
                path = %session_path.display(),
                stage = session.current_stage(),
                "Resuming saved session"
            );
            if let Some(file) = &file {
                let profile = file.profile()?;
                if &profile != session.profile() {
                    match session.update_profile(profile) {
                        Err(PipelineError::ProfileLocked) => warn!(
                            "Profile file differs from the saved session; generated sections keep the original profile"
                        ),
                        other => other?,
                    }
                }
            }
            session
        }
        None => {
            let Some(file) = &file else {
                bail!(
                    "No session at {} and no --profile given",
                    session_path.display()
                );
            };
            Session::new(file.profile()?)?
        }
    };

    if let Some(classification) = file.as_ref().map(|f| f.classification()).transpose()?.flatten() {
        if session.classification() != Some(&classification) {
            session.select_organization_types(classification)?;
        }
    }
    Ok(session)
}

/// Run stages until the session is complete, saving after each one
pub async fn generate<G: TextGenerator>(
    pipeline: &Pipeline<G>,
    session: &mut Session,
    session_path: &Path,
    retry_failed: bool,
) -> anyhow::Result<()> {
    if retry_failed {
        if let Some(failure) = session.clear_failure() {
            info!(stage = %failure.stage, "Cleared previous failure");
        }
    }

    while let Some(stage) = session.next_stage() {
        let result = pipeline.run_stage(session, stage).await;
        save_session(session_path, session)?;
        match result {
            Ok(StageOutcome::Generated(stage)) => {
                info!(stage = %stage, done = session.current_stage(), total = SectionId::ALL.len(), "Stage complete")
            }
            Ok(StageOutcome::AlreadyComplete(_)) => {}
            Err(PipelineError::MissingSelection) => bail!(
                "Stage {} needs at least one organization type; add organization_types to the profile",
                stage
            ),
            Err(e @ PipelineError::Halted { .. }) => {
                return Err(e).context("Re-run with --retry to attempt the stage again")
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// The configured HTTP generator, bounded by the configured timeout
pub fn service_generator(config: &Config) -> anyhow::Result<WithTimeout<OpenAiClient>> {
    let client = OpenAiClient::from_env(&config.service.api_key_env)?
        .with_base_url(config.service.base_url.clone());
    Ok(WithTimeout::new(client, config.service.timeout()))
}

/// Render a completed session into the output directory
pub fn render(config: &Config, session: &Session, out_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let sections = session.completed_sections().map_err(|missing| {
        anyhow::anyhow!("Session is incomplete: section '{}' has not been generated", missing)
    })?;
    let classification = session
        .classification()
        .cloned()
        .context("Session has no organization types selected")?;

    let now = Local::now().naive_local();
    let document = ReportDocument {
        profile: session.profile().clone(),
        classification,
        sections,
        contact: config.branding.contact.clone(),
        report_date: now.date(),
    };
    let options = RenderOptions {
        header_title: config.branding.header_title.clone(),
        disclaimer_title: config.branding.disclaimer_title.clone(),
        generated_at: now,
    };
    let resources = DirectoryResources::new(&config.resources.directory);
    let report = render_report(&document, &resources, &options)?;

    let dir = out_dir.unwrap_or(config.output.directory.as_path());
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(report_filename(&now));
    fs::write(&path, &report.bytes)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), pages = report.page_count, "Report written");
    Ok(path)
}

/// Print the questionnaire catalogs
pub fn print_catalog(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Industries:")?;
    for industry in INDUSTRIES {
        let note = if catalog::is_catalog_industry(industry) {
            ""
        } else {
            " (specify your own)"
        };
        writeln!(out, "  - {}{}", industry, note)?;
    }

    writeln!(out, "\nOrganization types:")?;
    for org_type in OrganizationType::ALL {
        writeln!(out, "  {}", org_type.label())?;
        for framework in org_type.frameworks() {
            writeln!(out, "      {}", framework)?;
        }
    }

    writeln!(out, "\nReadiness questions:")?;
    for question in READINESS_QUESTIONS.iter() {
        writeln!(out, "  [{}] {}", question.id, question.prompt)?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(out, "      {}. {}", i + 1, option)?;
        }
    }
    Ok(())
}
