//! ESG Starter's Kit command-line tool
//!
//! Collects an organization profile from a file, runs the seven generation
//! stages against an OpenAI-compatible service and renders the assessment
//! report as a PDF. Progress is saved to a session file after every stage,
//! so an interrupted run picks up where it stopped.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use report_pipeline::Pipeline;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod profile;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "esg")]
#[command(about = "Generate ESG readiness assessment reports")]
struct Args {
    /// Configuration file (defaults to ./esg.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the remaining sections, then render the report
    Run {
        /// Profile file (JSON or TOML); required for a new session
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Session file holding generation progress
        #[arg(short, long, default_value = "esg-session.json")]
        session: PathBuf,

        /// Clear a recorded stage failure and try that stage again
        #[arg(long)]
        retry: bool,

        /// Stop after generation without rendering
        #[arg(long)]
        no_render: bool,

        /// Output directory, overriding the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the report from a completed session
    Render {
        #[arg(short, long, default_value = "esg-session.json")]
        session: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List industries, organization types and readiness questions
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Catalog => {
            commands::print_catalog(&mut std::io::stdout().lock())?;
        }
        Command::Run {
            profile,
            session,
            retry,
            no_render,
            output,
        } => {
            let config = Config::load(args.config.as_deref())?;
            let mut state = commands::prepare_session(profile.as_deref(), &session)?;

            if !state.is_complete() {
                let generator = commands::service_generator(&config)?;
                info!(
                    base_url = %generator.inner().base_url(),
                    model = %config.service.model,
                    "Using generation service"
                );
                let pipeline =
                    Pipeline::new(generator).with_options(config.service.generate_options());
                commands::generate(&pipeline, &mut state, &session, retry).await?;
            } else {
                info!("All sections already generated");
            }

            if !no_render {
                let path = commands::render(&config, &state, output.as_deref())?;
                println!("{}", path.display());
            }
        }
        Command::Render { session, output } => {
            let config = Config::load(args.config.as_deref())?;
            let state = commands::load_session(&session)?
                .with_context(|| format!("No session found at {}", session.display()))?;
            let path = commands::render(&config, &state, output.as_deref())?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
