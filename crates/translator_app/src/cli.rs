use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use engine_logging::engine_info;
use translator_core::{is_known_language, PreviewTarget, ViewMode, TARGET_LANGUAGES};

use crate::platform::app::App;
use crate::platform::config::{AppConfig, CONFIG_FILENAME};
use crate::platform::logging::{self, LogDestination};
use crate::platform::workflow::{Workflow, WorkflowPlan};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "translator",
    version,
    about = "Upload, analyze and translate Markdown documents through a translation server"
)]
pub struct Cli {
    /// Config file; missing files fall back to defaults
    #[arg(long, global = true, default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Translation server origin, e.g. http://localhost:5001
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Push channel origin when it differs from the server
    #[arg(long, global = true)]
    pub push_url: Option<String>,

    /// Directory downloaded translations are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, global = true, value_enum)]
    pub log_destination: Option<LogDestination>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show previews as rendered HTML instead of raw Markdown
    #[arg(long, global = true)]
    pub rendered: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Upload, analyze and translate a Markdown file, then download the result
    Translate(TranslateArgs),
    /// Upload a file and show its source or one of its chunks
    Preview(PreviewArgs),
    /// Show the server's terminology database
    Terminology,
    /// List the supported target languages
    Languages,
    /// Write the effective configuration to the config path
    InitConfig,
}

#[derive(Debug, Args, Clone)]
pub struct TranslateArgs {
    /// Markdown file to translate
    pub file: PathBuf,

    /// Target language code
    #[arg(short, long)]
    pub language: Option<String>,

    /// Translate without the terminology database
    #[arg(long)]
    pub no_terminology: bool,

    /// Show the uploaded file before translating
    #[arg(long)]
    pub preview_source: bool,

    /// Show a chunk before translating; repeatable
    #[arg(long = "preview-chunk", value_name = "N")]
    pub preview_chunks: Vec<u32>,

    /// Show the translation once it completes
    #[arg(long)]
    pub preview_translation: bool,

    /// Skip downloading the result
    #[arg(long)]
    pub no_download: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    /// Markdown file to upload
    pub file: PathBuf,

    /// Chunk to show instead of the whole file
    #[arg(long, value_name = "N")]
    pub chunk: Option<u32>,

    /// Target language used for chunking
    #[arg(short, long)]
    pub language: Option<String>,
}

impl Cli {
    /// Config file merged with command-line overrides.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(&self.config)?;
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(push_url) = &self.push_url {
            config.push_url = Some(push_url.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(destination) = self.log_destination {
            config.log_destination = destination;
        }
        Ok(config)
    }

    fn preview_mode(&self) -> ViewMode {
        if self.rendered {
            ViewMode::Rendered
        } else {
            ViewMode::Raw
        }
    }

    fn colored(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    logging::initialize(config.log_destination, cli.verbose);
    engine_info!("Using server {}", config.server_url);

    match &cli.command {
        Command::Languages => {
            for (code, label) in TARGET_LANGUAGES {
                println!("{code:<22} {label}");
            }
            Ok(())
        }
        Command::InitConfig => {
            let path = config.save(&cli.config)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Command::Terminology => {
            let mut app = App::new(&config, cli.colored(), cli.preview_mode())?;
            let result = app.show_terminology();
            app.shutdown();
            result
        }
        Command::Translate(args) => {
            let language = pick_language(args.language.as_deref(), &config)?;
            let (filename, bytes) = read_document(&args.file)?;
            let mut previews_before = Vec::new();
            if args.preview_source {
                previews_before.push(PreviewTarget::Source);
            }
            previews_before.extend(args.preview_chunks.iter().copied().map(PreviewTarget::Chunk));
            let mut previews_after = Vec::new();
            if args.preview_translation {
                previews_after.push(PreviewTarget::Translation);
            }
            let plan = WorkflowPlan {
                filename,
                bytes,
                language,
                use_terminology: config.use_terminology && !args.no_terminology,
                previews_before,
                translate: true,
                previews_after,
                download: !args.no_download,
            };
            run_plan(&cli, &config, plan)
        }
        Command::Preview(args) => {
            let language = pick_language(args.language.as_deref(), &config)?;
            let (filename, bytes) = read_document(&args.file)?;
            let target = args.chunk.map_or(PreviewTarget::Source, PreviewTarget::Chunk);
            let plan = WorkflowPlan {
                filename,
                bytes,
                language,
                use_terminology: config.use_terminology,
                previews_before: vec![target],
                translate: false,
                previews_after: Vec::new(),
                download: false,
            };
            run_plan(&cli, &config, plan)
        }
    }
}

fn run_plan(cli: &Cli, config: &AppConfig, plan: WorkflowPlan) -> Result<()> {
    let mut app = App::new(config, cli.colored(), cli.preview_mode())?;
    let result = app.run_workflow(Workflow::new(plan));
    app.shutdown();
    result
}

fn pick_language(requested: Option<&str>, config: &AppConfig) -> Result<String> {
    let language = requested.unwrap_or(&config.language);
    if !is_known_language(language) {
        let known: Vec<&str> = TARGET_LANGUAGES.iter().map(|(code, _)| *code).collect();
        bail!(
            "unknown language {language:?}; expected one of: {}",
            known.join(", ")
        );
    }
    Ok(language.to_string())
}

fn read_document(path: &Path) -> Result<(String, Vec<u8>)> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_string();
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((filename, bytes))
}
