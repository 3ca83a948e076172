//! artxml - publisher-schema XML converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use artxml::builder::{ArticleMeta, build_article, build_from_record_file};
use artxml::config::Config;
use artxml::document::open_paragraphs;
use artxml::transcode::record_from_xml_file;
use artxml::validate::validate_with_xmllint;

#[derive(Parser)]
#[command(name = "artxml")]
#[command(version, about = "Convert word-processor documents into publisher-schema XML", long_about = None)]
#[command(after_help = "EXAMPLES:
    artxml decompose article.xml -o article.json    XML to structured form
    artxml render article.json -o article.xml       Structured form back to XML
    artxml convert paper.docx --meta meta.xml --dtd dtd/art560.dtd")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log per-stage detail
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Read an XML file into its structured-form JSON record
    Decompose {
        #[arg(value_name = "XML")]
        input: PathBuf,

        /// Write the record here instead of stdout
        #[arg(short, long, value_name = "JSON")]
        output: Option<PathBuf>,
    },

    /// Rebuild XML from a structured-form JSON record
    Render {
        #[arg(value_name = "JSON")]
        input: PathBuf,

        /// Write the XML here instead of stdout
        #[arg(short, long, value_name = "XML")]
        output: Option<PathBuf>,
    },

    /// Convert .docx documents into article XML
    Convert {
        #[arg(value_name = "DOCX", required = true)]
        inputs: Vec<PathBuf>,

        /// Metadata record with an item-info section
        #[arg(long, value_name = "XML")]
        meta: Option<PathBuf>,

        /// Validate each result against this DTD
        #[arg(long, value_name = "DTD")]
        dtd: Option<PathBuf>,

        /// Directory for the generated XML (defaults to each input's directory)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Returns `Ok(false)` when some inputs of a batch failed.
fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    match cli.command {
        Command::Decompose { input, output } => {
            let record = record_from_xml_file(&input)
                .with_context(|| format!("failed to decompose {}", input.display()))?;
            emit(&record.to_json_pretty()?, output.as_deref())?;
            Ok(true)
        }
        Command::Render { input, output } => {
            let xml = build_from_record_file(&input)
                .with_context(|| format!("failed to render {}", input.display()))?;
            emit(&xml, output.as_deref())?;
            Ok(true)
        }
        Command::Convert {
            inputs,
            meta,
            dtd,
            out_dir,
        } => {
            let meta = match &meta {
                Some(path) => ArticleMeta::from_path(path)
                    .with_context(|| format!("failed to read metadata {}", path.display()))?,
                None => ArticleMeta::default(),
            };

            let mut failed = 0;
            for input in &inputs {
                let job = ConvertJob {
                    input,
                    meta: &meta,
                    config: &config,
                    dtd: dtd.as_deref(),
                    out_dir: out_dir.as_deref(),
                };
                if let Err(e) = job.run() {
                    log::error!("{}: {e:#}", input.display());
                    failed += 1;
                }
            }

            if failed > 0 {
                log::error!("{failed} of {} input(s) failed", inputs.len());
            }
            Ok(failed == 0)
        }
    }
}

/// One input of a `convert` batch. Failures stay local to the job.
struct ConvertJob<'a> {
    input: &'a Path,
    meta: &'a ArticleMeta,
    config: &'a Config,
    dtd: Option<&'a Path>,
    out_dir: Option<&'a Path>,
}

impl ConvertJob<'_> {
    fn run(&self) -> Result<()> {
        let paragraphs = open_paragraphs(self.input).context("failed to read document")?;
        let tree = build_article(paragraphs, self.meta, self.config);

        let output = self.output_path()?;
        std::fs::write(&output, tree.to_xml(self.config)?)
            .with_context(|| format!("failed to write {}", output.display()))?;
        log::info!("{} -> {}", self.input.display(), output.display());

        // The written output stands whatever validation says.
        if let Some(dtd) = self.dtd {
            let report = validate_with_xmllint(&tree.to_body_xml()?, dtd, &self.config.schema)
                .with_context(|| format!("validation against {} failed", dtd.display()))?;
            for violation in &report.violations {
                log::warn!("  line {}: {}", violation.line, violation.message);
            }
        }
        Ok(())
    }

    fn output_path(&self) -> Result<PathBuf> {
        let stem = self
            .input
            .file_stem()
            .with_context(|| format!("no file name in {}", self.input.display()))?;
        let dir = match self.out_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                dir.to_path_buf()
            }
            None => self
                .input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        let mut name = stem.to_os_string();
        name.push(".xml");
        Ok(dir.join(name))
    }
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}
