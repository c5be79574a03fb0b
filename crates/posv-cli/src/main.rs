//! posv CLI - embed OpenAPI response validation into Postman collections

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use posv_core::{Config, CoverageReport, MatchPolicy, MergeStrategy, annotate};
use posv_loader::{load_collection, load_specification, output_path, write_collection, write_summary};

const CONFIG_FILE: &str = ".posv.toml";

#[derive(Parser)]
#[command(name = "posv")]
#[command(about = "Embed OpenAPI response validation into Postman collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Cli {
    fn log_level(&self) -> Level {
        match (self.output, self.verbose) {
            (_, true) => Level::DEBUG,
            (OutputFormat::Silent, false) => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add response-validation test scripts to every matched request
    Annotate {
        /// Postman collection (JSON or YAML)
        #[arg(short = 'c', long)]
        collection: Option<PathBuf>,

        /// OpenAPI 3.x or Swagger 2.0 specification (JSON or YAML)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Directory for the annotated collection
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Config file (default: .posv.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also assert the response status is one of the declared 2xx codes
        #[arg(long)]
        status_code_check: bool,

        /// Path matching policy
        #[arg(long)]
        match_policy: Option<MatchPolicyArg>,

        /// How earlier injected blocks are treated
        #[arg(long)]
        merge: Option<MergeArg>,

        /// Write the run report as JSON to this file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Annotate in memory and report without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a collection and/or specification without annotating
    Check {
        /// Postman collection (JSON or YAML)
        #[arg(short = 'c', long)]
        collection: Option<PathBuf>,

        /// OpenAPI 3.x or Swagger 2.0 specification (JSON or YAML)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the run report
    Schema,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MatchPolicyArg {
    Strict,
    Prefix,
}

impl From<MatchPolicyArg> for MatchPolicy {
    fn from(arg: MatchPolicyArg) -> Self {
        match arg {
            MatchPolicyArg::Strict => MatchPolicy::Strict,
            MatchPolicyArg::Prefix => MatchPolicy::Prefix,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeArg {
    Append,
    Replace,
}

impl From<MergeArg> for MergeStrategy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Append => MergeStrategy::Append,
            MergeArg::Replace => MergeStrategy::Replace,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Annotate {
            collection,
            spec,
            output_dir,
            config,
            status_code_check,
            match_policy,
            merge,
            summary,
            dry_run,
        } => {
            let cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::load_default()?,
            };

            let collection_path = collection
                .or_else(|| cfg.collection.clone())
                .context("no collection given (use --collection or set `collection` in .posv.toml)")?;
            let spec_path = spec
                .or_else(|| cfg.spec.clone())
                .context("no specification given (use --spec or set `spec` in .posv.toml)")?;

            let mut options = cfg.options();
            options.status_code_check |= status_code_check;
            if let Some(policy) = match_policy {
                options.match_policy = policy.into();
            }
            if let Some(merge) = merge {
                options.merge = merge.into();
            }

            let spec = load_specification(&spec_path)?;
            let mut collection = load_collection(&collection_path)?;
            let report = annotate(&mut collection, &spec, options);

            print_report(cli.output, &report)?;

            if dry_run {
                tracing::info!("dry run, nothing written");
                return Ok(0);
            }

            let out = output_path(&collection_path, output_dir.or(cfg.output_dir).as_deref());
            write_collection(&out, &collection)?;
            if cli.output != OutputFormat::Silent {
                eprintln!("Annotated collection: {}", out.display());
            }

            if let Some(path) = summary.or(cfg.summary) {
                write_summary(&path, &report)?;
                if cli.output != OutputFormat::Silent {
                    eprintln!("Summary: {}", path.display());
                }
            }
            Ok(0)
        }

        Commands::Check { collection, spec } => {
            if collection.is_none() && spec.is_none() {
                bail!("nothing to check (give --collection and/or --spec)");
            }
            let mut findings = serde_json::Map::new();

            if let Some(path) = spec {
                let spec = load_specification(&path)?;
                let info = serde_json::json!({
                    "file": path.display().to_string(),
                    "version": spec.version().as_str(),
                    "paths": spec.path_count(),
                    "operations": spec.operation_count(),
                });
                report_check(cli.output, "Specification", &path, &info);
                findings.insert("spec".into(), info);
            }

            if let Some(path) = collection {
                let collection = load_collection(&path)?;
                let info = serde_json::json!({
                    "file": path.display().to_string(),
                    "name": collection.name(),
                    "requests": collection.request_count(),
                });
                report_check(cli.output, "Collection", &path, &info);
                findings.insert("collection".into(), info);
            }

            if cli.output == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            }
            Ok(0)
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())
                .with_context(|| format!("cannot write {CONFIG_FILE}"))?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - collection: the Postman collection to annotate");
            println!("  - spec: path to your OpenAPI spec");
            println!("  - status_code_check, match_policy, merge");
            Ok(0)
        }

        Commands::Schema => {
            let schema = posv_core::coverage::generate_schema();
            println!("{schema}");
            Ok(0)
        }
    }
}

fn print_report(format: OutputFormat, report: &CoverageReport) -> Result<()> {
    match format {
        OutputFormat::Terminal => println!("{}", report.to_terminal()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Silent => {}
    }
    Ok(())
}

fn report_check(format: OutputFormat, kind: &str, path: &Path, info: &serde_json::Value) {
    if format != OutputFormat::Terminal {
        return;
    }
    println!("[OK] {kind} {}", path.display());
    if let Some(fields) = info.as_object() {
        for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != "file") {
            match value {
                serde_json::Value::String(s) => println!("  {key}: {s}"),
                serde_json::Value::Null => {}
                other => println!("  {key}: {other}"),
            }
        }
    }
}
