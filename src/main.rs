//! `pkgsec` — inspect analysis types, build analysis requests and review verdicts.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`pkgsec::config::load_config`]) and start logging ([`logging`]).
//! 3. Verify the analysis type table ([`pkgsec::analysis::types::init`]); a
//!    broken table aborts before any command runs.
//! 4. Run the subcommand and render its report ([`report`]).
//! 5. Exit `0`, or `1` when a request failed to build or a high-severity
//!    verdict is present.

mod cli;
mod logging;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};

use cli::{Cli, Command, OutputFormat};
use pkgsec::analysis::generate::Generator;
use pkgsec::analysis::{types, Builder, Request, Type, TypeComponents};
use pkgsec::config::{load_config, Config};
use pkgsec::detector::{classify_path, detect_ecosystems};
use pkgsec::error::RequestError;
use pkgsec::{Severity, Verdicts};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = load_config(&cwd, cli.config.as_deref())?;
    logging::init_tracing(&config.log)?;
    types::init().context("analysis type table is inconsistent")?;

    let ok = match cli.command {
        Command::Types => list_types(cli.quiet)?,
        Command::Decode { urn } => decode(&urn)?,
        Command::Build { file, online, format } => build(&config, &file, online, format, cli.quiet).await?,
        Command::Verdicts { file, filter, verbose } => verdicts(&file, filter.as_deref(), verbose, cli.quiet)?,
        Command::Generate { count, seed, reuse } => generate(count, seed, reuse)?,
        Command::Detect { path } => detect(&path, cli.quiet)?,
        Command::Seal { urn, extra } => seal(&urn, &extra)?,
        Command::Open { token } => open(&token)?,
    };

    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

fn list_types(quiet: bool) -> Result<bool> {
    if quiet {
        for kind in Type::ALL {
            println!("{}", kind);
        }
    } else {
        report::terminal::render_types(&Type::ALL)?;
    }
    Ok(true)
}

fn decode(urn: &str) -> Result<bool> {
    let components = TypeComponents::parse(urn)?;
    let registered = Type::from_urn(urn).ok();
    report::terminal::render_components(urn, &components, registered)?;
    Ok(registered.is_some())
}

async fn build(config: &Config, file: &Path, online: bool, format: OutputFormat, quiet: bool) -> Result<bool> {
    let raw = std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let inputs = split_requests(&raw)?;

    let builder = if online {
        Builder::from_config(&config.registry)?
    } else {
        Builder::new()
    };

    let results = build_all(&builder, &inputs, config.registry.batch_size, quiet).await?;
    let failed = results.iter().filter(|r| r.is_err()).count();

    match format {
        OutputFormat::Terminal => report::terminal::render_requests(&results, quiet)?,
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = results
                .iter()
                .map(|r| match r {
                    Ok(request) => serde_json::to_value(request),
                    Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
                })
                .collect::<Result<_, _>>()?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(failed == 0)
}

/// A request file holds either one request object or an array of them.
fn split_requests(raw: &[u8]) -> Result<Vec<Vec<u8>>> {
    let value: serde_json::Value = serde_json::from_slice(raw).context("request file is not JSON")?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    items
        .iter()
        .map(|item| serde_json::to_vec(item).map_err(Into::into))
        .collect()
}

async fn build_all(
    builder: &Builder,
    inputs: &[Vec<u8>],
    batch_size: usize,
    quiet: bool,
) -> Result<Vec<Result<Request, RequestError>>> {
    let pb = if !quiet {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut results = Vec::with_capacity(inputs.len());
    for batch in inputs.chunks(batch_size.max(1)) {
        let built = join_all(batch.iter().map(|raw| builder.build(raw))).await;
        if let Some(pb) = &pb {
            pb.inc(built.len() as u64);
        }
        results.extend(built);
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok(results)
}

fn verdicts(file: &Path, filter: Option<&str>, verbose: bool, quiet: bool) -> Result<bool> {
    let raw = std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let verdicts: Verdicts =
        serde_json::from_slice(&raw).with_context(|| format!("{} is not a verdict list", file.display()))?;

    let verdicts = match filter {
        None => verdicts,
        Some(expr) => {
            let filtered = verdicts.filter(expr)?;
            match filtered.verdicts {
                Ok(verdicts) => verdicts,
                Err(e) => {
                    // Not a verdict list: print what matched as plain JSON
                    tracing::debug!(error = %e, "filter result is not a verdict list");
                    println!("{}", serde_json::to_string_pretty(&filtered.value)?);
                    return Ok(true);
                }
            }
        }
    };

    report::terminal::render_verdicts(&verdicts, file, verbose, quiet)?;
    Ok(verdicts.max_severity() != Some(Severity::High))
}

fn generate(count: usize, seed: u64, reuse: f64) -> Result<bool> {
    let generator = Generator::new(seed).with_reuse(reuse);
    for request in generator.take(count) {
        println!("{}", serde_json::to_string(&request?)?);
    }
    Ok(true)
}

fn detect(path: &Path, quiet: bool) -> Result<bool> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let ecosystems = detect_ecosystems(&path);

    if ecosystems.is_empty() {
        eprintln!("No npm or PyPI project files found in {}", path.display());
        return Ok(false);
    }

    if quiet {
        let names: Vec<&str> = ecosystems.iter().map(|e| e.as_str()).collect();
        println!("{}", names.join(" "));
        return Ok(true);
    }

    let mut files: Vec<_> = std::fs::read_dir(&path)
        .with_context(|| format!("cannot list {}", path.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|file| classify_path(&file).map(|found| (file, found)))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    for ecosystem in &ecosystems {
        println!("  {} {}", "→".cyan(), ecosystem);
        for (file, (_, kind)) in files.iter().filter(|(_, (e, _))| e == ecosystem) {
            let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            println!("      {} ({})", name, kind);
        }
    }

    Ok(true)
}

fn seal(urn: &str, extra: &[String]) -> Result<bool> {
    let kind = Type::from_urn(urn)?;
    let extra: Vec<&str> = extra.iter().map(String::as_str).collect();
    println!("{}", hex::encode(kind.seal(&extra)?));
    Ok(true)
}

fn open(token: &str) -> Result<bool> {
    let bytes = hex::decode(token.trim()).context("token is not hex")?;
    let (kind, extra) = Type::open(&bytes)?;
    println!("{} {}", kind.name().bold(), kind);
    for field in extra {
        println!("  {}", field);
    }
    Ok(true)
}
