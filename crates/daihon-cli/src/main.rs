//! Daihon script inspector.
//!
//! Usage:
//!   daihon summary script.json
//!   daihon estimate "오늘은 날씨가 좋습니다"
//!   daihon at script.json 12.5
//!   daihon normalize draft.json clean.json
//!
//!   # Custom estimator weights / timeline scale
//!   daihon --config daihon.ron summary script.json

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use daihon_autosave::{JsonFilePersist, Persist};
use daihon_doc::{DurationEstimator, EditorConfig, LoadReport, ScriptEditor};

/// Inspect and tidy block-structured narration scripts.
#[derive(Parser, Debug)]
#[command(name = "daihon")]
#[command(about = "Inspect block-structured narration scripts")]
struct Args {
    /// Editor config (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-block timing table and total length
    Summary {
        /// JSON array of {id, type, content, order} records
        script: PathBuf,
    },
    /// Estimated narration length of a piece of text
    Estimate { text: String },
    /// Which block is playing at a given time
    At {
        script: PathBuf,
        /// Seconds from the start
        seconds: f64,
    },
    /// Load, validate and rewrite a script with contiguous order
    Normalize { input: PathBuf, output: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match args.command {
        Command::Summary { script } => summary(&script, config),
        Command::Estimate { text } => {
            let secs = DurationEstimator::new(config.estimator).estimate(&text);
            println!("{secs:.1}s");
            Ok(())
        }
        Command::At { script, seconds } => at(&script, seconds, config),
        Command::Normalize { input, output } => normalize(&input, &output, config).await,
    }
}

fn load(path: &Path, config: EditorConfig) -> Result<ScriptEditor> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (editor, report) = ScriptEditor::load_json(&text, config)
        .with_context(|| format!("{} is not a JSON array of blocks", path.display()))?;
    report_skipped(&report);
    Ok(editor)
}

fn report_skipped(report: &LoadReport) {
    for skipped in &report.skipped {
        eprintln!("skipped {skipped}");
    }
    if report.seeded {
        eprintln!("no valid blocks; started with an empty body block");
    }
}

fn summary(path: &Path, config: EditorConfig) -> Result<()> {
    let editor = load(path, config)?;
    println!("{:>3}  {:<5}  {:>7}  {:>7}  {:>6}  content", "#", "type", "start", "end", "secs");
    for block in editor.blocks() {
        let marker = if block.is_measured() { "*" } else { "" };
        println!(
            "{:>3}  {:<5}  {:>7.1}  {:>7.1}  {:>5.1}{:<1}  {}",
            block.order,
            block.kind.as_str(),
            block.timing.start,
            block.timing.end,
            block.duration,
            marker,
            preview(&block.content, 40),
        );
    }
    println!("{}", editor.summary());
    Ok(())
}

fn at(path: &Path, seconds: f64, config: EditorConfig) -> Result<()> {
    let editor = load(path, config)?;
    let timeline = editor.timeline();
    let id = timeline.time_to_block(seconds).with_context(|| {
        format!("{seconds}s is outside the script (0.0..={:.1}s)", timeline.total())
    })?;
    let block = editor
        .store()
        .get(id)
        .context("timeline points at a missing block")?;
    println!(
        "{} [{}] {:.1}..{:.1}s  {}",
        block.id,
        block.kind,
        block.timing.start,
        block.timing.end,
        preview(&block.content, 60),
    );
    Ok(())
}

async fn normalize(input: &Path, output: &Path, config: EditorConfig) -> Result<()> {
    let editor = load(input, config)?;
    JsonFilePersist::new(output)
        .save(&editor.store().records())
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(blocks = editor.blocks().len(), path = %output.display(), "normalized script");
    Ok(())
}

/// First `max` chars on one line.
fn preview(content: &str, max: usize) -> String {
    let flat = content.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_by_char() {
        assert_eq!(preview("short", 40), "short");
        assert_eq!(preview("line one\nline two", 40), "line one line two");
        assert_eq!(preview("가나다라마", 4), "가나다…");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["daihon", "at", "s.json", "2.5", "--config", "d.ron"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("d.ron")));
        assert!(matches!(args.command, Command::At { seconds, .. } if seconds == 2.5));
    }
}
