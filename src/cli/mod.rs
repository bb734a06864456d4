//! Command-line interface for voicejot.
//!
//! Provides commands for processing recordings into the daily note (one-off,
//! by day, or watching the vault), reviewing the processing history and
//! showing the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::core::{Journal, Orchestrator, Outcome};
use crate::note::todays_note_path;

/// voicejot - Voice memos into your daily note
#[derive(Parser, Debug)]
#[command(name = "voicejot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .voicejot/config.yaml in this or a parent directory)
    #[arg(short, long, global = true, env = "VOICEJOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process specific recordings
    Process {
        /// Recording files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Daily note date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Process every recording made on a day
    Batch {
        /// Day to process (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Skip recordings the journal shows as already processed
        #[arg(long)]
        skip_processed: bool,
    },

    /// Watch the vault and process new recordings as they appear
    Watch {
        /// Directory to watch (defaults to the configured watch path)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show recent processing outcomes
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match self.command {
            Commands::Process { files, date } => process_files(config, files, date).await,
            Commands::Batch { date, skip_processed } => run_batch(config, date, skip_processed).await,
            Commands::Watch { path } => watch(config, path).await,
            Commands::History { limit } => show_history(&config, limit).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Process the given recordings one after another
async fn process_files(config: Config, files: Vec<PathBuf>, date: Option<NaiveDate>) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;
    let mut failed = 0;

    for file in &files {
        println!("🎙️  {}", file.display());
        let result = match date {
            Some(date) => orchestrator.process_and_record(file, date.and_time(Local::now().time())).await,
            None => orchestrator.process_recording(file).await,
        };

        match result {
            Ok(update) => {
                if update.summary_inserted {
                    println!("   ✅ Summary added");
                } else {
                    println!("   ℹ️  No embed found, summary skipped");
                }
                if let Some(task) = &update.rejected_task {
                    println!("   ⚠️  Tasks rejected: {}", task);
                } else if update.tasks.count() > 0 {
                    println!("   ✅ {} task(s) added", update.tasks.count());
                }
                println!("   📝 {}", update.note_path.display());
            }
            Err(failure) => {
                failed += 1;
                println!("   ❌ {}", failure);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} recording(s) failed", failed, files.len());
    }
    Ok(())
}

/// Process a day's recordings
async fn run_batch(config: Config, date: Option<NaiveDate>, skip_processed: bool) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let orchestrator = Orchestrator::from_config(config)?;

    println!("📂 Scanning: {}", orchestrator.config().watch.watch_path.display());
    let report = orchestrator.run_batch(date, skip_processed).await?;

    if report.found == 0 {
        println!("ℹ️  No recordings for {}", date);
        return Ok(());
    }

    println!();
    println!("Batch Results ({}):", date);
    println!("  Recordings found:   {}", report.found);
    println!("  Succeeded:          {}", report.succeeded);
    println!("  Failed:             {}", report.failed);
    if report.skipped > 0 {
        println!("  Already processed:  {}", report.skipped);
    }
    if report.tasks_rejected > 0 {
        println!("  Tasks rejected:     {}", report.tasks_rejected);
    }

    if report.failed > 0 {
        println!();
        println!("⚠️  See `voicejot history` for failure details");
    }

    Ok(())
}

/// Watch for new recordings until Ctrl+C
async fn watch(mut config: Config, path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = path {
        config.watch.watch_path = path;
    }
    config.watch.validate().context("Cannot start watcher")?;

    println!("👁️  Watching: {}", config.watch.watch_path.display());
    println!("    Press Ctrl+C to stop");

    let orchestrator = Orchestrator::from_config(config)?;
    orchestrator.run_watch().await?;

    println!("🛑 Watcher stopped");
    Ok(())
}

/// Show recent journal entries
async fn show_history(config: &Config, limit: usize) -> Result<()> {
    let journal = Journal::new(config.journal_path.clone());
    let entries = journal
        .recent(limit)
        .await
        .context("Failed to read processing journal")?;

    if entries.is_empty() {
        println!("No recordings processed yet");
        return Ok(());
    }

    println!("{:<20} {:<10} {:<12} {:<40}", "WHEN", "OUTCOME", "STAGE", "RECORDING");
    println!("{}", "-".repeat(85));

    for entry in entries {
        let name = entry
            .recording
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.recording.display().to_string());

        println!(
            "{:<20} {:<10} {:<12} {:<40}",
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.outcome.to_string(),
            entry.stage.to_string(),
            name
        );

        if let Some(error) = &entry.error {
            let marker = if entry.outcome == Outcome::Failed { "❌" } else { "⚠️ " };
            println!("    {} {}", marker, error);
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(config: &Config) -> Result<()> {
    println!("voicejot Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Notes:");
    println!("  Note root:      {}", config.note_root.display());
    println!(
        "  Today's note:   {}",
        todays_note_path(&config.note_root).display()
    );
    println!("  Task header:    {}", config.task_header);
    println!();
    println!("AI:");
    println!("  API base URL:   {}", config.api_base_url);
    println!("  Model:          {}", config.model);
    println!("  Language:       {}", config.language);
    println!(
        "  API key:        {}",
        if config.require_api_key().is_ok() { "set" } else { "(missing)" }
    );
    println!("  Token limit:    {}", config.chunking.token_threshold);
    println!("  Chunk size:     {} chars", config.chunking.chunk_chars);
    println!();
    println!("Recordings:");
    println!("  Watch path:     {}", config.watch.watch_path.display());
    println!("  Extension:      .{}", config.watch.extension);
    println!("  Stability:      {}s", config.watch.stability_delay_secs);
    println!("  Recursive:      {}", config.watch.recursive);
    println!();
    println!("Journal: {}", config.journal_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_with_date() {
        let cli = Cli::try_parse_from(["voicejot", "batch", "--date", "2024-01-01", "--skip-processed"]).unwrap();

        match cli.command {
            Commands::Batch { date, skip_processed } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert!(skip_processed);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_process_requires_files() {
        assert!(Cli::try_parse_from(["voicejot", "process"]).is_err());
    }
}
