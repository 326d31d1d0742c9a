//! Matchup Scout
//!
//! Reads player names and character picks out of recorded match frames with
//! Tesseract, then aggregates them into per-matchup character statistics.

mod analysis;
mod config;
mod extraction;
mod ocr;
mod paths;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::config::AppConfig;
use crate::ocr::TextRecognizer;

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Logs a message to the console and, once configured, the log file, with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    if let Some(log_path) = LOG_FILE.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Extract and aggregate matchups from match frames")]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run OCR over every frame and write the frame table
    Extract {
        /// Directory holding the frame images
        #[arg(long)]
        frames: Option<PathBuf>,
        #[arg(long, default_value = "frames.csv")]
        output: PathBuf,
        #[arg(long, default_value = "failures.log")]
        failures: PathBuf,
        /// Process frames one at a time
        #[arg(long)]
        sequential: bool,
    },
    /// Aggregate a frame table into matchup summaries
    Aggregate {
        #[arg(long, default_value = "frames.csv")]
        input: PathBuf,
        #[arg(long, default_value = "matchups.csv")]
        output: PathBuf,
        /// Also write a JSON report
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        min_occurrences: Option<u32>,
    },
    /// Write the default configuration to a file
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    match paths::ensure_directories() {
        Ok(()) => {
            let _ = LOG_FILE.set(paths::get_log_file());
        }
        Err(e) => eprintln!("Warning: could not create logs directory: {}", e),
    }

    let config_path = cli.config.unwrap_or_else(paths::get_default_config_path);

    match cli.command {
        Command::InitConfig { path } => {
            AppConfig::save_default(&path)?;
            log(&format!("Default config written to {}", path.display()));
            Ok(())
        }
        Command::Extract {
            frames,
            output,
            failures,
            sequential,
        } => {
            let mut config = AppConfig::load(&config_path)?.extraction;
            if let Some(frames) = frames {
                config.frames_dir = frames;
            }
            if sequential {
                config.parallel = false;
            }
            if !config.frames_dir.is_dir() {
                return Err(anyhow!(
                    "Frames directory not found: {}",
                    config.frames_dir.display()
                ));
            }

            let recognizer = ocr::TesseractCli::from_config(&config.tesseract)?;
            ocr::setup::check_tesseract(recognizer.executable())?;

            let report = extraction::run_extraction(
                &config,
                &recognizer as &dyn TextRecognizer,
                &output,
                &failures,
            )?;
            log(&format!(
                "Done: {} frames processed, {} skipped",
                report.processed(),
                report.skipped()
            ));
            Ok(())
        }
        Command::Aggregate {
            input,
            output,
            json,
            min_occurrences,
        } => {
            let app_config = AppConfig::load(&config_path)?;
            let mut config = app_config.analysis;
            if let Some(min) = min_occurrences {
                config.min_occurrences = min;
            }
            let summaries = analysis::run_analysis(
                &input,
                &output,
                json.as_deref(),
                &config,
                &app_config.extraction.vocabulary,
            )?;
            log(&format!("Done: {} matchups written", summaries.len()));
            Ok(())
        }
    }
}
