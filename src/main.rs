use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{error, info, warn};

use course_notes_rust::config::Config;
use course_notes_rust::processing::CoursePipeline;

/// Tracing filter for the chosen verbosity
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "course_notes_rust=debug,info"
    } else {
        "course_notes_rust=info,warn"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Course Notes (Rust)")
        .version("0.1.0")
        .about("Turns recorded lecture videos into structured study notes")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to a config file (default: search standard locations)"),
        )
        .arg(
            Arg::new("course")
                .long("course")
                .value_name("NAME")
                .help("Course name (overrides COURSE_NAME from the config)"),
        )
        .arg(
            Arg::new("course-root")
                .short('d')
                .long("course-root")
                .value_name("DIR")
                .help("Root directory holding course directories"),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("NUM")
                .help("Number of sections generated concurrently"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logging
    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .init();
    if verbose {
        info!("Verbose logging enabled");
    }

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from(std::path::Path::new(path))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    if let Some(name) = matches.get_one::<String>("course") {
        config.course.name = name.clone();
    }
    if let Some(root) = matches.get_one::<String>("course-root") {
        config.course.root_dir = PathBuf::from(root);
    }
    if let Some(workers) = matches.get_one::<String>("workers") {
        config.notes.workers = workers.parse()?;
    }

    // Configuration problems are the only fatal errors
    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        return Err(e.into());
    }

    info!("🚀 Course Notes (Rust) starting...");
    info!("📁 Course root: {}", config.course.root_dir.display());
    info!("📖 Course: {}", config.course.name);

    let pipeline = CoursePipeline::new(config)?;

    let start_time = std::time::Instant::now();
    match pipeline.run().await {
        Ok(report) => {
            let duration = start_time.elapsed();
            info!("🎉 Processing completed in {:.2}s", duration.as_secs_f64());
            info!(
                "🎵 Extraction: {} done, {} skipped, {} failed",
                report.extraction.processed, report.extraction.skipped, report.extraction.failed
            );
            info!(
                "🎤 Transcription: {} done, {} skipped, {} failed",
                report.transcription.processed,
                report.transcription.skipped,
                report.transcription.failed
            );
            info!(
                "📝 Notes: {} done, {} skipped, {} failed",
                report.notes.processed, report.notes.skipped, report.notes.failed
            );
        }
        Err(e) => {
            // Best-effort policy: report and exit cleanly; completed work
            // is preserved and a re-run resumes where this one stopped
            error!("❌ Course processing failed: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_raises_filter_level() {
        assert_eq!(log_filter(false), "course_notes_rust=info,warn");
        assert_eq!(log_filter(true), "course_notes_rust=debug,info");
    }
}
