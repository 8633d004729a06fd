//! pdf-audio - Convert PDF documents to MP3 audiobooks using text-to-speech

mod audio;
mod config;
mod error;
mod job;
mod pdf;
mod synth;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PdfAudioConfig;
use indicatif::{ProgressBar, ProgressStyle};
use job::{AudiobookJob, JobOptions, JobStatus, Progress, Stage};
use pdf::PageRange;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tts_client::VoiceProfile;

#[derive(Parser, Debug)]
#[command(name = "pdf-audio")]
#[command(about = "Convert PDF documents to MP3 audiobooks using text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    pdf_file: Option<PathBuf>,

    /// Output file path (default: <pdf-name>.mp3)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Voice as accent-gender (e.g. "british-female", "american-male")
    #[arg(long)]
    voice: Option<String>,

    /// Explicit provider voice id (e.g. "en-GB-SoniaNeural"), overriding --voice
    #[arg(long)]
    voice_id: Option<String>,

    /// Page range to convert, 1-indexed inclusive (e.g. "5-40", "7", "12-")
    #[arg(long)]
    pages: Option<String>,

    /// Maximum characters per synthesis chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Provider preference order (comma-separated: azure,google,espeak)
    #[arg(long)]
    providers: Option<String>,

    /// Synthesize and export only the first chunk as a sample
    #[arg(long)]
    preview: bool,

    /// Cap the preview to this many seconds
    #[arg(long)]
    preview_seconds: Option<f64>,

    /// MP3 bitrate in kbit/s
    #[arg(long)]
    bitrate: Option<u32>,

    /// Retries per provider on transient synthesis errors
    #[arg(long, default_value_t = synth::DEFAULT_MAX_RETRIES)]
    retries: u32,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice
    SetVoice {
        /// Voice as accent-gender (e.g. "british-female")
        voice: String,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Maximum characters per chunk
        chars: usize,
    },
    /// Set default provider order
    SetProviders {
        /// Comma-separated provider names
        providers: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        None => {}
    }

    // Require a PDF file for conversion
    let pdf_path = args.pdf_file.clone().ok_or_else(|| {
        anyhow::anyhow!("PDF file path is required. Run 'pdf-audio --help' for usage.")
    })?;

    if !pdf_path.exists() {
        anyhow::bail!("PDF file not found: {}", pdf_path.display());
    }

    // Load configuration
    let config = PdfAudioConfig::load().context("Failed to load configuration")?;

    // Determine output path
    let output_path = args.output.clone().unwrap_or_else(|| {
        let stem = pdf_path.file_stem().unwrap_or_default();
        pdf_path.with_file_name(format!("{}.mp3", stem.to_string_lossy()))
    });

    let voice = VoiceProfile::parse(args.voice.as_deref().unwrap_or(&config.voice))
        .context("Invalid voice selection")?;

    let pages = match &args.pages {
        Some(spec) => PageRange::parse(spec)?,
        None => PageRange::ALL,
    };

    if args.debug {
        eprintln!("PDF: {}", pdf_path.display());
        eprintln!("Output: {}", output_path.display());
        eprintln!("Voice: {}", voice);
        eprintln!("Pages: {:?}", pages);
    }

    // FFmpeg is needed at the very end; catch its absence before any
    // synthesis cost is incurred.
    if !audio::is_ffmpeg_available() || !audio::is_ffprobe_available() {
        anyhow::bail!(
            "FFmpeg not found on PATH. Install FFmpeg (with ffprobe) to export MP3 audio, then re-run."
        );
    }

    let pdf_bytes = std::fs::read(&pdf_path)
        .with_context(|| format!("Failed to read {}", pdf_path.display()))?;

    let total_pages = pdf::page_count(&pdf_bytes)?;
    eprintln!("Document: {} ({} pages)", pdf_path.display(), total_pages);

    // Build the provider chain
    let provider_names: Vec<String> = match &args.providers {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => config.providers.clone(),
    };
    let tts_config = tts_client::Config::load().context("Failed to load TTS configuration")?;
    let chain = tts_client::build_chain(&provider_names, &tts_config);
    for (name, reason) in &chain.skipped {
        log::warn!("provider '{}' unavailable: {}", name, reason);
    }
    if chain.providers.is_empty() {
        anyhow::bail!(
            "No usable speech providers.\n\n\
             Set AZURE_SPEECH_KEY or GOOGLE_TTS_API_KEY for cloud synthesis,\n\
             or install espeak-ng for offline synthesis."
        );
    }
    let chain_names: Vec<&str> = chain.providers.iter().map(|p| p.name()).collect();
    eprintln!("Providers: {}", chain_names.join(" -> "));
    eprintln!("Voice: {}", voice);

    // Ctrl-C requests a cooperative stop at the next chunk boundary.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling after the current chunk...");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let options = JobOptions {
        pages,
        voice,
        voice_id: args.voice_id.clone(),
        max_chunk_chars: args.chunk_size.unwrap_or(config.chunk_size),
        structure: pdf::StructureOptions {
            heading_ratio: config.heading_ratio,
            ..Default::default()
        },
        assembly: audio::AssemblyOptions {
            bitrate_kbps: args.bitrate.unwrap_or(config.bitrate_kbps),
            preview: args.preview,
            preview_seconds: args.preview_seconds,
        },
        max_retries: args.retries,
        output_path: output_path.clone(),
    };

    let job = AudiobookJob::new(&chain.providers, options);
    if args.debug {
        eprintln!("Job created: {}", job.created_at());
    }

    // Stage announcements plus a progress bar while synthesizing
    let mut bar: Option<ProgressBar> = None;
    let mut last_stage: Option<Stage> = None;
    let (result, report) = job
        .run(&pdf_bytes, &cancel, |progress: Progress| {
            match progress.stage {
                Stage::Synthesizing => {
                    let bar = bar.get_or_insert_with(|| {
                        let b = ProgressBar::new(progress.total as u64);
                        b.set_style(
                            ProgressStyle::default_bar()
                                .template(
                                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                                )
                                .unwrap()
                                .progress_chars("#>-"),
                        );
                        b
                    });
                    bar.set_position(progress.completed as u64);
                    if progress.completed == progress.total {
                        bar.finish_with_message("synthesis complete");
                    }
                }
                stage => {
                    if last_stage != Some(stage) {
                        eprintln!("{}...", stage.label());
                    }
                }
            }
            last_stage = Some(progress.stage);
        })
        .await;

    if args.debug {
        eprintln!("{}", serde_json::to_string_pretty(&result)?);
    }

    match result.status {
        JobStatus::Completed => {
            if let Some(report) = report {
                let metadata = std::fs::metadata(&report.output_path)?;
                let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
                eprintln!(
                    "\nAudiobook ready: {} segments, {:.1} minutes",
                    report.segments_assembled,
                    report.duration_secs / 60.0
                );
                eprintln!(
                    "Output: {} ({:.1} MB)",
                    report.output_path.display(),
                    size_mb
                );
            }
            Ok(())
        }
        JobStatus::Failed => {
            let (kind, message) = result
                .error
                .as_ref()
                .map(|e| (e.kind.as_str(), e.message.as_str()))
                .unwrap_or(("unknown", "unknown error"));
            anyhow::bail!("Conversion failed [{}]: {}", kind, message);
        }
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PdfAudioConfig::load()?;
            println!("Configuration file: {:?}", PdfAudioConfig::config_path()?);
            println!();
            println!("voice = \"{}\"", config.voice);
            println!("chunk_size = {}", config.chunk_size);
            println!("providers = {:?}", config.providers);
            println!("bitrate_kbps = {}", config.bitrate_kbps);
            println!("heading_ratio = {}", config.heading_ratio);
        }
        ConfigAction::SetVoice { voice } => {
            // Validate before persisting
            let parsed = VoiceProfile::parse(voice).context("Invalid voice selection")?;
            let mut config = PdfAudioConfig::load()?;
            config.voice = voice.to_lowercase();
            config.save()?;
            println!("Default voice set to: {}", parsed);
        }
        ConfigAction::SetChunkSize { chars } => {
            if *chars == 0 {
                anyhow::bail!("Chunk size must be at least 1 character");
            }
            let mut config = PdfAudioConfig::load()?;
            config.chunk_size = *chars;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetProviders { providers } => {
            let names: Vec<String> = providers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            for name in &names {
                tts_client::ProviderKind::from_str(name)
                    .with_context(|| format!("Unknown provider: {}", name))?;
            }
            if names.is_empty() {
                anyhow::bail!("At least one provider is required");
            }
            let mut config = PdfAudioConfig::load()?;
            config.providers = names;
            config.save()?;
            println!("Default providers set to: {:?}", config.providers);
        }
    }
    Ok(())
}
