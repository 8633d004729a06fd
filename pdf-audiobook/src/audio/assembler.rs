//! MP3 assembly using FFmpeg.
//!
//! Segments may arrive in mixed containers (MP3 from the cloud providers,
//! WAV from eSpeak), so assembly runs in two passes: normalize every
//! segment to mono PCM at a fixed rate, then concatenate with the concat
//! demuxer and encode once with libmp3lame.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;

use super::AudioSegment;

/// Intermediate sample rate all segments are normalized to.
const SAMPLE_RATE: &str = "24000";

#[derive(Error, Debug)]
pub enum AssemblyError {
    /// The external toolchain is missing entirely. Distinguished so the
    /// caller can tell the user to install it rather than blame the input.
    #[error("{tool} not found on PATH; install FFmpeg to export MP3 audio")]
    MissingExternalTool { tool: String },

    #[error("no audio segments to assemble")]
    Empty,

    #[error("audio segments are not contiguous: expected chunk {expected}, found {found}")]
    NonContiguous { expected: usize, found: usize },

    #[error("{tool} failed: {stderr}")]
    External { tool: String, stderr: String },

    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// MP3 bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Assemble only the first chunk's segment.
    pub preview: bool,
    /// Cap the output to this many seconds.
    pub preview_seconds: Option<f64>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            bitrate_kbps: 192,
            preview: false,
            preview_seconds: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    pub duration_secs: f64,
    pub segments_assembled: usize,
}

fn run_tool(mut cmd: Command, tool: &str) -> Result<std::process::Output, AssemblyError> {
    cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => AssemblyError::MissingExternalTool {
            tool: tool.to_string(),
        },
        _ => AssemblyError::Io(e),
    })
}

fn check_status(output: &std::process::Output, tool: &str) -> Result<(), AssemblyError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(AssemblyError::External {
        tool: tool.to_string(),
        stderr: stderr.trim().to_string(),
    })
}

/// Get duration of an audio file in seconds using ffprobe.
pub fn get_audio_duration_secs(audio_path: &Path) -> Result<f64, AssemblyError> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "quiet",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(audio_path);

    let output = run_tool(cmd, "ffprobe")?;
    check_status(&output, "ffprobe")?;

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse()
        .map_err(|e| AssemblyError::Parse {
            tool: "ffprobe".to_string(),
            message: format!("bad duration '{}': {}", duration_str.trim(), e),
        })
}

/// Require chunk indices 0..N-1 in order before any audio is touched.
fn validate_contiguous(segments: &[AudioSegment]) -> Result<(), AssemblyError> {
    if segments.is_empty() {
        return Err(AssemblyError::Empty);
    }
    for (expected, segment) in segments.iter().enumerate() {
        if segment.chunk_index != expected {
            return Err(AssemblyError::NonContiguous {
                expected,
                found: segment.chunk_index,
            });
        }
    }
    Ok(())
}

/// Concatenate ordered segments into a single MP3 file.
///
/// Fills in each processed segment's measured duration as a side effect.
pub fn assemble_mp3(
    segments: &mut [AudioSegment],
    output_path: &Path,
    options: &AssemblyOptions,
) -> Result<AssemblyReport, AssemblyError> {
    validate_contiguous(segments)?;

    let take = if options.preview { 1 } else { segments.len() };
    let temp_dir = TempDir::new()?;

    // Pass 1: write each segment out and normalize to a canonical WAV.
    let mut wav_paths = Vec::with_capacity(take);
    for segment in segments[..take].iter_mut() {
        let raw_path = temp_dir.path().join(format!(
            "chunk_{:05}.{}",
            segment.chunk_index,
            segment.encoding.extension()
        ));
        std::fs::write(&raw_path, &segment.audio)?;

        let wav_path = temp_dir
            .path()
            .join(format!("chunk_{:05}_norm.wav", segment.chunk_index));

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-i"])
            .arg(&raw_path)
            .args(["-ac", "1", "-ar", SAMPLE_RATE, "-c:a", "pcm_s16le"])
            .arg(&wav_path);
        let output = run_tool(cmd, "ffmpeg")?;
        check_status(&output, "ffmpeg")?;

        segment.duration_ms = get_audio_duration_secs(&wav_path)
            .ok()
            .map(|secs| (secs * 1000.0) as u64);
        wav_paths.push(wav_path);
    }

    // Pass 2: concatenate and encode once.
    let list_file = temp_dir.path().join("concat_list.txt");
    let mut list_content = String::new();
    for path in &wav_paths {
        // Escape single quotes in path
        let path_str = path.to_string_lossy().replace('\'', "'\\''");
        list_content.push_str(&format!("file '{}'\n", path_str));
    }
    std::fs::write(&list_file, &list_content)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_file);
    if let Some(seconds) = options.preview_seconds {
        cmd.args(["-t", &format!("{}", seconds)]);
    }
    cmd.args([
        "-c:a",
        "libmp3lame",
        "-b:a",
        &format!("{}k", options.bitrate_kbps),
    ])
    .arg(output_path);

    let output = run_tool(cmd, "ffmpeg")?;
    check_status(&output, "ffmpeg")?;

    let duration_secs = get_audio_duration_secs(output_path)?;

    Ok(AssemblyReport {
        output_path: output_path.to_path_buf(),
        duration_secs,
        segments_assembled: take,
    })
}

/// Check if FFmpeg is available on PATH.
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check if FFprobe is available on PATH.
pub fn is_ffprobe_available() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_client::{AudioEncoding, SynthesizedAudio};

    fn segment(chunk_index: usize) -> AudioSegment {
        AudioSegment::new(
            chunk_index,
            SynthesizedAudio {
                audio: vec![0u8; 16],
                encoding: AudioEncoding::Mp3,
                voice_id: "test".to_string(),
            },
        )
    }

    #[test]
    fn test_empty_segments_rejected() {
        let err = validate_contiguous(&[]).unwrap_err();
        assert!(matches!(err, AssemblyError::Empty));
    }

    #[test]
    fn test_gap_in_indices_rejected() {
        let segments = vec![segment(0), segment(2)];
        let err = validate_contiguous(&segments).unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::NonContiguous {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let segments = vec![segment(0), segment(0)];
        assert!(validate_contiguous(&segments).is_err());
    }

    #[test]
    fn test_contiguous_indices_accepted() {
        let segments = vec![segment(0), segment(1), segment(2)];
        assert!(validate_contiguous(&segments).is_ok());
    }

    #[test]
    fn test_ffmpeg_available() {
        // This test just checks the function doesn't panic
        let _ = is_ffmpeg_available();
    }

    #[test]
    fn test_ffprobe_available() {
        // This test just checks the function doesn't panic
        let _ = is_ffprobe_available();
    }

    // Note: Full integration tests for audio assembly would require actual
    // audio files and FFmpeg to be installed. These are better suited for
    // integration tests.
}
