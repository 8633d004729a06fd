//! Audio segment model and MP3 assembly.

pub mod assembler;

pub use assembler::{
    AssemblyError, AssemblyOptions, AssemblyReport, assemble_mp3, is_ffmpeg_available,
    is_ffprobe_available,
};

use tts_client::{AudioEncoding, SynthesizedAudio};

/// The synthesized audio for one chunk.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Index of the chunk this audio renders.
    pub chunk_index: usize,
    /// Encoded audio bytes, exclusively owned until assembly.
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
    /// Measured during assembly; None until then.
    pub duration_ms: Option<u64>,
}

impl AudioSegment {
    pub fn new(chunk_index: usize, synthesized: SynthesizedAudio) -> Self {
        Self {
            chunk_index,
            audio: synthesized.audio,
            encoding: synthesized.encoding,
            duration_ms: None,
        }
    }
}
