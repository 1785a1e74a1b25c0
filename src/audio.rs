//! Sound effects
//!
//! Loads short samples from an assets directory when one is present.
//! The game is fully playable silent: a missing audio device or missing
//! files just mean no sound.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Rotate,
    Lock,
    Clear,
    LevelUp,
    GameOver,
}

impl Sfx {
    fn filename(&self) -> &'static str {
        match self {
            Sfx::Rotate => "rotate.wav",
            Sfx::Lock => "lock.wav",
            Sfx::Clear => "clear.wav",
            Sfx::LevelUp => "level_up.wav",
            Sfx::GameOver => "game_over.wav",
        }
    }
}

/// Audio manager handles sound playback
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    assets_path: PathBuf,
    sfx_volume: f32,
}

impl AudioManager {
    /// Create a new audio manager. None when there is no output device
    /// or no assets directory to play from.
    pub fn new() -> Option<Self> {
        let (stream, stream_handle) = OutputStream::try_default().ok()?;
        let assets_path = Self::find_assets_path()?;

        Some(Self {
            _stream: stream,
            stream_handle,
            assets_path,
            sfx_volume: 0.5,
        })
    }

    fn find_assets_path() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("assets"),
            PathBuf::from("./assets"),
            std::env::current_exe().ok()?.parent()?.join("assets"),
        ];

        paths
            .iter()
            .find(|p| p.exists() && p.join("sfx").exists())
            .cloned()
    }

    /// Set SFX volume (0.0 to 1.0)
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    /// Play a sound effect
    pub fn play_sfx(&mut self, sfx: Sfx) {
        if self.sfx_volume <= 0.0 {
            return;
        }

        let path = self.assets_path.join("sfx").join(sfx.filename());

        if let Ok(file) = File::open(&path) {
            if let Ok(decoder) = Decoder::new(BufReader::new(file)) {
                if let Ok(sink) = Sink::try_new(&self.stream_handle) {
                    sink.set_volume(self.sfx_volume);
                    sink.append(decoder);
                    sink.detach(); // Let it play and clean up automatically
                }
            }
        }
    }
}
