//! Fire-and-forget sound cues. Playback belongs to the host; the game only
//! says which cue fits the moment.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    Correct,
    Wrong,
    Fanfare,
}

impl AudioCue {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AudioCue::Correct => "correct",
            AudioCue::Wrong => "wrong",
            AudioCue::Fanfare => "fanfare",
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host audio layer. `play` must not block and reports nothing back.
pub trait AudioCues: Send + Sync {
    fn play(&self, cue: AudioCue);
}

/// Plays nothing; for tests and muted hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioCues for SilentAudio {
    fn play(&self, _cue: AudioCue) {}
}
