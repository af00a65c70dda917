//! Line-based terminal I/O and the bell-based audio cues.

use std::io::{self, Write as _};

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use services::{AudioCue, AudioCues};

/// Reads one trimmed answer per line from stdin.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub fn show(&self, text: &str) {
        println!("{text}");
    }

    /// Print `prompt` and wait for a line. `None` means stdin was closed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if stdout or stdin fails.
    pub async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{prompt}> ");
        io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Rings the terminal bell; the fanfare rings three times.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalAudio;

fn rings(cue: AudioCue) -> usize {
    match cue {
        AudioCue::Fanfare => 3,
        AudioCue::Correct | AudioCue::Wrong => 1,
    }
}

impl AudioCues for TerminalAudio {
    fn play(&self, cue: AudioCue) {
        let mut stderr = io::stderr();
        let _ = stderr.write_all("\x07".repeat(rings(cue)).as_bytes());
        let _ = stderr.flush();
        tracing::trace!(cue = %cue, "played cue");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanfare_rings_longest() {
        assert_eq!(rings(AudioCue::Fanfare), 3);
        assert_eq!(rings(AudioCue::Correct), 1);
        assert_eq!(rings(AudioCue::Wrong), 1);
    }
}
