//! Text scramble reveal
//!
//! Resolves the final text left to right; characters not yet resolved show a
//! random glyph each frame.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::spring::FrameStatus;
use crate::settings::ScrambleConfig;

#[derive(Debug, Clone)]
pub struct TextScramble {
    target: Vec<char>,
    glyphs: Vec<char>,
    frames_per_char: u32,
    frame: u32,
    rng: Pcg32,
}

impl TextScramble {
    /// With `reduced_motion` the text starts fully revealed
    pub fn new(text: &str, config: &ScrambleConfig, seed: u64, reduced_motion: bool) -> Self {
        let mut scramble = Self {
            target: text.chars().collect(),
            glyphs: config.glyphs.chars().collect(),
            frames_per_char: config.frames_per_char.max(1),
            frame: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        if reduced_motion || config.disabled {
            scramble.finish();
        }
        scramble
    }

    pub fn text(&self) -> String {
        self.target.iter().collect()
    }

    /// Characters already resolved
    pub fn revealed(&self) -> usize {
        ((self.frame / self.frames_per_char) as usize).min(self.target.len())
    }

    pub fn is_done(&self) -> bool {
        self.revealed() >= self.target.len()
    }

    pub fn step(&mut self) -> FrameStatus {
        if self.is_done() {
            return FrameStatus::Idle;
        }
        self.frame += 1;
        if self.is_done() {
            FrameStatus::Converged
        } else {
            FrameStatus::Running
        }
    }

    /// Current display string
    pub fn render(&mut self) -> String {
        let revealed = self.revealed();
        let mut out = String::with_capacity(self.target.len());
        for (i, &c) in self.target.iter().enumerate() {
            if i < revealed || c.is_whitespace() || self.glyphs.is_empty() {
                out.push(c);
            } else {
                out.push(self.glyphs[self.rng.random_range(0..self.glyphs.len())]);
            }
        }
        out
    }

    pub fn restart(&mut self) {
        self.frame = 0;
    }

    pub fn finish(&mut self) {
        self.frame = self.target.len() as u32 * self.frames_per_char;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveals_left_to_right() {
        let config = ScrambleConfig::default();
        let mut s = TextScramble::new("Hello world", &config, 42, false);
        assert_eq!(s.revealed(), 0);

        let mut frames = 0;
        while s.step() == FrameStatus::Running {
            frames += 1;
            let shown = s.render();
            let revealed = s.revealed();
            assert_eq!(&shown[..revealed], &"Hello world"[..revealed]);
            assert_eq!(shown.chars().nth(5), Some(' '));
        }
        assert!(s.is_done());
        assert_eq!(s.render(), "Hello world");
        assert_eq!(frames + 1, 11 * config.frames_per_char as usize);
        assert_eq!(s.step(), FrameStatus::Idle);
    }

    #[test]
    fn test_unresolved_chars_use_glyphs() {
        let config = ScrambleConfig::default();
        let mut s = TextScramble::new("abc", &config, 1, false);
        let shown = s.render();
        assert!(shown.chars().all(|c| config.glyphs.contains(c)));
    }

    #[test]
    fn test_reduced_motion_shows_final_text() {
        let mut s = TextScramble::new("Launch", &ScrambleConfig::default(), 3, true);
        assert!(s.is_done());
        assert_eq!(s.render(), "Launch");
        assert_eq!(s.step(), FrameStatus::Idle);
    }

    #[test]
    fn test_restart_scrambles_again() {
        let mut s = TextScramble::new("Go", &ScrambleConfig::default(), 9, true);
        s.restart();
        assert!(!s.is_done());
        assert_eq!(s.step(), FrameStatus::Running);
    }
}
