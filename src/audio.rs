// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! In-memory sample data and WAV file access.
//!
//! Decoded audio lives in a [`SampleBuffers`] (planar, one `Vec<f32>` per
//! channel). Once a buffer is published to the real-time thread it is never
//! mutated again; edits produce a new buffer.

mod buffers;
mod error;
mod loader;

use std::time::Duration;

pub use buffers::SampleBuffers;
pub use error::LoadError;
pub use loader::{load_wav, write_wav};

/// Number of frames `duration` spans at `sample_rate`, rounded to nearest.
pub fn frames_for_duration(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_for_duration() {
        assert_eq!(frames_for_duration(Duration::from_millis(10), 48000), 480);
        assert_eq!(frames_for_duration(Duration::from_millis(2), 44100), 88);
        assert_eq!(frames_for_duration(Duration::ZERO, 44100), 0);
    }
}
