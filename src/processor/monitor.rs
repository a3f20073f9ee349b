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
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::engine::{MAX_SLICES, PERCENT_PLAYED_NOT_PLAYING};

/// Playback state published by the real-time thread for display.
///
/// Values are `f32` bits stored in relaxed atomics. Readers may see a mix of
/// two consecutive blocks, which is fine for display.
///
/// The adopted and captured buffer versions live here too. They only grow,
/// so a reader that polls late still sees the latest one.
pub struct SliceMonitor {
    percent_played: [AtomicU32; MAX_SLICES],
    sampling_progress: AtomicU32,
    frames_processed: AtomicU64,
    adopted_version: AtomicU64,
    captured_version: AtomicU64,
}

impl Default for SliceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SliceMonitor {
    pub fn new() -> Self {
        Self {
            percent_played: std::array::from_fn(|_| {
                AtomicU32::new(PERCENT_PLAYED_NOT_PLAYING.to_bits())
            }),
            sampling_progress: AtomicU32::new(PERCENT_PLAYED_NOT_PLAYING.to_bits()),
            frames_processed: AtomicU64::new(0),
            adopted_version: AtomicU64::new(0),
            captured_version: AtomicU64::new(0),
        }
    }

    /// Fraction played of a slice, or [`PERCENT_PLAYED_NOT_PLAYING`].
    pub fn percent_played(&self, slice: usize) -> f32 {
        self.percent_played
            .get(slice)
            .map_or(PERCENT_PLAYED_NOT_PLAYING, |value| {
                f32::from_bits(value.load(Ordering::Relaxed))
            })
    }

    pub(crate) fn set_percent_played(&self, slice: usize, percent: f32) {
        if let Some(value) = self.percent_played.get(slice) {
            value.store(percent.to_bits(), Ordering::Relaxed);
        }
    }

    /// Progress of the current sampling pass in [0, 1], `None` when idle.
    pub fn sampling_progress(&self) -> Option<f32> {
        let progress = f32::from_bits(self.sampling_progress.load(Ordering::Relaxed));
        (progress >= 0.0).then_some(progress)
    }

    pub(crate) fn set_sampling_progress(&self, progress: Option<f32>) {
        let progress = progress.unwrap_or(PERCENT_PLAYED_NOT_PLAYING);
        self.sampling_progress
            .store(progress.to_bits(), Ordering::Relaxed);
    }

    /// Frames processed by the real-time thread so far.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub(crate) fn set_frames_processed(&self, frames: u64) {
        self.frames_processed.store(frames, Ordering::Relaxed);
    }

    /// Latest buffer version the real-time thread adopted from the UI side.
    pub fn adopted_version(&self) -> u64 {
        self.adopted_version.load(Ordering::Acquire)
    }

    pub(crate) fn set_adopted_version(&self, version: u64) {
        self.adopted_version.fetch_max(version, Ordering::Release);
    }

    /// Version of the latest completed sampling pass, 0 if none.
    pub fn captured_version(&self) -> u64 {
        self.captured_version.load(Ordering::Acquire)
    }

    pub(crate) fn set_captured_version(&self, version: u64) {
        self.captured_version.fetch_max(version, Ordering::Release);
    }
}

impl std::fmt::Debug for SliceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceMonitor")
            .field("sampling_progress", &self.sampling_progress())
            .field("frames_processed", &self.frames_processed())
            .field("adopted_version", &self.adopted_version())
            .field("captured_version", &self.captured_version())
            .finish()
    }
}
