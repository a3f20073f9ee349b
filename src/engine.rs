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

//! Real-time slice playback.
//!
//! This module provides:
//! - [`CrossFader`]: linear ramps that keep slice boundaries click-free
//! - [`Slicer`]: one channel iterating over a sample range
//! - [`Slice`]: one playable slice made of a slicer per channel
//! - [`SliceSet`]: every slice of the current buffer, with voice arbitration
//!
//! Nothing in here allocates, locks or logs once constructed; it runs on the
//! audio thread.

mod slice;
mod slice_set;
mod slicer;
mod xfade;

use serde::{Deserialize, Serialize};

pub use slice::{PlayState, Slice};
pub use slice_set::{SliceSet, Transition};
pub use slicer::Slicer;
pub use xfade::CrossFader;

/// Maximum number of output channels a slice renders.
pub const MAX_CHANNELS: usize = 2;

/// Maximum number of slices a buffer can be split into.
pub const MAX_SLICES: usize = 64;

/// Number of slices a new set is split into.
pub const DEFAULT_NUM_SLICES: usize = 16;

/// Reported instead of a percentage when a slice is not playing.
pub const PERCENT_PLAYED_NOT_PLAYING: f32 = -1.0;

/// How many slices may sound at once.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Polyphony {
    /// Only the most recently triggered slice plays.
    Mono,
    #[default]
    Poly,
}

/// What releasing a pad or note does.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// The slice plays while it is held.
    #[default]
    Hold,
    /// The slice plays to its end once triggered.
    Trigger,
}

/// Playback options of a single slice.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceSettings {
    #[serde(default)]
    pub reverse: bool,
    #[serde(default, rename = "loop")]
    pub loop_at_end: bool,
}
