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
//! The set of slices covering the current buffer.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::audio::SampleBuffers;

use super::slice::Slice;
use super::{
    PlayMode, Polyphony, SliceSettings, DEFAULT_NUM_SLICES, MAX_SLICES,
    PERCENT_PLAYED_NOT_PLAYING,
};

/// Pending change of a slice's playback, computed from selection changes and
/// realized once per block by [`SliceSet::play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    #[default]
    None,
    Starting,
    Stopping,
    /// Stop followed by start within the same block.
    Restarting,
}

impl Transition {
    fn on_start(self) -> Transition {
        match self {
            Transition::None | Transition::Starting => Transition::Starting,
            Transition::Stopping | Transition::Restarting => Transition::Restarting,
        }
    }

    fn on_stop(self) -> Transition {
        match self {
            Transition::None | Transition::Stopping | Transition::Restarting => {
                Transition::Stopping
            }
            Transition::Starting => Transition::None,
        }
    }
}

/// Owns every slice of the current buffer and arbitrates which ones play.
///
/// The buffer is split into `num_slices` equal ranges; the remainder of the
/// integer division goes to the last slice. Selection changes are turned
/// into [`Transition`]s, which the next call to [`SliceSet::play`] realizes
/// and clears.
pub struct SliceSet {
    slices: [Slice; MAX_SLICES],
    transitions: [Transition; MAX_SLICES],
    settings: [SliceSettings; MAX_SLICES],
    buffers: Option<Arc<SampleBuffers>>,
    num_slices: NonZeroUsize,
    /// False when the buffer is shorter than the number of slices.
    ranges_valid: bool,
    polyphony: Polyphony,
    play_mode: PlayMode,
    xfade_samples: usize,
    /// Most recently started slice and its trigger frame (mono mode).
    last_triggered: Option<(usize, u64)>,
}

impl Default for SliceSet {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SliceSet {
    pub fn new(xfade_samples: usize) -> Self {
        Self {
            slices: std::array::from_fn(|_| Slice::new(xfade_samples)),
            transitions: [Transition::None; MAX_SLICES],
            settings: [SliceSettings::default(); MAX_SLICES],
            buffers: None,
            num_slices: NonZeroUsize::new(DEFAULT_NUM_SLICES).unwrap_or(NonZeroUsize::MIN),
            ranges_valid: false,
            polyphony: Polyphony::default(),
            play_mode: PlayMode::default(),
            xfade_samples,
            last_triggered: None,
        }
    }

    pub fn buffers(&self) -> Option<&Arc<SampleBuffers>> {
        self.buffers.as_ref()
    }

    /// Number of active slices.
    pub fn num_slices(&self) -> usize {
        self.num_slices.get()
    }

    pub fn polyphony(&self) -> Polyphony {
        self.polyphony
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn slice(&self, index: usize) -> Option<&Slice> {
        if index < self.num_slices() {
            self.slices.get(index)
        } else {
            None
        }
    }

    pub fn transition(&self, index: usize) -> Transition {
        self.transitions
            .get(index)
            .copied()
            .unwrap_or(Transition::None)
    }

    /// Replaces the buffer and re-splits it. Every slice is hard-stopped first
    /// because a fade in flight would read from the old buffer. Returns the
    /// previous buffer so the caller decides where it gets dropped.
    pub fn set_buffer(
        &mut self,
        buffers: Option<Arc<SampleBuffers>>,
    ) -> Option<Arc<SampleBuffers>> {
        for (slice, transition) in self.slices.iter_mut().zip(self.transitions.iter_mut()) {
            slice.hard_stop();
            *transition = Transition::None;
        }
        self.last_triggered = None;
        let previous = std::mem::replace(&mut self.buffers, buffers);
        self.split();
        previous
    }

    /// Changes how many slices the buffer is split into (capped at
    /// [`MAX_SLICES`]). Slices that are no longer active are silenced.
    pub fn set_num_slices(&mut self, num_slices: NonZeroUsize) {
        let num_slices = num_slices.min(NonZeroUsize::new(MAX_SLICES).unwrap_or(NonZeroUsize::MIN));
        for index in num_slices.get()..self.num_slices.get() {
            self.slices[index].hard_stop();
            self.transitions[index] = Transition::None;
        }
        if matches!(self.last_triggered, Some((index, _)) if index >= num_slices.get()) {
            self.last_triggered = None;
        }
        self.num_slices = num_slices;
        self.split();
    }

    pub fn set_polyphony(&mut self, polyphony: Polyphony) {
        self.polyphony = polyphony;
    }

    pub fn set_play_mode(&mut self, play_mode: PlayMode) {
        self.play_mode = play_mode;
    }

    /// Sets the fade length of every slice (below 2 disables fading).
    pub fn set_cross_fade(&mut self, xfade_samples: usize) {
        self.xfade_samples = xfade_samples;
        for slice in self.slices.iter_mut() {
            slice.set_cross_fade(xfade_samples);
        }
    }

    pub fn cross_fade(&self) -> usize {
        self.xfade_samples
    }

    pub fn settings(&self, index: usize) -> SliceSettings {
        self.settings.get(index).copied().unwrap_or_default()
    }

    pub fn set_settings(&mut self, index: usize, settings: SliceSettings) {
        if index >= MAX_SLICES {
            return;
        }
        self.settings[index] = settings;
        self.slices[index].set_reverse(settings.reverse);
    }

    /// Records a pad or note selection change for a slice. Indices beyond the
    /// active slice count are ignored. `trigger_frame` orders starts for mono
    /// voice stealing.
    pub fn set_selected(&mut self, index: usize, is_pad: bool, selected: bool, trigger_frame: u64) {
        if index >= self.num_slices() {
            return;
        }

        let slice = &mut self.slices[index];
        let was_selected = slice.is_selected();
        slice.set_selected(is_pad, selected);
        let is_selected = slice.is_selected();
        if was_selected == is_selected {
            return;
        }

        if is_selected {
            self.transitions[index] = self.transitions[index].on_start();
            match self.last_triggered {
                Some((_, frame)) if frame > trigger_frame => {}
                _ => self.last_triggered = Some((index, trigger_frame)),
            }
        } else if self.play_mode == PlayMode::Hold {
            self.transitions[index] = self.transitions[index].on_stop();
        }
    }

    /// Realizes the pending transitions and renders every playing slice into
    /// `output`. The first slice rendered overwrites `output`, the following
    /// ones are mixed in. Returns whether anything was rendered; when it
    /// returns `false` the contents of `output` are untouched.
    pub fn play(&mut self, output: &mut [Vec<f32>]) -> bool {
        let num_slices = self.num_slices();

        if self.polyphony == Polyphony::Mono {
            let keep = self.last_triggered.map(|(index, _)| index);
            for index in 0..num_slices {
                if Some(index) != keep
                    && (self.slices[index].is_playing()
                        || self.transitions[index] != Transition::None)
                {
                    self.transitions[index] = Transition::Stopping;
                }
            }
        }

        let mut rendered = false;
        let buffers = match (&self.buffers, self.ranges_valid) {
            (Some(buffers), true) => Some(buffers.as_ref()),
            _ => None,
        };

        for index in 0..num_slices {
            let slice = &mut self.slices[index];
            let transition = std::mem::take(&mut self.transitions[index]);
            let Some(buffers) = buffers else {
                continue;
            };

            match transition {
                Transition::None => {}
                Transition::Starting | Transition::Restarting => {
                    // Restart from a clean slicer rather than a fading one.
                    slice.hard_stop();
                    slice.start();
                }
                Transition::Stopping => {
                    if slice.is_playing() {
                        slice.request_stop();
                    }
                }
            }

            if slice.is_playing() {
                let finished = slice.play(
                    buffers,
                    output,
                    !rendered,
                    self.settings[index].loop_at_end,
                );
                rendered = true;
                if finished {
                    slice.hard_stop();
                }
            }
        }

        rendered
    }

    /// Fraction played of a slice, or [`PERCENT_PLAYED_NOT_PLAYING`].
    pub fn percent_played(&self, index: usize) -> f32 {
        self.slice(index)
            .map_or(PERCENT_PLAYED_NOT_PLAYING, Slice::percent_played)
    }

    /// Stops everything immediately.
    pub fn hard_stop_all(&mut self) {
        for (slice, transition) in self.slices.iter_mut().zip(self.transitions.iter_mut()) {
            slice.hard_stop();
            *transition = Transition::None;
        }
        self.last_triggered = None;
    }

    fn split(&mut self) {
        let total = self.buffers.as_ref().map_or(0, |buffers| buffers.num_frames());
        let num_slices = self.num_slices();
        let slice_len = total / num_slices;

        self.ranges_valid = slice_len > 0;
        if !self.ranges_valid {
            return;
        }

        for index in 0..num_slices {
            let start = index * slice_len;
            let end = if index == num_slices - 1 {
                total
            } else {
                start + slice_len
            };
            self.slices[index].reset(start, end);
        }
    }
}

impl std::fmt::Debug for SliceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceSet")
            .field("num_slices", &self.num_slices)
            .field("frames", &self.buffers.as_ref().map(|b| b.num_frames()))
            .field("polyphony", &self.polyphony)
            .field("play_mode", &self.play_mode)
            .field("xfade_samples", &self.xfade_samples)
            .finish()
    }
}
