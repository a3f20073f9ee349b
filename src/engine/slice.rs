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
use crate::audio::SampleBuffers;

use super::slicer::Slicer;
use super::{MAX_CHANNELS, PERCENT_PLAYED_NOT_PLAYING};

/// Playback state shared by every channel of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    NotPlaying,
    Playing,
    /// A stop was requested and the fade-out is still running.
    Stopping,
}

/// A playable slice: one [`Slicer`] per output channel over the same range.
#[derive(Debug, Clone)]
pub struct Slice {
    start: usize,
    end: usize,
    slicers: [Slicer; MAX_CHANNELS],
    state: PlayState,
    selected_by_pad: bool,
    selected_by_note: bool,
}

impl Default for Slice {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Slice {
    pub fn new(xfade_samples: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            slicers: std::array::from_fn(|_| Slicer::new(xfade_samples)),
            state: PlayState::NotPlaying,
            selected_by_pad: false,
            selected_by_note: false,
        }
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// True once a range has been assigned.
    pub fn has_range(&self) -> bool {
        self.start < self.end
    }

    /// Assigns the sample range. A slice that is playing keeps playing with
    /// its cursors clamped into the new range.
    pub fn reset(&mut self, start: usize, end: usize) {
        debug_assert!(start < end, "invalid slice range {start}..{end}");
        self.start = start;
        self.end = end;
        for slicer in self.slicers.iter_mut() {
            slicer.reset(start, end);
        }
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        for slicer in self.slicers.iter_mut() {
            slicer.set_reverse(reverse);
        }
    }

    pub fn set_cross_fade(&mut self, xfade_samples: usize) {
        for slicer in self.slicers.iter_mut() {
            slicer.set_cross_fade(xfade_samples);
        }
    }

    pub fn set_selected(&mut self, is_pad: bool, selected: bool) {
        if is_pad {
            self.selected_by_pad = selected;
        } else {
            self.selected_by_note = selected;
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected_by_pad || self.selected_by_note
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state != PlayState::NotPlaying
    }

    /// Starts playback from the beginning of the range.
    pub fn start(&mut self) {
        if !self.has_range() {
            return;
        }
        for slicer in self.slicers.iter_mut() {
            slicer.reset(self.start, self.end);
            slicer.start();
        }
        self.state = PlayState::Playing;
    }

    /// Asks every channel to stop. The slice only becomes `NotPlaying` once
    /// all of them are done fading out.
    pub fn request_stop(&mut self) {
        let mut all_ended = true;
        for slicer in self.slicers.iter_mut() {
            all_ended &= slicer.request_end();
        }
        self.state = if all_ended {
            PlayState::NotPlaying
        } else {
            PlayState::Stopping
        };
    }

    /// Silences the slice immediately, skipping any fade. Used when the
    /// buffer the slicers point into is being replaced.
    pub fn hard_stop(&mut self) {
        for slicer in self.slicers.iter_mut() {
            slicer.stop();
        }
        self.state = PlayState::NotPlaying;
    }

    /// Renders the slice into `output`, overwriting it when `override_output`
    /// is set and adding to it otherwise. A slicer that reaches its natural end
    /// restarts when `loop_at_end` is set, unless the slice is stopping.
    ///
    /// Output channel `c` plays buffer channel `min(c, channels - 1)`; output
    /// channels beyond [`MAX_CHANNELS`] are not rendered.
    ///
    /// Returns `true` when every channel ended with no loop pending.
    pub fn play(
        &mut self,
        buffers: &SampleBuffers,
        output: &mut [Vec<f32>],
        override_output: bool,
        loop_at_end: bool,
    ) -> bool {
        if buffers.num_channels() == 0 {
            return true;
        }
        let can_loop = loop_at_end && self.state != PlayState::Stopping;
        let mut all_done = true;

        for (channel, out) in output.iter_mut().enumerate() {
            if channel >= MAX_CHANNELS {
                if override_output {
                    out.fill(0.0);
                }
                continue;
            }

            let source = buffers.channel(channel.min(buffers.num_channels() - 1));
            let slicer = &mut self.slicers[channel];
            // An inert slicer on a looping slice starts over on its first frame.
            let mut done = !slicer.is_playing() && !can_loop;

            for frame in out.iter_mut() {
                let mut sample = 0.0;
                if !done {
                    if slicer.next() {
                        sample = slicer.get_sample(source);
                    } else if can_loop {
                        slicer.start();
                        if slicer.next() {
                            sample = slicer.get_sample(source);
                        } else {
                            done = true;
                        }
                    } else {
                        done = true;
                    }
                }

                if override_output {
                    *frame = sample;
                } else {
                    *frame += sample;
                }
            }

            all_done &= done;
        }

        all_done
    }

    /// Fraction of the slice played so far on the first channel.
    pub fn percent_played(&self) -> f32 {
        if self.state == PlayState::NotPlaying {
            return PERCENT_PLAYED_NOT_PLAYING;
        }
        self.slicers[0].percent_played()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{output_block, ramp_buffers};

    #[test]
    fn test_selection_flags() {
        let mut slice = Slice::default();
        assert!(!slice.is_selected());

        slice.set_selected(true, true);
        slice.set_selected(false, true);
        assert!(slice.is_selected());

        slice.set_selected(true, false);
        assert!(slice.is_selected());

        slice.set_selected(false, false);
        assert!(!slice.is_selected());
    }

    #[test]
    fn test_play_stereo() {
        let buffers = ramp_buffers(2, 12, 9.0);
        let mut slice = Slice::new(5);
        slice.reset(0, 12);
        slice.start();
        assert_eq!(slice.state(), PlayState::Playing);

        let mut output = output_block(2, 14);
        let done = slice.play(&buffers, &mut output, true, false);

        let expected = vec![
            0.0, 2.5, 5.5, 9.0, 13.0, 14.0, 15.0, 16.0, 12.75, 9.0, 4.75, 0.0, 0.0, 0.0,
        ];
        assert!(done);
        assert_eq!(output[0], expected);
        assert_eq!(output[1], expected);
    }

    #[test]
    fn test_play_mono_buffer_on_both_channels() {
        let buffers = ramp_buffers(1, 4, 1.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 4);
        slice.start();

        let mut output = output_block(2, 4);
        slice.play(&buffers, &mut output, true, false);

        assert_eq!(output[0], vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(output[1], vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_play_adds_without_override() {
        let buffers = ramp_buffers(1, 4, 1.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 4);
        slice.start();

        let mut output = vec![vec![10.0; 4]];
        slice.play(&buffers, &mut output, false, false);

        assert_eq!(output[0], vec![11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_play_across_blocks() {
        let buffers = ramp_buffers(1, 6, 1.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 6);
        slice.start();

        let mut output = output_block(1, 4);
        assert!(!slice.play(&buffers, &mut output, true, false));
        assert_eq!(output[0], vec![1.0, 2.0, 3.0, 4.0]);

        assert!(slice.play(&buffers, &mut output, true, false));
        assert_eq!(output[0], vec![5.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn test_loop_at_end() {
        let buffers = ramp_buffers(1, 10, 1.0);
        let mut slice = Slice::new(0);
        slice.reset(2, 5);
        slice.start();

        let mut output = output_block(1, 8);
        assert!(!slice.play(&buffers, &mut output, true, true));
        assert_eq!(output[0], vec![3.0, 4.0, 5.0, 3.0, 4.0, 5.0, 3.0, 4.0]);
    }

    #[test]
    fn test_no_loop_while_stopping() {
        let buffers = ramp_buffers(1, 12, 9.0);
        let mut slice = Slice::new(5);
        slice.reset(0, 12);
        slice.start();

        let mut output = output_block(1, 6);
        slice.play(&buffers, &mut output, true, true);

        slice.request_stop();
        assert_eq!(slice.state(), PlayState::Stopping);

        let mut output = output_block(1, 8);
        assert!(slice.play(&buffers, &mut output, true, true));
        assert_eq!(output[0], vec![11.25, 8.0, 4.25, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_loop_survives_fade_disabled_at_tail() {
        let buffers = ramp_buffers(1, 12, 9.0);
        let mut slice = Slice::new(5);
        slice.reset(0, 12);
        slice.start();

        // Two samples into the tail fade.
        let mut output = output_block(1, 9);
        slice.play(&buffers, &mut output, true, true);
        slice.set_cross_fade(0);

        let mut output = output_block(1, 3);
        assert!(!slice.play(&buffers, &mut output, true, true));
        assert_eq!(output[0], vec![9.0, 10.0, 11.0]);
        assert_eq!(slice.state(), PlayState::Playing);
    }

    #[test]
    fn test_request_stop_without_fade() {
        let buffers = ramp_buffers(2, 12, 9.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 12);
        slice.start();
        let mut output = output_block(2, 2);
        slice.play(&buffers, &mut output, true, false);

        slice.request_stop();
        assert_eq!(slice.state(), PlayState::NotPlaying);
        assert_eq!(slice.percent_played(), PERCENT_PLAYED_NOT_PLAYING);
    }

    #[test]
    fn test_hard_stop() {
        let mut slice = Slice::new(5);
        slice.reset(0, 12);
        slice.start();

        slice.hard_stop();
        assert!(!slice.is_playing());
    }

    #[test]
    fn test_extra_output_channels_cleared() {
        let buffers = ramp_buffers(2, 4, 1.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 4);
        slice.start();

        let mut output = vec![vec![7.0; 4]; 3];
        slice.play(&buffers, &mut output, true, false);

        assert_eq!(output[2], vec![0.0; 4]);
    }

    #[test]
    fn test_start_without_range() {
        let mut slice = Slice::default();
        slice.start();
        assert!(!slice.is_playing());
    }

    #[test]
    fn test_percent_played() {
        let buffers = ramp_buffers(1, 8, 0.0);
        let mut slice = Slice::new(0);
        slice.reset(0, 8);
        assert_eq!(slice.percent_played(), PERCENT_PLAYED_NOT_PLAYING);

        slice.start();
        let mut output = output_block(1, 2);
        slice.play(&buffers, &mut output, true, false);
        assert_eq!(slice.percent_played(), 0.25);
    }
}
