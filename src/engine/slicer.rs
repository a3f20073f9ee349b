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
//! Single-channel iteration over a range of samples.

use super::xfade::CrossFader;
use super::PERCENT_PLAYED_NOT_PLAYING;

/// Iterates the sample indices `[start, end)` of one channel, forward or in
/// reverse, with an optional fade at both ends of the range.
///
/// The fade windows are anchored to the range, not to the direction: a
/// forward slicer fades in on `start` and out on `end - 1`, a reversed one
/// fades in on `end - 1` and out on `start`. The window is capped at half the
/// range length so fade-in and fade-out never overlap.
#[derive(Debug, Clone)]
pub struct Slicer {
    start: usize,
    end: usize,
    reverse: bool,
    /// Requested fade length; the effective one lives in `xfade`.
    xfade_samples: usize,
    xfade: CrossFader,
    /// `None` when not playing. Before the first `next()` the cursor sits one
    /// step before the first sample in the playing direction.
    current: Option<isize>,
    first_step: bool,
}

impl Default for Slicer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Slicer {
    /// Creates an inert slicer with an empty range.
    pub fn new(xfade_samples: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            reverse: false,
            xfade_samples,
            xfade: CrossFader::new(0),
            current: None,
            first_step: false,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start
    }

    pub fn end_index(&self) -> usize {
        self.end
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Effective fade length for the current range (0 when disabled).
    pub fn cross_fade_samples(&self) -> usize {
        self.xfade.num_samples()
    }

    /// Redefines the range. A cursor that is mid-playback is clamped into the
    /// new range so the voice keeps playing.
    pub fn reset(&mut self, start: usize, end: usize) {
        debug_assert!(start < end, "invalid slicer range {start}..{end}");
        self.start = start;
        self.end = end;
        self.configure_fader();
        self.clamp_cursor();
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        if self.reverse != reverse {
            self.reverse = reverse;
            self.clamp_cursor();
        }
    }

    /// Sets the fade length in samples (below 2 disables fading). A fade in
    /// progress carries on over the new length.
    pub fn set_cross_fade(&mut self, xfade_samples: usize) {
        self.xfade_samples = xfade_samples;
        self.configure_fader();
    }

    /// Positions the cursor one step before the first sample and begins the
    /// fade-in.
    pub fn start(&mut self) {
        if self.start >= self.end {
            self.current = None;
            return;
        }
        self.current = Some(if self.reverse {
            self.end as isize
        } else {
            self.start as isize - 1
        });
        self.first_step = true;
        self.xfade.fade_to_one();
    }

    /// Moves the cursor to the next sample. Returns `false` once playback is
    /// over, either because the range boundary was crossed or because the
    /// fade-out completed.
    #[inline]
    pub fn next(&mut self) -> bool {
        let Some(current) = self.current else {
            return false;
        };

        if self.first_step {
            self.first_step = false;
        } else if !self.xfade.advance() {
            self.current = None;
            return false;
        }

        let next = if self.reverse { current - 1 } else { current + 1 };
        if next < self.start as isize || next >= self.end as isize {
            self.current = None;
            return false;
        }
        self.current = Some(next);

        // The tail of the range is always faded, whether or not a stop was requested.
        if self.xfade.is_enabled() && !self.xfade.is_fading_to_zero() {
            let window = self.xfade.num_samples() as isize;
            let in_fade_out = if self.reverse {
                next < self.start as isize + window
            } else {
                next >= self.end as isize - window
            };
            if in_fade_out {
                self.xfade.fade_to_zero();
            }
        }

        true
    }

    /// Asks the slicer to stop. With fading enabled the fade-out runs its
    /// course over the following `next()` calls. Returns `true` only once the
    /// slicer is inert.
    pub fn request_end(&mut self) -> bool {
        if self.current.is_none() {
            return true;
        }
        if !self.xfade.is_enabled() || !self.xfade.fade_to_zero() {
            self.current = None;
            return true;
        }
        false
    }

    /// Goes inert immediately, without fading.
    pub fn stop(&mut self) {
        self.current = None;
        self.first_step = false;
        self.xfade.reset();
    }

    /// Returns the (faded) sample under the cursor, or silence when inert.
    /// `buffer` must be the channel the range was computed for.
    #[inline]
    pub fn get_sample(&self, buffer: &[f32]) -> f32 {
        match self.current {
            Some(current) if current >= self.start as isize && current < self.end as isize => {
                debug_assert!((current as usize) < buffer.len());
                buffer
                    .get(current as usize)
                    .map_or(0.0, |sample| self.xfade.compute(*sample))
            }
            _ => 0.0,
        }
    }

    /// Fraction of the range consumed so far, or
    /// [`PERCENT_PLAYED_NOT_PLAYING`] when inert.
    pub fn percent_played(&self) -> f32 {
        let Some(current) = self.current else {
            return PERCENT_PLAYED_NOT_PLAYING;
        };
        let len = (self.end - self.start) as isize;
        if len == 0 {
            return PERCENT_PLAYED_NOT_PLAYING;
        }
        let consumed = if self.reverse {
            self.end as isize - current
        } else {
            current - self.start as isize + 1
        };
        consumed.clamp(0, len) as f32 / len as f32
    }

    fn configure_fader(&mut self) {
        let len = self.end.saturating_sub(self.start);
        let mut effective = self.xfade_samples.min(len / 2);
        if effective < 2 {
            effective = 0;
        }
        if effective != self.xfade.num_samples() {
            // A fade-out cut short by disabling the fade ends playback here.
            self.xfade.resize(effective);
            if self.xfade.is_silent() {
                self.current = None;
            }
        }
    }

    fn clamp_cursor(&mut self) {
        if let Some(current) = self.current {
            let (low, high) = if self.reverse {
                (self.start as isize, self.end as isize)
            } else {
                (self.start as isize - 1, self.end as isize - 1)
            };
            self.current = Some(current.clamp(low, high));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(first: f32, len: usize) -> Vec<f32> {
        (0..len).map(|i| first + i as f32).collect()
    }

    fn play_all(slicer: &mut Slicer, buffer: &[f32]) -> Vec<f32> {
        let mut out = Vec::new();
        while slicer.next() {
            out.push(slicer.get_sample(buffer));
        }
        out
    }

    #[test]
    fn test_forward_with_cross_fade() {
        let buffer = ramp(9.0, 12);
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 12);
        slicer.start();

        assert_eq!(
            play_all(&mut slicer, &buffer),
            vec![0.0, 2.5, 5.5, 9.0, 13.0, 14.0, 15.0, 16.0, 12.75, 9.0, 4.75, 0.0]
        );
        assert!(!slicer.is_playing());
    }

    #[test]
    fn test_forward_without_cross_fade() {
        let buffer = ramp(1.0, 10);
        let mut slicer = Slicer::new(0);
        slicer.reset(2, 6);
        slicer.start();

        assert_eq!(play_all(&mut slicer, &buffer), vec![3.0, 4.0, 5.0, 6.0]);
        assert!(!slicer.is_playing());
        assert_eq!(slicer.get_sample(&buffer), 0.0);
    }

    #[test]
    fn test_reverse_mirrors_forward() {
        let buffer = ramp(9.0, 20);
        for (start, end, window) in [(0, 12, 5), (3, 17, 4), (5, 9, 2), (0, 20, 0)] {
            let mut forward = Slicer::new(window);
            forward.reset(start, end);
            forward.start();
            let mut expected = play_all(&mut forward, &buffer);
            expected.reverse();

            let mut reverse = Slicer::new(window);
            reverse.reset(start, end);
            reverse.set_reverse(true);
            reverse.start();

            assert_eq!(play_all(&mut reverse, &buffer), expected, "range {start}..{end}");
        }
    }

    #[test]
    fn test_fade_windows_only_touch_boundaries() {
        let buffer = vec![1.0; 64];
        for (start, end, window) in [(0, 64, 8), (10, 30, 5), (7, 20, 3), (0, 10, 5)] {
            let mut slicer = Slicer::new(window);
            slicer.reset(start, end);
            slicer.start();
            let out = play_all(&mut slicer, &buffer);

            assert_eq!(out.len(), end - start);
            let len = out.len();
            for i in 1..window {
                assert!(out[i] > out[i - 1], "fade-in not rising at {i}");
                assert!(out[len - i] < out[len - i - 1], "fade-out not falling at {i}");
            }
            for (i, sample) in out.iter().enumerate().take(len - window + 1).skip(window - 1) {
                assert_eq!(*sample, 1.0, "unexpected fade at {i}");
            }
        }
    }

    #[test]
    fn test_window_capped_at_half_range() {
        let mut slicer = Slicer::new(10);
        slicer.reset(0, 8);
        assert_eq!(slicer.cross_fade_samples(), 4);

        slicer.reset(0, 3);
        assert_eq!(slicer.cross_fade_samples(), 0);
    }

    #[test]
    fn test_request_end_fades_out() {
        let buffer = ramp(9.0, 12);
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 12);
        slicer.start();
        for _ in 0..6 {
            assert!(slicer.next());
        }
        assert_eq!(slicer.get_sample(&buffer), 14.0);

        assert!(!slicer.request_end());
        assert_eq!(play_all(&mut slicer, &buffer), vec![11.25, 8.0, 4.25, 0.0]);
        assert!(slicer.request_end());
    }

    #[test]
    fn test_request_end_is_cooperative() {
        let buffer = ramp(9.0, 12);
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 12);
        slicer.start();
        for _ in 0..6 {
            slicer.next();
        }

        // Asking again does not restart the fade.
        assert!(!slicer.request_end());
        slicer.next();
        assert!(!slicer.request_end());
        assert_eq!(play_all(&mut slicer, &buffer), vec![8.0, 4.25, 0.0]);
    }

    #[test]
    fn test_request_end_without_cross_fade() {
        let mut slicer = Slicer::new(0);
        slicer.reset(0, 12);
        slicer.start();
        slicer.next();

        assert!(slicer.request_end());
        assert!(!slicer.is_playing());
        assert!(!slicer.next());
    }

    #[test]
    fn test_request_end_before_first_sample() {
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 12);
        slicer.start();

        assert!(slicer.request_end());
    }

    #[test]
    fn test_reset_clamps_cursor() {
        let buffer = ramp(0.0, 20);
        let mut slicer = Slicer::new(0);
        slicer.reset(0, 20);
        slicer.start();
        for _ in 0..15 {
            slicer.next();
        }
        assert_eq!(slicer.get_sample(&buffer), 14.0);

        slicer.reset(0, 10);
        assert!(slicer.is_playing());
        assert_eq!(slicer.get_sample(&buffer), 9.0);
        assert!(!slicer.next());
    }

    #[test]
    fn test_restart_after_natural_end() {
        let buffer = ramp(1.0, 4);
        let mut slicer = Slicer::new(0);
        slicer.reset(0, 4);
        slicer.start();
        assert_eq!(play_all(&mut slicer, &buffer), vec![1.0, 2.0, 3.0, 4.0]);

        slicer.start();
        assert_eq!(play_all(&mut slicer, &buffer), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_percent_played() {
        let mut slicer = Slicer::new(0);
        assert_eq!(slicer.percent_played(), PERCENT_PLAYED_NOT_PLAYING);

        slicer.reset(4, 8);
        slicer.start();
        assert_eq!(slicer.percent_played(), 0.0);
        slicer.next();
        assert_eq!(slicer.percent_played(), 0.25);
        slicer.next();
        slicer.next();
        slicer.next();
        assert_eq!(slicer.percent_played(), 1.0);

        slicer.set_reverse(true);
        slicer.start();
        slicer.next();
        assert_eq!(slicer.percent_played(), 0.25);
    }

    #[test]
    fn test_stop_is_immediate() {
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 12);
        slicer.start();
        slicer.next();
        slicer.stop();

        assert!(!slicer.is_playing());
        assert_eq!(slicer.percent_played(), PERCENT_PLAYED_NOT_PLAYING);
    }

    #[test]
    fn test_disabling_fade_ends_fade_out() {
        let buffer = vec![1.0; 40];
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 40);
        slicer.start();
        for _ in 0..10 {
            slicer.next();
        }
        assert!(!slicer.request_end());

        slicer.set_cross_fade(0);
        assert!(!slicer.is_playing());
        assert!(!slicer.next());
        assert_eq!(slicer.get_sample(&buffer), 0.0);
    }

    #[test]
    fn test_longer_fade_continues_fade_out() {
        let buffer = vec![1.0; 40];
        let mut slicer = Slicer::new(5);
        slicer.reset(0, 40);
        slicer.start();
        for _ in 0..10 {
            slicer.next();
        }
        assert!(!slicer.request_end());

        slicer.set_cross_fade(9);
        assert_eq!(
            play_all(&mut slicer, &buffer),
            vec![0.875, 0.75, 0.625, 0.5, 0.375, 0.25, 0.125, 0.0]
        );
        assert!(!slicer.is_playing());
    }

    #[test]
    fn test_shorter_range_continues_fade_out() {
        let buffer = vec![1.0; 40];
        let mut slicer = Slicer::new(9);
        slicer.reset(0, 40);
        slicer.start();
        for _ in 0..12 {
            slicer.next();
        }
        assert!(!slicer.request_end());

        // The window shrinks from 9 to 6 samples.
        slicer.reset(6, 18);
        assert!(slicer.is_playing());
        assert_eq!(
            play_all(&mut slicer, &buffer),
            vec![0.8, 0.6, 0.4, 0.2, 0.0]
        );
    }
}
