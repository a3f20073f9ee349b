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
//! Linear gain ramp used to remove clicks where playback starts or stops.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeState {
    /// No fade applied (factor 1).
    PassThrough,
    FadingToOne,
    FadingToZero,
    /// Fade to zero completed (factor 0).
    Silent,
}

/// Produces a 0 -> 1 or 1 -> 0 linear ramp.
///
/// A fader created for `num_samples` samples covers `num_samples - 1` steps:
/// the factor at step `k` is `k / (num_samples - 1)`, so a full fade touches
/// exactly `num_samples` consecutive samples including both end points. Fewer
/// than two samples means there is nothing to ramp and the fader always passes
/// samples through.
#[derive(Debug, Clone)]
pub struct CrossFader {
    steps: usize,
    position: usize,
    state: FadeState,
}

impl CrossFader {
    pub fn new(num_samples: usize) -> Self {
        Self {
            steps: num_samples.saturating_sub(1),
            position: 0,
            state: FadeState::PassThrough,
        }
    }

    /// Number of samples a complete fade spans (0 when disabled).
    pub fn num_samples(&self) -> usize {
        if self.steps == 0 {
            0
        } else {
            self.steps + 1
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.steps > 0
    }

    /// Changes the fade length without losing the fade in progress. The
    /// position is rescaled so the factor stays about the same. With fading
    /// disabled, a fade-in jumps to pass-through and a fade-out to silence.
    pub fn resize(&mut self, num_samples: usize) {
        let steps = num_samples.saturating_sub(1);
        if steps == self.steps {
            return;
        }
        match self.state {
            FadeState::PassThrough | FadeState::Silent => {}
            FadeState::FadingToOne if steps == 0 => self.reset(),
            FadeState::FadingToZero if steps == 0 => {
                self.position = 0;
                self.state = FadeState::Silent;
            }
            FadeState::FadingToOne | FadeState::FadingToZero => {
                self.position = (self.position * steps + self.steps / 2) / self.steps;
            }
        }
        self.steps = steps;
    }

    /// Back to pass-through.
    pub fn reset(&mut self) {
        self.position = 0;
        self.state = FadeState::PassThrough;
    }

    /// Starts (or keeps) ramping down. When called during a fade-in the ramp
    /// reverses from where it is. Returns `true` if there are samples left
    /// before the factor reaches zero.
    pub fn fade_to_zero(&mut self) -> bool {
        match self.state {
            FadeState::PassThrough => {
                if self.steps == 0 {
                    self.state = FadeState::Silent;
                    return false;
                }
                self.position = self.steps;
                self.state = FadeState::FadingToZero;
            }
            FadeState::FadingToOne => self.state = FadeState::FadingToZero,
            FadeState::FadingToZero => {}
            FadeState::Silent => return false,
        }

        if self.position == 0 {
            self.state = FadeState::Silent;
            false
        } else {
            true
        }
    }

    /// Restarts the ramp up from zero.
    pub fn fade_to_one(&mut self) {
        self.position = 0;
        self.state = if self.steps == 0 {
            FadeState::PassThrough
        } else {
            FadeState::FadingToOne
        };
    }

    /// A fade to zero has completed.
    pub fn is_silent(&self) -> bool {
        self.state == FadeState::Silent
    }

    pub fn is_fading_to_zero(&self) -> bool {
        matches!(self.state, FadeState::FadingToZero | FadeState::Silent)
    }

    /// Current gain factor in [0, 1].
    pub fn factor(&self) -> f32 {
        match self.state {
            FadeState::PassThrough => 1.0,
            FadeState::Silent => 0.0,
            FadeState::FadingToOne | FadeState::FadingToZero => {
                self.position as f32 / self.steps as f32
            }
        }
    }

    #[inline]
    pub fn compute(&self, sample: f32) -> f32 {
        match self.state {
            FadeState::PassThrough => sample,
            FadeState::Silent => 0.0,
            FadeState::FadingToOne | FadeState::FadingToZero => sample * self.factor(),
        }
    }

    /// Moves the ramp one step. Returns `false` once a fade to zero has
    /// completed, meaning the source is silent from now on.
    #[inline]
    pub fn advance(&mut self) -> bool {
        match self.state {
            FadeState::PassThrough => true,
            FadeState::FadingToOne => {
                self.position += 1;
                if self.position >= self.steps {
                    self.position = self.steps;
                    self.state = FadeState::PassThrough;
                }
                true
            }
            FadeState::FadingToZero => {
                if self.position == 0 {
                    self.state = FadeState::Silent;
                    false
                } else {
                    self.position -= 1;
                    true
                }
            }
            FadeState::Silent => false,
        }
    }
}
