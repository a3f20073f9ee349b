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
use std::sync::Arc;

use crate::audio::SampleBuffers;

/// Records host input into a buffer allocated by the control thread.
///
/// The target buffer must be uniquely owned while armed so it can be written
/// in place; nothing here allocates.
#[derive(Debug, Default)]
pub struct Sampler {
    target: Option<Arc<SampleBuffers>>,
    position: usize,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.target.is_some()
    }

    /// Arms a recording pass into `buffers`. Hands the buffer back if it is
    /// shared, since it could not be written. Must not be called while armed.
    pub fn arm(&mut self, mut buffers: Arc<SampleBuffers>) -> Result<(), Arc<SampleBuffers>> {
        debug_assert!(self.target.is_none());
        if Arc::get_mut(&mut buffers).is_none() {
            return Err(buffers);
        }
        self.target = Some(buffers);
        self.position = 0;
        Ok(())
    }

    /// Abandons the current pass and returns its buffer.
    pub fn cancel(&mut self) -> Option<Arc<SampleBuffers>> {
        self.position = 0;
        self.target.take()
    }

    /// Progress of the current pass in [0, 1], `None` when not armed.
    pub fn progress(&self) -> Option<f32> {
        let target = self.target.as_ref()?;
        match target.num_frames() {
            0 => Some(1.0),
            frames => Some(self.position as f32 / frames as f32),
        }
    }

    /// Appends a block of input. Input channel `min(c, n - 1)` feeds target
    /// channel `c`. Returns the buffer once the pass is complete.
    pub fn record(&mut self, input: &[Vec<f32>]) -> Option<Arc<SampleBuffers>> {
        let target = self.target.as_mut()?;
        let Some(buffers) = Arc::get_mut(target) else {
            debug_assert!(false, "sampling target is shared");
            return None;
        };

        let remaining = buffers.num_frames() - self.position;
        let frames = input
            .iter()
            .map(Vec::len)
            .min()
            .unwrap_or(0)
            .min(remaining);
        if frames > 0 {
            for channel in 0..buffers.num_channels() {
                let source = &input[channel.min(input.len() - 1)][..frames];
                buffers.channel_mut(channel)[self.position..self.position + frames]
                    .copy_from_slice(source);
            }
            self.position += frames;
        }

        if self.position == buffers.num_frames() {
            self.position = 0;
            return self.target.take();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_across_blocks() {
        let mut sampler = Sampler::new();
        sampler.arm(Arc::new(SampleBuffers::new(44100, 2, 5))).unwrap();
        assert_eq!(sampler.progress(), Some(0.0));

        assert!(sampler
            .record(&[vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]])
            .is_none());
        assert_eq!(sampler.progress(), Some(0.6));

        let captured = sampler
            .record(&[vec![4.0, 5.0, 6.0], vec![-4.0, -5.0, -6.0]])
            .unwrap();
        assert_eq!(captured.channel(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(captured.channel(1), &[-1.0, -2.0, -3.0, -4.0, -5.0]);
        assert!(!sampler.is_armed());
        assert_eq!(sampler.progress(), None);
    }

    #[test]
    fn test_mono_input_feeds_every_channel() {
        let mut sampler = Sampler::new();
        sampler.arm(Arc::new(SampleBuffers::new(44100, 2, 2))).unwrap();

        let captured = sampler.record(&[vec![0.5, 0.25]]).unwrap();
        assert_eq!(captured.channel(0), &[0.5, 0.25]);
        assert_eq!(captured.channel(1), &[0.5, 0.25]);
    }

    #[test]
    fn test_shared_buffer_rejected() {
        let mut sampler = Sampler::new();
        let buffers = Arc::new(SampleBuffers::new(44100, 1, 4));
        let _shared = buffers.clone();

        assert!(sampler.arm(buffers).is_err());
        assert!(!sampler.is_armed());
    }

    #[test]
    fn test_cancel() {
        let mut sampler = Sampler::new();
        sampler.arm(Arc::new(SampleBuffers::new(44100, 1, 4))).unwrap();
        sampler.record(&[vec![1.0]]);

        let buffers = sampler.cancel().unwrap();
        assert_eq!(buffers.num_frames(), 4);
        assert!(!sampler.is_armed());
        assert!(sampler.record(&[vec![1.0; 4]]).is_none());
    }

    #[test]
    fn test_no_input_records_nothing() {
        let mut sampler = Sampler::new();
        sampler.arm(Arc::new(SampleBuffers::new(44100, 1, 4))).unwrap();

        assert!(sampler.record(&[]).is_none());
        assert_eq!(sampler.progress(), Some(0.0));
    }
}
