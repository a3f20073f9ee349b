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
use std::time::Duration;

/// Multi-channel audio held entirely in memory.
///
/// Samples are stored planar (channel-major): `channels[c][frame]`. All
/// channels always have the same number of frames.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffers {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffers {
    /// Creates a silent buffer with the given dimensions.
    pub fn new(sample_rate: u32, num_channels: usize, num_frames: usize) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; num_frames]; num_channels],
        }
    }

    /// Creates a buffer from planar channel data. Channels longer than the
    /// shortest one are truncated so every channel has the same length.
    pub fn from_channels(sample_rate: u32, mut channels: Vec<Vec<f32>>) -> Self {
        let num_frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in channels.iter_mut() {
            channel.truncate(num_frames);
        }
        Self {
            sample_rate,
            channels,
        }
    }

    /// Creates a buffer from interleaved samples. A trailing partial frame is
    /// dropped.
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize, sample_rate: u32) -> Self {
        if num_channels == 0 {
            return Self::new(sample_rate, 0, 0);
        }

        let num_frames = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(num_frames); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Self {
            sample_rate,
            channels,
        }
    }

    /// Returns the samples interleaved frame by frame.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.num_frames() * self.num_channels());
        for frame in 0..self.num_frames() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn num_frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    /// True if there is nothing to play.
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Returns the samples of one channel.
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Returns the samples of one channel for writing. Only meaningful while
    /// the buffer is still owned by a single thread.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        &mut self.channels[channel]
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.num_frames() as f64 / self.sample_rate as f64)
    }

    /// Returns the memory size of the sample data in bytes.
    pub fn memory_size(&self) -> usize {
        self.num_channels() * self.num_frames() * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        let buffers = SampleBuffers::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0], 2, 44100);

        assert_eq!(buffers.num_channels(), 2);
        assert_eq!(buffers.num_frames(), 3);
        assert_eq!(buffers.channel(0), &[1.0, 2.0, 3.0]);
        assert_eq!(buffers.channel(1), &[-1.0, -2.0, -3.0]);
        assert_eq!(buffers.to_interleaved(), vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }

    #[test]
    fn test_from_channels_truncates() {
        let buffers = SampleBuffers::from_channels(48000, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]);

        assert_eq!(buffers.num_frames(), 2);
        assert_eq!(buffers.channel(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_dimensions() {
        let buffers = SampleBuffers::new(48000, 2, 24000);

        assert_eq!(buffers.duration(), Duration::from_millis(500));
        assert_eq!(buffers.memory_size(), 2 * 24000 * 4);
        assert!(!buffers.is_empty());
        assert!(SampleBuffers::new(48000, 2, 0).is_empty());
        assert!(SampleBuffers::from_interleaved(&[1.0], 0, 48000).is_empty());
    }
}
