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
//! The control side of the sampler.
//!
//! [`SamplerController`] lives on a non-real-time thread (UI, CLI). It owns
//! every allocation and deallocation of sample buffers: buffers are built
//! here, published through the [`SharedBufferHandoff`], and handed back here
//! by the real-time thread once they are no longer played.

mod error;

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::audio::{self, frames_for_duration, SampleBuffers};
use crate::config::{ConfigError, SamplerConfig};
use crate::engine::{PlayMode, Polyphony, SliceSet, SliceSettings, MAX_CHANNELS};
use crate::handoff::SharedBufferHandoff;
use crate::processor::{
    Command, EventMapping, Notification, SamplerProcessor, SliceMonitor,
};

pub use error::ControllerError;

const COMMAND_QUEUE_SIZE: usize = 256;
const NOTIFICATION_QUEUE_SIZE: usize = 64;

/// Drives a [`SamplerProcessor`] from a non-real-time thread.
pub struct SamplerController {
    handoff: Arc<SharedBufferHandoff>,
    commands: Sender<Command>,
    notifications: Receiver<Notification>,
    monitor: Arc<SliceMonitor>,
    current: Option<Arc<SampleBuffers>>,
    published_version: u64,
    acknowledged_version: u64,
    /// Latest captured version already taken from the monitor.
    captured_version: u64,
    cross_fade: Duration,
    /// Sample rate the last cross-fade length was computed for.
    cross_fade_rate: Option<u32>,
}

impl SamplerController {
    /// Creates a controller and the processor it drives. The processor is
    /// meant to be moved to the audio thread.
    pub fn new(config: &SamplerConfig) -> Result<(SamplerController, SamplerProcessor), ConfigError> {
        config.validate()?;

        let mut slices = SliceSet::default();
        if let Some(num_slices) = NonZeroUsize::new(config.num_slices()) {
            slices.set_num_slices(num_slices);
        }
        slices.set_polyphony(config.polyphony());
        slices.set_play_mode(config.play_mode());
        for (index, settings) in config.slice_settings()? {
            slices.set_settings(index, settings);
        }
        let mapping = EventMapping {
            root_key: config.root_key(),
            pads_per_bank: config.pads_per_bank(),
            bank: config.bank(),
        };

        let handoff = Arc::new(SharedBufferHandoff::new());
        let monitor = Arc::new(SliceMonitor::new());
        let (commands_tx, commands_rx) = bounded(COMMAND_QUEUE_SIZE);
        let (notifications_tx, notifications_rx) = bounded(NOTIFICATION_QUEUE_SIZE);

        debug!(
            num_slices = config.num_slices(),
            polyphony = ?config.polyphony(),
            play_mode = ?config.play_mode(),
            "Sampler created"
        );

        let processor = SamplerProcessor::new(
            slices,
            mapping,
            handoff.clone(),
            commands_rx,
            notifications_tx,
            monitor.clone(),
        );
        let controller = SamplerController {
            handoff,
            commands: commands_tx,
            notifications: notifications_rx,
            monitor,
            current: None,
            published_version: 0,
            acknowledged_version: 0,
            captured_version: 0,
            cross_fade: config.cross_fade()?,
            cross_fade_rate: None,
        };

        Ok((controller, processor))
    }

    /// Publishes a new buffer for playback and returns its version. The
    /// processor switches to it at the start of its next block.
    pub fn publish(&mut self, buffers: SampleBuffers) -> Result<u64, ControllerError> {
        let buffers = Arc::new(buffers);
        self.sync_cross_fade(buffers.sample_rate())?;

        let version = self.handoff.ui_set(buffers.clone());
        self.send(Command::BufferPublished(version))?;

        info!(
            version,
            channels = buffers.num_channels(),
            frames = buffers.num_frames(),
            "Buffer published"
        );
        self.current = Some(buffers);
        self.published_version = version;
        Ok(version)
    }

    /// Loads a WAV file and publishes it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<u64, ControllerError> {
        let buffers = audio::load_wav(path)?;
        self.publish(buffers)
    }

    /// Starts recording `num_frames` of host input. The buffer is allocated
    /// here and handed to the processor; any pass in progress is abandoned.
    pub fn start_sampling(
        &mut self,
        num_frames: usize,
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<(), ControllerError> {
        if num_channels == 0 || num_channels > MAX_CHANNELS {
            return Err(ControllerError::SamplingChannels(num_channels));
        }
        let buffers = Arc::new(SampleBuffers::new(sample_rate, num_channels, num_frames));
        self.send(Command::StartSampling(buffers))?;
        info!(num_frames, num_channels, sample_rate, "Sampling started");
        Ok(())
    }

    pub fn cancel_sampling(&mut self) -> Result<(), ControllerError> {
        self.send(Command::CancelSampling)?;
        info!("Sampling cancelled");
        Ok(())
    }

    pub fn set_num_slices(&mut self, num_slices: NonZeroUsize) -> Result<(), ControllerError> {
        self.send(Command::SetNumSlices(num_slices))
    }

    pub fn set_polyphony(&mut self, polyphony: Polyphony) -> Result<(), ControllerError> {
        self.send(Command::SetPolyphony(polyphony))
    }

    pub fn set_play_mode(&mut self, play_mode: PlayMode) -> Result<(), ControllerError> {
        self.send(Command::SetPlayMode(play_mode))
    }

    /// Changes the cross-fade length. Takes effect in samples of the current
    /// buffer's rate, or once a buffer is published.
    pub fn set_cross_fade(&mut self, cross_fade: Duration) -> Result<(), ControllerError> {
        self.cross_fade = cross_fade;
        match self.cross_fade_rate.take() {
            Some(sample_rate) => self.sync_cross_fade(sample_rate),
            None => Ok(()),
        }
    }

    pub fn set_slice_settings(
        &mut self,
        slice: usize,
        settings: SliceSettings,
    ) -> Result<(), ControllerError> {
        self.send(Command::SetSliceSettings(slice, settings))
    }

    pub fn set_bank(&mut self, bank: u16) -> Result<(), ControllerError> {
        self.send(Command::SetBank(bank))
    }

    pub fn set_root_key(&mut self, root_key: u8) -> Result<(), ControllerError> {
        self.send(Command::SetRootKey(root_key))
    }

    /// Handles everything the processor reported since the last poll and
    /// returns it. Retired buffers are dropped here and not returned.
    ///
    /// Adopted and captured versions are read from the [`SliceMonitor`], so
    /// they are picked up even if their notifications did not fit in the
    /// queue. A captured sample becomes the current buffer.
    pub fn poll(&mut self) -> Vec<Notification> {
        let mut handled = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            match notification {
                Notification::Retired(buffers) => {
                    debug!(
                        frames = buffers.num_frames(),
                        memory_kb = buffers.memory_size() / 1024,
                        "Releasing retired buffer"
                    );
                    drop(buffers);
                }
                Notification::BufferAdopted(version) => {
                    debug!(version, "Buffer adopted by processor");
                    handled.push(notification);
                }
                Notification::SampleCaptured(version) => {
                    debug!(version, "Sample captured by processor");
                    handled.push(notification);
                }
                Notification::SamplingRejected => {
                    warn!("Processor rejected the sampling buffer");
                    handled.push(notification);
                }
            }
        }

        self.acknowledged_version = self
            .acknowledged_version
            .max(self.monitor.adopted_version());

        let captured = self.monitor.captured_version();
        if captured > self.captured_version {
            self.captured_version = captured;
            if let Some(buffers) = self.handoff.ui_adjust(captured) {
                let version = self.handoff.ui_version();
                info!(
                    version,
                    frames = buffers.num_frames(),
                    "Captured sample adopted"
                );
                self.current = Some(buffers);
                self.published_version = version;
                self.acknowledged_version = self.acknowledged_version.max(version);
            }
        }

        // A captured buffer may carry a different rate than the last one.
        if let Some(sample_rate) = self.current.as_ref().map(|b| b.sample_rate()) {
            if let Err(e) = self.sync_cross_fade(sample_rate) {
                warn!(err = %e, "Unable to update cross-fade");
            }
        }

        handled
    }

    /// Fraction played of a slice as last reported by the processor.
    pub fn percent_played(&self, slice: usize) -> f32 {
        self.monitor.percent_played(slice)
    }

    /// Progress of the current sampling pass, `None` when not sampling.
    pub fn sampling_progress(&self) -> Option<f32> {
        self.monitor.sampling_progress()
    }

    /// The buffer most recently published or captured.
    pub fn current_buffer(&self) -> Option<Arc<SampleBuffers>> {
        self.current.clone()
    }

    pub fn published_version(&self) -> u64 {
        self.published_version
    }

    /// Latest version the processor confirmed it plays.
    pub fn acknowledged_version(&self) -> u64 {
        self.acknowledged_version
    }

    /// True once the processor plays the most recently published buffer.
    pub fn is_synchronized(&self) -> bool {
        self.acknowledged_version >= self.published_version
    }

    pub fn monitor(&self) -> &Arc<SliceMonitor> {
        &self.monitor
    }

    fn sync_cross_fade(&mut self, sample_rate: u32) -> Result<(), ControllerError> {
        if self.cross_fade_rate == Some(sample_rate) {
            return Ok(());
        }
        let samples = frames_for_duration(self.cross_fade, sample_rate);
        self.send(Command::SetCrossFade(samples))?;
        debug!(samples, sample_rate, "Cross-fade updated");
        self.cross_fade_rate = Some(sample_rate);
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), ControllerError> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ControllerError::QueueFull,
            TrySendError::Disconnected(_) => ControllerError::Disconnected,
        })
    }
}

impl std::fmt::Debug for SamplerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerController")
            .field("published_version", &self.published_version)
            .field("acknowledged_version", &self.acknowledged_version)
            .field("cross_fade", &self.cross_fade)
            .finish()
    }
}
