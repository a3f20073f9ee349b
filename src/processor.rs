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
//! The real-time side of the sampler.
//!
//! [`SamplerProcessor`] runs once per audio block on the audio thread. It
//! receives [`Command`]s from the control thread, applies host events, renders
//! the playing slices and reports back through [`Notification`]s. It never
//! blocks: commands are drained with `try_recv`, notifications are sent with
//! `try_send`, and the only lock it takes is the short bookkeeping lock of the
//! [`SharedBufferHandoff`]. Displaced buffers always travel back to the
//! control thread, so the audio thread never frees one.

mod events;
mod monitor;
mod retired;
mod sampler;

use std::num::NonZeroUsize;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::audio::SampleBuffers;
use crate::engine::{PlayMode, Polyphony, SliceSet, SliceSettings, PERCENT_PLAYED_NOT_PLAYING};
use crate::handoff::SharedBufferHandoff;

pub use events::{EventMapping, Selection, SliceEvent, SliceEventKind};
pub use monitor::SliceMonitor;
pub use retired::RETIRED_SLOTS;
pub use sampler::Sampler;

use retired::RetiredBuffers;

/// Free retired slots needed before a command is taken off the queue: two for
/// the command itself and one for a sampling pass completing in the block.
const COMMAND_RESERVE: usize = 3;

/// Default note mapped to slice 0 (C1 in the General MIDI drum map).
pub const DEFAULT_ROOT_KEY: u8 = 36;

/// Default number of pads per bank.
pub const DEFAULT_PADS_PER_BANK: u16 = 16;

/// Messages from the control thread to the real-time thread.
#[derive(Debug)]
pub enum Command {
    /// A buffer was published to the handoff under this version.
    BufferPublished(u64),
    SetNumSlices(NonZeroUsize),
    SetPolyphony(Polyphony),
    SetPlayMode(PlayMode),
    /// Cross-fade length in samples.
    SetCrossFade(usize),
    SetSliceSettings(usize, SliceSettings),
    SetBank(u16),
    SetRootKey(u8),
    /// Starts recording into a uniquely owned, pre-allocated buffer.
    StartSampling(Arc<SampleBuffers>),
    CancelSampling,
}

/// Messages from the real-time thread to the control thread.
///
/// Only `Retired` is guaranteed to arrive. The versions in `BufferAdopted`
/// and `SampleCaptured` are also kept in [`SliceMonitor`], which is what the
/// controller relies on.
#[derive(Debug)]
pub enum Notification {
    /// The real-time thread now plays the buffer published under this version
    /// (the latest one, even if several were published since the last block).
    BufferAdopted(u64),
    /// A sampling pass completed and was published under this version.
    SampleCaptured(u64),
    /// The sampling buffer could not be used because it was shared.
    SamplingRejected,
    /// A buffer the real-time thread no longer uses, to be dropped elsewhere.
    Retired(Arc<SampleBuffers>),
}

/// Per-block processing on the audio thread.
pub struct SamplerProcessor {
    slices: SliceSet,
    sampler: Sampler,
    mapping: EventMapping,
    handoff: Arc<SharedBufferHandoff>,
    commands: Receiver<Command>,
    notifications: Sender<Notification>,
    retired: RetiredBuffers,
    monitor: Arc<SliceMonitor>,
    /// Absolute frame at the start of the next block.
    frame: u64,
}

impl SamplerProcessor {
    pub(crate) fn new(
        slices: SliceSet,
        mapping: EventMapping,
        handoff: Arc<SharedBufferHandoff>,
        commands: Receiver<Command>,
        notifications: Sender<Notification>,
        monitor: Arc<SliceMonitor>,
    ) -> Self {
        Self {
            slices,
            sampler: Sampler::new(),
            mapping,
            handoff,
            commands,
            notifications,
            retired: RetiredBuffers::new(),
            monitor,
            frame: 0,
        }
    }

    pub fn slices(&self) -> &SliceSet {
        &self.slices
    }

    pub fn mapping(&self) -> EventMapping {
        self.mapping
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.is_armed()
    }

    /// Absolute frame at the start of the next block.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Displaced buffers waiting for room in the notification queue.
    pub fn retired_pending(&self) -> usize {
        self.retired.held()
    }

    /// Processes one block. `input` is only read while sampling. `events`
    /// carry frame offsets into this block and must be in time order.
    /// `output` is planar; every channel must have the block length.
    pub fn process(&mut self, input: &[Vec<f32>], output: &mut [Vec<f32>], events: &[SliceEvent]) {
        let block_len = output.first().map_or(0, Vec::len);
        debug_assert!(output.iter().all(|channel| channel.len() == block_len));

        self.retired.flush(&self.notifications);
        self.drain_commands();

        // Without a free slot the pass waits for the control thread to drain
        // the queue.
        if self.sampler.is_armed() && self.retired.free() > 0 {
            if let Some(captured) = self.sampler.record(input) {
                let version = self.handoff.rt_set(captured.clone());
                let previous = self.slices.set_buffer(Some(captured));
                self.retire(previous);
                self.monitor.set_captured_version(version);
                self.notify(Notification::SampleCaptured(version));
            }
        }

        for event in events {
            debug_assert!((event.frame as usize) < block_len.max(1));
            if let Some(selection) = self.mapping.resolve(event.kind) {
                self.slices.set_selected(
                    selection.slice,
                    selection.is_pad,
                    selection.selected,
                    self.frame + u64::from(event.frame),
                );
            }
        }

        if !self.slices.play(output) {
            for channel in output.iter_mut() {
                channel.fill(0.0);
            }
        }

        for slice in 0..self.slices.num_slices() {
            self.monitor
                .set_percent_played(slice, self.slices.percent_played(slice));
        }
        self.monitor.set_sampling_progress(self.sampler.progress());

        self.frame += block_len as u64;
        self.monitor.set_frames_processed(self.frame);
    }

    fn drain_commands(&mut self) {
        while self.retired.free() >= COMMAND_RESERVE {
            let Ok(command) = self.commands.try_recv() else {
                break;
            };
            match command {
                Command::BufferPublished(version) => {
                    if let Some(buffers) = self.handoff.rt_adjust(version) {
                        let previous = self.slices.set_buffer(Some(buffers));
                        self.retire(previous);
                        // May be newer than `version` if the control thread
                        // published again in the meantime.
                        let adopted = self.handoff.rt_version();
                        self.monitor.set_adopted_version(adopted);
                        self.notify(Notification::BufferAdopted(adopted));
                    }
                }
                Command::SetNumSlices(num_slices) => {
                    let previous = self.slices.num_slices();
                    self.slices.set_num_slices(num_slices);
                    for slice in self.slices.num_slices()..previous {
                        self.monitor
                            .set_percent_played(slice, PERCENT_PLAYED_NOT_PLAYING);
                    }
                }
                Command::SetPolyphony(polyphony) => self.slices.set_polyphony(polyphony),
                Command::SetPlayMode(play_mode) => self.slices.set_play_mode(play_mode),
                Command::SetCrossFade(samples) => self.slices.set_cross_fade(samples),
                Command::SetSliceSettings(slice, settings) => {
                    self.slices.set_settings(slice, settings)
                }
                Command::SetBank(bank) => self.mapping.bank = bank,
                Command::SetRootKey(root_key) => self.mapping.root_key = root_key,
                Command::StartSampling(buffers) => {
                    let previous = self.sampler.cancel();
                    self.retire(previous);
                    if let Err(buffers) = self.sampler.arm(buffers) {
                        self.retire(Some(buffers));
                        self.notify(Notification::SamplingRejected);
                    }
                }
                Command::CancelSampling => {
                    let previous = self.sampler.cancel();
                    self.retire(previous);
                }
            }
        }
    }

    /// Hands a displaced buffer back to the control thread, holding on to it
    /// while the queue is full.
    fn retire(&mut self, buffers: Option<Arc<SampleBuffers>>) {
        if let Some(buffers) = buffers {
            self.retired.retire(buffers, &self.notifications);
        }
    }

    fn notify(&self, notification: Notification) {
        // A full or closed queue drops the notification. None of them own a
        // buffer.
        let _ = self.notifications.try_send(notification);
    }
}

impl std::fmt::Debug for SamplerProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerProcessor")
            .field("slices", &self.slices)
            .field("mapping", &self.mapping)
            .field("sampling", &self.sampler.is_armed())
            .field("frame", &self.frame)
            .field("retired_pending", &self.retired.held())
            .finish()
    }
}
