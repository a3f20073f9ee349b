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

use crossbeam_channel::{Sender, TrySendError};

use crate::audio::SampleBuffers;

use super::Notification;

/// Number of displaced buffers the real-time thread can hold on to while the
/// notification queue is full.
pub const RETIRED_SLOTS: usize = 4;

/// Buffers the real-time thread no longer uses but could not hand back yet.
///
/// The slots are allocated up front. A buffer lands here when the
/// notification queue is full and is sent again at the start of the next
/// block, so its last reference is never dropped on the audio thread.
pub(crate) struct RetiredBuffers {
    slots: [Option<Arc<SampleBuffers>>; RETIRED_SLOTS],
}

impl RetiredBuffers {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    pub(crate) fn free(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }

    pub(crate) fn held(&self) -> usize {
        RETIRED_SLOTS - self.free()
    }

    /// Sends `buffers` to the control thread, or keeps it for a later
    /// [`RetiredBuffers::flush`] if the queue is full. Callers reserve a free
    /// slot before displacing a buffer.
    pub(crate) fn retire(&mut self, buffers: Arc<SampleBuffers>, queue: &Sender<Notification>) {
        let buffers = match queue.try_send(Notification::Retired(buffers)) {
            Ok(()) => return,
            Err(TrySendError::Full(Notification::Retired(buffers)))
            | Err(TrySendError::Disconnected(Notification::Retired(buffers))) => buffers,
            Err(_) => return,
        };
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(buffers),
            None => debug_assert!(false, "no free slot for a retired buffer"),
        }
    }

    /// Retries the held buffers in order. Stops at the first one the queue
    /// does not accept.
    pub(crate) fn flush(&mut self, queue: &Sender<Notification>) {
        for slot in self.slots.iter_mut() {
            let Some(buffers) = slot.take() else {
                continue;
            };
            match queue.try_send(Notification::Retired(buffers)) {
                Ok(()) => {}
                Err(TrySendError::Full(Notification::Retired(buffers)))
                | Err(TrySendError::Disconnected(Notification::Retired(buffers))) => {
                    *slot = Some(buffers);
                    return;
                }
                Err(_) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    fn buffers(frames: usize) -> Arc<SampleBuffers> {
        Arc::new(SampleBuffers::new(44100, 1, frames))
    }

    #[test]
    fn test_sends_when_queue_has_room() {
        let (tx, rx) = bounded(1);
        let mut retired = RetiredBuffers::new();

        retired.retire(buffers(4), &tx);
        assert_eq!(retired.free(), RETIRED_SLOTS);
        assert!(matches!(rx.try_recv(), Ok(Notification::Retired(b)) if b.num_frames() == 4));
    }

    #[test]
    fn test_holds_until_queue_drains() {
        let (tx, rx) = bounded(1);
        tx.send(Notification::SamplingRejected).unwrap();
        let mut retired = RetiredBuffers::new();

        let held = buffers(8);
        let weak = Arc::downgrade(&held);
        retired.retire(held, &tx);
        assert_eq!(retired.held(), 1);
        assert!(weak.upgrade().is_some());

        retired.flush(&tx);
        assert_eq!(retired.held(), 1);

        rx.try_recv().unwrap();
        retired.flush(&tx);
        assert_eq!(retired.held(), 0);
        assert!(weak.upgrade().is_some());

        drop(rx.try_recv().unwrap());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_flush_keeps_order() {
        let (tx, rx) = bounded(2);
        tx.send(Notification::SamplingRejected).unwrap();
        tx.send(Notification::SamplingRejected).unwrap();
        let mut retired = RetiredBuffers::new();
        retired.retire(buffers(1), &tx);
        retired.retire(buffers(2), &tx);
        retired.retire(buffers(3), &tx);

        rx.try_iter().take(2).for_each(drop);
        retired.flush(&tx);
        assert_eq!(retired.held(), 1);

        let frames: Vec<usize> = rx
            .try_iter()
            .map(|notification| match notification {
                Notification::Retired(b) => b.num_frames(),
                other => panic!("unexpected notification {:?}", other),
            })
            .collect();
        assert_eq!(frames, vec![1, 2]);
    }
}
