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

use super::VersionedHandoff;

/// Hands sample buffers between the control (UI) thread and the real-time
/// thread. The UI side is side A, the real-time side is side B.
///
/// The real-time thread only ever obtains a buffer through
/// [`SharedBufferHandoff::rt_adjust`], never by building one itself.
#[derive(Debug, Default)]
pub struct SharedBufferHandoff {
    handoff: VersionedHandoff<SampleBuffers>,
}

impl SharedBufferHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a buffer loaded or edited on the UI thread.
    pub fn ui_set(&self, buffers: Arc<SampleBuffers>) -> u64 {
        self.handoff.side_a_set(buffers)
    }

    /// Picks up a buffer the real-time thread published (a sampling pass).
    pub fn ui_adjust(&self, version: u64) -> Option<Arc<SampleBuffers>> {
        self.handoff.side_a_adjust(version)
    }

    /// Publishes a buffer produced on the real-time thread.
    pub fn rt_set(&self, buffers: Arc<SampleBuffers>) -> u64 {
        self.handoff.side_b_set(buffers)
    }

    /// Picks up a buffer the UI thread published.
    pub fn rt_adjust(&self, version: u64) -> Option<Arc<SampleBuffers>> {
        self.handoff.side_b_adjust(version)
    }

    pub fn ui_version(&self) -> u64 {
        self.handoff.side_a_version()
    }

    pub fn rt_version(&self) -> u64 {
        self.handoff.side_b_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ramp_buffers;

    #[test]
    fn test_ui_to_rt() {
        let handoff = SharedBufferHandoff::new();
        let version = handoff.ui_set(Arc::new(ramp_buffers(2, 8, 0.0)));

        let adopted = handoff.rt_adjust(version).unwrap();
        assert_eq!(adopted.num_frames(), 8);
        assert_eq!(handoff.rt_version(), version);
        assert!(handoff.rt_adjust(version).is_none());
    }

    #[test]
    fn test_rt_to_ui() {
        let handoff = SharedBufferHandoff::new();
        handoff.ui_set(Arc::new(ramp_buffers(1, 4, 0.0)));
        let version = handoff.rt_set(Arc::new(ramp_buffers(2, 16, 0.0)));

        assert!(handoff.rt_adjust(version).is_none());
        let adopted = handoff.ui_adjust(version).unwrap();
        assert_eq!(adopted.num_frames(), 16);
        assert_eq!(handoff.ui_version(), version);
    }
}
