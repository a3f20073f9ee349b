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

//! Versioned exchange of shared objects between two threads.
//!
//! Each side holds its own current object. Publishing on one side bumps a
//! global version number, which the caller relays to the other side out of
//! band (typically in a message). The other side then calls its `adjust`
//! function with that number to pick the object up. The lock only guards the
//! pointer and version bookkeeping: objects are never built or destroyed
//! while it is held.

mod buffer;

use std::sync::Arc;

use parking_lot::Mutex;

pub use buffer::SharedBufferHandoff;

struct Slot<T> {
    object: Option<Arc<T>>,
    /// Version of `object`, i.e. the last version this side has seen.
    version: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            object: None,
            version: 0,
        }
    }
}

struct State<T> {
    version: u64,
    side_a: Slot<T>,
    side_b: Slot<T>,
}

#[derive(Clone, Copy)]
enum Side {
    A,
    B,
}

impl<T> State<T> {
    fn slots(&mut self, side: Side) -> (&mut Slot<T>, &mut Slot<T>) {
        match side {
            Side::A => (&mut self.side_a, &mut self.side_b),
            Side::B => (&mut self.side_b, &mut self.side_a),
        }
    }
}

/// Two-sided object exchange keyed by a monotonically increasing version.
///
/// A side only adopts an object whose version is newer than the one it last
/// saw and not newer than the global counter, so replays of stale versions,
/// versions it published itself and made-up versions are all no-ops.
pub struct VersionedHandoff<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for VersionedHandoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionedHandoff<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                version: 0,
                side_a: Slot::default(),
                side_b: Slot::default(),
            }),
        }
    }

    /// Latest version handed out by either side.
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Version of the object side A currently holds.
    pub fn side_a_version(&self) -> u64 {
        self.state.lock().side_a.version
    }

    /// Version of the object side B currently holds.
    pub fn side_b_version(&self) -> u64 {
        self.state.lock().side_b.version
    }

    /// Replaces side A's object and returns its new version for relaying.
    pub fn side_a_set(&self, object: Arc<T>) -> u64 {
        self.set(Side::A, object)
    }

    /// Adopts side B's object if `version` is new to side A.
    pub fn side_a_adjust(&self, version: u64) -> Option<Arc<T>> {
        self.adjust(Side::A, version)
    }

    /// Replaces side B's object and returns its new version for relaying.
    pub fn side_b_set(&self, object: Arc<T>) -> u64 {
        self.set(Side::B, object)
    }

    /// Adopts side A's object if `version` is new to side B.
    pub fn side_b_adjust(&self, version: u64) -> Option<Arc<T>> {
        self.adjust(Side::B, version)
    }

    fn set(&self, side: Side, object: Arc<T>) -> u64 {
        let previous;
        let version;
        {
            let mut state = self.state.lock();
            state.version += 1;
            version = state.version;
            let (own, _) = state.slots(side);
            previous = own.object.replace(object);
            own.version = version;
        }
        // Dropped outside the lock: this may free the object.
        drop(previous);
        version
    }

    fn adjust(&self, side: Side, version: u64) -> Option<Arc<T>> {
        let previous;
        let adopted;
        {
            let mut state = self.state.lock();
            let global = state.version;
            let (own, other) = state.slots(side);
            if version <= own.version || version > global {
                return None;
            }
            // The other side may have published again since `version` was
            // relayed; adopting its latest object is what the caller wants.
            adopted = other.object.clone();
            own.version = other.version;
            previous = std::mem::replace(&mut own.object, adopted.clone());
        }
        drop(previous);
        adopted
    }
}

impl<T> std::fmt::Debug for VersionedHandoff<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VersionedHandoff")
            .field("version", &state.version)
            .field("side_a_version", &state.side_a.version)
            .field("side_b_version", &state.side_b.version)
            .finish()
    }
}
