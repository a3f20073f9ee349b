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
use super::{DEFAULT_PADS_PER_BANK, DEFAULT_ROOT_KEY};

/// What happened to a note or pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEventKind {
    NoteOn(u8),
    NoteOff(u8),
    PadOn(u16),
    PadOff(u16),
}

/// A host event at a frame offset within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceEvent {
    pub frame: u32,
    pub kind: SliceEventKind,
}

impl SliceEvent {
    pub fn new(frame: u32, kind: SliceEventKind) -> Self {
        Self { frame, kind }
    }
}

/// A selection change resolved to a slice index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub slice: usize,
    pub is_pad: bool,
    pub selected: bool,
}

/// Maps notes and pads onto slice indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMapping {
    /// Note mapped to slice 0. Lower notes are ignored.
    pub root_key: u8,
    pub pads_per_bank: u16,
    pub bank: u16,
}

impl Default for EventMapping {
    fn default() -> Self {
        Self {
            root_key: DEFAULT_ROOT_KEY,
            pads_per_bank: DEFAULT_PADS_PER_BANK,
            bank: 0,
        }
    }
}

impl EventMapping {
    pub fn resolve(&self, kind: SliceEventKind) -> Option<Selection> {
        let (slice, is_pad, selected) = match kind {
            SliceEventKind::NoteOn(pitch) => (self.note_slice(pitch)?, false, true),
            SliceEventKind::NoteOff(pitch) => (self.note_slice(pitch)?, false, false),
            SliceEventKind::PadOn(pad) => (self.pad_slice(pad), true, true),
            SliceEventKind::PadOff(pad) => (self.pad_slice(pad), true, false),
        };
        Some(Selection {
            slice,
            is_pad,
            selected,
        })
    }

    fn note_slice(&self, pitch: u8) -> Option<usize> {
        pitch.checked_sub(self.root_key).map(usize::from)
    }

    fn pad_slice(&self, pad: u16) -> usize {
        usize::from(pad) + usize::from(self.bank) * usize::from(self.pads_per_bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_mapping() {
        let mapping = EventMapping::default();

        assert_eq!(
            mapping.resolve(SliceEventKind::NoteOn(36)),
            Some(Selection {
                slice: 0,
                is_pad: false,
                selected: true
            })
        );
        assert_eq!(
            mapping.resolve(SliceEventKind::NoteOff(40)),
            Some(Selection {
                slice: 4,
                is_pad: false,
                selected: false
            })
        );
    }

    #[test]
    fn test_note_below_root_ignored() {
        let mapping = EventMapping::default();
        assert_eq!(mapping.resolve(SliceEventKind::NoteOn(35)), None);
    }

    #[test]
    fn test_pad_mapping_uses_bank() {
        let mapping = EventMapping {
            root_key: 36,
            pads_per_bank: 16,
            bank: 2,
        };

        assert_eq!(
            mapping.resolve(SliceEventKind::PadOn(3)),
            Some(Selection {
                slice: 35,
                is_pad: true,
                selected: true
            })
        );
        assert_eq!(
            mapping.resolve(SliceEventKind::PadOff(0)).map(|s| s.slice),
            Some(32)
        );
    }
}
