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
//! Decoding of raw MIDI input into slice events.

use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::processor::{SliceEvent, SliceEventKind};

/// Decodes one raw MIDI message received `frame` frames into the block.
///
/// Note-on with velocity 0 is treated as a note-off. Everything other than
/// note messages (and anything that fails to parse) yields `None`.
pub fn parse_event(bytes: &[u8], frame: u32) -> Option<SliceEvent> {
    let LiveEvent::Midi { message, .. } = LiveEvent::parse(bytes).ok()? else {
        return None;
    };

    let kind = match message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
            SliceEventKind::NoteOn(key.as_int())
        }
        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
            SliceEventKind::NoteOff(key.as_int())
        }
        _ => return None,
    };

    Some(SliceEvent { frame, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        assert_eq!(
            parse_event(&[0x90, 60, 100], 12),
            Some(SliceEvent {
                frame: 12,
                kind: SliceEventKind::NoteOn(60)
            })
        );
    }

    #[test]
    fn test_note_on_other_channel() {
        assert_eq!(
            parse_event(&[0x9A, 37, 1], 0).map(|event| event.kind),
            Some(SliceEventKind::NoteOn(37))
        );
    }

    #[test]
    fn test_note_off() {
        assert_eq!(
            parse_event(&[0x80, 60, 64], 3).map(|event| event.kind),
            Some(SliceEventKind::NoteOff(60))
        );
    }

    #[test]
    fn test_zero_velocity_is_note_off() {
        assert_eq!(
            parse_event(&[0x90, 40, 0], 0).map(|event| event.kind),
            Some(SliceEventKind::NoteOff(40))
        );
    }

    #[test]
    fn test_other_messages_ignored() {
        // Control change.
        assert_eq!(parse_event(&[0xB0, 7, 100], 0), None);
        // Timing clock.
        assert_eq!(parse_event(&[0xF8], 0), None);
    }

    #[test]
    fn test_malformed_ignored() {
        assert_eq!(parse_event(&[], 0), None);
        assert_eq!(parse_event(&[0x90, 60], 0), None);
    }
}
