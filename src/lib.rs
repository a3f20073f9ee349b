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
//! A slicing sampler.
//!
//! A sound is loaded or recorded, split into equal slices, and the slices are
//! played back in real time from notes and pads. The crate is split between
//! the real-time side ([`processor`], [`engine`]) and the control side
//! ([`controller`]), which exchange buffers through [`handoff`].

pub mod audio;
pub mod config;
pub mod controller;
pub mod engine;
pub mod handoff;
pub mod midi;
pub mod processor;
#[cfg(test)]
mod testutil;
