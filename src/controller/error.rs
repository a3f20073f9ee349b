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
use crate::audio::LoadError;

/// Errors returned by the control side of the sampler.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("The real-time processor has been dropped")]
    Disconnected,

    #[error("The real-time command queue is full")]
    QueueFull,

    #[error("Unable to load sample: {0}")]
    Load(#[from] LoadError),

    #[error("Cannot sample {0} channels")]
    SamplingChannels(usize),
}
