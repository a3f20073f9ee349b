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
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use crate::audio::frames_for_duration;
use crate::engine::{PlayMode, Polyphony, SliceSettings, DEFAULT_NUM_SLICES, MAX_SLICES};
use crate::processor::{DEFAULT_PADS_PER_BANK, DEFAULT_ROOT_KEY};

use super::error::ConfigError;

const DEFAULT_CROSS_FADE: Duration = Duration::from_millis(2);
const DEFAULT_BLOCK_SIZE: usize = 256;

/// A YAML representation of the sampler configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct SamplerConfig {
    /// Number of slices the buffer is split into (default: 16).
    num_slices: Option<usize>,

    /// mono or poly (default: poly).
    polyphony: Option<Polyphony>,

    /// hold or trigger (default: hold).
    play_mode: Option<PlayMode>,

    /// Fade length at slice boundaries, e.g. "2ms". "0ms" disables fading.
    cross_fade: Option<String>,

    /// MIDI note mapped to slice 0 (default: 36).
    root_key: Option<u8>,

    /// Pads per bank (default: 16).
    pads_per_bank: Option<u16>,

    /// Active pad bank (default: 0).
    bank: Option<u16>,

    /// Block size used when rendering offline (default: 256 frames).
    block_size: Option<usize>,

    /// Per-slice settings keyed by slice index.
    #[serde(default)]
    slices: HashMap<String, SliceSettings>,
}

impl SamplerConfig {
    /// Parses a sampler configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<SamplerConfig, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<SamplerConfig>()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value for range errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let num_slices = self.num_slices();
        if num_slices == 0 || num_slices > MAX_SLICES {
            return Err(ConfigError::NumSlices {
                value: num_slices,
                max: MAX_SLICES,
            });
        }
        if self.pads_per_bank() == 0 {
            return Err(ConfigError::Zero {
                field: "pads_per_bank",
            });
        }
        if self.block_size() == 0 {
            return Err(ConfigError::Zero {
                field: "block_size",
            });
        }
        self.cross_fade()?;
        self.slice_settings()?;
        Ok(())
    }

    pub fn num_slices(&self) -> usize {
        self.num_slices.unwrap_or(DEFAULT_NUM_SLICES)
    }

    pub fn polyphony(&self) -> Polyphony {
        self.polyphony.unwrap_or_default()
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode.unwrap_or_default()
    }

    /// Returns the cross-fade duration (default: 2ms).
    pub fn cross_fade(&self) -> Result<Duration, ConfigError> {
        match &self.cross_fade {
            Some(cross_fade) => DurationString::from_string(cross_fade.clone())
                .map(Duration::from)
                .map_err(|e| ConfigError::CrossFade {
                    value: cross_fade.clone(),
                    reason: e.to_string(),
                }),
            None => Ok(DEFAULT_CROSS_FADE),
        }
    }

    /// Converts the cross-fade duration into a sample count at `sample_rate`.
    pub fn cross_fade_samples(&self, sample_rate: u32) -> Result<usize, ConfigError> {
        Ok(frames_for_duration(self.cross_fade()?, sample_rate))
    }

    pub fn root_key(&self) -> u8 {
        self.root_key.unwrap_or(DEFAULT_ROOT_KEY)
    }

    pub fn pads_per_bank(&self) -> u16 {
        self.pads_per_bank.unwrap_or(DEFAULT_PADS_PER_BANK)
    }

    pub fn bank(&self) -> u16 {
        self.bank.unwrap_or(0)
    }

    pub fn block_size(&self) -> usize {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    /// Returns the per-slice settings, sorted by slice index.
    pub fn slice_settings(&self) -> Result<Vec<(usize, SliceSettings)>, ConfigError> {
        let mut settings = self
            .slices
            .iter()
            .map(|(index, settings)| match index.trim().parse::<usize>() {
                Ok(parsed) if parsed < MAX_SLICES => Ok((parsed, *settings)),
                _ => Err(ConfigError::SliceIndex(index.clone())),
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        settings.sort_by_key(|(index, _)| *index);
        Ok(settings)
    }
}
