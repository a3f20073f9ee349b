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
//! Reading and writing WAV files.
//!
//! Files are decoded entirely into memory. No resampling is performed: the
//! buffer keeps the file's sample rate.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, info};

use super::buffers::SampleBuffers;
use super::error::LoadError;

/// Loads a WAV file into memory.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffers, LoadError> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    debug!(
        path = ?path,
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "Decoding WAV file"
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(LoadError::UnsupportedBitDepth(spec.bits_per_sample));
            }
            // i64 shift so 32-bit files don't overflow.
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let buffers =
        SampleBuffers::from_interleaved(&interleaved, spec.channels as usize, spec.sample_rate);
    if buffers.is_empty() {
        return Err(LoadError::Empty(path.display().to_string()));
    }

    info!(
        path = ?path,
        channels = buffers.num_channels(),
        frames = buffers.num_frames(),
        duration_ms = buffers.duration().as_millis(),
        memory_kb = buffers.memory_size() / 1024,
        "Sample loaded"
    );

    Ok(buffers)
}

/// Writes the buffer as a 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, buffers: &SampleBuffers) -> Result<(), LoadError> {
    let mut writer = WavWriter::create(
        path.as_ref(),
        WavSpec {
            channels: buffers.num_channels() as u16,
            sample_rate: buffers.sample_rate(),
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;

    for sample in buffers.to_interleaved() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}
