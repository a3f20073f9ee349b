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
use std::error::Error;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{crate_version, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use slicetrack::audio::{self, SampleBuffers};
use slicetrack::config::SamplerConfig;
use slicetrack::controller::SamplerController;
use slicetrack::engine::{SliceSet, DEFAULT_NUM_SLICES, MAX_CHANNELS, MAX_SLICES};
use slicetrack::processor::{SliceEvent, SliceEventKind};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A slicing sampler."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the format of a WAV file and how it would be sliced.
    Info {
        /// The WAV file to inspect.
        path: PathBuf,
        /// The number of slices to split the file into.
        #[arg(short, long, default_value_t = DEFAULT_NUM_SLICES)]
        slices: usize,
    },
    /// Plays slices of a WAV file and writes the result to a new WAV file.
    Render {
        /// The WAV file to slice.
        input: PathBuf,
        /// Where to write the rendered audio.
        output: PathBuf,
        /// The sampler configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// A slice hit in the form <SLICE>@<START>[-<END>], in frames. For
        /// example, 3@44100-88200. Without an end the slice is released at the
        /// next block boundary.
        #[arg(long = "hit", value_parser = parse_hit)]
        hits: Vec<Hit>,
    },
}

/// One press of a slice.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Hit {
    slice: usize,
    start: u64,
    end: Option<u64>,
}

fn parse_hit(value: &str) -> Result<Hit, String> {
    let (slice, range) = value
        .split_once('@')
        .ok_or_else(|| format!("hit {:?} is not of the form <SLICE>@<START>[-<END>]", value))?;
    let slice = slice
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid slice {:?}: {}", slice, e))?;

    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start, Some(end)),
        None => (range, None),
    };
    let start = start
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid start frame {:?}: {}", start, e))?;
    let end = end
        .map(|end| {
            end.trim()
                .parse::<u64>()
                .map_err(|e| format!("invalid end frame {:?}: {}", end, e))
        })
        .transpose()?;

    if end.is_some_and(|end| end <= start) {
        return Err(format!("hit {:?} ends before it starts", value));
    }

    Ok(Hit { slice, start, end })
}

/// Turns hits into note events sorted by absolute frame. Selection changes
/// take effect per block, so a release is never scheduled in the block of its
/// press.
fn schedule(
    hits: &[Hit],
    root_key: u8,
    block_size: usize,
) -> Result<Vec<(u64, SliceEventKind)>, Box<dyn Error>> {
    let block_size = block_size as u64;
    let mut events = Vec::with_capacity(hits.len() * 2);

    for hit in hits {
        let note = u8::try_from(hit.slice)
            .ok()
            .and_then(|slice| root_key.checked_add(slice))
            .filter(|note| *note < 128)
            .ok_or_else(|| {
                format!(
                    "slice {} has no MIDI note with root key {}",
                    hit.slice, root_key
                )
            })?;

        let next_block = (hit.start / block_size + 1) * block_size;
        let release = hit.end.unwrap_or(next_block).max(next_block);

        events.push((hit.start, SliceEventKind::NoteOn(note)));
        events.push((release, SliceEventKind::NoteOff(note)));
    }

    events.sort_by_key(|(frame, _)| *frame);
    Ok(events)
}

fn print_info(path: &Path, slices: usize) -> Result<(), Box<dyn Error>> {
    let num_slices = NonZeroUsize::new(slices).ok_or("--slices must be at least 1")?;
    if slices > MAX_SLICES {
        warn!(slices, max = MAX_SLICES, "Too many slices, capping");
    }

    let buffers = Arc::new(audio::load_wav(path)?);
    println!("{}:", path.display());
    println!("  Sample rate: {} Hz", buffers.sample_rate());
    println!("  Channels: {}", buffers.num_channels());
    println!("  Frames: {}", buffers.num_frames());
    println!("  Duration: {:.3}s", buffers.duration().as_secs_f64());

    let mut set = SliceSet::default();
    set.set_num_slices(num_slices);
    set.set_buffer(Some(buffers));

    println!("Slices (count: {}):", set.num_slices());
    for index in 0..set.num_slices() {
        match set.slice(index) {
            Some(slice) if slice.has_range() => {
                let (start, end) = slice.range();
                println!("  {:>2}: {}..{} ({} frames)", index, start, end, end - start);
            }
            _ => println!("  {:>2}: (too short to slice)", index),
        }
    }

    Ok(())
}

fn render(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    hits: &[Hit],
) -> Result<(), Box<dyn Error>> {
    let config = match config {
        Some(path) => SamplerConfig::deserialize(path)?,
        None => SamplerConfig::default(),
    };
    let (mut controller, mut processor) = SamplerController::new(&config)?;

    let buffers = audio::load_wav(input)?;
    let sample_rate = buffers.sample_rate();
    let num_frames = buffers.num_frames();
    let num_channels = buffers.num_channels().min(MAX_CHANNELS);
    controller.publish(buffers)?;

    let block_size = config.block_size();
    let events = schedule(hits, config.root_key(), block_size)?;

    let renderer = thread::Builder::new()
        .name("render".to_string())
        .spawn(move || {
            let mut rendered = vec![Vec::with_capacity(num_frames); num_channels];
            let mut block = vec![Vec::with_capacity(block_size); num_channels];
            let mut block_events = Vec::new();
            let mut next_event = 0;
            let mut frame = 0;

            while frame < num_frames {
                let len = block_size.min(num_frames - frame);
                for channel in block.iter_mut() {
                    channel.resize(len, 0.0);
                }

                block_events.clear();
                let block_end = (frame + len) as u64;
                while let Some((at, kind)) = events.get(next_event) {
                    if *at >= block_end {
                        break;
                    }
                    block_events.push(SliceEvent::new((*at - frame as u64) as u32, *kind));
                    next_event += 1;
                }

                processor.process(&[], &mut block, &block_events);
                for (out, channel) in rendered.iter_mut().zip(&block) {
                    out.extend_from_slice(channel);
                }
                frame += len;
            }

            SampleBuffers::from_channels(sample_rate, rendered)
        })?;
    let rendered = renderer.join().map_err(|_| "render thread panicked")?;
    controller.poll();

    audio::write_wav(output, &rendered)?;
    info!(
        output = ?output,
        frames = rendered.num_frames(),
        hits = hits.len(),
        "Render complete"
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { path, slices } => print_info(&path, slices)?,
        Commands::Render {
            input,
            output,
            config,
            hits,
        } => render(&input, &output, config.as_deref(), &hits)?,
    }

    Ok(())
}
