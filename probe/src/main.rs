// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runs the toolkit's renderers and mixer on the host, against files on disk,
//! and reports what they asked the platform to do.

mod cli;
mod config;
mod host;

use std::{fs, mem, path::Path};

use anyhow::Context;
use cli::{Command, MapArgs, MixArgs};
use host::{HostPlatform, RecordedCall};
use tilekit::{
    allocators::LinearAllocator,
    geom::{Position, Rect},
    mixer::Mixer,
    renderer::{TileCoord, TileMap, TileMapCached, CACHED_TILE_IDS},
    resources::TileSource,
};
use tilekit_platform::{TextureRef, AUDIO_CHANNELS};
use tracing::{debug, info};

/// Padding for the alignment of each allocation made while loading a map.
const ZONE_SLACK: usize = 4096;

fn main() -> anyhow::Result<()> {
    let options = cli::options().run();

    tracing_subscriber::fmt()
        .with_max_level(options.verbosity_level)
        .with_writer(std::io::stderr)
        .init();

    match options.command {
        Command::Map(args) => probe_map(&args),
        Command::Mix(args) => probe_mix(&args),
    }
}

fn probe_map(args: &MapArgs) -> anyhow::Result<()> {
    let config = config::read(&args.config)?;
    let csv_path = config.csv_path(&args.config);
    let csv_path = path_str(&csv_path)?;

    let platform = HostPlatform::new(0);
    let map_size = config.map_size();
    let zone_size = map_size.area() * mem::size_of::<TileCoord>()
        + CACHED_TILE_IDS * mem::align_of::<TileCoord>()
        + ZONE_SLACK;
    let zone =
        LinearAllocator::new(&platform, zone_size).context("Failed to allocate the map zone")?;
    debug!("Allocated a {zone_size} byte zone for the map.");

    let sheet = config.sprite_sheet(TextureRef::new(1));
    let source = TileSource::File {
        platform: &platform,
        path: csv_path,
    };
    let [x, y, w, h] = args.camera;
    let camera = Rect::xywh(x, y, w, h);
    let view = Position::new(args.view[0], args.view[1]);

    if config.cached {
        let mut map = TileMapCached::new_in(&zone, sheet, source, map_size, config.tile_size())
            .context("Failed to read the tile map")?;
        map.set_render_offset(config.render_offset());
        info!(
            "Loaded a cached {}x{} map with {} tiles.",
            map_size.width,
            map_size.height,
            map.total_count(),
        );
        map.render(&platform, camera);
    } else {
        let mut map = TileMap::new_in(&zone, sheet, source, map_size, config.tile_size())
            .context("Failed to read the tile map")?;
        map.set_render_offset(config.render_offset());
        info!("Loaded a {}x{} map.", map_size.width, map_size.height);
        map.render(&platform, camera, view);
    }

    let calls = platform.calls();
    if args.json {
        let json = serde_json::to_string_pretty(&calls).context("Failed to serialize the calls")?;
        println!("{json}");
    } else {
        print_summary(&calls);
    }
    Ok(())
}

fn print_summary(calls: &[RecordedCall]) {
    let mut binds = 0;
    let mut draws = 0;
    for call in calls {
        match call {
            RecordedCall::SetRenderMode { texture, mode } => {
                println!("render mode for texture {texture}: {mode}");
            }
            RecordedCall::Bind { .. } => binds += 1,
            RecordedCall::Draw { .. } => draws += 1,
        }
    }
    println!("{binds} texture binds, {draws} draws");
}

fn probe_mix(args: &MixArgs) -> anyhow::Result<()> {
    let platform = HostPlatform::new(args.frames);
    let zone_size = args.frames * mem::size_of::<[i16; AUDIO_CHANNELS]>() + ZONE_SLACK;
    let zone =
        LinearAllocator::new(&platform, zone_size).context("Failed to allocate the mixer zone")?;
    let mut mixer = Mixer::new(&zone, &platform, args.rate);

    let sfx_paths = (args.sfx.iter())
        .map(|path| path_str(path))
        .collect::<anyhow::Result<Vec<&str>>>()?;
    mixer.load_sfx(&platform, &sfx_paths);
    for id in 0..sfx_paths.len() {
        mixer.play_sfx(id);
    }

    if let Some(bgm) = &args.bgm {
        mixer.load_and_play_bgm(&platform, 1, path_str(bgm)?);
    }

    for _ in 0..args.ticks {
        mixer.tick(&platform);
    }

    let audio = platform.take_audio();
    fs::write(&args.out, bytemuck::cast_slice::<_, u8>(&audio))
        .context("Failed to write the mixed audio")?;
    info!(
        "Wrote {} frames ({:.2}s) to {}.",
        audio.len(),
        audio.len() as f64 / args.rate.max(1) as f64,
        args.out.display(),
    );
    Ok(())
}

fn path_str(path: &Path) -> anyhow::Result<&str> {
    path.to_str()
        .with_context(|| format!("The path {} is not valid UTF-8", path.display()))
}
