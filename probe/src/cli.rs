// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use bpaf::{batteries::verbose_by_slice, construct, long, positional, OptionParser, Parser};
use tilekit_platform::AUDIO_SAMPLE_RATE;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone)]
pub struct Options {
    pub verbosity_level: LevelFilter,
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Map(MapArgs),
    Mix(MixArgs),
}

#[derive(Debug, Clone)]
pub struct MapArgs {
    pub config: PathBuf,
    /// x, y, width, height
    pub camera: [f32; 4],
    pub view: [f32; 2],
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct MixArgs {
    pub rate: u32,
    pub frames: usize,
    pub ticks: usize,
    pub out: PathBuf,
    pub bgm: Option<PathBuf>,
    pub sfx: Vec<PathBuf>,
}

pub fn options() -> OptionParser<Options> {
    let verbosity_level = verbose_by_slice(
        3,
        [
            LevelFilter::OFF,
            LevelFilter::ERROR,
            LevelFilter::WARN,
            LevelFilter::INFO,
            LevelFilter::DEBUG,
            LevelFilter::TRACE,
        ],
    );

    let map = map_command();
    let mix = mix_command();
    let command = construct!([map, mix]);

    construct!(Options {
        verbosity_level,
        command,
    })
    .to_options()
    .descr("Runs the tilekit renderers and mixer against files on disk")
}

fn map_command() -> impl Parser<Command> {
    let config = long("config")
        .help("The JSON map config to render")
        .argument::<PathBuf>("FILE")
        .complete_shell(bpaf::ShellComp::File {
            mask: Some("*.json"),
        });

    let camera = long("camera")
        .help("The area of the world visible on the screen")
        .argument::<String>("X,Y,W,H")
        .parse(|s| parse_floats::<4>(&s));

    let view = long("view")
        .help("The scroll position subtracted from the map when drawing")
        .argument::<String>("X,Y")
        .parse(|s| parse_floats::<2>(&s))
        .fallback([0.0, 0.0]);

    let json = long("json")
        .help("Print every platform call as JSON instead of a summary")
        .switch();

    construct!(MapArgs {
        config,
        camera,
        view,
        json,
    })
    .map(Command::Map)
    .to_options()
    .descr("Renders one frame of a tile map and reports the draw calls")
    .command("map")
}

fn mix_command() -> impl Parser<Command> {
    let rate = long("rate")
        .help("The sample rate of the sounds and the output, in Hz")
        .argument::<u32>("HZ")
        .fallback(AUDIO_SAMPLE_RATE)
        .display_fallback();

    let frames = long("frames")
        .help("The length of one audio buffer, in stereo frames")
        .argument::<usize>("N")
        .guard(|frames| *frames > 0, "the audio buffer can't be empty")
        .fallback(256)
        .display_fallback();

    let ticks = long("ticks")
        .help("How many audio buffers to mix")
        .argument::<usize>("T")
        .fallback(1)
        .display_fallback();

    let out = long("out")
        .help("Where to write the mixed raw stereo samples")
        .argument::<PathBuf>("FILE");

    let bgm = long("bgm")
        .help("A raw stereo sound to loop as background music")
        .argument::<PathBuf>("FILE")
        .optional();

    let sfx = positional::<PathBuf>("SFX")
        .help("Raw mono sounds, each played once from the start")
        .some("at least one sound effect is needed");

    construct!(MixArgs {
        rate,
        frames,
        ticks,
        out,
        bgm,
        sfx,
    })
    .map(Command::Mix)
    .to_options()
    .descr("Mixes raw PCM sound effects into a raw PCM file")
    .command("mix")
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let mut values = [0.0; N];
    let mut parts = s.split(',');
    for value in &mut values {
        let part = parts
            .next()
            .ok_or_else(|| format!("expected {N} comma-separated numbers, got \"{s}\""))?;
        *value = (part.trim().parse::<f32>()).map_err(|err| format!("\"{part}\": {err}"))?;
    }
    if parts.next().is_some() {
        return Err(format!("expected {N} comma-separated numbers, got \"{s}\""));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::{options, parse_floats, Command};

    #[test]
    fn check_bpaf_invariants() {
        options().check_invariants(true);
    }

    #[test]
    fn float_lists() {
        assert_eq!(Ok([1.0, -2.5, 3.0, 4.0]), parse_floats::<4>("1,-2.5, 3,4"));
        assert!(parse_floats::<4>("1,2,3").is_err());
        assert!(parse_floats::<2>("1,2,3").is_err());
        assert!(parse_floats::<2>("1,x").is_err());
    }

    #[test]
    fn map_command_line() {
        let options = options()
            .run_inner(&["-v", "map", "--config", "map.json", "--camera", "0,0,320,240"])
            .unwrap();
        let Command::Map(args) = options.command else {
            panic!("expected the map command");
        };
        assert_eq!([0.0, 0.0, 320.0, 240.0], args.camera);
        assert_eq!([0.0, 0.0], args.view);
        assert!(!args.json);
    }

    #[test]
    fn mix_command_line() {
        let options = options()
            .run_inner(&["mix", "--ticks", "3", "--out", "out.raw", "a.raw", "b.raw"])
            .unwrap();
        let Command::Mix(args) = options.command else {
            panic!("expected the mix command");
        };
        assert_eq!(3, args.ticks);
        assert_eq!(2, args.sfx.len());
        assert!(args.bgm.is_none());

        assert!(super::options().run_inner(&["mix", "--out", "out.raw"]).is_err());
    }
}
