// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::array;

use tilekit_platform::{Platform, AUDIO_CHANNELS};
use tracing::{debug, trace, warn};

use crate::{allocators::LinearAllocator, collections::FixedVec, resources::PcmSound};

/// The amount of sounds that can play at the same time, including the
/// background music.
pub const SFX_NUM_CHANNELS: usize = 4;
/// The channel reserved for background music. Sound effects never play on it.
pub const BGM_CHANNEL: usize = SFX_NUM_CHANNELS - 1;
/// The amount of sound effects the mixer can hold at a time.
pub const AUDIO_MAX_SFX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundSound {
    /// An index into the sound effect cache.
    Sfx(usize),
    Bgm,
}

#[derive(Debug, Default, Clone, Copy)]
struct SfxChannel {
    /// The index of the next sample to play.
    cursor: usize,
    sound: Option<BoundSound>,
}

impl SfxChannel {
    fn bind(&mut self, sound: BoundSound) {
        self.cursor = 0;
        self.sound = Some(sound);
    }

    fn stop(&mut self) {
        *self = SfxChannel::default();
    }
}

/// Plays sound effects and background music by mixing them in software into
/// the platform's audio buffer.
///
/// Sounds are played back as-is, without resampling, so they should all be at
/// the mixer's sample rate. Overlapping sounds are averaged, not summed, so
/// mixing never clips.
pub struct Mixer<'a> {
    sample_rate: u32,
    output: FixedVec<'a, [i16; AUDIO_CHANNELS]>,
    sfx_cache: [Option<PcmSound>; AUDIO_MAX_SFX],
    channels: [SfxChannel; SFX_NUM_CHANNELS],
    current_bgm: u8,
    bgm: Option<PcmSound>,
}

impl<'a> Mixer<'a> {
    /// Creates a mixer with an output buffer as long as the platform's audio
    /// buffer, allocated from `zone`.
    ///
    /// ### Panics
    ///
    /// If `zone` doesn't have room for the output buffer.
    #[track_caller]
    pub fn new(zone: &'a LinearAllocator, platform: &dyn Platform, sample_rate: u32) -> Mixer<'a> {
        let mut output = FixedVec::new(zone, platform.audio_buffer_length());
        output.fill_with_zeroes();
        Mixer {
            sample_rate,
            output,
            sfx_cache: Default::default(),
            channels: [SfxChannel::default(); SFX_NUM_CHANNELS],
            current_bgm: 0,
            bgm: None,
        }
    }

    /// Loads the raw mono PCM files at `paths` into the sound effect slots, in
    /// order, replacing what was there. Slots of files that can't be read are
    /// left empty, and paths past [`AUDIO_MAX_SFX`] are ignored.
    pub fn load_sfx(&mut self, platform: &dyn Platform, paths: &[&str]) {
        if paths.len() > AUDIO_MAX_SFX {
            warn!(
                "Only {AUDIO_MAX_SFX} sound effects fit in the mixer, ignoring the last {}.",
                paths.len() - AUDIO_MAX_SFX,
            );
        }
        for (id, path) in paths.iter().enumerate().take(AUDIO_MAX_SFX) {
            self.stop_sfx(id);
            self.sfx_cache[id] = PcmSound::read(platform, path, 1, self.sample_rate, false);
            match &self.sfx_cache[id] {
                Some(sound) => debug!("Loaded sound effect {id} ({} frames).", sound.frames()),
                None => warn!("Sound effect {id} ({path}) could not be loaded, leaving it empty."),
            }
        }
    }

    /// Puts an already decoded sound into sound effect slot `id`, stopping
    /// any channels playing the previous sound in the slot. If `id` is not
    /// below [`AUDIO_MAX_SFX`], the sound is returned back.
    pub fn insert_sfx(&mut self, id: usize, sound: PcmSound) -> Result<(), PcmSound> {
        if id >= AUDIO_MAX_SFX {
            return Err(sound);
        }
        self.stop_sfx(id);
        self.sfx_cache[id] = Some(sound);
        Ok(())
    }

    /// Starts playing the sound effect `id` on the first free channel. If all
    /// channels are busy, or there's no sound in the slot, nothing happens.
    pub fn play_sfx(&mut self, id: usize) {
        if !matches!(self.sfx_cache.get(id), Some(Some(_))) {
            trace!("Not playing sound effect {id}, the slot is empty.");
            return;
        }
        let free_channel = (self.channels[..BGM_CHANNEL].iter_mut())
            .find(|channel| channel.sound.is_none());
        match free_channel {
            Some(channel) => channel.bind(BoundSound::Sfx(id)),
            None => trace!("Not playing sound effect {id}, all channels are busy."),
        }
    }

    /// Loads the raw interleaved stereo PCM file at `path` and loops it on the
    /// background music channel, replacing the current music.
    ///
    /// `bgm_id` identifies the track: if it's the one already playing, or 0,
    /// nothing happens. If the file can't be read, the current music keeps
    /// playing.
    pub fn load_and_play_bgm(&mut self, platform: &dyn Platform, bgm_id: u8, path: &str) {
        if bgm_id == 0 || bgm_id == self.current_bgm {
            return;
        }
        let Some(sound) = PcmSound::read(platform, path, 2, self.sample_rate, true) else {
            warn!("Background music {bgm_id} ({path}) could not be loaded.");
            return;
        };
        self.play_bgm(bgm_id, sound);
    }

    /// Plays `sound` on the background music channel from the start,
    /// replacing the current music.
    pub fn play_bgm(&mut self, bgm_id: u8, sound: PcmSound) {
        debug!(
            "Playing background music {bgm_id} ({} frames).",
            sound.frames()
        );
        self.bgm = Some(sound);
        self.current_bgm = bgm_id;
        self.channels[BGM_CHANNEL].bind(BoundSound::Bgm);
    }

    /// Stops and unloads the background music.
    pub fn stop_bgm(&mut self) {
        self.bgm = None;
        self.current_bgm = 0;
        self.channels[BGM_CHANNEL].stop();
    }

    /// Unloads every sound effect, stopping the channels playing them. The
    /// background music keeps playing.
    pub fn unload_all_sfx(&mut self) {
        for id in 0..AUDIO_MAX_SFX {
            self.stop_sfx(id);
            self.sfx_cache[id] = None;
        }
    }

    fn stop_sfx(&mut self, id: usize) {
        for channel in &mut self.channels {
            if channel.sound == Some(BoundSound::Sfx(id)) {
                channel.stop();
            }
        }
    }

    /// Mixes the next buffer's worth of audio and passes it to the platform.
    /// Does nothing if the platform isn't ready for more audio yet, so this
    /// can be called every frame.
    pub fn tick(&mut self, platform: &dyn Platform) {
        profiling::function_scope!();
        if !platform.audio_can_write() {
            return;
        }

        for frame in self.output.iter_mut() {
            let mut mix = [0i32; AUDIO_CHANNELS];
            let mut contributors = [0i32; AUDIO_CHANNELS];

            for channel in &mut self.channels {
                let Some(bound) = channel.sound else {
                    continue;
                };
                let sound = match bound {
                    BoundSound::Sfx(id) => self.sfx_cache[id].as_ref(),
                    BoundSound::Bgm => self.bgm.as_ref(),
                };
                let Some(sound) = sound else {
                    channel.stop();
                    continue;
                };

                let data = sound.data();
                if let Some(&left) = data.get(channel.cursor) {
                    channel.cursor += 1;
                    mix[0] += left as i32;
                    contributors[0] += 1;

                    // Mono sounds play from both speakers.
                    let right = if sound.channels() == 1 {
                        Some(left)
                    } else {
                        let right = data.get(channel.cursor).copied();
                        if right.is_some() {
                            channel.cursor += 1;
                        }
                        right
                    };
                    if let Some(right) = right {
                        mix[1] += right as i32;
                        contributors[1] += 1;
                    }
                }

                if channel.cursor >= data.len() {
                    if sound.is_looping() {
                        channel.cursor = 0;
                    } else {
                        channel.stop();
                    }
                }
            }

            *frame = array::from_fn(|i| average(mix[i], contributors[i]));
        }

        platform.audio_write(&self.output);
    }

    /// Returns true if a sound is playing on the channel.
    pub fn is_playing(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.sound.is_some())
    }

    /// The id of the background music, 0 if there's none.
    pub fn current_bgm(&self) -> u8 {
        self.current_bgm
    }

    /// The sound effect in slot `id`, if one is loaded.
    pub fn sfx(&self, id: usize) -> Option<&PcmSound> {
        self.sfx_cache.get(id)?.as_ref()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The most recently mixed audio.
    pub fn buffer(&self) -> &[[i16; AUDIO_CHANNELS]] {
        &self.output
    }
}

/// `sum / count`, rounded to the nearest integer with ties away from zero.
/// Silence if nothing contributed.
fn average(sum: i32, count: i32) -> i16 {
    if count == 0 {
        return 0;
    }
    let rounded_magnitude = (sum.abs() + count / 2) / count;
    (sum.signum() * rounded_magnitude) as i16
}
