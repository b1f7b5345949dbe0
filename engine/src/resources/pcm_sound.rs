// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use alloc::{boxed::Box, vec};

use tilekit_platform::Platform;
use tracing::debug;

use super::OpenFile;

/// Decoded 16-bit PCM audio, either mono or interleaved stereo.
///
/// The sound is played back as-is, so `sample_rate` is informational: it
/// should match the rate of the mixer playing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmSound {
    sample_rate: u32,
    channels: u8,
    data: Box<[i16]>,
    looping: bool,
}

impl PcmSound {
    /// Creates a sound from already decoded samples.
    ///
    /// ### Panics
    ///
    /// If `channels` is not 1 or 2.
    #[track_caller]
    pub fn new(data: Box<[i16]>, channels: u8, sample_rate: u32, looping: bool) -> PcmSound {
        assert!(
            channels == 1 || channels == 2,
            "sounds are mono or stereo, not {channels} channels",
        );
        PcmSound {
            sample_rate,
            channels,
            data,
            looping,
        }
    }

    /// Creates a sound from raw headerless native-endian samples. A trailing
    /// odd byte is ignored.
    ///
    /// ### Panics
    ///
    /// If `channels` is not 1 or 2.
    #[track_caller]
    pub fn from_bytes(bytes: &[u8], channels: u8, sample_rate: u32, looping: bool) -> PcmSound {
        let mut data = vec![0i16; bytes.len() / 2].into_boxed_slice();
        let data_bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut data[..]);
        data_bytes.copy_from_slice(&bytes[..data_bytes.len()]);
        PcmSound::new(data, channels, sample_rate, looping)
    }

    /// Reads a raw headerless PCM file through the platform. Returns None if
    /// the file can't be read.
    ///
    /// ### Panics
    ///
    /// If `channels` is not 1 or 2.
    #[track_caller]
    pub fn read(
        platform: &dyn Platform,
        path: &str,
        channels: u8,
        sample_rate: u32,
        looping: bool,
    ) -> Option<PcmSound> {
        let file = OpenFile::open(platform, path)?;
        let size = usize::try_from(file.size()?).ok()?;

        let mut data = vec![0i16; size / 2].into_boxed_slice();
        let read = file.read_to_fill(bytemuck::cast_slice_mut(&mut data[..]))?;
        debug!("Read {read} bytes of {channels}-channel PCM from {path}.");

        Some(PcmSound::new(data, channels, sample_rate, looping))
    }

    /// The sample rate the sound was recorded at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 1 for mono, 2 for interleaved stereo.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The amount of individual samples, counting each channel separately.
    pub fn samples(&self) -> usize {
        self.data.len()
    }

    /// The amount of sample frames, i.e. the length in samples of one
    /// channel.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels as usize
    }

    /// The raw samples. Stereo sounds are interleaved left, right.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// If true, the sound restarts from the beginning after it ends.
    pub fn is_looping(&self) -> bool {
        self.looping
    }
}
