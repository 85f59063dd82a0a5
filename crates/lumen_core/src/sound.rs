//! Decoded audio clips and the mixer seam
//!
//! [`Sound`] decodes a whole file up front into interleaved `f32` samples so
//! playback never touches the disk. Output goes through an [`AudioMixer`];
//! the desktop platform provides a device-backed one and tests use
//! [`SilentMixer`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;

use crate::error::ResourceLoadError;
use crate::resource_cache::{Resource, ResourceId};

/// A decoded audio clip
#[derive(Clone, Debug)]
pub struct Sound {
    id: ResourceId,
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
    looping: bool,
}

impl Sound {
    /// Decode a WAV, OGG Vorbis, FLAC or MP3 file
    pub fn from_file(path: impl AsRef<Path>, looping: bool) -> Result<Self, ResourceLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ResourceLoadError::io(path, e))?;
        let decoder =
            rodio::Decoder::new(BufReader::new(file)).map_err(|e| ResourceLoadError::decode(path, e))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();
        Ok(Self::from_samples(samples, channels, sample_rate).with_looping(looping))
    }

    /// Wrap interleaved samples
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            id: ResourceId::next(),
            samples: samples.into(),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
            looping: false,
        }
    }

    /// Same samples with a different loop flag; the id is kept
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Length of one pass through the clip
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}

impl Resource for Sound {
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError> {
        Self::from_file(path, false)
    }
}

/// Handle to one playing instance of a sound
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

/// Audio output
pub trait AudioMixer {
    /// Start playing `sound`; looping sounds repeat until stopped
    fn play(&mut self, sound: &Sound) -> PlaybackId;

    /// Stop one playing instance. Unknown or finished ids are ignored.
    fn stop(&mut self, playback: PlaybackId);

    fn stop_all(&mut self);

    /// Number of instances still producing sound
    fn active(&self) -> usize;
}

/// A mixer that plays nothing and remembers what it was asked to play
#[derive(Debug, Default)]
pub struct SilentMixer {
    next: u64,
    playing: Vec<(PlaybackId, ResourceId)>,
    history: Vec<ResourceId>,
}

impl SilentMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sound passed to `play`, in order
    pub fn history(&self) -> &[ResourceId] {
        &self.history
    }
}

impl AudioMixer for SilentMixer {
    fn play(&mut self, sound: &Sound) -> PlaybackId {
        self.next += 1;
        let id = PlaybackId(self.next);
        self.history.push(sound.id());
        if sound.is_looping() {
            self.playing.push((id, sound.id()));
        }
        id
    }

    fn stop(&mut self, playback: PlaybackId) {
        self.playing.retain(|(id, _)| *id != playback);
    }

    fn stop_all(&mut self) {
        self.playing.clear();
    }

    fn active(&self) -> usize {
        self.playing.len()
    }
}
