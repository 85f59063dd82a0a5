//! Rodio-backed [`AudioMixer`]
//!
//! Each playback gets its own `Sink` fed from the sound's decoded samples.
//! Finished sinks are dropped the next time a sound is started.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use lumen_core::{AudioMixer, PlaybackId, Sound};

/// Playback cursor over a sound's shared sample buffer
struct SharedSamples {
    samples: Arc<[f32]>,
    position: usize,
    channels: u16,
    sample_rate: u32,
}

impl SharedSamples {
    fn new(sound: &Sound) -> Self {
        Self {
            samples: Arc::clone(sound.samples()),
            position: 0,
            channels: sound.channels(),
            sample_rate: sound.sample_rate(),
        }
    }
}

impl Iterator for SharedSamples {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.samples.get(self.position).copied()?;
        self.position += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.samples.len() - self.position;
        (left, Some(left))
    }
}

impl Source for SharedSamples {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples.len() - self.position)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let frames = self.samples.len() as f64 / self.channels as f64;
        Some(Duration::from_secs_f64(frames / self.sample_rate as f64))
    }
}

pub struct RodioMixer {
    /// Output stream (must be kept alive)
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: HashMap<PlaybackId, Sink>,
    next_id: u64,
    volume: f32,
}

impl RodioMixer {
    /// Open the default output device
    pub fn open(volume: f32) -> Result<Self, rodio::StreamError> {
        let (stream, handle) = OutputStream::try_default()?;
        log::info!("Audio output opened");
        Ok(Self {
            _stream: stream,
            handle,
            sinks: HashMap::new(),
            next_id: 0,
            volume: volume.clamp(0.0, 1.0),
        })
    }

    fn next_id(&mut self) -> PlaybackId {
        self.next_id = self.next_id.wrapping_add(1);
        PlaybackId(self.next_id)
    }

    /// Drop sinks that have played to the end
    fn reap_finished(&mut self) {
        self.sinks.retain(|_, sink| !sink.empty());
    }
}

impl AudioMixer for RodioMixer {
    fn play(&mut self, sound: &Sound) -> PlaybackId {
        self.reap_finished();
        let id = self.next_id();

        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("Failed to create audio sink: {}", e);
                return id;
            }
        };
        let source = SharedSamples::new(sound);
        if sound.is_looping() {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        sink.set_volume(self.volume);

        self.sinks.insert(id, sink);
        id
    }

    fn stop(&mut self, playback: PlaybackId) {
        if let Some(sink) = self.sinks.remove(&playback) {
            sink.stop();
        }
    }

    fn stop_all(&mut self) {
        for (_, sink) in self.sinks.drain() {
            sink.stop();
        }
    }

    fn active(&self) -> usize {
        self.sinks.values().filter(|sink| !sink.empty()).count()
    }
}
