use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{config::AudioConfig, Result, StagehandError};

/// A registered sound. Decoding and output belong to the platform layer; the
/// manager only tracks which clip occupies which channel and for how long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    pub source: String,
    pub duration_ms: f64,
}

impl AudioClip {
    pub fn new(id: impl Into<String>, source: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopId(u64);

#[derive(Debug, Clone)]
struct ActiveSound {
    clip: String,
    ends_at: f64,
}

/// Keyed registry of clips plus a fixed pool of one-shot channels and a set
/// of looping sounds.
#[derive(Debug)]
pub struct AudioManager {
    clips: HashMap<String, AudioClip>,
    channels: Vec<Option<ActiveSound>>,
    loops: HashMap<LoopId, String>,
    next_loop: u64,
    enabled: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&AudioConfig::default())
    }
}

impl AudioManager {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            clips: HashMap::new(),
            channels: vec![None; config.channels],
            loops: HashMap::new(),
            next_loop: 0,
            enabled: config.enabled,
        }
    }

    pub fn add_audio(&mut self, clip: AudioClip) -> &mut Self {
        tracing::debug!(clip = %clip.id, source = %clip.source, "registered audio clip");
        self.clips.insert(clip.id.clone(), clip);
        self
    }

    pub fn get_audio(&self, id: &str) -> Result<&AudioClip> {
        self.clips
            .get(id)
            .ok_or_else(|| StagehandError::not_found("audio clip", id))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling stops everything that is currently playing.
    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        if !enabled {
            self.stop_all();
        }
        self
    }

    /// Starts a one-shot sound on the first free channel. Returns `None` when
    /// sound is disabled or every channel is busy.
    pub fn play(&mut self, id: &str, now: f64) -> Result<Option<ChannelId>> {
        let duration = self.get_audio(id)?.duration_ms;
        if !self.enabled {
            return Ok(None);
        }
        let Some(index) = self.channels.iter().position(Option::is_none) else {
            tracing::warn!(clip = id, "no free audio channel, dropping sound");
            return Ok(None);
        };
        self.channels[index] = Some(ActiveSound {
            clip: id.to_string(),
            ends_at: now + duration.max(0.0),
        });
        Ok(Some(ChannelId(index)))
    }

    /// Starts a looping sound that plays until stopped.
    pub fn loop_audio(&mut self, id: &str) -> Result<Option<LoopId>> {
        self.get_audio(id)?;
        if !self.enabled {
            return Ok(None);
        }
        self.next_loop += 1;
        let handle = LoopId(self.next_loop);
        self.loops.insert(handle, id.to_string());
        Ok(Some(handle))
    }

    pub fn stop_loop(&mut self, handle: LoopId) -> bool {
        self.loops.remove(&handle).is_some()
    }

    pub fn stop_all(&mut self) {
        self.channels.iter_mut().for_each(|channel| *channel = None);
        self.loops.clear();
    }

    /// Frees channels whose clip has finished by `now`.
    pub fn update(&mut self, now: f64) {
        for channel in &mut self.channels {
            if channel.as_ref().is_some_and(|sound| now >= sound.ends_at) {
                *channel = None;
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn active_channels(&self) -> usize {
        self.channels.iter().filter(|channel| channel.is_some()).count()
    }

    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.channels
            .iter()
            .flatten()
            .any(|sound| sound.clip == id)
            || self.loops.values().any(|clip| clip == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(channels: usize) -> AudioManager {
        let mut audio = AudioManager::new(&AudioConfig {
            channels,
            enabled: true,
        });
        audio.add_audio(AudioClip::new("pop", "sounds/pop.ogg", 100.0));
        audio
    }

    #[test]
    fn missing_clips_are_reported() {
        let mut audio = manager(2);
        assert!(matches!(
            audio.play("boom", 0.0),
            Err(StagehandError::ResourceNotFound { .. })
        ));
        assert!(audio.loop_audio("boom").is_err());
        assert!(audio.get_audio("boom").is_err());
    }

    #[test]
    fn channels_are_pooled_and_released() {
        let mut audio = manager(2);
        assert_eq!(audio.play("pop", 0.0).unwrap(), Some(ChannelId(0)));
        assert_eq!(audio.play("pop", 10.0).unwrap(), Some(ChannelId(1)));
        assert_eq!(audio.play("pop", 20.0).unwrap(), None);

        audio.update(100.0);
        assert_eq!(audio.active_channels(), 1);
        assert_eq!(audio.play("pop", 100.0).unwrap(), Some(ChannelId(0)));
        assert!(audio.is_playing("pop"));
    }

    #[test]
    fn loops_run_until_stopped() {
        let mut audio = manager(1);
        let handle = audio.loop_audio("pop").unwrap().unwrap();
        audio.update(1_000_000.0);
        assert_eq!(audio.active_loops(), 1);
        assert!(audio.stop_loop(handle));
        assert!(!audio.stop_loop(handle));
    }

    #[test]
    fn disabled_manager_stays_silent() {
        let mut audio = manager(1);
        audio.loop_audio("pop").unwrap();
        audio.set_enabled(false);
        assert_eq!(audio.active_loops(), 0);
        assert_eq!(audio.play("pop", 0.0).unwrap(), None);
        assert_eq!(audio.loop_audio("pop").unwrap(), None);
    }
}
