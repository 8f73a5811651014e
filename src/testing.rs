//! Scripted synthesis backend for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backend::{BackendError, SynthesisBackend, SynthesisSession};
use crate::voice::Voice;

/// Deterministic stand-in PCM for one synthesis call: the voice id's
/// bytes, a zero marker, then one sample per input character. Distinct
/// per (voice, text) pair so concatenation order is observable.
pub fn fake_pcm(voice_id: &str, text: &str) -> Vec<i16> {
    let mut pcm: Vec<i16> = voice_id.bytes().map(i16::from).collect();
    pcm.push(0);
    pcm.extend(text.chars().map(|c| (c as u32 % 1000) as i16));
    pcm
}

/// In-memory backend that serves a fixed voice list and records every
/// synthesis call.
pub struct FakeBackend {
    voices: Vec<Voice>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    fail_voice: Option<String>,
}

impl FakeBackend {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_voice: None,
        }
    }

    /// Make synthesis fail whenever this voice is used.
    pub fn failing_on(mut self, voice_id: &str) -> Self {
        self.fail_voice = Some(voice_id.to_string());
        self
    }

    /// Every (voice, text) synthesis call so far, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisBackend for FakeBackend {
    async fn list_voices(&self) -> Result<Vec<Voice>, BackendError> {
        Ok(self.voices.clone())
    }

    fn open_session(&self) -> Box<dyn SynthesisSession> {
        Box::new(FakeSession {
            calls: self.calls.clone(),
            fail_voice: self.fail_voice.clone(),
        })
    }
}

struct FakeSession {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    fail_voice: Option<String>,
}

#[async_trait]
impl SynthesisSession for FakeSession {
    async fn synthesize(&mut self, voice_id: &str, text: &str) -> Result<Vec<i16>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((voice_id.to_string(), text.to_string()));

        if self.fail_voice.as_deref() == Some(voice_id) {
            return Err(BackendError::NotConfigured);
        }
        Ok(fake_pcm(voice_id, text))
    }
}
