//! Synthesis backend collaborator interface.
//!
//! The engine never talks to a concrete synthesizer directly; it sees a
//! directory of voices plus per-request sessions that turn (voice, text)
//! into raw PCM. Sessions are created fresh for each request and driven
//! strictly sequentially, so a backend that keeps mutable per-stream state
//! is still safe under concurrent requests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::BackendConfig;
use crate::voice::Voice;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no synthesizer command configured")]
    NotConfigured,

    #[error("failed to run synthesizer: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("synthesizer exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Snapshot of every voice the backend knows about, enabled or not,
    /// in the backend's own order.
    async fn list_voices(&self) -> Result<Vec<Voice>, BackendError>;

    /// Open an independent session for one request.
    fn open_session(&self) -> Box<dyn SynthesisSession>;
}

#[async_trait]
pub trait SynthesisSession: Send {
    /// Synthesize `text` with the given voice, producing interleaved i16
    /// PCM at the process-wide audio contract.
    async fn synthesize(&mut self, voice_id: &str, text: &str) -> Result<Vec<i16>, BackendError>;
}

/// Backend that shells out to a configured synthesizer command.
///
/// Voices come from the config file; audio comes from running the command
/// once per synthesis call with the voice id and text appended to its
/// arguments, reading little-endian i16 PCM from stdout. One process per
/// call means sessions are independent by construction.
pub struct CommandBackend {
    config: BackendConfig,
}

impl CommandBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SynthesisBackend for CommandBackend {
    async fn list_voices(&self) -> Result<Vec<Voice>, BackendError> {
        Ok(self
            .config
            .voices
            .iter()
            .map(|v| Voice {
                id: v.id.clone(),
                enabled: v.enabled,
                name: if v.name.is_empty() { v.id.clone() } else { v.name.clone() },
                gender: v.gender.clone(),
                age: v.age.clone(),
            })
            .collect())
    }

    fn open_session(&self) -> Box<dyn SynthesisSession> {
        Box::new(CommandSession {
            config: self.config.clone(),
        })
    }
}

struct CommandSession {
    config: BackendConfig,
}

#[async_trait]
impl SynthesisSession for CommandSession {
    async fn synthesize(&mut self, voice_id: &str, text: &str) -> Result<Vec<i16>, BackendError> {
        if self.config.command.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        debug!(
            "Running synthesizer '{}' voice={voice_id} ({} chars)",
            self.config.command,
            text.len()
        );

        let output = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(voice_id)
            .arg(text)
            .output()
            .await?;

        if !output.status.success() {
            return Err(BackendError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(pcm_from_bytes(&output.stdout))
    }
}

/// Interpret raw bytes as little-endian i16 samples. A trailing odd byte
/// is dropped.
fn pcm_from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
