//! Voice directory: the read-only view of backend voices used for
//! resolution and listing.

use crate::backend::{BackendError, SynthesisBackend};

/// Snapshot of one backend voice. Built explicitly when the directory is
/// loaded; nothing downstream ever consults backend locale state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub id: String,
    pub enabled: bool,
    pub name: String,
    pub gender: String,
    pub age: String,
}

impl Voice {
    /// Human-readable label used in the voice listing: `id/gender/age`.
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.id, self.gender, self.age)
    }
}

/// Request-scoped snapshot of the enabled voices, in backend order.
/// Disabled voices are invisible here, even when named explicitly.
pub struct VoiceDirectory {
    voices: Vec<Voice>,
}

impl VoiceDirectory {
    /// Query the backend and keep only enabled voices.
    pub async fn load(backend: &dyn SynthesisBackend) -> Result<Self, BackendError> {
        let voices = backend
            .list_voices()
            .await?
            .into_iter()
            .filter(|v| v.enabled)
            .collect();
        Ok(Self { voices })
    }

    pub fn list_enabled(&self) -> &[Voice] {
        &self.voices
    }

    /// Exact-id lookup among enabled voices.
    pub fn resolve(&self, voice_id: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == voice_id)
    }
}
