//! Synthesis dispatch: turn a validated request into one PCM buffer.
//!
//! Plain mode speaks the whole input with a single voice. Extended mode
//! resolves every referenced voice up front, segments the input by
//! culture, then drives the backend session once per segment in input
//! order, concatenating as it goes. Nothing partial ever escapes: any
//! failure discards the buffer and aborts the request.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::backend::SynthesisSession;
use crate::classify::{CompiledBindings, ExtendedVoiceSpec};
use crate::error::ApiError;
use crate::segment::segment;
use crate::voice::VoiceDirectory;

/// Speak the full input with one voice.
pub async fn speak(
    session: &mut dyn SynthesisSession,
    directory: &VoiceDirectory,
    input: &str,
    voice_id: &str,
) -> Result<Vec<i16>, ApiError> {
    let voice = directory
        .resolve(voice_id)
        .ok_or_else(|| ApiError::VoiceNotFound(voice_id.to_string()))?;

    session
        .synthesize(&voice.id, input)
        .await
        .map_err(|e| ApiError::Synthesis(e.to_string()))
}

/// Speak the input with per-culture voice routing.
pub async fn speak_extended(
    session: &mut dyn SynthesisSession,
    directory: &VoiceDirectory,
    input: &str,
    spec: &ExtendedVoiceSpec,
) -> Result<Vec<i16>, ApiError> {
    // First binding for a culture wins, both for matching and for the
    // voice that speaks it.
    let mut voice_by_culture: HashMap<&str, &str> = HashMap::new();
    for binding in &spec.bindings {
        voice_by_culture
            .entry(binding.culture.as_str())
            .or_insert(binding.voice.as_str());
    }

    // Every voice a segment could route to must resolve before any
    // synthesis happens.
    for binding in &spec.bindings {
        if directory.resolve(&binding.voice).is_none() {
            return Err(ApiError::VoiceNotFound(binding.voice.clone()));
        }
    }
    if !spec.bindings.is_empty() && !voice_by_culture.contains_key(spec.default_culture.as_str()) {
        return Err(ApiError::CultureUnbound(spec.default_culture.clone()));
    }

    let bindings = CompiledBindings::compile(&spec.bindings)?;
    let segments = segment(input, &bindings, &spec.default_culture);
    debug!("Segmented input into {} runs", segments.len());

    let mut pcm: Vec<i16> = Vec::new();
    for seg in &segments {
        let voice_id = voice_by_culture
            .get(seg.culture.as_str())
            .ok_or_else(|| ApiError::CultureUnbound(seg.culture.clone()))?;

        let chunk = session
            .synthesize(voice_id, &seg.text)
            .await
            .map_err(|e| ApiError::Synthesis(e.to_string()))?;
        pcm.extend_from_slice(&chunk);
    }

    info!(
        "Synthesized {} segments, {} samples total",
        segments.len(),
        pcm.len()
    );
    Ok(pcm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SynthesisBackend;
    use crate::classify::CultureBinding;
    use crate::testing::{fake_pcm, FakeBackend};
    use crate::voice::Voice;

    fn voice(id: &str) -> Voice {
        Voice {
            id: id.into(),
            enabled: true,
            name: id.into(),
            gender: "Female".into(),
            age: "Adult".into(),
        }
    }

    fn binding(culture: &str, trigger: &str, voice: &str) -> CultureBinding {
        CultureBinding {
            voice: voice.into(),
            culture: culture.into(),
            trigger_regexp: trigger.into(),
        }
    }

    fn spec(bindings: Vec<CultureBinding>, default_culture: &str) -> ExtendedVoiceSpec {
        ExtendedVoiceSpec {
            bindings,
            default_culture: default_culture.into(),
        }
    }

    #[tokio::test]
    async fn plain_mode_speaks_full_input_once() {
        let backend = FakeBackend::new(vec![voice("V1")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let pcm = speak(session.as_mut(), &directory, "Hello", "V1")
            .await
            .unwrap();

        assert_eq!(pcm, fake_pcm("V1", "Hello"));
        assert_eq!(backend.calls(), vec![("V1".into(), "Hello".into())]);
    }

    #[tokio::test]
    async fn plain_mode_unknown_voice_never_reaches_backend() {
        let backend = FakeBackend::new(vec![voice("V1")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let err = speak(session.as_mut(), &directory, "Hello", "Ghost")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::VoiceNotFound(ref v) if v == "Ghost"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn extended_mode_routes_segments_in_order() {
        let backend = FakeBackend::new(vec![voice("V1"), voice("V2")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let spec = spec(
            vec![
                binding("en", "[A-Za-z]", "V1"),
                binding("zh", r"\p{Han}", "V2"),
            ],
            "en",
        );

        let pcm = speak_extended(session.as_mut(), &directory, "Hi你好", &spec)
            .await
            .unwrap();

        // Backend is called per segment, in input order, and the output
        // buffer is the concatenation of the per-segment chunks.
        assert_eq!(
            backend.calls(),
            vec![("V1".into(), "Hi".into()), ("V2".into(), "你好".into())]
        );
        let mut expected = fake_pcm("V1", "Hi");
        expected.extend(fake_pcm("V2", "你好"));
        assert_eq!(pcm, expected);
    }

    #[tokio::test]
    async fn extended_mode_fails_fast_on_missing_voice() {
        let backend = FakeBackend::new(vec![voice("V1")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let spec = spec(
            vec![
                binding("en", "[A-Za-z]", "V1"),
                binding("zh", r"\p{Han}", "Ghost"),
            ],
            "en",
        );

        let err = speak_extended(session.as_mut(), &directory, "Hi你好", &spec)
            .await
            .unwrap_err();

        // Even though the first segment's voice exists, nothing is spoken.
        assert!(matches!(err, ApiError::VoiceNotFound(ref v) if v == "Ghost"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn extended_mode_requires_default_culture_binding() {
        let backend = FakeBackend::new(vec![voice("V1")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let spec = spec(vec![binding("zh", r"\p{Han}", "V1")], "en");
        let err = speak_extended(session.as_mut(), &directory, "Hi", &spec)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::CultureUnbound(ref c) if c == "en"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn extended_mode_without_bindings_speaks_nothing_for_empty_input() {
        let backend = FakeBackend::new(vec![voice("V1")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let spec = spec(vec![], "en");
        let pcm = speak_extended(session.as_mut(), &directory, "", &spec)
            .await
            .unwrap();

        assert!(pcm.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn segment_failure_discards_partial_audio() {
        let backend =
            FakeBackend::new(vec![voice("V1"), voice("V2")]).failing_on("V2");
        let directory = VoiceDirectory::load(&backend).await.unwrap();
        let mut session = backend.open_session();

        let spec = spec(
            vec![
                binding("en", "[A-Za-z]", "V1"),
                binding("zh", r"\p{Han}", "V2"),
            ],
            "en",
        );

        let err = speak_extended(session.as_mut(), &directory, "Hi你好", &spec)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Synthesis(_)));
        // The first segment was attempted, but its audio never escapes.
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn voice_reassignment_does_not_reorder_audio() {
        let backend = FakeBackend::new(vec![voice("V1"), voice("V2")]);
        let directory = VoiceDirectory::load(&backend).await.unwrap();

        // Same triggers, swapped voices: segment order must be unchanged.
        let swapped = spec(
            vec![
                binding("en", "[A-Za-z]", "V2"),
                binding("zh", r"\p{Han}", "V1"),
            ],
            "en",
        );
        let mut session = backend.open_session();
        speak_extended(session.as_mut(), &directory, "Hi你好", &swapped)
            .await
            .unwrap();

        let texts: Vec<String> = backend.calls().into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["Hi".to_string(), "你好".to_string()]);
    }
}
