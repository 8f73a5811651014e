//! Per-character culture classification.
//!
//! A request in extended mode carries an ordered list of culture bindings,
//! each pairing a culture label with a trigger regex and a voice id. The
//! classifier tests one character at a time against the triggers; the
//! first matching binding wins. Rust's `regex` crate has no host-locale
//! state, so a character classifies identically regardless of process
//! environment.

use regex::Regex;
use serde::Deserialize;

use crate::error::ApiError;

/// One (culture, trigger, voice) binding as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CultureBinding {
    pub voice: String,
    pub culture: String,
    #[serde(rename = "triggerRegexp")]
    pub trigger_regexp: String,
}

/// Multi-culture routing configuration supplied in place of a single
/// voice identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedVoiceSpec {
    #[serde(rename = "voices")]
    pub bindings: Vec<CultureBinding>,
    #[serde(rename = "defaultCulture")]
    pub default_culture: String,
}

/// Bindings with their triggers compiled, in caller order.
///
/// Compilation happens once per request, before any synthesis work, so an
/// invalid pattern fails the request eagerly.
#[derive(Debug)]
pub struct CompiledBindings {
    entries: Vec<CompiledBinding>,
}

#[derive(Debug)]
struct CompiledBinding {
    culture: String,
    trigger: Regex,
}

impl CompiledBindings {
    pub fn compile(bindings: &[CultureBinding]) -> Result<Self, ApiError> {
        let mut entries = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let trigger = Regex::new(&binding.trigger_regexp).map_err(|source| {
                ApiError::BadTriggerPattern {
                    culture: binding.culture.clone(),
                    source,
                }
            })?;
            entries.push(CompiledBinding {
                culture: binding.culture.clone(),
                trigger,
            });
        }
        Ok(Self { entries })
    }

    /// Culture of the first binding whose trigger matches `ch` as a
    /// one-character string, or `None` when nothing matches.
    ///
    /// Classification operates on Unicode scalar values; combining marks
    /// are classified on their own, not as part of a grapheme cluster.
    pub fn classify(&self, ch: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        let s: &str = ch.encode_utf8(&mut buf);
        self.entries
            .iter()
            .find(|e| e.trigger.is_match(s))
            .map(|e| e.culture.as_str())
    }
}
