//! Segmentation engine: split input text into maximal culture-tagged runs.

use crate::classify::CompiledBindings;

/// A maximal run of input text attributed to one culture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub culture: String,
    pub text: String,
}

/// Scan `input` character by character and produce culture-tagged runs.
///
/// The current culture starts at `default_culture`. A character whose
/// classification differs from the current culture flushes the
/// accumulated run and switches; unmatched characters stick to whatever
/// culture is current and never force a switch. Concatenating the
/// returned texts in order reproduces `input` exactly.
pub fn segment(input: &str, bindings: &CompiledBindings, default_culture: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current_culture = default_culture;
    let mut run = String::new();

    for ch in input.chars() {
        if let Some(culture) = bindings.classify(ch) {
            if culture != current_culture {
                if !run.is_empty() {
                    segments.push(Segment {
                        culture: current_culture.to_string(),
                        text: std::mem::take(&mut run),
                    });
                }
                current_culture = culture;
            }
        }
        run.push(ch);
    }

    if !run.is_empty() {
        segments.push(Segment {
            culture: current_culture.to_string(),
            text: run,
        });
    }

    segments
}
