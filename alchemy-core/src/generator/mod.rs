//! Element generators.
//!
//! A generator proposes a result for combining two named elements. It has no
//! memory of past outputs, may be slow, and may return a name that already
//! exists. The resolver treats it as a black box behind [`ElementGenerator`].

mod anthropic;

pub use anthropic::ClaudeGenerator;

use crate::element::Candidate;
use crate::error::GeneratorError;
use async_trait::async_trait;

/// Core trait for element generators
#[async_trait]
pub trait ElementGenerator: Send + Sync {
    /// Propose a result for combining two elements, by name.
    async fn generate(&self, name_a: &str, name_b: &str) -> Result<Candidate, GeneratorError>;

    /// Generator name for logs
    fn name(&self) -> &str;
}

/// Extract a candidate from free-form model output.
///
/// Takes the first `{` through the last `}` so prose or code fences around the
/// JSON object are tolerated. The name is trimmed and must not be empty.
pub fn parse_candidate(text: &str) -> Result<Candidate, GeneratorError> {
    let start = text
        .find('{')
        .ok_or_else(|| GeneratorError::Parse(format!("no JSON object in reply: {text:?}")))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| GeneratorError::Parse(format!("unterminated JSON object: {text:?}")))?;

    let candidate: Candidate = serde_json::from_str(&text[start..=end])
        .map_err(|e| GeneratorError::Parse(e.to_string()))?;

    let name = candidate.name.trim();
    if name.is_empty() {
        return Err(GeneratorError::Parse("empty element name".to_string()));
    }
    Ok(Candidate::new(name, candidate.glyph.trim()))
}
