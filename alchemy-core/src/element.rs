//! Elements, recipes and the values that flow between the engines.

use crate::id::ElementId;
use crate::pair::PairKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four immutable primitives every game starts from: (id, name, glyph).
pub const BASE_ELEMENTS: [(i64, &str, &str); 4] = [
    (1, "Water", "💧"),
    (2, "Fire", "🔥"),
    (3, "Earth", "🌍"),
    (4, "Air", "💨"),
];

/// Ids of the base elements, in seed order.
pub fn base_element_ids() -> Vec<ElementId> {
    BASE_ELEMENTS.iter().map(|(id, _, _)| ElementId(*id)).collect()
}

/// A named, glyph-tagged entity in the combination space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Store-assigned handle.
    pub id: ElementId,
    /// Unique name; the true identity of an element.
    pub name: String,
    /// Display glyph (usually a single emoji).
    pub glyph: String,
    /// Whether this is one of the seeded primitives.
    pub is_base: bool,
    /// When the element was first stored.
    pub created_at: DateTime<Utc>,
    /// Names of the two inputs that first produced this element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_by: Option<(String, String)>,
}

impl Element {
    /// Build the seeded base elements.
    pub fn base_set() -> Vec<Element> {
        let now = Utc::now();
        BASE_ELEMENTS
            .iter()
            .map(|(id, name, glyph)| Element {
                id: ElementId(*id),
                name: (*name).to_string(),
                glyph: (*glyph).to_string(),
                is_base: true,
                created_at: now,
                discovered_by: None,
            })
            .collect()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph, self.name)
    }
}

/// An element that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewElement {
    pub name: String,
    pub glyph: String,
    pub is_base: bool,
    pub discovered_by: Option<(String, String)>,
}

impl NewElement {
    /// A derived element produced by combining two named inputs.
    pub fn derived(
        name: impl Into<String>,
        glyph: impl Into<String>,
        inputs: (&str, &str),
    ) -> Self {
        Self {
            name: name.into(),
            glyph: glyph.into(),
            is_base: false,
            discovered_by: Some((inputs.0.to_string(), inputs.1.to_string())),
        }
    }
}

/// Immutable mapping from an unordered input pair to a result element.
///
/// `input_low <= input_high` always holds; construct through [`Recipe::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipe {
    pub input_low: ElementId,
    pub input_high: ElementId,
    pub result: ElementId,
}

impl Recipe {
    /// Create a recipe from a normalized pair.
    pub fn new(pair: PairKey, result: ElementId) -> Self {
        Self {
            input_low: pair.low(),
            input_high: pair.high(),
            result,
        }
    }

    /// The canonical pair this recipe is keyed by.
    pub fn pair(&self) -> PairKey {
        PairKey::from_ordered(self.input_low, self.input_high)
    }
}

/// A candidate returned by an element generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Proposed element name.
    #[serde(alias = "result")]
    pub name: String,
    /// Proposed glyph.
    #[serde(alias = "emoji")]
    pub glyph: String,
}

impl Candidate {
    /// Create a new candidate.
    pub fn new(name: impl Into<String>, glyph: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glyph: glyph.into(),
        }
    }
}

/// One recipe application presented to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationStep {
    pub element_a: Element,
    pub element_b: Element,
    pub result: Element,
}

impl CombinationStep {
    /// Ids as `(a, b, result)`, handy for comparisons.
    pub fn ids(&self) -> (ElementId, ElementId, ElementId) {
        (self.element_a.id, self.element_b.id, self.result.id)
    }
}

impl fmt::Display for CombinationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} = {}", self.element_a, self.element_b, self.result)
    }
}
