//! Hint and shortest-path engine.
//!
//! Finds the fewest recipe applications that lead from a start set of
//! elements to a target, by breadth-first search over the reachability
//! relation the known recipes induce.
//!
//! Each frontier node carries the element it just produced, the steps taken to
//! get there, and every element that path has made available so far. A global
//! visited set on element id stops an element from being expanded twice.
//! Because the search is level-order, the first path that produces the target
//! uses the minimum number of steps.
//!
//! A node only combines elements produced on its own path. A target whose only
//! recipe needs two intermediates from separate branches is therefore reported
//! unreachable.

use crate::element::{base_element_ids, CombinationStep, Element, Recipe};
use crate::id::ElementId;
use crate::pair::PairKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Where the search frontier starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintStart {
    /// Only the base elements, ignoring what the player has already found.
    /// Paths may re-derive elements the player owns.
    #[default]
    BaseElements,
    /// Base elements plus everything the player has discovered.
    Discovered,
}

/// A recipe step by id: (input a, input b, result).
type StepIds = (ElementId, ElementId, ElementId);

/// One BFS frontier node.
struct Node {
    produced: ElementId,
    path: Vec<StepIds>,
    available: BTreeSet<ElementId>,
}

/// Recipes indexed by pair, plus the elements they mention.
#[derive(Debug, Clone, Default)]
pub struct RecipeGraph {
    elements: HashMap<ElementId, Element>,
    by_pair: HashMap<PairKey, ElementId>,
}

impl RecipeGraph {
    /// Index a snapshot of elements and recipes.
    pub fn new(elements: impl IntoIterator<Item = Element>, recipes: &[Recipe]) -> Self {
        Self {
            elements: elements.into_iter().map(|e| (e.id, e)).collect(),
            by_pair: recipes.iter().map(|r| (r.pair(), r.result)).collect(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn recipe_count(&self) -> usize {
        self.by_pair.len()
    }

    /// Minimal ordered steps to reach `target`.
    ///
    /// - `Some(vec![])` when the target is already discovered or in the start set
    /// - `None` when no recipe chain reaches it
    pub fn shortest_path(
        &self,
        target: ElementId,
        discovered: &HashSet<ElementId>,
        base: &[ElementId],
        start: HintStart,
    ) -> Option<Vec<CombinationStep>> {
        if discovered.contains(&target) {
            return Some(Vec::new());
        }

        let mut start_set: BTreeSet<ElementId> = base.iter().copied().collect();
        if start == HintStart::Discovered {
            start_set.extend(discovered.iter().copied());
        }
        if start_set.contains(&target) {
            return Some(Vec::new());
        }

        let mut visited: HashSet<ElementId> = start_set.iter().copied().collect();
        let mut queue: VecDeque<Node> = start_set
            .iter()
            .map(|id| Node {
                produced: *id,
                path: Vec::new(),
                available: start_set.clone(),
            })
            .collect();

        while let Some(node) = queue.pop_front() {
            tracing::trace!(produced = %node.produced, depth = node.path.len(), "expanding");
            let available: Vec<ElementId> = node.available.iter().copied().collect();

            for (i, a) in available.iter().enumerate() {
                for b in &available[i..] {
                    let Some(result) = self.by_pair.get(&PairKey::from_ordered(*a, *b)).copied()
                    else {
                        continue;
                    };
                    if visited.contains(&result) || !self.knows_all(&[*a, *b, result]) {
                        continue;
                    }
                    visited.insert(result);

                    let mut path = node.path.clone();
                    path.push((*a, *b, result));

                    if result == target {
                        return Some(self.materialize(&path));
                    }

                    let mut next_available = node.available.clone();
                    next_available.insert(result);
                    queue.push_back(Node {
                        produced: result,
                        path,
                        available: next_available,
                    });
                }
            }
        }

        None
    }

    /// The first step of the shortest path, if there is one.
    pub fn next_hint(
        &self,
        target: ElementId,
        discovered: &HashSet<ElementId>,
        base: &[ElementId],
        start: HintStart,
    ) -> Option<CombinationStep> {
        self.shortest_path(target, discovered, base, start)?
            .into_iter()
            .next()
    }

    fn knows_all(&self, ids: &[ElementId]) -> bool {
        ids.iter().all(|id| self.elements.contains_key(id))
    }

    fn materialize(&self, path: &[StepIds]) -> Vec<CombinationStep> {
        path.iter()
            .filter_map(|(a, b, result)| {
                Some(CombinationStep {
                    element_a: self.elements.get(a)?.clone(),
                    element_b: self.elements.get(b)?.clone(),
                    result: self.elements.get(result)?.clone(),
                })
            })
            .collect()
    }
}

/// Shortest path from `base` to `target` over a snapshot of the store.
///
/// `elements` must cover every id the recipes mention; recipes touching an
/// unknown element are ignored.
pub fn shortest_path(
    target: ElementId,
    discovered: &HashSet<ElementId>,
    elements: &[Element],
    recipes: &[Recipe],
    base: &[ElementId],
) -> Option<Vec<CombinationStep>> {
    RecipeGraph::new(elements.iter().cloned(), recipes).shortest_path(
        target,
        discovered,
        base,
        HintStart::BaseElements,
    )
}

/// The next step toward `target`, starting from the four base elements.
pub fn next_hint(
    target: ElementId,
    discovered: &HashSet<ElementId>,
    elements: &[Element],
    recipes: &[Recipe],
) -> Option<CombinationStep> {
    RecipeGraph::new(elements.iter().cloned(), recipes).next_hint(
        target,
        discovered,
        &base_element_ids(),
        HintStart::BaseElements,
    )
}

/// Hint derived only from the recipes that directly produce a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeHint {
    /// The player already has the target.
    AlreadyDiscovered,
    /// No stored recipe produces the target.
    NoKnownRecipe,
    /// Both inputs are discovered: combine them.
    Combine { element_a: Element, element_b: Element },
    /// These inputs must be discovered first.
    Missing { elements: Vec<Element> },
}

/// Choose which recipe a direct hint is about.
///
/// Prefers the first recipe (in pair order) whose inputs are both discovered,
/// otherwise the first recipe. Returns the recipe and its undiscovered inputs.
pub(crate) fn pick_direct_recipe(
    recipes: &[Recipe],
    discovered: &HashSet<ElementId>,
) -> Option<(Recipe, Vec<ElementId>)> {
    let mut sorted = recipes.to_vec();
    sorted.sort_by_key(|r| r.pair());

    if let Some(ready) = sorted
        .iter()
        .find(|r| discovered.contains(&r.input_low) && discovered.contains(&r.input_high))
    {
        return Some((*ready, Vec::new()));
    }

    let first = *sorted.first()?;
    let mut missing: Vec<ElementId> = [first.input_low, first.input_high]
        .into_iter()
        .filter(|id| !discovered.contains(id))
        .collect();
    missing.dedup();
    Some((first, missing))
}
