//! QA tests for shortest-path hints.
//!
//! Exercises the hint engine through both the pure functions and the
//! `Alchemy` handle over a seeded store.

use alchemy_core::{
    base_element_ids, next_hint, shortest_path, Alchemy, AlchemyError, Element, ElementId,
    HintStart, MemoryStore, PairKey, Recipe, ScriptedGenerator,
};
use chrono::Utc;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn derived(id: i64, name: &str) -> Element {
    Element {
        id: ElementId(id),
        name: name.to_string(),
        glyph: "✨".to_string(),
        is_base: false,
        created_at: Utc::now(),
        discovered_by: None,
    }
}

fn recipe(a: i64, b: i64, result: i64) -> Recipe {
    Recipe::new(PairKey::from_ordered(ElementId(a), ElementId(b)), ElementId(result))
}

fn ids(raw: &[i64]) -> HashSet<ElementId> {
    raw.iter().copied().map(ElementId).collect()
}

fn steps(path: &[alchemy_core::CombinationStep]) -> Vec<(i64, i64, i64)> {
    path.iter()
        .map(|s| {
            let (a, b, r) = s.ids();
            (a.get(), b.get(), r.get())
        })
        .collect()
}

/// Steam (5) from Water + Fire, Mud (6) from Steam + Earth.
fn steam_mud() -> (Vec<Element>, Vec<Recipe>) {
    let mut elements = Element::base_set();
    elements.push(derived(5, "Steam"));
    elements.push(derived(6, "Mud"));
    (elements, vec![recipe(1, 2, 5), recipe(5, 3, 6)])
}

fn alchemy_over(elements: Vec<Element>, recipes: Vec<Recipe>) -> Alchemy {
    let store = MemoryStore::with_rows(elements, recipes).expect("valid rows");
    Alchemy::from_parts(Arc::new(store), Arc::new(ScriptedGenerator::default()))
}

// ============================================================================
// Example scenarios
// ============================================================================

#[test]
fn test_two_step_path_in_order() {
    let (elements, recipes) = steam_mud();
    let path = shortest_path(
        ElementId(6),
        &ids(&[1, 2, 3, 4]),
        &elements,
        &recipes,
        &base_element_ids(),
    )
    .expect("mud is reachable");

    assert_eq!(steps(&path), vec![(1, 2, 5), (3, 5, 6)]);
    assert_eq!(path[0].result.name, "Steam");
    assert_eq!(path[1].result.name, "Mud");
}

#[tokio::test]
async fn test_hint_when_intermediate_known() {
    let (elements, recipes) = steam_mud();
    let discovered = ids(&[1, 2, 3, 4, 5]);

    // Default search restarts from the base elements.
    let alchemy = alchemy_over(elements.clone(), recipes.clone());
    let step = alchemy.next_hint(ElementId(6), &discovered).await.unwrap().unwrap();
    assert_eq!(step.ids(), (ElementId(1), ElementId(2), ElementId(5)));
    let path = alchemy.shortest_path(ElementId(6), &discovered).await.unwrap().unwrap();
    assert_eq!(path.len(), 2);

    // Starting from the discovered set skips the known intermediate.
    let alchemy = alchemy_over(elements, recipes).with_hint_start(HintStart::Discovered);
    let path = alchemy.shortest_path(ElementId(6), &discovered).await.unwrap().unwrap();
    assert_eq!(steps(&path), vec![(3, 5, 6)]);
}

#[tokio::test]
async fn test_unreachable_target_is_none() {
    let mut elements = Element::base_set();
    elements.push(derived(5, "Steam"));
    elements.push(derived(7, "Obsidian"));
    let alchemy = alchemy_over(elements, vec![recipe(1, 2, 5)]);

    let discovered = ids(&[1, 2, 3, 4]);
    assert!(alchemy.shortest_path(ElementId(7), &discovered).await.unwrap().is_none());
    assert!(alchemy.next_hint(ElementId(7), &discovered).await.unwrap().is_none());
}

// ============================================================================
// Edge cases
// ============================================================================

#[tokio::test]
async fn test_discovered_target_short_circuits_before_loading() {
    // A large graph should not matter when the target is already owned.
    let mut elements = Element::base_set();
    let mut recipes = Vec::new();
    let mut previous = 1;
    for id in 5..400 {
        elements.push(derived(id, &format!("Element {id}")));
        recipes.push(recipe(previous, 2, id));
        previous = id;
    }
    let alchemy = alchemy_over(elements, recipes);

    let path = alchemy.shortest_path(ElementId(399), &ids(&[399])).await.unwrap();
    assert_eq!(path, Some(Vec::new()));
    assert!(alchemy.next_hint(ElementId(399), &ids(&[399])).await.unwrap().is_none());
}

#[tokio::test]
async fn test_base_target_needs_no_steps() {
    let (elements, recipes) = steam_mud();
    let alchemy = alchemy_over(elements, recipes);
    let path = alchemy.shortest_path(ElementId(3), &ids(&[])).await.unwrap();
    assert_eq!(path, Some(Vec::new()));
}

#[tokio::test]
async fn test_invalid_and_unknown_targets() {
    let (elements, recipes) = steam_mud();
    let alchemy = alchemy_over(elements, recipes);

    let err = alchemy.shortest_path(ElementId(0), &ids(&[1])).await.unwrap_err();
    assert!(matches!(err, AlchemyError::InvalidInput { .. }));

    let err = alchemy.next_hint(ElementId(77), &ids(&[1])).await.unwrap_err();
    assert!(matches!(err, AlchemyError::UnknownElement(ElementId(77))));
}

#[test]
fn test_next_hint_free_function() {
    let (elements, recipes) = steam_mud();
    let step = next_hint(ElementId(6), &ids(&[1, 2, 3, 4]), &elements, &recipes).unwrap();
    assert_eq!(step.element_a.name, "Water");
    assert_eq!(step.element_b.name, "Fire");
    assert_eq!(step.result.name, "Steam");
}

// ============================================================================
// Properties
// ============================================================================

/// A chain of `len` derived elements, each made from the previous one and a
/// base element, plus a base-pair shortcut straight to chain element `jump`.
fn chain_with_shortcut(len: i64, jump: i64) -> (Vec<Element>, Vec<Recipe>) {
    let mut elements = Element::base_set();
    let mut recipes = vec![recipe(1, 2, 5)];
    elements.push(derived(5, "Link 5"));
    for id in 6..5 + len {
        elements.push(derived(id, &format!("Link {id}")));
        recipes.push(recipe(id - 1, 1 + id % 4, id));
    }
    recipes.push(recipe(3, 4, 4 + jump));
    (elements, recipes)
}

proptest! {
    #[test]
    fn prop_chain_path_is_minimal(len in 1i64..12, jump_seed in 0i64..12) {
        let jump = 1 + jump_seed % len;
        let (elements, recipes) = chain_with_shortcut(len, jump);
        let target = ElementId(4 + len);

        let path = shortest_path(
            target,
            &ids(&[1, 2, 3, 4]),
            &elements,
            &recipes,
            &base_element_ids(),
        )
        .expect("chain target is reachable");

        let expected = len.min(1 + len - jump) as usize;
        prop_assert_eq!(path.len(), expected);
        prop_assert_eq!(path.last().map(|s| s.result.id), Some(target));

        // Every step only uses base elements or results of earlier steps.
        let mut available: HashSet<ElementId> = base_element_ids().into_iter().collect();
        for step in &path {
            let (a, b, result) = step.ids();
            prop_assert!(available.contains(&a) && available.contains(&b));
            prop_assert!(recipes.iter().any(|r| r.pair() == PairKey::from_ordered(a, b) && r.result == result));
            available.insert(result);
        }
    }
}
