//! In-memory store.

use super::{ElementInsert, ElementStore, RecipeInsert};
use crate::element::{Element, NewElement, Recipe};
use crate::error::StoreError;
use crate::id::ElementId;
use crate::pair::PairKey;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Element and recipe tables with a name index.
///
/// Shared by every backend; persistence layers wrap this and snapshot it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    elements: BTreeMap<ElementId, Element>,
    /// Exact name to id.
    name_index: HashMap<String, ElementId>,
    recipes: BTreeMap<PairKey, ElementId>,
    next_id: i64,
}

impl Tables {
    /// Tables holding only the base elements.
    pub(crate) fn seeded() -> Self {
        let mut tables = Self {
            next_id: 1,
            ..Self::default()
        };
        for element in Element::base_set() {
            tables.restore_element(element);
        }
        tables
    }

    /// Rebuild tables from persisted rows, checking uniqueness constraints.
    pub(crate) fn from_rows(elements: Vec<Element>, recipes: Vec<Recipe>) -> Result<Self, StoreError> {
        let mut tables = Self {
            next_id: 1,
            ..Self::default()
        };
        for element in elements {
            if tables.name_index.contains_key(&element.name) {
                return Err(StoreError::Corrupt {
                    reason: format!("duplicate element name '{}'", element.name),
                });
            }
            if tables.elements.contains_key(&element.id) {
                return Err(StoreError::Corrupt {
                    reason: format!("duplicate element id {}", element.id),
                });
            }
            if !element.id.is_valid() || element.id.get().checked_add(1).is_none() {
                return Err(StoreError::Corrupt {
                    reason: format!("element id {} out of range", element.id),
                });
            }
            tables.restore_element(element);
        }
        for recipe in recipes {
            let pair = recipe.pair();
            if tables.recipes.insert(pair, recipe.result).is_some() {
                return Err(StoreError::Corrupt {
                    reason: format!("duplicate recipe for pair {pair}"),
                });
            }
        }
        Ok(tables)
    }

    /// Ids passed here are known to have a successor.
    fn restore_element(&mut self, element: Element) {
        self.next_id = self.next_id.max(element.id.get().saturating_add(1));
        self.name_index.insert(element.name.clone(), element.id);
        self.elements.insert(element.id, element);
    }

    pub(crate) fn get_element(&self, id: ElementId) -> Option<Element> {
        self.elements.get(&id).cloned()
    }

    pub(crate) fn get_element_by_name(&self, name: &str) -> Option<Element> {
        self.name_index
            .get(name)
            .and_then(|id| self.elements.get(id))
            .cloned()
    }

    pub(crate) fn elements(&self) -> Vec<Element> {
        self.elements.values().cloned().collect()
    }

    pub(crate) fn insert_element(&mut self, new: NewElement) -> Result<ElementInsert, StoreError> {
        if let Some(existing) = self.get_element_by_name(&new.name) {
            return Ok(ElementInsert::Existing(existing));
        }
        if self.next_id.checked_add(1).is_none() {
            return Err(StoreError::Unavailable {
                reason: "element id space exhausted".to_string(),
            });
        }

        let element = Element {
            id: ElementId(self.next_id),
            name: new.name,
            glyph: new.glyph,
            is_base: new.is_base,
            created_at: Utc::now(),
            discovered_by: new.discovered_by,
        };
        self.restore_element(element.clone());
        Ok(ElementInsert::Created(element))
    }

    pub(crate) fn get_recipe(&self, pair: PairKey) -> Option<Recipe> {
        self.recipes.get(&pair).map(|result| Recipe::new(pair, *result))
    }

    pub(crate) fn insert_recipe(&mut self, pair: PairKey, result: ElementId) -> RecipeInsert {
        match self.get_recipe(pair) {
            Some(existing) => RecipeInsert::AlreadyExists(existing),
            None => {
                self.recipes.insert(pair, result);
                RecipeInsert::Inserted(Recipe::new(pair, result))
            }
        }
    }

    pub(crate) fn recipes(&self) -> Vec<Recipe> {
        self.recipes
            .iter()
            .map(|(pair, result)| Recipe::new(*pair, *result))
            .collect()
    }

    pub(crate) fn recipes_by_result(&self, result: ElementId) -> Vec<Recipe> {
        self.recipes
            .iter()
            .filter(|(_, r)| **r == result)
            .map(|(pair, r)| Recipe::new(*pair, *r))
            .collect()
    }
}

/// Process-local store. Everything is lost when the process exits.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a store seeded with the base elements.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::seeded()),
        }
    }

    /// Create a store pre-populated with rows (base elements are not added).
    pub fn with_rows(elements: Vec<Element>, recipes: Vec<Recipe>) -> Result<Self, StoreError> {
        Ok(Self {
            tables: RwLock::new(Tables::from_rows(elements, recipes)?),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ElementStore for MemoryStore {
    async fn get_element(&self, id: ElementId) -> Result<Option<Element>, StoreError> {
        Ok(self.tables.read().await.get_element(id))
    }

    async fn get_element_by_name(&self, name: &str) -> Result<Option<Element>, StoreError> {
        Ok(self.tables.read().await.get_element_by_name(name))
    }

    async fn list_elements(&self) -> Result<Vec<Element>, StoreError> {
        Ok(self.tables.read().await.elements())
    }

    async fn insert_element(&self, element: NewElement) -> Result<ElementInsert, StoreError> {
        self.tables.write().await.insert_element(element)
    }

    async fn get_recipe(&self, pair: PairKey) -> Result<Option<Recipe>, StoreError> {
        Ok(self.tables.read().await.get_recipe(pair))
    }

    async fn insert_recipe(
        &self,
        pair: PairKey,
        result: ElementId,
    ) -> Result<RecipeInsert, StoreError> {
        Ok(self.tables.write().await.insert_recipe(pair, result))
    }

    async fn list_recipes_by_result(&self, result: ElementId) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.tables.read().await.recipes_by_result(result))
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.tables.read().await.recipes())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: i64, b: i64) -> PairKey {
        PairKey::from_ordered(ElementId(a), ElementId(b))
    }

    #[tokio::test]
    async fn test_seeded_with_base_elements() {
        let store = MemoryStore::new();
        let elements = store.list_elements().await.unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(
            store.get_element_by_name("Fire").await.unwrap().map(|e| e.id),
            Some(ElementId(2))
        );
        assert!(!store.is_durable());
    }

    #[tokio::test]
    async fn test_insert_element_assigns_next_id() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_element(NewElement::derived("Steam", "♨️", ("Water", "Fire")))
            .await
            .unwrap();
        assert!(inserted.was_created());
        assert_eq!(inserted.element().id, ElementId(5));
        assert_eq!(
            inserted.element().discovered_by,
            Some(("Water".to_string(), "Fire".to_string()))
        );
    }

    #[tokio::test]
    async fn test_insert_element_dedups_by_name() {
        let store = MemoryStore::new();
        let first = store
            .insert_element(NewElement::derived("Steam", "♨️", ("Water", "Fire")))
            .await
            .unwrap();
        let second = store
            .insert_element(NewElement::derived("Steam", "🌫️", ("Air", "Water")))
            .await
            .unwrap();

        assert!(!second.was_created());
        assert_eq!(second.element().id, first.element().id);
        assert_eq!(second.element().glyph, "♨️");
        assert_eq!(store.list_elements().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_insert_recipe_is_insert_if_absent() {
        let store = MemoryStore::new();
        let first = store.insert_recipe(pair(2, 1), ElementId(3)).await.unwrap();
        assert_eq!(first, RecipeInsert::Inserted(Recipe::new(pair(1, 2), ElementId(3))));

        let second = store.insert_recipe(pair(1, 2), ElementId(4)).await.unwrap();
        assert_eq!(
            second,
            RecipeInsert::AlreadyExists(Recipe::new(pair(1, 2), ElementId(3)))
        );
        assert_eq!(store.list_recipes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recipes_by_result() {
        let store = MemoryStore::new();
        store.insert_recipe(pair(1, 2), ElementId(4)).await.unwrap();
        store.insert_recipe(pair(3, 3), ElementId(4)).await.unwrap();
        store.insert_recipe(pair(1, 3), ElementId(2)).await.unwrap();

        let recipes = store.list_recipes_by_result(ElementId(4)).await.unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].pair(), pair(1, 2));
        assert_eq!(recipes[1].pair(), pair(3, 3));
    }

    #[test]
    fn test_from_rows_rejects_duplicate_names() {
        let mut elements = Element::base_set();
        let mut dup = elements[0].clone();
        dup.id = ElementId(9);
        elements.push(dup);
        assert!(matches!(
            Tables::from_rows(elements, Vec::new()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_from_rows_continues_id_sequence() {
        let mut elements = Element::base_set();
        let mut extra = elements[0].clone();
        extra.id = ElementId(11);
        extra.name = "Mud".to_string();
        extra.is_base = false;
        elements.push(extra);

        let mut tables = Tables::from_rows(elements, Vec::new()).unwrap();
        let inserted = tables
            .insert_element(NewElement::derived("Lava", "🌋", ("Earth", "Fire")))
            .unwrap();
        assert_eq!(inserted.element().id, ElementId(12));
    }

    #[test]
    fn test_from_rows_rejects_ids_without_successor() {
        let mut elements = Element::base_set();
        let mut last = elements[0].clone();
        last.id = ElementId(i64::MAX);
        last.name = "Omega".to_string();
        elements.push(last);
        assert!(matches!(
            Tables::from_rows(elements, Vec::new()),
            Err(StoreError::Corrupt { .. })
        ));

        let mut elements = Element::base_set();
        elements[3].id = ElementId(0);
        assert!(matches!(
            Tables::from_rows(elements, Vec::new()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_insert_refuses_last_id() {
        let mut elements = Element::base_set();
        let mut high = elements[0].clone();
        high.id = ElementId(i64::MAX - 1);
        high.name = "Omega".to_string();
        elements.push(high);

        let mut tables = Tables::from_rows(elements, Vec::new()).unwrap();
        let err = tables
            .insert_element(NewElement::derived("Alpha", "🅰️", ("Water", "Air")))
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(tables.get_element_by_name("Alpha").is_none());
    }
}
