//! Element and recipe storage.
//!
//! The store is the single source of truth. It is a trait so the backend is
//! picked once at construction time:
//! - [`MemoryStore`]: process-local, lost on restart
//! - [`JsonFileStore`]: durable, snapshot-on-write JSON file
//!
//! Two constraints every backend must uphold:
//! - element names are unique ([`ElementStore::insert_element`] is insert-if-absent)
//! - at most one recipe per pair ([`ElementStore::insert_recipe`] is atomic insert-if-absent)

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::element::{Element, NewElement, Recipe};
use crate::error::StoreError;
use crate::id::ElementId;
use crate::pair::PairKey;
use async_trait::async_trait;

/// Outcome of an insert-if-absent on element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementInsert {
    /// A new row was created.
    Created(Element),
    /// An element with that name already existed; nothing was written.
    Existing(Element),
}

impl ElementInsert {
    pub fn element(&self) -> &Element {
        match self {
            ElementInsert::Created(e) | ElementInsert::Existing(e) => e,
        }
    }

    pub fn into_element(self) -> Element {
        match self {
            ElementInsert::Created(e) | ElementInsert::Existing(e) => e,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, ElementInsert::Created(_))
    }
}

/// Outcome of an insert-if-absent on recipe pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeInsert {
    /// The recipe was committed.
    Inserted(Recipe),
    /// The pair already had a recipe; this is the one that won.
    AlreadyExists(Recipe),
}

impl RecipeInsert {
    /// The recipe now stored for the pair.
    pub fn recipe(&self) -> Recipe {
        match self {
            RecipeInsert::Inserted(r) | RecipeInsert::AlreadyExists(r) => *r,
        }
    }
}

/// Durable key-value storage of elements and recipes.
#[async_trait]
pub trait ElementStore: Send + Sync {
    /// Get an element by id
    async fn get_element(&self, id: ElementId) -> Result<Option<Element>, StoreError>;

    /// Get an element by exact name
    async fn get_element_by_name(&self, name: &str) -> Result<Option<Element>, StoreError>;

    /// List all elements, ordered by id
    async fn list_elements(&self) -> Result<Vec<Element>, StoreError>;

    /// Insert an element unless one with the same name exists
    async fn insert_element(&self, element: NewElement) -> Result<ElementInsert, StoreError>;

    /// Get the recipe for a pair
    async fn get_recipe(&self, pair: PairKey) -> Result<Option<Recipe>, StoreError>;

    /// Insert a recipe unless the pair already has one
    async fn insert_recipe(&self, pair: PairKey, result: ElementId)
        -> Result<RecipeInsert, StoreError>;

    /// List recipes producing the given element, ordered by pair
    async fn list_recipes_by_result(&self, result: ElementId) -> Result<Vec<Recipe>, StoreError>;

    /// List every recipe, ordered by pair
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Whether writes survive a process restart
    fn is_durable(&self) -> bool;

    /// Backend name for logs
    fn name(&self) -> &str;
}
