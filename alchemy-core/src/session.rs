//! Alchemy - the primary public API.
//!
//! Wraps the store, the generator and the resolution engine behind one
//! handle. The store backend and generator are chosen once, at construction;
//! every call after that goes through the same instances.

use crate::config::{AlchemyConfig, StoreBackend};
use crate::element::{base_element_ids, CombinationStep, Element};
use crate::error::{AlchemyError, Result, StoreError};
use crate::generator::{ClaudeGenerator, ElementGenerator};
use crate::hint::{pick_direct_recipe, HintStart, RecipeGraph, RecipeHint};
use crate::id::ElementId;
use crate::resolve::{ResolveResult, Resolver};
use crate::store::{ElementStore, JsonFileStore, MemoryStore};
use std::collections::HashSet;
use std::sync::Arc;

/// A combination game backed by one store and one generator.
pub struct Alchemy {
    resolver: Resolver,
    hint_start: HintStart,
}

impl Alchemy {
    /// Build from configuration, using Claude as the generator.
    pub async fn new(config: AlchemyConfig) -> Result<Self> {
        let generator = ClaudeGenerator::from_config(&config.generator)
            .map_err(|e| AlchemyError::Config(e.to_string()))?;
        Self::with_generator(config, Arc::new(generator)).await
    }

    /// Build from configuration with a caller-supplied generator.
    pub async fn with_generator(
        config: AlchemyConfig,
        generator: Arc<dyn ElementGenerator>,
    ) -> Result<Self> {
        let store = open_store(&config.store).await?;
        Ok(Self::from_parts(store, generator).with_hint_start(config.hint_start))
    }

    /// Build from an existing store and generator.
    pub fn from_parts(store: Arc<dyn ElementStore>, generator: Arc<dyn ElementGenerator>) -> Self {
        tracing::debug!(
            store = store.name(),
            generator = generator.name(),
            durable = store.is_durable(),
            "alchemy ready"
        );
        Self {
            resolver: Resolver::new(store, generator),
            hint_start: HintStart::default(),
        }
    }

    /// Set where hint searches start.
    pub fn with_hint_start(mut self, hint_start: HintStart) -> Self {
        self.hint_start = hint_start;
        self
    }

    fn store(&self) -> &Arc<dyn ElementStore> {
        self.resolver.store()
    }

    /// Whether resolutions survive a restart.
    pub fn is_durable(&self) -> bool {
        self.store().is_durable()
    }

    /// Combine two elements.
    pub async fn combine(&self, a: ElementId, b: ElementId) -> Result<ResolveResult> {
        self.resolver.resolve(a, b).await
    }

    /// Every known element, base elements first, then by id.
    pub async fn elements(&self) -> Result<Vec<Element>> {
        let mut elements = self.store().list_elements().await?;
        elements.sort_by_key(|e| (!e.is_base, e.id));
        Ok(elements)
    }

    /// Look up one element.
    pub async fn element(&self, id: ElementId) -> Result<Element> {
        require_valid(id)?;
        self.store()
            .get_element(id)
            .await?
            .ok_or(AlchemyError::UnknownElement(id))
    }

    /// Minimal ordered steps toward `target`.
    ///
    /// `Ok(Some(vec![]))` when already discovered, `Ok(None)` when unreachable.
    pub async fn shortest_path(
        &self,
        target: ElementId,
        discovered: &HashSet<ElementId>,
    ) -> Result<Option<Vec<CombinationStep>>> {
        require_valid(target)?;
        if discovered.contains(&target) {
            return Ok(Some(Vec::new()));
        }

        let graph = self.snapshot().await?;
        if graph.element(target).is_none() {
            return Err(AlchemyError::UnknownElement(target));
        }
        Ok(graph.shortest_path(target, discovered, &base_element_ids(), self.hint_start))
    }

    /// Only the next step toward `target`.
    pub async fn next_hint(
        &self,
        target: ElementId,
        discovered: &HashSet<ElementId>,
    ) -> Result<Option<CombinationStep>> {
        Ok(self
            .shortest_path(target, discovered)
            .await?
            .and_then(|path| path.into_iter().next()))
    }

    /// Hint from the recipes that directly produce `target`.
    pub async fn recipe_hint(
        &self,
        target: ElementId,
        discovered: &HashSet<ElementId>,
    ) -> Result<RecipeHint> {
        require_valid(target)?;
        if discovered.contains(&target) {
            return Ok(RecipeHint::AlreadyDiscovered);
        }
        self.element(target).await?;

        let recipes = self.store().list_recipes_by_result(target).await?;
        let Some((recipe, missing)) = pick_direct_recipe(&recipes, discovered) else {
            return Ok(RecipeHint::NoKnownRecipe);
        };

        if missing.is_empty() {
            return Ok(RecipeHint::Combine {
                element_a: self.element(recipe.input_low).await?,
                element_b: self.element(recipe.input_high).await?,
            });
        }

        let mut elements = Vec::with_capacity(missing.len());
        for id in missing {
            elements.push(self.element(id).await?);
        }
        Ok(RecipeHint::Missing { elements })
    }

    async fn snapshot(&self) -> Result<RecipeGraph> {
        let elements = self.store().list_elements().await?;
        let recipes = self.store().list_recipes().await?;
        Ok(RecipeGraph::new(elements, &recipes))
    }
}

fn require_valid(id: ElementId) -> Result<()> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(AlchemyError::InvalidInput {
            reason: format!("element id must be positive, got {id}"),
        })
    }
}

async fn open_store(backend: &StoreBackend) -> std::result::Result<Arc<dyn ElementStore>, StoreError> {
    Ok(match backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::JsonFile(path) => Arc::new(JsonFileStore::open(path).await?),
    })
}
