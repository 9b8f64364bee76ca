//! Combination resolution engine.
//!
//! Answers "what does A + B produce" through three tiers, each short-circuiting
//! on success:
//!
//! 1. **Cache**: the process-local [`ResultCache`]
//! 2. **Store**: a recipe already committed for the pair
//! 3. **Generation**: ask the [`ElementGenerator`], dedup the result by name,
//!    then commit the recipe with insert-if-absent
//!
//! At most one recipe is ever committed per pair. Inside one process,
//! concurrent calls for the same pair are serialized on a per-pair lock so the
//! generator runs once; across processes the store's insert-if-absent decides
//! the winner and losers adopt the winning recipe.

use crate::cache::ResultCache;
use crate::element::{Element, NewElement};
use crate::error::{AlchemyError, GeneratorError, Result, StoreError};
use crate::generator::ElementGenerator;
use crate::id::ElementId;
use crate::pair::{normalize, PairKey};
use crate::store::{ElementStore, RecipeInsert};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Which tier answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Cache,
    Store,
    Generated,
}

/// Outcome of combining two elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    /// The element the pair resolves to.
    pub element: Element,
    /// True only for the call that committed the pair's recipe.
    pub is_new_element: bool,
    /// True only for the call that created the element's name in the store.
    pub is_first_discovery: bool,
    /// Whether the recipe behind this result survives a restart.
    pub durable: bool,
    /// Which tier answered.
    pub source: ResolutionSource,
}

impl ResolveResult {
    fn replayed(element: Element, durable: bool, source: ResolutionSource) -> Self {
        Self {
            element,
            is_new_element: false,
            is_first_discovery: false,
            durable,
            source,
        }
    }
}

/// Per-pair async locks for calls currently in flight.
type FlightMap = HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>;

/// The resolution engine.
pub struct Resolver {
    store: Arc<dyn ElementStore>,
    generator: Arc<dyn ElementGenerator>,
    cache: ResultCache,
    in_flight: Mutex<FlightMap>,
}

impl Resolver {
    /// Create a resolver over a store and a generator with an empty cache.
    pub fn new(store: Arc<dyn ElementStore>, generator: Arc<dyn ElementGenerator>) -> Self {
        Self {
            store,
            generator,
            cache: ResultCache::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn ElementStore> {
        &self.store
    }

    /// The transient cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Combine two elements.
    pub async fn resolve(&self, a: ElementId, b: ElementId) -> Result<ResolveResult> {
        let key = normalize(a, b)?;

        if let Some(element) = self.cache.get(&key) {
            tracing::debug!(pair = %key, result = %element.name, "cache hit");
            return Ok(ResolveResult::replayed(
                element,
                self.store.is_durable(),
                ResolutionSource::Cache,
            ));
        }

        let lock = self.flight_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.resolve_exclusive(key, a, b).await
        };
        self.release_flight(key, &lock);
        result
    }

    /// Resolution with the pair's in-process lock held.
    async fn resolve_exclusive(&self, key: PairKey, a: ElementId, b: ElementId) -> Result<ResolveResult> {
        let durable = self.store.is_durable();

        // Another caller may have finished this pair while we waited.
        if let Some(element) = self.cache.get(&key) {
            return Ok(ResolveResult::replayed(element, durable, ResolutionSource::Cache));
        }

        let element_a = self.require_input(a).await?;
        let element_b = self.require_input(b).await?;

        if let Some(recipe) = self.store.get_recipe(key).await? {
            let element = self.require_result(recipe.result).await?;
            tracing::debug!(pair = %key, result = %element.name, "store hit");
            let element = self.cache.put(key, element);
            return Ok(ResolveResult::replayed(element, durable, ResolutionSource::Store));
        }

        let candidate = self
            .generator
            .generate(&element_a.name, &element_b.name)
            .await
            .map_err(|e| {
                tracing::warn!(
                    pair = %key,
                    generator = self.generator.name(),
                    error = %e,
                    "generation failed"
                );
                e
            })?;

        let name = candidate.name.trim();
        if name.is_empty() {
            return Err(GeneratorError::Parse("empty element name".to_string()).into());
        }

        // Identity is by name: the generator may repeat itself across pairs.
        let (result, is_first_discovery) = match self.store.get_element_by_name(name).await? {
            Some(existing) => (existing, false),
            None => {
                let inserted = self
                    .store
                    .insert_element(NewElement::derived(
                        name,
                        candidate.glyph.trim(),
                        (element_a.name.as_str(), element_b.name.as_str()),
                    ))
                    .await?;
                let created = inserted.was_created();
                (inserted.into_element(), created)
            }
        };

        match self.store.insert_recipe(key, result.id).await? {
            RecipeInsert::Inserted(_) => {
                if is_first_discovery {
                    tracing::info!(pair = %key, result = %result.name, id = %result.id, "first discovery");
                } else {
                    tracing::info!(pair = %key, result = %result.name, "new recipe for known element");
                }
                let element = self.cache.put(key, result);
                Ok(ResolveResult {
                    element,
                    is_new_element: true,
                    is_first_discovery,
                    durable,
                    source: ResolutionSource::Generated,
                })
            }
            RecipeInsert::AlreadyExists(winner) => {
                tracing::warn!(
                    pair = %key,
                    discarded = %result.name,
                    "recipe committed concurrently, adopting stored result"
                );
                let element = self.require_result(winner.result).await?;
                let element = self.cache.put(key, element);
                Ok(ResolveResult::replayed(element, durable, ResolutionSource::Store))
            }
        }
    }

    async fn require_input(&self, id: ElementId) -> Result<Element> {
        self.store
            .get_element(id)
            .await?
            .ok_or(AlchemyError::UnknownElement(id))
    }

    /// A recipe's result must exist; a dangling one means the store is broken.
    async fn require_result(&self, id: ElementId) -> Result<Element> {
        match self.store.get_element(id).await? {
            Some(element) => Ok(element),
            None => Err(StoreError::Corrupt {
                reason: format!("recipe result {id} has no element"),
            }
            .into()),
        }
    }

    fn flight_lock(&self, key: PairKey) -> Arc<tokio::sync::Mutex<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone()
    }

    fn release_flight(&self, key: PairKey, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this caller hold it: nobody else is waiting.
        if Arc::strong_count(lock) <= 2 {
            in_flight.remove(&key);
        }
    }
}
