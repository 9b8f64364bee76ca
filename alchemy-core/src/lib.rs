//! Element combination engine with memoized recipes and shortest-path hints.
//!
//! This crate provides:
//! - A resolution engine that turns two elements into one, with a transient
//!   cache, a store, and a generator for pairs nobody has tried yet
//! - A hint engine that finds the fewest combinations needed to reach a target
//! - In-memory and durable JSON-file stores
//! - A Claude-backed element generator
//!
//! # Quick Start
//!
//! ```ignore
//! use alchemy_core::{Alchemy, AlchemyConfig, ElementId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let alchemy = Alchemy::new(AlchemyConfig::from_env()?).await?;
//!
//!     let steam = alchemy.combine(ElementId(1), ElementId(2)).await?;
//!     println!("{} (first discovery: {})", steam.element, steam.is_first_discovery);
//!
//!     let discovered = [1, 2, 3, 4].map(ElementId).into_iter().collect();
//!     if let Some(step) = alchemy.next_hint(steam.element.id, &discovered).await? {
//!         println!("Try {step}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod element;
pub mod error;
pub mod generator;
pub mod hint;
pub mod id;
pub mod pair;
pub mod resolve;
pub mod session;
pub mod store;
pub mod testing;

// Primary public API
pub use config::{AlchemyConfig, GeneratorConfig, StoreBackend};
pub use element::{base_element_ids, Candidate, CombinationStep, Element, NewElement, Recipe, BASE_ELEMENTS};
pub use error::{AlchemyError, GeneratorError, Result, StoreError};
pub use generator::{ClaudeGenerator, ElementGenerator};
pub use hint::{next_hint, shortest_path, HintStart, RecipeGraph, RecipeHint};
pub use id::ElementId;
pub use pair::{normalize, PairKey};
pub use resolve::{ResolutionSource, ResolveResult, Resolver};
pub use session::Alchemy;
pub use store::{ElementInsert, ElementStore, JsonFileStore, MemoryStore, RecipeInsert};
pub use testing::{FailingGenerator, ScriptedGenerator};
