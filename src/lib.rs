//! Extraction of schema.org recipes embedded in web pages.
//!
//! A URL is fetched (directly, through an archive mirror, or through a
//! rendering service), its JSON-LD is flattened into an object pool, and a
//! site-specific parser turns the pool into normalised [`RecipeRecord`]s.
//! [`RecipeHarvester`] runs that pipeline over a batch of URLs, deduplicating
//! against a persisted store.

pub mod builder;
pub mod config;
pub mod dedup;
pub mod error;
pub mod fetchers;
pub mod harvest;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod storage;

pub use builder::RecipeHarvesterBuilder;
pub use config::HarvestConfig;
pub use error::{FetchError, HarvestError, StorageError};
pub use fetchers::{FetchMode, Page, PageFetcher};
pub use harvest::{harvest, ObjectPool, StructuredObject};
pub use model::{BaseData, RecipeDetails, RecipeRecord};
pub use parsers::{extract_recipes, Extraction, ExtractionReport, SiteParser};
pub use pipeline::{BatchSummary, RecipeHarvester, UrlOutcome};
