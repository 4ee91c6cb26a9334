//! Per-URL orchestration: fetch, harvest, extract, deduplicate, persist.

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::builder::RecipeHarvesterBuilder;
use crate::dedup::deduplicate;
use crate::error::HarvestError;
use crate::fetchers::{PageFetcher, Sleeper};
use crate::harvest::harvest;
use crate::model::RecipeRecord;
use crate::parsers::registry::SiteRegistry;
use crate::parsers::{extract_recipes, ParserSettings};
use crate::storage::{DumpStore, ImageSink, RecipeStore};

/// What happened to one URL of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlOutcome {
    pub accepted: usize,
    pub duplicates: usize,
    /// False when the page could not be fetched or held nothing extractable
    pub found: bool,
}

/// Totals over a batch of URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

pub struct RecipeHarvester {
    registry: SiteRegistry,
    fetcher: PageFetcher,
    settings: ParserSettings,
    images: Arc<dyn ImageSink>,
    store: RecipeStore,
    dumps: DumpStore,
    sleeper: Arc<dyn Sleeper>,
    stop: Arc<AtomicBool>,
    url_delay: Duration,
}

impl RecipeHarvester {
    pub fn builder() -> RecipeHarvesterBuilder {
        RecipeHarvesterBuilder::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        registry: SiteRegistry,
        fetcher: PageFetcher,
        settings: ParserSettings,
        images: Arc<dyn ImageSink>,
        store: RecipeStore,
        dumps: DumpStore,
        sleeper: Arc<dyn Sleeper>,
        stop: Arc<AtomicBool>,
        url_delay: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            settings,
            images,
            store,
            dumps,
            sleeper,
            stop,
            url_delay,
        }
    }

    /// Flag that stops [`Self::process_urls`] before its next URL once set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Extracts every recipe on `url`.
    ///
    /// `None` means nothing usable: the fetch failed, the page was empty, or
    /// it carried no structured data. `Some(vec![])` means structured data was
    /// present but held no recipes.
    pub async fn recipes_from_url(&mut self, url: &str) -> Option<Vec<RecipeRecord>> {
        let entry = self.registry.lookup(url);
        let parser = entry.parser.build();

        let page = match self.fetcher.fetch(url, entry.fetch_mode()).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not fetch {}: {}", url, e);
                return None;
            }
        };
        if page.fetched_from() != url {
            debug!("Read {} from {}", url, page.fetched_from());
        }
        if !page.has_content() {
            warn!("Bad connection, no content at {}", url);
            return None;
        }

        let pool = harvest(page.document());
        let report = extract_recipes(
            parser.as_ref(),
            &page,
            &pool,
            &self.settings,
            self.images.as_ref(),
        )
        .await;

        let found = report.extraction.recipes().len();
        if found > 0 {
            info!("Found {} recipes at {} ({} parser)", found, url, parser.name());
        } else {
            warn!("No recipes found at {}", url);
        }

        if parser.always_dump() || found == 0 {
            self.dumps
                .dump(url, &pool, &report.base, &report.details, page.html())
                .await;
        }

        report.extraction.into_recipes()
    }

    /// Extracts `url`, filters out known recipes, and rewrites the store.
    pub async fn process_url(
        &mut self,
        url: &str,
        recipes: &mut Vec<RecipeRecord>,
        seen: &mut HashSet<String>,
    ) -> UrlOutcome {
        let Some(candidates) = self.recipes_from_url(url).await else {
            return UrlOutcome::default();
        };

        let (fresh, duplicates) = deduplicate(candidates, seen);
        if duplicates > 0 {
            warn!("Skipped {} duplicate recipes from {}", duplicates, url);
        }
        let accepted = fresh.len();
        recipes.extend(fresh);

        if accepted > 0 {
            if let Err(e) = self.store.save(recipes).await {
                error!(
                    "Could not save recipes to {}: {}",
                    self.store.path().display(),
                    e
                );
            }
        }

        UrlOutcome {
            accepted,
            duplicates,
            found: true,
        }
    }

    /// Processes `urls` in order, pausing after each one.
    ///
    /// Fails only if the existing store cannot be read.
    pub async fn process_urls<I>(&mut self, urls: I) -> Result<BatchSummary, HarvestError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut recipes = self.store.load().await?;
        let mut seen = RecipeStore::identity_keys(&recipes);
        let mut summary = BatchSummary::default();

        for url in urls {
            if self.stop.load(Ordering::SeqCst) {
                info!("Stop requested, not starting further URLs");
                break;
            }
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }

            let outcome = self.process_url(url, &mut recipes, &mut seen).await;
            summary.processed += 1;
            summary.accepted += outcome.accepted;
            summary.duplicates += outcome.duplicates;
            if !outcome.found {
                summary.failed += 1;
            }

            self.sleeper.sleep(self.url_delay).await;
        }

        info!(
            "Processed {} URLs: {} new recipes, {} duplicates, {} failed",
            summary.processed, summary.accepted, summary.duplicates, summary.failed
        );
        Ok(summary)
    }

    /// Releases the render session, if one was opened.
    pub fn shutdown(&mut self) {
        self.fetcher.shutdown();
    }
}
