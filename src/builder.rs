use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::fetchers::{PageFetcher, RequestFetcher, Sleeper, TokioSleeper, Transport};
use crate::parsers::registry::SiteRegistry;
use crate::parsers::ParserSettings;
use crate::pipeline::RecipeHarvester;
use crate::storage::{DumpStore, ImageSink, ImageStore, RecipeStore};

/// Builder for configuring a [`RecipeHarvester`]
///
/// Every collaborator has a default built from the configuration; the setters
/// exist so callers and tests can substitute their own.
#[derive(Default)]
pub struct RecipeHarvesterBuilder {
    config: Option<HarvestConfig>,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    images: Option<Arc<dyn ImageSink>>,
    stop: Option<Arc<AtomicBool>>,
}

impl RecipeHarvesterBuilder {
    /// Use `config` instead of [`HarvestConfig::load`]
    ///
    /// # Example
    /// ```
    /// use recipe_harvest::{HarvestConfig, RecipeHarvester};
    ///
    /// let mut config = HarvestConfig::default();
    /// config.url_delay_ms = 0;
    /// let builder = RecipeHarvester::builder().config(config);
    /// ```
    pub fn config(mut self, config: HarvestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the HTTP transport used for page fetches
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the clock used for retry backoff and the per-URL delay
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Replace the image store
    pub fn image_sink(mut self, images: Arc<dyn ImageSink>) -> Self {
        self.images = Some(images);
        self
    }

    /// Share a flag that, once set, stops a batch before its next URL
    pub fn stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Build the harvester
    ///
    /// # Errors
    /// Returns `HarvestError` if:
    /// - No config was given and loading one fails
    /// - An HTTP client cannot be constructed
    pub fn build(self) -> Result<RecipeHarvester, HarvestError> {
        let config = match self.config {
            Some(config) => config,
            None => HarvestConfig::load()?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                RequestFetcher::new(Some(config.fetch.timeout())).map_err(|e| {
                    HarvestError::BuilderError(format!("could not create page transport: {e}"))
                })?,
            ),
        };
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));
        let images: Arc<dyn ImageSink> = match self.images {
            Some(images) => images,
            None => Arc::new(ImageStore::new(&config.images_dir, config.fetch.timeout())?),
        };

        let fetcher = PageFetcher::new(&config, transport, sleeper.clone()).map_err(|e| {
            HarvestError::BuilderError(format!("could not create page fetcher: {e}"))
        })?;

        Ok(RecipeHarvester::from_parts(
            SiteRegistry::with_overrides(&config.sites),
            fetcher,
            ParserSettings::from(&config.parsing),
            images,
            RecipeStore::new(&config.output_file),
            DumpStore::new(&config.dump_dir),
            sleeper,
            self.stop.unwrap_or_default(),
            config.url_delay(),
        ))
    }
}
