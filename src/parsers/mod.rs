//! Site parsers.
//!
//! [`SiteParser`] carries the default extraction algorithm as overridable
//! hooks; each site variant overrides only the steps where its structured
//! data deviates from schema.org conventions. [`extract_recipes`] drives a
//! parser over a harvested [`ObjectPool`].

pub mod image;
pub mod registry;

mod generic;
mod guardian;
mod heading_scan;
mod house_and_garden;
mod pinch_of_yum;
mod recipe_tin_eats;

pub use generic::{GenericParser, UnknownParser};
pub use guardian::GuardianParser;
pub use house_and_garden::HouseAndGardenParser;
pub use pinch_of_yum::PinchOfYumParser;
pub use recipe_tin_eats::RecipeTinEatsParser;

use html_escape::decode_html_entities;
use log::{debug, info};
use scraper::Html;
use serde_json::Value;

use crate::config::ParsingConfig;
use crate::fetchers::Page;
use crate::harvest::{ObjectPool, StructuredObject};
use crate::model::{BaseData, RecipeDetails, RecipeRecord};
use crate::storage::ImageSink;

pub const ARTICLE_TYPES: [&str; 2] = ["Article", "NewsArticle"];
pub const RECIPE_TYPES: [&str; 1] = ["Recipe"];
pub const ORGANIZATION_TYPES: [&str; 1] = ["Organization"];
pub const PERSON_TYPES: [&str; 1] = ["Person"];

/// Fallback values used by every parser.
#[derive(Debug, Clone)]
pub struct ParserSettings {
    pub unknown_source: String,
    pub placeholder_image: String,
}

impl From<&ParsingConfig> for ParserSettings {
    fn from(config: &ParsingConfig) -> Self {
        Self {
            unknown_source: config.unknown_source.clone(),
            placeholder_image: config.placeholder_image.clone(),
        }
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self::from(&ParsingConfig::default())
    }
}

/// Everything a hook may look at while extracting one page.
pub struct PageContext<'a> {
    pub url: &'a str,
    pub pool: &'a ObjectPool,
    pub document: &'a Html,
    pub settings: &'a ParserSettings,
}

pub(crate) fn decode_html_symbols(text: &str) -> String {
    // for some reason need to decode twice to get the correct string
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

fn non_empty(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.clone()),
    }
}

/// Name of an author value: a string, an object with `name`, or an `@id` reference.
fn author_name(value: &Value, pool: &ObjectPool) -> Option<String> {
    match value {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .or_else(|| {
                let id = obj.get("@id").and_then(Value::as_str)?;
                pool.find_by_id(id)?.str_field("name")
            })
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        _ => None,
    }
}

/// Union of two comma-separated author lists, trimmed and without repeats.
pub fn combine_authors(first: Option<&str>, second: Option<&str>) -> Option<String> {
    let mut names: Vec<&str> = Vec::new();
    for name in [first, second]
        .into_iter()
        .flatten()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Extraction steps, each overridable by a site variant.
pub trait SiteParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether every page handled by this parser is dumped, successful or not.
    fn always_dump(&self) -> bool {
        false
    }

    /// Object supplying page-level fields: the first Article, else the first Recipe.
    fn article_object<'a>(&self, pool: &'a ObjectPool) -> Option<&'a StructuredObject> {
        pool.first_of_type(&ARTICLE_TYPES)
            .or_else(|| pool.first_of_type(&RECIPE_TYPES))
    }

    fn default_source(&self, ctx: &PageContext) -> String {
        ctx.settings.unknown_source.clone()
    }

    fn source(&self, ctx: &PageContext) -> String {
        ctx.pool
            .first_of_type(&ORGANIZATION_TYPES)
            .and_then(|org| org.str_field("name"))
            .map(decode_html_symbols)
            .unwrap_or_else(|| self.default_source(ctx))
    }

    /// Every Person on the page, joined.
    fn page_author(&self, ctx: &PageContext) -> Option<String> {
        let names: Vec<&str> = ctx
            .pool
            .all_of_type(&PERSON_TYPES)
            .filter_map(|person| person.str_field("name"))
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    fn published_date(&self, article: Option<&StructuredObject>) -> Option<String> {
        article?.str_field("datePublished").map(str::to_string)
    }

    fn title(&self, article: Option<&StructuredObject>) -> Option<String> {
        article?.str_field("headline").map(decode_html_symbols)
    }

    fn alternative_title(&self, _article: Option<&StructuredObject>) -> Option<String> {
        None
    }

    fn page_image(&self, article: Option<&StructuredObject>, ctx: &PageContext) -> String {
        image::resolve_image_or(
            article.and_then(|a| a.get("image")),
            ctx.pool,
            &ctx.settings.placeholder_image,
        )
    }

    fn base_data(&self, ctx: &PageContext) -> BaseData {
        let article = self.article_object(ctx.pool);
        BaseData {
            source: self.source(ctx),
            url: ctx.url.to_string(),
            author: self.page_author(ctx),
            published_date: self.published_date(article),
            article_title: self.title(article),
            alternative_title: self.alternative_title(article),
            image: self.page_image(article, ctx),
        }
    }

    fn recipe_objects<'a>(&self, pool: &'a ObjectPool) -> Vec<&'a StructuredObject> {
        pool.all_of_type(&RECIPE_TYPES).collect()
    }

    fn recipe_name(&self, recipe: &StructuredObject) -> Option<String> {
        recipe.str_field("name").map(decode_html_symbols)
    }

    fn recipe_author(&self, recipe: &StructuredObject, ctx: &PageContext) -> Option<String> {
        match recipe.get("author")? {
            Value::Array(items) => {
                let names: Vec<String> = items
                    .iter()
                    .filter_map(|item| author_name(item, ctx.pool))
                    .collect();
                Some(names.join(", ")).filter(|n| !n.is_empty())
            }
            other => author_name(other, ctx.pool),
        }
    }

    fn recipe_description(&self, recipe: &StructuredObject) -> Option<String> {
        let text = match recipe.get("description")? {
            Value::String(s) => s.as_str(),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str)?,
            _ => return None,
        };
        Some(decode_html_symbols(text.trim())).filter(|d| !d.is_empty())
    }

    fn recipe_image(&self, recipe: &StructuredObject, ctx: &PageContext) -> Option<String> {
        image::resolve_image(recipe.get("image"), ctx.pool)
    }

    fn recipe_details(&self, recipe: &StructuredObject, ctx: &PageContext) -> RecipeDetails {
        RecipeDetails {
            recipe_name: self.recipe_name(recipe),
            author: self.recipe_author(recipe, ctx),
            description: self.recipe_description(recipe),
            image: self.recipe_image(recipe, ctx),
            ingredients: non_empty(recipe.get("recipeIngredient")),
            instructions: non_empty(recipe.get("recipeInstructions")),
            recipe_yield: non_empty(recipe.get("recipeYield")),
            prep_time: recipe.str_field("prepTime").map(str::to_string),
            cook_time: recipe.str_field("cookTime").map(str::to_string),
            total_time: recipe.str_field("totalTime").map(str::to_string),
        }
    }

    /// Recipes read straight from the rendered page. Only consulted when the
    /// pool holds neither an article nor a recipe.
    fn scan_document(&self, _ctx: &PageContext) -> Vec<RecipeDetails> {
        Vec::new()
    }
}

/// Outcome of running a parser over one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The page carried no structured data and no fallback matched
    NoStructuredData,
    /// Recipes found; may be empty when structured data held nothing usable
    Recipes(Vec<RecipeRecord>),
}

impl Extraction {
    pub fn recipes(&self) -> &[RecipeRecord] {
        match self {
            Extraction::NoStructuredData => &[],
            Extraction::Recipes(recipes) => recipes,
        }
    }

    pub fn into_recipes(self) -> Option<Vec<RecipeRecord>> {
        match self {
            Extraction::NoStructuredData => None,
            Extraction::Recipes(recipes) => Some(recipes),
        }
    }
}

/// Result of one extraction together with the intermediate data, kept for dumps.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub base: BaseData,
    pub details: Vec<RecipeDetails>,
    pub extraction: Extraction,
}

/// Merges page and recipe data: recipe values win when present, authors are combined.
pub fn merge_recipe(base: &BaseData, details: RecipeDetails, settings: &ParserSettings) -> RecipeRecord {
    let is_real_image = |url: &String| !url.is_empty() && *url != settings.placeholder_image;
    let image = details
        .image
        .filter(is_real_image)
        .or_else(|| Some(base.image.clone()).filter(is_real_image));

    RecipeRecord {
        recipe_name: details.recipe_name.unwrap_or_default(),
        author: combine_authors(base.author.as_deref(), details.author.as_deref()),
        description: details.description,
        image,
        ingredients: details.ingredients,
        instructions: details.instructions,
        recipe_yield: details.recipe_yield,
        prep_time: details.prep_time,
        cook_time: details.cook_time,
        total_time: details.total_time,
        source: base.source.clone(),
        url: base.url.clone(),
        published_date: base.published_date.clone(),
        article_title: base.article_title.clone(),
        alternative_title: base.alternative_title.clone(),
    }
}

/// Runs `parser` over a page's pool and stores each recipe's image through `images`.
pub async fn extract_recipes(
    parser: &dyn SiteParser,
    page: &Page,
    pool: &ObjectPool,
    settings: &ParserSettings,
    images: &dyn ImageSink,
) -> ExtractionReport {
    let ctx = PageContext {
        url: page.url(),
        pool,
        document: page.document(),
        settings,
    };

    let base = parser.base_data(&ctx);
    let recipe_objects = parser.recipe_objects(pool);
    let details: Vec<RecipeDetails> =
        if parser.article_object(pool).is_none() && recipe_objects.is_empty() {
            let scanned = parser.scan_document(&ctx);
            if !scanned.is_empty() {
                info!(
                    "{} parser found {} recipes in page structure at {}",
                    parser.name(),
                    scanned.len(),
                    page.url()
                );
            }
            scanned
        } else {
            recipe_objects
                .iter()
                .map(|recipe| parser.recipe_details(recipe, &ctx))
                .collect()
        };

    if pool.is_empty() && details.is_empty() {
        debug!("No structured data at {}", page.url());
        return ExtractionReport {
            base,
            details,
            extraction: Extraction::NoStructuredData,
        };
    }

    let mut recipes = Vec::with_capacity(details.len());
    for detail in &details {
        let mut recipe = merge_recipe(&base, detail.clone(), settings);
        if let Some(url) = recipe.image.take() {
            recipe.image = images.store(&url, &recipe.recipe_name, &recipe.source).await;
        }
        recipes.push(recipe);
    }

    ExtractionReport {
        base,
        details,
        extraction: Extraction::Recipes(recipes),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::storage::ImageSink;

    /// Records image requests and answers with `<source>/<name>` (or nothing when failing).
    #[derive(Default)]
    pub(crate) struct FakeImages {
        pub(crate) fail: bool,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageSink for FakeImages {
        async fn store(&self, url: &str, recipe_name: &str, source: &str) -> Option<String> {
            self.requests.lock().unwrap().push(url.to_string());
            if self.fail {
                None
            } else {
                Some(format!("{source}/{recipe_name}"))
            }
        }
    }
}
