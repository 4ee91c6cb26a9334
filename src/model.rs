use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page-scoped attributes shared by every recipe found on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseData {
    pub source: String,
    /// The requested URL, never an archive mirror
    pub url: String,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub article_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_title: Option<String>,
    /// Resolved page image, or the configured placeholder
    pub image: String,
}

/// Fields read from a single Recipe object, before merging with the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetails {
    pub recipe_name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub ingredients: Option<Value>,
    pub instructions: Option<Value>,
    pub recipe_yield: Option<Value>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
}

/// Normalised output unit, one per recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeRecord {
    pub recipe_name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Stored image reference (`<source dir>/<file>`), null when nothing was stored
    pub image: Option<String>,
    pub ingredients: Option<Value>,
    pub instructions: Option<Value>,
    pub recipe_yield: Option<Value>,
    pub prep_time: Option<String>,
    pub cook_time: Option<String>,
    pub total_time: Option<String>,
    pub source: String,
    pub url: String,
    pub published_date: Option<String>,
    pub article_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_title: Option<String>,
}

impl RecipeRecord {
    /// Key used for deduplication: name with spaces replaced, then the page URL.
    pub fn identity_key(&self) -> String {
        format!("{}||{}", self.recipe_name.replace(' ', "_"), self.url)
    }
}
