use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::model::RecipeRecord;

/// JSON file holding every accepted recipe, rewritten in full on each save.
pub struct RecipeStore {
    path: PathBuf,
}

impl RecipeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the store; a missing file is an empty store.
    pub async fn load(&self) -> Result<Vec<RecipeRecord>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No recipe store at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let recipes: Vec<RecipeRecord> = serde_json::from_str(&contents)?;
        debug!("Loaded {} recipes from {}", recipes.len(), self.path.display());
        Ok(recipes)
    }

    pub async fn save(&self, recipes: &[RecipeRecord]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(recipes)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved {} recipes to {}", recipes.len(), self.path.display());
        Ok(())
    }

    /// Identity keys of `recipes`, for seeding deduplication.
    pub fn identity_keys(recipes: &[RecipeRecord]) -> HashSet<String> {
        recipes.iter().map(RecipeRecord::identity_key).collect()
    }
}
