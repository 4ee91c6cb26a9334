use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::harvest::ObjectPool;
use crate::model::{BaseData, RecipeDetails};
use crate::parsers::registry::site_host;

const SLUG_TOKENS: usize = 6;

/// Best-guess name for a page: the first tokens of its last path segment.
pub fn dump_slug(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let segment = path
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or_default();

    let slug: Vec<&str> = segment
        .trim_end_matches(".html")
        .split('-')
        .filter(|t| !t.is_empty())
        .take(SLUG_TOKENS)
        .collect();
    if slug.is_empty() {
        "index".to_string()
    } else {
        slug.join("-")
    }
}

/// Diagnostic artifacts for pages that could not be (fully) extracted.
pub struct DumpStore {
    root: PathBuf,
}

impl DumpStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes the pool, base data, recipe data and raw HTML for `url`.
    /// Returns the directory written to, or `None` if writing failed.
    pub async fn dump(
        &self,
        url: &str,
        pool: &ObjectPool,
        base: &BaseData,
        details: &[RecipeDetails],
        html: &str,
    ) -> Option<PathBuf> {
        let dir = self.root.join(site_host(url));
        let slug = dump_slug(url);
        match self.write_all(&dir, &slug, pool, base, details, html).await {
            Ok(()) => {
                info!("Dumped {} to {}/{}.*", url, dir.display(), slug);
                Some(dir)
            }
            Err(e) => {
                error!("Could not dump {}: {}", url, e);
                None
            }
        }
    }

    async fn write_all(
        &self,
        dir: &Path,
        slug: &str,
        pool: &ObjectPool,
        base: &BaseData,
        details: &[RecipeDetails],
        html: &str,
    ) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(dir).await?;
        write_json(&dir.join(format!("{slug}.pool.json")), pool).await?;
        write_json(&dir.join(format!("{slug}.base.json")), base).await?;
        write_json(&dir.join(format!("{slug}.recipes.json")), details).await?;
        tokio::fs::write(dir.join(format!("{slug}.html")), html).await?;
        Ok(())
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_last_segment() {
        assert_eq!(
            dump_slug("https://www.theguardian.com/food/article/2024/jun/30/nigel-slaters-recipes-for-carrot-and-cucumber-pickle"),
            "nigel-slaters-recipes-for-carrot-and"
        );
        assert_eq!(dump_slug("https://example.com/soup/?utm=1"), "soup");
        assert_eq!(dump_slug("https://example.com/"), "index");
        assert_eq!(dump_slug("https://example.com"), "index");
    }

    #[tokio::test]
    async fn test_dump_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = DumpStore::new(dir.path());
        let base = BaseData {
            source: "Unknown Source".to_string(),
            url: "https://www.blog.example/crispy-pork-belly".to_string(),
            ..Default::default()
        };

        let written = store
            .dump(
                "https://www.blog.example/crispy-pork-belly",
                &ObjectPool::default(),
                &base,
                &[],
                "<html></html>",
            )
            .await
            .unwrap();

        assert_eq!(written, dir.path().join("blog.example"));
        for suffix in ["pool.json", "base.json", "recipes.json", "html"] {
            assert!(written.join(format!("crispy-pork-belly.{suffix}")).exists());
        }
        let base_json = std::fs::read_to_string(written.join("crispy-pork-belly.base.json")).unwrap();
        assert!(base_json.contains("Unknown Source"));
    }
}
