use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StorageError;

const DEFAULT_EXTENSION: &str = ".jpg";
const UNSAFE_CHARS: [char; 9] = ['?', ':', '/', '\\', '*', '"', '<', '>', '|'];

/// Stores a recipe image and returns a reference to the stored copy.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// `None` when nothing was stored; failures are never propagated.
    async fn store(&self, url: &str, recipe_name: &str, source: &str) -> Option<String>;
}

/// File name for an image: the recipe name plus the URL's extension, or the
/// URL's last segment when the recipe has no name.
pub fn image_file_name(url: &str, recipe_name: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let last_segment = without_query.rsplit('/').next().unwrap_or_default();

    let name = if recipe_name.trim().is_empty() {
        last_segment.to_string()
    } else {
        let extension = last_segment
            .rfind('.')
            .map(|dot| &last_segment[dot..])
            .filter(|ext| ext.len() > 1)
            .unwrap_or(DEFAULT_EXTENSION);
        format!("{}{}", recipe_name.trim(), extension)
    };

    name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}

/// Single directory name for a source: unsafe characters and leading dots removed.
fn source_dir(source: &str) -> String {
    let cleaned: String = source
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c))
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Downloads images under `<root>/<source>/`.
pub struct ImageStore {
    client: Client,
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            root: root.into(),
        })
    }

    /// Downloads `url` and returns `<source dir>/<file name>`.
    pub async fn download(
        &self,
        url: &str,
        recipe_name: &str,
        source: &str,
    ) -> Result<String, StorageError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::DownloadStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?;

        let dir_name = source_dir(source);
        let file_name = image_file_name(url, recipe_name);
        let dir = if dir_name.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&dir_name)
        };
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        debug!("Stored image {} ({} bytes)", file_name, bytes.len());
        Ok(if dir_name.is_empty() {
            file_name
        } else {
            format!("{dir_name}/{file_name}")
        })
    }
}

#[async_trait]
impl ImageSink for ImageStore {
    async fn store(&self, url: &str, recipe_name: &str, source: &str) -> Option<String> {
        match self.download(url, recipe_name, source).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                error!("Could not store image {} for '{}': {}", url, recipe_name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_keeps_extension() {
        assert_eq!(
            image_file_name("https://img/a.png?width=1200", "Pork Belly"),
            "Pork Belly.png"
        );
        assert_eq!(image_file_name("https://img/photo", "Pork Belly"), "Pork Belly.jpg");
    }

    #[test]
    fn test_file_name_strips_unsafe_characters() {
        assert_eq!(
            image_file_name("https://img/a.jpg", "Fish: \"the best\" / quick?"),
            "Fish the best  quick.jpg"
        );
        assert_eq!(image_file_name("https://img/dir/b.webp", ""), "b.webp");
    }

    #[tokio::test]
    async fn test_download_writes_under_source_dir() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/a.jpg")
            .with_status(200)
            .with_body(b"jpeg-bytes".to_vec())
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), Duration::from_secs(5)).unwrap();

        let reference = store
            .store(&format!("{}/a.jpg", server.url()), "Pork Belly", "The Observer")
            .await;

        assert_eq!(reference.as_deref(), Some("The_Observer/Pork Belly.jpg"));
        let written = std::fs::read(dir.path().join("The_Observer/Pork Belly.jpg")).unwrap();
        assert_eq!(written, b"jpeg-bytes");
    }

    #[test]
    fn test_source_dir_is_one_level() {
        assert_eq!(source_dir("The Observer"), "The_Observer");
        assert_eq!(source_dir("../escaped"), "escaped");
        assert_eq!(source_dir("A/B"), "AB");
        assert_eq!(source_dir(".."), "");
    }

    #[tokio::test]
    async fn test_hostile_source_stays_inside_root() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/soup.jpg")
            .with_status(200)
            .with_body("jpeg")
            .create_async()
            .await;
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("images");
        let store = ImageStore::new(&root, Duration::from_secs(5)).unwrap();

        let reference = store
            .store(&format!("{}/soup.jpg", server.url()), "Soup", "../escaped")
            .await;

        assert_eq!(reference.as_deref(), Some("escaped/Soup.jpg"));
        assert!(root.join("escaped/Soup.jpg").exists());
        assert!(!parent.path().join("escaped").exists());
    }

    #[tokio::test]
    async fn test_failed_download_stores_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), Duration::from_secs(5)).unwrap();

        let reference = store
            .store(&format!("{}/missing.jpg", server.url()), "Soup", "Source")
            .await;

        assert!(reference.is_none());
        assert!(!dir.path().join("Source").exists());
    }
}
