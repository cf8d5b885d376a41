//! Interfaces to the services a finished infographic is handed to.
//!
//! Only the seams live here. Network-backed implementations belong to the
//! caller; [`LocalStore`] is a filesystem store for local runs and tests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Produces text (titles, descriptions, posts) from a prompt.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, system: &str) -> Result<String>;
}

/// Stores files under keys and hands back public URLs.
pub trait ObjectStore {
    /// Upload `local` under `key` and return its public URL.
    fn upload(&self, local: &Path, key: &str) -> Result<String>;
    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub id: String,
    pub url: String,
}

pub trait BlogPublisher {
    fn create_post(&self, blog_id: &str, title: &str, html: &str) -> Result<PublishedPost>;
}

/// A pin before its image has a public URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDraft {
    pub board_id: String,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub alt_text: Option<String>,
    /// Filled in by [`publish_pin`] from the upload.
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPin {
    pub id: String,
    pub image_url: String,
}

pub trait PinPublisher {
    fn create_pin(&self, draft: &PinDraft) -> Result<PublishedPin>;
}

/// [`ObjectStore`] backed by a directory; URLs are `base_url` + key.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    fn check_key(key: &str) -> Result<()> {
        let bad = key.is_empty()
            || key.starts_with('/')
            || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
        if bad {
            return Err(Error::Collaborator(format!("invalid object key {key:?}")));
        }
        Ok(())
    }
}

impl ObjectStore for LocalStore {
    fn upload(&self, local: &Path, key: &str) -> Result<String> {
        Self::check_key(key)?;
        let dest = self.root.join(key);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local, &dest).map_err(|e| {
            Error::Collaborator(format!("upload of {} failed: {e}", local.display()))
        })?;
        let url = self.url(key);
        log::info!("uploaded {} to {url}", local.display());
        Ok(url)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if self.root.is_dir() {
            walk(&self.root, &self.root, &mut keys)?;
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

fn walk(root: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(root, &path, keys)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
    }
    Ok(())
}

/// Upload `local` under `key`, then create a pin pointing at the stored image.
pub fn publish_pin(
    store: &dyn ObjectStore,
    pins: &dyn PinPublisher,
    local: &Path,
    key: &str,
    draft: &PinDraft,
) -> Result<PublishedPin> {
    let image_url = store.upload(local, key)?;
    let draft = PinDraft {
        image_url: Some(image_url),
        ..draft.clone()
    };
    let pin = pins.create_pin(&draft)?;
    log::info!("created pin {} on board {}", pin.id, draft.board_id);
    Ok(pin)
}

/// Generate a post body for `title` and publish it with the infographic on top.
pub fn publish_post(
    generator: &dyn TextGenerator,
    blog: &dyn BlogPublisher,
    blog_id: &str,
    title: &str,
    image_url: &str,
) -> Result<PublishedPost> {
    let body = generator.generate(
        &format!("Write a short blog post in HTML titled \"{title}\"."),
        "Reply with the HTML body only.",
    )?;
    let html = format!(
        "<img src=\"{}\" alt=\"{}\"/>\n{body}",
        html_escape(image_url),
        html_escape(title)
    );
    let post = blog.create_post(blog_id, title, &html)?;
    log::info!("published post {} at {}", post.id, post.url);
    Ok(post)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
