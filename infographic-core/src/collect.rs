//! Finding and sampling product images on disk.

use image::DynamicImage;
use rand::Rng;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by path. Subdirectories are ignored.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one image file or every image in a directory.
///
/// Files that fail to decode are logged and skipped. A path that is neither
/// a file nor a directory is logged and yields nothing.
pub fn read_images(path: impl AsRef<Path>) -> Vec<DynamicImage> {
    let path = path.as_ref();
    let files = if path.is_dir() {
        match list_images(path) {
            Ok(files) => files,
            Err(e) => {
                log::error!("cannot list {}: {e}", path.display());
                return Vec::new();
            }
        }
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        log::error!("invalid image path: {}", path.display());
        return Vec::new();
    };
    files
        .iter()
        .filter_map(|f| match load_image(f) {
            Ok(img) => Some(img),
            Err(e) => {
                log::error!("{e}");
                None
            }
        })
        .collect()
}

/// An image drawn by [`sample_images`].
#[derive(Clone, Debug)]
pub struct Sample {
    pub path: PathBuf,
    /// Category directory it came from; empty when sampling `root` itself.
    pub category: String,
    pub image: DynamicImage,
}

impl Sample {
    /// File name without extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Draw `n` distinct images from the category subdirectories of `root`.
///
/// Categories take turns, one random file each, until `n` images are
/// decoded. Missing category directories count as empty. With no categories
/// the files directly under `root` form a single pool. Fails with
/// `InsufficientSamples` before decoding anything when fewer than `n` files
/// exist, and again if decode failures leave the draw short.
pub fn sample_images<R: Rng + ?Sized>(
    root: impl AsRef<Path>,
    categories: &[String],
    n: usize,
    rng: &mut R,
) -> Result<Vec<Sample>> {
    let root = root.as_ref();
    let mut pools: Vec<(String, Vec<PathBuf>)> = if categories.is_empty() {
        vec![(String::new(), pool(root))]
    } else {
        categories
            .iter()
            .map(|c| (c.clone(), pool(&root.join(c))))
            .collect()
    };

    let available: usize = pools.iter().map(|(_, files)| files.len()).sum();
    if available < n {
        return Err(Error::InsufficientSamples {
            available,
            requested: n,
        });
    }

    let mut samples = Vec::with_capacity(n);
    let mut skipped = 0;
    while samples.len() < n && pools.iter().any(|(_, files)| !files.is_empty()) {
        for (category, files) in pools.iter_mut() {
            if samples.len() == n {
                break;
            }
            if files.is_empty() {
                continue;
            }
            let path = files.swap_remove(rng.random_range(0..files.len()));
            match load_image(&path) {
                Ok(image) => samples.push(Sample {
                    path,
                    category: category.clone(),
                    image,
                }),
                Err(e) => {
                    log::warn!("skipping {e}");
                    skipped += 1;
                }
            }
        }
    }

    if samples.len() < n {
        return Err(Error::InsufficientSamples {
            available: available - skipped,
            requested: n,
        });
    }
    log::debug!("sampled {n} images from {} ({skipped} skipped)", root.display());
    Ok(samples)
}

fn pool(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        log::warn!("category directory {} not found", dir.display());
        return Vec::new();
    }
    list_images(dir).unwrap_or_else(|e| {
        log::warn!("cannot list {}: {e}", dir.display());
        Vec::new()
    })
}
