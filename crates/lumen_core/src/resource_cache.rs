//! Resource identity and path-deduplicating cache
//!
//! Every loaded resource carries a process-unique [`ResourceId`]; GPU-side
//! caches key their uploads on it.
//!
//! [`ResourceCache`] hands out `Arc<T>` for a path, loading the file only the
//! first time. It keeps weak references only: a resource is freed as soon as
//! the last entity holding it is dropped, and a later load of the same path
//! reads the file again.
//!
//! # Example
//!
//! ```ignore
//! let mut cache = ResourceCache::new();
//! let crate_model: Arc<Model> = cache.load("assets/crate.obj")?;
//! let again: Arc<Model> = cache.load("assets/crate.obj")?; // same Arc
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::ResourceLoadError;

/// Unique identifier for a loaded resource
///
/// IDs are assigned sequentially starting from 1 and never reused within a
/// process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Trait for types that can be loaded from files and cached.
///
/// The type must be `Send + Sync + 'static` so shared handles can cross
/// threads if a threaded renderer is ever introduced.
pub trait Resource: Sized + Send + Sync + 'static {
    /// Load this resource from the given file path.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceLoadError`] if the file cannot be read or decoded.
    fn load_from_file(path: &Path) -> Result<Self, ResourceLoadError>;
}

/// A type-erased, path-indexed resource cache
#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<PathBuf, Weak<dyn Any + Send + Sync>>,
}

impl ResourceCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a resource from the given file path, or return the live shared
    /// copy if one is still referenced somewhere.
    ///
    /// A path previously loaded as a different type is reloaded as `T` and
    /// replaces the old entry.
    pub fn load<T: Resource>(&mut self, path: impl AsRef<Path>) -> Result<Arc<T>, ResourceLoadError> {
        let path = path.as_ref();
        if let Some(existing) = self.get::<T>(path) {
            return Ok(existing);
        }

        let resource = Arc::new(T::load_from_file(path)?);
        let erased: Arc<dyn Any + Send + Sync> = resource.clone();
        self.entries.insert(path.to_path_buf(), Arc::downgrade(&erased));
        log::info!("Loaded resource {}", path.display());
        Ok(resource)
    }

    /// Live cached copy of `path`, if any
    pub fn get<T: Resource>(&self, path: impl AsRef<Path>) -> Option<Arc<T>> {
        let weak = self.entries.get(path.as_ref())?;
        weak.upgrade()?.downcast::<T>().ok()
    }

    /// Check if `path` is cached and still referenced
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries
            .get(path.as_ref())
            .is_some_and(|w| w.strong_count() > 0)
    }

    /// Drop bookkeeping for resources nobody references anymore
    ///
    /// Returns the number of entries removed.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of entries, including ones not yet garbage collected
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
