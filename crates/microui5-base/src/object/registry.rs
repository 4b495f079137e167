//! Registry of live objects by id

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::warn;

use super::managed::WeakObject;
use super::ManagedObject;
use crate::config::BaseConfig;
use crate::error::{Error, Result};

static GENERATED_ID_PATTERNS: Lazy<Mutex<FxHashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Whether `id` was produced by the id generator for `prefix`
///
/// Matches the prefix at the start of the id or after one to three dashes,
/// so ids derived from generated ids (`__button0--inner`) are recognized.
pub fn is_generated_id(prefix: &str, id: &str) -> bool {
    let mut patterns = GENERATED_ID_PATTERNS.lock();
    let pattern = patterns.entry(prefix.to_string()).or_insert_with(|| {
        Regex::new(&format!("(^|-{{1,3}}){}", regex::escape(prefix)))
            .expect("escaped prefix is a valid pattern")
    });
    pattern.is_match(id)
}

struct RegistryInner {
    config: Arc<BaseConfig>,
    objects: RefCell<FxHashMap<String, WeakObject>>,
    counters: RefCell<FxHashMap<String, u64>>,
}

/// Live objects by id, plus the generator for ids
///
/// Cloning yields another handle to the same registry. Entries are weak; an
/// object is removed when it is destroyed.
#[derive(Clone)]
pub struct ObjectRegistry {
    inner: Rc<RegistryInner>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new(config: Arc<BaseConfig>) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                config,
                objects: RefCell::new(FxHashMap::default()),
                counters: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    /// Configuration of the runtime
    pub fn config(&self) -> &Arc<BaseConfig> {
        &self.inner.config
    }

    /// Generate the next id for `token`, e.g. `__button3`
    pub fn generate_id(&self, token: &str) -> String {
        let mut counters = self.inner.counters.borrow_mut();
        let counter = counters.entry(token.to_string()).or_insert(0);
        let id = format!("{}{}{}", self.inner.config.uid_prefix, token, counter);
        *counter += 1;
        id
    }

    /// Whether `id` looks like a generated id of this runtime
    pub fn is_generated_id(&self, id: &str) -> bool {
        is_generated_id(&self.inner.config.uid_prefix, id)
    }

    /// Register a live object under its id
    ///
    /// A second live object with the same id is rejected, or replaces the
    /// first one when duplicate ids are tolerated by the configuration.
    pub fn register(&self, object: &ManagedObject) -> Result<()> {
        let mut objects = self.inner.objects.borrow_mut();
        let existing = objects.get(object.id()).and_then(WeakObject::upgrade);
        if let Some(existing) = existing {
            if existing != *object {
                if self.inner.config.no_duplicate_ids {
                    return Err(Error::DuplicateRegistration {
                        id: object.id().to_string(),
                    });
                }
                warn!(id = object.id(), "adding object with duplicate id");
            }
        }
        objects.insert(object.id().to_string(), object.downgrade());
        Ok(())
    }

    /// Remove the entry for `object`, if it is the registered one
    pub fn deregister(&self, object: &ManagedObject) {
        let mut objects = self.inner.objects.borrow_mut();
        let registered = objects.get(object.id()).and_then(WeakObject::upgrade);
        if registered.map_or(true, |r| r == *object) {
            objects.remove(object.id());
        }
    }

    /// Live object registered under `id`
    pub fn get(&self, id: &str) -> Option<ManagedObject> {
        self.inner
            .objects
            .borrow()
            .get(id)
            .and_then(WeakObject::upgrade)
    }

    /// Whether a live object is registered under `id`
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of live registered objects
    pub fn len(&self) -> usize {
        self.inner
            .objects
            .borrow()
            .values()
            .filter(|o| o.upgrade().is_some())
            .count()
    }

    /// Whether no live object is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all live registered objects
    pub fn ids(&self) -> Vec<String> {
        self.inner
            .objects
            .borrow()
            .iter()
            .filter(|(_, o)| o.upgrade().is_some())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new(Arc::new(BaseConfig::default()))
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_counts_per_token() {
        let registry = ObjectRegistry::default();
        assert_eq!(registry.generate_id("button"), "__button0");
        assert_eq!(registry.generate_id("button"), "__button1");
        assert_eq!(registry.generate_id("list"), "__list0");
    }

    #[test]
    fn test_is_generated_id() {
        assert!(is_generated_id("__", "__button0"));
        assert!(is_generated_id("__", "page--__button0"));
        assert!(is_generated_id("__", "view-__list3"));
        assert!(!is_generated_id("__", "myButton"));
        assert!(is_generated_id("a.b", "a.b1"));
        assert!(!is_generated_id("a.b", "axb1"));

        let registry = ObjectRegistry::new(Arc::new(BaseConfig {
            uid_prefix: "id_".into(),
            ..BaseConfig::default()
        }));
        assert_eq!(registry.generate_id("text"), "id_text0");
        assert!(registry.is_generated_id("id_text0"));
        assert!(registry.is_empty());
    }
}
