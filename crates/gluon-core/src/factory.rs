//! Named-constructor registries.
//!
//! A [`Factory`] maps stable configuration strings (`"CLOVER"`,
//! `"QUDA_WILSON_INVERTER"`, ...) to plain constructor functions. Each
//! crate that provides implementations exposes an explicit, idempotent
//! `register_all()` which callers invoke during single-threaded setup;
//! nothing relies on static initialisation order.
//!
//! Registries are intended to live in a `static`
//! [`LazyLock`](std::sync::LazyLock):
//!
//! ```
//! use std::sync::LazyLock;
//! use gluon_core::{ConfigError, Factory};
//!
//! static SHAPES: LazyLock<Factory<f64, String>> = LazyLock::new(|| Factory::new("Shape"));
//!
//! fn circle(r: &f64) -> Result<String, ConfigError> {
//!     Ok(format!("circle of radius {r}"))
//! }
//!
//! assert!(SHAPES.register_object("CIRCLE", circle));
//! assert!(!SHAPES.register_object("CIRCLE", circle));
//! assert_eq!(SHAPES.create_object("CIRCLE", &2.0).unwrap(), "circle of radius 2");
//! assert!(SHAPES.create_object("SQUARE", &1.0).is_err());
//! ```

use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;

use crate::error::ConfigError;

/// Constructor stored in a [`Factory`]: builds a `T` from arguments `A`.
pub type Creator<A, T> = fn(&A) -> Result<T, ConfigError>;

/// A process-wide registry of named constructors.
///
/// Names are unique. Insertion is idempotent: the first registration of
/// a name wins, and later attempts leave the entry untouched. Creation
/// only takes a read lock and never mutates the registry, so lookups are
/// safe from any number of threads once setup is done.
pub struct Factory<A, T> {
    kind: &'static str,
    creators: RwLock<IndexMap<String, Creator<A, T>>>,
}

impl<A, T> Factory<A, T> {
    /// Empty registry; `kind` names it in diagnostics.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            creators: RwLock::new(IndexMap::new()),
        }
    }

    /// Registry name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Insert `name` if absent. Returns whether the registry changed.
    pub fn register_object(&self, name: &str, creator: Creator<A, T>) -> bool {
        let mut map = self
            .creators
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(name) {
            return false;
        }
        map.insert(name.to_owned(), creator);
        tracing::debug!(factory = self.kind, name, "registered");
        true
    }

    /// Remove `name`. Returns whether it was present.
    pub fn unregister_object(&self, name: &str) -> bool {
        self.creators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(name)
            .is_some()
    }

    /// Whether `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.creators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered names in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.creators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Build the object registered under `name`.
    ///
    /// Fails with [`ConfigError::UnknownType`] when `name` is not
    /// registered; in that case no constructor runs.
    pub fn create_object(&self, name: &str, args: &A) -> Result<T, ConfigError> {
        let creator = {
            let map = self.creators.read().unwrap_or_else(PoisonError::into_inner);
            map.get(name).copied()
        };
        match creator {
            Some(create) => create(args),
            None => {
                tracing::error!(factory = self.kind, name, "unknown type requested");
                Err(ConfigError::UnknownType {
                    factory: self.kind,
                    name: name.to_owned(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn first(x: &i32) -> Result<i32, ConfigError> {
        Ok(x + 1)
    }

    fn counting(x: &i32) -> Result<i32, ConfigError> {
        CALLS.fetch_add(1, Ordering::Relaxed);
        Ok(*x)
    }

    fn second(x: &i32) -> Result<i32, ConfigError> {
        Ok(x * 100)
    }

    fn failing(_: &i32) -> Result<i32, ConfigError> {
        Err(ConfigError::invalid("/x", "rejected"))
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let f: Factory<i32, i32> = Factory::new("Test");
        assert!(f.register_object("A", first));
        let before = f.create_object("A", &1).unwrap();
        assert!(!f.register_object("A", second));
        let after = f.create_object("A", &1).unwrap();
        assert_eq!(before, after);
        assert_eq!(f.registered_names(), vec!["A".to_string()]);
    }

    #[test]
    fn unknown_names_fail_without_constructing() {
        let f: Factory<i32, i32> = Factory::new("Test");
        f.register_object("A", counting);
        let calls = CALLS.load(Ordering::Relaxed);
        let err = f.create_object("B", &1).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownType {
                factory: "Test",
                name: "B".into()
            }
        );
        assert_eq!(CALLS.load(Ordering::Relaxed), calls);
    }

    #[test]
    fn constructor_errors_pass_through() {
        let f: Factory<i32, i32> = Factory::new("Test");
        f.register_object("BAD", failing);
        assert!(matches!(
            f.create_object("BAD", &0),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn names_keep_registration_order_and_can_be_removed() {
        let f: Factory<i32, i32> = Factory::new("Test");
        f.register_object("Z", first);
        f.register_object("A", second);
        assert_eq!(f.registered_names(), vec!["Z".to_string(), "A".to_string()]);
        assert!(f.unregister_object("Z"));
        assert!(!f.unregister_object("Z"));
        assert!(!f.is_registered("Z"));
        assert!(f.is_registered("A"));
    }
}
