// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared registry of feature report nodes.

use std::sync::{Arc, Mutex, PoisonError};

use linked_hash_map::LinkedHashMap;
use once_cell::sync::OnceCell;

use crate::sink::NodeId;

/// Concurrency-safe mapping of resolved feature names to their report nodes.
///
/// For every name the node is created exactly once, no matter how many
/// workers ask for it simultaneously. Only the callers asking for the same
/// name wait for each other, and only while the node is being created.
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    /// Creation slots by feature names, in first-request order.
    features: Mutex<LinkedHashMap<String, Arc<OnceCell<NodeId>>>>,
}

impl FeatureRegistry {
    /// Creates a new empty [`FeatureRegistry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node of the feature `name`, creating it with `create` if
    /// there is none yet.
    ///
    /// `create` runs at most once per successfully registered name.
    ///
    /// # Errors
    ///
    /// Propagates the error of `create`. The failed name stays unregistered,
    /// so a subsequent call retries the creation.
    pub fn get_or_create<E>(
        &self,
        name: &str,
        create: impl FnOnce() -> Result<NodeId, E>,
    ) -> Result<NodeId, E> {
        let slot = {
            let mut features =
                self.features.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = features.get(name) {
                Arc::clone(slot)
            } else {
                let slot = Arc::new(OnceCell::new());
                _ = features.insert(name.to_owned(), Arc::clone(&slot));
                slot
            }
        };
        slot.get_or_try_init(create).copied()
    }

    /// Returns the node of the feature `name`, if it has been created.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.features
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|slot| slot.get().copied())
    }

    /// Returns the names of all the created features, in first-request order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.features
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Returns the number of created features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names().len()
    }

    /// Indicates whether no feature has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    #[test]
    fn creates_once_per_name() {
        let registry = FeatureRegistry::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let create = |id| {
            move || {
                _ = counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(NodeId(id))
            }
        };

        assert_eq!(registry.get_or_create("A", create(1)), Ok(NodeId(1)));
        assert_eq!(registry.get_or_create("A", create(2)), Ok(NodeId(1)));
        assert_eq!(registry.get_or_create("B", create(3)), Ok(NodeId(3)));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.names(), ["A", "B"]);
    }

    #[test]
    fn failed_creation_is_retried_and_does_not_affect_others() {
        let registry = FeatureRegistry::new();

        assert_eq!(
            registry.get_or_create("A", || Err("sink down")),
            Err("sink down"),
        );
        assert_eq!(registry.get("A"), None);
        assert!(registry.is_empty());

        assert_eq!(
            registry.get_or_create("B", || Ok::<_, &str>(NodeId(0))),
            Ok(NodeId(0)),
        );
        assert_eq!(
            registry.get_or_create("A", || Ok::<_, &str>(NodeId(1))),
            Ok(NodeId(1)),
        );
        assert_eq!(registry.names(), ["A", "B"]);
    }

    #[test]
    fn concurrent_callers_observe_single_node() {
        let registry = FeatureRegistry::new();
        let calls = AtomicUsize::new(0);

        let ids: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let (registry, calls) = (&registry, &calls);
                    s.spawn(move || {
                        registry.get_or_create("Shared", || {
                            _ = calls.fetch_add(1, Ordering::SeqCst);
                            thread::yield_now();
                            Ok::<_, ()>(NodeId(i))
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.len(), 1);
    }
}
