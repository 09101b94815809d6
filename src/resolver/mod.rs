// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Derivation of human-readable feature names from test case locators.
//!
//! A [`FeatureNameResolver`] tries, in order:
//! 1. reading the `Feature:` line of the [`Source`] the locator points to;
//! 2. deriving a name from the last path segment of the locator;
//! 3. taking the part of the scenario name before the first `" - "`;
//! 4. falling back to [`DEFAULT_NAME`].
//!
//! The first non-empty result wins and is cached by the exact locator.

mod locator;
pub mod probe;

use std::{
    collections::HashMap,
    io::BufRead,
    sync::{PoisonError, RwLock},
};

use self::probe::SourceProbe;

#[doc(inline)]
pub use self::locator::{file_locator, name_from_path, title_case, Source};

/// Feature name used when no other strategy succeeds.
pub const DEFAULT_NAME: &str = "Test Suite";

/// Marker of the line declaring a feature name.
const FEATURE_MARKER: &str = "Feature:";

/// Separator of a feature name prefix in a scenario name.
const SCENARIO_SEPARATOR: &str = " - ";

/// Memoizing resolver of feature names.
///
/// Safe to share between workers. Two workers racing on the same uncached
/// locator may both compute its name, which is harmless as the result only
/// depends on the locator.
#[derive(Debug)]
pub struct FeatureNameResolver<P = probe::Fs> {
    /// [`SourceProbe`] reading the sources locators point to.
    probe: P,

    /// Resolved names by their locators.
    cache: RwLock<HashMap<String, String>>,
}

impl Default for FeatureNameResolver {
    fn default() -> Self {
        Self::new(probe::Fs::default())
    }
}

impl<P: SourceProbe> FeatureNameResolver<P> {
    /// Creates a new [`FeatureNameResolver`] reading sources with the given
    /// [`SourceProbe`].
    #[must_use]
    pub fn new(probe: P) -> Self {
        Self { probe, cache: RwLock::new(HashMap::new()) }
    }

    /// Resolves the feature name of a test case with the given `locator` and
    /// `scenario_name`.
    ///
    /// Never fails: any I/O error only makes the next strategy be tried.
    pub fn resolve(&self, locator: &str, scenario_name: &str) -> String {
        if let Some(name) = self.cached(locator) {
            return name;
        }

        let name = self
            .from_source(locator)
            .or_else(|| name_from_path(locator))
            .or_else(|| from_scenario_name(scenario_name))
            .unwrap_or_else(|| DEFAULT_NAME.to_owned());
        tracing::debug!("resolved feature name `{name}` for `{locator}`");

        _ = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locator.to_owned(), name.clone());
        name
    }

    /// Returns the already resolved feature name of the given `locator`, if
    /// any.
    #[must_use]
    pub fn cached(&self, locator: &str) -> Option<String> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locator)
            .cloned()
    }

    /// Returns the number of cached locators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Indicates whether nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the feature name declared in the [`Source`] of the given
    /// `locator`.
    fn from_source(&self, locator: &str) -> Option<String> {
        let source = Source::parse(locator)?;
        let reader = match self.probe.open(&source) {
            Ok(reader) => reader?,
            Err(e) => {
                tracing::debug!("cannot read `{locator}`: {e}");
                return None;
            }
        };
        declared_name(reader)
    }
}

/// Scans `reader` for the first line starting with [`FEATURE_MARKER`].
fn declared_name(reader: impl BufRead) -> Option<String> {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!("cannot read feature source: {e}");
                return None;
            }
        };
        if let Some(name) = line.trim().strip_prefix(FEATURE_MARKER) {
            let name = name.trim();
            return (!name.is_empty()).then(|| name.to_owned());
        }
    }
    None
}

/// Takes the part of the `scenario_name` before the first
/// [`SCENARIO_SEPARATOR`].
fn from_scenario_name(scenario_name: &str) -> Option<String> {
    let (prefix, _) = scenario_name.split_once(SCENARIO_SEPARATOR)?;
    let prefix = prefix.trim();
    (!prefix.is_empty()).then(|| prefix.to_owned())
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{probe::Embedded, *};

    #[test]
    fn declared_name_is_trimmed() {
        let source =
            "# language: en\n\n  Feature:   Login Flow  \n  Scenario: x\n";

        assert_eq!(
            declared_name(io::Cursor::new(source)).as_deref(),
            Some("Login Flow"),
        );
    }

    #[test]
    fn empty_declared_name_is_a_miss() {
        assert_eq!(declared_name(io::Cursor::new("Feature:   \n")), None);
        assert_eq!(declared_name(io::Cursor::new("Scenario: x\n")), None);
    }

    #[test]
    fn declared_name_stops_on_invalid_utf8() {
        let source: &[u8] = b"\xff\xfe\nFeature: Late\n";

        assert_eq!(declared_name(source), None);
    }

    #[test]
    fn scenario_name_prefix() {
        assert_eq!(
            from_scenario_name("Checkout - happy path").as_deref(),
            Some("Checkout"),
        );
        assert_eq!(
            from_scenario_name("A - b - c").as_deref(),
            Some("A"),
        );
        assert_eq!(from_scenario_name(" - orphan"), None);
        assert_eq!(from_scenario_name("no separator"), None);
    }

    #[test]
    fn tiers_are_tried_in_order() {
        let resolver = FeatureNameResolver::new(
            Embedded::new()
                .with("features/login.feature", "Feature: Login Flow"),
        );

        assert_eq!(
            resolver.resolve("classpath:features/login.feature", "x - y"),
            "Login Flow",
        );
        assert_eq!(
            resolver.resolve(
                "classpath:features/user_account_mgmt.feature",
                "x - y",
            ),
            "User Account Mgmt",
        );
        assert_eq!(
            resolver.resolve("classpath:features/", "Checkout - happy path"),
            "Checkout",
        );
        assert_eq!(resolver.resolve("", "plain"), DEFAULT_NAME);
        assert_eq!(resolver.len(), 4);
    }

    #[test]
    fn default_is_cached_too() {
        let resolver = FeatureNameResolver::new(Embedded::new());

        assert_eq!(
            resolver.resolve("classpath:features/", "plain"),
            DEFAULT_NAME,
        );
        assert_eq!(
            resolver.cached("classpath:features/").as_deref(),
            Some(DEFAULT_NAME),
        );
        assert!(!resolver.is_empty());
    }
}
