// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Read-only access to the sources test case locators point to.

use std::{
    borrow::Cow,
    collections::HashMap,
    fs,
    io::{self, BufRead},
    path::{Path, PathBuf},
};

use smart_default::SmartDefault;

use super::Source;

/// Resource roots of an [`Fs`] probe by default.
pub const DEFAULT_RESOURCE_ROOTS: [&str; 2] = [".", "src/test/resources"];

/// Read-only access to a [`Source`].
pub trait SourceProbe: Send + Sync {
    /// Opens the given [`Source`] for reading.
    ///
    /// Absence of the [`Source`] is a normal outcome and results in
    /// [`None`].
    ///
    /// # Errors
    ///
    /// If the [`Source`] exists but cannot be opened.
    fn open(
        &self,
        source: &Source<'_>,
    ) -> io::Result<Option<Box<dyn BufRead + '_>>>;
}

/// [`SourceProbe`] reading from the filesystem.
///
/// [`Source::Resource`]s are looked up in the configured resource roots, in
/// order. These are [`DEFAULT_RESOURCE_ROOTS`] unless specified.
#[derive(Clone, Debug, SmartDefault)]
pub struct Fs {
    /// Directories to look [`Source::Resource`]s up in.
    #[default(DEFAULT_RESOURCE_ROOTS.into_iter().map(PathBuf::from).collect())]
    resource_roots: Vec<PathBuf>,
}

impl Fs {
    /// Creates a new [`Fs`] probe with the given resource roots.
    #[must_use]
    pub fn new<I, P>(resource_roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let resource_roots = resource_roots.into_iter().map(Into::into);
        Self { resource_roots: resource_roots.collect() }
    }

    /// Opens the file at `path`, treating its absence as [`None`].
    fn open_file(path: &Path) -> io::Result<Option<fs::File>> {
        match fs::File::open(path) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl SourceProbe for Fs {
    fn open(
        &self,
        source: &Source<'_>,
    ) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        let file = match source {
            Source::File(path) => Self::open_file(path)?,
            Source::Resource(path) => self
                .resource_roots
                .iter()
                .map(|root| root.join(path))
                .find_map(|candidate| match Self::open_file(&candidate) {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::debug!(
                            "cannot open resource {}: {e}",
                            candidate.display(),
                        );
                        None
                    }
                }),
        };
        Ok(file.map(|f| {
            Box::new(io::BufReader::new(f)) as Box<dyn BufRead + '_>
        }))
    }
}

/// [`SourceProbe`] serving [`Source::Resource`]s from memory.
///
/// Suitable for `.feature` files embedded with [`include_str!`].
#[derive(Clone, Debug, Default)]
pub struct Embedded {
    /// Contents of resources by their paths.
    resources: HashMap<String, Cow<'static, str>>,
}

impl Embedded {
    /// Creates a new [`Embedded`] probe without any resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource at the given `path` to this [`Embedded`] probe.
    #[must_use]
    pub fn with(
        mut self,
        path: impl Into<String>,
        content: impl Into<Cow<'static, str>>,
    ) -> Self {
        let path = path.into();
        _ = self
            .resources
            .insert(path.trim_start_matches('/').to_owned(), content.into());
        self
    }
}

impl SourceProbe for Embedded {
    fn open(
        &self,
        source: &Source<'_>,
    ) -> io::Result<Option<Box<dyn BufRead + '_>>> {
        Ok(match source {
            Source::Resource(path) => {
                self.resources.get(*path).map(|content| {
                    Box::new(io::Cursor::new(content.as_bytes()))
                        as Box<dyn BufRead + '_>
                })
            }
            Source::File(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;

    use super::*;

    fn read(probe: &impl SourceProbe, source: &Source<'_>) -> Option<String> {
        probe.open(source).unwrap().map(|mut r| {
            let mut out = String::new();
            _ = r.read_to_string(&mut out).unwrap();
            out
        })
    }

    #[test]
    fn fs_reads_resources_from_first_matching_root() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::create_dir_all(second.path().join("features")).unwrap();
        fs::write(second.path().join("features/a.feature"), "Feature: A")
            .unwrap();
        let probe = Fs::new([first.path(), second.path()]);

        assert_eq!(
            read(&probe, &Source::Resource("features/a.feature")).as_deref(),
            Some("Feature: A"),
        );
        assert_eq!(read(&probe, &Source::Resource("features/b.feature")), None);
    }

    #[test]
    fn fs_treats_missing_files_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let probe = Fs::default();

        assert_eq!(
            read(&probe, &Source::File(dir.path().join("missing.feature"))),
            None,
        );
    }

    #[test]
    fn fs_looks_resources_up_in_default_roots() {
        let probe = Fs::default();

        assert_eq!(
            probe.resource_roots,
            [PathBuf::from("."), PathBuf::from("src/test/resources")],
        );
        assert!(read(&probe, &Source::Resource("Cargo.toml"))
            .is_some_and(|toml| toml.contains("cucumber-report")));
    }

    #[test]
    fn embedded_serves_only_resources() {
        let probe = Embedded::new().with("/features/a.feature", "Feature: A");

        assert_eq!(
            read(&probe, &Source::Resource("features/a.feature")).as_deref(),
            Some("Feature: A"),
        );
        assert_eq!(
            read(&probe, &Source::File("features/a.feature".into())),
            None,
        );
    }
}
