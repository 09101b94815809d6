// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Interpretation of test case locators.

use std::{
    borrow::Cow,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use itertools::Itertools as _;

/// Scheme prefix of embedded resource locators.
const CLASSPATH: &str = "classpath:";

/// Scheme prefix of filesystem URIs.
const FILE: &str = "file:";

/// Readable source a locator points to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source<'a> {
    /// Embedded resource path, relative to resource roots.
    Resource(&'a str),

    /// Filesystem path.
    File(PathBuf),
}

impl<'a> Source<'a> {
    /// Interprets the given `locator` as a [`Source`].
    ///
    /// Locators with an unknown scheme (`jar:`, `memory:`, etc.) point to no
    /// [`Source`].
    #[must_use]
    pub fn parse(locator: &'a str) -> Option<Self> {
        if let Some(at) = locator.find(CLASSPATH) {
            let path = locator[at + CLASSPATH.len()..].trim_start_matches('/');
            return (!path.is_empty()).then_some(Self::Resource(path));
        }
        if let Some(at) = locator.find(FILE) {
            let path = file_uri_path(&locator[at + FILE.len()..]);
            return (!path.is_empty()).then(|| Self::File(path.into()));
        }
        if locator.is_empty() || has_scheme(locator) {
            return None;
        }
        Some(Self::File(locator.into()))
    }
}

/// Builds a `file:` locator of the given filesystem `path`.
///
/// Characters having a meaning in a locator are percent-encoded, so
/// [`Source::parse()`] always gives the same `path` back.
#[must_use]
pub fn file_locator(path: &Path) -> String {
    let path = path.to_string_lossy();
    let mut locator = String::from(FILE);
    if path.starts_with("//") {
        // Empty authority, otherwise the first segment is taken for a host.
        locator.push_str("//");
    }
    for c in path.chars() {
        if matches!(c, '%' | ' ' | '?' | '#' | ':') {
            _ = write!(locator, "%{:02X}", u32::from(c));
        } else {
            locator.push(c);
        }
    }
    locator
}

/// Derives a human-readable name from the last segment of the given
/// `locator` path.
///
/// `classpath/features/user_account-mgmt.feature` becomes
/// `User Account Mgmt`. Returns [`None`] if nothing is left.
#[must_use]
pub fn name_from_path(locator: &str) -> Option<String> {
    let path: Cow<'_, str> = if let Some(at) = locator.find(CLASSPATH) {
        locator[at + CLASSPATH.len()..].into()
    } else if let Some(at) = locator.find(FILE) {
        file_uri_path(&locator[at + FILE.len()..]).into()
    } else {
        locator.into()
    };
    let path = path.as_ref();

    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = file.strip_suffix(".feature").unwrap_or(file);

    let name = title_case(&stem.replace(['_', '-'], " "));
    (!name.is_empty()).then_some(name)
}

/// Uppercases the first character of every whitespace-separated word and
/// lowercases the rest, joining the words with single spaces.
#[must_use]
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect()
            })
        })
        .join(" ")
}

/// Checks whether the given `locator` starts with a URI scheme.
///
/// Single letter schemes are treated as Windows drive letters.
fn has_scheme(locator: &str) -> bool {
    locator.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
    })
}

/// Extracts the decoded path of a `file:` URI without its scheme.
fn file_uri_path(rest: &str) -> String {
    let path = rest.strip_prefix("//").map_or(rest, |authority_and_path| {
        authority_and_path
            .find('/')
            .map_or("", |at| &authority_and_path[at..])
    });
    let path = path.split(['?', '#']).next().unwrap_or(path);
    percent_decode(path)
}

/// Decodes `%XX` escapes, leaving malformed ones as is.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let decoded = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        if let Some(byte) = decoded {
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_classpath_resources() {
        assert_eq!(
            Source::parse("classpath:features/login.feature"),
            Some(Source::Resource("features/login.feature")),
        );
        assert_eq!(
            Source::parse("classpath:/features/login.feature"),
            Some(Source::Resource("features/login.feature")),
        );
        assert_eq!(Source::parse("classpath:"), None);
    }

    #[test]
    fn parses_file_uris() {
        assert_eq!(
            Source::parse("file:///tmp/my%20features/login.feature"),
            Some(Source::File("/tmp/my features/login.feature".into())),
        );
        assert_eq!(
            Source::parse("file:/tmp/login.feature"),
            Some(Source::File("/tmp/login.feature".into())),
        );
        assert_eq!(
            Source::parse("file://localhost/tmp/login.feature"),
            Some(Source::File("/tmp/login.feature".into())),
        );
        assert_eq!(
            Source::parse("file:features/login.feature"),
            Some(Source::File("features/login.feature".into())),
        );
    }

    #[test]
    fn file_locators_point_back_to_their_paths() {
        for path in [
            "/tmp/a%20b/x.feature",
            "/tmp/my features/login.feature",
            "features/what?#.feature",
            "/suite/classpath:features/a.feature",
            "//server/share/a.feature",
            "C:\\features\\login.feature",
        ] {
            let locator = file_locator(Path::new(path));

            assert_eq!(
                Source::parse(&locator),
                Some(Source::File(path.into())),
                "locator `{locator}`",
            );
        }
        assert_eq!(
            file_locator(Path::new("/tmp/a%20b/x.feature")),
            "file:/tmp/a%2520b/x.feature",
        );
    }

    #[test]
    fn parses_bare_paths_and_rejects_unknown_schemes() {
        assert_eq!(
            Source::parse("tests/features/login.feature"),
            Some(Source::File("tests/features/login.feature".into())),
        );
        assert_eq!(
            Source::parse("C:\\features\\login.feature"),
            Some(Source::File("C:\\features\\login.feature".into())),
        );
        assert_eq!(Source::parse("memory:login"), None);
        assert_eq!(Source::parse(""), None);
    }

    #[test]
    fn derives_names_from_paths() {
        assert_eq!(
            name_from_path("file:///work/features/user_account_mgmt.feature")
                .as_deref(),
            Some("User Account Mgmt"),
        );
        assert_eq!(
            name_from_path("classpath:features/check-OUT_flow.feature")
                .as_deref(),
            Some("Check Out Flow"),
        );
        assert_eq!(
            name_from_path("C:\\suite\\Payments.feature").as_deref(),
            Some("Payments"),
        );
        assert_eq!(
            name_from_path("file:/tmp/my%20cart%25.feature").as_deref(),
            Some("My Cart%"),
        );
        assert_eq!(name_from_path("file:///features/"), None);
        assert_eq!(name_from_path("classpath:features/_-_.feature"), None);
        assert_eq!(name_from_path(""), None);
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("  hello   wORLD "), "Hello World");
        assert_eq!(title_case("émigré flow"), "Émigré Flow");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn decodes_percent_escapes_leniently() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
