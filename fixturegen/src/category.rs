//! The statically declared test case categories.
//!
//! Every test case identifier starts with the tag of one of these, and the
//! index groups cases by them.

use std::{fmt::Display, str::FromStr};

/// Base URL that bare `#anchor` spec links are resolved against.
pub const SPEC_BASE_URL: &str = "https://www.w3.org/TR/IFT/";

/// A category of test cases.
///
/// Declaration order is the order categories appear in the index and the
/// manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Conform,
}

/// Static description of a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub tag: &'static str,
    pub title: &'static str,
    pub spec_section_url: String,
    /// Anchor forced in front of every manifest link of the category
    pub chapter: &'static str,
    pub note: &'static str,
}

const CONFORM_NOTE: &str = "\
These files are IFT fonts whose IFT table has been altered to exercise the \
conformance requirements of the font format extensions. Cases marked as \
rejected must not be used by the client; the fallback font is shown instead.";

impl Category {
    pub const ALL: &'static [Category] = &[Category::Conform];

    pub fn tag(&self) -> &'static str {
        match self {
            Category::Conform => "conform",
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            Category::Conform => CategoryGroup {
                tag: self.tag(),
                title: "IFT Font Format Conformance",
                spec_section_url: expand_spec_links("#font-format-extensions"),
                chapter: "font-format-extensions",
                note: CONFORM_NOTE,
            },
        }
    }

    /// The category named by the group prefix of a test case identifier.
    ///
    /// The prefix is everything before the first `-`.
    pub fn for_identifier(identifier: &str) -> Option<Category> {
        identifier
            .split('-')
            .next()
            .and_then(|prefix| prefix.parse().ok())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.tag() == s)
            .copied()
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Resolve a comma separated list of spec links.
///
/// Bare anchors are made absolute against [`SPEC_BASE_URL`], anything else is
/// kept as written.
pub fn expand_spec_links(links: &str) -> String {
    links
        .split(',')
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(|link| {
            if link.starts_with('#') {
                format!("{SPEC_BASE_URL}{link}")
            } else {
                link.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
