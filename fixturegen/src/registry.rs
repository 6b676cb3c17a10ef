//! The record of every test case generated during a run.

use std::{collections::HashSet, sync::OnceLock};

use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::{
    category::{expand_spec_links, Category, CategoryGroup},
    error::Error,
};

/// Whether a credited person wrote or reviewed a case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Author,
    Reviewer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub name: String,
    pub role: Role,
    /// A `mailto:` or `http(s):` link
    pub contact: String,
}

impl Credit {
    pub fn author(name: impl Into<String>, contact: impl Into<String>) -> Credit {
        Credit {
            name: name.into(),
            role: Role::Author,
            contact: contact.into(),
        }
    }
}

/// Metadata for one generated fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// `<category>-<description>[-<NNN>]`
    pub identifier: String,
    pub title: String,
    /// What the case proves; doubles as the manifest assertion.
    pub description: String,
    /// Whether a conforming client should accept the fixture.
    pub expected_valid: bool,
    /// Absolute link(s) into the IFT specification.
    pub spec_link: String,
    pub credits: Vec<Credit>,
}

impl TestCase {
    /// Create a case, resolving bare `spec_link` anchors against the IFT specification.
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        expected_valid: bool,
        spec_link: &str,
    ) -> TestCase {
        TestCase {
            identifier: identifier.into(),
            title: title.into(),
            description: description.into(),
            expected_valid,
            spec_link: expand_spec_links(spec_link),
            credits: Vec::new(),
        }
    }

    pub fn with_credit(mut self, credit: Credit) -> TestCase {
        self.credits.push(credit);
        self
    }

    /// The anchor of the last spec link, without the `#`.
    pub fn spec_anchor(&self) -> &str {
        self.spec_link.rsplit('#').next().unwrap_or_default()
    }
}

const IDENTIFIER_PATTERN: &str = "^[a-z0-9]+(-[a-z0-9]+)+$";

static IDENTIFIER_SHAPE: OnceLock<Regex> = OnceLock::new();

fn identifier_shape() -> Result<&'static Regex, Error> {
    if let Some(shape) = IDENTIFIER_SHAPE.get() {
        return Ok(shape);
    }
    let shape = Regex::new(IDENTIFIER_PATTERN).map_err(Error::BadRegex)?;
    Ok(IDENTIFIER_SHAPE.get_or_init(|| shape))
}

/// Append-only registry of test cases, bucketed by category.
#[derive(Debug)]
pub struct CaseRegistry {
    groups: IndexMap<Category, Vec<TestCase>>,
    identifiers: HashSet<String>,
    titles: HashSet<String>,
    descriptions: HashSet<String>,
}

impl Default for CaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseRegistry {
    pub fn new() -> CaseRegistry {
        CaseRegistry {
            groups: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
            identifiers: Default::default(),
            titles: Default::default(),
            descriptions: Default::default(),
        }
    }

    /// The error [`register`](Self::register) would report for `case`, without
    /// recording anything. On success, the category `case` belongs to.
    pub fn check(&self, case: &TestCase) -> Result<Category, Error> {
        if !identifier_shape()?.is_match(&case.identifier) {
            return Err(Error::MalformedIdentifier(case.identifier.clone()));
        }
        let category = Category::for_identifier(&case.identifier)
            .ok_or_else(|| Error::UnknownCategory(case.identifier.clone()))?;
        if self.identifiers.contains(&case.identifier) {
            return Err(Error::DuplicateIdentifier(case.identifier.clone()));
        }
        if self.titles.contains(&case.title) {
            return Err(Error::DuplicateTitle(case.title.clone()));
        }
        if self.descriptions.contains(&case.description) {
            return Err(Error::DuplicateDescription(case.description.clone()));
        }
        Ok(category)
    }

    /// Add a case to the end of its category.
    ///
    /// Every check happens before anything is recorded, so an error leaves
    /// the registry as it was.
    pub fn register(&mut self, case: TestCase) -> Result<(), Error> {
        let category = self.check(&case)?;
        debug!("register {} in '{category}'", case.identifier);
        self.identifiers.insert(case.identifier.clone());
        self.titles.insert(case.title.clone());
        self.descriptions.insert(case.description.clone());
        self.groups.entry(category).or_default().push(case);
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Every category with its cases, in declaration then registration order.
    pub fn all_groups(&self) -> impl Iterator<Item = (CategoryGroup, &[TestCase])> + '_ {
        self.groups
            .iter()
            .map(|(category, cases)| (category.group(), cases.as_slice()))
    }

    /// Every case, in the order the emitters see them.
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.groups.values().flatten()
    }
}
