//! Building the files of a single test case.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use write_fonts::types::Tag;

use crate::{
    error::Error,
    font::{FontFile, TableData},
    require_dir,
};

/// File name of the patched font inside a case directory.
///
/// The client harness loads `<case dir>/myfont-mod.ift.otf`.
pub const DEFAULT_OUTPUT_NAME: &str = "myfont-mod.ift.otf";

/// A change to make to the source font
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Overwrite one byte of a table's raw payload
    SetTableByte { tag: Tag, offset: usize, value: u8 },
    /// Replace a table's payload wholesale
    ReplaceTable { tag: Tag, bytes: Vec<u8> },
}

impl Mutation {
    /// Apply to a font, returning the tag of the table that changed.
    pub fn apply(&self, font: &mut FontFile) -> Result<Tag, Error> {
        match self {
            Mutation::SetTableByte { tag, offset, value } => {
                let mut table = font.table(*tag)?;
                table.set_byte(*offset, *value)?;
                font.replace_table(table);
                Ok(*tag)
            }
            Mutation::ReplaceTable { tag, bytes } => {
                // only tables the source already has may be replaced
                let existing = font.table(*tag)?;
                if existing.len() != bytes.len() {
                    debug!(
                        "'{tag}' changes size from {} to {} bytes",
                        existing.len(),
                        bytes.len()
                    );
                }
                font.replace_table(TableData::new(*tag, bytes.clone()));
                Ok(*tag)
            }
        }
    }
}

/// Everything needed to produce the files of one case.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub identifier: String,
    pub source: PathBuf,
    pub mutations: Vec<Mutation>,
    pub output_name: String,
    /// Directory holding files to copy next to the font
    pub companion_dir: Option<PathBuf>,
    /// File name patterns of companions, `*` matching any run of characters
    pub companions: Vec<String>,
}

impl Fixture {
    pub fn new(identifier: impl Into<String>, source: impl Into<PathBuf>) -> Fixture {
        Fixture {
            identifier: identifier.into(),
            source: source.into(),
            mutations: Vec::new(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            companion_dir: None,
            companions: Vec::new(),
        }
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Fixture {
        self.mutations.push(mutation);
        self
    }

    /// Copy files matching `patterns` from `dir` into the case directory
    pub fn with_companions(mut self, dir: impl Into<PathBuf>, patterns: &[&str]) -> Fixture {
        self.companion_dir = Some(dir.into());
        self.companions = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    /// The directory this case writes to.
    pub fn case_dir(&self, tests_dir: &Path) -> PathBuf {
        tests_dir.join(&self.identifier)
    }

    /// Write the case's files under `tests_dir`, returning the font's path.
    pub fn build(&self, tests_dir: &Path) -> Result<PathBuf, Error> {
        info!("Compiling {}...", self.identifier);
        let case_dir = require_dir(&self.case_dir(tests_dir))?;
        self.copy_companions(&case_dir)?;

        let mut font = FontFile::load(&self.source)?;
        let mut touched = Vec::new();
        for mutation in self.mutations.iter() {
            touched.push(mutation.apply(&mut font)?);
        }

        let out_path = case_dir.join(&self.output_name);
        font.save(&out_path)?;
        debug!("Wrote {out_path:?}");

        let written = FontFile::load(&out_path)?;
        for tag in touched {
            let table = written.table(tag)?;
            debug!(
                "'{tag}' of {} now starts with {:?}",
                self.identifier,
                table.get(0)
            );
        }
        Ok(out_path)
    }

    fn copy_companions(&self, case_dir: &Path) -> Result<(), Error> {
        let Some(source_dir) = &self.companion_dir else {
            return Ok(());
        };
        if self.companions.is_empty() {
            return Ok(());
        }
        let mut entries = fs::read_dir(source_dir)
            .map_err(Error::io(source_dir))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::io(source_dir))?;
        entries.sort();

        for pattern in self.companions.iter() {
            let mut copied = 0;
            for path in entries.iter().filter(|p| p.is_file()) {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !matches_pattern(pattern, name) {
                    continue;
                }
                let dest = case_dir.join(name);
                fs::copy(path, &dest).map_err(Error::io(&dest))?;
                debug!("Copied {path:?} to {case_dir:?}");
                copied += 1;
            }
            if copied == 0 {
                warn!("No files in {source_dir:?} match '{pattern}'");
            }
        }
        Ok(())
    }
}

/// Match a file name against a pattern where `*` stands for any run of
/// characters.
fn matches_pattern(pattern: &str, name: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return name.is_empty();
    };
    let Some(mut rest) = name.strip_prefix(first) else {
        return false;
    };
    let parts = parts.collect::<Vec<_>>();
    let Some((last, middle)) = parts.split_last() else {
        // no '*' at all
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(ix) => rest = &rest[ix + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
