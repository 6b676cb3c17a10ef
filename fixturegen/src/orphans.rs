//! Reporting fixture files left over from cases that no longer exist

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::warn;

use crate::{
    archive::{is_case_dir, is_font},
    error::Error,
    registry::CaseRegistry,
};

/// The identifier a fixture font on disk belongs to.
///
/// Fonts inside a case directory belong to that directory's case; fonts at
/// the top level are named after their case up to the first `.`.
fn base_identifier(tests_dir: &Path, font: &Path) -> Option<String> {
    let relative = font.strip_prefix(tests_dir).ok()?;
    let first = relative.components().next()?.as_os_str().to_str()?;
    if relative.components().count() > 1 {
        Some(first.to_string())
    } else {
        first.split('.').next().map(str::to_string)
    }
}

fn fonts_under(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut fonts = Vec::new();
    let mut frontier = vec![dir.to_path_buf()];
    while let Some(dir) = frontier.pop() {
        for entry in fs::read_dir(&dir).map_err(Error::io(&dir))? {
            let path = entry.map_err(Error::io(&dir))?.path();
            if path.is_dir() {
                frontier.push(path);
            } else if is_font(&path) {
                fonts.push(path);
            }
        }
    }
    Ok(fonts)
}

/// Warn about, and return, every fixture font no registered case claims.
///
/// Only reports; nothing on disk is touched.
pub fn find_orphans(tests_dir: &Path, registry: &CaseRegistry) -> Result<Vec<PathBuf>, Error> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(tests_dir).map_err(Error::io(tests_dir))? {
        let path = entry.map_err(Error::io(tests_dir))?.path();
        if path.is_file() && is_font(&path) {
            candidates.push(path);
        } else if is_case_dir(&path) {
            candidates.extend(fonts_under(&path)?);
        }
    }
    candidates.sort();

    let orphans = candidates
        .into_iter()
        .filter(|path| {
            !base_identifier(tests_dir, path)
                .map(|id| registry.contains(&id))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();
    for orphan in orphans.iter() {
        warn!("Unknown file: {}", orphan.display());
    }
    Ok(orphans)
}
