//! Generates the fixtures of the IFT client conformance suite.
//!
//! A run builds each case's font, records the case, then writes the index,
//! the archive and the manifest from what was recorded.

pub mod archive;
mod args;
pub mod category;
mod error;
pub mod fallback;
pub mod fixture;
pub mod font;
pub mod index;
pub mod manifest;
pub mod orphans;
pub mod paths;
pub mod registry;
pub mod subset;

pub use args::{Args, Mode};
pub use error::Error;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use write_fonts::types::Tag;

use crate::{
    archive::write_archive,
    fallback::{build_fallback_font, FallbackVariant},
    fixture::{Fixture, Mutation},
    index::write_index,
    manifest::write_manifest,
    orphans::find_orphans,
    paths::Paths,
    registry::{CaseRegistry, Credit, TestCase},
};

/// The table every conformance case edits
pub const IFT_TAG: Tag = Tag::new(b"IFT ");

/// Patch files copied next to every conformance font
const PATCH_PATTERNS: &[&str] = &["*_gk", "*_tk"];

pub fn require_dir(dir: &Path) -> Result<PathBuf, Error> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::ExpectedDirectory(dir.to_path_buf()));
    }
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(Error::io(dir))?;
    }
    debug!("require_dir {:?}", dir);
    Ok(dir.to_path_buf())
}

/// Copy `src` to `dest`, removing whatever was at `dest` first.
fn copy_resource(src: &Path, dest: &Path) -> Result<(), Error> {
    if !src.is_file() {
        return Err(Error::FileExpected(src.to_path_buf()));
    }
    if dest.exists() {
        fs::remove_file(dest).map_err(Error::io(dest))?;
    }
    fs::copy(src, dest).map_err(Error::io(dest))?;
    debug!("Copied {src:?} to {dest:?}");
    Ok(())
}

/// A case to generate: how to build its files, and what to record about it.
#[derive(Debug, Clone)]
pub struct SuiteCase {
    pub fixture: Fixture,
    pub case: TestCase,
}

/// A conformance case that changes the format byte of the IFT table
fn format_number_case(
    paths: &Paths,
    identifier: &str,
    format: u8,
    title: &str,
    description: &str,
    expected_valid: bool,
) -> SuiteCase {
    let fixture = Fixture::new(identifier, paths.ift_source())
        .with_mutation(Mutation::SetTableByte {
            tag: IFT_TAG,
            offset: 0,
            value: format,
        })
        .with_companions(paths.ift_patches_dir(), PATCH_PATTERNS);
    let case = TestCase::new(
        identifier,
        title,
        description,
        expected_valid,
        &format!("#{identifier}"),
    )
    .with_credit(Credit::author("Scott Treude", "http://treude.com"));
    SuiteCase { fixture, case }
}

/// Every case of the client suite, in the order they are generated.
pub fn client_suite(paths: &Paths) -> Vec<SuiteCase> {
    vec![
        format_number_case(
            paths,
            "conform-format1-valid-format-number",
            1,
            "Format 1 with valid format number",
            "The IFT table 'format' field is set to 1, which is a valid format number.",
            true,
        ),
        format_number_case(
            paths,
            "conform-invalid-format-number",
            3,
            "Invalid format number",
            "The IFT table 'format' field is set to 3, which is an invalid format number.",
            false,
        ),
        format_number_case(
            paths,
            "conform-zero-format-number",
            0,
            "Zero format number",
            "The IFT table 'format' field is set to 0, which is an invalid format number.",
            false,
        ),
    ]
}

/// What a suite run produced.
#[derive(Debug)]
pub struct SuiteReport {
    pub registry: CaseRegistry,
    /// Archived paths, relative to the tests directory
    pub archived: Vec<PathBuf>,
    /// Fonts on disk no registered case claims
    pub orphans: Vec<PathBuf>,
}

/// Build and record every case, then write the index, archive and manifest.
///
/// A case is checked against the registry before its files are written. The
/// first error aborts the run; orphans are only reported.
pub fn generate_suite(paths: &Paths, suite: Vec<SuiteCase>) -> Result<SuiteReport, Error> {
    let tests_dir = require_dir(&paths.tests_dir())?;
    let resources_dir = require_dir(&paths.tests_resources_dir())?;
    copy_resource(&paths.stylesheet_source(), &resources_dir.join("index.css"))?;
    copy_resource(&paths.brotli_source(), &resources_dir.join("brotli.js"))?;

    let mut registry = CaseRegistry::new();
    for SuiteCase { fixture, case } in suite {
        registry.check(&case)?;
        fixture.build(&tests_dir)?;
        registry.register(case)?;
    }

    info!("Compiling index...");
    write_index(&registry, &paths.index_file())?;

    info!("Compiling zip file...");
    let archived = write_archive(&tests_dir, &paths.archive_file())?;

    info!("Compiling manifest...");
    write_manifest(&registry, &paths.manifest_file())?;

    let orphans = find_orphans(&tests_dir, &registry)?;
    Ok(SuiteReport {
        registry,
        archived,
        orphans,
    })
}

pub fn run(args: &Args) -> Result<(), Error> {
    let paths = args.paths();
    require_dir(paths.out_dir())?;
    match args.mode {
        Mode::Client => {
            let report = generate_suite(&paths, client_suite(&paths))?;
            info!(
                "Generated {} cases, archived {} files",
                report.registry.len(),
                report.archived.len()
            );
        }
        Mode::FallbackPass => {
            build_fallback_font(
                &paths.fallback_source(),
                &paths.fallback_dir(),
                FallbackVariant::Pass,
            )?;
        }
        Mode::FallbackFail => {
            build_fallback_font(
                &paths.fallback_source(),
                &paths.fallback_dir(),
                FallbackVariant::Fail,
            )?;
        }
    }
    Ok(())
}
