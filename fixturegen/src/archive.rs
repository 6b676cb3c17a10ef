//! Bundling the generated fixtures into a single zip

use std::{
    ffi::OsStr,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{category::Category, error::Error};

/// Extensions of the files treated as fixture fonts
pub const FONT_EXTENSIONS: &[&str] = &["otf", "ttf", "otc", "ttc"];

/// Name suffixes of IFT patch files
pub const PATCH_SUFFIXES: &[&str] = &["_gk", "_tk"];

pub(crate) fn is_font(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| FONT_EXTENSIONS.contains(&ext))
        .unwrap_or_default()
}

/// A `.?t?` extension, the shape every font extension shares
fn has_font_shaped_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            let ext = ext.as_bytes();
            ext.len() == 3 && ext[1] == b't'
        })
        .unwrap_or_default()
}

fn is_patch(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(|name| PATCH_SUFFIXES.iter().any(|s| name.ends_with(s)))
        .unwrap_or_default()
}

/// Whether a directory directly under the tests directory holds a case
pub(crate) fn is_case_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(Category::for_identifier)
            .is_some()
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = fs::read_dir(dir)
        .map_err(Error::io(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, io::Error>>()
        .map_err(Error::io(dir))?;
    entries.sort();
    Ok(entries)
}

/// Every file that belongs in the archive, relative to `tests_dir` and sorted.
pub fn fixture_files(tests_dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    let mut frontier = Vec::new();
    for path in sorted_entries(tests_dir)? {
        if path.is_file() && is_font(&path) {
            files.push(path);
        } else if path.is_file() && has_font_shaped_extension(&path) {
            return Err(Error::UnsupportedFileType(path));
        } else if is_case_dir(&path) {
            frontier.push(path);
        } else {
            debug!("Not archiving {path:?}");
        }
    }

    while let Some(dir) = frontier.pop() {
        for path in sorted_entries(&dir)? {
            if path.is_dir() {
                frontier.push(path);
            } else if is_font(&path) || is_patch(&path) {
                files.push(path);
            } else {
                return Err(Error::UnsupportedFileType(path));
            }
        }
    }

    let mut files = files
        .into_iter()
        .filter_map(|path| path.strip_prefix(tests_dir).ok().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

/// The name of an archive entry, always `/` separated
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Write every fixture under `tests_dir` into a zip at `archive_path`.
///
/// Any previous archive is replaced. Returns the archived paths, relative to
/// `tests_dir`.
pub fn write_archive(tests_dir: &Path, archive_path: &Path) -> Result<Vec<PathBuf>, Error> {
    let files = fixture_files(tests_dir)?;
    if archive_path.exists() {
        fs::remove_file(archive_path).map_err(Error::io(archive_path))?;
    }

    let zip_err = |source| Error::Archive {
        path: archive_path.to_path_buf(),
        source,
    };
    let file = File::create(archive_path).map_err(Error::io(archive_path))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for relative in files.iter() {
        let name = entry_name(relative);
        debug!("Archiving {name}");
        zip.start_file(name, options).map_err(zip_err)?;
        let path = tests_dir.join(relative);
        let mut source = File::open(&path).map_err(Error::io(&path))?;
        io::copy(&mut source, &mut zip).map_err(Error::io(&path))?;
    }
    zip.finish().map_err(zip_err)?;

    info!("Archived {} files to {}", files.len(), archive_path.display());
    Ok(files)
}
