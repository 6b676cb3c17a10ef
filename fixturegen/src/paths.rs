//! Where inputs are read from and artifacts are written to

use std::path::{Path, PathBuf};

use crate::fallback::FallbackVariant;

/// Name of the directory, under the output root, holding the client suite
pub const TESTS_DIR: &str = "ClientTests";
pub const INDEX_FILE: &str = "index.html";
pub const MANIFEST_FILE: &str = "manifest.txt";
pub const ARCHIVE_FILE: &str = "IFTClientTestFonts.zip";

#[derive(Debug, Clone)]
pub struct Paths {
    resources_dir: PathBuf,
    out_dir: PathBuf,
}

impl Paths {
    pub fn new(resources_dir: &Path, out_dir: &Path) -> Paths {
        Paths {
            resources_dir: resources_dir.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// The IFT font every conformance case starts from
    pub fn ift_source(&self) -> PathBuf {
        self.resources_dir.join("myfont.ift.ttf")
    }

    /// The patch files that accompany [`Paths::ift_source`]
    pub fn ift_patches_dir(&self) -> PathBuf {
        self.resources_dir.join("IFT")
    }

    pub fn fallback_source(&self) -> PathBuf {
        self.resources_dir.join("Roboto-Regular.ttf")
    }

    pub fn stylesheet_source(&self) -> PathBuf {
        self.resources_dir.join("index.css")
    }

    pub fn brotli_source(&self) -> PathBuf {
        self.resources_dir.join("cc-client").join("brotli.js")
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.out_dir.join(TESTS_DIR)
    }

    /// Support files the index page links to
    pub fn tests_resources_dir(&self) -> PathBuf {
        self.tests_dir().join("resources")
    }

    pub fn index_file(&self) -> PathBuf {
        self.tests_dir().join(INDEX_FILE)
    }

    pub fn archive_file(&self) -> PathBuf {
        self.tests_dir().join(ARCHIVE_FILE)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }

    pub fn fallback_dir(&self) -> PathBuf {
        self.out_dir.join("fallback")
    }

    pub fn fallback_file(&self, variant: FallbackVariant) -> PathBuf {
        self.fallback_dir().join(variant.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let paths = Paths::new(Path::new("res"), Path::new("out"));
        assert_eq!(
            PathBuf::from("out/ClientTests/IFTClientTestFonts.zip"),
            paths.archive_file()
        );
        assert_eq!(PathBuf::from("out/manifest.txt"), paths.manifest_file());
        assert_eq!(
            PathBuf::from("out/fallback/RobotoFallback-fail.ttf"),
            paths.fallback_file(FallbackVariant::Fail)
        );
        assert_eq!(
            PathBuf::from("res/cc-client/brotli.js"),
            paths.brotli_source()
        );
    }
}
