//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::paths::Paths;

/// Which fixtures shall we generate today?
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version)]
pub struct Args {
    /// What to generate
    pub mode: Mode,

    /// Directory holding the source fonts, patches and page resources
    #[arg(short, long)]
    #[clap(default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Root of everything written. Reruns overwrite what is there.
    #[arg(short, long)]
    #[clap(default_value = "generated")]
    pub out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// The client conformance suite, its index, manifest and archive
    Client,
    /// The fallback font whose ligatures read PASS
    FallbackPass,
    /// The fallback font whose ligatures read FAIL
    FallbackFail,
}

impl Args {
    pub fn new(mode: Mode, resources_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Args {
        Args {
            mode,
            resources_dir: resources_dir.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn paths(&self) -> Paths {
        Paths::new(&self.resources_dir, &self.out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("client", Mode::Client)]
    #[case("fallback-pass", Mode::FallbackPass)]
    #[case("fallback-fail", Mode::FallbackFail)]
    fn parse_mode(#[case] arg: &str, #[case] mode: Mode) {
        let args = Args::try_parse_from(["fixturegen", arg]).unwrap();
        assert_eq!(Args::new(mode, "resources", "generated"), args);
    }

    #[test]
    fn directories_override_defaults() {
        let args = Args::try_parse_from([
            "fixturegen",
            "--resources-dir",
            "res",
            "-o",
            "/tmp/out",
            "client",
        ])
        .unwrap();
        assert_eq!(Args::new(Mode::Client, "res", "/tmp/out"), args);
    }

    #[rstest]
    #[case::missing(&["fixturegen"])]
    #[case::unknown(&["fixturegen", "woff2"])]
    fn bad_mode_is_a_usage_error(#[case] argv: &[&str]) {
        let err = Args::try_parse_from(argv.iter().copied()).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn help_is_not_an_error() {
        let err = Args::try_parse_from(["fixturegen", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
    }
}
