//! The tab separated manifest read by the conformance harness.
//!
//! One record per case: `identifier, "", title, "", links, assertion`.

use std::{fs, path::Path};

use log::info;

use crate::{error::Error, registry::CaseRegistry};

/// Render the manifest for every registered case.
///
/// Records follow category declaration order, then registration order. They
/// are joined with `\n` and the last has no trailing newline.
pub fn render_manifest(registry: &CaseRegistry) -> String {
    registry
        .all_groups()
        .flat_map(|(group, cases)| {
            cases.iter().map(move |case| {
                let links = format!("#{},#{}", group.chapter, case.spec_anchor());
                [
                    case.identifier.as_str(),
                    "",
                    case.title.as_str(),
                    "",
                    links.as_str(),
                    case.description.as_str(),
                ]
                .join("\t")
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_manifest(registry: &CaseRegistry, path: &Path) -> Result<(), Error> {
    fs::write(path, render_manifest(registry)).map_err(Error::io(path))?;
    info!("Wrote {} manifest records to {}", registry.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TestCase;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn registry() -> CaseRegistry {
        let mut registry = CaseRegistry::new();
        registry
            .register(TestCase::new(
                "conform-format1-valid-format-number",
                "Format 1 valid format number",
                "The format number is 1.",
                true,
                "#conform-format1-valid-format-number",
            ))
            .unwrap();
        registry
            .register(TestCase::new(
                "conform-invalid-format-number",
                "Invalid format number",
                "The format number is 3.",
                false,
                "https://example.com/other#elsewhere, #conform-invalid-format-number",
            ))
            .unwrap();
        registry
    }

    #[test]
    fn records_in_registration_order() {
        assert_eq!(
            "conform-format1-valid-format-number\t\tFormat 1 valid format number\t\t\
             #font-format-extensions,#conform-format1-valid-format-number\t\
             The format number is 1.\n\
             conform-invalid-format-number\t\tInvalid format number\t\t\
             #font-format-extensions,#conform-invalid-format-number\t\
             The format number is 3.",
            render_manifest(&registry())
        );
    }

    #[test]
    fn rendering_is_pure() {
        let registry = registry();
        assert_eq!(render_manifest(&registry), render_manifest(&registry));
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert_eq!("", render_manifest(&CaseRegistry::new()));
    }

    #[test]
    fn write_overwrites() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("manifest.txt");
        fs::write(&path, "stale\n").unwrap();
        write_manifest(&registry(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("conform-format1-valid-format-number\t"));
        assert!(!text.ends_with('\n'));
    }
}
