//! The fallback fonts used by the client harness page.
//!
//! A harness page renders each case's text with the case's IFT font, falling
//! back to one of these. The fallback's `liga` feature turns a `P` into
//! "PASS" or "FAIL" (and `F` into the other), so the text a reader sees says
//! whether the IFT font was used.
//!
//! The source is subset to the glyphs of [`RETAINED_CHARS`] first.

use std::{
    collections::BTreeMap,
    fmt::Display,
    path::{Path, PathBuf},
};

use log::{debug, info};
use write_fonts::{
    read::{
        tables::{cmap::Cmap as ReadCmap, name::Name as ReadName},
        ReadError, TableProvider, TopLevelTable,
    },
    tables::{
        cmap::Cmap,
        gsub::{Gsub, MultipleSubstFormat1, Sequence, SubstitutionLookup},
        layout::{
            CoverageTable, Feature, FeatureList, FeatureRecord, LangSys, Lookup, LookupFlag,
            LookupList, Script, ScriptList, ScriptRecord,
        },
        name::{Name, NameRecord},
    },
    types::{GlyphId, GlyphId16, NameId, Tag},
    NullableOffsetMarker, OffsetMarker,
};

use crate::{error::Error, font::FontFile, require_dir, subset::subset_glyphs};

/// Characters the fallback font keeps in its cmap
pub const RETAINED_CHARS: &[char] = &['A', 'F', 'I', 'L', 'P', 'S', ' '];

const LIGA: Tag = Tag::new(b"liga");
const SCRIPTS: &[Tag] = &[Tag::new(b"DFLT"), Tag::new(b"latn")];

/// Which way round the fallback's substitutions go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackVariant {
    /// `P` reads "PASS", `F` reads "FAIL"
    Pass,
    /// `P` reads "FAIL", `F` reads "PASS"
    Fail,
}

impl FallbackVariant {
    pub fn family_name(&self) -> &'static str {
        match self {
            FallbackVariant::Pass => "RobotoFallbackPass",
            FallbackVariant::Fail => "RobotoFallbackFail",
        }
    }

    pub fn file_name(&self) -> String {
        format!("RobotoFallback-{self}.ttf")
    }

    /// Each rule replaces one character with a sequence of characters
    pub fn substitutions(&self) -> [(char, &'static str); 2] {
        match self {
            FallbackVariant::Pass => [('P', "PASS"), ('F', "FAIL")],
            FallbackVariant::Fail => [('P', "FAIL"), ('F', "PASS")],
        }
    }
}

impl Display for FallbackVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackVariant::Pass => f.write_str("pass"),
            FallbackVariant::Fail => f.write_str("fail"),
        }
    }
}

/// Build the fallback font for `variant` from `source` into `out_dir`.
pub fn build_fallback_font(
    source: &Path,
    out_dir: &Path,
    variant: FallbackVariant,
) -> Result<PathBuf, Error> {
    info!("Compiling {} fallback font...", variant);
    require_dir(out_dir)?;
    let mut font = FontFile::load(source)?;

    let (glyphs, name) = {
        let font_ref = font.font_ref()?;
        let cmap = read_table(&font, ReadCmap::TAG, || font_ref.cmap())?;
        let glyphs = retained_glyphs(&cmap)?;
        let name = read_table(&font, ReadName::TAG, || font_ref.name())?;
        (glyphs, renamed(&name, variant.family_name(), font.path())?)
    };

    let subset = subset_glyphs(&mut font, glyphs.values().copied())?;
    let glyphs = glyphs
        .into_iter()
        .map(|(c, gid)| {
            subset
                .get(gid)
                .map(|new| (c, GlyphId::from(new)))
                .ok_or(Error::UnmappedGlyph(gid.to_u32()))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    info!(
        "Kept {} glyphs for {:?}",
        subset.len(),
        RETAINED_CHARS.iter().collect::<String>()
    );

    font.replace_with(&Cmap::from_mappings(glyphs.iter().map(|(c, g)| (*c, *g)))?)?;
    font.replace_with(&name)?;
    font.replace_with(&liga_gsub(&glyphs, variant)?)?;

    let out_path = out_dir.join(variant.file_name());
    font.save(&out_path)?;
    info!("Font saved to {}", out_path.display());
    Ok(out_path)
}

/// Read a table, reporting absence as [`Error::MissingTable`]
fn read_table<T>(
    font: &FontFile,
    tag: Tag,
    read: impl FnOnce() -> Result<T, ReadError>,
) -> Result<T, Error> {
    if !font.contains(tag) {
        return Err(Error::MissingTable {
            path: font.path().to_path_buf(),
            tag,
        });
    }
    read().map_err(|source| Error::ReadFont {
        path: font.path().to_path_buf(),
        source,
    })
}

fn retained_glyphs(cmap: &ReadCmap) -> Result<BTreeMap<char, GlyphId>, Error> {
    RETAINED_CHARS
        .iter()
        .map(|c| {
            cmap.map_codepoint(*c)
                .map(|gid| (*c, gid))
                .ok_or(Error::MissingGlyph(*c))
        })
        .collect()
}

/// A copy of `name` with the family renamed and the subfamily set to Regular
fn renamed(name: &ReadName, family: &str, path: &Path) -> Result<Name, Error> {
    let string_data = name.string_data();
    let records = name
        .name_record()
        .iter()
        .map(|record| {
            let name_id = record.name_id();
            let value = if [NameId::FAMILY_NAME, NameId::FULL_NAME, NameId::POSTSCRIPT_NAME]
                .contains(&name_id)
            {
                family.to_string()
            } else if name_id == NameId::SUBFAMILY_NAME {
                "Regular".to_string()
            } else {
                record.string(string_data)?.chars().collect()
            };
            Ok(NameRecord {
                name_id,
                platform_id: record.platform_id(),
                encoding_id: record.encoding_id(),
                language_id: record.language_id(),
                string: OffsetMarker::new(value),
            })
        })
        .collect::<Result<Vec<_>, ReadError>>()
        .map_err(|source| Error::ReadFont {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Renamed {} name records to {family}", records.len());
    Ok(Name::new(sorted_records(records)))
}

/// `name` requires its records sorted and unique by (platform, encoding, language, name id)
fn sorted_records(mut records: Vec<NameRecord>) -> Vec<NameRecord> {
    let key = |r: &NameRecord| (r.platform_id, r.encoding_id, r.language_id, r.name_id);
    records.sort_by_key(key);
    records.dedup_by_key(|r| key(r));
    records
}

fn gid16(gid: GlyphId) -> Result<GlyphId16, Error> {
    u16::try_from(gid.to_u32())
        .map(GlyphId16::new)
        .map_err(|_| Error::GlyphIdOverflow(gid.to_u32()))
}

/// A GSUB whose only feature is a `liga` with one multiple substitution lookup
fn liga_gsub(glyphs: &BTreeMap<char, GlyphId>, variant: FallbackVariant) -> Result<Gsub, Error> {
    let glyph = |c: char| -> Result<GlyphId16, Error> {
        glyphs
            .get(&c)
            .copied()
            .ok_or(Error::MissingGlyph(c))
            .and_then(gid16)
    };

    let mut rules = BTreeMap::new();
    for (target, replacement) in variant.substitutions() {
        let replacement = replacement
            .chars()
            .map(glyph)
            .collect::<Result<Vec<_>, _>>()?;
        rules.insert(glyph(target)?, replacement);
    }

    let coverage: CoverageTable = rules.keys().copied().collect();
    let sequences = rules.into_values().map(Sequence::new).collect();
    let subtable = MultipleSubstFormat1::new(coverage, sequences);
    let lookups = LookupList::new(vec![SubstitutionLookup::Multiple(Lookup::new(
        LookupFlag::empty(),
        vec![subtable],
    ))]);

    let features = FeatureList::new(vec![FeatureRecord::new(LIGA, Feature::new(None, vec![0]))]);

    let scripts = SCRIPTS
        .iter()
        .map(|tag| {
            let lang_sys = LangSys {
                required_feature_index: 0xFFFF,
                feature_indices: vec![0],
            };
            let script = Script {
                default_lang_sys: NullableOffsetMarker::new(Some(lang_sys)),
                lang_sys_records: Vec::new(),
            };
            ScriptRecord::new(*tag, script)
        })
        .collect();

    Ok(Gsub::new(ScriptList::new(scripts), features, lookups))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::font::test_fonts::{roboto_like, ROBOTO_LIKE_GLYPHS};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use write_fonts::{
        dump_table,
        read::{tables::gsub::SubstitutionSubtables, FontRef},
        FontBuilder,
    };

    fn names(font: &FontRef) -> BTreeMap<NameId, String> {
        let name = font.name().unwrap();
        name.name_record()
            .iter()
            .map(|nr| {
                (
                    nr.name_id(),
                    nr.string(name.string_data())
                        .unwrap()
                        .chars()
                        .collect::<String>(),
                )
            })
            .collect()
    }

    fn build(variant: FallbackVariant) -> Vec<u8> {
        build_from(roboto_like(), variant)
    }

    fn build_from(source_font: Vec<u8>, variant: FallbackVariant) -> Vec<u8> {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("Roboto-Regular.ttf");
        fs::write(&source, source_font).unwrap();
        let out_dir = temp_dir.path().join("fallback");
        let out = build_fallback_font(&source, &out_dir, variant).unwrap();
        assert_eq!(out_dir.join(variant.file_name()), out);
        fs::read(out).unwrap()
    }

    #[test]
    fn cmap_keeps_only_retained_chars() {
        let buf = build(FallbackVariant::Pass);
        let font = FontRef::new(&buf).unwrap();
        let cmap = font.cmap().unwrap();
        for c in RETAINED_CHARS {
            assert!(cmap.map_codepoint(*c).is_some(), "{c:?} should be mapped");
        }
        for c in ['B', 'Q', 'Z'] {
            assert_eq!(None, cmap.map_codepoint(c), "{c:?} should be gone");
        }
    }

    #[test]
    fn family_is_renamed() {
        let buf = build(FallbackVariant::Fail);
        let font = FontRef::new(&buf).unwrap();
        let names = names(&font);
        assert_eq!("RobotoFallbackFail", names[&NameId::FAMILY_NAME]);
        assert_eq!("Regular", names[&NameId::SUBFAMILY_NAME]);
        assert_eq!("RobotoFallbackFail", names[&NameId::FULL_NAME]);
        assert_eq!("RobotoFallbackFail", names[&NameId::POSTSCRIPT_NAME]);
        assert_eq!("Version 3.0", names[&NameId::VERSION_STRING]);
    }

    fn liga_sequences(buf: &[u8]) -> Vec<(u32, Vec<u32>)> {
        let font = FontRef::new(buf).unwrap();
        let gsub = font.gsub().unwrap();
        let features = gsub.feature_list().unwrap();
        assert_eq!(
            vec![LIGA],
            features
                .feature_records()
                .iter()
                .map(|r| r.feature_tag())
                .collect::<Vec<_>>()
        );
        let lookups = gsub.lookup_list().unwrap();
        assert_eq!(1, lookups.lookup_count());
        let lookup = lookups.lookups().get(0).unwrap();
        let SubstitutionSubtables::Multiple(subtables) = lookup.subtables().unwrap() else {
            panic!("expected a multiple substitution");
        };
        let subtable = subtables.iter().next().unwrap().unwrap();
        let coverage = subtable.coverage().unwrap();
        coverage
            .iter()
            .zip(subtable.sequences().iter())
            .map(|(gid, seq)| {
                (
                    gid.to_u32(),
                    seq.unwrap()
                        .substitute_glyph_ids()
                        .iter()
                        .map(|g| g.get().to_u32())
                        .collect(),
                )
            })
            .collect()
    }

    // glyph ids after subsetting: .notdef, space, A F I L P S, then Z which A references
    const A: u32 = 2;
    const F: u32 = 3;
    const I: u32 = 4;
    const L: u32 = 5;
    const P: u32 = 6;
    const S: u32 = 7;

    #[test]
    fn glyphs_are_subset() {
        let buf = build(FallbackVariant::Pass);
        let font = FontRef::new(&buf).unwrap();
        assert_eq!(ROBOTO_LIKE_GLYPHS, 28);
        assert_eq!(9, font.maxp().unwrap().num_glyphs());
        let cmap = font.cmap().unwrap();
        let mapped = RETAINED_CHARS
            .iter()
            .map(|c| cmap.map_codepoint(*c).unwrap().to_u32())
            .collect::<Vec<_>>();
        assert_eq!(vec![A, F, I, L, P, S, 1], mapped);
        // whatever GPOS the source had indexed the old glyph ids
        assert!(font.table_data(Tag::new(b"GPOS")).is_none());
    }

    /// A name table in source order, without validation
    fn raw_name(records: &[(u16, u16, u16, NameId, &str)]) -> Vec<u8> {
        let mut table = Vec::new();
        let mut strings = Vec::new();
        let count = records.len() as u16;
        for v in [0, count, 6 + 12 * count] {
            table.extend(v.to_be_bytes());
        }
        for (platform, encoding, language, name_id, value) in records {
            let bytes: Vec<u8> = if *platform == 1 {
                value.bytes().collect()
            } else {
                value.encode_utf16().flat_map(u16::to_be_bytes).collect()
            };
            let fields = [
                *platform,
                *encoding,
                *language,
                name_id.to_u16(),
                bytes.len() as u16,
                strings.len() as u16,
            ];
            for v in fields {
                table.extend(v.to_be_bytes());
            }
            strings.extend(bytes);
        }
        table.extend(strings);
        table
    }

    #[test]
    fn unsorted_source_names_are_sorted() {
        let roboto = roboto_like();
        let name = raw_name(&[
            (3, 1, 0x409, NameId::FAMILY_NAME, "Roboto"),
            (3, 1, 0x409, NameId::SUBFAMILY_NAME, "Bold"),
            (1, 0, 0, NameId::FAMILY_NAME, "Roboto"),
            (3, 1, 0x409, NameId::POSTSCRIPT_NAME, "Roboto-Bold"),
            (3, 1, 0x409, NameId::VERSION_STRING, "Version 3.0"),
        ]);
        let mut builder = FontBuilder::new();
        builder.add_raw(Tag::new(b"name"), name);
        builder.copy_missing_tables(FontRef::new(&roboto).unwrap());
        let source = builder.build();

        let buf = build_from(source, FallbackVariant::Pass);
        let font = FontRef::new(&buf).unwrap();
        let name = font.name().unwrap();
        let keys = name
            .name_record()
            .iter()
            .map(|r| (r.platform_id(), r.encoding_id(), r.language_id(), r.name_id()))
            .collect::<Vec<_>>();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(sorted, keys);
        assert_eq!(5, keys.len());
        let mac_family = name
            .name_record()
            .iter()
            .find(|r| r.platform_id() == 1)
            .unwrap()
            .string(name.string_data())
            .unwrap()
            .chars()
            .collect::<String>();
        assert_eq!("RobotoFallbackPass", mac_family);
    }

    #[test]
    fn duplicate_name_records_keep_the_first() {
        let record = |name_id, value: &str| NameRecord {
            name_id,
            platform_id: 3,
            encoding_id: 1,
            language_id: 0x409,
            string: OffsetMarker::new(value.to_string()),
        };
        let sorted = sorted_records(vec![
            record(NameId::FULL_NAME, "b"),
            record(NameId::FAMILY_NAME, "a"),
            record(NameId::FULL_NAME, "c"),
        ]);
        assert_eq!(
            vec![record(NameId::FAMILY_NAME, "a"), record(NameId::FULL_NAME, "b")],
            sorted
        );
    }

    #[test]
    fn pass_variant_substitutions() {
        let buf = build(FallbackVariant::Pass);
        assert_eq!(
            vec![(F, vec![F, A, I, L]), (P, vec![P, A, S, S])],
            liga_sequences(&buf)
        );
    }

    #[test]
    fn fail_variant_substitutions() {
        let buf = build(FallbackVariant::Fail);
        assert_eq!(
            vec![(F, vec![P, A, S, S]), (P, vec![F, A, I, L])],
            liga_sequences(&buf)
        );
    }

    #[test]
    fn missing_character_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("Roboto-Regular.ttf");
        let cmap = Cmap::from_mappings([('A', GlyphId::new(1))]).unwrap();
        let mut builder = FontBuilder::new();
        builder.add_raw(Cmap::TAG, dump_table(&cmap).unwrap());
        fs::write(&source, builder.build()).unwrap();

        assert!(matches!(
            build_fallback_font(&source, temp_dir.path(), FallbackVariant::Pass),
            Err(Error::MissingGlyph('F'))
        ));
    }

    #[test]
    fn missing_name_table_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("Roboto-Regular.ttf");
        let mappings = RETAINED_CHARS
            .iter()
            .zip(1u32..)
            .map(|(c, gid)| (*c, GlyphId::new(gid)));
        let cmap = Cmap::from_mappings(mappings).unwrap();
        let mut builder = FontBuilder::new();
        builder.add_raw(Cmap::TAG, dump_table(&cmap).unwrap());
        fs::write(&source, builder.build()).unwrap();

        assert!(matches!(
            build_fallback_font(&source, temp_dir.path(), FallbackVariant::Pass),
            Err(Error::MissingTable { tag, .. }) if tag == Tag::new(b"name")
        ));
    }
}
