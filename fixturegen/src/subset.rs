//! Glyph subsetting for TrueType fonts.
//!
//! Keeps `.notdef`, the requested glyphs and every glyph their composites
//! reference, renumbered densely in their original order. `glyf`, `loca`,
//! `hmtx` and the counts in `head`, `hhea` and `maxp` are rebuilt; `post`
//! loses its glyph names. Other tables that index glyphs are dropped, the
//! caller rebuilds any it needs against [`GlyphMap`].

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use write_fonts::{
    from_obj::FromTableRef,
    read::{
        tables::{
            glyf::{Glyf as ReadGlyf, Glyph as ReadGlyph},
            loca::Loca as ReadLoca,
        },
        ReadError, TableProvider, TopLevelTable,
    },
    tables::{
        glyf::{Component, CompositeGlyph, GlyfLocaBuilder, Glyph},
        head::Head,
        hhea::Hhea,
        hmtx::Hmtx,
        loca::LocaFormat,
        maxp::Maxp,
        post::Post,
        vmtx::LongMetric,
    },
    types::{GlyphId, GlyphId16, Tag, Version16Dot16},
};

use crate::{error::Error, font::FontFile};

const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");

/// Tables a TrueType subset cannot do without
const REQUIRED: &[Tag] = &[
    GLYF,
    LOCA,
    Head::TAG,
    Hhea::TAG,
    Hmtx::TAG,
    Maxp::TAG,
];

/// Tables that refer to glyphs by id and are not renumbered here
const GLYPH_INDEXED: &[Tag] = &[
    Tag::new(b"GSUB"),
    Tag::new(b"GPOS"),
    Tag::new(b"GDEF"),
    Tag::new(b"JSTF"),
    Tag::new(b"MATH"),
    Tag::new(b"kern"),
    Tag::new(b"hdmx"),
    Tag::new(b"LTSH"),
    Tag::new(b"VDMX"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
    Tag::new(b"VORG"),
    Tag::new(b"gvar"),
    Tag::new(b"HVAR"),
    Tag::new(b"VVAR"),
    Tag::new(b"COLR"),
    Tag::new(b"CBDT"),
    Tag::new(b"CBLC"),
    Tag::new(b"EBDT"),
    Tag::new(b"EBLC"),
    Tag::new(b"EBSC"),
    Tag::new(b"sbix"),
    Tag::new(b"SVG "),
    Tag::new(b"morx"),
    Tag::new(b"DSIG"),
];

/// Old glyph ids to new ones. Both ascend together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMap(BTreeMap<GlyphId, GlyphId16>);

impl GlyphMap {
    fn new(kept: BTreeSet<GlyphId>) -> Result<GlyphMap, Error> {
        kept.into_iter()
            .enumerate()
            .map(|(new, old)| {
                u16::try_from(new)
                    .map(|new| (old, GlyphId16::new(new)))
                    .map_err(|_| Error::GlyphIdOverflow(new as u32))
            })
            .collect::<Result<_, _>>()
            .map(GlyphMap)
    }

    /// The new id of `old`, if it was kept
    pub fn get(&self, old: GlyphId) -> Option<GlyphId16> {
        self.0.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Kept glyphs in their original order
    pub fn old_ids(&self) -> impl Iterator<Item = GlyphId> + '_ {
        self.0.keys().copied()
    }

    fn num_glyphs(&self) -> Result<u16, Error> {
        u16::try_from(self.len()).map_err(|_| Error::GlyphIdOverflow(self.len() as u32))
    }
}

/// Reduce `font` to `glyphs`, `.notdef` and their component closure.
pub fn subset_glyphs(
    font: &mut FontFile,
    glyphs: impl IntoIterator<Item = GlyphId>,
) -> Result<GlyphMap, Error> {
    for tag in REQUIRED {
        if !font.contains(*tag) {
            return Err(Error::MissingTable {
                path: font.path().to_path_buf(),
                tag: *tag,
            });
        }
    }
    let path = font.path().to_path_buf();
    let read_err = |source: ReadError| Error::ReadFont {
        path: path.clone(),
        source,
    };

    let (map, glyf, loca, head, hhea, hmtx, maxp, post) = {
        let font_ref = font.font_ref()?;
        let read_glyf = font_ref.glyf().map_err(read_err)?;
        let read_loca = font_ref.loca(None).map_err(read_err)?;
        let map = GlyphMap::new(closure(glyphs, &read_loca, &read_glyf).map_err(read_err)?)?;
        let num_glyphs = map.num_glyphs()?;

        let mut builder = GlyfLocaBuilder::new();
        for old in map.old_ids() {
            let glyph = match read_loca.get_glyf(old, &read_glyf).map_err(read_err)? {
                None => Glyph::Empty,
                Some(glyph) => match Glyph::from_table_ref(&glyph) {
                    Glyph::Composite(composite) => Glyph::Composite(renumbered(&composite, &map)?),
                    glyph => glyph,
                },
            };
            builder.add_glyph(&glyph).map_err(|e| Error::DumpTable {
                tag: GLYF,
                reason: format!("glyph {}: {e}", old.to_u32()),
            })?;
        }
        let (glyf, loca, loca_format) = builder.build();

        let mut head = Head::from_table_ref(&font_ref.head().map_err(read_err)?);
        head.index_to_loc_format = match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };

        let read_hmtx = font_ref.hmtx().map_err(read_err)?;
        let h_metrics = map
            .old_ids()
            .map(|gid| LongMetric {
                advance: read_hmtx.advance(gid).unwrap_or_default(),
                side_bearing: read_hmtx.side_bearing(gid).unwrap_or_default(),
            })
            .collect();
        let hmtx = Hmtx::new(h_metrics, Vec::new());

        let mut hhea = Hhea::from_table_ref(&font_ref.hhea().map_err(read_err)?);
        hhea.number_of_h_metrics = num_glyphs;

        let mut maxp = Maxp::from_table_ref(&font_ref.maxp().map_err(read_err)?);
        maxp.num_glyphs = num_glyphs;

        // glyph names are indexed by the old ids
        let post = if font.contains(Post::TAG) {
            let mut post = Post::from_table_ref(&font_ref.post().map_err(read_err)?);
            post.version = Version16Dot16::VERSION_3_0;
            post.num_glyphs = None;
            post.glyph_name_index = None;
            post.string_data = None;
            Some(post)
        } else {
            None
        };

        (map, glyf, loca, head, hhea, hmtx, maxp, post)
    };

    font.replace_with(&glyf)?;
    font.replace_with(&loca)?;
    font.replace_with(&head)?;
    font.replace_with(&hhea)?;
    font.replace_with(&hmtx)?;
    font.replace_with(&maxp)?;
    if let Some(post) = post {
        font.replace_with(&post)?;
    }
    for tag in GLYPH_INDEXED {
        if font.contains(*tag) {
            debug!("Dropping '{tag}' from {:?}", font.path());
            font.remove_table(*tag);
        }
    }
    debug!("Subset {:?} to {} glyphs", font.path(), map.len());
    Ok(map)
}

/// `.notdef`, `glyphs` and every glyph reachable through composites
fn closure<'a>(
    glyphs: impl IntoIterator<Item = GlyphId>,
    loca: &ReadLoca<'a>,
    glyf: &ReadGlyf<'a>,
) -> Result<BTreeSet<GlyphId>, ReadError> {
    let mut kept = BTreeSet::new();
    let mut frontier: Vec<_> = std::iter::once(GlyphId::NOTDEF).chain(glyphs).collect();
    while let Some(gid) = frontier.pop() {
        if !kept.insert(gid) {
            continue;
        }
        if let Some(ReadGlyph::Composite(composite)) = loca.get_glyf(gid, glyf)? {
            frontier.extend(composite.components().map(|c| GlyphId::from(c.glyph)));
        }
    }
    Ok(kept)
}

/// A copy of `composite` whose components use new glyph ids
fn renumbered(composite: &CompositeGlyph, map: &GlyphMap) -> Result<CompositeGlyph, Error> {
    let components = composite
        .components()
        .iter()
        .map(|component| {
            let old = GlyphId::from(component.glyph);
            let glyph = map.get(old).ok_or(Error::UnmappedGlyph(old.to_u32()))?;
            Ok((
                Component {
                    glyph,
                    ..component.clone()
                },
                composite.bbox,
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    CompositeGlyph::try_from_iter(components).map_err(|e| Error::DumpTable {
        tag: GLYF,
        reason: e.to_string(),
    })
}
