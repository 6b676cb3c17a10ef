//! Table level editing of existing font files.
//!
//! Parsing and assembly are left to read-fonts and write-fonts; this only
//! tracks which tables a fixture replaces.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use write_fonts::{
    dump_table,
    read::{FontRef, TopLevelTable},
    types::Tag,
    validate::Validate,
    FontBuilder, FontWrite,
};

use crate::error::Error;

/// A font loaded from disk, plus any tables staged to replace or drop its own.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
    data: Vec<u8>,
    replaced: BTreeMap<Tag, Vec<u8>>,
    removed: BTreeSet<Tag>,
}

/// The raw payload of one table.
///
/// Tables this tool has no schema for (e.g. `IFT `) are only ever edited
/// through this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    tag: Tag,
    bytes: Vec<u8>,
}

impl TableData {
    pub fn new(tag: Tag, bytes: Vec<u8>) -> TableData {
        TableData { tag, bytes }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }

    pub fn set_byte(&mut self, offset: usize, value: u8) -> Result<(), Error> {
        let len = self.bytes.len();
        let byte = self.bytes.get_mut(offset).ok_or(Error::ByteOutOfRange {
            tag: self.tag,
            offset,
            len,
        })?;
        *byte = value;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl FontFile {
    pub fn load(path: &Path) -> Result<FontFile, Error> {
        if !path.is_file() {
            return Err(Error::FileExpected(path.to_path_buf()));
        }
        let data = fs::read(path).map_err(Error::io(path))?;
        FontRef::new(&data).map_err(|source| Error::ReadFont {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded {} byte font from {path:?}", data.len());
        Ok(FontFile {
            path: path.to_path_buf(),
            data,
            replaced: Default::default(),
            removed: Default::default(),
        })
    }

    /// The path this font was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A view of the font as it was loaded, ignoring staged replacements.
    pub fn font_ref(&self) -> Result<FontRef<'_>, Error> {
        FontRef::new(&self.data).map_err(|source| Error::ReadFont {
            path: self.path.clone(),
            source,
        })
    }

    pub fn contains(&self, tag: Tag) -> bool {
        if self.removed.contains(&tag) {
            return false;
        }
        self.replaced.contains_key(&tag)
            || self
                .font_ref()
                .map(|font| font.table_data(tag).is_some())
                .unwrap_or_default()
    }

    /// A copy of the current bytes of a table, including staged replacements.
    pub fn table(&self, tag: Tag) -> Result<TableData, Error> {
        if let Some(bytes) = self.replaced.get(&tag) {
            return Ok(TableData {
                tag,
                bytes: bytes.clone(),
            });
        }
        let font = self.font_ref()?;
        let data = font
            .table_data(tag)
            .filter(|_| !self.removed.contains(&tag))
            .ok_or_else(|| Error::MissingTable {
                path: self.path.clone(),
                tag,
            })?;
        Ok(TableData {
            tag,
            bytes: data.as_bytes().to_vec(),
        })
    }

    pub fn replace_table(&mut self, table: TableData) {
        self.removed.remove(&table.tag);
        self.replaced.insert(table.tag, table.bytes);
    }

    /// Leave `tag` out of the saved font. A no-op if there is no such table.
    pub fn remove_table(&mut self, tag: Tag) {
        self.replaced.remove(&tag);
        self.removed.insert(tag);
    }

    /// Compile a write-fonts table and stage it in place of the existing one
    pub fn replace_with<T>(&mut self, table: &T) -> Result<(), Error>
    where
        T: FontWrite + Validate + TopLevelTable,
    {
        let bytes = dump_table(table).map_err(|e| Error::DumpTable {
            tag: T::TAG,
            reason: e.to_string(),
        })?;
        self.removed.remove(&T::TAG);
        self.replaced.insert(T::TAG, bytes);
        Ok(())
    }

    /// Assemble the font with every staged table and write it to `path`.
    ///
    /// Overwrites whatever is at `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let font = self.font_ref()?;
        let mut builder = FontBuilder::new();
        for (tag, bytes) in self.replaced.iter() {
            builder.add_raw(*tag, bytes.as_slice());
        }
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if self.removed.contains(&tag) || self.replaced.contains_key(&tag) {
                continue;
            }
            if let Some(data) = font.table_data(tag) {
                builder.add_raw(tag, data.as_bytes());
            }
        }
        let bytes = builder.build();
        debug!("Assembled {} byte font for {path:?}", bytes.len());
        fs::write(path, bytes).map_err(Error::io(path))
    }
}
