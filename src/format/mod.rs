//! Loaders and writers for each of the supported mapping dialects.
//!
//! Every dialect implements [MappingsFormat](trait.MappingsFormat.html),
//! loading complete text into a table and writing a table back out
//! in a form the same dialect can load again.
use std::io::{self, Read, Write};
use std::fs;
use std::path::Path;

use crate::{Kind, Table, MappingsError, FormatError};
use crate::table::KindMappings;

mod obf;
mod blobf;
mod srg;
mod mcp_csv;
mod onf;
mod enigma;
pub mod import;

pub use self::obf::{ObfFormat, SidedObfFormat};
pub use self::blobf::BlObfFormat;
pub use self::srg::SrgFormat;
pub use self::mcp_csv::{McpCsvFormat, BOTH_SIDES};
pub use self::onf::{OnfFormat, OnfReport, Transformation, ImportFailure};
pub use self::enigma::EnigmaFormat;

pub trait MappingsFormat {
    /// Load the mappings in the specified text into the table
    ///
    /// Unless `overwrite` is specified, mappings conflicting with existing entries are skipped.
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError>;
    /// Write the table in a form this format can load again
    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError>;
    fn load_stream(&self, reader: &mut dyn Read, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)
            .map_err(|cause| MappingsError::resource("Unable to read mappings", cause))?;
        self.load(&text, table, overwrite)
    }
    fn load_path(&self, path: &Path, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let text = fs::read_to_string(path)
            .map_err(|cause| MappingsError::resource(format!("Unable to read {}", path.display()), cause))?;
        self.load(&text, table, overwrite)
    }
    fn store_string(&self, table: &Table) -> Result<String, MappingsError> {
        let mut buffer = Vec::new();
        self.store(table, &mut buffer)?;
        String::from_utf8(buffer).map_err(|cause| {
            MappingsError::resource("Unable to write mappings", io::Error::new(io::ErrorKind::InvalidData, cause))
        })
    }
}

/// Whether the line should be skipped, either because it's blank or a comment
#[inline]
pub(crate) fn is_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with("//")
}

/// Iterate over the meaningful lines of the text, together with their one-based line numbers
#[inline]
pub(crate) fn numbered_lines(text: &str) -> impl Iterator<Item=(usize, &str)> {
    text.lines().enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|&(_, line)| !is_comment(line))
}

#[inline]
pub(crate) fn parse_kind(line_number: usize, line: &str, alias: &str) -> Result<Kind, FormatError> {
    Kind::from_alias(alias).ok_or_else(|| {
        FormatError::new(line_number, line, format!("Unrecognized kind {:?}", alias))
    })
}

/// Convert an internal name like `net/minecraft/World` to `net.minecraft.World`
#[inline]
pub(crate) fn dotted(name: &str) -> String {
    name.replace('/', ".")
}

#[inline]
pub(crate) fn slashed(name: &str) -> String {
    name.replace('.', "/")
}

/// The mappings which should be written, in the order they should be written
pub(crate) fn storable(table: &Table) -> impl Iterator<Item=(Kind, &KindMappings)> {
    Kind::STORABLE.iter().filter_map(move |&kind| {
        table.try_mappings(kind).map(|mappings| (kind, mappings))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn comments() {
        assert!(is_comment(""));
        assert!(is_comment("   \t"));
        assert!(is_comment("# comment"));
        assert!(is_comment("  // comment"));
        assert!(!is_comment("CLASS:a=b"));
        assert!(!is_comment("/ not a comment"));
    }
    #[test]
    fn line_numbers() {
        let text = "# header\nCLASS:a=b\n\n  // note\nFIELD:a.c=b.d\n";
        assert_eq!(
            numbered_lines(text).collect::<Vec<_>>(),
            vec![(2, "CLASS:a=b"), (5, "FIELD:a.c=b.d")]
        );
    }
    #[test]
    fn storable_order() {
        let mut table = Table::new();
        table.add_two_way("a.b (I)V", "Foo.bar (I)V", Kind::Method, false);
        table.add_two_way("a.c", "Foo.baz", Kind::Field, false);
        table.add_two_way("a", "Foo", Kind::Class, false);
        let kinds = storable(&table).map(|(kind, _)| kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![Kind::Class, Kind::Field, Kind::Method]);
    }
}
