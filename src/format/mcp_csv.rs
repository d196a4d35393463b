use std::io::{self, Write};

use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::{Kind, Table, MappingsError, FormatError};
use super::{MappingsFormat, is_comment};

/// The side marker for mappings present on both the client and server
pub const BOTH_SIDES: u32 = 2;

/// The spreadsheet format of the MCP `fields.csv` and `methods.csv` files
///
/// Each row maps an intermediate name to its deobfuscated name,
/// with the header `searge,name,side,desc`.
/// Every row is of the single kind the format is configured with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct McpCsvFormat {
    kind: Kind,
    side: Option<u32>
}
impl McpCsvFormat {
    #[inline]
    pub fn new(kind: Kind) -> McpCsvFormat {
        McpCsvFormat { kind, side: None }
    }
    #[inline]
    pub fn fields() -> McpCsvFormat {
        McpCsvFormat::new(Kind::Field)
    }
    #[inline]
    pub fn methods() -> McpCsvFormat {
        McpCsvFormat::new(Kind::Method)
    }
    /// Only load the rows of the specified side, along with the rows present on both sides
    #[inline]
    pub fn with_side(mut self, side: u32) -> McpCsvFormat {
        self.side = Some(side);
        self
    }
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }
    #[inline]
    pub fn side(&self) -> Option<u32> {
        self.side
    }
    fn accepts_side(&self, side: u32) -> bool {
        match self.side {
            Some(expected) => side == expected || side == BOTH_SIDES,
            None => true
        }
    }
}
#[derive(Debug, Deserialize)]
struct CsvRecord {
    searge: String,
    name: String,
    side: u32
}
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    searge: &'a str,
    name: &'a str,
    side: u32,
    desc: &'a str
}
impl MappingsFormat for McpCsvFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        // Blank out the comments, keeping the line numbers intact
        let cleaned = text.lines()
            .map(|line| if is_comment(line) { "" } else { line })
            .collect::<Vec<_>>()
            .join("\n");
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::All)
            .from_reader(cleaned.as_bytes());
        let headers = reader.headers()
            .map_err(|e| csv_format_error(text, &e, None))?
            .clone();
        let (mut added, mut skipped) = (0, 0);
        let mut row = ::csv::StringRecord::new();
        while reader.read_record(&mut row).map_err(|e| csv_format_error(text, &e, None))? {
            let line = row.position().map(|position| position.line() as usize);
            let record: CsvRecord = row.deserialize(Some(&headers))
                .map_err(|e| csv_format_error(text, &e, line))?;
            if record.searge.is_empty() || record.name.is_empty() {
                let (line, contents) = source_line(text, line);
                return Err(FormatError::new(line, contents, "Empty name").into());
            }
            if !self.accepts_side(record.side) {
                skipped += 1;
                continue;
            }
            if table.add_two_way(record.searge, record.name, self.kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} {} names from csv, skipping {} from other sides", added, self.kind, skipped);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(&["searge", "name", "side", "desc"]).map_err(csv_write_error)?;
        let side = self.side.unwrap_or(BOTH_SIDES);
        for entry in table.try_mappings(self.kind).into_iter().flat_map(|mappings| mappings.iter()) {
            writer.serialize(CsvRow {
                searge: entry.obf(),
                name: entry.deobf(),
                side, desc: ""
            }).map_err(csv_write_error)?;
        }
        writer.flush().map_err(|cause| MappingsError::resource("Unable to write mappings", cause))?;
        Ok(())
    }
}

fn csv_write_error(e: ::csv::Error) -> MappingsError {
    MappingsError::resource("Unable to write mappings", io::Error::from(e))
}

fn csv_format_error(text: &str, e: &::csv::Error, line: Option<usize>) -> FormatError {
    let line = line.or_else(|| e.position().map(|position| position.line() as usize));
    let (line, contents) = source_line(text, line);
    let reason = match *e.kind() {
        ::csv::ErrorKind::Deserialize { ref err, .. } => format!("Invalid row: {}", err),
        ::csv::ErrorKind::UnequalLengths { expected_len, len, .. } => {
            format!("Expected {} columns, but got {}", expected_len, len)
        },
        _ => e.to_string()
    };
    FormatError::new(line, contents, reason)
}

/// Find the one-based line number and contents of the specified line, defaulting to the last line
fn source_line(text: &str, line: Option<usize>) -> (usize, &str) {
    let line = line.unwrap_or_else(|| text.lines().count()).max(1);
    (line, text.lines().nth(line - 1).unwrap_or(""))
}
