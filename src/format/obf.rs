use std::io::Write;

use log::debug;

use crate::{Kind, Table, MappingsError, FormatError};
use super::{MappingsFormat, numbered_lines, parse_kind, storable};

/// The flat format, with one `KIND:OBF=DEOBF` mapping per line
///
/// Lines separating the names with a colon (`KIND:OBF:DEOBF`) are also accepted.
#[derive(Copy, Clone, Debug, Default)]
pub struct ObfFormat;
impl MappingsFormat for ObfFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let mut added = 0;
        for (line_number, line) in numbered_lines(text) {
            let (prefix, obf, deobf) = split_line(line_number, line)?;
            let kind = parse_kind(line_number, line, prefix)?;
            if table.add_two_way(obf, deobf, kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} flat mappings", added);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        for (kind, mappings) in storable(table) {
            for entry in mappings.iter() {
                writeln!(out, "{}:{}={}", kind, entry.obf(), entry.deobf())?;
            }
        }
        Ok(())
    }
}

/// The flat format with an additional side on each line, like `KIND.SIDE:OBF=DEOBF`
///
/// Only the mappings of the configured side are loaded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SidedObfFormat {
    side: String
}
impl SidedObfFormat {
    #[inline]
    pub fn new<S: Into<String>>(side: S) -> SidedObfFormat {
        SidedObfFormat { side: side.into() }
    }
    #[inline]
    pub fn side(&self) -> &str {
        &self.side
    }
}
impl MappingsFormat for SidedObfFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let (mut added, mut skipped) = (0, 0);
        for (line_number, line) in numbered_lines(text) {
            let (prefix, obf, deobf) = split_line(line_number, line)?;
            let dot = prefix.find('.').ok_or_else(|| {
                FormatError::new(line_number, line, "Missing side")
            })?;
            let kind = parse_kind(line_number, line, &prefix[..dot])?;
            if &prefix[dot + 1..] != self.side {
                skipped += 1;
                continue;
            }
            if table.add_two_way(obf, deobf, kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} sided mappings for side {}, skipping {} from other sides", added, self.side, skipped);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        for (kind, mappings) in storable(table) {
            for entry in mappings.iter() {
                writeln!(out, "{}.{}:{}={}", kind, self.side, entry.obf(), entry.deobf())?;
            }
        }
        Ok(())
    }
}

/// Split a flat line into its prefix and names
fn split_line(line_number: usize, line: &str) -> Result<(&str, &str, &str), FormatError> {
    let trimmed = line.trim();
    let invalid = |reason: &str| FormatError::new(line_number, line, reason);
    let colon = trimmed.find(':').ok_or_else(|| invalid("Missing kind"))?;
    let (prefix, names) = (&trimmed[..colon], &trimmed[colon + 1..]);
    let (obf, deobf) = if let Some(equals) = names.find('=') {
        (&names[..equals], &names[equals + 1..])
    } else {
        let mut parts = names.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(obf), Some(deobf), None) => (obf, deobf),
            (_, None, _) => return Err(invalid("Missing deobfuscated name")),
            _ => return Err(invalid("Too many names")),
        }
    };
    if obf.is_empty() || deobf.is_empty() {
        return Err(invalid("Empty name"));
    }
    Ok((prefix, obf, deobf))
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn load_flat() {
        let mut table = Table::new();
        ObfFormat.load(
            "# comment\nCLASS:a.b:com.example.Foo\nFIELD:a.b.c=com.example.Foo.bar\n\
            md:a.b.d (La/b;)V=com.example.Foo.baz (Lcom/example/Foo;)V\n",
            &mut table, false
        ).unwrap();
        assert_eq!(table.lookup_deobf("a.b", Kind::Class).unwrap(), Some("com.example.Foo"));
        assert_eq!(table.lookup_deobf("a.b.c", Kind::Field).unwrap(), Some("com.example.Foo.bar"));
        assert_eq!(
            table.lookup_obf("com.example.Foo.baz (Lcom/example/Foo;)V", Kind::Method).unwrap(),
            Some("a.b.d (La/b;)V")
        );
    }
    #[test]
    fn invalid_flat_lines() {
        let error = |text: &str| {
            match ObfFormat.load(text, &mut Table::new(), false).unwrap_err() {
                MappingsError::Format(e) => e,
                e => panic!("Unexpected error {}", e)
            }
        };
        let e = error("CLASS:a=b\nWHATEVER:a=b");
        assert_eq!(e.line(), 2);
        assert_eq!(e.text(), "WHATEVER:a=b");
        assert_eq!(error("CLASS a b").reason(), "Missing kind");
        assert_eq!(error("CLASS:a").reason(), "Missing deobfuscated name");
        assert_eq!(error("CLASS:a:b:c").reason(), "Too many names");
        assert_eq!(error("CLASS:=b").reason(), "Empty name");
    }
    #[test]
    fn store_flat() {
        let mut table = Table::new();
        table.add_two_way("a.b (I)V", "Foo.bar (I)V", Kind::Method, false);
        table.add_two_way("a", "Foo", Kind::Class, false);
        assert_eq!(
            ObfFormat.store_string(&table).unwrap(),
            "CLASS:a=Foo\nMETHOD:a.b (I)V=Foo.bar (I)V\n"
        );
    }
    #[test]
    fn sided() {
        let format = SidedObfFormat::new("0");
        let mut table = Table::new();
        format.load("CLASS.0:a=Client\nCLASS.1:b=Server\nFIELD.0:a.c=Client.d\n", &mut table, false).unwrap();
        assert!(table.has_obf("a", Kind::Class));
        assert!(!table.has_obf("b", Kind::Class));
        assert_eq!(format.store_string(&table).unwrap(), "CLASS.0:a=Client\nFIELD.0:a.c=Client.d\n");
        match format.load("CLASS:a=b", &mut table, false) {
            Err(MappingsError::Format(ref e)) => assert_eq!(e.reason(), "Missing side"),
            other => panic!("Unexpected result {:?}", other)
        }
    }
}
