use std::io::Write;

use log::debug;

use crate::{Kind, Table, MappingsError, FormatError};
use crate::descriptor::split_member;
use super::{MappingsFormat, numbered_lines, parse_kind, storable};

/// The three-way flat format, which also carries the intermediate names
///
/// Most mappings are written as `KIND:OBF:SRG:DEOBF`,
/// while methods give each name together with its descriptor:
/// `METHOD:obf:odesc:srg:sdesc:deobf:ddesc`.
/// Methods without any descriptors are also written in the shorter form.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BlObfFormat {
    strip_descriptors: bool
}
impl BlObfFormat {
    #[inline]
    pub fn new() -> BlObfFormat {
        BlObfFormat { strip_descriptors: false }
    }
    /// Load the method names without their descriptors
    #[inline]
    pub fn without_descriptors() -> BlObfFormat {
        BlObfFormat { strip_descriptors: true }
    }
    #[inline]
    pub fn strips_descriptors(&self) -> bool {
        self.strip_descriptors
    }
    fn method_name(&self, name: &str, descriptor: &str) -> String {
        if self.strip_descriptors {
            name.into()
        } else {
            format!("{} {}", name, descriptor)
        }
    }
}
impl MappingsFormat for BlObfFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let mut added = 0;
        for (line_number, line) in numbered_lines(text) {
            let parts = line.trim().split(':').collect::<Vec<_>>();
            let kind = parse_kind(line_number, line, parts[0])?;
            if parts[1..].iter().any(|part| part.is_empty()) {
                return Err(FormatError::new(line_number, line, "Empty name").into());
            }
            let (obf, intermediate, deobf) = match parts.len() {
                4 => (parts[1].to_owned(), parts[2].to_owned(), parts[3].to_owned()),
                7 if kind.has_descriptor() => (
                    self.method_name(parts[1], parts[2]),
                    self.method_name(parts[3], parts[4]),
                    self.method_name(parts[5], parts[6])
                ),
                _ => return Err(FormatError::new(
                    line_number, line,
                    format!("Unexpected number of parts for {}: {}", kind, parts.len())
                ).into())
            };
            if table.add_three_way(obf, intermediate, deobf, kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} three-way flat mappings", added);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        for (kind, mappings) in storable(table) {
            for entry in mappings.iter() {
                let intermediate = entry.intermediate().unwrap_or_else(|| entry.deobf());
                let names = [entry.obf(), intermediate, entry.deobf()];
                write!(out, "{}", kind)?;
                for &name in &names {
                    match split_member(name) {
                        (name, Some(descriptor)) if kind.has_descriptor() => {
                            write!(out, ":{}:{}", name, descriptor)?;
                        },
                        _ => write!(out, ":{}", name)?,
                    }
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    const TEXT: &str = "\
CLASS:a:net.minecraft.World:net.minecraft.World
FIELD:a.b:net.minecraft.World.field_1_b:net.minecraft.World.time
METHOD:a.c:(La;)V:net.minecraft.World.func_2_c:(Lnet/minecraft/World;)V:net.minecraft.World.tick:(Lnet/minecraft/World;)V
";
    #[test]
    fn load() {
        let mut table = Table::with_intermediate();
        BlObfFormat::new().load(TEXT, &mut table, false).unwrap();
        assert_eq!(
            table.lookup_intermediate("a.b", Kind::Field).unwrap(),
            Some("net.minecraft.World.field_1_b")
        );
        let entry = table.entry_by_obf("a.c (La;)V", Kind::Method).unwrap().unwrap();
        assert_eq!(entry.intermediate(), Some("net.minecraft.World.func_2_c (Lnet/minecraft/World;)V"));
        assert_eq!(entry.deobf(), "net.minecraft.World.tick (Lnet/minecraft/World;)V");
        assert_eq!(BlObfFormat::new().store_string(&table).unwrap(), TEXT);
    }
    #[test]
    fn strip_descriptors() {
        let mut table = Table::with_intermediate();
        BlObfFormat::without_descriptors().load(TEXT, &mut table, false).unwrap();
        assert_eq!(table.lookup_deobf("a.c", Kind::Method).unwrap(), Some("net.minecraft.World.tick"));
        let text = BlObfFormat::new().store_string(&table).unwrap();
        assert!(text.ends_with("METHOD:a.c:net.minecraft.World.func_2_c:net.minecraft.World.tick\n"));
        let mut reloaded = Table::with_intermediate();
        BlObfFormat::new().load(&text, &mut reloaded, false).unwrap();
        assert_eq!(reloaded.lookup_intermediate("a.c", Kind::Method).unwrap(), Some("net.minecraft.World.func_2_c"));
    }
    #[test]
    fn invalid() {
        let error = |text: &str| match BlObfFormat::new().load(text, &mut Table::new(), false) {
            Err(MappingsError::Format(e)) => e,
            other => panic!("Unexpected result {:?}", other)
        };
        assert_eq!(error("CLASS:a:b").reason(), "Unexpected number of parts for CLASS: 3");
        assert_eq!(error("FIELD:a:b:c:d:e:f").reason(), "Unexpected number of parts for FIELD: 7");
        assert_eq!(error("CLASS:a::b").reason(), "Empty name");
        assert_eq!(error("THING:a:b:c").reason(), "Unrecognized kind \"THING\"");
    }
}
