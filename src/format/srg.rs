use std::io::Write;

use log::{debug, trace};

use crate::{Kind, Table, MappingsError, FormatError};
use crate::descriptor::split_member;
use super::{MappingsFormat, numbered_lines, parse_kind, storable, dotted, slashed};

/// The columnar srg format, like `CL: a net/minecraft/World`
///
/// Methods are given with their descriptors, either as `MD: a/b (I)V net/x/Foo/bar (I)V`
/// or with the class split from the method name: `MD: a/b c (I)V net/x/Foo bar (I)V`.
/// Each line may end with a `#SIDE` marker,
/// which is skipped when it doesn't match the configured side.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SrgFormat {
    side: Option<String>,
    strip_descriptors: bool
}
impl SrgFormat {
    #[inline]
    pub fn new() -> SrgFormat {
        SrgFormat::default()
    }
    /// Only load the unsided mappings and the mappings of the specified side,
    /// marking every written mapping with the side.
    #[inline]
    pub fn with_side<S: Into<String>>(mut self, side: S) -> SrgFormat {
        self.side = Some(side.into());
        self
    }
    /// Load the method names without their descriptors
    #[inline]
    pub fn without_descriptors(mut self) -> SrgFormat {
        self.strip_descriptors = true;
        self
    }
    #[inline]
    pub fn side(&self) -> Option<&str> {
        self.side.as_ref().map(String::as_str)
    }
    #[inline]
    pub fn strips_descriptors(&self) -> bool {
        self.strip_descriptors
    }
    fn accepts_side(&self, side: &str) -> bool {
        match self.side {
            Some(ref expected) => side.is_empty() || side == expected,
            None => true
        }
    }
    fn method_name(&self, class: Option<&str>, name: &str, descriptor: Option<&str>) -> String {
        let mut result = match class {
            Some(class) => format!("{} {}", dotted(class), name),
            None => dotted(name)
        };
        if let Some(descriptor) = descriptor {
            if !self.strip_descriptors {
                result.push(' ');
                result.push_str(descriptor);
            }
        }
        result
    }
    fn parse_method(&self, names: &[&str]) -> Option<(String, String)> {
        Some(match names.len() {
            2 => (self.method_name(None, names[0], None), self.method_name(None, names[1], None)),
            4 if names[1].starts_with('(') => (
                self.method_name(None, names[0], Some(names[1])),
                self.method_name(None, names[2], Some(names[3]))
            ),
            4 => (
                self.method_name(Some(names[0]), names[1], None),
                self.method_name(Some(names[2]), names[3], None)
            ),
            6 => (
                self.method_name(Some(names[0]), names[1], Some(names[2])),
                self.method_name(Some(names[3]), names[4], Some(names[5]))
            ),
            _ => return None
        })
    }
}
impl MappingsFormat for SrgFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let (mut added, mut skipped) = (0, 0);
        for (line_number, line) in numbered_lines(text) {
            let mut tokens = line.split_whitespace().collect::<Vec<_>>();
            let side = match tokens.last() {
                Some(&token) if token.starts_with('#') => Some(&token[1..]),
                _ => None
            };
            if side.is_some() {
                tokens.pop();
            }
            let side = side.unwrap_or("");
            if tokens.len() < 3 {
                return Err(FormatError::new(line_number, line, "Not enough sections").into());
            }
            let kind = parse_kind(line_number, line, tokens[0].trim_end_matches(':'))?;
            let names = &tokens[1..];
            let parsed = if kind.has_descriptor() {
                self.parse_method(names)
            } else if names.len() == 2 {
                Some((dotted(names[0]), dotted(names[1])))
            } else {
                None
            };
            let (obf, deobf) = parsed.ok_or_else(|| FormatError::new(
                line_number, line,
                format!("Unexpected number of sections for {}: {}", kind, names.len())
            ))?;
            if !self.accepts_side(side) {
                trace!("Skipping {} {} on side {}", kind, obf, side);
                skipped += 1;
                continue;
            }
            if table.add_two_way(obf, deobf, kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} srg mappings, skipping {} from other sides", added, skipped);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        for (kind, mappings) in storable(table) {
            for entry in mappings.iter() {
                write!(
                    out, "{}: {} {}", kind.short_name(),
                    srg_name(kind, entry.obf()),
                    srg_name(kind, entry.deobf())
                )?;
                if let Some(ref side) = self.side {
                    write!(out, " #{}", side)?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

fn srg_name(kind: Kind, name: &str) -> String {
    match kind {
        // The default package is written as a single character like `.`
        Kind::Package if name.len() == 1 => name.into(),
        Kind::Method | Kind::Constructor => {
            let (name, descriptor) = split_member(name);
            let mut result = match name.find(' ') {
                Some(index) => format!("{} {}", slashed(&name[..index]), &name[index + 1..]),
                None => slashed(name)
            };
            if let Some(descriptor) = descriptor {
                result.push(' ');
                result.push_str(descriptor);
            }
            result
        },
        _ => slashed(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn load_srg() {
        let mut table = Table::new();
        SrgFormat::new().load("\
PK: . net/minecraft/src
CL: a net/minecraft/World
FD: a/b net/minecraft/World/time
MD: a/c (La;)V net/minecraft/World/tick (Lnet/minecraft/World;)V
", &mut table, false).unwrap();
        assert_eq!(table.lookup_deobf(".", Kind::Package).unwrap(), Some("net.minecraft.src"));
        assert_eq!(table.lookup_deobf("a", Kind::Class).unwrap(), Some("net.minecraft.World"));
        assert_eq!(table.lookup_deobf("a.b", Kind::Field).unwrap(), Some("net.minecraft.World.time"));
        assert_eq!(
            table.lookup_deobf("a.c (La;)V", Kind::Method).unwrap(),
            Some("net.minecraft.World.tick (Lnet/minecraft/World;)V")
        );
    }
    #[test]
    fn split_methods() {
        let mut table = Table::new();
        SrgFormat::new().load(
            "MD: a/b/c funcname (I)V com/example/Foo realMethod (I)Lcom/example/Bar;",
            &mut table, false
        ).unwrap();
        assert_eq!(
            table.lookup_deobf("a.b.c funcname (I)V", Kind::Method).unwrap(),
            Some("com.example.Foo realMethod (I)Lcom/example/Bar;")
        );
        assert_eq!(
            SrgFormat::new().store_string(&table).unwrap(),
            "MD: a/b/c funcname (I)V com/example/Foo realMethod (I)Lcom/example/Bar;\n"
        );
    }
    #[test]
    fn strip_descriptors() {
        let mut table = Table::new();
        let format = SrgFormat::new().without_descriptors();
        format.load("MD: a/c (La;)V net/minecraft/World/tick (Lnet/minecraft/World;)V", &mut table, false).unwrap();
        format.load("MD: a/b/c funcname (I)V com/example/Foo realMethod (I)V", &mut table, false).unwrap();
        assert_eq!(table.lookup_deobf("a.c", Kind::Method).unwrap(), Some("net.minecraft.World.tick"));
        assert_eq!(table.lookup_deobf("a.b.c funcname", Kind::Method).unwrap(), Some("com.example.Foo realMethod"));
        let text = format.store_string(&table).unwrap();
        assert_eq!(text, "MD: a/c net/minecraft/World/tick\nMD: a/b/c funcname com/example/Foo realMethod\n");
        let mut reloaded = Table::new();
        format.load(&text, &mut reloaded, false).unwrap();
        assert_eq!(reloaded.all_obf(Kind::Method).unwrap(), vec!["a.c", "a.b.c funcname"]);
    }
    #[test]
    fn sides() {
        let text = "CL: a Client #C\nCL: b Server #S\nCL: c Common\n";
        let mut client = Table::new();
        SrgFormat::new().with_side("C").load(text, &mut client, false).unwrap();
        assert_eq!(client.all_obf(Kind::Class).unwrap(), vec!["a", "c"]);
        let mut everything = Table::new();
        SrgFormat::new().load(text, &mut everything, false).unwrap();
        assert_eq!(everything.all_obf(Kind::Class).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            SrgFormat::new().with_side("C").store_string(&client).unwrap(),
            "CL: a Client #C\nCL: c Common #C\n"
        );
    }
    #[test]
    fn invalid() {
        let error = |text: &str| match SrgFormat::new().load(text, &mut Table::new(), false) {
            Err(MappingsError::Format(e)) => e,
            other => panic!("Unexpected result {:?}", other)
        };
        assert_eq!(error("CL: a").reason(), "Not enough sections");
        assert_eq!(error("CL: a b c").reason(), "Unexpected number of sections for CLASS: 3");
        assert_eq!(error("MD: a b c").reason(), "Unexpected number of sections for METHOD: 3");
        assert_eq!(error("XX: a b").reason(), "Unrecognized kind \"XX\"");
    }
}
