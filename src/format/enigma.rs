use std::io::Write;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{Kind, Table, MappingsError, FormatError};
use crate::descriptor::{MethodDescriptor, split_member, split_owner};
use super::{MappingsFormat, numbered_lines, parse_kind, dotted, slashed};

/// The placeholder package of classes in the default package
const DEFAULT_PACKAGE: &str = "none/";

/// The enigma format, with each member given on its own line after its class
///
/// ```text
/// CLASS none/a net/minecraft/World
///     FIELD b time I
///     METHOD c tick (Lnone/a;)V
///     METHOD <init> (Lnone/a;)V
/// ```
///
/// Method descriptors are obfuscated, with their deobfuscated form resolved after loading.
#[derive(Copy, Clone, Debug, Default)]
pub struct EnigmaFormat;

impl MappingsFormat for EnigmaFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let mut resolved: Vec<(Kind, String, String)> = Vec::new();
        let mut deferred: Vec<(Kind, String, String, MethodDescriptor)> = Vec::new();
        // The obfuscated and deobfuscated names of the active class
        let mut class: Option<(String, String)> = None;
        for (line_number, line) in numbered_lines(text) {
            let invalid = |reason: &str| FormatError::new(line_number, line, reason);
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            let kind = parse_kind(line_number, line, tokens[0])?;
            if kind == Kind::Class {
                let obf = match tokens.len() {
                    2 | 3 => strip_default_package(tokens[1]),
                    _ => return Err(invalid("Unexpected number of sections for CLASS").into())
                };
                let deobf = tokens.get(2).map(|name| dotted(name));
                if let Some(ref deobf) = deobf {
                    resolved.push((Kind::Class, obf.clone(), deobf.clone()));
                }
                let deobf = deobf.unwrap_or_else(|| obf.clone());
                class = Some((obf, deobf));
                continue;
            }
            if kind == Kind::Package {
                return Err(invalid("Packages aren't supported").into());
            }
            let (class_obf, class_deobf) = match class {
                Some((ref obf, ref deobf)) => (obf, deobf),
                None => {
                    let reason = format!("{} before class", if kind == Kind::Field { "Field" } else { "Method" });
                    return Err(invalid(&reason).into());
                }
            };
            match (kind, tokens.len()) {
                // The type of the field is optional
                (Kind::Field, 3) | (Kind::Field, 4) => {
                    resolved.push((
                        Kind::Field,
                        member_name(class_obf, tokens[1]),
                        member_name(class_deobf, tokens[2])
                    ));
                },
                (Kind::Method, 3) if tokens[1] == "<init>" => {
                    let descriptor = parse_descriptor(line_number, line, tokens[2])?;
                    deferred.push((
                        Kind::Constructor,
                        member_name(class_obf, "<init>"),
                        member_name(class_deobf, "<init>"),
                        descriptor
                    ));
                },
                // Unmapped methods only give their obfuscated name and descriptor
                (Kind::Method, 3) => {},
                (Kind::Method, 4) | (Kind::Constructor, 4) => {
                    let descriptor = parse_descriptor(line_number, line, tokens[3])?;
                    deferred.push((
                        kind.base(),
                        member_name(class_obf, tokens[1]),
                        member_name(class_deobf, tokens[2]),
                        descriptor
                    ));
                },
                (_, len) => {
                    return Err(FormatError::new(
                        line_number, line,
                        format!("Unexpected number of sections for {}: {}", kind, len)
                    ).into())
                }
            }
        }
        let mut added = 0;
        for (kind, obf, deobf) in resolved {
            if table.add_two_way(obf, deobf, kind, overwrite) {
                added += 1;
            }
        }
        for (kind, obf, deobf, descriptor) in deferred {
            let deobfuscated = descriptor.deobfuscate(table);
            let obf = format!("{} {}", obf, descriptor);
            let deobf = format!("{} {}", deobf, deobfuscated);
            if table.add_two_way(obf, deobf, kind, overwrite) {
                added += 1;
            }
        }
        debug!("Loaded {} enigma mappings", added);
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        if let Some(packages) = table.try_mappings(Kind::Package) {
            if !packages.is_empty() {
                warn!("Skipping {} packages, which enigma can't represent", packages.len());
            }
        }
        // The members of each class, keyed by the obfuscated class name
        // Constructors are stored with the methods, and recognized by their name
        let mut members: IndexMap<&str, Vec<Member>> = IndexMap::new();
        for &kind in &[Kind::Field, Kind::Method] {
            for entry in table.try_mappings(kind).into_iter().flat_map(|mappings| mappings.iter()) {
                match Member::from_names(kind, entry.obf(), entry.deobf()) {
                    Some((owner, member)) => members.entry(owner).or_insert_with(Vec::new).push(member),
                    None => warn!("Skipping unrepresentable {} {}", kind, entry.deobf())
                }
            }
        }
        let classes = table.try_mappings(Kind::Class);
        for entry in classes.into_iter().flat_map(|mappings| mappings.iter()) {
            writeln!(out, "CLASS {} {}", enigma_class(entry.obf()), slashed(entry.deobf()))?;
            let class_members = members.get(entry.obf()).into_iter().flat_map(|members| members.iter());
            write_members(out, entry.deobf(), class_members)?;
        }
        // Members of unmapped classes are written under the obfuscated class
        for (&owner, class_members) in &members {
            if classes.map_or(false, |classes| classes.by_obf(owner).is_some()) {
                continue;
            }
            writeln!(out, "CLASS {}", enigma_class(owner))?;
            write_members(out, owner, class_members.iter())?;
        }
        Ok(())
    }
}

fn write_members<'a, 'b: 'a, I>(out: &mut dyn Write, class_deobf: &str, members: I) -> Result<(), MappingsError>
    where I: Iterator<Item=&'a Member<'b>> {
    for member in members {
        match member.render(class_deobf) {
            Some(line) => writeln!(out, "\t{}", line)?,
            None => warn!("Skipping {} {}, which doesn't belong to {}", member.kind, member.deobf, class_deobf)
        }
    }
    Ok(())
}

struct Member<'a> {
    kind: Kind,
    /// The local obfuscated name
    obf: &'a str,
    /// The qualified deobfuscated name, without any descriptor
    deobf: &'a str,
    /// The obfuscated descriptor, in the form enigma expects
    descriptor: Option<MethodDescriptor>
}
impl<'a> Member<'a> {
    /// Split the names of the member, returning the obfuscated name of its class
    fn from_names(kind: Kind, obf: &'a str, deobf: &'a str) -> Option<(&'a str, Member<'a>)> {
        let (obf, descriptor) = split_member(obf);
        let (deobf, _) = split_member(deobf);
        if obf.contains(' ') || deobf.contains(' ') {
            return None;
        }
        let (owner, obf) = match split_owner(obf) {
            (Some(owner), local) => (owner, local),
            (None, _) => return None
        };
        let descriptor = match descriptor {
            Some(descriptor) => Some(descriptor.parse::<MethodDescriptor>().ok()?.map_classes(|class| {
                if class.contains('/') { None } else { Some(format!("{}{}", DEFAULT_PACKAGE, class)) }
            })),
            None if kind.has_descriptor() => return None,
            None => None
        };
        Some((owner, Member { kind, obf, deobf, descriptor }))
    }
    fn render(&self, class_deobf: &str) -> Option<String> {
        let deobf = match split_owner(self.deobf) {
            (Some(owner), local) if owner == class_deobf => local.to_owned(),
            _ if self.obf == "<init>" => return None,
            _ => slashed(self.deobf)
        };
        Some(match self.descriptor {
            None => format!("FIELD {} {}", self.obf, deobf),
            Some(ref descriptor) if self.obf == "<init>" => format!("METHOD <init> {}", descriptor),
            Some(ref descriptor) => format!("METHOD {} {} {}", self.obf, deobf, descriptor)
        })
    }
}

#[inline]
fn strip_default_package(name: &str) -> String {
    let name = if name.starts_with(DEFAULT_PACKAGE) { &name[DEFAULT_PACKAGE.len()..] } else { name };
    dotted(name)
}

/// Qualify the member name with its class, unless it's already qualified
#[inline]
fn member_name(class: &str, name: &str) -> String {
    if name.contains('.') || name.contains('/') {
        dotted(name)
    } else {
        format!("{}.{}", class, name)
    }
}

fn parse_descriptor(line_number: usize, line: &str, descriptor: &str) -> Result<MethodDescriptor, FormatError> {
    descriptor.replace("Lnone/", "L").parse::<MethodDescriptor>()
        .map_err(|cause| FormatError::descriptor(line_number, line, &cause))
}

/// The enigma name of the obfuscated class, using the placeholder for the default package
#[inline]
fn enigma_class(obf: &str) -> String {
    if obf.contains('.') {
        slashed(obf)
    } else {
        format!("{}{}", DEFAULT_PACKAGE, obf)
    }
}
