//! The dense hierarchical format, where members are nested under their class and package.
//!
//! ```text
//! a:net.minecraft
//! 	b:World
//! 		c:1_c:time
//! 		<init> (Lnet/minecraft/World;)V
//! 		public!d:2_d:tick (I)V
//! >>extra.onf
//! ```
//!
//! Packages aren't indented, classes are indented with one tab and members with two.
//! Each name is given as `obf[:srg]:deobf`, where method and field srg names
//! have their `func_` and `field_` prefixes added implicitly.
//! Methods are given with their deobfuscated descriptor,
//! and the obfuscated descriptor is resolved once everything has been read.
use std::fmt::{self, Debug, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::{Kind, Table, Entry, MappingsError, FormatError};
use crate::descriptor::{MethodDescriptor, split_member, split_owner};
use super::MappingsFormat;
use super::import::{Importer, FsImporter};

const ACCESS_KEYWORDS: [&str; 4] = ["public", "protected", "private", "package"];

/// An access transformation declared together with the mappings
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transformation {
    /// The access directive, like `public` or `-f`
    pub directive: String,
    /// The deobfuscated name of the target, including the descriptor of methods
    pub target: String,
    pub kind: Kind,
    /// Whether the directive was given on a class,
    /// applying to each of its members of the specified kind.
    pub global: bool
}

/// An import which couldn't be loaded, whose mappings were skipped
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportFailure {
    pub file: String,
    pub reason: String
}

/// The metadata found while loading
#[derive(Clone, Debug, Default)]
pub struct OnfReport {
    pub transformations: Vec<Transformation>,
    pub import_failures: Vec<ImportFailure>
}

pub struct OnfFormat {
    importer: Box<dyn Importer>
}
impl OnfFormat {
    /// Resolve imports on the filesystem
    #[inline]
    pub fn new() -> OnfFormat {
        OnfFormat::with_importer(FsImporter)
    }
    #[inline]
    pub fn with_importer<I: Importer + 'static>(importer: I) -> OnfFormat {
        OnfFormat { importer: Box::new(importer) }
    }
    /// Load the text, reporting the access transformations and failed imports
    ///
    /// Imports are resolved relative to the working directory.
    /// The text itself has no name, so an import looping back to it is loaded again.
    /// Use `load_named` or `load_path_report` to skip such cycles.
    /// The table is left untouched if the text is invalid.
    pub fn load_report(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<OnfReport, MappingsError> {
        self.load_from(text, None, IndexSet::new(), table, overwrite)
    }
    /// Load the file, resolving imports relative to its directory
    pub fn load_path_report(&self, path: &Path, table: &mut Table, overwrite: bool) -> Result<OnfReport, MappingsError> {
        let text = fs::read_to_string(path)
            .map_err(|cause| MappingsError::resource(format!("Unable to read {}", path.display()), cause))?;
        let mut seen = IndexSet::new();
        if let Some(name) = path.file_name() {
            seen.insert(name.to_string_lossy().into_owned());
        }
        self.load_from(&text, path.parent(), seen, table, overwrite)
    }
    /// Load the file with the specified name from the importer
    pub fn load_named(&self, name: &str, table: &mut Table, overwrite: bool) -> Result<OnfReport, MappingsError> {
        let source = self.importer.open(None, name)
            .map_err(|cause| MappingsError::resource(format!("Unable to open {}", name), cause))?;
        let mut seen = IndexSet::new();
        seen.insert(name.to_owned());
        self.load_from(&source.text, source.base.as_ref().map(PathBuf::as_path), seen, table, overwrite)
    }
    fn load_from(
        &self, text: &str, base: Option<&Path>, seen: IndexSet<String>,
        table: &mut Table, overwrite: bool
    ) -> Result<OnfReport, MappingsError> {
        let mut state = ImportState { seen, failures: Vec::new() };
        let collected = self.parse(text, base, &mut state)?;
        let mut added = 0;
        for (kind, names) in collected.resolved {
            if table.add_three_way(names.obf, names.intermediate, names.deobf, kind, overwrite) {
                added += 1;
            }
        }
        // Now that every class is known, the obfuscated descriptors can be resolved
        let deferred = collected.deferred.len();
        for (kind, names, descriptor) in collected.deferred {
            let obfuscated = descriptor.obfuscate(table);
            if table.add_three_way(
                format!("{} {}", names.obf, obfuscated),
                format!("{} {}", names.intermediate, descriptor),
                format!("{} {}", names.deobf, descriptor),
                kind, overwrite
            ) {
                added += 1;
            }
        }
        debug!(
            "Loaded {} onf mappings ({} with descriptors) from {} files",
            added, deferred, state.seen.len().max(1)
        );
        Ok(OnfReport {
            transformations: collected.transformations,
            import_failures: state.failures
        })
    }
    fn parse(&self, text: &str, base: Option<&Path>, state: &mut ImportState) -> Result<Collected, FormatError> {
        let mut collected = Collected::default();
        let mut package: Option<Names> = None;
        let mut class: Option<Names> = None;
        for (index, raw) in text.lines().enumerate() {
            let line_number = index + 1;
            let invalid = |reason: &str| FormatError::new(line_number, raw, reason);
            let line = raw.split('#').next().unwrap_or("");
            let content = line.trim();
            if content.is_empty() || content.starts_with("//") {
                continue;
            }
            if content.starts_with(">>") {
                let name = content[2..].trim();
                if name.is_empty() {
                    return Err(invalid("Missing import name"));
                }
                self.import(name, base, state, &mut collected);
                continue;
            }
            let depth = line.len() - line.trim_start_matches('\t').len();
            let (directive, declaration) = match content.find('!') {
                Some(index) => (Some(&content[..index]), content[index + 1..].trim()),
                None => (None, content)
            };
            if directive == Some("") {
                return Err(invalid("Empty access transformation"));
            }
            match depth {
                0 => {
                    if directive.is_some() {
                        return Err(invalid("Packages can't have access transformations"));
                    }
                    let names = Names::parse(line_number, raw, declaration, Kind::Package)?;
                    collected.resolved.push((Kind::Package, names.clone()));
                    package = Some(names);
                    class = None;
                },
                1 => {
                    let names = {
                        let context = package.as_ref().ok_or_else(|| invalid("Class before package"))?;
                        Names::parse(line_number, raw, declaration, Kind::Class)?.qualify(context)
                    };
                    if let Some(directive) = directive {
                        let expanded = parse_class_directive(directive, &names.deobf)
                            .ok_or_else(|| invalid("Invalid class access transformation"))?;
                        collected.transformations.extend(expanded);
                    }
                    collected.resolved.push((Kind::Class, names.clone()));
                    class = Some(names);
                },
                _ => {
                    let kind = if declaration.starts_with("<init>") {
                        Kind::Constructor
                    } else if declaration.contains(' ') {
                        Kind::Method
                    } else {
                        Kind::Field
                    };
                    let context = class.as_ref().ok_or_else(|| {
                        FormatError::new(line_number, raw, format!("{} before class", member_label(kind)))
                    })?;
                    if kind == Kind::Field {
                        let names = Names::parse(line_number, raw, declaration, kind)?.qualify(context);
                        if let Some(directive) = directive {
                            collected.transformations.push(Transformation {
                                directive: directive.into(),
                                target: names.deobf.clone(),
                                kind, global: false
                            });
                        }
                        collected.resolved.push((kind, names));
                    } else {
                        let (name, descriptor) = split_member(declaration);
                        let descriptor = descriptor.ok_or_else(|| {
                            FormatError::new(line_number, raw, format!("Missing {} descriptor", member_label(kind).to_lowercase()))
                        })?;
                        let descriptor = descriptor.parse::<MethodDescriptor>()
                            .map_err(|cause| FormatError::descriptor(line_number, raw, &cause))?;
                        let names = Names::parse(line_number, raw, name.trim(), kind)?.qualify(context);
                        if let Some(directive) = directive {
                            collected.transformations.push(Transformation {
                                directive: directive.into(),
                                target: format!("{} {}", names.deobf, descriptor),
                                kind, global: false
                            });
                        }
                        collected.deferred.push((kind, names, descriptor));
                    }
                }
            }
        }
        Ok(collected)
    }
    /// Side-load the named file as if it were part of the current one
    ///
    /// Failures are recorded and skip the mappings of the import,
    /// without aborting the enclosing load.
    fn import(&self, name: &str, base: Option<&Path>, state: &mut ImportState, collected: &mut Collected) {
        if state.seen.contains(name) {
            debug!("Skipping repeated import of {}", name);
            return;
        }
        // Only opened files count as imported, so a failed import can be retried from another base
        let result = match self.importer.open(base, name) {
            Ok(source) => {
                state.seen.insert(name.to_owned());
                let base = source.base.as_ref().map(PathBuf::as_path);
                self.parse(&source.text, base, state).map_err(|e| e.to_string())
            },
            Err(e) => Err(e.to_string())
        };
        match result {
            Ok(imported) => {
                debug!("Imported {} mappings from {}", imported.len(), name);
                collected.extend(imported);
            },
            Err(reason) => {
                warn!("Skipping import {}: {}", name, reason);
                state.failures.push(ImportFailure { file: name.into(), reason });
            }
        }
    }
}
impl Default for OnfFormat {
    #[inline]
    fn default() -> Self {
        OnfFormat::new()
    }
}
impl Debug for OnfFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("OnfFormat")
    }
}
impl MappingsFormat for OnfFormat {
    fn load(&self, text: &str, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let report = self.load_report(text, table, overwrite)?;
        debug!("Ignoring {} access transformations", report.transformations.len());
        Ok(())
    }

    fn load_path(&self, path: &Path, table: &mut Table, overwrite: bool) -> Result<(), MappingsError> {
        let report = self.load_path_report(path, table, overwrite)?;
        debug!("Ignoring {} access transformations", report.transformations.len());
        Ok(())
    }

    fn store(&self, table: &Table, out: &mut dyn Write) -> Result<(), MappingsError> {
        let mut members: IndexMap<Names, Vec<Member>> = IndexMap::new();
        for &kind in &[Kind::Field, Kind::Method] {
            for entry in table.try_mappings(kind).into_iter().flat_map(|mappings| mappings.iter()) {
                match Member::from_entry(kind, entry) {
                    Some((owner, member)) => members.entry(owner).or_insert_with(Vec::new).push(member),
                    None => warn!("Skipping unrepresentable {} {}", kind, entry.deobf())
                }
            }
        }
        let mut classes: IndexMap<Names, Vec<(Names, Names)>> = IndexMap::new();
        for entry in table.try_mappings(Kind::Class).into_iter().flat_map(|mappings| mappings.iter()) {
            let full = Names::from_entry(entry);
            match full.split() {
                Some((package, local)) => classes.entry(package).or_insert_with(Vec::new).push((full, local)),
                None => warn!("Skipping unrepresentable class {}", entry.deobf())
            }
        }
        // Classes outside any known package get a package of their own
        let mut packages = table.try_mappings(Kind::Package).into_iter()
            .flat_map(|mappings| mappings.iter())
            .map(Names::from_entry)
            .collect::<IndexSet<Names>>();
        packages.extend(classes.keys().cloned());
        let mut written = 0;
        for package in &packages {
            writeln!(out, "{}", package)?;
            for &(ref full, ref local) in classes.get(package).into_iter().flat_map(|group| group.iter()) {
                writeln!(out, "\t{}", local)?;
                written += 1;
                let class_members = match members.get(full) {
                    Some(class_members) => class_members,
                    None => continue
                };
                for &kind in &[Kind::Field, Kind::Constructor, Kind::Method] {
                    for member in class_members.iter().filter(|member| member.kind == kind) {
                        writeln!(out, "\t\t{}", member)?;
                        written += 1;
                    }
                }
            }
        }
        let known = classes.values()
            .flat_map(|group| group.iter().map(|&(ref full, _)| full))
            .collect::<IndexSet<&Names>>();
        for (owner, orphans) in &members {
            if !known.contains(owner) {
                warn!("Skipping {} members of unmapped class {}", orphans.len(), owner.deobf);
            }
        }
        debug!("Wrote {} onf mappings in {} packages", written, packages.len());
        Ok(())
    }
}

struct ImportState {
    seen: IndexSet<String>,
    failures: Vec<ImportFailure>
}

/// The records of a single file and its imports, which haven't been added to the table yet
#[derive(Default)]
struct Collected {
    resolved: Vec<(Kind, Names)>,
    deferred: Vec<(Kind, Names, MethodDescriptor)>,
    transformations: Vec<Transformation>
}
impl Collected {
    #[inline]
    fn len(&self) -> usize {
        self.resolved.len() + self.deferred.len()
    }
    fn extend(&mut self, other: Collected) {
        self.resolved.extend(other.resolved);
        self.deferred.extend(other.deferred);
        self.transformations.extend(other.transformations);
    }
}

/// The obfuscated, intermediate, and deobfuscated forms of a name
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
struct Names {
    obf: String,
    intermediate: String,
    deobf: String
}
impl Names {
    fn parse(line_number: usize, line: &str, text: &str, kind: Kind) -> Result<Names, FormatError> {
        let parts = text.split(':').collect::<Vec<_>>();
        // The default package has an empty name
        if kind != Kind::Package && parts.iter().any(|part| part.is_empty()) {
            return Err(FormatError::new(line_number, line, "Empty name"));
        }
        let (obf, intermediate, deobf) = match parts[..] {
            [name] => (name.to_owned(), name.to_owned(), name.to_owned()),
            [obf, deobf] => (obf.to_owned(), deobf.to_owned(), deobf.to_owned()),
            [obf, intermediate, deobf] => {
                let prefix = intermediate_prefix(kind);
                let intermediate = if intermediate.starts_with(prefix) {
                    intermediate.to_owned()
                } else {
                    format!("{}{}", prefix, intermediate)
                };
                (obf.to_owned(), intermediate, deobf.to_owned())
            },
            _ => return Err(FormatError::new(line_number, line, "Too many names"))
        };
        Ok(Names { obf, intermediate, deobf })
    }
    fn from_entry(entry: &Entry) -> Names {
        Names {
            obf: entry.obf().into(),
            intermediate: entry.intermediate().unwrap_or_else(|| entry.deobf()).into(),
            deobf: entry.deobf().into()
        }
    }
    fn qualify(&self, context: &Names) -> Names {
        Names {
            obf: qualify(&context.obf, &self.obf),
            intermediate: qualify(&context.intermediate, &self.intermediate),
            deobf: qualify(&context.deobf, &self.deobf)
        }
    }
    /// Split each of the names into its owner and local name
    fn split(&self) -> Option<(Names, Names)> {
        let (obf_owner, obf) = split_owner(&self.obf);
        let (intermediate_owner, intermediate) = split_owner(&self.intermediate);
        let (deobf_owner, deobf) = split_owner(&self.deobf);
        let owner = Names {
            obf: obf_owner.unwrap_or("").into(),
            intermediate: intermediate_owner.unwrap_or("").into(),
            deobf: deobf_owner.unwrap_or("").into()
        };
        if obf.is_empty() || intermediate.is_empty() || deobf.is_empty() {
            return None;
        }
        Some((owner, Names { obf: obf.into(), intermediate: intermediate.into(), deobf: deobf.into() }))
    }
}
impl fmt::Display for Names {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.intermediate != self.deobf {
            write!(f, "{}:{}:{}", self.obf, self.intermediate, self.deobf)
        } else if self.obf != self.deobf || self.obf.is_empty() {
            write!(f, "{}:{}", self.obf, self.deobf)
        } else {
            f.write_str(&self.obf)
        }
    }
}

struct Member {
    kind: Kind,
    names: Names,
    descriptor: Option<String>
}
impl Member {
    fn from_entry(kind: Kind, entry: &Entry) -> Option<(Names, Member)> {
        let full = Names::from_entry(entry);
        let (full, descriptor) = if kind == Kind::Method {
            let (deobf, descriptor) = split_member(&full.deobf);
            let names = Names {
                obf: split_member(&full.obf).0.into(),
                intermediate: split_member(&full.intermediate).0.into(),
                deobf: deobf.into()
            };
            (names, Some(descriptor?.to_owned()))
        } else {
            (full, None)
        };
        let (owner, names) = full.split()?;
        if owner.obf.is_empty() || owner.deobf.is_empty() {
            return None;
        }
        let kind = if names.deobf == "<init>" {
            if names.obf != "<init>" || names.intermediate != "<init>" {
                return None;
            }
            Kind::Constructor
        } else {
            kind
        };
        // Distinct intermediate names are always written with their implicit prefix
        if names.intermediate != names.deobf && !names.intermediate.starts_with(intermediate_prefix(kind)) {
            return None;
        }
        Some((owner, Member { kind, names, descriptor }))
    }
}
impl fmt::Display for Member {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.kind == Kind::Constructor {
            f.write_str("<init>")?;
        } else {
            write!(f, "{}", self.names)?;
        }
        if let Some(ref descriptor) = self.descriptor {
            write!(f, " {}", descriptor)?;
        }
        Ok(())
    }
}

#[inline]
fn qualify(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        name.into()
    } else {
        format!("{}.{}", owner, name)
    }
}

#[inline]
fn intermediate_prefix(kind: Kind) -> &'static str {
    match kind {
        Kind::Method => "func_",
        Kind::Field => "field_",
        _ => ""
    }
}

#[inline]
fn member_label(kind: Kind) -> &'static str {
    match kind {
        Kind::Field => "Field",
        Kind::Constructor => "Constructor",
        _ => "Method"
    }
}

/// Expand an access directive on a class into the directives for its fields and methods
///
/// The directive is an access keyword and/or a final modifier (`-f` or `+f`),
/// followed by the kinds of members it applies to: `f` for fields and `m` for methods.
fn parse_class_directive(text: &str, target: &str) -> Option<Vec<Transformation>> {
    let mut remaining = text;
    if let Some(keyword) = ACCESS_KEYWORDS.iter().find(|keyword| remaining.starts_with(*keyword)) {
        remaining = &remaining[keyword.len()..];
    }
    if remaining.starts_with("-f") || remaining.starts_with("+f") {
        remaining = &remaining[2..];
    }
    let directive = &text[..text.len() - remaining.len()];
    if directive.is_empty() || remaining.is_empty() {
        return None;
    }
    let mut kinds = Vec::with_capacity(2);
    for flag in remaining.chars() {
        let kind = match flag {
            'f' => Kind::Field,
            'm' => Kind::Method,
            _ => return None
        };
        if kinds.contains(&kind) {
            return None;
        }
        kinds.push(kind);
    }
    Some(kinds.into_iter().map(|kind| Transformation {
        directive: directive.into(),
        target: target.into(),
        kind, global: true
    }).collect())
}
