use std::collections::HashMap;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use serde_derive::Serialize;
use failure_derive::Fail;

use crate::Kind;

/// A single association between an obfuscated, intermediate, and deobfuscated name.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct Entry {
    obf: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    intermediate: Option<String>,
    deobf: String
}
impl Entry {
    #[inline]
    pub fn obf(&self) -> &str {
        &self.obf
    }
    #[inline]
    pub fn deobf(&self) -> &str {
        &self.deobf
    }
    /// The intermediate name, which is only present in three-way tables
    #[inline]
    pub fn intermediate(&self) -> Option<&str> {
        self.intermediate.as_ref().map(String::as_str)
    }
}

/// The mappings of a single kind, indexed by each of their names.
#[derive(Clone, Debug, Default)]
pub struct KindMappings {
    entries: IndexMap<String, Entry>,
    by_deobf: HashMap<String, String>,
    by_intermediate: HashMap<String, String>,
}
impl KindMappings {
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Iterate over the entries in the order they were first added
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item=&Entry> {
        self.entries.values()
    }
    #[inline]
    pub fn by_obf(&self, obf: &str) -> Option<&Entry> {
        self.entries.get(obf)
    }
    #[inline]
    pub fn by_deobf(&self, deobf: &str) -> Option<&Entry> {
        self.by_deobf.get(deobf).and_then(|obf| self.entries.get(obf))
    }
    #[inline]
    pub fn by_intermediate(&self, intermediate: &str) -> Option<&Entry> {
        self.by_intermediate.get(intermediate).and_then(|obf| self.entries.get(obf))
    }
    /// The obfuscated names of every existing entry sharing a name with the specified entry
    fn conflicts(&self, entry: &Entry) -> Vec<String> {
        let mut conflicts = Vec::new();
        if self.entries.contains_key(&entry.obf) {
            conflicts.push(entry.obf.clone());
        }
        let secondary = self.by_deobf.get(&entry.deobf).into_iter()
            .chain(entry.intermediate.as_ref().and_then(|name| self.by_intermediate.get(name)));
        for obf in secondary {
            if !conflicts.contains(obf) {
                conflicts.push(obf.clone());
            }
        }
        conflicts
    }
    fn insert(&mut self, entry: Entry, overwrite: bool) -> bool {
        let conflicts = self.conflicts(&entry);
        if !conflicts.is_empty() {
            if !overwrite {
                return false;
            }
            for obf in conflicts {
                self.evict(&obf, obf != entry.obf);
            }
        }
        self.by_deobf.insert(entry.deobf.clone(), entry.obf.clone());
        if let Some(ref intermediate) = entry.intermediate {
            self.by_intermediate.insert(intermediate.clone(), entry.obf.clone());
        }
        // NOTE: Replacing an existing obf key keeps its original position
        self.entries.insert(entry.obf.clone(), entry);
        true
    }
    /// Remove the secondary indices of the specified entry, and optionally the entry itself
    fn evict(&mut self, obf: &str, remove_entry: bool) {
        let existing = if remove_entry {
            self.entries.shift_remove(obf)
        } else {
            self.entries.get(obf).cloned()
        };
        if let Some(existing) = existing {
            if self.by_deobf.get(&existing.deobf).map(String::as_str) == Some(obf) {
                self.by_deobf.remove(&existing.deobf);
            }
            if let Some(intermediate) = existing.intermediate {
                if self.by_intermediate.get(&intermediate).map(String::as_str) == Some(obf) {
                    self.by_intermediate.remove(&intermediate);
                }
            }
        }
    }
}
impl Serialize for KindMappings {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.collect_seq(self.entries.values())
    }
}

/// A collection of mappings, with an independent namespace for each kind.
///
/// Tables with intermediate names index every entry by all three names,
/// while two-way tables only track the obfuscated and deobfuscated names.
#[derive(Clone, Debug, Default)]
pub struct Table {
    intermediate: bool,
    kinds: IndexMap<Kind, KindMappings>
}
impl Table {
    /// Create a two-way table
    #[inline]
    pub fn new() -> Table {
        Table { intermediate: false, kinds: IndexMap::new() }
    }
    /// Create a three-way table, which also tracks intermediate names
    #[inline]
    pub fn with_intermediate() -> Table {
        Table { intermediate: true, kinds: IndexMap::new() }
    }
    #[inline]
    pub fn has_intermediate_names(&self) -> bool {
        self.intermediate
    }
    /// Add a mapping, using the deobfuscated name as the intermediate name
    ///
    /// Returns whether the table was modified.
    /// Unless `overwrite` is specified, the mapping is skipped
    /// if any of its names are already mapped.
    #[inline]
    pub fn add_two_way<O, D>(&mut self, obf: O, deobf: D, kind: Kind, overwrite: bool) -> bool
        where O: Into<String>, D: Into<String> {
        self.add_entry(Entry { obf: obf.into(), intermediate: None, deobf: deobf.into() }, kind, overwrite)
    }
    /// Add a mapping with an intermediate name
    ///
    /// Two-way tables have no intermediate namespace and drop the intermediate name.
    /// With `overwrite`, every existing entry sharing one of the names is replaced.
    #[inline]
    pub fn add_three_way<O, I, D>(
        &mut self, obf: O, intermediate: I, deobf: D,
        kind: Kind, overwrite: bool
    ) -> bool where O: Into<String>, I: Into<String>, D: Into<String> {
        let entry = Entry { obf: obf.into(), intermediate: Some(intermediate.into()), deobf: deobf.into() };
        self.add_entry(entry, kind, overwrite)
    }
    fn add_entry(&mut self, entry: Entry, kind: Kind, overwrite: bool) -> bool {
        let entry = conform_entry(entry, self.intermediate);
        self.kinds.entry(kind.base())
            .or_insert_with(KindMappings::default)
            .insert(entry, overwrite)
    }
    /// The mappings of the specified kind, if it's ever been added to
    #[inline]
    pub fn try_mappings(&self, kind: Kind) -> Option<&KindMappings> {
        self.kinds.get(&kind.base())
    }
    #[inline]
    pub fn mappings(&self, kind: Kind) -> Result<&KindMappings, TableError> {
        self.try_mappings(kind).ok_or(TableError::UnknownKind(kind))
    }
    /// The kinds that have been added to
    #[inline]
    pub fn kinds(&self) -> impl Iterator<Item=Kind> + '_ {
        self.kinds.keys().cloned()
    }
    /// The total number of entries of every kind
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.values().map(KindMappings::len).sum()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    #[inline]
    pub fn entry_by_obf(&self, obf: &str, kind: Kind) -> Result<Option<&Entry>, TableError> {
        Ok(self.mappings(kind)?.by_obf(obf))
    }
    #[inline]
    pub fn entry_by_deobf(&self, deobf: &str, kind: Kind) -> Result<Option<&Entry>, TableError> {
        Ok(self.mappings(kind)?.by_deobf(deobf))
    }
    #[inline]
    pub fn entry_by_intermediate(&self, intermediate: &str, kind: Kind) -> Result<Option<&Entry>, TableError> {
        self.check_intermediate()?;
        Ok(self.mappings(kind)?.by_intermediate(intermediate))
    }
    /// Find the deobfuscated name corresponding to the obfuscated name
    #[inline]
    pub fn lookup_deobf(&self, obf: &str, kind: Kind) -> Result<Option<&str>, TableError> {
        Ok(self.entry_by_obf(obf, kind)?.map(Entry::deobf))
    }
    /// Find the obfuscated name corresponding to the deobfuscated name
    #[inline]
    pub fn lookup_obf(&self, deobf: &str, kind: Kind) -> Result<Option<&str>, TableError> {
        Ok(self.entry_by_deobf(deobf, kind)?.map(Entry::obf))
    }
    /// Find the intermediate name corresponding to the obfuscated name
    #[inline]
    pub fn lookup_intermediate(&self, obf: &str, kind: Kind) -> Result<Option<&str>, TableError> {
        self.check_intermediate()?;
        Ok(self.entry_by_obf(obf, kind)?.and_then(Entry::intermediate))
    }
    #[inline]
    pub fn has_obf(&self, obf: &str, kind: Kind) -> bool {
        self.try_mappings(kind).map_or(false, |mappings| mappings.by_obf(obf).is_some())
    }
    #[inline]
    pub fn has_deobf(&self, deobf: &str, kind: Kind) -> bool {
        self.try_mappings(kind).map_or(false, |mappings| mappings.by_deobf(deobf).is_some())
    }
    #[inline]
    pub fn has_intermediate(&self, intermediate: &str, kind: Kind) -> bool {
        self.try_mappings(kind).map_or(false, |mappings| mappings.by_intermediate(intermediate).is_some())
    }
    pub fn all_obf(&self, kind: Kind) -> Result<Vec<&str>, TableError> {
        Ok(self.mappings(kind)?.iter().map(Entry::obf).collect())
    }
    pub fn all_deobf(&self, kind: Kind) -> Result<Vec<&str>, TableError> {
        Ok(self.mappings(kind)?.iter().map(Entry::deobf).collect())
    }
    pub fn all_intermediate(&self, kind: Kind) -> Result<Vec<&str>, TableError> {
        self.check_intermediate()?;
        Ok(self.mappings(kind)?.iter().filter_map(Entry::intermediate).collect())
    }
    /// Write every entry of this table into the other table
    ///
    /// Unless `overwrite` is specified, entries conflicting with existing mappings are skipped.
    pub fn copy_into(&self, other: &mut Table, overwrite: bool) {
        let intermediate = other.intermediate;
        for (&kind, mappings) in &self.kinds {
            let target = other.kinds.entry(kind)
                .or_insert_with(KindMappings::default);
            for entry in mappings.iter() {
                target.insert(conform_entry(entry.clone(), intermediate), overwrite);
            }
        }
    }
    #[inline]
    fn check_intermediate(&self) -> Result<(), TableError> {
        if self.intermediate { Ok(()) } else { Err(TableError::NoIntermediateNames) }
    }
}
/// Fill in or drop the intermediate name, depending on whether the table tracks them
#[inline]
fn conform_entry(mut entry: Entry, intermediate: bool) -> Entry {
    if !intermediate {
        entry.intermediate = None;
    } else if entry.intermediate.is_none() {
        entry.intermediate = Some(entry.deobf.clone());
    }
    entry
}
impl Serialize for Table {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.collect_map(self.kinds.iter())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Fail)]
pub enum TableError {
    #[fail(display = "Unknown kind {}", _0)]
    UnknownKind(Kind),
    #[fail(display = "The table doesn't have intermediate names")]
    NoIntermediateNames,
}
