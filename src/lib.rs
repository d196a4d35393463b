//! Obfuscation mappings between the obfuscated, intermediate and deobfuscated names
//! of Java packages, classes and members.
//!
//! Mappings are kept in a [Table](struct.Table.html), which is filled and written
//! by any of the dialects in the [format](format/index.html) module.
extern crate indexmap;
extern crate failure;
extern crate failure_derive;
extern crate serde;
extern crate serde_derive;
extern crate itertools;
extern crate csv;
extern crate log;
#[cfg(test)]
extern crate serde_json;

mod kind;
mod table;
mod error;
pub mod descriptor;
pub mod format;
pub mod dialect;
mod combine;

pub use crate::kind::{Kind, UnrecognizedKind};
pub use crate::table::{Table, Entry, KindMappings, TableError};
pub use crate::error::{MappingsError, FormatError};
pub use crate::descriptor::{MethodDescriptor, DescriptorError};
pub use crate::format::MappingsFormat;
pub use crate::dialect::{DialectSpec, InvalidDialect};
pub use crate::combine::combine_mcp;
