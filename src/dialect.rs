use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use itertools::{Itertools, PeekingNext};
use serde::ser::{Serialize, Serializer};
use serde::de::{self, Deserialize, Deserializer};
use failure_derive::Fail;

use crate::Kind;
use crate::format::{
    MappingsFormat, ObfFormat, SidedObfFormat, BlObfFormat,
    SrgFormat, McpCsvFormat, OnfFormat, EnigmaFormat
};

/// A dialect along with its options, like `srg-C-nodesc` or `csv-methods-0`
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum DialectSpec {
    Obf,
    SidedObf {
        side: String
    },
    BlObf {
        strip_descriptors: bool
    },
    Srg {
        side: Option<String>,
        strip_descriptors: bool
    },
    McpCsv {
        kind: Kind,
        side: Option<u32>
    },
    Onf,
    Enigma
}
impl DialectSpec {
    pub fn create(&self) -> Box<dyn MappingsFormat> {
        match *self {
            DialectSpec::Obf => Box::new(ObfFormat),
            DialectSpec::SidedObf { ref side } => Box::new(SidedObfFormat::new(side.clone())),
            DialectSpec::BlObf { strip_descriptors: true } => Box::new(BlObfFormat::without_descriptors()),
            DialectSpec::BlObf { strip_descriptors: false } => Box::new(BlObfFormat::new()),
            DialectSpec::Srg { ref side, strip_descriptors } => {
                let mut format = SrgFormat::new();
                if let Some(ref side) = *side {
                    format = format.with_side(side.clone());
                }
                if strip_descriptors {
                    format = format.without_descriptors();
                }
                Box::new(format)
            },
            DialectSpec::McpCsv { kind, side } => {
                let format = McpCsvFormat::new(kind);
                Box::new(match side {
                    Some(side) => format.with_side(side),
                    None => format
                })
            },
            DialectSpec::Onf => Box::new(OnfFormat::new()),
            DialectSpec::Enigma => Box::new(EnigmaFormat),
        }
    }
    /// Whether the dialect carries intermediate names, which only a three-way table can hold
    #[inline]
    pub fn has_intermediate_names(&self) -> bool {
        match *self {
            DialectSpec::BlObf { .. } | DialectSpec::Onf => true,
            _ => false
        }
    }
}
impl FromStr for DialectSpec {
    type Err = InvalidDialect;

    fn from_str(s: &str) -> Result<DialectSpec, InvalidDialect> {
        let invalid = || InvalidDialect(s.into());
        let mut parts = s.split('-').peekable();
        let dialect = match parts.next().ok_or_else(invalid)? {
            "obf" => DialectSpec::Obf,
            "sobf" => {
                // The side is the rest of the name, which may contain dashes itself
                let side = parts.join("-");
                if side.is_empty() { return Err(invalid()) }
                return Ok(DialectSpec::SidedObf { side })
            },
            "blobf" => DialectSpec::BlObf { strip_descriptors: nodesc(&mut parts).ok_or_else(invalid)? },
            "srg" => {
                let side = parts.peeking_next(|&part| part != "nodesc").map(String::from);
                if side.as_ref().map_or(false, String::is_empty) {
                    return Err(invalid())
                }
                let strip_descriptors = nodesc(&mut parts).ok_or_else(invalid)?;
                DialectSpec::Srg { side, strip_descriptors }
            },
            "csv" => {
                let kind = match parts.next() {
                    Some("fields") => Kind::Field,
                    Some("methods") => Kind::Method,
                    _ => return Err(invalid())
                };
                let side = match parts.next() {
                    Some(side) => Some(side.parse::<u32>().map_err(|_| invalid())?),
                    None => None
                };
                DialectSpec::McpCsv { kind, side }
            },
            "onf" => DialectSpec::Onf,
            "enigma" => DialectSpec::Enigma,
            _ => return Err(invalid())
        };
        if parts.next().is_some() {
            return Err(invalid())
        }
        Ok(dialect)
    }
}
/// Consume the optional `nodesc` flag, giving `None` for any other flag
#[inline]
fn nodesc<'a, I: Iterator<Item=&'a str>>(parts: &mut I) -> Option<bool> {
    match parts.next() {
        Some("nodesc") => Some(true),
        Some(_) => None,
        None => Some(false)
    }
}
impl Display for DialectSpec {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            DialectSpec::Obf => f.write_str("obf"),
            DialectSpec::SidedObf { ref side } => write!(f, "sobf-{}", side),
            DialectSpec::BlObf { strip_descriptors } => {
                f.write_str("blobf")?;
                if strip_descriptors { f.write_str("-nodesc")? }
                Ok(())
            },
            DialectSpec::Srg { ref side, strip_descriptors } => {
                f.write_str("srg")?;
                if let Some(ref side) = *side { write!(f, "-{}", side)? }
                if strip_descriptors { f.write_str("-nodesc")? }
                Ok(())
            },
            DialectSpec::McpCsv { kind, side } => {
                f.write_str(if kind == Kind::Field { "csv-fields" } else { "csv-methods" })?;
                if let Some(side) = side { write!(f, "-{}", side)? }
                Ok(())
            },
            DialectSpec::Onf => f.write_str("onf"),
            DialectSpec::Enigma => f.write_str("enigma"),
        }
    }
}
impl Serialize for DialectSpec {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.serialize_str(&format!("{}", self))
    }
}
impl<'de> Deserialize<'de> for DialectSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where
        D: Deserializer<'de> {
        struct DialectVisitor;
        impl<'de> de::Visitor<'de> for DialectVisitor {
            type Value = DialectSpec;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a mappings dialect")
            }

            #[inline]
            fn visit_str<E>(self, s: &str) -> Result<DialectSpec, E> where
                E: de::Error, {
                DialectSpec::from_str(s).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(DialectVisitor)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid dialect {:?}", _0)]
pub struct InvalidDialect(pub String);
