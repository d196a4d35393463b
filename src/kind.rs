use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::ser::{Serialize, Serializer};
use serde::de::{self, Deserialize, Deserializer};
use failure_derive::Fail;

/// The structural kind of a mapped name.
///
/// Constructors share the method namespace,
/// where they're named `<init>` and distinguished by their descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Kind {
    Package,
    Class,
    Method,
    Field,
    Constructor
}
impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Package, Kind::Class, Kind::Method,
        Kind::Field, Kind::Constructor
    ];
    /// The kinds that are actually stored in a table, in the order they're written.
    ///
    /// Formats without a dedicated constructor syntax write them as `<init>` methods.
    pub const STORABLE: [Kind; 4] = [Kind::Package, Kind::Class, Kind::Field, Kind::Method];
    /// The name used when writing this kind
    #[inline]
    pub fn name(self) -> &'static str {
        self.aliases()[0]
    }
    /// The two letter prefix used by srg-style formats
    #[inline]
    pub fn short_name(self) -> &'static str {
        self.aliases()[1]
    }
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Kind::Package => &["PACKAGE", "PK"],
            Kind::Class => &["CLASS", "CL"],
            Kind::Method => &["METHOD", "MD"],
            Kind::Field => &["FIELD", "FD"],
            Kind::Constructor => &["CONSTRUCTOR", "CS", "CSTR"],
        }
    }
    /// Fold constructors into methods, since they share a namespace
    #[inline]
    pub fn base(self) -> Kind {
        match self {
            Kind::Constructor => Kind::Method,
            other => other
        }
    }
    #[inline]
    pub fn is_member(self) -> bool {
        match self {
            Kind::Method | Kind::Field | Kind::Constructor => true,
            Kind::Package | Kind::Class => false,
        }
    }
    /// Whether names of this kind carry a method descriptor
    #[inline]
    pub fn has_descriptor(self) -> bool {
        self.base() == Kind::Method
    }
    /// Resolve a case-insensitive alias like `CLASS` or `md`
    pub fn from_alias(alias: &str) -> Option<Kind> {
        Kind::ALL.iter().cloned().find(|kind| {
            kind.aliases().iter().any(|known| known.eq_ignore_ascii_case(alias))
        })
    }
}
impl FromStr for Kind {
    type Err = UnrecognizedKind;

    #[inline]
    fn from_str(s: &str) -> Result<Kind, UnrecognizedKind> {
        Kind::from_alias(s).ok_or_else(|| UnrecognizedKind(s.into()))
    }
}
impl Display for Kind {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl Serialize for Kind {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.serialize_str(self.name())
    }
}
impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where
        D: Deserializer<'de> {
        struct KindVisitor;
        impl<'de> de::Visitor<'de> for KindVisitor {
            type Value = Kind;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a mapping kind")
            }

            #[inline]
            fn visit_str<E>(self, s: &str) -> Result<Kind, E> where
                E: de::Error, {
                Kind::from_str(s).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(KindVisitor)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Unrecognized kind {:?}", _0)]
pub struct UnrecognizedKind(pub String);

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn resolve_aliases() {
        assert_eq!(Kind::from_alias("CLASS"), Some(Kind::Class));
        assert_eq!(Kind::from_alias("class"), Some(Kind::Class));
        assert_eq!(Kind::from_alias("Md"), Some(Kind::Method));
        assert_eq!(Kind::from_alias("fd"), Some(Kind::Field));
        assert_eq!(Kind::from_alias("PK"), Some(Kind::Package));
        assert_eq!(Kind::from_alias("cstr"), Some(Kind::Constructor));
        assert_eq!(Kind::from_alias("CS"), Some(Kind::Constructor));
        assert_eq!(Kind::from_alias("ARG"), None);
        assert_eq!(Kind::from_alias(""), None);
        assert!("PARAM".parse::<Kind>().is_err());
    }
    #[test]
    fn base_kinds() {
        assert_eq!(Kind::Constructor.base(), Kind::Method);
        assert_eq!(Kind::Method.base(), Kind::Method);
        assert_eq!(Kind::Class.base(), Kind::Class);
        assert!(!Kind::STORABLE.contains(&Kind::Constructor));
    }
    #[test]
    fn display_kinds() {
        assert_eq!(format!("{}", Kind::Field), "FIELD");
        assert_eq!(Kind::Package.short_name(), "PK");
        assert_eq!(Kind::Constructor.short_name(), "CS");
        assert_eq!(::serde_json::to_string(&Kind::Method).unwrap(), "\"METHOD\"");
        assert_eq!(::serde_json::from_str::<Kind>("\"cl\"").unwrap(), Kind::Class);
    }
}
