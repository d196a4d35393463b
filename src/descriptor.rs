//! Parsing and remapping of JVM method descriptors.
//!
//! Method names in a table carry their descriptor (`foo (ILjava/lang/String;)V`),
//! so the class references embedded in descriptors need to be remapped
//! whenever the names of the classes they reference are known.
use std::fmt::{self, Display, Formatter, Write};
use std::str::FromStr;

use failure_derive::Fail;

use crate::{Kind, Table};

/// The element type of a descriptor token
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum BaseType {
    /// A primitive type or `V` for void
    Primitive(char),
    /// A class reference, with its slash-delimited internal name
    Class(String),
}

/// A single type in a descriptor, possibly nested inside arrays
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeToken {
    pub array_depth: usize,
    pub base: BaseType,
}
impl TypeToken {
    #[inline]
    pub fn class_name(&self) -> Option<&str> {
        match self.base {
            BaseType::Class(ref name) => Some(name),
            BaseType::Primitive(_) => None,
        }
    }
    #[inline]
    pub fn is_void(&self) -> bool {
        self.array_depth == 0 && self.base == BaseType::Primitive('V')
    }
    fn map_class<F: FnMut(&str) -> Option<String>>(&self, func: &mut F) -> TypeToken {
        match self.base {
            BaseType::Class(ref name) => TypeToken {
                array_depth: self.array_depth,
                base: BaseType::Class(func(name).unwrap_or_else(|| name.clone()))
            },
            BaseType::Primitive(_) => self.clone()
        }
    }
    fn parse(descriptor: &str, remaining: &mut &str) -> Result<TypeToken, DescriptorError> {
        let text = *remaining;
        let array_depth = text.len() - text.trim_start_matches('[').len();
        let text = &text[array_depth..];
        let first = text.chars().next()
            .ok_or_else(|| DescriptorError::new(descriptor, "Missing type"))?;
        let (base, consumed) = match first {
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V' => {
                (BaseType::Primitive(first), 1)
            },
            'L' => {
                let end = text.find(';')
                    .ok_or_else(|| DescriptorError::new(descriptor, "Unterminated class reference"))?;
                let name = &text[1..end];
                if name.is_empty() {
                    return Err(DescriptorError::new(descriptor, "Empty class reference"));
                }
                (BaseType::Class(name.into()), end + 1)
            },
            _ => return Err(DescriptorError::new(descriptor, "Unknown type"))
        };
        if array_depth > 0 && base == BaseType::Primitive('V') {
            return Err(DescriptorError::new(descriptor, "Array of void"));
        }
        *remaining = &text[consumed..];
        Ok(TypeToken { array_depth, base })
    }
}
impl Display for TypeToken {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for _ in 0..self.array_depth {
            f.write_char('[')?;
        }
        match self.base {
            BaseType::Primitive(c) => f.write_char(c),
            BaseType::Class(ref name) => write!(f, "L{};", name),
        }
    }
}

/// A method descriptor like `(I[Ljava/lang/String;)V`
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodDescriptor {
    params: Vec<TypeToken>,
    return_type: TypeToken,
}
impl MethodDescriptor {
    #[inline]
    pub fn params(&self) -> &[TypeToken] {
        &self.params
    }
    #[inline]
    pub fn return_type(&self) -> &TypeToken {
        &self.return_type
    }
    /// Iterate over every class referenced by this descriptor
    pub fn classes(&self) -> impl Iterator<Item=&str> {
        self.params.iter().chain(Some(&self.return_type))
            .filter_map(TypeToken::class_name)
    }
    /// Transform each referenced class, leaving it unchanged if the function returns `None`
    pub fn map_classes<F>(&self, mut func: F) -> MethodDescriptor
        where F: FnMut(&str) -> Option<String> {
        MethodDescriptor {
            params: self.params.iter().map(|param| param.map_class(&mut func)).collect(),
            return_type: self.return_type.map_class(&mut func)
        }
    }
    /// Replace deobfuscated class references with their obfuscated names
    pub fn obfuscate(&self, table: &Table) -> MethodDescriptor {
        let classes = table.try_mappings(Kind::Class);
        self.map_classes(|name| {
            let entry = classes?.by_deobf(&name.replace('/', "."))?;
            Some(entry.obf().replace('.', "/"))
        })
    }
    /// Replace obfuscated class references with their deobfuscated names
    pub fn deobfuscate(&self, table: &Table) -> MethodDescriptor {
        let classes = table.try_mappings(Kind::Class);
        self.map_classes(|name| {
            let entry = classes?.by_obf(&name.replace('/', "."))?;
            Some(entry.deobf().replace('.', "/"))
        })
    }
}
impl FromStr for MethodDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<MethodDescriptor, DescriptorError> {
        if !s.starts_with('(') {
            return Err(DescriptorError::new(s, "Missing parameters"));
        }
        let mut remaining = &s[1..];
        let mut params = Vec::new();
        loop {
            if remaining.starts_with(')') {
                remaining = &remaining[1..];
                break;
            }
            if remaining.is_empty() {
                return Err(DescriptorError::new(s, "Unterminated parameters"));
            }
            let param = TypeToken::parse(s, &mut remaining)?;
            if param.is_void() {
                return Err(DescriptorError::new(s, "Void parameter"));
            }
            params.push(param);
        }
        if remaining.is_empty() {
            return Err(DescriptorError::new(s, "Missing return type"));
        }
        let return_type = TypeToken::parse(s, &mut remaining)?;
        if !remaining.is_empty() {
            return Err(DescriptorError::new(s, "Trailing characters"));
        }
        Ok(MethodDescriptor { params, return_type })
    }
}
impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_char('(')?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        write!(f, "){}", self.return_type)
    }
}

/// Replace the deobfuscated class references in the descriptor with their obfuscated names
///
/// Classes the table doesn't know about are left unchanged.
#[inline]
pub fn obfuscate_descriptor(descriptor: &str, table: &Table) -> Result<String, DescriptorError> {
    Ok(descriptor.parse::<MethodDescriptor>()?.obfuscate(table).to_string())
}

/// Replace the obfuscated class references in the descriptor with their deobfuscated names
#[inline]
pub fn deobfuscate_descriptor(descriptor: &str, table: &Table) -> Result<String, DescriptorError> {
    Ok(descriptor.parse::<MethodDescriptor>()?.deobfuscate(table).to_string())
}

/// Split a method name like `a.b (I)V` into its name and descriptor
#[inline]
pub fn split_member(member: &str) -> (&str, Option<&str>) {
    match member.rfind(' ') {
        Some(index) if member[index + 1..].starts_with('(') => {
            (&member[..index], Some(&member[index + 1..]))
        },
        _ => (member, None)
    }
}

/// Split a qualified name like `a.b.c` into its owner and simple name
///
/// Names in the split srg form `a.b.c funcname` are split at the space.
#[inline]
pub fn split_owner(name: &str) -> (Option<&str>, &str) {
    match name.rfind(|c: char| c == '.' || c == ' ') {
        Some(index) => (Some(&name[..index]), &name[index + 1..]),
        None => (None, name)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid descriptor {:?}: {}", descriptor, reason)]
pub struct DescriptorError {
    descriptor: String,
    reason: &'static str
}
impl DescriptorError {
    #[inline]
    fn new(descriptor: &str, reason: &'static str) -> DescriptorError {
        DescriptorError { descriptor: descriptor.into(), reason }
    }
    #[inline]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}
