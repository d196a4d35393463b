use std::io;

use failure_derive::Fail;

use crate::table::TableError;
use crate::descriptor::DescriptorError;

/// A structurally invalid line, which aborts the whole load
#[derive(Debug, Clone, Eq, PartialEq, Fail)]
#[fail(display = "Format error on line {}: {} ({:?})", line, reason, text)]
pub struct FormatError {
    line: usize,
    text: String,
    reason: String
}
impl FormatError {
    #[inline]
    pub fn new<T: Into<String>, R: Into<String>>(line: usize, text: T, reason: R) -> FormatError {
        FormatError { line, text: text.into(), reason: reason.into() }
    }
    /// Wrap an invalid descriptor found on the specified line
    #[inline]
    pub fn descriptor(line: usize, text: &str, cause: &DescriptorError) -> FormatError {
        FormatError::new(line, text, cause.to_string())
    }
    /// The one-based line number
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Fail)]
pub enum MappingsError {
    #[fail(display = "{}", _0)]
    Format(#[cause] FormatError),
    #[fail(display = "{}: {}", context, cause)]
    Resource {
        context: String,
        #[cause]
        cause: io::Error
    },
    #[fail(display = "{}", _0)]
    Table(#[cause] TableError),
}
impl MappingsError {
    #[inline]
    pub fn resource<C: Into<String>>(context: C, cause: io::Error) -> MappingsError {
        MappingsError::Resource { context: context.into(), cause }
    }
    /// The format error which aborted the load, if any
    #[inline]
    pub fn format_error(&self) -> Option<&FormatError> {
        match *self {
            MappingsError::Format(ref e) => Some(e),
            _ => None
        }
    }
}
impl From<FormatError> for MappingsError {
    #[inline]
    fn from(e: FormatError) -> Self {
        MappingsError::Format(e)
    }
}
impl From<TableError> for MappingsError {
    #[inline]
    fn from(e: TableError) -> Self {
        MappingsError::Table(e)
    }
}
impl From<io::Error> for MappingsError {
    #[inline]
    fn from(e: io::Error) -> Self {
        MappingsError::resource("I/O error", e)
    }
}
