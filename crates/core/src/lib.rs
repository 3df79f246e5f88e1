pub mod document;
pub mod host;
pub mod memory_host;
pub mod range;
pub mod style;

pub use document::{Document, DocumentError, DocumentFormat, StyleRun};
pub use host::{
    HostDocument, HostError, HostErrorKind, HostSearchOptions, InsertLocation, TextSpan,
};
pub use memory_host::{HostCallStats, MemoryHost};
pub use range::{RangeError, TextRange};
pub use style::{Color, ColorParseError, FontFormat, TextStyle, Underline};
