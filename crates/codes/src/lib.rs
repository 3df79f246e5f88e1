//! Unique `fc-DDD-DDD` codes for word-processor documents.
//!
//! A [`Stamper`] scans its document host for codes already present, draws a
//! fresh one, and later inserts it at the cursor with a fixed style. The
//! building blocks ([`scan_codes`], [`generate_unique`], [`insert_pending`])
//! are usable on their own against any [`fcstamp_core::HostDocument`].

pub mod code;
pub mod controls;
pub mod error;
pub mod generator;
pub mod inserter;
pub mod pending;
pub mod scanner;
pub mod session;

pub use code::{Code, CODE_PATTERN, MAX_UNIQUE_CODES, PLACEHOLDER};
pub use controls::{BusyGuard, Controls, Phase};
pub use error::CodeError;
pub use generator::{
    generate_unique, CodeSource, GeneratorPolicy, RngSource, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_WARN_MARGIN,
};
pub use inserter::{code_style, insert_pending};
pub use pending::PendingCode;
pub use scanner::{scan_codes, ExistingCodes};
pub use session::{InsertOutcome, StampConfig, Stamper, StatusKind, StatusMessage};
