//! Cross-source reconciliation of AArch64 instruction documentation.
//!
//! Three documents describe the same instructions in three incompatible
//! shapes: latency tables from the optimization guides, the NEON intrinsics
//! reference, and the XML architecture reference. Each of them is parsed (by
//! `opa64-sources`) into records keyed by a canonical opcode, and this crate
//! links those records together:
//!
//! * [`canonicalize`] turns any mnemonic spelling into the bucket key;
//! * [`form`] derives comparable operand-shape signatures from each source;
//! * [`merge`] folds several encoding classes into one attribute set;
//! * [`match_intrinsic`] picks the single encoding class (and latency rows)
//!   an intrinsic corresponds to, or reports that none can be picked;
//! * [`compose`] and [`relink`] build and sort the final records.
//!
//! Nothing in this crate performs I/O or fails: ambiguity is a value
//! ([`Match::NoMatch`]), not an error.

#![deny(missing_docs)]

mod aggregate;
mod attrs;
pub mod compose;
pub mod form;
mod matcher;
mod opcode;
mod options;
mod records;

pub use crate::aggregate::{relink, relink_opcode};
pub use crate::attrs::{EncodingClassAttributes, Tag, merge};
pub use crate::compose::{Brief, Description, InstructionRecord};
pub use crate::matcher::{Match, Selection, filter_tables, match_intrinsic};
pub use crate::opcode::{canonicalize, heading_opcodes, intrinsic_opcode};
pub use crate::options::Options;
pub use crate::records::*;
