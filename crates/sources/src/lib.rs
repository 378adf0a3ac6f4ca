//! Source documents of the opa64 instruction database.
//!
//! This crate knows where the documents are published ([`DOCUMENTS`]) and
//! turns each of them into per-opcode records:
//!
//! * the latency tables of the optimization guides and the intrinsics
//!   reference are PDF documents, read through a [`TableExtractor`];
//! * the architecture reference is a tree of XML files, read with
//!   `roxmltree`.
//!
//! [`parse_document`] dispatches on the document kind and
//! [`Parsed::merge_into`] files the result into the unified [`Database`].

#![deny(missing_docs)]

pub mod description;
mod docs;
mod error;
mod intrinsics;
mod sanitize;
mod table;

pub use crate::docs::{DOCUMENTS, Document, DocumentKind, resolve};
pub use crate::error::{Error, Result};
pub use crate::intrinsics::parse_intrinsics;
pub use crate::sanitize::{Mode, sanitize};
pub use crate::table::{JsonPages, TableExtractor, TabularPage, parse_latency_tables};

use log::info;
use opa64_relink::{Database, DescriptionRecord, IntrinsicRecord, TableRow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The records read from one document, keyed by canonical opcode.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// Latency rows of one microarchitecture.
    Table {
        /// Short microarchitecture name, e.g. `a55`.
        arch: String,
        #[allow(missing_docs)]
        rows: BTreeMap<String, Vec<TableRow>>,
    },
    /// Rows of the intrinsics reference.
    Intrinsics(BTreeMap<String, Vec<IntrinsicRecord>>),
    /// Sections of the architecture reference.
    Description(BTreeMap<String, Vec<DescriptionRecord>>),
}

impl Parsed {
    /// Number of opcodes covered.
    pub fn len(&self) -> usize {
        match self {
            Parsed::Table { rows, .. } => rows.len(),
            Parsed::Intrinsics(map) => map.len(),
            Parsed::Description(map) => map.len(),
        }
    }

    /// Whether no opcode is covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Files the records into `db`, replacing whatever an earlier parse of
    /// the same document left there.
    pub fn merge_into(self, db: &mut Database) {
        match self {
            Parsed::Table { arch, rows } => {
                for (opcode, rows) in rows {
                    db.entry(opcode).or_default().table.insert(arch.clone(), rows);
                }
            }
            Parsed::Intrinsics(map) => {
                for (opcode, intrinsics) in map {
                    db.entry(opcode).or_default().intrinsics = Some(intrinsics);
                }
            }
            Parsed::Description(map) => {
                for (opcode, descriptions) in map {
                    db.entry(opcode).or_default().description = Some(descriptions);
                }
            }
        }
    }
}

/// Directory the XML archive of the architecture reference is expected to
/// be extracted to: its file name without `.tar.gz`.
pub fn reference_dir(doc: &Document, dir: &Path) -> PathBuf {
    let name = doc.file_name();
    dir.join(name.strip_suffix(".tar.gz").unwrap_or(name))
}

/// Reads one document from the working directory `dir`.
pub fn parse_document(
    doc: &Document,
    dir: &Path,
    extractor: &dyn TableExtractor,
) -> Result<Parsed> {
    info!("parsing {}", doc.specifier());
    let parsed = match doc.kind {
        DocumentKind::Description => {
            Parsed::Description(description::parse_reference_dir(&reference_dir(doc, dir))?)
        }
        DocumentKind::Intrinsics => {
            let pages = extractor.extract(&doc.local_path(dir))?;
            Parsed::Intrinsics(parse_intrinsics(&pages))
        }
        DocumentKind::Table(arch) => {
            let pages = extractor.extract(&doc.local_path(dir))?;
            Parsed::Table {
                arch: arch.to_string(),
                rows: parse_latency_tables(&pages),
            }
        }
    };
    info!("{}: {} opcodes", doc.specifier(), parsed.len());
    Ok(parsed)
}
