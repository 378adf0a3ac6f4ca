//! Latency tables of the software optimization guides.

use crate::error::{Error, Result};
use crate::sanitize::{Mode, sanitize};
use log::debug;
use opa64_relink::form::{classify_variant, split_variant};
use opa64_relink::{TableRow, canonicalize};
use regex::Regex;
use serde_derive::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// One table found on a page of a PDF document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TabularPage {
    /// 1-based page number.
    pub page: usize,
    /// Cells, header row first.
    pub rows: Vec<Vec<String>>,
}

impl TabularPage {
    /// Returns the sanitized, lower-cased cells of row `index`.
    pub(crate) fn cells(&self, index: usize) -> Vec<String> {
        self.rows
            .get(index)
            .map(|row| {
                row.iter()
                    .map(|cell| sanitize(cell, Mode::SingleLine).to_lowercase())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Reads cell `column`, or the empty string for short rows.
pub(crate) fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

/// Extraction of tables from a PDF document.
pub trait TableExtractor {
    /// Returns every table of the document at `path`, in page order.
    fn extract(&self, path: &Path) -> Result<Vec<TabularPage>>;
}

/// Reads tables that have been extracted beforehand into a JSON sidecar,
/// `<document>.json`, holding an array of [`TabularPage`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPages;

impl JsonPages {
    /// Path of the sidecar of `document`.
    pub fn sidecar(document: &Path) -> PathBuf {
        let mut name = document.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

impl TableExtractor for JsonPages {
    fn extract(&self, path: &Path) -> Result<Vec<TabularPage>> {
        let sidecar = JsonPages::sidecar(path);
        if !sidecar.exists() {
            return Err(Error::NotFound(sidecar));
        }
        let text = fs::read_to_string(&sidecar).map_err(|source| Error::Io {
            path: sidecar.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            path: sidecar,
            source,
        })
    }
}

/// `add{s}` or `ld1(r)`: a base mnemonic with an optional suffix.
static OPTIONAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)[\({](.+)[\)}]").unwrap());

/// Splits a mnemonic cell such as `add{s}, sub{s}` or `ldnp/stnp` into the
/// mnemonics it lists.
fn cell_mnemonics(text: &str) -> Vec<String> {
    let mut mnemonics = Vec::new();
    for entry in text.split(|c: char| c == ',' || c == '/') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (base, suffix) = match OPTIONAL_SUFFIX.captures(entry) {
            Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
            None => (entry.to_string(), String::new()),
        };
        let extended = format!("{base}{suffix}");
        mnemonics.push(base);
        if !suffix.is_empty() {
            mnemonics.push(extended);
        }
    }
    mnemonics
}

fn is_latency_table(page: &TabularPage) -> bool {
    let header = page.cells(0);
    cell(&header, 0).starts_with("instruction") && cell(&header, 1).starts_with("aarch64")
}

/// Reads the instruction tables of one optimization guide.
///
/// Only tables whose header reads `Instruction Group | AArch64
/// Instructions | ...` are considered. The returned rows are keyed by
/// canonical opcode; a row listing several mnemonics is repeated under each
/// of them.
pub fn parse_latency_tables(pages: &[TabularPage]) -> BTreeMap<String, Vec<TableRow>> {
    let mut insns: BTreeMap<String, Vec<TableRow>> = BTreeMap::new();
    for page in pages {
        if !is_latency_table(page) {
            debug!("page {}: not an instruction table, skipped", page.page);
            continue;
        }
        for index in 1..page.rows.len() {
            let row = page.cells(index);
            let variant = cell(&row, 0);
            let (iclass, itype) = classify_variant(variant);
            for op_raw in cell_mnemonics(cell(&row, 1)) {
                insns
                    .entry(canonicalize(&op_raw))
                    .or_default()
                    .push(TableRow {
                        op_raw,
                        iclass,
                        itype,
                        variant: split_variant(variant),
                        latency: cell(&row, 2).to_string(),
                        throughput: cell(&row, 3).to_string(),
                        pipes: cell(&row, 4).to_string(),
                        notes: cell(&row, 5).to_string(),
                        page: Some(page.page),
                    });
            }
        }
    }
    insns
}
