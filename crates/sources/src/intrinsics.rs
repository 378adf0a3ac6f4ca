//! The NEON intrinsics reference.

use crate::table::{TabularPage, cell};
use log::debug;
use opa64_relink::IntrinsicRecord;
use opa64_relink::form::{intrinsic_form, recompose_sequence};
use opa64_relink::intrinsic_opcode;
use std::collections::BTreeMap;

/// Reads the intrinsic tables of the reference.
///
/// Each row holds the declaration, the argument preparation and the
/// instruction sequence the intrinsic expands to. Rows are keyed by the
/// canonical opcode of the intrinsic.
pub fn parse_intrinsics(pages: &[TabularPage]) -> BTreeMap<String, Vec<IntrinsicRecord>> {
    let mut insns: BTreeMap<String, Vec<IntrinsicRecord>> = BTreeMap::new();
    for page in pages {
        if !cell(&page.cells(0), 0).starts_with("intrinsic") {
            debug!("page {}: not an intrinsics table, skipped", page.page);
            continue;
        }
        for index in 1..page.rows.len() {
            let row = page.cells(index);
            let declaration = cell(&row, 0);
            let sequence = recompose_sequence(cell(&row, 2));
            let (opcode, op_raw) = intrinsic_opcode(declaration, &sequence);
            let (form, datatypes) = intrinsic_form(declaration, &sequence);
            insns.entry(opcode).or_default().push(IntrinsicRecord {
                op_raw,
                form: Some(form),
                datatypes,
                intrinsic: declaration.to_string(),
                sequence,
                page: Some(page.page),
            });
        }
    }
    insns
}
