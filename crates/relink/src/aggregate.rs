use crate::compose::{InstructionRecord, compose, compose_blank, compose_unclaimed};
use crate::matcher::{Match, match_intrinsic};
use crate::opcode::canonicalize;
use crate::options::Options;
use crate::records::{Database, IntrinsicRecord, OpcodeEntry};
use log::debug;
use std::collections::BTreeSet;

/// Links every opcode of `db` and returns the records sorted by opcode.
///
/// The sort is stable: records of one opcode keep the order in which their
/// intrinsics appear in the database.
pub fn relink(db: &Database, options: &Options) -> Vec<InstructionRecord> {
    let mut records = db
        .iter()
        .flat_map(|(opcode, entry)| relink_opcode(opcode, entry, options))
        .collect::<Vec<_>>();
    records.sort_by(|a, b| a.brief.opcode.cmp(&b.brief.opcode));
    records
}

/// Links the intrinsics, descriptions and latency rows of one opcode.
///
/// Every intrinsic yields at least one record; descriptions no intrinsic
/// selected are emitted on their own afterwards. An opcode without
/// intrinsics is handled as if it had a single form-less one, so that each of
/// its descriptions, or failing that its bare table entry, still shows up.
pub fn relink_opcode(opcode: &str, entry: &OpcodeEntry, options: &Options) -> Vec<InstructionRecord> {
    if canonicalize(opcode).is_empty() {
        debug!("skipping `{opcode}`: not a mnemonic");
        return Vec::new();
    }

    let placeholder = [IntrinsicRecord::default()];
    let intrinsics = match entry.intrinsics() {
        [] => &placeholder[..],
        intrinsics => intrinsics,
    };
    let descriptions = entry.descriptions();
    let tables = &entry.table;

    if descriptions.is_empty() {
        return intrinsics
            .iter()
            .map(|intr| compose_blank(opcode, intr, options))
            .collect();
    }

    let mut records = Vec::new();
    let mut claimed = BTreeSet::new();
    for intr in intrinsics {
        match match_intrinsic(opcode, intr, descriptions, tables, options) {
            Match::Unconstrained(selections) => {
                for selection in selections {
                    claimed.insert(selection.index);
                    records.push(compose(opcode, intr, selection));
                }
            }
            Match::Unique(selection) => {
                claimed.insert(selection.index);
                records.push(compose(opcode, intr, selection));
            }
            Match::NoMatch => records.push(compose_blank(opcode, intr, options)),
        }
    }

    for (index, description) in descriptions.iter().enumerate() {
        if !claimed.contains(&index) {
            records.push(compose_unclaimed(opcode, index, description, tables, options));
        }
    }
    records
}
