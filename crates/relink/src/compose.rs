//! Output records.
//!
//! The field names of the serialized records are deliberately short; they
//! are consumed by the viewer and must not change.

use crate::attrs::{Tag, merge};
use crate::matcher::Selection;
use crate::options::Options;
use crate::records::{DescriptionRecord, IntrinsicRecord, Tables};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity of a linked instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Brief {
    /// `instr-class` tag, `unknown` when nothing was linked.
    #[serde(rename = "ic")]
    pub instruction_class: String,
    /// Required architecture feature.
    #[serde(rename = "ft")]
    pub feature: String,
    /// Opcode as spelled by the intrinsic, else the canonical key.
    #[serde(rename = "op")]
    pub opcode: String,
    /// Intrinsic declaration, empty for bare instructions.
    #[serde(rename = "it")]
    pub intrinsic: String,
    /// Assembly templates, or the intrinsic's expansion for blank records.
    #[serde(rename = "as")]
    pub assembly: Vec<String>,
    /// Template this instruction is an alias of.
    #[serde(rename = "eq")]
    pub equivalent: String,
    /// Condition-flag setting.
    #[serde(rename = "cs")]
    pub condition_setting: String,
    /// Reference file the description was read from.
    #[serde(rename = "sf")]
    pub source_file: String,
    /// Page of the intrinsics reference, if known.
    #[serde(rename = "sp")]
    pub source_page: Option<usize>,
}

/// Prose of a linked instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Description {
    /// One-line summary.
    #[serde(rename = "br")]
    pub brief: String,
    /// Detailed description.
    #[serde(rename = "dt")]
    pub detailed: String,
    /// Pseudocode.
    #[serde(rename = "ot")]
    pub operation: String,
}

/// One entry of the relinked output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionRecord {
    #[allow(missing_docs)]
    #[serde(rename = "bf")]
    pub brief: Brief,
    #[allow(missing_docs)]
    #[serde(rename = "ds")]
    pub description: Description,
    /// Latency rows per microarchitecture.
    #[serde(rename = "tb")]
    pub tables: Tables,
}

fn opcode_of(opcode: &str, intrinsic: &IntrinsicRecord) -> String {
    if intrinsic.op_raw.is_empty() {
        opcode.to_string()
    } else {
        intrinsic.op_raw.clone()
    }
}

/// Builds the record of an intrinsic linked to `selection`.
pub fn compose(opcode: &str, intrinsic: &IntrinsicRecord, selection: Selection<'_>) -> InstructionRecord {
    let attrs = &selection.attrs;
    let description = selection.description;
    InstructionRecord {
        brief: Brief {
            instruction_class: attrs.tag_or_empty(&Tag::InstrClass).to_string(),
            feature: attrs.tag_or_empty(&Tag::Feature).to_string(),
            opcode: opcode_of(opcode, intrinsic),
            intrinsic: intrinsic.intrinsic.clone(),
            assembly: attrs.asm.clone(),
            equivalent: attrs.equiv.clone(),
            condition_setting: attrs.tag_or_empty(&Tag::CondSetting).to_string(),
            source_file: description.file.clone(),
            source_page: intrinsic.page,
        },
        description: Description {
            brief: description.brief.clone(),
            detailed: description.desc.clone(),
            operation: description.operation.clone(),
        },
        tables: trim_common_variants(selection.tables),
    }
}

/// Builds the record of an intrinsic nothing could be linked to.
pub fn compose_blank(opcode: &str, intrinsic: &IntrinsicRecord, options: &Options) -> InstructionRecord {
    let instruction_class = if options.is_vector_shuffle(opcode) {
        "advsimd"
    } else {
        "unknown"
    };
    InstructionRecord {
        brief: Brief {
            instruction_class: instruction_class.to_string(),
            opcode: opcode_of(opcode, intrinsic),
            intrinsic: intrinsic.intrinsic.clone(),
            assembly: intrinsic.sequence.iter().map(ToString::to_string).collect(),
            source_page: intrinsic.page,
            ..Default::default()
        },
        description: Description::default(),
        tables: Tables::new(),
    }
}

/// Builds the record of a description no intrinsic selected.
pub fn compose_unclaimed(
    opcode: &str,
    index: usize,
    description: &DescriptionRecord,
    tables: &Tables,
    options: &Options,
) -> InstructionRecord {
    let selection = Selection {
        index,
        description,
        attrs: merge(opcode, &description.attrs, &options.merge_separator),
        tables: tables.clone(),
    };
    compose(opcode, &IntrinsicRecord::default(), selection)
}

/// Removes the variant tags shared by every row of every microarchitecture.
///
/// Once the rows have been narrowed to one instruction class, tags such as
/// `asimd` carry no information. A lone row keeps all of its tags.
pub fn trim_common_variants(mut tables: Tables) -> Tables {
    let mut rows = tables.values().flatten();
    let Some(first) = rows.next() else {
        return tables;
    };
    let mut common = first.variant.iter().cloned().collect::<BTreeSet<_>>();
    let mut count = 1;
    for row in rows {
        common.retain(|tag| row.variant.contains(tag));
        count += 1;
    }
    if count < 2 || common.is_empty() {
        return tables;
    }

    for row in tables.values_mut().flatten() {
        row.variant.retain(|tag| !common.contains(tag));
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::EncodingClassAttributes;
    use crate::records::{InstructionClass, InstructionType, SequenceStep, TableRow};

    fn row(variant: &[&str]) -> TableRow {
        TableRow {
            op_raw: "fadd".to_string(),
            iclass: InstructionClass::Asimd,
            itype: InstructionType::Any,
            variant: variant.iter().map(|s| s.to_string()).collect(),
            latency: "3".to_string(),
            throughput: "2".to_string(),
            pipes: "v".to_string(),
            notes: String::new(),
            page: Some(12),
        }
    }

    #[test]
    fn trimming() {
        let mut tables = Tables::new();
        tables.insert("a55".to_string(), vec![row(&["asimd", "fp arith", "d-form"])]);
        tables.insert("a72".to_string(), vec![row(&["asimd", "fp arith", "q-form"])]);
        let trimmed = trim_common_variants(tables);
        assert_eq!(trimmed["a55"][0].variant, ["d-form"]);
        assert_eq!(trimmed["a72"][0].variant, ["q-form"]);
    }

    #[test]
    fn single_row_is_not_trimmed() {
        let mut tables = Tables::new();
        tables.insert("a55".to_string(), vec![row(&["asimd", "fp arith"])]);
        tables.insert("a72".to_string(), vec![]);
        let trimmed = trim_common_variants(tables.clone());
        assert_eq!(trimmed, tables);
        assert!(trim_common_variants(Tables::new()).is_empty());
    }

    #[test]
    fn blank_records() {
        let intr = IntrinsicRecord {
            op_raw: "zip1".to_string(),
            intrinsic: "int8x8_t vzip1_s8(int8x8_t a, int8x8_t b)".to_string(),
            sequence: vec![SequenceStep::from("zip1 vd.8b,vn.8b,vm.8b".to_string())],
            ..Default::default()
        };
        let record = compose_blank("zip", &intr, &Options::default());
        assert_eq!(record.brief.instruction_class, "advsimd");
        assert_eq!(record.brief.opcode, "zip1");
        assert_eq!(record.brief.assembly, ["zip1 vd.8b,vn.8b,vm.8b"]);
        assert!(record.tables.is_empty());

        let record = compose_blank("frobnicate", &IntrinsicRecord::default(), &Options::default());
        assert_eq!(record.brief.instruction_class, "unknown");
        assert_eq!(record.brief.opcode, "frobnicate");
    }

    #[test]
    fn short_keys() {
        let description = DescriptionRecord {
            file: "add_addsub_shift.xml".to_string(),
            attrs: vec![EncodingClassAttributes {
                tags: [(Tag::InstrClass, "general".to_string())].into_iter().collect(),
                asm: vec!["add wd,wn,wm".to_string()],
                ..Default::default()
            }],
            brief: "Add (shifted register)".to_string(),
            ..Default::default()
        };
        let record =
            compose_unclaimed("add", 0, &description, &Tables::new(), &Options::default());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bf"]["ic"], "general");
        assert_eq!(json["bf"]["op"], "add");
        assert_eq!(json["bf"]["as"][0], "add wd,wn,wm");
        assert_eq!(json["bf"]["sf"], "add_addsub_shift.xml");
        assert_eq!(json["ds"]["br"], "Add (shifted register)");
        assert!(json["bf"]["sp"].is_null());
        assert!(json["tb"].as_object().unwrap().is_empty());
    }
}
