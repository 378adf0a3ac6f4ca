use crate::attrs::EncodingClassAttributes;
use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse instruction class of a latency-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionClass {
    /// Advanced SIMD, crypto and vector floating point.
    Asimd,
    /// Scalar floating point.
    Float,
    /// General-purpose integer, memory and branch instructions.
    General,
}

impl InstructionClass {
    /// Maps the `instr-class` tag of the architecture reference onto the
    /// class vocabulary of the latency tables.
    pub fn from_reference_tag(tag: &str) -> Option<InstructionClass> {
        match tag {
            "advsimd" | "fpsimd" | "asimd" => Some(InstructionClass::Asimd),
            "float" => Some(InstructionClass::Float),
            "general" => Some(InstructionClass::General),
            _ => None,
        }
    }
}

/// Scalar/vector shape of a latency-table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionType {
    /// Operates on a single element.
    Scalar,
    /// Operates on packed vectors.
    Vector,
    /// The table does not tell.
    Any,
}

/// One row of a microarchitecture latency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Mnemonic as spelled in the table, after `{ext}` expansion.
    pub op_raw: String,
    /// Class derived from the variant text.
    pub iclass: InstructionClass,
    /// Shape derived from the variant text.
    pub itype: InstructionType,
    /// Comma-separated variant description, one entry per tag.
    pub variant: Vec<String>,
    #[allow(missing_docs)]
    pub latency: String,
    #[allow(missing_docs)]
    pub throughput: String,
    /// Pipelines the instruction issues to.
    pub pipes: String,
    /// Footnote references.
    pub notes: String,
    /// Page of the guide the row was read from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

/// Latency rows of one opcode, keyed by microarchitecture in document order.
pub type Tables = IndexMap<String, Vec<TableRow>>;

/// One instruction of an intrinsic's expansion.
///
/// Serialized as the single string `"mnemonic operands"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SequenceStep {
    /// Lower-case mnemonic.
    pub mnemonic: String,
    /// Operand list as written, possibly empty.
    pub operands: String,
}

impl From<String> for SequenceStep {
    fn from(s: String) -> SequenceStep {
        let s = s.trim();
        let (mnemonic, operands) = s.split_once(' ').unwrap_or((s, ""));
        SequenceStep {
            mnemonic: mnemonic.to_lowercase(),
            operands: operands.trim().to_string(),
        }
    }
}

impl From<SequenceStep> for String {
    fn from(step: SequenceStep) -> String {
        step.to_string()
    }
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

/// One row of the intrinsics reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntrinsicRecord {
    /// Opcode as extracted from the expansion or the function name.
    pub op_raw: String,
    /// Form signature, see [`crate::form::intrinsic_form`].
    #[serde(default)]
    pub form: Option<String>,
    /// Datatype tags of the declaration (`8`, `half`, `double`...).
    #[serde(default)]
    pub datatypes: Vec<String>,
    /// Full C declaration.
    pub intrinsic: String,
    /// Expanded instruction sequence.
    #[serde(default)]
    pub sequence: Vec<SequenceStep>,
    /// Page of the reference the row was read from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl IntrinsicRecord {
    /// Returns the form signature, treating an empty one as absent.
    pub fn form(&self) -> Option<&str> {
        self.form.as_deref().filter(|f| !f.is_empty())
    }
}

/// One instruction section of the architecture reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DescriptionRecord {
    /// Path of the XML file inside the reference archive.
    pub file: String,
    /// One attribute set per encoding class.
    #[serde(default)]
    pub attrs: Vec<EncodingClassAttributes>,
    /// One-line summary.
    pub brief: String,
    /// Description and authored notes.
    pub desc: String,
    /// Pseudocode, newlines preserved.
    pub operation: String,
}

/// Everything the sources know about one canonical opcode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OpcodeEntry {
    /// Latency rows per microarchitecture.
    #[serde(default)]
    pub table: Tables,
    /// Intrinsics whose opcode canonicalizes to this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsics: Option<Vec<IntrinsicRecord>>,
    /// Reference sections naming this opcode in their heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<DescriptionRecord>>,
}

impl OpcodeEntry {
    /// Intrinsics of this opcode, empty when absent.
    pub fn intrinsics(&self) -> &[IntrinsicRecord] {
        self.intrinsics.as_deref().unwrap_or(&[])
    }

    /// Descriptions of this opcode, empty when absent.
    pub fn descriptions(&self) -> &[DescriptionRecord] {
        self.description.as_deref().unwrap_or(&[])
    }
}

/// The unified database, keyed by canonical opcode.
pub type Database = BTreeMap<String, OpcodeEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_strings() {
        let step = SequenceStep::from("add vd.4s,vn.4s,vm.4s".to_string());
        assert_eq!(step.mnemonic, "add");
        assert_eq!(step.operands, "vd.4s,vn.4s,vm.4s");
        assert_eq!(String::from(step), "add vd.4s,vn.4s,vm.4s");

        let upper = SequenceStep::from("ADD W0, W1, W2".to_string());
        assert_eq!(upper.mnemonic, "add");
        assert_eq!(upper.operands, "W0, W1, W2");

        let nop = SequenceStep::from("nop".to_string());
        assert_eq!(nop.operands, "");
        assert_eq!(nop.to_string(), "nop");
    }

    #[test]
    fn empty_form_is_absent() {
        let mut intr = IntrinsicRecord::default();
        assert_eq!(intr.form(), None);
        intr.form = Some(String::new());
        assert_eq!(intr.form(), None);
        intr.form = Some("VVV".to_string());
        assert_eq!(intr.form(), Some("VVV"));
    }

    #[test]
    fn entry_json() {
        let entry: OpcodeEntry = serde_json::from_str(
            r#"{"table": {"a55": [], "a72": []}, "intrinsics": [{
                "op_raw": "add", "form": "VVV", "datatypes": ["32"],
                "intrinsic": "int32x4_t vaddq_s32(int32x4_t a, int32x4_t b)",
                "sequence": ["add vd.4s,vn.4s,vm.4s"]
            }]}"#,
        )
        .unwrap();
        assert_eq!(entry.table.keys().collect::<Vec<_>>(), ["a55", "a72"]);
        assert_eq!(entry.intrinsics()[0].sequence[0].mnemonic, "add");
        assert!(entry.descriptions().is_empty());
    }

    #[test]
    fn reference_classes() {
        assert_eq!(
            InstructionClass::from_reference_tag("fpsimd"),
            Some(InstructionClass::Asimd)
        );
        assert_eq!(InstructionClass::from_reference_tag("system"), None);
    }
}
