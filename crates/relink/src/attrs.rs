//! Encoding-class attributes of the architecture reference and their merger.

use crate::opcode::canonicalize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key of an encoding-class attribute.
///
/// The named variants are the keys the matcher and the composer read; every
/// other documented key is kept verbatim in [`Tag::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    /// `instr-class`: `general`, `advsimd`, `fpsimd`, `float`...
    InstrClass,
    /// `feature`: architecture extension required, e.g. `feat_fp16`.
    Feature,
    /// `cond-setting`: whether the flags are written.
    CondSetting,
    /// `datatype`: `-`-separated element types.
    Datatype,
    /// `mnemonic`: mnemonic of this encoding class.
    Mnemonic,
    /// `advsimd-type`: `simd` or `sisd`.
    AdvsimdType,
    /// `gen`: architecture variant name.
    ArchVariant,
    /// Any other key.
    Other(String),
}

impl Tag {
    /// Returns the key as written in the reference.
    pub fn as_str(&self) -> &str {
        match self {
            Tag::InstrClass => "instr-class",
            Tag::Feature => "feature",
            Tag::CondSetting => "cond-setting",
            Tag::Datatype => "datatype",
            Tag::Mnemonic => "mnemonic",
            Tag::AdvsimdType => "advsimd-type",
            Tag::ArchVariant => "gen",
            Tag::Other(name) => name,
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Tag {
        match name {
            "instr-class" => Tag::InstrClass,
            "feature" => Tag::Feature,
            "cond-setting" => Tag::CondSetting,
            "datatype" => Tag::Datatype,
            "mnemonic" => Tag::Mnemonic,
            "advsimd-type" => Tag::AdvsimdType,
            "gen" => Tag::ArchVariant,
            other => Tag::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Tag, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Tag::from(name.as_str()))
    }
}

/// Attributes of one encoding class (`<iclass>`) of an instruction section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodingClassAttributes {
    /// Document variables, lower-cased.
    #[serde(default)]
    pub tags: BTreeMap<Tag, String>,
    /// Form signatures expanded from `asm`, sorted.
    #[serde(default)]
    pub forms: Vec<String>,
    /// Canonicalized assembly templates.
    #[serde(default)]
    pub asm: Vec<String>,
    /// Canonicalized template this class is an alias of, or empty.
    #[serde(default)]
    pub equiv: String,
}

impl EncodingClassAttributes {
    /// Looks up a tag value.
    pub fn tag(&self, tag: &Tag) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    /// Looks up a tag value, defaulting to the empty string.
    pub fn tag_or_empty(&self, tag: &Tag) -> &str {
        self.tag(tag).unwrap_or("")
    }

    /// First token of every assembly template.
    pub fn template_mnemonics(&self) -> impl Iterator<Item = &str> + '_ {
        self.asm
            .iter()
            .map(|asm| asm.split(' ').next().unwrap_or(""))
    }

    /// The mnemonic of this class: the `mnemonic` tag, else the first
    /// token of the first template.
    pub fn mnemonic(&self) -> Option<&str> {
        self.tag(&Tag::Mnemonic)
            .or_else(|| self.template_mnemonics().next())
    }

    fn absorb(&mut self, other: &EncodingClassAttributes, separator: &str) {
        for (tag, value) in &other.tags {
            match self.tags.get_mut(tag) {
                None => {
                    self.tags.insert(tag.clone(), value.clone());
                }
                Some(current) => join_string(current, value, separator),
            }
        }
        join_list(&mut self.forms, &other.forms);
        join_list(&mut self.asm, &other.asm);
        join_string(&mut self.equiv, &other.equiv, separator);
    }
}

fn join_string(current: &mut String, value: &str, separator: &str) {
    if current == value || value.is_empty() {
        return;
    }
    if current.is_empty() {
        *current = value.to_string();
        return;
    }
    current.push_str(separator);
    current.push_str(value);
}

fn join_list(current: &mut Vec<String>, value: &[String]) {
    if current.as_slice() != value {
        current.extend_from_slice(value);
    }
}

/// Collapses the encoding classes of one section into a single attribute
/// set.
///
/// Classes whose mnemonic canonicalizes to `opcode` are preferred; if there
/// are none every class takes part. Conflicting string values are joined with
/// `separator` and differing lists are concatenated, so the result depends on
/// the input order.
pub fn merge(
    opcode: &str,
    attrs: &[EncodingClassAttributes],
    separator: &str,
) -> EncodingClassAttributes {
    let own = attrs
        .iter()
        .filter(|a| a.mnemonic().is_some_and(|m| canonicalize(m) == opcode))
        .collect::<Vec<_>>();
    let selected = if own.is_empty() {
        attrs.iter().collect()
    } else {
        own
    };

    let mut merged = EncodingClassAttributes::default();
    for a in selected {
        merged.absorb(a, separator);
    }
    merged
}
