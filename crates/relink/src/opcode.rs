//! Canonical opcode keys.
//!
//! Every source spells mnemonics differently (`ADD`, `add{s}`, `vaddq_s32`,
//! `STADDAL`...). All of them are reduced to one lower-case key, which is the
//! bucket under which records of the same instruction family are grouped.

use crate::records::SequenceStep;
use std::collections::BTreeSet;

/// Irregular mnemonics which the heuristic split cannot reduce correctly.
///
/// The `st<op>a*` store forms do not exist as instructions of their own; the
/// acquire variants are documented under the plain `st<op>` / `st<op>l`
/// aliases.
fn lookup_override(op: &str) -> Option<&'static str> {
    let canonical = match op {
        "vmov" => "xtn",
        "sra" => "ssra",
        "revsh" => "rev",
        "stadda" => "stadd",
        "stclra" => "stclr",
        "steora" => "steor",
        "stseta" => "stset",
        "stsmaxa" => "stsmax",
        "stsmina" => "stsmin",
        "stumaxa" => "stumax",
        "stumina" => "stumin",
        "staddal" => "staddl",
        "staddalb" => "staddlb",
        "staddalh" => "staddlh",
        "stclral" => "stclrl",
        "stclralb" => "stclrlb",
        "stclralh" => "stclrlh",
        "steoral" => "steorl",
        "steoralb" => "steorlb",
        "steoralh" => "steorlh",
        "stsetal" => "stsetl",
        "stsetalb" => "stsetlb",
        "stsetalh" => "stsetlh",
        "stsmaxal" => "stsmaxl",
        "stsmaxalb" => "stsmaxlb",
        "stsmaxalh" => "stsmaxlh",
        "stsminal" => "stsminl",
        "stsminalb" => "stsminlb",
        "stsminalh" => "stsminlh",
        "stumaxal" => "stumaxl",
        "stumaxalb" => "stumaxlb",
        "stumaxalh" => "stumaxlh",
        "stuminal" => "stuminl",
        "stuminalb" => "stuminlb",
        "stuminalh" => "stuminlh",
        _ => return None,
    };
    Some(canonical)
}

/// Reduces a raw mnemonic to its canonical opcode key.
///
/// The override table wins; otherwise surrounding digits and whitespace are
/// stripped and the leading alphabetic run is kept. The result is always
/// lower-case, alphabetic and a fixed point of this function.
///
/// ```
/// use opa64_relink::canonicalize;
/// assert_eq!(canonicalize("STADDA"), "stadd");
/// assert_eq!(canonicalize("sqxtn{2}"), "sqxtn");
/// ```
pub fn canonicalize(raw: &str) -> String {
    let raw = raw.to_lowercase();
    if let Some(op) = lookup_override(&raw) {
        return op.to_string();
    }
    let trimmed = raw.trim_matches(|c: char| c.is_ascii_digit() || c.is_whitespace());
    let head = trimmed
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("");
    lookup_override(head).unwrap_or(head).to_string()
}

/// Extracts the opcode an intrinsic stands for.
///
/// Returns `(canonical, raw)`, both lower-case. A single-instruction
/// expansion names its instruction directly; for emulated intrinsics the
/// function name is used instead, with the `v` prefix, a `q` (saturating)
/// prefix and the `q` (128-bit) suffix removed, e.g. `vqtbx4q_s8` gives `tbx`.
pub fn intrinsic_opcode(declaration: &str, sequence: &[SequenceStep]) -> (String, String) {
    let raw = if sequence.len() > 1 {
        let name = declaration
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|s| !s.is_empty())
            .nth(1)
            .unwrap_or("")
            .to_lowercase();
        let name = name.split('_').next().unwrap_or("");
        let name = name.strip_prefix('v').unwrap_or(name);
        let name = name.strip_prefix('q').unwrap_or(name);
        name.strip_suffix('q').unwrap_or(name).to_string()
    } else {
        sequence
            .first()
            .map(|step| step.mnemonic.to_lowercase())
            .unwrap_or_default()
    };

    (canonicalize(&raw), raw)
}

/// Collects the opcodes named by an architecture-reference heading.
///
/// Headings read like `ADD, ADDS (vector)` or `FMLAL, FMLAL2 (by element)`:
/// every fully upper-case word is a mnemonic, the parenthesised qualifiers are
/// not. The result is deduplicated and sorted.
pub fn heading_opcodes(heading: &str) -> Vec<String> {
    heading
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| is_upper(word))
        .map(canonicalize)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}
