//! Operand-form signatures.
//!
//! A signature is a string over a small alphabet, one letter per operand:
//! the register class (`b h w x s d q`, `r` for any general register), `v` /
//! `V` for 64-bit / 128-bit packed vectors, `i` for immediates, shifts and
//! lane indices, and `x` for a memory operand. The intrinsics reference and
//! the assembly templates of the architecture reference are both reduced to
//! this alphabet so that they can be compared.

use crate::records::{InstructionClass, InstructionType, SequenceStep};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Classifies the variant text of a latency-table row.
///
/// The first keyword found in the lower-cased word list wins.
pub fn classify_variant(variant: &str) -> (InstructionClass, InstructionType) {
    let variant = variant.to_lowercase();
    let words = variant
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .collect::<Vec<_>>();
    let has = |keyword: &str| words.contains(&keyword);

    use InstructionClass::*;
    use InstructionType::*;
    if has("asimd") || has("simd") || has("vector") {
        (Asimd, Any)
    } else if has("crypto") || has("vfp") {
        (Asimd, Vector)
    } else if has("fp") {
        (Float, Scalar)
    } else {
        (General, Scalar)
    }
}

/// Splits the variant text of a latency-table row into its tags.
pub fn split_variant(variant: &str) -> Vec<String> {
    variant.split(',').map(|s| s.trim().to_string()).collect()
}

const DELIMITERS: &str = "+-*/(){}[]";

/// Rebuilds the instruction sequence of an intrinsic from the joined text of
/// its table cell.
///
/// Words are alternately a mnemonic and its operand list. A word that is a
/// delimiter, follows a delimiter or a comma, or starts with a comma belongs
/// to the previous word. `(scalar)` markers are dropped. Mnemonics are
/// lower-cased; operands are kept as written.
pub fn recompose_sequence(text: &str) -> Vec<SequenceStep> {
    let mut words: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        if word == "(scalar)" {
            continue;
        }
        match words.last_mut() {
            Some(last)
                if DELIMITERS.contains(word)
                    || last.ends_with(|c: char| c == ',' || DELIMITERS.contains(c))
                    || word.starts_with(',') =>
            {
                last.push(' ');
                last.push_str(word);
            }
            _ => words.push(word.to_string()),
        }
    }

    words
        .chunks(2)
        .map(|pair| SequenceStep {
            mnemonic: pair[0].to_lowercase(),
            operands: pair.get(1).cloned().unwrap_or_default(),
        })
        .collect()
}

/// `(scalar pipe letter, SIMD&FP letter, element bits)` of a C element type.
fn element_type(base: &str) -> Option<(char, char, u32)> {
    Some(match base {
        "int8" | "uint8" | "poly8" => ('b', 'b', 8),
        "int16" | "uint16" | "poly16" => ('h', 'h', 16),
        "int32" | "uint32" | "poly32" => ('w', 's', 32),
        "int64" | "uint64" | "poly64" => ('x', 'd', 64),
        "float16" | "bfloat16" => ('h', 'h', 16),
        "float32" => ('s', 's', 32),
        "float64" => ('d', 'd', 64),
        _ => return None,
    })
}

fn datatype_tag(base: &str) -> Option<&'static str> {
    Some(match base {
        "int8" | "uint8" | "poly8" => "8",
        "int16" | "uint16" | "poly16" => "16",
        "int32" | "uint32" | "poly32" => "32",
        "int64" | "uint64" | "poly64" => "64",
        "float16" => "half",
        "bfloat16" => "bf16",
        "float32" => "single",
        "float64" => "double",
        _ => return None,
    })
}

/// Splits `int32x4_t` into `["int32", "4", "t"]`.
fn type_parts(ty: &str) -> Vec<&str> {
    ty.split(|c: char| c == '_' || c == 'x')
        .filter(|s| !s.is_empty())
        .collect()
}

fn type_signature(ty: &str) -> Option<char> {
    let parts = type_parts(ty);
    let (&base, &shape) = match parts.as_slice() {
        [base, ..] if *base == "const" => return Some('i'),
        [base, shape, ..] => (base, shape),
        _ => return None,
    };
    let (scalar, simd, bits) = element_type(base)?;
    match shape {
        "t" => Some(scalar),
        "1" => Some(simd),
        lanes => {
            let lanes = lanes.parse::<u32>().ok()?;
            Some(if lanes.checked_mul(bits) == Some(128) { 'V' } else { 'v' })
        }
    }
}

fn operand_signature(operand: &str) -> String {
    let mut sig = String::new();
    match operand.chars().next() {
        Some(c) if "bhwxrsdq".contains(c) => sig.push(c),
        Some('v') => {
            let arrangement = operand.split('.').nth(1).unwrap_or("");
            let wide = ["16b", "8h", "4s", "2d", "4w", "2x"].contains(&arrangement);
            sig.push(if wide { 'V' } else { 'v' });
        }
        _ => {}
    }
    if (operand.contains('[') && !operand.starts_with('[')) || operand.starts_with("imm") {
        sig.push('i');
    }
    if operand.starts_with('[') {
        sig.push('x');
    }
    if operand.starts_with('#') {
        sig.push('i');
    }
    sig
}

/// Derives the form signature and the datatype tags of an intrinsic.
///
/// A single-instruction expansion gives an operand-level signature read from
/// the instruction's operands. Longer expansions fall back to a type-level
/// signature of the return and argument types of `declaration`, since the
/// operand order of emulation sequences need not follow the declaration.
///
/// ```
/// use opa64_relink::form::{intrinsic_form, recompose_sequence};
/// let seq = recompose_sequence("add vd.4s,vn.4s,vm.4s");
/// let (form, datatypes) =
///     intrinsic_form("int32x4_t vaddq_s32(int32x4_t a, int32x4_t b)", &seq);
/// assert_eq!(form, "VVV");
/// assert_eq!(datatypes, ["32"]);
/// ```
pub fn intrinsic_form(declaration: &str, sequence: &[SequenceStep]) -> (String, Vec<String>) {
    let types = declaration
        .split(|c: char| c == '(' || c == ')' || c == ',')
        .map(|s| s.trim().split(' ').next().unwrap_or(""))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    let datatypes = types
        .iter()
        .filter_map(|ty| type_parts(ty).first().copied().and_then(datatype_tag))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    match sequence {
        [] => (String::new(), Vec::new()),
        [step] => {
            let form = step
                .operands
                .split(',')
                .map(|op| op.trim_matches(|c: char| c == '{' || c == '}' || c == ' '))
                .map(|op| operand_signature(&op.to_lowercase()))
                .collect();
            (form, datatypes)
        }
        _ => {
            let form = types.iter().filter_map(|ty| type_signature(ty)).collect();
            (form, datatypes)
        }
    }
}

/// Normalizes an assembly template to `mnemonic operands`, lower-case, with
/// the placeholder brackets and all spaces removed from the operands.
///
/// ```
/// use opa64_relink::form::canonicalize_template;
/// assert_eq!(
///     canonicalize_template("ADD  <Vd>.<T>, <Vn>.<T>, <Vm>.<T>"),
///     "add vd.t,vn.t,vm.t"
/// );
/// ```
pub fn canonicalize_template(asm: &str) -> String {
    let asm = asm.trim().to_lowercase();
    let (mnemonic, operands) = asm.split_once(' ').unwrap_or((asm.as_str(), ""));
    let mut mnemonic = mnemonic.to_string();
    let mut operands = operands.trim_start();
    if let Some(rest) = operands.strip_prefix("{2}") {
        mnemonic.push_str("{2}");
        operands = rest;
    }
    if operands.starts_with("<bt> <") {
        operands = &operands[5..];
    }
    let operands = operands
        .chars()
        .filter(|&c| !matches!(c, '<' | '>' | ' '))
        .collect::<String>();
    format!("{mnemonic} {operands}").trim().to_string()
}

/// A template operand list split by bracket kind.
#[derive(Debug)]
enum Group {
    Leaf(String),
    List(Vec<Group>),
}

type Splitter = fn(char) -> bool;

/// Memory brackets, then register-list braces, then operand separators.
const SPLITTERS: [Splitter; 3] = [
    |c| c == '[' || c == ']',
    |c| c == '{' || c == '}',
    |c| c == ',' || c == ' ',
];

fn split_groups(text: &str, level: usize) -> Group {
    let Some(splitter) = SPLITTERS.get(level) else {
        return Group::Leaf(text.to_string());
    };
    let children = text
        .split(*splitter)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| split_groups(piece, level + 1))
        .filter(|group| !matches!(group, Group::List(children) if children.is_empty()))
        .collect();
    Group::List(children)
}

fn leaf_forms(leaf: &str) -> Vec<String> {
    if leaf.starts_with('#') {
        return vec!["i".to_string()];
    }
    if leaf.starts_with('(') {
        let first = leaf
            .trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')'))
            .chars()
            .next()
            .unwrap_or(' ');
        return vec![first.to_string(), String::new()];
    }
    let first = leaf
        .trim_matches(|c: char| c == '<' || c == '>')
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default();
    vec![first]
}

fn expand(group: &Group) -> Vec<String> {
    match group {
        Group::Leaf(leaf) => leaf_forms(leaf),
        Group::List(children) if children.is_empty() => vec![String::new()],
        Group::List(children) => children
            .iter()
            .map(expand)
            .multi_cartesian_product()
            .map(|parts| parts.concat())
            .collect(),
    }
}

/// Expands a canonical template into every form signature it accepts.
///
/// Parenthesised optional operands contribute both their letter and
/// nothing. The result is sorted and free of duplicates.
///
/// ```
/// use opa64_relink::form::template_forms;
/// assert_eq!(template_forms("ldr wt,[xn|sp],(wm)"), ["wx", "wxw"]);
/// ```
pub fn template_forms(canonical_asm: &str) -> Vec<String> {
    let operands = canonical_asm
        .split_once(' ')
        .map(|(_, operands)| operands)
        .unwrap_or("");
    let operands = operands.replace(' ', "");
    expand(&split_groups(&operands, 0))
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn remap(form: &str, map: impl Fn(char) -> Option<char>) -> String {
    form.chars().map(|c| map(c).unwrap_or(c)).collect()
}

/// Collapses general registers to `r` and SIMD&FP scalars to `v`.
pub fn collapse_register_classes(form: &str) -> String {
    remap(form, |c| match c {
        'b' | 'h' | 'w' | 'x' => Some('r'),
        's' | 'd' => Some('v'),
        _ => None,
    })
}

/// Maps `v` and `r` to `s`.
pub fn remap_simd(form: &str) -> String {
    remap(form, |c| matches!(c, 'v' | 'r').then_some('s'))
}

/// Maps every register class letter except `s` and `q` to `s`.
pub fn squash(form: &str) -> String {
    remap(form, |c| {
        matches!(c, 'b' | 'h' | 'w' | 'x' | 'd' | 'v' | 'r').then_some('s')
    })
}
