//! Linking an intrinsic to the encoding class it compiles to.
//!
//! An intrinsic knows its opcode, a form signature and the element types of
//! its declaration; every encoding class of the architecture reference knows
//! its templates, their form signatures and a set of tags. The matcher looks
//! for the one encoding class consistent with the intrinsic, trying
//! progressively looser notions of "same form" until exactly one candidate is
//! left.

use crate::attrs::{EncodingClassAttributes, Tag, merge};
use crate::form::{collapse_register_classes, remap_simd, squash};
use crate::options::Options;
use crate::records::{DescriptionRecord, InstructionClass, IntrinsicRecord, Tables};
use log::trace;

/// A description chosen for an intrinsic, with the attributes and latency
/// rows that go with it.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// Position of `description` in the opcode's description list.
    pub index: usize,
    #[allow(missing_docs)]
    pub description: &'a DescriptionRecord,
    /// The selected encoding class, or the merge of all classes.
    pub attrs: EncodingClassAttributes,
    /// Latency rows consistent with `attrs`.
    pub tables: Tables,
}

/// Outcome of [`match_intrinsic`].
#[derive(Debug, Clone)]
pub enum Match<'a> {
    /// The intrinsic has no form signature; every description applies.
    Unconstrained(Vec<Selection<'a>>),
    /// Exactly one encoding class is consistent with the intrinsic.
    Unique(Selection<'a>),
    /// Either no encoding class or several equally good ones.
    NoMatch,
}

/// Which form list of an encoding class a relation compares against.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// The forms as expanded from the templates.
    Forms,
    /// General registers as `r`, SIMD&FP scalars as `v`.
    Collapsed,
    /// `v`/`r` as `s`, for classes tagged as scalar SIMD only.
    SimdRemap,
    /// `v`/`r` as `s` regardless of the class.
    FullRemap,
}

#[derive(Debug, Clone, Copy)]
struct Relation {
    target: Target,
    lower: bool,
    squash: bool,
}

const fn relation(target: Target, lower: bool, squash: bool) -> Relation {
    Relation {
        target,
        lower,
        squash,
    }
}

/// Tried in order; the first relation that leaves a single candidate wins.
const CASCADE: [Relation; 12] = [
    relation(Target::Forms, false, false),
    relation(Target::Forms, true, false),
    relation(Target::Collapsed, false, false),
    relation(Target::Collapsed, true, false),
    relation(Target::SimdRemap, false, false),
    relation(Target::SimdRemap, true, false),
    relation(Target::FullRemap, false, false),
    relation(Target::FullRemap, true, false),
    relation(Target::SimdRemap, false, true),
    relation(Target::SimdRemap, true, true),
    relation(Target::FullRemap, false, true),
    relation(Target::FullRemap, true, true),
];

impl Relation {
    fn holds(&self, form: &str, attrs: &EncodingClassAttributes) -> bool {
        let mut form = form.to_string();
        if self.lower {
            form = form.to_lowercase();
        }
        if self.squash {
            form = squash(&form);
        }

        let forms = attrs.forms.iter();
        match self.target {
            Target::Forms => attrs.forms.contains(&form),
            Target::Collapsed => forms.map(|f| collapse_register_classes(f)).any(|f| f == form),
            Target::SimdRemap
                if attrs
                    .tag(&Tag::AdvsimdType)
                    .is_none_or(|ty| ty == "simd") =>
            {
                attrs.forms.contains(&form)
            }
            Target::SimdRemap | Target::FullRemap => forms.map(|f| remap_simd(f)).any(|f| f == form),
        }
    }
}

/// Narrowing steps applied to the candidate pool, in order.
#[derive(Debug, Clone, Copy)]
enum Check {
    Form,
    Mnemonic,
    Template,
    Datatype,
}

const CHECKS: [Check; 4] = [Check::Form, Check::Mnemonic, Check::Template, Check::Datatype];

impl Check {
    fn passes(
        &self,
        relation: &Relation,
        form: &str,
        intrinsic: &IntrinsicRecord,
        attrs: &EncodingClassAttributes,
    ) -> bool {
        match self {
            Check::Form => relation.holds(form, attrs),
            Check::Mnemonic => attrs
                .tag(&Tag::Mnemonic)
                .is_none_or(|m| m == intrinsic.op_raw),
            Check::Template => {
                attrs.asm.is_empty() || attrs.template_mnemonics().any(|m| m == intrinsic.op_raw)
            }
            Check::Datatype => attrs.tag(&Tag::Datatype).is_none_or(|datatype| {
                datatype
                    .split('-')
                    .any(|d| intrinsic.datatypes.iter().any(|t| t == d))
            }),
        }
    }
}

/// Variations of an intrinsic's form tried against the templates.
///
/// The intrinsic signature may drop a destination that the instruction
/// reads and writes (`f[1:]`), or omit operands the template repeats
/// (leading duplicates) or implies (`wea`, as in the `ld*`/`st*` ordering
/// forms).
fn form_candidates(form: &str) -> Vec<String> {
    let mut chars = form.chars();
    let Some(head) = chars.next() else {
        return Vec::new();
    };
    let tail = chars.as_str();
    vec![
        form.to_string(),
        tail.to_string(),
        format!("{head}{form}"),
        format!("{head}{head}{form}"),
        format!("{head}{head}{head}{form}"),
        format!("{form}wea"),
    ]
}

struct Candidate<'a> {
    index: usize,
    description: &'a DescriptionRecord,
    attrs: &'a EncodingClassAttributes,
}

/// Finds the description, encoding class and latency rows an intrinsic of
/// `opcode` corresponds to.
///
/// Every `(description, encoding class)` pair is a candidate. For each form
/// variation and each relation of the cascade the pool is narrowed check by
/// check; the search stops as soon as a single candidate remains. Pools that
/// still hold several candidates after every check are ambiguous and do not
/// count.
pub fn match_intrinsic<'a>(
    opcode: &str,
    intrinsic: &IntrinsicRecord,
    descriptions: &'a [DescriptionRecord],
    tables: &Tables,
    options: &Options,
) -> Match<'a> {
    let Some(form) = intrinsic.form() else {
        trace!("{opcode}: `{}` has no form, taking every description", intrinsic.intrinsic);
        return Match::Unconstrained(
            descriptions
                .iter()
                .enumerate()
                .map(|(index, description)| Selection {
                    index,
                    description,
                    attrs: merge(opcode, &description.attrs, &options.merge_separator),
                    tables: tables.clone(),
                })
                .collect(),
        );
    };

    let candidates = descriptions
        .iter()
        .enumerate()
        .flat_map(|(index, description)| {
            description.attrs.iter().map(move |attrs| Candidate {
                index,
                description,
                attrs,
            })
        })
        .collect::<Vec<_>>();

    for variation in form_candidates(form) {
        for (step, relation) in CASCADE.iter().enumerate() {
            let mut pool = candidates.iter().collect::<Vec<_>>();
            for check in CHECKS {
                pool.retain(|c| check.passes(relation, &variation, intrinsic, c.attrs));
                match pool.as_slice() {
                    [] => break,
                    [chosen] => {
                        trace!(
                            "{opcode}: `{}` matched {} via `{variation}` at cascade step {step} ({check:?})",
                            intrinsic.intrinsic,
                            chosen.description.file,
                        );
                        return Match::Unique(Selection {
                            index: chosen.index,
                            description: chosen.description,
                            attrs: chosen.attrs.clone(),
                            tables: filter_tables(chosen.attrs, tables),
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    trace!(
        "{opcode}: no unique encoding class for `{}` (form `{form}`)",
        intrinsic.intrinsic
    );
    Match::NoMatch
}

/// Keeps the latency rows whose class agrees with the `instr-class` tag of
/// `attrs`.
///
/// Without the tag every row is kept; a tag with no table counterpart keeps
/// none. Microarchitectures are never removed, even when left empty.
pub fn filter_tables(attrs: &EncodingClassAttributes, tables: &Tables) -> Tables {
    let Some(tag) = attrs.tag(&Tag::InstrClass) else {
        return tables.clone();
    };
    let class = InstructionClass::from_reference_tag(tag);
    tables
        .iter()
        .map(|(arch, rows)| {
            let rows = rows
                .iter()
                .filter(|row| Some(row.iclass) == class)
                .cloned()
                .collect();
            (arch.clone(), rows)
        })
        .collect()
}
