//! The XML architecture reference.
//!
//! Every instruction section of the reference is one XML file whose root is
//! `<instructionsection>`. The parts read here are the heading (which names
//! the mnemonics), one `<iclass>` per encoding class with its document
//! variables and assembly templates, the prose of `<desc>` and the
//! pseudocode of `<ps_section>`.

use crate::error::{Error, Result};
use crate::sanitize::{Mode, sanitize};
use itertools::Itertools;
use log::{debug, warn};
use opa64_relink::form::{canonicalize_template, template_forms};
use opa64_relink::{DescriptionRecord, EncodingClassAttributes, Tag, heading_opcodes};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// An owned XML element.
///
/// Character data is stored the way a streaming tree builder sees it: `text`
/// is the data before the first child and each child's `tail` is the data
/// that follows it, so that concatenating them in document order gives back
/// the element's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local tag name.
    pub tag: String,
    #[allow(missing_docs)]
    pub attributes: BTreeMap<String, String>,
    /// Character data before the first child.
    pub text: Option<String>,
    /// Character data after the end tag, up to the next sibling.
    pub tail: Option<String>,
    #[allow(missing_docs)]
    pub children: Vec<Element>,
}

impl Element {
    /// Parses a document and returns its root element.
    pub fn parse(xml: &str) -> Result<Element, roxmltree::Error> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(xml, options)?;
        Ok(Element::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Element {
        let mut element = Element {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            ..Element::default()
        };
        for child in node.children() {
            if child.is_element() {
                element.children.push(Element::from_node(child));
                continue;
            }
            if !child.is_text() {
                continue;
            }
            let Some(text) = child.text() else {
                continue;
            };
            let slot = match element.children.last_mut() {
                Some(last) => &mut last.tail,
                None => &mut element.text,
            };
            slot.get_or_insert_with(String::new).push_str(text);
        }
        element
    }

    /// Looks up an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the descendants reached by a relative path such as
    /// `./classes/iclass`, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut found = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            found = found
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.tag == step))
                .collect();
        }
        found
    }

    /// Appends the text of this element, its descendants and its tail.
    fn collect_text(&self, acc: &mut String) {
        if let Some(text) = &self.text {
            acc.push_str(text);
        }
        for child in &self.children {
            child.collect_text(acc);
        }
        if let Some(tail) = &self.tail {
            acc.push_str(tail);
        }
    }
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Concatenates the sanitized text of `nodes`, separated by spaces.
///
/// In single-line mode runs of whitespace are collapsed as well.
pub fn dump_text(nodes: &[&Element], mode: Mode) -> String {
    let text = nodes
        .iter()
        .map(|node| {
            let mut acc = String::new();
            node.collect_text(&mut acc);
            sanitize(&acc, mode).trim_matches(mode.trimmed()).to_string()
        })
        .join(" ");
    match mode {
        Mode::SingleLine => WHITESPACE.replace_all(&text, " ").into_owned(),
        Mode::MultiLine => text,
    }
}

fn template(nodes: &[&Element]) -> String {
    canonicalize_template(&dump_text(nodes, Mode::SingleLine))
}

/// Reads the attributes of every encoding class of a section.
pub fn parse_attributes(root: &Element) -> Vec<EncodingClassAttributes> {
    root.find_all("./classes/iclass")
        .into_iter()
        .map(|iclass| {
            let mut attrs = EncodingClassAttributes::default();
            for docvar in iclass.find_all("./docvars/docvar") {
                if let (Some(key), Some(value)) = (docvar.attribute("key"), docvar.attribute("value")) {
                    attrs
                        .tags
                        .insert(Tag::from(key.to_lowercase().as_str()), value.to_lowercase());
                }
            }
            for variant in iclass.find_all("./arch_variants/arch_variant") {
                if let Some(name) = variant.attribute("name") {
                    attrs.tags.insert(Tag::ArchVariant, name.to_lowercase());
                }
                if let Some(feature) = variant.attribute("feature") {
                    attrs.tags.insert(Tag::Feature, feature.to_lowercase());
                }
            }

            attrs.asm = iclass
                .find_all("./encoding/asmtemplate")
                .into_iter()
                .map(|asm| template(&[asm]))
                .collect();
            attrs.forms = attrs
                .asm
                .iter()
                .flat_map(|asm| template_forms(asm))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            attrs.equiv = template(&iclass.find_all("./encoding/equivalent_to/asmtemplate"));
            attrs
        })
        .collect()
}

/// Section classes that are not read.
const SKIPPED_SECTIONS: [&str; 2] = ["sve", "system"];

/// Reads one instruction section.
///
/// Returns the opcodes named by the heading together with the section's
/// record, or `None` for files that are not instruction sections, for
/// pseudocode libraries and for SVE and system instructions.
pub fn parse_section(file: &str, root: &Element) -> Option<(Vec<String>, DescriptionRecord)> {
    if root.tag != "instructionsection" || root.attribute("type") == Some("pseudocode") {
        return None;
    }
    let skipped = root.find_all("./docvars/docvar").into_iter().any(|docvar| {
        docvar
            .attribute("value")
            .is_some_and(|value| SKIPPED_SECTIONS.contains(&value.to_lowercase().as_str()))
    });
    if skipped {
        return None;
    }

    let opcodes = heading_opcodes(&dump_text(&root.find_all("./heading"), Mode::SingleLine));
    let desc = ["./desc/description", "./desc/authored"]
        .iter()
        .map(|path| dump_text(&root.find_all(path), Mode::SingleLine))
        .join(" ");
    let record = DescriptionRecord {
        file: file.to_string(),
        attrs: parse_attributes(root),
        brief: dump_text(&root.find_all("./desc/brief"), Mode::SingleLine),
        desc,
        operation: dump_text(&root.find_all("./ps_section"), Mode::MultiLine),
    };
    Some((opcodes, record))
}

fn relative_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .join("/")
}

/// Keeps only the `X_OPT` tree when the reference ships both `X` and
/// `X_OPT`.
fn prefer_optimized(dir: &Path, files: Vec<PathBuf>) -> Vec<PathBuf> {
    let top = |path: &Path| {
        let rel = path.strip_prefix(dir).unwrap_or(path);
        let mut components = rel.components();
        let first = components.next()?;
        components
            .next()
            .map(|_| first.as_os_str().to_string_lossy().into_owned())
    };
    let dirs = files.iter().filter_map(|f| top(f.as_path())).collect::<BTreeSet<_>>();
    let preferred = match dirs.iter().collect::<Vec<_>>().as_slice() {
        [plain, optimized] if format!("{plain}_OPT") == **optimized => (*optimized).clone(),
        _ => return files,
    };
    debug!("reading {preferred} only");
    files
        .into_iter()
        .filter(|f| top(f.as_path()).as_deref() == Some(preferred.as_str()))
        .collect()
}

fn parse_reference_file(dir: &Path, path: &Path) -> Result<Option<(Vec<String>, DescriptionRecord)>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = Element::parse(&text).map_err(|source| Error::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_section(&relative_name(dir, path), &root))
}

/// Reads every instruction section of an extracted reference archive.
///
/// Files that cannot be read or parsed are reported and skipped. The result
/// is keyed by canonical opcode; a section naming several opcodes in its
/// heading is recorded under each of them.
pub fn parse_reference_dir(dir: &Path) -> Result<BTreeMap<String, Vec<DescriptionRecord>>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "xml") {
            files.push(entry.into_path());
        }
    }

    let mut insns: BTreeMap<String, Vec<DescriptionRecord>> = BTreeMap::new();
    for path in prefer_optimized(dir, files) {
        match parse_reference_file(dir, &path) {
            Ok(Some((opcodes, record))) => {
                for opcode in opcodes {
                    insns.entry(opcode).or_default().push(record.clone());
                }
            }
            Ok(None) => debug!("{}: not an instruction section, skipped", path.display()),
            Err(e) => match std::error::Error::source(&e) {
                Some(cause) => warn!("{e}: {cause}, skipped"),
                None => warn!("{e}, skipped"),
            },
        }
    }
    Ok(insns)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_VECTOR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE instructionsection PUBLIC "-//ARM//DTD instructionsection //EN" "iform-p.dtd">
<instructionsection id="ADD_advsimd" title="ADD (vector) -- A64" type="instruction">
  <docvars>
    <docvar key="instr-class" value="advsimd" />
  </docvars>
  <heading>ADD (vector)</heading>
  <desc>
    <brief>
      <para>Add (vector).</para>
    </brief>
    <description>
      <para>Add (vector). This instruction adds corresponding elements
      in the two source SIMD&amp;FP registers.</para>
    </description>
    <authored>
      <para>Depending on the settings in the <xref linkend="CPACR_EL1">CPACR_EL1</xref>, an exception may be taken.</para>
    </authored>
  </desc>
  <classes>
    <iclass name="Scalar" oneof="2" id="iclass_scalar">
      <docvars>
        <docvar key="advsimd-type" value="sisd" />
        <docvar key="Mnemonic" value="add" />
      </docvars>
      <arch_variants>
        <arch_variant name="ARMv8-A" />
      </arch_variants>
      <encoding name="ADD_asisdsame_only" label="">
        <asmtemplate><text>ADD  </text><a link="sa_v" hover="Scalar">&lt;V&gt;</a><text>&lt;d&gt;, </text><a link="sa_v">&lt;V&gt;</a><text>&lt;n&gt;, </text><a link="sa_v">&lt;V&gt;</a><text>&lt;m&gt;</text></asmtemplate>
      </encoding>
    </iclass>
    <iclass name="Vector" oneof="2" id="iclass_vector">
      <docvars>
        <docvar key="advsimd-type" value="simd" />
        <docvar key="mnemonic" value="add" />
      </docvars>
      <arch_variants>
        <arch_variant name="ARMv8.2-A" feature="FEAT_FP16" />
      </arch_variants>
      <encoding name="ADD_asimdsame_only" label="">
        <asmtemplate><text>ADD  </text><a link="sa_vd">&lt;Vd&gt;</a><text>.</text><a link="sa_t">&lt;T&gt;</a><text>, </text><a link="sa_vn">&lt;Vn&gt;</a><text>.</text><a>&lt;T&gt;</a><text>, </text><a>&lt;Vm&gt;</a><text>.</text><a>&lt;T&gt;</a></asmtemplate>
        <equivalent_to>
          <asmtemplate><text>ORR  </text><a>&lt;Vd&gt;</a><text>.16B</text></asmtemplate>
        </equivalent_to>
      </encoding>
    </iclass>
  </classes>
  <ps_section howmuch="Section">
    <ps name="aarch64/instrs/integer/arithmetic/add-sub/vector" mylink="x" enclabels="" sections="1" secttype="Operation">
      <pstext mayhavelinks="1" section="Execute" rep_section="execute">CheckFPAdvSIMDEnabled64();
bits(datasize) result;
	V[d] = result;</pstext>
    </ps>
  </ps_section>
</instructionsection>
"#;

    #[test]
    fn element_text_and_tails() {
        let root = Element::parse("<a>x<b>y</b>z<!-- c --><c/>w</a>").unwrap();
        assert_eq!(root.text.as_deref(), Some("x"));
        assert_eq!(root.children[0].tail.as_deref(), Some("z"));
        assert_eq!(root.children[1].tail.as_deref(), Some("w"));
        assert_eq!(dump_text(&[&root], Mode::SingleLine), "xyzw");
    }

    #[test]
    fn paths() {
        let root = Element::parse("<r><a><b i='1'/><b i='2'/></a><a><b i='3'/></a><b i='4'/></r>").unwrap();
        let found = root.find_all("./a/b");
        assert_eq!(
            found.iter().filter_map(|b| b.attribute("i")).collect::<Vec<_>>(),
            ["1", "2", "3"]
        );
        assert_eq!(root.find_all("./b").len(), 1);
        assert!(root.find_all("./c/b").is_empty());
    }

    #[test]
    fn section() {
        let root = Element::parse(ADD_VECTOR).unwrap();
        let (opcodes, record) = parse_section("ISA_OPT/add_advsimd.xml", &root).unwrap();
        assert_eq!(opcodes, ["add"]);
        assert_eq!(record.file, "ISA_OPT/add_advsimd.xml");
        assert_eq!(record.brief, "Add (vector).");
        assert_eq!(
            record.desc,
            "Add (vector). This instruction adds corresponding elements in the two source \
             SIMD&FP registers. Depending on the settings in the CPACR_EL1, an exception may be taken."
        );
        assert!(record.operation.starts_with("CheckFPAdvSIMDEnabled64();\nbits(datasize)"));
        assert!(record.operation.ends_with("\nV[d] = result;"));

        assert_eq!(record.attrs.len(), 2);
        let scalar = &record.attrs[0];
        assert_eq!(scalar.tag(&Tag::Mnemonic), Some("add"));
        assert_eq!(scalar.tag(&Tag::AdvsimdType), Some("sisd"));
        assert_eq!(scalar.tag(&Tag::ArchVariant), Some("armv8-a"));
        assert_eq!(scalar.asm, ["add vd,vn,vm"]);
        assert_eq!(scalar.forms, ["vvv"]);
        assert_eq!(scalar.equiv, "");

        let vector = &record.attrs[1];
        assert_eq!(vector.tag(&Tag::Feature), Some("feat_fp16"));
        assert_eq!(vector.asm, ["add vd.t,vn.t,vm.t"]);
        assert_eq!(vector.equiv, "orr vd.16b");
    }

    #[test]
    fn skipped_sections() {
        let pseudocode = Element::parse(r#"<instructionsection type="pseudocode"><heading>SHARED</heading></instructionsection>"#).unwrap();
        assert!(parse_section("shared.xml", &pseudocode).is_none());

        let sve = Element::parse(
            r#"<instructionsection><docvars><docvar key="instr-class" value="SVE"/></docvars><heading>ADD</heading></instructionsection>"#,
        )
        .unwrap();
        assert!(parse_section("add_z_zz.xml", &sve).is_none());

        let index = Element::parse("<alphaindex><toc/></alphaindex>").unwrap();
        assert!(parse_section("index.xml", &index).is_none());
    }
}
