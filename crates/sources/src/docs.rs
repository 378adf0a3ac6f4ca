//! The registry of source documents.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// What a document contains, and so how it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// The A64 instruction set XML archive.
    Description,
    /// The NEON intrinsics reference.
    Intrinsics,
    /// The software optimization guide of one microarchitecture.
    Table(&'static str),
}

/// A source document and where it is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    #[allow(missing_docs)]
    pub kind: DocumentKind,
    #[allow(missing_docs)]
    pub url: &'static str,
}

/// Every known document, in the order they are parsed.
pub static DOCUMENTS: &[Document] = &[
    Document {
        kind: DocumentKind::Description,
        url: "https://developer.arm.com/-/media/developer/products/architecture/armv8-a-architecture/2020-03/A64_ISA_xml_v86A-2020-03.tar.gz",
    },
    Document {
        kind: DocumentKind::Intrinsics,
        url: "https://static.docs.arm.com/ihi0073/e/IHI0073E_arm_neon_intrinsics_ref.pdf",
    },
    Document {
        kind: DocumentKind::Table("a78"),
        url: "https://static.docs.arm.com/102160/0300/Arm_Cortex-A78_Core_Software_Optimization_Guide.pdf",
    },
    Document {
        kind: DocumentKind::Table("a77"),
        url: "https://static.docs.arm.com/swog011050/c/Arm_Cortex-A77_Software_Optimization_Guide.pdf",
    },
    Document {
        kind: DocumentKind::Table("a76"),
        url: "https://static.docs.arm.com/swog307215/a/Arm_Cortex-A76_Software_Optimization_Guide.pdf",
    },
    Document {
        kind: DocumentKind::Table("n1"),
        url: "https://static.docs.arm.com/swog309707/a/Arm_Neoverse_N1_Software_Optimization_Guide.pdf",
    },
    Document {
        kind: DocumentKind::Table("a75"),
        url: "https://static.docs.arm.com/101398/0200/arm_cortex_a75_software_optimization_guide_v2.pdf",
    },
    Document {
        kind: DocumentKind::Table("a72"),
        url: "https://static.docs.arm.com/uan0016/a/cortex_a72_software_optimization_guide_external.pdf",
    },
    Document {
        kind: DocumentKind::Table("a57"),
        url: "https://static.docs.arm.com/uan0015/b/Cortex_A57_Software_Optimization_Guide_external.pdf",
    },
    Document {
        kind: DocumentKind::Table("a55"),
        url: "https://static.docs.arm.com/epm128372/30/arm_cortex_a55_software_optimization_guide_v3.pdf",
    },
];

impl Document {
    /// The `--doc` specifier selecting exactly this document.
    pub fn specifier(&self) -> String {
        match self.kind {
            DocumentKind::Description => "description".to_string(),
            DocumentKind::Intrinsics => "intrinsics".to_string(),
            DocumentKind::Table(arch) => format!("table.{arch}"),
        }
    }

    /// Name of the downloaded file: the last segment of the URL.
    pub fn file_name(&self) -> &'static str {
        self.url.rsplit('/').next().unwrap_or(self.url)
    }

    /// Where the document is expected inside the working directory.
    pub fn local_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

fn microarchitectures() -> impl Iterator<Item = &'static Document> {
    DOCUMENTS
        .iter()
        .filter(|doc| matches!(doc.kind, DocumentKind::Table(_)))
}

fn find(kind: DocumentKind) -> Option<&'static Document> {
    DOCUMENTS.iter().find(|doc| doc.kind == kind)
}

/// Expands `--doc` arguments into documents.
///
/// Each argument holds comma-separated specifiers: `description`,
/// `intrinsics`, `table` (every microarchitecture), `table.<arch>`, or `all`.
/// No specifier at all selects every document. Invalid specifiers are
/// returned as errors in place so that the caller can report them and go on
/// with the others; a document selected twice is returned once.
pub fn resolve(specifiers: &[String]) -> Vec<Result<&'static Document>> {
    let mut specs = specifiers
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .peekable();
    if specs.peek().is_none() {
        return DOCUMENTS.iter().map(Ok).collect();
    }

    let mut resolved: Vec<Result<&'static Document>> = Vec::new();
    for spec in specs {
        let (name, qualifier) = match spec.split_once('.') {
            Some((name, qualifier)) => (name, Some(qualifier)),
            None => (spec, None),
        };
        let selected: Vec<Result<&'static Document>> = match (name, qualifier) {
            ("all", _) => DOCUMENTS.iter().map(Ok).collect(),
            ("description", _) => find(DocumentKind::Description).into_iter().map(Ok).collect(),
            ("intrinsics", _) => find(DocumentKind::Intrinsics).into_iter().map(Ok).collect(),
            ("table", None) => microarchitectures().map(Ok).collect(),
            ("table", Some(arch)) => match microarchitectures()
                .find(|doc| matches!(doc.kind, DocumentKind::Table(a) if a == arch))
            {
                Some(doc) => vec![Ok(doc)],
                None => {
                    let known = microarchitectures()
                        .map(|doc| doc.specifier())
                        .collect::<Vec<_>>()
                        .join(", ");
                    vec![Err(Error::UnknownMicroarchitecture(spec.to_string(), known))]
                }
            },
            _ => vec![Err(Error::UnknownDocument(spec.to_string()))],
        };

        for doc in selected {
            if let Ok(doc) = &doc {
                if resolved
                    .iter()
                    .any(|r| r.as_ref().is_ok_and(|seen| seen == doc))
                {
                    continue;
                }
            }
            resolved.push(doc);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(args: &[&str]) -> Vec<String> {
        resolve(&args.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .into_iter()
            .map(|r| match r {
                Ok(doc) => doc.specifier(),
                Err(e) => format!("error: {e}"),
            })
            .collect()
    }

    #[test]
    fn everything_by_default() {
        assert_eq!(specifiers(&[]).len(), DOCUMENTS.len());
        assert_eq!(specifiers(&["all"]), specifiers(&[]));
        assert_eq!(specifiers(&[""]), specifiers(&[]));
    }

    #[test]
    fn tables() {
        assert_eq!(specifiers(&["table.a55"]), ["table.a55"]);
        let all = specifiers(&["table"]);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], "table.a78");
        assert_eq!(all[7], "table.a55");
    }

    #[test]
    fn lists_and_repeats() {
        assert_eq!(
            specifiers(&["intrinsics,table.a72", "description", "table.a72"]),
            ["intrinsics", "table.a72", "description"]
        );
    }

    #[test]
    fn errors_are_kept_in_place() {
        let resolved = specifiers(&["manual,table.m1,intrinsics"]);
        assert_eq!(resolved.len(), 3);
        assert!(resolved[0].starts_with("error: unknown document specifier"));
        assert!(resolved[1].starts_with("error: unknown microarchitecture"));
        assert_eq!(resolved[2], "intrinsics");
    }

    #[test]
    fn file_names() {
        let a55 = &DOCUMENTS[9];
        assert_eq!(a55.file_name(), "arm_cortex_a55_software_optimization_guide_v3.pdf");
        assert_eq!(
            a55.local_path(Path::new("docs")),
            Path::new("docs/arm_cortex_a55_software_optimization_guide_v3.pdf")
        );
        assert_eq!(DOCUMENTS[0].file_name(), "A64_ISA_xml_v86A-2020-03.tar.gz");
    }
}
