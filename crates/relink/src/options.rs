use serde_derive::{Deserialize, Serialize};

/// Tunables of the relink stage, read from the `[relink]` section of the
/// configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Separator placed between conflicting string attributes when several
    /// encoding classes are merged.
    #[serde(default = "default_merge_separator", rename = "merge-separator")]
    pub merge_separator: String,
    /// Opcodes reported as `advsimd` when no description can be linked to
    /// them. These permutes are documented under their `1`/`2` variants only.
    #[serde(
        default = "default_vector_shuffle_opcodes",
        rename = "vector-shuffle-opcodes"
    )]
    pub vector_shuffle_opcodes: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            merge_separator: default_merge_separator(),
            vector_shuffle_opcodes: default_vector_shuffle_opcodes(),
        }
    }
}

impl Options {
    /// Whether `opcode` belongs to the vector-shuffle allowlist.
    pub fn is_vector_shuffle(&self, opcode: &str) -> bool {
        self.vector_shuffle_opcodes.iter().any(|op| op == opcode)
    }
}

// if changed, update the template written by `opa64 config new`
fn default_merge_separator() -> String {
    ",".to_string()
}
fn default_vector_shuffle_opcodes() -> Vec<String> {
    ["zip", "uzp", "trn"].map(String::from).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.merge_separator, ",");
        assert!(options.is_vector_shuffle("uzp"));
        assert!(!options.is_vector_shuffle("uzp1"));

        let parsed: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn overrides() {
        let parsed: Options = serde_json::from_str(
            r#"{"merge-separator": " | ", "vector-shuffle-opcodes": ["ext"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.merge_separator, " | ");
        assert!(parsed.is_vector_shuffle("ext"));
        assert!(!parsed.is_vector_shuffle("zip"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<Options>(r#"{"separator": ";"}"#).is_err());
    }
}
