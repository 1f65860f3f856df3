use serde::{Deserialize, Serialize};

/// How a single execution measured up against a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub output_matches: bool,
    pub missing_keywords: Vec<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.output_matches && self.missing_keywords.is_empty()
    }
}

/// Compares trimmed output exactly and checks that every keyword occurs
/// verbatim somewhere in the source. Both checks are case-sensitive.
pub fn assess<K: AsRef<str>>(
    output: &str,
    expected_output: &str,
    required_keywords: &[K],
    source_code: &str,
) -> Verdict {
    let output_matches = output.trim() == expected_output.trim();
    let missing_keywords = required_keywords
        .iter()
        .map(AsRef::as_ref)
        .filter(|keyword| !source_code.contains(keyword))
        .map(str::to_string)
        .collect();

    Verdict {
        output_matches,
        missing_keywords,
    }
}

pub fn evaluate<K: AsRef<str>>(
    output: &str,
    expected_output: &str,
    required_keywords: &[K],
    source_code: &str,
) -> bool {
    assess(output, expected_output, required_keywords, source_code).passed()
}
