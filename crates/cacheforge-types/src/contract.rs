//! Output contract shared by prompt composition and response parsing.
//!
//! The generation service is asked to answer in a fixed Markdown layout: three
//! level-two section headers followed by a fenced code block. The composer
//! renders the layout from an [`OutputContract`] and the parser locates the
//! same headers from the same value, so the section text lives in exactly one
//! place. Bump `version` whenever a header or the fence language changes.

use serde::{Deserialize, Serialize};

/// Current contract used by the search loop.
pub const POLICY_OUTPUT_CONTRACT: OutputContract = OutputContract {
    version: 1,
    name_header: "Policy Name",
    description_header: "Policy Description",
    implementation_header: "C++ Implementation",
    fence_language: "cpp",
};

/// Versioned description of the structured answer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputContract {
    pub version: u32,
    pub name_header: &'static str,
    pub description_header: &'static str,
    pub implementation_header: &'static str,
    /// Info string expected on the opening code fence.
    pub fence_language: &'static str,
}

/// One of the three fields the contract defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractField {
    Name,
    Description,
    Code,
}

impl ContractField {
    pub const ALL: [ContractField; 3] = [
        ContractField::Name,
        ContractField::Description,
        ContractField::Code,
    ];
}

impl std::fmt::Display for ContractField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractField::Name => write!(f, "name"),
            ContractField::Description => write!(f, "description"),
            ContractField::Code => write!(f, "code"),
        }
    }
}

impl OutputContract {
    /// Markdown header line for a section, e.g. `## Policy Name`.
    pub fn header_line(&self, section: &str) -> String {
        format!("## {section}")
    }

    /// Header text that introduces `field`. The code field lives under the
    /// implementation header.
    pub fn header_for(&self, field: ContractField) -> &'static str {
        match field {
            ContractField::Name => self.name_header,
            ContractField::Description => self.description_header,
            ContractField::Code => self.implementation_header,
        }
    }

    /// Opening fence for the implementation block, e.g. "```cpp".
    pub fn opening_fence(&self) -> String {
        format!("```{}", self.fence_language)
    }

    /// Normalize header text for lenient comparison: lowercase, single spaces.
    pub fn normalize_header(text: &str) -> String {
        text.split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
