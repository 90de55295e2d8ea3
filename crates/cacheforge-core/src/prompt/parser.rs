//! Structured response parsing.
//!
//! The grammar is lenient: headers match case-insensitively with any number
//! of leading `#`, and the implementation block may carry any fence info
//! string. Each field gets its own [`FieldOutcome`] for diagnostics, but
//! [`ResponseParser::parse`] only yields a candidate when all three are found.

use cacheforge_types::contract::{ContractField, OutputContract};
use cacheforge_types::error::{FieldStatus, ParseError};
use cacheforge_types::policy::PolicyCandidate;

/// What the parser found for one contract field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Found(String),
    Missing,
    Empty,
}

impl FieldOutcome {
    pub fn status(&self) -> FieldStatus {
        match self {
            FieldOutcome::Found(_) => FieldStatus::Found,
            FieldOutcome::Missing => FieldStatus::Missing,
            FieldOutcome::Empty => FieldStatus::Empty,
        }
    }

    fn from_text(text: String) -> Self {
        if text.is_empty() {
            FieldOutcome::Empty
        } else {
            FieldOutcome::Found(text)
        }
    }
}

/// Per-field view of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub contract_version: u32,
    pub name: FieldOutcome,
    pub description: FieldOutcome,
    pub code: FieldOutcome,
}

impl ParsedResponse {
    pub fn field(&self, field: ContractField) -> &FieldOutcome {
        match field {
            ContractField::Name => &self.name,
            ContractField::Description => &self.description,
            ContractField::Code => &self.code,
        }
    }

    /// Status of every contract field, in contract order.
    pub fn statuses(&self) -> Vec<(ContractField, FieldStatus)> {
        ContractField::ALL
            .iter()
            .map(|&field| (field, self.field(field).status()))
            .collect()
    }

    /// All-or-nothing conversion into a candidate.
    pub fn into_candidate(self) -> Result<PolicyCandidate, ParseError> {
        let fields = self.statuses();
        match (self.name, self.description, self.code) {
            (FieldOutcome::Found(name), FieldOutcome::Found(description), FieldOutcome::Found(code)) => {
                Ok(PolicyCandidate::new(name, description, code))
            }
            _ => Err(ParseError {
                contract_version: self.contract_version,
                fields,
            }),
        }
    }
}

/// Extracts name, description, and source from generated text.
#[derive(Debug, Clone, Copy)]
pub struct ResponseParser {
    contract: OutputContract,
}

/// A line of the response with its fence context.
struct Line<'a> {
    text: &'a str,
    /// Header text if this line is a Markdown header outside any code fence.
    header: Option<String>,
}

impl ResponseParser {
    pub fn new(contract: OutputContract) -> Self {
        Self { contract }
    }

    /// Report every field's outcome without failing.
    pub fn inspect(&self, text: &str) -> ParsedResponse {
        let lines = split_lines(text);

        ParsedResponse {
            contract_version: self.contract.version,
            name: self.extract_name(&lines),
            description: self.extract_description(&lines),
            code: self.extract_code(&lines),
        }
    }

    /// Parse a complete candidate or report which fields were unusable.
    pub fn parse(&self, text: &str) -> Result<PolicyCandidate, ParseError> {
        self.inspect(text).into_candidate()
    }

    fn find_header(&self, lines: &[Line<'_>], field: ContractField) -> Option<usize> {
        let wanted = OutputContract::normalize_header(self.contract.header_for(field));
        lines
            .iter()
            .position(|line| line.header.as_deref() == Some(wanted.as_str()))
    }

    /// Lines after the header at `start`, up to the next header.
    fn section<'l, 'a>(lines: &'l [Line<'a>], start: usize) -> impl Iterator<Item = &'l Line<'a>> {
        lines[start + 1..]
            .iter()
            .take_while(|line| line.header.is_none())
    }

    fn extract_name(&self, lines: &[Line<'_>]) -> FieldOutcome {
        let Some(start) = self.find_header(lines, ContractField::Name) else {
            return FieldOutcome::Missing;
        };
        let name = Self::section(lines, start)
            .map(|line| line.text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or_default();
        FieldOutcome::from_text(name.to_string())
    }

    fn extract_description(&self, lines: &[Line<'_>]) -> FieldOutcome {
        let Some(start) = self.find_header(lines, ContractField::Description) else {
            return FieldOutcome::Missing;
        };
        let body: Vec<&str> = Self::section(lines, start).map(|line| line.text).collect();
        FieldOutcome::from_text(body.join("\n").trim().to_string())
    }

    fn extract_code(&self, lines: &[Line<'_>]) -> FieldOutcome {
        let Some(start) = self.find_header(lines, ContractField::Code) else {
            return FieldOutcome::Missing;
        };
        let mut rest = lines[start + 1..].iter();
        if !rest.any(|line| is_fence(line.text)) {
            return FieldOutcome::Missing;
        }
        let body: Vec<&str> = rest
            .take_while(|line| !is_fence(line.text))
            .map(|line| line.text)
            .collect();
        FieldOutcome::from_text(strip_blank_lines(&body))
    }
}

/// Join lines, dropping blank lines at either end. Indentation of the
/// remaining lines is kept.
fn strip_blank_lines(lines: &[&str]) -> String {
    let is_blank = |line: &&str| line.trim().is_empty();
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Header text of a Markdown header line (`#`.. followed by whitespace).
fn header_text(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = trimmed.trim_start_matches('#');
    if rest.len() == trimmed.len() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(OutputContract::normalize_header(rest))
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut in_fence = false;
    text.lines()
        .map(|raw| {
            let text = raw.trim_end_matches('\r');
            let header = if in_fence { None } else { header_text(text) };
            if is_fence(text) {
                in_fence = !in_fence;
            }
            Line { text, header }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacheforge_types::contract::POLICY_OUTPUT_CONTRACT;

    fn parser() -> ResponseParser {
        ResponseParser::new(POLICY_OUTPUT_CONTRACT)
    }

    const RESPONSE: &str = "\
Some preamble the model wrote.

## Policy Name
Adaptive SHiP-D

## Policy Description
Signature-based hit prediction with
dynamic insertion.

## C++ Implementation
```cpp
#include \"../inc/champsim_crc2.h\"
// # not a header
void InitReplacementState() {}
```

Trailing notes.
";

    #[test]
    fn test_parse_complete_response() {
        let candidate = parser().parse(RESPONSE).unwrap();
        assert_eq!(candidate.name, "Adaptive SHiP-D");
        assert_eq!(
            candidate.description,
            "Signature-based hit prediction with\ndynamic insertion."
        );
        assert_eq!(
            candidate.source,
            "#include \"../inc/champsim_crc2.h\"\n// # not a header\nvoid InitReplacementState() {}"
        );
    }

    #[test]
    fn test_missing_name_header_reports_all_absent() {
        let text = RESPONSE.replace("## Policy Name\n", "");
        let parsed = parser().inspect(&text);
        assert_eq!(parsed.name, FieldOutcome::Missing);
        assert!(matches!(parsed.description, FieldOutcome::Found(_)));

        let err = parser().parse(&text).unwrap_err();
        assert_eq!(err.contract_version, 1);
        assert_eq!(err.status(ContractField::Name), Some(FieldStatus::Missing));
        assert_eq!(err.status(ContractField::Code), Some(FieldStatus::Found));
    }

    #[test]
    fn test_empty_sections() {
        let text = "## Policy Name\n\n## Policy Description\n   \n## C++ Implementation\n```cpp\n```\n";
        let parsed = parser().inspect(text);
        assert_eq!(parsed.name, FieldOutcome::Empty);
        assert_eq!(parsed.description, FieldOutcome::Empty);
        assert_eq!(parsed.code, FieldOutcome::Empty);
        assert!(parsed.into_candidate().is_err());
    }

    #[test]
    fn test_missing_fence_is_missing_code() {
        let text = "## Policy Name\nX\n## Policy Description\nY\n## C++ Implementation\nno code here\n";
        let parsed = parser().inspect(text);
        assert_eq!(parsed.code, FieldOutcome::Missing);
        assert_eq!(parsed.field(ContractField::Name), &FieldOutcome::Found("X".to_string()));
    }

    #[test]
    fn test_lenient_headers_and_fence_language() {
        let text = "### policy   name\nLRU-K\n# POLICY DESCRIPTION\nTracks K references.\n\
                    ## c++ implementation\n```c++\nint k = 2;\n```\n";
        let candidate = parser().parse(text).unwrap();
        assert_eq!(candidate.name, "LRU-K");
        assert_eq!(candidate.description, "Tracks K references.");
        assert_eq!(candidate.source, "int k = 2;");
    }

    #[test]
    fn test_fence_before_implementation_header_is_ignored() {
        let text = "## Policy Name\nA\n## Policy Description\nB\n```cpp\nsketch\n```\n\
                    ## C++ Implementation\n```cpp\nreal\n```\n";
        let candidate = parser().parse(text).unwrap();
        assert_eq!(candidate.source, "real");
    }

    #[test]
    fn test_unterminated_fence_takes_rest() {
        let text = "## Policy Name\nA\n## Policy Description\nB\n## C++ Implementation\n```cpp\nint a;\nint b;";
        let candidate = parser().parse(text).unwrap();
        assert_eq!(candidate.source, "int a;\nint b;");
    }

    #[test]
    fn test_code_keeps_leading_indentation() {
        let text = "## Policy Name\nX\n## Policy Description\nY\n## C++ Implementation\n```cpp\n\n    // indented first line\n    int x;\n}\n\n```\n";
        let candidate = parser().parse(text).unwrap();
        assert_eq!(candidate.source, "    // indented first line\n    int x;\n}");
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "## Policy Name\r\nA\r\n## Policy Description\r\nB\r\n## C++ Implementation\r\n```cpp\r\nx\r\n```\r\n";
        let candidate = parser().parse(text).unwrap();
        assert_eq!(candidate.name, "A");
        assert_eq!(candidate.source, "x");
    }
}
