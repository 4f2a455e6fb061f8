use crate::cell::Cell;
use crate::rules::{Identifier, IdentifierPattern, Literal};

/// Outcome of testing one cell against one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    /// Trimmed cell text; empty when the cell has no text.
    pub raw_value: String,
    /// Cell strike state, recorded only when the identifier asks for it.
    pub struck_through: bool,
}

impl MatchResult {
    fn miss(raw_value: String) -> Self {
        Self { matched: false, raw_value, struck_through: false }
    }
}

/// Test a cell against an identifier. Pure; never fails.
///
/// Strikethrough is captured, not filtered: a struck cell that satisfies the
/// pattern still matches.
pub fn match_cell(cell: &Cell, identifier: &Identifier) -> MatchResult {
    let Some(text) = cell.text() else {
        return MatchResult::miss(String::new());
    };

    if !pattern_matches(&identifier.pattern, &text) {
        return MatchResult::miss(text);
    }

    MatchResult {
        matched: true,
        raw_value: text,
        struck_through: identifier.check_for_strikethrough && cell.struck_through,
    }
}

/// Test trimmed text against a pattern.
pub fn pattern_matches(pattern: &IdentifierPattern, text: &str) -> bool {
    match pattern {
        IdentifierPattern::StartsWith(lit) => with_case(lit, text, |hay, needle| hay.starts_with(needle)),
        IdentifierPattern::Contains(lit) => with_case(lit, text, |hay, needle| hay.contains(needle)),
        IdentifierPattern::ExactMatch(lit) => with_case(lit, text, |hay, needle| hay == needle),
        IdentifierPattern::Regex(re) => re.is_match(text),
    }
}

fn with_case(lit: &Literal, text: &str, test: impl Fn(&str, &str) -> bool) -> bool {
    if lit.case_sensitive {
        test(text, &lit.needle)
    } else {
        test(&text.to_lowercase(), &lit.needle)
    }
}
