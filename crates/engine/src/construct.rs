//! `constructFields` format strings: `"{_primary_} ({desc})"`.

/// Reserved placeholder for the rule's primary value.
pub const PRIMARY_PLACEHOLDER: &str = "_primary_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment {
    Literal(String),
    Primary,
    Field(String),
}

/// Split a format string into literal and placeholder segments.
pub fn parse_format(format: &str) -> Result<Vec<FormatSegment>, String> {
    let mut segments = Vec::new();
    let mut rest = format;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            segments.push(FormatSegment::Literal(rest[..open].to_string()));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unterminated placeholder in '{format}'"))?;
        let name = after[..close].trim();
        if name.is_empty() {
            return Err(format!("empty placeholder in '{format}'"));
        }
        if name.contains('{') {
            return Err(format!("nested '{{' in '{format}'"));
        }
        segments.push(if name == PRIMARY_PLACEHOLDER {
            FormatSegment::Primary
        } else {
            FormatSegment::Field(name.to_string())
        });
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(FormatSegment::Literal(rest.to_string()));
    }
    Ok(segments)
}

/// Render segments. `lookup` resolves a field name; on a missing field the
/// name is returned as the error.
pub fn render<'a, F>(segments: &[FormatSegment], primary: &str, mut lookup: F) -> Result<String, String>
where
    F: FnMut(&str) -> Option<&'a str>,
{
    let mut out = String::new();
    for segment in segments {
        match segment {
            FormatSegment::Literal(text) => out.push_str(text),
            FormatSegment::Primary => out.push_str(primary),
            FormatSegment::Field(name) => match lookup(name) {
                Some(value) => out.push_str(value),
                None => return Err(name.clone()),
            },
        }
    }
    Ok(out)
}
