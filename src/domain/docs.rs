//! Documentation extraction: raw doc payloads into normalized blocks.
//!
//! Payloads follow rustdoc conventions: a leading summary, then optional
//! `# Arguments`/`# Parameters`, `# Returns`, and `# Remarks`/`# Notes`
//! sections. Other sections are dropped. Prose fields are collapsed to one
//! flowing paragraph each; the parameter list stays one entry per parameter.

/// Normalized documentation for one unit. An empty block is still a block;
/// the renderer substitutes its placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocBlock {
    pub summary: Option<String>,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
    pub remarks: Option<String>,
}

impl DocBlock {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.params.is_empty()
            && self.returns.is_none()
            && self.remarks.is_none()
    }

    /// Normalize a raw payload. Missing or blank payloads become an empty
    /// block; a payload that fails structured parsing falls back to the raw
    /// text, trimmed, as the summary. Never errors.
    pub fn extract(raw: Option<&str>) -> DocBlock {
        let Some(raw) = raw else {
            return DocBlock::default();
        };
        if raw.trim().is_empty() {
            return DocBlock::default();
        }
        match parse_structured(raw) {
            Ok(block) => block,
            Err(_) => DocBlock {
                summary: Some(raw.trim().to_string()),
                ..DocBlock::default()
            },
        }
    }
}

#[derive(Debug, PartialEq)]
enum DocParseError {
    UnclosedFence,
    BadParameter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Summary,
    Params,
    Returns,
    Remarks,
    Ignored,
}

fn section_for(heading: &str) -> Section {
    match heading.trim().to_ascii_lowercase().as_str() {
        "arguments" | "parameters" => Section::Params,
        "returns" => Section::Returns,
        "remarks" | "notes" => Section::Remarks,
        _ => Section::Ignored,
    }
}

/// Collapse every whitespace run, newlines included, to a single space.
pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_structured(raw: &str) -> Result<DocBlock, DocParseError> {
    let mut section = Section::Summary;
    let mut in_fence = false;

    let mut summary: Vec<&str> = Vec::new();
    let mut params: Vec<(String, String)> = Vec::new();
    let mut returns: Vec<&str> = Vec::new();
    let mut remarks: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix('#') {
            section = section_for(heading.trim_start_matches('#'));
            continue;
        }

        match section {
            Section::Summary => summary.push(trimmed),
            Section::Returns => returns.push(trimmed),
            Section::Remarks => remarks.push(trimmed),
            Section::Ignored => {}
            Section::Params => {
                if let Some(rest) = trimmed
                    .strip_prefix("- ")
                    .or_else(|| trimmed.strip_prefix("* "))
                {
                    params.push(parse_param_bullet(rest)?);
                } else if !trimmed.is_empty() {
                    // Continuation of the previous bullet's description.
                    match params.last_mut() {
                        Some((_, desc)) => {
                            desc.push(' ');
                            desc.push_str(trimmed);
                        }
                        None => return Err(DocParseError::BadParameter),
                    }
                }
            }
        }
    }

    if in_fence {
        return Err(DocParseError::UnclosedFence);
    }

    let flatten = |lines: Vec<&str>| {
        let text = collapse_ws(&lines.join(" "));
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    };

    Ok(DocBlock {
        summary: flatten(summary),
        params: params
            .into_iter()
            .map(|(name, desc)| (name, collapse_ws(&desc)))
            .collect(),
        returns: flatten(returns),
        remarks: flatten(remarks),
    })
}

/// One `- `name` - description` bullet. The name may be backtick-quoted or a
/// bare token; a bullet with no recognizable name is a parse failure.
fn parse_param_bullet(rest: &str) -> Result<(String, String), DocParseError> {
    let rest = rest.trim();
    let (name, tail) = if let Some(quoted) = rest.strip_prefix('`') {
        match quoted.find('`') {
            Some(end) => (&quoted[..end], &quoted[end + 1..]),
            None => return Err(DocParseError::BadParameter),
        }
    } else {
        match rest.split_once(char::is_whitespace) {
            Some((word, tail)) => (word, tail),
            None => (rest, ""),
        }
    };

    let name = name.trim_end_matches([':', '-']).trim();
    if name.is_empty() {
        return Err(DocParseError::BadParameter);
    }

    let desc = tail
        .trim_start()
        .trim_start_matches([':', '-'])
        .trim_start();
    Ok((name.to_string(), desc.to_string()))
}
