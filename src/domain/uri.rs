//! Resource URI templates: `schema://airport-<code>`.
//!
//! A template is a sequence of literal runs and `<name>` placeholders.
//! Placeholder values are extracted by position: each one runs from the end
//! of the preceding literal up to the next literal (or the end of the URI),
//! so a value may contain characters that also appear in the literals.

use std::collections::BTreeMap;

use thiserror::Error;

/// Characters a placeholder value may never contain.
const RESERVED: &[char] = &['/', '?', '#'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedUri {
    #[error("uri `{uri}` does not start with `{prefix}`")]
    PrefixMismatch { uri: String, prefix: String },
    #[error("uri `{uri}` does not match template `{template}`")]
    Mismatch { uri: String, template: String },
    #[error("uri `{uri}` has an empty `{param}` segment")]
    EmptySegment { uri: String, param: String },
    #[error("`{param}` segment of uri `{uri}` contains a reserved character")]
    ReservedCharacter { uri: String, param: String },
    #[error("invalid uri template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(String),
}

/// A parsed resource URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<Part>,
}

/// Placeholder name -> extracted value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParams(BTreeMap<String, String>);

impl UriParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, MalformedUri> {
        let invalid = |reason| MalformedUri::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut parts = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find('<') {
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('>').ok_or_else(|| invalid("unclosed placeholder"))?;
            let name = &after[..close];
            if name.is_empty() {
                return Err(invalid("empty placeholder name"));
            }
            if matches!(parts.last(), Some(Part::Param(_))) {
                return Err(invalid("adjacent placeholders"));
            }
            parts.push(Part::Param(name.to_string()));
            rest = &after[close + 1..];
        }
        if rest.contains('>') {
            return Err(invalid("stray `>`"));
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }
        if !matches!(parts.first(), Some(Part::Literal(_))) {
            return Err(invalid("template must start with a literal prefix"));
        }

        Ok(Self {
            raw: template.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The literal text every matching URI must start with.
    pub fn prefix(&self) -> &str {
        match self.parts.first() {
            Some(Part::Literal(l)) => l,
            _ => "",
        }
    }

    /// Render as an RFC 6570 level-1 template (`schema://airport-{code}`).
    pub fn to_rfc6570(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                Part::Literal(l) => l.clone(),
                Part::Param(n) => format!("{{{n}}}"),
            })
            .collect()
    }

    pub fn resolve(&self, uri: &str) -> Result<UriParams, MalformedUri> {
        let prefix = self.prefix();
        let Some(mut rest) = uri.strip_prefix(prefix) else {
            return Err(MalformedUri::PrefixMismatch {
                uri: uri.to_string(),
                prefix: prefix.to_string(),
            });
        };

        let mut params = BTreeMap::new();
        let mut iter = self.parts.iter().skip(1).peekable();
        while let Some(part) = iter.next() {
            match part {
                Part::Literal(l) => {
                    rest = rest.strip_prefix(l.as_str()).ok_or_else(|| self.mismatch(uri))?;
                }
                Part::Param(name) => {
                    let value = match iter.peek() {
                        Some(Part::Literal(next)) => {
                            let end = rest.find(next.as_str()).ok_or_else(|| self.mismatch(uri))?;
                            &rest[..end]
                        }
                        _ => rest,
                    };
                    check_value(uri, name, value)?;
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[value.len()..];
                }
            }
        }
        if !rest.is_empty() {
            return Err(self.mismatch(uri));
        }
        Ok(UriParams(params))
    }

    fn mismatch(&self, uri: &str) -> MalformedUri {
        MalformedUri::Mismatch {
            uri: uri.to_string(),
            template: self.raw.clone(),
        }
    }
}

fn check_value(uri: &str, param: &str, value: &str) -> Result<(), MalformedUri> {
    if value.is_empty() {
        return Err(MalformedUri::EmptySegment {
            uri: uri.to_string(),
            param: param.to_string(),
        });
    }
    if value
        .chars()
        .any(|c| RESERVED.contains(&c) || c.is_whitespace())
    {
        return Err(MalformedUri::ReservedCharacter {
            uri: uri.to_string(),
            param: param.to_string(),
        });
    }
    Ok(())
}

/// Parse `template` and resolve `uri` against it in one step.
pub fn resolve(template: &str, uri: &str) -> Result<UriParams, MalformedUri> {
    UriTemplate::parse(template)?.resolve(uri)
}
