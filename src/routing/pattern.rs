//! Path template compilation.
//!
//! # Responsibilities
//! - Turn a template such as `/news/:id` into an anchored regex
//! - Record the ordered list of capture names
//!
//! # Design Decisions
//! - Case-insensitive, optional trailing slash, anchored at both ends
//! - `:name` captures one segment; `:name(re)` uses a custom group
//! - Modifiers: `?` optional, `+` one or more segments, `*` zero or more
//! - Unnamed `(re)` groups and a bare `*` get numeric names (`0`, `1`, ...)
//! - Capture groups are named internally so custom patterns with their own
//!   groups cannot shift positions

use regex::{Regex, RegexBuilder};
use thiserror::Error;

const DEFAULT_SEGMENT: &str = r"[^/]+?";

/// Errors raised while compiling a path template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A `(` group was never closed.
    #[error("unclosed group in pattern `{0}`")]
    UnclosedGroup(String),

    /// A `(` group has no content.
    #[error("empty group in pattern `{0}`")]
    EmptyGroup(String),

    /// The generated expression was rejected by the regex engine.
    #[error("invalid pattern `{template}`: {reason}")]
    Regex { template: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Static(String),
    Param {
        name: String,
        prefix: String,
        pattern: String,
        optional: bool,
        repeat: bool,
    },
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    regex: Regex,
    keys: Vec<String>,
}

impl Pattern {
    /// Compile a template into a matcher.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;
        let mut source = String::from("^");
        let mut keys = Vec::new();

        for token in &tokens {
            match token {
                Token::Static(text) => source.push_str(&regex::escape(text)),
                Token::Param {
                    name,
                    prefix,
                    pattern,
                    optional,
                    repeat,
                } => {
                    let group = format!("p{}", keys.len());
                    let prefix = regex::escape(prefix);
                    let body = if *repeat {
                        format!("(?:{pattern})(?:{prefix}(?:{pattern}))*")
                    } else {
                        format!("(?:{pattern})")
                    };
                    let capture = format!("(?P<{group}>{body})");
                    if *optional {
                        source.push_str(&format!("(?:{prefix}{capture})?"));
                    } else {
                        source.push_str(&prefix);
                        source.push_str(&capture);
                    }
                    keys.push(name.clone());
                }
            }
        }

        if source.ends_with('/') {
            source.pop();
        }
        source.push_str("/?$");

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::Regex {
                template: template.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            keys,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Ordered capture names.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns true if the pathname matches.
    pub fn is_match(&self, pathname: &str) -> bool {
        self.regex.is_match(pathname)
    }

    /// Raw (undecoded) captures by position, `None` for groups that did not
    /// participate. Returns `None` when the pathname does not match.
    pub fn captures(&self, pathname: &str) -> Option<Vec<Option<String>>> {
        let caps = self.regex.captures(pathname)?;
        Some(
            (0..self.keys.len())
                .map(|i| caps.name(&format!("p{i}")).map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut unnamed = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            text.push(chars[i + 1]);
            i += 2;
            continue;
        }

        let mut name = None;
        let mut pattern = None;
        let mut next = i;

        if c == ':' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            if end > start {
                name = Some(chars[start..end].iter().collect::<String>());
                next = end;
                if next < chars.len() && chars[next] == '(' {
                    let (group, after) = read_group(&chars, next, template)?;
                    pattern = Some(group);
                    next = after;
                }
            }
        } else if c == '(' {
            let (group, after) = read_group(&chars, i, template)?;
            name = Some(unnamed.to_string());
            unnamed += 1;
            pattern = Some(group);
            next = after;
        } else if c == '*' {
            name = Some(unnamed.to_string());
            unnamed += 1;
            pattern = Some(".*".to_string());
            next = i + 1;
        }

        let Some(name) = name else {
            text.push(c);
            i += 1;
            continue;
        };

        let modifier = chars.get(next).copied().filter(|m| matches!(m, '?' | '+' | '*'));
        if modifier.is_some() && c != '*' {
            next += 1;
        }

        let prefix = match text.chars().last() {
            Some(p @ ('/' | '.')) => {
                text.pop();
                p.to_string()
            }
            _ => String::new(),
        };
        if !text.is_empty() {
            tokens.push(Token::Static(std::mem::take(&mut text)));
        }

        let modifier = if c == '*' { None } else { modifier };
        tokens.push(Token::Param {
            name,
            prefix,
            pattern: pattern.unwrap_or_else(|| DEFAULT_SEGMENT.to_string()),
            optional: matches!(modifier, Some('?' | '*')),
            repeat: matches!(modifier, Some('+' | '*')),
        });
        i = next;
    }

    if !text.is_empty() {
        tokens.push(Token::Static(text));
    }
    Ok(tokens)
}

/// Read a balanced `( ... )` group starting at `open`; returns the inner text
/// and the index after the closing paren.
fn read_group(chars: &[char], open: usize, template: &str) -> Result<(String, usize), PatternError> {
    let mut depth = 0usize;
    let mut inner = String::new();
    let mut i = open;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                if depth > 0 {
                    inner.push(c);
                    inner.push(chars[i + 1]);
                }
                i += 2;
                continue;
            }
            '(' => {
                if depth > 0 {
                    inner.push(c);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if inner.is_empty() {
                        return Err(PatternError::EmptyGroup(template.to_string()));
                    }
                    return Ok((inner, i + 1));
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
        i += 1;
    }

    Err(PatternError::UnclosedGroup(template.to_string()))
}
