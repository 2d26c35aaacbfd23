//! Pattern-based extraction of key references from source text.
//!
//! No parsing is involved: each line is matched against an ordered table of
//! regular expressions, one per reference form. Every pattern exposes two named
//! groups, `lit` (the literal reported as the match) and `key`.
//!
//! A call matched entirely inside a template-wrapped match for the same key is
//! the same reference, so only the wrapped form is reported for it.

use regex::Regex;

use crate::core::error::PatternCompileError;
use crate::core::usage::{ReferenceForm, UsageSite};

/// Characters of context kept on each side of a match.
pub const CONTEXT_RADIUS: usize = 20;

/// Key syntax: identifier segments joined by `.`.
const KEY: &str = r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*";

/// Matches the start of a line or any character that cannot continue an
/// accessor expression.
const BOUNDARY: &str = r"(?:^|[^\w.$])";

/// Uncompiled pattern definition.
#[derive(Debug, Clone)]
pub struct PatternDef {
    pub name: String,
    pub form: ReferenceForm,
    pub regex: String,
}

impl PatternDef {
    pub fn new(name: impl Into<String>, form: ReferenceForm, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            form,
            regex: regex.into(),
        }
    }
}

/// Default reference table for a message accessor such as `m`.
pub fn default_patterns(accessor: &str) -> Vec<PatternDef> {
    let a = regex::escape(accessor);
    vec![
        PatternDef::new(
            "template-call",
            ReferenceForm::TemplateCall,
            format!(r"(?P<lit>\{{\s*{a}\.(?P<key>{KEY})\([^)]*\)\s*\}})"),
        ),
        PatternDef::new(
            "template-ref",
            ReferenceForm::TemplateRef,
            format!(r"(?P<lit>\{{\s*{a}\.(?P<key>{KEY})\s*\}})"),
        ),
        PatternDef::new(
            "bare-call",
            ReferenceForm::BareCall,
            format!(r"{BOUNDARY}(?P<lit>{a}\.(?P<key>{KEY})\(\))"),
        ),
        PatternDef::new(
            "call-with-args",
            ReferenceForm::CallWithArgs,
            format!(r"{BOUNDARY}(?P<lit>{a}\.(?P<key>{KEY})\([^)]+\))"),
        ),
        PatternDef::new(
            "reactive",
            ReferenceForm::Reactive,
            format!(r"{BOUNDARY}(?P<lit>\${a}\.(?P<key>{KEY}))"),
        ),
        PatternDef::new(
            "dynamic-lookup",
            ReferenceForm::DynamicLookup,
            format!(r#"{BOUNDARY}(?P<lit>\$?{a}\[\s*["'](?P<key>{KEY})["']\s*\])"#),
        ),
    ]
}

/// True if `name` can be used as a message accessor (`m`, `messages`, `i18n`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A compiled reference pattern.
#[derive(Debug, Clone)]
struct KeyPattern {
    form: ReferenceForm,
    regex: Regex,
}

#[derive(Debug)]
struct RawMatch<'a> {
    form: ReferenceForm,
    key: &'a str,
    start: usize,
    end: usize,
}

/// Scans source text for key references.
#[derive(Debug, Clone)]
pub struct PatternScanner {
    patterns: Vec<KeyPattern>,
}

impl PatternScanner {
    /// Compile a pattern table. Order in the table is the reporting order for
    /// matches at the same column.
    pub fn new(defs: Vec<PatternDef>) -> Result<Self, PatternCompileError> {
        let mut patterns = Vec::with_capacity(defs.len());
        for def in defs {
            let regex = Regex::new(&def.regex).map_err(|source| PatternCompileError::Regex {
                name: def.name.clone(),
                source,
            })?;
            for group in ["lit", "key"] {
                if !regex.capture_names().flatten().any(|name| name == group) {
                    return Err(PatternCompileError::MissingGroup {
                        name: def.name,
                        group,
                    });
                }
            }
            patterns.push(KeyPattern {
                form: def.form,
                regex,
            });
        }
        Ok(Self { patterns })
    }

    /// Scanner with the default table for `accessor`.
    pub fn for_accessor(accessor: &str) -> Result<Self, PatternCompileError> {
        if !is_identifier(accessor) {
            return Err(PatternCompileError::InvalidAccessor(accessor.to_string()));
        }
        Self::new(default_patterns(accessor))
    }

    /// Scan the full text of one file. `file_path` is left empty on every site.
    pub fn scan(&self, text: &str) -> Vec<UsageSite> {
        let mut sites = Vec::new();
        for (index, line) in text.lines().enumerate() {
            self.scan_line(line, index + 1, &mut sites);
        }
        sites
    }

    fn scan_line(&self, line: &str, line_number: usize, sites: &mut Vec<UsageSite>) {
        let mut matches: Vec<RawMatch> = Vec::new();
        for pattern in &self.patterns {
            let mut pos = 0;
            while pos <= line.len() {
                let Some(caps) = pattern.regex.captures_at(line, pos) else {
                    break;
                };
                let (Some(lit), Some(key)) = (caps.name("lit"), caps.name("key")) else {
                    break;
                };
                matches.push(RawMatch {
                    form: pattern.form,
                    key: key.as_str(),
                    start: lit.start(),
                    end: lit.end(),
                });
                pos = next_boundary(line, lit.start());
            }
        }

        let wrapped = |m: &RawMatch| {
            m.form.is_call()
                && matches.iter().any(|outer| {
                    outer.form.is_template()
                        && outer.key == m.key
                        && outer.start <= m.start
                        && m.end <= outer.end
                })
        };

        let mut line_sites: Vec<UsageSite> = matches
            .iter()
            .filter(|m| !wrapped(m))
            .map(|m| UsageSite {
                key: m.key.to_string(),
                file_path: String::new(),
                line: line_number,
                column: line[..m.start].chars().count() + 1,
                matched_text: line[m.start..m.end].to_string(),
                context: extract_context(line, m.start, m.end),
                form: m.form,
            })
            .collect();
        line_sites.sort_by_key(|site| site.column);
        sites.extend(line_sites);
    }
}

/// Byte offset of the character after the one starting at `offset`.
fn next_boundary(line: &str, offset: usize) -> usize {
    line[offset..]
        .chars()
        .next()
        .map_or(line.len() + 1, |c| offset + c.len_utf8())
}

/// Window of [`CONTEXT_RADIUS`] characters on each side of `start..end`,
/// trimmed, with `...` marking a cut.
fn extract_context(line: &str, start: usize, end: usize) -> String {
    let from = line[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS - 1)
        .map_or(0, |(i, _)| i);
    let to = line[end..]
        .char_indices()
        .nth(CONTEXT_RADIUS)
        .map_or(line.len(), |(i, _)| end + i);

    let mut context = String::new();
    if from > 0 {
        context.push_str("...");
    }
    context.push_str(line[from..to].trim());
    if to < line.len() {
        context.push_str("...");
    }
    context
}
