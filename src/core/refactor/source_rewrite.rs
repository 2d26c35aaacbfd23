//! Rewriting key references in source text.
//!
//! Namespaced keys cannot be addressed as `m.home.welcome` (the accessor is a
//! flat object of message functions), so a dotted target key is written in the
//! lookup form `m["home.welcome"]`. Flat targets keep the member form.

use std::{
    fs,
    path::{Path, PathBuf},
};

use regex::{Captures, Regex};

use crate::core::{
    error::{PatternCompileError, RewriteError},
    key_path::is_namespaced,
    refactor::backup::{Backup, GuardedWriteError, guarded_write},
};

const BOUNDARY: &str = r"(?m)(?:^|[^\w.$])";

/// Rewrites references to one key into references to another.
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    accessor: String,
    new_key: String,
    member: Regex,
    lookup: Regex,
}

impl ReferenceRewriter {
    pub fn new(accessor: &str, old_key: &str, new_key: &str) -> Result<Self, PatternCompileError> {
        let a = regex::escape(accessor);
        let old = regex::escape(old_key);
        let compile = |name: &str, pattern: String| {
            Regex::new(&pattern).map_err(|source| PatternCompileError::Regex {
                name: name.to_string(),
                source,
            })
        };
        Ok(Self {
            accessor: accessor.to_string(),
            new_key: new_key.to_string(),
            member: compile(
                "rewrite-member",
                format!(r"{BOUNDARY}(?P<lit>(?P<dollar>\$?){a}\.{old})"),
            )?,
            lookup: compile(
                "rewrite-lookup",
                format!(
                    r#"{BOUNDARY}(?P<lit>(?P<dollar>\$?){a}\[\s*(?P<quote>["']){old}["']\s*\])"#
                ),
            )?,
        })
    }

    /// Accessor expression addressing the new key, using `quote` when the
    /// lookup form is needed.
    fn target(&self, quote: &str) -> String {
        if is_namespaced(&self.new_key) {
            format!("{}[{}{}{}]", self.accessor, quote, self.new_key, quote)
        } else {
            format!("{}.{}", self.accessor, self.new_key)
        }
    }

    /// Rewritten text, or `None` if nothing referenced the old key.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        let after_member = replace_references(&self.member, text, true, |caps| {
            format!("{}{}", dollar(caps), self.target("\""))
        });
        let source = after_member.as_deref().unwrap_or(text);
        let after_lookup = replace_references(&self.lookup, source, false, |caps| {
            let quote = caps.name("quote").map_or("\"", |q| q.as_str());
            format!("{}{}", dollar(caps), self.target(quote))
        });
        after_lookup.or(after_member)
    }
}

fn dollar<'t>(caps: &Captures<'t>) -> &'t str {
    caps.name("dollar").map_or("", |d| d.as_str())
}

/// Replace every `lit` match of `regex`. With `whole_key` set, a match directly
/// followed by an identifier character or `.` is a longer key and is skipped.
fn replace_references<F>(regex: &Regex, text: &str, whole_key: bool, replace: F) -> Option<String>
where
    F: Fn(&Captures) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    let mut changed = false;

    while pos <= text.len() {
        let Some(caps) = regex.captures_at(text, pos) else {
            break;
        };
        let Some(lit) = caps.name("lit") else {
            break;
        };
        let continues = text[lit.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if whole_key && continues {
            pos = lit.start() + 1;
            continue;
        }
        out.push_str(&text[last..lit.start()]);
        out.push_str(&replace(&caps));
        last = lit.end();
        pos = lit.end();
        changed = true;
    }

    if !changed {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

/// Rewrite one source file in place through a backup.
///
/// Returns `Ok(None)` when the file had no reference to rewrite.
pub fn rewrite_source_file(
    path: &Path,
    rewriter: &ReferenceRewriter,
) -> Result<Option<Backup>, RewriteError> {
    let text = fs::read_to_string(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(rewritten) = rewriter.rewrite(&text) else {
        return Ok(None);
    };

    let to_path = |path: &Path| -> PathBuf { path.to_path_buf() };
    guarded_write(path, &rewritten)
        .map(Some)
        .map_err(|err| match err {
            GuardedWriteError::ReadOnly => RewriteError::ReadOnly {
                path: to_path(path),
            },
            GuardedWriteError::Backup(source) => RewriteError::Backup {
                path: to_path(path),
                source,
            },
            GuardedWriteError::Write(source) => RewriteError::Write {
                path: to_path(path),
                source,
            },
        })
}
