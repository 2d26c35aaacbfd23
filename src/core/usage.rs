//! Usage site types produced by the scanner and stored in the index.

use serde::Serialize;

// ============================================================
// Reference Form
// ============================================================

/// Syntactic form of a key reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceForm {
    /// `m.key()`
    BareCall,
    /// `m.key(args)`
    CallWithArgs,
    /// `$m.key`
    Reactive,
    /// `{m.key(...)}`
    TemplateCall,
    /// `{m.key}`
    TemplateRef,
    /// `m["key"]`
    DynamicLookup,
}

impl ReferenceForm {
    /// Forms that wrap a call in template braces.
    pub fn is_template(self) -> bool {
        matches!(self, ReferenceForm::TemplateCall | ReferenceForm::TemplateRef)
    }

    /// Forms that may sit inside a template-wrapped match.
    pub fn is_call(self) -> bool {
        matches!(self, ReferenceForm::BareCall | ReferenceForm::CallWithArgs)
    }
}

impl std::fmt::Display for ReferenceForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceForm::BareCall => write!(f, "bare-call"),
            ReferenceForm::CallWithArgs => write!(f, "call-with-args"),
            ReferenceForm::Reactive => write!(f, "reactive"),
            ReferenceForm::TemplateCall => write!(f, "template-call"),
            ReferenceForm::TemplateRef => write!(f, "template-ref"),
            ReferenceForm::DynamicLookup => write!(f, "dynamic-lookup"),
        }
    }
}

// ============================================================
// Usage Site
// ============================================================

/// One occurrence of a key reference in a source file.
///
/// `(file_path, line, column, key)` is unique within one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSite {
    pub key: String,
    /// Empty until the index assigns the scanned file's path.
    pub file_path: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based character column of the match start.
    pub column: usize,
    /// Verbatim text that matched.
    pub matched_text: String,
    /// Trimmed window around the match, with `...` where truncated.
    pub context: String,
    pub form: ReferenceForm,
}

impl UsageSite {
    /// Sort key used by the index so rebuilt and updated indexes compare equal.
    pub fn position(&self) -> (&str, usize, usize) {
        (&self.file_path, self.line, self.column)
    }
}

/// A source file handed to the scanner: path plus full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}
