//! Lexical import/export scanner and in-place span editor.
//!
//! Scans compiled module text for the string-literal specifiers of static
//! imports, re-exports, and dynamic `import()` calls, recording their byte
//! offsets. Rewrites happen through [`SpanEdits`] against those offsets, so
//! unrelated occurrences of the same substring are never touched and
//! position-preserving source maps stay valid. This is a purely lexical
//! pass, not a full parse: comments and string/template literals are
//! skipped, everything else is pattern-driven.

/// Kind of import site a span was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from "x"` or side-effect `import "x"`.
    Static,
    /// `export ... from "x"`.
    ExportFrom,
    /// Dynamic `import("x")`.
    Dynamic,
}

/// One discovered specifier with its byte offsets into the source.
///
/// `start..end` covers the specifier text only, excluding the quotes.
/// `stmt_start..stmt_end` covers the whole statement (through the trailing
/// semicolon when present) for static imports and re-exports; for dynamic
/// imports it covers only the specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpan {
    pub start: usize,
    pub end: usize,
    pub stmt_start: usize,
    pub stmt_end: usize,
    pub specifier: String,
    pub kind: ImportKind,
}

/// Kind of export statement found by [`scan_export_statements`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    /// `export const|let|var|function|class|async ...`; the declaration
    /// itself starts at `decl_start`.
    Declaration { decl_start: usize },
    /// `export { a, b };` without a `from` clause; `end` is one past the
    /// statement terminator.
    Named { end: usize },
    /// `export default ...`.
    Default,
    /// `export ... from "x"`; the specifier is reported by
    /// [`parse_import_spans`].
    ReExport,
}

/// One export statement, anchored at the `export` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpan {
    pub start: usize,
    pub kind: ExportKind,
}

const IDENT_EXTRA: &[u8] = b"_$";

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || IDENT_EXTRA.contains(&b)
}

fn at_keyword(bytes: &[u8], i: usize, keyword: &str) -> bool {
    let kw = keyword.as_bytes();
    if i + kw.len() > bytes.len() || &bytes[i..i + kw.len()] != kw {
        return false;
    }
    if i > 0 && (is_ident_byte(bytes[i - 1]) || bytes[i - 1] == b'.') {
        return false;
    }
    match bytes.get(i + kw.len()) {
        Some(&b) => !is_ident_byte(b),
        None => false,
    }
}

/// Skip a quoted string starting at the opening quote. Returns the index
/// one past the closing quote.
fn skip_string(bytes: &[u8], mut i: usize) -> usize {
    let quote = bytes[i];
    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            return i + 1;
        }
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Extend a statement end past inline whitespace to a trailing semicolon.
fn statement_end(bytes: &[u8], mut i: usize) -> usize {
    let mut k = i;
    while k < bytes.len() && (bytes[k] == b' ' || bytes[k] == b'\t') {
        k += 1;
    }
    if k < bytes.len() && bytes[k] == b';' {
        i = k + 1;
    }
    i
}

/// Read a quoted specifier at `i`; returns `(start, end, next)` where
/// `start..end` excludes the quotes and `next` is one past the closing quote.
fn read_specifier(bytes: &[u8], i: usize) -> Option<(usize, usize, usize)> {
    let quote = *bytes.get(i)?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let start = i + 1;
    let mut k = start;
    while k < bytes.len() && bytes[k] != quote {
        k += 1;
    }
    if k >= bytes.len() {
        return None;
    }
    Some((start, k, k + 1))
}

/// Parse the top-level import/export specifier spans of a module.
pub fn parse_import_spans(source: &str) -> Vec<ImportSpan> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        // Comments
        if b == b'/' && i + 1 < len {
            if bytes[i + 1] == b'/' {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if bytes[i + 1] == b'*' {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(len);
                continue;
            }
        }

        // String and template literals outside import statements
        if b == b'"' || b == b'\'' || b == b'`' {
            i = skip_string(bytes, i);
            continue;
        }

        if at_keyword(bytes, i, "import") {
            let mut j = skip_whitespace(bytes, i + 6);

            // import.meta is not an import statement
            if bytes.get(j) == Some(&b'.') {
                i = j;
                continue;
            }

            // Dynamic import("x")
            if bytes.get(j) == Some(&b'(') {
                j = skip_whitespace(bytes, j + 1);
                if let Some((start, end, next)) = read_specifier(bytes, j) {
                    spans.push(ImportSpan {
                        start,
                        end,
                        stmt_start: start,
                        stmt_end: end,
                        specifier: source[start..end].to_string(),
                        kind: ImportKind::Dynamic,
                    });
                    i = next;
                } else {
                    // Non-literal argument; leave it alone
                    i = j;
                }
                continue;
            }

            // Static import: first string literal before the terminator
            let mut k = j;
            let mut found = None;
            while k < len && bytes[k] != b';' {
                if bytes[k] == b'"' || bytes[k] == b'\'' {
                    found = read_specifier(bytes, k);
                    break;
                }
                k += 1;
            }
            if let Some((start, end, next)) = found {
                spans.push(ImportSpan {
                    start,
                    end,
                    stmt_start: i,
                    stmt_end: statement_end(bytes, next),
                    specifier: source[start..end].to_string(),
                    kind: ImportKind::Static,
                });
                i = next;
            } else {
                i = k;
            }
            continue;
        }

        if at_keyword(bytes, i, "export") {
            // Only `export ... from "x"` carries a specifier. Walk forward
            // tracking the last identifier; a quote is a re-export target
            // only when that identifier was `from`.
            let mut k = i + 6;
            let mut last_word = String::new();
            let mut in_braces = false;
            let mut matched = None;
            while k < len && bytes[k] != b';' {
                let b = bytes[k];
                if b == b'"' || b == b'\'' {
                    if last_word == "from" {
                        matched = read_specifier(bytes, k);
                    }
                    break;
                }
                if b == b'=' {
                    break; // export const x = "..."
                }
                if b == b'{' {
                    in_braces = true;
                } else if b == b'}' {
                    in_braces = false;
                }
                if is_ident_byte(b) {
                    let start = k;
                    while k < len && is_ident_byte(bytes[k]) {
                        k += 1;
                    }
                    last_word = source[start..k].to_string();
                    // Declaration exports never have a from-clause; inside
                    // braces these words are just binding names.
                    if !in_braces
                        && matches!(
                            last_word.as_str(),
                            "const" | "let" | "var" | "function" | "class" | "default" | "async"
                        )
                    {
                        break;
                    }
                    continue;
                }
                k += 1;
            }
            if let Some((start, end, next)) = matched {
                spans.push(ImportSpan {
                    start,
                    end,
                    stmt_start: i,
                    stmt_end: statement_end(bytes, next),
                    specifier: source[start..end].to_string(),
                    kind: ImportKind::ExportFrom,
                });
                i = next;
            } else {
                i = k.max(i + 6);
            }
            continue;
        }

        i += 1;
    }

    spans
}

/// Scan the top-level export statements of a module.
///
/// Used by the pre-bundler to classify package entries and demote internal
/// exports while flattening.
pub fn scan_export_statements(source: &str) -> Vec<ExportSpan> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == b'/' && i + 1 < len {
            if bytes[i + 1] == b'/' {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if bytes[i + 1] == b'*' {
                i += 2;
                while i + 1 < len && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(len);
                continue;
            }
        }

        if b == b'"' || b == b'\'' || b == b'`' {
            i = skip_string(bytes, i);
            continue;
        }

        if at_keyword(bytes, i, "export") {
            let start = i;
            let j = skip_whitespace(bytes, i + 6);
            let word_start = j;
            let mut k = j;
            while k < len && is_ident_byte(bytes[k]) {
                k += 1;
            }
            let word = &source[word_start..k];

            let kind = match word {
                "const" | "let" | "var" | "function" | "class" | "async" => {
                    ExportKind::Declaration {
                        decl_start: word_start,
                    }
                }
                "default" => ExportKind::Default,
                _ => {
                    // `export { ... }` or `export * ...`: re-export iff a
                    // from-clause follows before the terminator.
                    let mut m = j;
                    let mut last_word = String::new();
                    let mut is_reexport = false;
                    while m < len && bytes[m] != b';' {
                        let c = bytes[m];
                        if c == b'"' || c == b'\'' {
                            is_reexport = last_word == "from";
                            if is_reexport {
                                m = skip_string(bytes, m);
                            }
                            break;
                        }
                        if is_ident_byte(c) {
                            let s = m;
                            while m < len && is_ident_byte(bytes[m]) {
                                m += 1;
                            }
                            last_word = source[s..m].to_string();
                            continue;
                        }
                        m += 1;
                    }
                    if is_reexport {
                        ExportKind::ReExport
                    } else {
                        let end = if m < len && bytes[m] == b';' { m + 1 } else { m };
                        ExportKind::Named { end }
                    }
                }
            };

            spans.push(ExportSpan { start, kind });
            i = k.max(i + 6);
            continue;
        }

        i += 1;
    }

    spans
}

/// Whether the source uses standard module syntax at the top level.
#[must_use]
pub fn has_esm_syntax(source: &str) -> bool {
    !parse_import_spans(source).is_empty() || !scan_export_statements(source).is_empty()
}

/// Ordered set of in-place byte-range replacements plus a prologue.
///
/// Replacements never overlap; applying them preserves all untouched text
/// exactly.
#[derive(Debug, Default)]
pub struct SpanEdits {
    edits: Vec<(usize, usize, String)>,
    prepend: String,
}

impl SpanEdits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `start..end` of the original source with `content`.
    pub fn overwrite(&mut self, start: usize, end: usize, content: impl Into<String>) {
        self.edits.push((start, end, content.into()));
    }

    /// Prepend text before the first byte of the source.
    pub fn prepend(&mut self, content: impl Into<String>) {
        self.prepend.push_str(&content.into());
    }

    /// Whether any edit or prologue is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.prepend.is_empty()
    }

    /// Apply all edits against the original source.
    #[must_use]
    pub fn apply(&self, source: &str) -> String {
        let mut edits = self.edits.clone();
        edits.sort_by_key(|(start, _, _)| *start);

        let mut out = String::with_capacity(source.len() + self.prepend.len());
        out.push_str(&self.prepend);
        let mut last = 0;
        for (start, end, content) in edits {
            debug_assert!(start >= last, "overlapping span edits");
            out.push_str(&source[last..start]);
            out.push_str(&content);
            last = end;
        }
        out.push_str(&source[last..]);
        out
    }
}
