use std::path::{Component, Path, PathBuf};

use swc_core::common::{BytePos, Span};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};

use crate::error::{ExtractError, Result};

/// All spans in a parsed tree are offset by this base, so that no real span
/// collides with the dummy position.
pub const BASE_POS: u32 = 1;

/// Owns the raw text of one component file and translates spans back into it.
pub struct SourceText {
    text: String,
}

impl SourceText {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - BASE_POS) as usize
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[self.offset(span.lo)..self.offset(span.hi)]
    }

    /// Walks `pos` backwards over horizontal/vertical whitespace. Used to
    /// remove an attribute together with the gap before it.
    pub fn extend_back_over_whitespace(&self, pos: BytePos) -> BytePos {
        let mut off = self.offset(pos);
        let bytes = self.text.as_bytes();
        while off > 0 && matches!(bytes[off - 1], b' ' | b'\t' | b'\r' | b'\n') {
            off -= 1;
        }
        BytePos(off as u32 + BASE_POS)
    }
}

/// One component file: the parsed module plus the text its spans index into.
/// Never mutated; all rewrites are deferred text edits.
pub struct SourceTree {
    pub module: Module,
    pub text: SourceText,
}

pub fn parse_component(path: &str, source: &str) -> Result<SourceTree> {
    let input = StringInput::new(
        source,
        BytePos(BASE_POS),
        BytePos(BASE_POS + source.len() as u32),
    );
    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
        EsVersion::latest(),
        input,
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let module = parser.parse_module().map_err(|e| ExtractError::Parse {
        path: path.to_string(),
        message: format!("{:?}", e.into_kind()),
    })?;
    Ok(SourceTree {
        module,
        text: SourceText::new(source.to_string()),
    })
}

// -----------------------------------------------------------------------------
// Module-specifier path math
// -----------------------------------------------------------------------------

/// Source and destination paths of one extraction job.
#[derive(Debug, Clone)]
pub struct ModulePaths {
    pub source: PathBuf,
    pub generated: PathBuf,
}

impl ModulePaths {
    /// Specifier used by the rewritten original to import the accessor object.
    pub fn accessor_specifier(&self) -> String {
        specifier_between(&self.source, &self.generated)
    }

    /// Specifier used by the generated module to import back from the
    /// component file.
    pub fn component_specifier(&self) -> String {
        specifier_between(&self.generated, &self.source)
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn relative_from(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<_> = from_dir.components().collect();
    let to: Vec<_> = to.components().collect();
    let mut common = 0;
    while common < from.len() && common < to.len() && from[common] == to[common] {
        common += 1;
    }
    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for comp in &to[common..] {
        out.push(comp);
    }
    out
}

fn strip_script_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs") => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

/// Relative import specifier addressing `to_file` from `from_file`'s module.
pub fn specifier_between(from_file: &Path, to_file: &Path) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    let target = strip_script_extension(&lexical_normalize(to_file));
    let rel = relative_from(&lexical_normalize(from_dir), &target);
    let text = rel.to_string_lossy().replace('\\', "/");
    if text.starts_with("..") {
        text
    } else {
        format!("./{text}")
    }
}

/// Rebases a relative specifier found in the component file so it resolves
/// from the generated module's directory instead. Bare package specifiers
/// pass through unchanged.
pub fn rebase_specifier(spec: &str, source_file: &Path, generated_file: &Path) -> String {
    if !spec.starts_with('.') {
        return spec.to_string();
    }
    let source_dir = source_file.parent().unwrap_or_else(|| Path::new(""));
    let target = lexical_normalize(&source_dir.join(spec));
    let generated_dir = generated_file.parent().unwrap_or_else(|| Path::new(""));
    let rel = relative_from(&lexical_normalize(generated_dir), &target);
    let text = rel.to_string_lossy().replace('\\', "/");
    if text.starts_with("..") {
        text
    } else {
        format!("./{text}")
    }
}

/// Collapses an install-directory path onto its package specifier, e.g.
/// `../node_modules/pkg/dist/index.d.ts` -> `pkg/dist/index.d.ts`.
pub fn dependency_specifier(path_text: &str, dependency_dir: &str) -> Option<String> {
    let needle = format!("{dependency_dir}/");
    let idx = path_text.rfind(&needle)?;
    // Only accept a match at a path-segment boundary.
    if idx > 0 && !path_text[..idx].ends_with('/') {
        return None;
    }
    Some(path_text[idx + needle.len()..].to_string())
}
