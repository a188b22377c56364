use swc_core::common::Span;
use swc_core::ecma::ast::*;

use crate::bindings;
use crate::config::Recognition;
use crate::error::Result;
use crate::manip::{ManipulationQueue, TextEdit};
use crate::source::parse_component;

/// Reparses a rewritten component and drops import bindings nothing outside
/// an import statement references. Dead statements disappear whole; partially
/// dead ones are regenerated with their surviving specifiers. Bare
/// side-effect imports always stay.
pub fn prune_unused_imports(path: &str, source: &str, rec: &Recognition) -> Result<String> {
    let tree = parse_component(path, source)?;
    let collected = bindings::collect(&tree.module, rec);

    let imports: Vec<&ImportDecl> = tree
        .module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some(decl),
            _ => None,
        })
        .collect();
    let import_spans: Vec<Span> = imports.iter().map(|d| d.span).collect();

    let mut queue = ManipulationQueue::default();
    for decl in &imports {
        if decl.specifiers.is_empty() {
            continue;
        }
        let used: Vec<&ImportSpecifier> = decl
            .specifiers
            .iter()
            .filter(|spec| {
                collected
                    .refs
                    .any_outside(specifier_local(spec), &import_spans)
            })
            .collect();
        if used.len() == decl.specifiers.len() {
            continue;
        }
        if used.is_empty() {
            queue.edit(TextEdit::remove(Span::new(
                tree.text.extend_back_over_whitespace(decl.span.lo),
                decl.span.hi,
            )));
            continue;
        }
        queue.edit(TextEdit {
            lo: decl.span.lo,
            hi: decl.span.hi,
            text: render_import(decl, &used),
        });
    }

    Ok(queue.run_after(&tree.text))
}

fn specifier_local(spec: &ImportSpecifier) -> &str {
    match spec {
        ImportSpecifier::Named(s) => s.local.sym.as_ref(),
        ImportSpecifier::Default(s) => s.local.sym.as_ref(),
        ImportSpecifier::Namespace(s) => s.local.sym.as_ref(),
    }
}

fn render_import(decl: &ImportDecl, used: &[&ImportSpecifier]) -> String {
    let mut head: Vec<String> = vec![];
    let mut named: Vec<String> = vec![];
    for spec in used {
        match spec {
            ImportSpecifier::Default(s) => head.push(s.local.sym.to_string()),
            ImportSpecifier::Namespace(s) => head.push(format!("* as {}", s.local.sym)),
            ImportSpecifier::Named(s) => {
                let local = s.local.sym.to_string();
                match &s.imported {
                    Some(ModuleExportName::Ident(orig)) if orig.sym != s.local.sym => {
                        named.push(format!("{} as {}", orig.sym, local))
                    }
                    Some(ModuleExportName::Str(orig)) => {
                        named.push(format!("\"{}\" as {}", orig.value, local))
                    }
                    _ => named.push(local),
                }
            }
        }
    }
    let mut clause = head.join(", ");
    if !named.is_empty() {
        if !clause.is_empty() {
            clause.push_str(", ");
        }
        clause.push_str(&format!("{{ {} }}", named.join(", ")));
    }
    let type_kw = if decl.type_only { "type " } else { "" };
    format!("import {}{} from \"{}\";", type_kw, clause, decl.src.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Recognition;

    fn prune(src: &str) -> String {
        prune_unused_imports("test.tsx", src, &Recognition::default_set()).unwrap()
    }

    #[test]
    fn dead_import_statement_is_removed() {
        let out = prune("import cx from \"classnames\";\nconst a = 1;\n");
        assert_eq!(out, "\nconst a = 1;\n");
    }

    #[test]
    fn partially_dead_import_keeps_surviving_specifiers() {
        let out = prune(
            "import { useContext, useState } from \"react\";\nconst s = useState;\n",
        );
        assert_eq!(
            out,
            "import { useState } from \"react\";\nconst s = useState;\n"
        );
    }

    #[test]
    fn default_survives_with_dead_named() {
        let out = prune(
            "import React, { useContext } from \"react\";\nexport default React;\n",
        );
        assert_eq!(out, "import React from \"react\";\nexport default React;\n");
    }

    #[test]
    fn side_effect_imports_are_kept() {
        let out = prune("import \"./styles.css\";\nconst a = 1;\n");
        assert_eq!(out, "import \"./styles.css\";\nconst a = 1;\n");
    }

    #[test]
    fn aliased_named_specifier_renders_alias() {
        let out = prune(
            "import { useContext as uc, useState } from \"react\";\nconst s = uc;\n",
        );
        assert_eq!(out, "import { useContext as uc } from \"react\";\nconst s = uc;\n");
    }
}
