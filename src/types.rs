use swc_core::common::Spanned;
use swc_core::ecma::ast::*;

use crate::bindings::{FileBindings, ImportedName, TypeDeclNode};
use crate::config::Recognition;
use crate::source::{dependency_specifier, rebase_specifier, ModulePaths, SourceText};

/// An import the generated module must carry for a type or value it
/// references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequirement {
    pub specifier: String,
    pub clause: ImportClause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportClause {
    /// Named specifier text, e.g. `Theme` or `Theme as LocalTheme`.
    Named(String),
    /// Default or namespace clause text, e.g. `React` or `* as Icons`.
    DefaultOrNamespace(String),
}

/// Textual type of one parameter: alternative renderings (union members),
/// optionality, and the imports those texts require.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    pub alternatives: Vec<String>,
    pub optional: bool,
    pub imports: Vec<ImportRequirement>,
}

impl TypeInfo {
    pub fn push_alternative(&mut self, text: String) {
        if !self.alternatives.contains(&text) {
            self.alternatives.push(text);
        }
    }

    pub fn push_import(&mut self, import: ImportRequirement) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    pub fn merge(&mut self, other: TypeInfo) {
        for alt in other.alternatives {
            self.push_alternative(alt);
        }
        self.optional |= other.optional;
        for import in other.imports {
            self.push_import(import);
        }
    }

    /// Field type text: alternatives joined by `|`, `any` when nothing was
    /// inferred.
    pub fn rendered(&self) -> String {
        if self.alternatives.is_empty() {
            "any".to_string()
        } else {
            self.alternatives.join(" | ")
        }
    }
}

/// Types that need no import in emitted code.
const BUILTIN_TYPES: &[&str] = &[
    "Array", "ReadonlyArray", "Record", "Partial", "Required", "Readonly",
    "Pick", "Omit", "Exclude", "Extract", "NonNullable", "Parameters",
    "ReturnType", "Promise", "Date", "RegExp", "Map", "Set", "Error",
    "Function", "Object", "String", "Number", "Boolean", "JSX",
];

pub struct TypeResolver<'a> {
    pub text: &'a SourceText,
    pub bindings: &'a FileBindings,
    pub paths: &'a ModulePaths,
    pub rec: &'a Recognition,
}

impl TypeResolver<'_> {
    pub fn resolve(&self, ty: &TsType) -> TypeInfo {
        let mut info = TypeInfo::default();
        self.resolve_into(ty, &mut info, 0);
        info
    }

    fn resolve_into(&self, ty: &TsType, info: &mut TypeInfo, depth: usize) {
        if depth > 16 {
            return;
        }
        match ty {
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(u)) => {
                for member in &u.types {
                    self.resolve_into(member, info, depth + 1);
                }
            }
            TsType::TsKeywordType(k) => {
                if k.kind == TsKeywordTypeKind::TsUndefinedKeyword {
                    info.optional = true;
                }
                info.push_alternative(self.text.slice(k.span).to_string());
            }
            TsType::TsParenthesizedType(p) => {
                self.resolve_into(&p.type_ann, info, depth + 1);
            }
            TsType::TsTypeRef(r) => {
                let mut local = TypeInfo::default();
                self.resolve_ref(r, &mut local, depth);
                info.merge(local);
            }
            other => {
                info.push_alternative(self.text.slice(other.span()).to_string());
            }
        }
    }

    fn resolve_ref(&self, r: &TsTypeRef, info: &mut TypeInfo, depth: usize) {
        let name_text = self.text.slice(r.type_name.span()).to_string();
        let base = entity_base(&r.type_name);

        match &r.type_params {
            Some(args) => {
                let rendered: Vec<String> = args
                    .params
                    .iter()
                    .map(|arg| {
                        let mut arg_info = TypeInfo::default();
                        self.resolve_into(arg, &mut arg_info, depth + 1);
                        for import in std::mem::take(&mut arg_info.imports) {
                            info.push_import(import);
                        }
                        arg_info.rendered()
                    })
                    .collect();
                info.push_alternative(format!("{}<{}>", name_text, rendered.join(", ")));
            }
            None => info.push_alternative(name_text),
        }

        if !BUILTIN_TYPES.contains(&base.as_str()) {
            if let Some(import) = self.import_for(&base) {
                info.push_import(import);
            }
        }
    }

    /// Import reconciliation for a referenced name: the file's own import
    /// table first (specifier reused, rebased for the generated module's
    /// directory, install-directory paths collapsed onto the package), then a
    /// same-file declaration reachable by a file-relative specifier.
    pub fn import_for(&self, name: &str) -> Option<ImportRequirement> {
        if let Some(binding) = self.bindings.imports.get(name) {
            let specifier = self.reconcile_specifier(&binding.source);
            let clause = match binding.imported {
                ImportedName::Named(_) => ImportClause::Named(binding.clause_text()),
                ImportedName::Default => {
                    ImportClause::DefaultOrNamespace(binding.local.clone())
                }
                ImportedName::Namespace => {
                    ImportClause::DefaultOrNamespace(format!("* as {}", binding.local))
                }
            };
            return Some(ImportRequirement { specifier, clause });
        }
        let declared_here = self.bindings.type_decls.contains_key(name)
            || self.bindings.context_decls.contains_key(name)
            || self.bindings.module_vars.contains_key(name);
        if declared_here {
            return Some(ImportRequirement {
                specifier: self.paths.component_specifier(),
                clause: ImportClause::Named(name.to_string()),
            });
        }
        None
    }

    fn reconcile_specifier(&self, source: &str) -> String {
        if let Some(pkg) = dependency_specifier(source, self.rec.dependency_dir) {
            return pkg;
        }
        rebase_specifier(source, &self.paths.source, &self.paths.generated)
    }

    /// Textual type of `object_ty[key]`, looking through inline type
    /// literals, same-file interfaces and aliases; imported object types fall
    /// back to an indexed-access type.
    pub fn member_type(&self, object_ty: &TsType, key: &str) -> Option<TypeInfo> {
        self.member_type_inner(object_ty, key, 0)
    }

    fn member_type_inner(&self, object_ty: &TsType, key: &str, depth: usize) -> Option<TypeInfo> {
        if depth > 8 {
            return None;
        }
        match object_ty {
            TsType::TsTypeLit(lit) => self.member_of_elements(&lit.members, key),
            TsType::TsParenthesizedType(p) => {
                self.member_type_inner(&p.type_ann, key, depth + 1)
            }
            TsType::TsUnionOrIntersectionType(u) => {
                let types = match u {
                    TsUnionOrIntersectionType::TsUnionType(u) => &u.types,
                    TsUnionOrIntersectionType::TsIntersectionType(i) => &i.types,
                };
                types
                    .iter()
                    .find_map(|t| self.member_type_inner(t, key, depth + 1))
            }
            TsType::TsTypeRef(r) => {
                let base = entity_base(&r.type_name);
                match self.bindings.type_decls.get(&base).map(|d| &d.node) {
                    Some(TypeDeclNode::Interface(decl)) => {
                        self.member_of_elements(&decl.body.body, key)
                    }
                    Some(TypeDeclNode::Alias(decl)) => {
                        self.member_type_inner(&decl.type_ann, key, depth + 1)
                    }
                    None => {
                        // Declared elsewhere; index into it textually.
                        let ref_text = self.text.slice(r.type_name.span());
                        let mut info = TypeInfo::default();
                        info.push_alternative(format!("{ref_text}[\"{key}\"]"));
                        if let Some(import) = self.import_for(&base) {
                            info.push_import(import);
                        }
                        Some(info)
                    }
                }
            }
            _ => None,
        }
    }

    fn member_of_elements(&self, members: &[TsTypeElement], key: &str) -> Option<TypeInfo> {
        for member in members {
            let TsTypeElement::TsPropertySignature(sig) = member else { continue };
            let matches = match &*sig.key {
                Expr::Ident(i) => i.sym.as_ref() == key,
                Expr::Lit(Lit::Str(s)) => s.value.as_ref() == key,
                _ => false,
            };
            if !matches {
                continue;
            }
            let mut info = sig
                .type_ann
                .as_ref()
                .map(|ann| self.resolve(&ann.type_ann))
                .unwrap_or_default();
            info.optional |= sig.optional;
            return Some(info);
        }
        None
    }
}

fn entity_base(name: &TsEntityName) -> String {
    match name {
        TsEntityName::Ident(i) => i.sym.to_string(),
        TsEntityName::TsQualifiedName(q) => entity_base(&q.left),
    }
}
