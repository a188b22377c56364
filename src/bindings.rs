use std::collections::HashMap;

use swc_core::common::{BytePos, Span};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::config::Recognition;

// -----------------------------------------------------------------------------
// Binding records
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

#[derive(Debug, Clone)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
    pub source: String,
    pub stmt_span: Span,
    pub type_only: bool,
}

impl ImportBinding {
    /// Clause text as it appears in an import statement.
    pub fn clause_text(&self) -> String {
        match &self.imported {
            ImportedName::Named(orig) if *orig != self.local => {
                format!("{} as {}", orig, self.local)
            }
            ImportedName::Named(_) => self.local.clone(),
            ImportedName::Default => self.local.clone(),
            ImportedName::Namespace => format!("* as {}", self.local),
        }
    }
}

/// A `var`/`let`/`const` declared at module scope.
#[derive(Debug, Clone)]
pub struct ModuleVar {
    pub name: String,
    pub kind: VarDeclKind,
    pub declarator_span: Span,
    pub stmt_span: Span,
    pub init: Option<Box<Expr>>,
    pub definite: bool,
    pub source_exported: bool,
    pub siblings: usize,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub enum TypeDeclNode {
    Interface(Box<TsInterfaceDecl>),
    Alias(Box<TsTypeAliasDecl>),
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub node: TypeDeclNode,
    pub source_exported: bool,
}

/// `const Ctx = createContext<T>(...)` at module scope.
#[derive(Debug, Clone)]
pub struct ContextDecl {
    pub name: String,
    pub value_type: Option<Box<TsType>>,
}

/// `const theme = useContext(ThemeContext)` inside some function.
#[derive(Debug, Clone)]
pub struct ContextLocal {
    pub local: String,
    pub context: String,
}

/// `const button = tv({ variants: { size: {...} } })`.
#[derive(Debug, Clone)]
pub struct VariantDef {
    pub name: String,
    pub helper: String,
    pub keys: Vec<String>,
}

// -----------------------------------------------------------------------------
// Reference index
// -----------------------------------------------------------------------------

/// Every identifier occurrence in the file, by name. Built once; consumers
/// exclude regions (declaring statement, attribute subtree, import statement)
/// by span containment.
#[derive(Debug, Default)]
pub struct RefIndex {
    by_name: HashMap<String, Vec<Span>>,
}

impl RefIndex {
    pub fn spans(&self, name: &str) -> &[Span] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any occurrence of `name` lies outside every excluded span.
    pub fn any_outside(&self, name: &str, excluded: &[Span]) -> bool {
        self.spans(name).iter().any(|s| {
            !excluded
                .iter()
                .any(|ex| ex.lo <= s.lo && s.hi <= ex.hi)
        })
    }
}

struct RefCollector<'a> {
    out: &'a mut RefIndex,
}

impl Visit for RefCollector<'_> {
    fn visit_ident(&mut self, n: &Ident) {
        self.out
            .by_name
            .entry(n.sym.to_string())
            .or_default()
            .push(n.span);
    }
}

// -----------------------------------------------------------------------------
// File bindings
// -----------------------------------------------------------------------------

#[derive(Default)]
pub struct FileBindings {
    pub imports: HashMap<String, ImportBinding>,
    pub module_vars: HashMap<String, ModuleVar>,
    pub type_decls: HashMap<String, TypeDecl>,
    pub context_decls: HashMap<String, ContextDecl>,
    pub context_locals: HashMap<String, ContextLocal>,
    pub variant_defs: Vec<VariantDef>,
    pub refs: RefIndex,
    /// End of the last import statement; insertion point for the accessor
    /// import.
    pub last_import_end: Option<BytePos>,
}

pub fn collect(module: &Module, rec: &Recognition) -> FileBindings {
    let mut out = FileBindings::default();

    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => {
                collect_import(decl, &mut out);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                collect_decl(&export.decl, export.span, true, rec, &mut out);
            }
            ModuleItem::Stmt(Stmt::Decl(decl)) => {
                collect_decl(decl, decl_span(decl), false, rec, &mut out);
            }
            _ => {}
        }
    }

    let mut refs = RefCollector { out: &mut out.refs };
    module.visit_with(&mut refs);

    let mut locals = ContextLocalCollector {
        rec,
        imports: &out.imports,
        out: &mut out.context_locals,
    };
    module.visit_with(&mut locals);

    out
}

fn decl_span(decl: &Decl) -> Span {
    match decl {
        Decl::Var(v) => v.span,
        Decl::Fn(f) => f.function.span,
        Decl::Class(c) => c.class.span,
        Decl::TsInterface(i) => i.span,
        Decl::TsTypeAlias(a) => a.span,
        Decl::TsEnum(e) => e.span,
        Decl::TsModule(m) => m.span,
        Decl::Using(u) => u.span,
    }
}

fn collect_import(decl: &ImportDecl, out: &mut FileBindings) {
    out.last_import_end = Some(
        out.last_import_end
            .map_or(decl.span.hi, |prev| prev.max(decl.span.hi)),
    );
    for spec in &decl.specifiers {
        let (local, imported) = match spec {
            ImportSpecifier::Named(named) => {
                let orig = named
                    .imported
                    .as_ref()
                    .map(|i| match i {
                        ModuleExportName::Ident(i) => i.sym.to_string(),
                        ModuleExportName::Str(s) => s.value.to_string(),
                    })
                    .unwrap_or_else(|| named.local.sym.to_string());
                (named.local.sym.to_string(), ImportedName::Named(orig))
            }
            ImportSpecifier::Default(def) => {
                (def.local.sym.to_string(), ImportedName::Default)
            }
            ImportSpecifier::Namespace(ns) => {
                (ns.local.sym.to_string(), ImportedName::Namespace)
            }
        };
        out.imports.insert(
            local.clone(),
            ImportBinding {
                local,
                imported,
                source: decl.src.value.to_string(),
                stmt_span: decl.span,
                type_only: decl.type_only,
            },
        );
    }
}

fn collect_decl(
    decl: &Decl,
    stmt_span: Span,
    exported: bool,
    rec: &Recognition,
    out: &mut FileBindings,
) {
    match decl {
        Decl::Var(var) => {
            let siblings = var.decls.len();
            for (index, d) in var.decls.iter().enumerate() {
                let Some(name) = d.name.as_ident() else { continue };
                let name = name.id.sym.to_string();

                if let Some(init) = &d.init {
                    if let Some(call) = init.as_call() {
                        if let Some(callee) = callee_ident(call) {
                            if callee == rec.context_factory {
                                out.context_decls.insert(
                                    name.clone(),
                                    ContextDecl {
                                        name: name.clone(),
                                        value_type: call
                                            .type_args
                                            .as_ref()
                                            .and_then(|a| a.params.first().cloned()),
                                    },
                                );
                            }
                            if rec.variant_helper(&callee).is_some() {
                                out.variant_defs.push(VariantDef {
                                    name: name.clone(),
                                    helper: callee.to_string(),
                                    keys: variant_keys(call),
                                });
                            }
                        }
                    }
                }

                out.module_vars.insert(
                    name.clone(),
                    ModuleVar {
                        name,
                        kind: var.kind,
                        declarator_span: d.span,
                        stmt_span,
                        init: d.init.clone(),
                        definite: d.definite,
                        source_exported: exported,
                        siblings,
                        index,
                    },
                );
            }
        }
        Decl::TsInterface(i) => {
            out.type_decls.insert(
                i.id.sym.to_string(),
                TypeDecl {
                    name: i.id.sym.to_string(),
                    node: TypeDeclNode::Interface(i.clone()),
                    source_exported: exported,
                },
            );
        }
        Decl::TsTypeAlias(a) => {
            out.type_decls.insert(
                a.id.sym.to_string(),
                TypeDecl {
                    name: a.id.sym.to_string(),
                    node: TypeDeclNode::Alias(a.clone()),
                    source_exported: exported,
                },
            );
        }
        _ => {}
    }
}

fn callee_ident(call: &CallExpr) -> Option<String> {
    match &call.callee {
        Callee::Expr(e) => e.as_ident().map(|i| i.sym.to_string()),
        _ => None,
    }
}

/// Declared variant keys: the property names under `variants` in the helper's
/// first object argument.
fn variant_keys(call: &CallExpr) -> Vec<String> {
    let Some(first) = call.args.first() else { return vec![] };
    let Some(obj) = first.expr.as_object() else { return vec![] };
    for prop in &obj.props {
        let PropOrSpread::Prop(p) = prop else { continue };
        let Prop::KeyValue(kv) = &**p else { continue };
        if prop_name(&kv.key).as_deref() != Some("variants") {
            continue;
        }
        if let Some(variants) = kv.value.as_object() {
            return variants
                .props
                .iter()
                .filter_map(|p| match p {
                    PropOrSpread::Prop(p) => match &**p {
                        Prop::KeyValue(kv) => prop_name(&kv.key),
                        Prop::Shorthand(i) => Some(i.sym.to_string()),
                        _ => None,
                    },
                    _ => None,
                })
                .collect();
        }
    }
    vec![]
}

fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(i) => Some(i.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

struct ContextLocalCollector<'a> {
    rec: &'a Recognition,
    imports: &'a HashMap<String, ImportBinding>,
    out: &'a mut HashMap<String, ContextLocal>,
}

impl Visit for ContextLocalCollector<'_> {
    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        if let (Some(name), Some(init)) = (d.name.as_ident(), d.init.as_deref()) {
            if let Some(call) = init.as_call() {
                if let Some(callee) = callee_ident(call) {
                    let recognized = self.rec.context_accessor(&callee).is_some_and(|acc| {
                        self.imports
                            .get(&callee)
                            .is_some_and(|im| im.source == acc.module)
                    });
                    if recognized {
                        if let Some(ctx) = call.args.first().and_then(|a| a.expr.as_ident()) {
                            self.out.insert(
                                name.id.sym.to_string(),
                                ContextLocal {
                                    local: name.id.sym.to_string(),
                                    context: ctx.sym.to_string(),
                                },
                            );
                        }
                    }
                }
            }
        }
        d.visit_children_with(self);
    }
}
