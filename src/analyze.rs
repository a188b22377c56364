use std::collections::HashSet;

use swc_core::common::Span;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::bindings::FileBindings;
use crate::config::Recognition;
use crate::error::{ExtractError, Result};
use crate::groups::{Parameter, StyleSheetBuilder};
use crate::manip::{CaptureProperty, ManipulationQueue, TextEdit};
use crate::roots::RootInfo;
use crate::scan::{AttrValue, MarkupElement, ScannedAttr};
use crate::source::SourceText;
use crate::types::{ImportClause, ImportRequirement, TypeInfo, TypeResolver};

/// A module-scope declaration slated to move into the generated module.
#[derive(Debug, Clone)]
pub struct VariableHoist {
    pub name: String,
    pub exported: bool,
}

/// Everything the analyzer accumulates for one file, consumed by the
/// generator.
#[derive(Default)]
pub struct FilePlan {
    pub sheet: StyleSheetBuilder,
    pub queue: ManipulationQueue,
    pub hoists: Vec<VariableHoist>,
    pub module_imports: Vec<ImportRequirement>,
    pub back_imports: Vec<String>,
    pub skipped: Vec<ExtractError>,
}

impl FilePlan {
    /// Export decisions accumulate across usage sites: once any site observes
    /// an external reference, the hoist stays exported.
    pub fn add_hoist(&mut self, name: &str, exported: bool) {
        if let Some(existing) = self.hoists.iter_mut().find(|h| h.name == name) {
            existing.exported |= exported;
            return;
        }
        self.hoists.push(VariableHoist {
            name: name.to_string(),
            exported,
        });
    }

    pub fn add_module_import(&mut self, import: ImportRequirement) {
        if !self.module_imports.contains(&import) {
            self.module_imports.push(import);
        }
    }

    pub fn add_back_import(&mut self, name: &str) {
        if !self.back_imports.iter().any(|n| n == name) {
            self.back_imports.push(name.to_string());
        }
    }
}

// -----------------------------------------------------------------------------
// Root parameter table
// -----------------------------------------------------------------------------

enum ParamEntry {
    /// `{ size }` or `{ size: local }` in an object pattern.
    Destructured {
        local: String,
        original_key: String,
        annotation: Option<Box<TsType>>,
    },
    /// `...rest` in an object pattern, typed `Omit<Base, siblings>`.
    Rest {
        local: String,
        annotation: Option<Box<TsType>>,
        sibling_keys: Vec<String>,
    },
    /// A plain identifier parameter, usually the props object.
    Plain {
        name: String,
        annotation: Option<Box<TsType>>,
    },
}

struct ParamTable {
    entries: Vec<ParamEntry>,
}

impl ParamTable {
    fn build(root: &RootInfo) -> Self {
        let mut entries = vec![];
        for pat in &root.params {
            match pat {
                Pat::Ident(b) => entries.push(ParamEntry::Plain {
                    name: b.id.sym.to_string(),
                    annotation: b.type_ann.as_ref().map(|a| a.type_ann.clone()),
                }),
                Pat::Object(obj) => {
                    let annotation = obj.type_ann.as_ref().map(|a| a.type_ann.clone());
                    let mut explicit_keys = vec![];
                    for prop in &obj.props {
                        match prop {
                            ObjectPatProp::Assign(assign) => {
                                let key = assign.key.id.sym.to_string();
                                explicit_keys.push(key.clone());
                                entries.push(ParamEntry::Destructured {
                                    local: key.clone(),
                                    original_key: key,
                                    annotation: annotation.clone(),
                                });
                            }
                            ObjectPatProp::KeyValue(kv) => {
                                let Some(key) = pat_prop_key(&kv.key) else { continue };
                                explicit_keys.push(key.clone());
                                if let Some(local) = kv.value.as_ident() {
                                    entries.push(ParamEntry::Destructured {
                                        local: local.id.sym.to_string(),
                                        original_key: key,
                                        annotation: annotation.clone(),
                                    });
                                }
                            }
                            ObjectPatProp::Rest(rest) => {
                                if let Some(local) = rest.arg.as_ident() {
                                    entries.push(ParamEntry::Rest {
                                        local: local.id.sym.to_string(),
                                        annotation: annotation.clone(),
                                        sibling_keys: vec![], // filled below
                                    });
                                }
                            }
                        }
                    }
                    // Rest entries see every explicitly destructured sibling.
                    for entry in &mut entries {
                        if let ParamEntry::Rest { sibling_keys, .. } = entry {
                            if sibling_keys.is_empty() {
                                *sibling_keys = explicit_keys.clone();
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Self { entries }
    }

    fn destructured(&self, name: &str) -> Option<&ParamEntry> {
        self.entries.iter().find(|e| match e {
            ParamEntry::Destructured { local, .. } => local == name,
            ParamEntry::Rest { local, .. } => local == name,
            ParamEntry::Plain { name: n, .. } => n == name,
        })
    }

    fn plain(&self, name: &str) -> Option<&ParamEntry> {
        self.entries.iter().find(
            |e| matches!(e, ParamEntry::Plain { name: n, .. } if n == name),
        )
    }
}

fn pat_prop_key(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(i) => Some(i.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

// -----------------------------------------------------------------------------
// Expression reference collection
// -----------------------------------------------------------------------------

struct MemberRef {
    obj: String,
    obj_span: Span,
    prop: String,
    span: Span,
}

#[derive(Default)]
struct ExprRefs {
    idents: Vec<(String, Span)>,
    members: Vec<MemberRef>,
}

struct ExprRefCollector {
    out: ExprRefs,
}

impl Visit for ExprRefCollector {
    fn visit_ident(&mut self, n: &Ident) {
        self.out.idents.push((n.sym.to_string(), n.span));
    }

    fn visit_member_expr(&mut self, m: &MemberExpr) {
        if let (Expr::Ident(obj), MemberProp::Ident(prop)) = (&*m.obj, &m.prop) {
            self.out.members.push(MemberRef {
                obj: obj.sym.to_string(),
                obj_span: obj.span,
                prop: prop.sym.to_string(),
                span: m.span,
            });
            return;
        }
        m.visit_children_with(self);
    }
}

fn collect_expr_refs(expr: &Expr) -> ExprRefs {
    let mut collector = ExprRefCollector {
        out: ExprRefs::default(),
    };
    expr.visit_with(&mut collector);
    collector.out
}

// -----------------------------------------------------------------------------
// Analyzer
// -----------------------------------------------------------------------------

pub struct Analyzer<'a> {
    pub text: &'a SourceText,
    pub bindings: &'a FileBindings,
    pub rec: &'a Recognition,
    pub resolver: TypeResolver<'a>,
}

impl Analyzer<'_> {
    /// Classifies every identifier referenced by one presentation attribute
    /// and queues the resulting manipulations. Nothing is mutated here.
    pub fn analyze_attribute(
        &self,
        elem: &MarkupElement,
        attr: &ScannedAttr,
        func_idx: usize,
        group_idx: usize,
        plan: &mut FilePlan,
    ) -> Result<()> {
        let Some(root) = elem.root.clone() else { return Ok(()) };
        // Removal is destructive and runs after generation.
        let removal = Span::new(
            self.text.extend_back_over_whitespace(attr.span.lo),
            attr.span.hi,
        );
        plan.queue.edit(TextEdit::remove(removal));

        match &attr.value {
            AttrValue::Str(span) => {
                plan.queue.capture(CaptureProperty {
                    function: func_idx,
                    group: group_idx,
                    attribute: attr.name.clone(),
                    value_span: *span,
                    strip_container: false,
                    rewrites: vec![],
                });
            }
            AttrValue::Expr {
                container_span,
                expr,
            } => {
                let rewrites = self.classify_expression(
                    &root,
                    expr,
                    *container_span,
                    func_idx,
                    plan,
                )?;
                plan.queue.capture(CaptureProperty {
                    function: func_idx,
                    group: group_idx,
                    attribute: attr.name.clone(),
                    value_span: *container_span,
                    strip_container: true,
                    rewrites,
                });
            }
        }
        Ok(())
    }

    fn classify_expression(
        &self,
        root: &RootInfo,
        expr: &Expr,
        attr_span: Span,
        func_idx: usize,
        plan: &mut FilePlan,
    ) -> Result<Vec<(Span, String)>> {
        let params = ParamTable::build(root);
        let refs = collect_expr_refs(expr);

        let mut rewrites: Vec<(Span, String)> = vec![];
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending_idents: Vec<(String, Span)> = vec![];

        // Member accesses through a plain object parameter become
        // parameters of their own, rewritten to the bare member name.
        for member in &refs.members {
            match params.plain(&member.obj) {
                Some(ParamEntry::Plain { annotation, .. }) => {
                    let type_info = annotation
                        .as_ref()
                        .and_then(|t| self.resolver.member_type(t, &member.prop));
                    plan.sheet.function(func_idx).add_parameter(Parameter {
                        source_name: member.prop.clone(),
                        destination_name: Some(format!("{}.{}", member.obj, member.prop)),
                        type_info,
                    });
                    rewrites.push((member.span, member.prop.clone()));
                }
                _ => pending_idents.push((member.obj.clone(), member.obj_span)),
            }
        }
        pending_idents.extend(refs.idents.iter().cloned());

        for (name, _span) in pending_idents {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(entry) = params.destructured(&name) {
                let param = self.parameter_from_entry(entry, &name);
                plan.sheet.function(func_idx).add_parameter(param);
                continue;
            }
            if let Some(local) = self.bindings.context_locals.get(&name) {
                let type_info = self.context_value_type(&local.context);
                plan.sheet.function(func_idx).add_parameter(Parameter {
                    source_name: name.clone(),
                    destination_name: None,
                    type_info,
                });
                continue;
            }
            if self.bindings.imports.contains_key(&name) {
                if let Some(import) = self.resolver.import_for(&name) {
                    plan.add_module_import(import);
                }
                continue;
            }
            if self.bindings.module_vars.contains_key(&name) {
                self.classify_module_var(&name, attr_span, 0, &mut seen, plan);
                continue;
            }
            // Unresolved names (globals, JSX intrinsics) contribute nothing.
        }

        Ok(rewrites)
    }

    fn parameter_from_entry(&self, entry: &ParamEntry, name: &str) -> Parameter {
        let type_info = match entry {
            ParamEntry::Destructured {
                original_key,
                annotation,
                ..
            } => annotation
                .as_ref()
                .and_then(|t| self.resolver.member_type(t, original_key)),
            ParamEntry::Rest {
                annotation,
                sibling_keys,
                ..
            } => annotation.as_ref().map(|t| {
                let base = self.resolver.resolve(t);
                let keys = sibling_keys
                    .iter()
                    .filter(|k| k.as_str() != name)
                    .map(|k| format!("\"{k}\""))
                    .collect::<Vec<_>>()
                    .join(" | ");
                let mut info = TypeInfo {
                    alternatives: vec![],
                    optional: base.optional,
                    imports: base.imports.clone(),
                };
                if keys.is_empty() {
                    info.push_alternative(base.rendered());
                } else {
                    info.push_alternative(format!("Omit<{}, {}>", base.rendered(), keys));
                }
                info
            }),
            ParamEntry::Plain { annotation, .. } => {
                annotation.as_ref().map(|t| self.resolver.resolve(t))
            }
        };
        Parameter {
            source_name: name.to_string(),
            destination_name: None,
            type_info,
        }
    }

    /// Type of a context-derived value: the in-file `createContext<T>` type
    /// argument, else `ContextType<typeof Ctx>` plus the imports that makes
    /// that render valid.
    fn context_value_type(&self, context: &str) -> Option<TypeInfo> {
        if let Some(decl) = self.bindings.context_decls.get(context) {
            if let Some(value_type) = &decl.value_type {
                return Some(self.resolver.resolve(value_type));
            }
        }
        let mut info = TypeInfo::default();
        info.push_alternative(format!("ContextType<typeof {context}>"));
        info.push_import(ImportRequirement {
            specifier: self.rec.framework_module.to_string(),
            clause: ImportClause::Named("ContextType".to_string()),
        });
        if let Some(import) = self.resolver.import_for(context) {
            info.push_import(import);
        }
        Some(info)
    }

    /// Module-scope variable referenced by an attribute: hoist it, decide
    /// the export tag from references outside its declaration and the
    /// current attribute subtree, and chase call-initializer arguments one
    /// level deep.
    fn classify_module_var(
        &self,
        name: &str,
        attr_span: Span,
        depth: usize,
        seen: &mut HashSet<String>,
        plan: &mut FilePlan,
    ) {
        let Some(var) = self.bindings.module_vars.get(name) else { return };

        if var.source_exported {
            // Other files may import this; leave it in place and import it
            // into the generated module instead.
            if let Some(import) = self.resolver.import_for(name) {
                plan.add_module_import(import);
            }
            return;
        }

        let exported = self
            .bindings
            .refs
            .any_outside(name, &[var.stmt_span, attr_span]);
        plan.add_hoist(name, exported);
        if exported {
            plan.add_back_import(name);
        }

        if depth > 0 {
            return;
        }
        let Some(init) = &var.init else { return };
        let Some(call) = init.as_call() else { return };
        // The callee and every argument must stay resolvable next to the
        // hoisted declaration.
        let callee_ident = match &call.callee {
            Callee::Expr(e) => e.as_ident(),
            _ => None,
        };
        if let Some(callee) = callee_ident {
            let callee = callee.sym.to_string();
            if seen.insert(callee.clone()) {
                if self.bindings.imports.contains_key(&callee) {
                    if let Some(import) = self.resolver.import_for(&callee) {
                        plan.add_module_import(import);
                    }
                } else if self.bindings.module_vars.contains_key(&callee) {
                    self.classify_module_var(&callee, attr_span, depth + 1, seen, plan);
                }
            }
        }
        for arg in &call.args {
            let refs = collect_expr_refs(&arg.expr);
            for (arg_name, _) in refs
                .idents
                .iter()
                .cloned()
                .chain(refs.members.iter().map(|m| (m.obj.clone(), m.obj_span)))
            {
                if !seen.insert(arg_name.clone()) {
                    continue;
                }
                if self.bindings.imports.contains_key(&arg_name) {
                    if let Some(import) = self.resolver.import_for(&arg_name) {
                        plan.add_module_import(import);
                    }
                } else if self.bindings.module_vars.contains_key(&arg_name) {
                    self.classify_module_var(&arg_name, attr_span, depth + 1, seen, plan);
                }
            }
        }
    }

    /// Cross-references collected parameter names against declared variant
    /// keys and refines matching parameters to the helper's variant-type
    /// utility.
    pub fn refine_variant_parameters(&self, plan: &mut FilePlan) {
        for def in &self.bindings.variant_defs {
            let Some(helper) = self.rec.variant_helper(&def.helper) else { continue };
            let mut matched = false;
            for func in &mut plan.sheet.functions {
                for key in &def.keys {
                    let Some(param) = func.parameter_mut(key) else { continue };
                    let mut info = TypeInfo::default();
                    info.push_alternative(format!(
                        "{}<typeof {}>[\"{}\"]",
                        helper.utility, def.name, key
                    ));
                    info.optional = true;
                    info.push_import(ImportRequirement {
                        specifier: helper.utility_module.to_string(),
                        clause: ImportClause::Named(helper.utility.to_string()),
                    });
                    param.type_info = Some(info);
                    matched = true;
                }
            }
            if !matched {
                continue;
            }
            // The `typeof` reference must resolve inside the generated
            // module: hoist or import the helper definition itself.
            if self.bindings.imports.contains_key(&def.name) {
                if let Some(import) = self.resolver.import_for(&def.name) {
                    plan.add_module_import(import);
                }
            } else if plan.hoists.iter().all(|h| h.name != def.name) {
                if let Some(var) = self.bindings.module_vars.get(&def.name) {
                    let mut seen = HashSet::new();
                    self.classify_module_var(&def.name, var.stmt_span, 1, &mut seen, plan);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::collect;
    use crate::config::Recognition;
    use crate::scan::scan;
    use crate::source::{parse_component, ModulePaths};
    use crate::types::{ImportClause, TypeResolver};

    fn plan_for(src: &str) -> FilePlan {
        let tree = parse_component("src/card.tsx", src).unwrap();
        let rec = Recognition::default_set();
        let bindings = collect(&tree.module, &rec);
        let paths = ModulePaths {
            source: "src/card.tsx".into(),
            generated: "src/card.styles.ts".into(),
        };
        let elements = scan(&tree, &rec);
        let analyzer = Analyzer {
            text: &tree.text,
            bindings: &bindings,
            rec: &rec,
            resolver: TypeResolver {
                text: &tree.text,
                bindings: &bindings,
                paths: &paths,
                rec: &rec,
            },
        };
        let mut plan = FilePlan::default();
        for (id, elem) in elements.iter().enumerate() {
            let Some(root) = &elem.root else { continue };
            let f = plan.sheet.get_or_create_function(
                &root.name,
                false,
                root,
                rec.keyword_suffix,
            );
            for attr in &elem.attrs {
                let g = plan
                    .sheet
                    .function(f)
                    .get_or_create_group(&elem.label, id, elem.name_end);
                analyzer.analyze_attribute(elem, attr, f, g, &mut plan).unwrap();
            }
        }
        analyzer.refine_variant_parameters(&mut plan);
        plan
    }

    #[test]
    fn destructured_param_becomes_typed_parameter() {
        let plan = plan_for(
            "function Card({ size }: { size?: string }) {\n  return <div className={size} />;\n}\n",
        );
        let func = &plan.sheet.functions[0];
        assert_eq!(func.parameters.len(), 1);
        let p = &func.parameters[0];
        assert_eq!(p.source_name, "size");
        assert!(p.destination_name.is_none());
        let info = p.type_info.as_ref().unwrap();
        assert!(info.optional);
        assert_eq!(info.rendered(), "string");
    }

    #[test]
    fn member_access_on_plain_param_rewrites_to_bare_name() {
        let plan = plan_for(
            "function Card(props: { size: string }) {\n  return <div className={cx(props.size)} />;\n}\n",
        );
        let func = &plan.sheet.functions[0];
        let p = &func.parameters[0];
        assert_eq!(p.source_name, "size");
        assert_eq!(p.destination_name.as_deref(), Some("props.size"));
        assert_eq!(p.call_argument(), "size: props.size");
    }

    #[test]
    fn rest_param_types_as_omit_of_base() {
        let plan = plan_for(
            "interface CardProps { size: string; tone: string; }\n\
             function Card({ size, ...rest }: CardProps) {\n  return <div className={cx(size, rest)} />;\n}\n",
        );
        let func = &plan.sheet.functions[0];
        let rest = func
            .parameters
            .iter()
            .find(|p| p.source_name == "rest")
            .unwrap();
        assert_eq!(
            rest.type_info.as_ref().unwrap().rendered(),
            "Omit<CardProps, \"size\">"
        );
    }

    #[test]
    fn imported_helper_becomes_module_import() {
        let plan = plan_for(
            "import cx from \"classnames\";\n\
             function Card() { return <div className={cx(\"a\")} />; }\n",
        );
        assert_eq!(plan.module_imports.len(), 1);
        assert_eq!(plan.module_imports[0].specifier, "classnames");
        assert_eq!(
            plan.module_imports[0].clause,
            ImportClause::DefaultOrNamespace("cx".into())
        );
        assert!(plan.hoists.is_empty());
    }

    #[test]
    fn hoist_export_decision_accumulates_across_attributes() {
        // `tones` is only referenced from attributes: not exported.
        // `pad` is also read by the body statement below: exported, and
        // imported back into the source file.
        let plan = plan_for(
            "const tones = \"t\";\nconst pad = \"p\";\n\
             function Card() {\n  const copy = pad;\n  return <div className={tones} style={pad} data-x={copy} />;\n}\n",
        );
        let tones = plan.hoists.iter().find(|h| h.name == "tones").unwrap();
        let pad = plan.hoists.iter().find(|h| h.name == "pad").unwrap();
        assert!(!tones.exported);
        assert!(pad.exported);
        assert_eq!(plan.back_imports, vec!["pad".to_string()]);
    }

    #[test]
    fn source_exported_vars_are_imported_not_hoisted() {
        let plan = plan_for(
            "export const brand = \"b\";\n\
             function Card() { return <div className={brand} />; }\n",
        );
        assert!(plan.hoists.is_empty());
        assert_eq!(plan.module_imports.len(), 1);
        assert_eq!(
            plan.module_imports[0].clause,
            ImportClause::Named("brand".into())
        );
    }

    #[test]
    fn call_initializer_arguments_are_chased_one_level() {
        let plan = plan_for(
            "import { tokens } from \"./tokens\";\n\
             const base = \"b\";\n\
             const merged = mix(base, tokens);\n\
             function Card() { return <div className={merged} />; }\n",
        );
        assert!(plan.hoists.iter().any(|h| h.name == "merged"));
        assert!(plan.hoists.iter().any(|h| h.name == "base"));
        assert!(plan
            .module_imports
            .iter()
            .any(|i| i.specifier == "./tokens"));
    }

    #[test]
    fn variant_keys_refine_matching_parameters() {
        let plan = plan_for(
            "import { tv } from \"tailwind-variants\";\n\
             const button = tv({ variants: { size: { sm: \"s\" } } });\n\
             function Card({ size }: { size: string }) {\n  return <div className={button({ size })} />;\n}\n",
        );
        let func = &plan.sheet.functions[0];
        let size = func
            .parameters
            .iter()
            .find(|p| p.source_name == "size")
            .unwrap();
        let info = size.type_info.as_ref().unwrap();
        assert!(info.optional);
        assert_eq!(info.rendered(), "VariantProps<typeof button>[\"size\"]");
        assert_eq!(
            info.imports[0].specifier,
            "tailwind-variants"
        );
        assert!(plan.hoists.iter().any(|h| h.name == "button"));
    }

    #[test]
    fn context_local_types_from_create_context_argument() {
        let plan = plan_for(
            "import { createContext, useContext } from \"react\";\n\
             const ThemeContext = createContext<\"light\" | \"dark\">(\"light\");\n\
             function Card() {\n  const theme = useContext(ThemeContext);\n  return <div className={theme} />;\n}\n",
        );
        let func = &plan.sheet.functions[0];
        let theme = &func.parameters[0];
        assert_eq!(theme.source_name, "theme");
        assert_eq!(
            theme.type_info.as_ref().unwrap().rendered(),
            "\"light\" | \"dark\""
        );
    }
}
