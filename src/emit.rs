use std::collections::HashMap;

use swc_core::common::{BytePos, Span};
use swc_core::ecma::ast::VarDeclKind;

use crate::analyze::FilePlan;
use crate::bindings::{FileBindings, ModuleVar, TypeDeclNode};
use crate::groups::{upper_first, StyleFunction};
use crate::manip::TextEdit;
use crate::roots::RootBody;
use crate::source::{ModulePaths, SourceText, BASE_POS};
use crate::types::ImportClause;

pub struct Emitter<'a> {
    pub text: &'a SourceText,
    pub bindings: &'a FileBindings,
    pub paths: &'a ModulePaths,
}

impl Emitter<'_> {
    /// Renders the generated accessor module: imports, hoisted declarations,
    /// props interfaces, and the `styling` accessor object.
    pub fn generated_module(&self, plan: &FilePlan) -> String {
        let mut out = String::new();
        out.push_str("// Generated module. Edit the component file instead.\n");

        let imports = self.render_imports(plan);
        if !imports.is_empty() {
            out.push_str(&imports);
            out.push('\n');
        }

        // Source order keeps chained hoists declared before their users.
        let mut hoists: Vec<(&crate::analyze::VariableHoist, &ModuleVar)> = plan
            .hoists
            .iter()
            .filter_map(|h| self.bindings.module_vars.get(&h.name).map(|v| (h, v)))
            .collect();
        hoists.sort_by_key(|(_, var)| var.declarator_span.lo);
        for (hoist, var) in &hoists {
            if hoist.exported {
                out.push_str("export ");
            }
            out.push_str(var_kind(var.kind));
            out.push(' ');
            out.push_str(self.text.slice(var.declarator_span));
            out.push_str(";\n");
        }
        if !plan.hoists.is_empty() {
            out.push('\n');
        }

        for func in contributing(plan) {
            if func.parameters.is_empty() {
                continue;
            }
            out.push_str(&format!("export interface {}Props {{\n", pascal(&func.name)));
            for param in &func.parameters {
                let (optional, ty) = match &param.type_info {
                    Some(info) => (info.optional, info.rendered()),
                    None => (false, "any".to_string()),
                };
                out.push_str(&format!(
                    "  {}{}: {};\n",
                    param.source_name,
                    if optional { "?" } else { "" },
                    ty
                ));
            }
            out.push_str("}\n\n");
        }

        out.push_str("export const styling = {\n");
        for func in contributing(plan) {
            out.push_str(&format!(
                "  get{}Styles({}) {{\n",
                pascal(&func.name),
                self.parameter_clause(func)
            ));
            out.push_str("    return {\n");
            for group in &func.groups {
                if group.properties.is_empty() {
                    continue;
                }
                out.push_str(&format!("      \"{}\": {{\n", group.key));
                for prop in &group.properties {
                    out.push_str(&format!(
                        "        {}: {},\n",
                        prop.attribute, prop.value_text
                    ));
                }
                out.push_str("      },\n");
            }
            out.push_str("    };\n  },\n");
        }
        out.push_str("};\n");
        out
    }

    /// Collects every import the generated module needs, grouped by
    /// specifier: the analyzer's module imports plus everything parameter
    /// types pulled in.
    fn render_imports(&self, plan: &FilePlan) -> String {
        // first-seen specifier order
        let mut order: Vec<String> = vec![];
        let mut named: HashMap<String, Vec<String>> = HashMap::new();
        let mut clauses: HashMap<String, Vec<String>> = HashMap::new();

        let mut push = |req: &crate::types::ImportRequirement| {
            if !order.contains(&req.specifier) {
                order.push(req.specifier.clone());
            }
            match &req.clause {
                ImportClause::Named(text) => {
                    let list = named.entry(req.specifier.clone()).or_default();
                    if !list.contains(text) {
                        list.push(text.clone());
                    }
                }
                ImportClause::DefaultOrNamespace(text) => {
                    let list = clauses.entry(req.specifier.clone()).or_default();
                    if !list.contains(text) {
                        list.push(text.clone());
                    }
                }
            }
        };

        for req in &plan.module_imports {
            push(req);
        }
        for func in contributing(plan) {
            for param in &func.parameters {
                if let Some(info) = &param.type_info {
                    for req in &info.imports {
                        push(req);
                    }
                }
            }
        }

        let mut out = String::new();
        for spec in order {
            let mut clause = clauses.get(&spec).map(|c| c.join(", ")).unwrap_or_default();
            if let Some(list) = named.get(&spec) {
                if !clause.is_empty() {
                    clause.push_str(", ");
                }
                clause.push_str(&format!("{{ {} }}", list.join(", ")));
            }
            out.push_str(&format!("import {} from \"{}\";\n", clause, spec));
        }
        out
    }

    fn parameter_clause(&self, func: &StyleFunction) -> String {
        if func.parameters.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = func
            .parameters
            .iter()
            .map(|p| p.source_name.as_str())
            .collect();
        let default = if func.all_parameters_optional() { " = {}" } else { "" };
        format!(
            "{{ {} }}: {}Props{}",
            names.join(", "),
            pascal(&func.name),
            default
        )
    }

    /// Queues every rewrite of the original source: accessor import, accessor
    /// call injections, group spreads, and hoisted-statement removals.
    /// Attribute removals are already queued by the analyzer.
    pub fn queue_source_edits(&self, plan: &mut FilePlan) {
        let import = self.accessor_import(plan);
        match self.bindings.last_import_end {
            Some(end) => plan
                .queue
                .edit(TextEdit::insert(end, format!("\n{import}"))),
            None => plan
                .queue
                .edit(TextEdit::insert(BytePos(BASE_POS), format!("{import}\n"))),
        }

        for func in &plan.sheet.functions {
            if !func.has_properties() {
                continue;
            }
            let call = self.accessor_call(func);
            match &func.root.body {
                RootBody::Block(span) => {
                    plan.queue.edit(TextEdit::insert(
                        BytePos(span.lo.0 + 1),
                        format!("\n  {call}"),
                    ));
                }
                RootBody::Concise(span) => {
                    // Two boundary inserts keep inner edits non-overlapping.
                    plan.queue
                        .edit(TextEdit::insert(span.lo, format!("{{ {call} return (")));
                    plan.queue
                        .edit(TextEdit::insert(span.hi, "); }".to_string()));
                }
            }
            for group in &func.groups {
                if group.properties.is_empty() {
                    continue;
                }
                plan.queue.edit(TextEdit::insert(
                    group.insert_at,
                    format!(" {{...styles[\"{}\"]}}", group.key),
                ));
            }
        }

        self.queue_hoist_removals(plan);
        self.queue_source_exports(plan);
    }

    /// Same-file declarations the generated module imports back must
    /// actually be exported by the component; tag each one that is not.
    fn queue_source_exports(&self, plan: &mut FilePlan) {
        let component = self.paths.component_specifier();
        let mut names: Vec<String> = vec![];
        let param_imports = plan
            .sheet
            .functions
            .iter()
            .flat_map(|f| f.parameters.iter())
            .filter_map(|p| p.type_info.as_ref())
            .flat_map(|info| info.imports.iter());
        for req in plan.module_imports.iter().chain(param_imports) {
            if req.specifier != component {
                continue;
            }
            let ImportClause::Named(name) = &req.clause else { continue };
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        for name in names {
            if plan.hoists.iter().any(|h| h.name == name) {
                continue;
            }
            let insert_at = if let Some(var) = self.bindings.module_vars.get(&name) {
                if var.source_exported {
                    continue;
                }
                var.stmt_span.lo
            } else if let Some(decl) = self.bindings.type_decls.get(&name) {
                if decl.source_exported {
                    continue;
                }
                match &decl.node {
                    TypeDeclNode::Interface(i) => i.span.lo,
                    TypeDeclNode::Alias(a) => a.span.lo,
                }
            } else {
                continue;
            };
            plan.queue
                .edit(TextEdit::insert(insert_at, "export ".to_string()));
        }
    }

    fn accessor_import(&self, plan: &FilePlan) -> String {
        let mut names = vec!["styling".to_string()];
        names.extend(plan.back_imports.iter().cloned());
        format!(
            "import {{ {} }} from \"{}\";",
            names.join(", "),
            self.paths.accessor_specifier()
        )
    }

    fn accessor_call(&self, func: &StyleFunction) -> String {
        let args = if func.parameters.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = func
                .parameters
                .iter()
                .map(|p| p.call_argument())
                .collect();
            format!("{{ {} }}", list.join(", "))
        };
        format!(
            "const styles = styling.get{}Styles({});",
            pascal(&func.name),
            args
        )
    }

    /// Hoisted declarations leave the source. A statement loses either its
    /// whole span (every declarator hoisted, or a single declarator) or just
    /// the hoisted declarator with its separating comma.
    fn queue_hoist_removals(&self, plan: &mut FilePlan) {
        let mut by_stmt: HashMap<(u32, u32), Vec<&ModuleVar>> = HashMap::new();
        for hoist in &plan.hoists {
            if let Some(var) = self.bindings.module_vars.get(&hoist.name) {
                by_stmt
                    .entry((var.stmt_span.lo.0, var.stmt_span.hi.0))
                    .or_default()
                    .push(var);
            }
        }

        let mut edits = vec![];
        for ((lo, hi), vars) in by_stmt {
            let stmt = Span::new(BytePos(lo), BytePos(hi));
            if vars.len() == vars[0].siblings {
                edits.push(TextEdit::remove(Span::new(
                    self.text.extend_back_over_whitespace(stmt.lo),
                    stmt.hi,
                )));
                continue;
            }
            for var in vars {
                edits.push(TextEdit::remove(self.declarator_removal_span(var)));
            }
        }
        for edit in edits {
            plan.queue.edit(edit);
        }
    }

    /// Declarator span widened over the comma that separates it from a
    /// sibling: the trailing comma for all but the last declarator, the
    /// leading one otherwise.
    fn declarator_removal_span(&self, var: &ModuleVar) -> Span {
        let bytes = self.text.as_str().as_bytes();
        let mut lo = self.text.offset(var.declarator_span.lo);
        let mut hi = self.text.offset(var.declarator_span.hi);
        if var.index + 1 < var.siblings {
            while hi < bytes.len() && bytes[hi].is_ascii_whitespace() {
                hi += 1;
            }
            if hi < bytes.len() && bytes[hi] == b',' {
                hi += 1;
            }
            while hi < bytes.len() && matches!(bytes[hi], b' ' | b'\t') {
                hi += 1;
            }
        } else {
            while lo > 0 && bytes[lo - 1].is_ascii_whitespace() {
                lo -= 1;
            }
            if lo > 0 && bytes[lo - 1] == b',' {
                lo -= 1;
            }
        }
        Span::new(
            BytePos(lo as u32 + BASE_POS),
            BytePos(hi as u32 + BASE_POS),
        )
    }
}

fn contributing(plan: &FilePlan) -> impl Iterator<Item = &StyleFunction> {
    plan.sheet.functions.iter().filter(|f| f.has_properties())
}

fn pascal(name: &str) -> String {
    upper_first(name)
}

fn var_kind(kind: VarDeclKind) -> &'static str {
    match kind {
        VarDeclKind::Var => "var",
        VarDeclKind::Let => "let",
        VarDeclKind::Const => "const",
    }
}
