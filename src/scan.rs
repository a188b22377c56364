use swc_core::common::{BytePos, Span, Spanned};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::config::Recognition;
use crate::roots::{element_label, tag_name, RootBody, RootInfo};
use crate::source::{SourceText, SourceTree};

/// Value of a scanned presentation attribute.
pub enum AttrValue {
    /// Plain string literal, span includes the quotes.
    Str(Span),
    /// `{expr}` container; the expression is cloned so analysis can walk it
    /// after the scan pass ends.
    Expr { container_span: Span, expr: Box<Expr> },
}

pub struct ScannedAttr {
    pub name: String,
    pub span: Span,
    pub value: AttrValue,
}

/// One markup element in document pre-order. A view over the SourceTree: all
/// positions index into the original text.
pub struct MarkupElement {
    pub tag: String,
    pub label: String,
    /// Labels of enclosing markup containers, outermost first, unfiltered.
    pub ancestors: Vec<String>,
    /// End of the opening tag name (after type arguments, if any); spread
    /// insertion point.
    pub name_end: BytePos,
    pub span: Span,
    pub attrs: Vec<ScannedAttr>,
    /// `None` when no named function-like declaration encloses the element.
    pub root: Option<RootInfo>,
}

pub fn scan(tree: &SourceTree, rec: &Recognition) -> Vec<MarkupElement> {
    let mut scanner = Scanner {
        text: &tree.text,
        rec,
        fn_stack: vec![],
        jsx_stack: vec![],
        pending_name: None,
        out: vec![],
    };
    tree.module.visit_with(&mut scanner);
    scanner.out
}

struct Frame {
    name: Option<String>,
    body: Option<RootBody>,
    params: Vec<Pat>,
    fn_span: Span,
}

struct Scanner<'a> {
    text: &'a SourceText,
    rec: &'a Recognition,
    fn_stack: Vec<Frame>,
    jsx_stack: Vec<String>,
    /// Variable name awaiting an anonymous function initializer.
    pending_name: Option<String>,
    out: Vec<MarkupElement>,
}

impl Scanner<'_> {
    fn current_root(&self) -> Option<RootInfo> {
        let frame = self.fn_stack.last()?;
        let name = frame.name.clone()?;
        let body = frame.body.clone()?;
        Some(RootInfo {
            name,
            body,
            params: frame.params.clone(),
            fn_span: frame.fn_span,
        })
    }

    fn scan_attrs(&self, opening: &JSXOpeningElement) -> Vec<ScannedAttr> {
        let mut out = vec![];
        for attr in &opening.attrs {
            let JSXAttrOrSpread::JSXAttr(attr) = attr else { continue };
            let JSXAttrName::Ident(name) = &attr.name else { continue };
            if !self.rec.is_presentation_attribute(name.sym.as_ref()) {
                continue;
            }
            let value = match &attr.value {
                Some(JSXAttrValue::Lit(Lit::Str(s))) => AttrValue::Str(s.span),
                Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                    JSXExpr::Expr(expr) => AttrValue::Expr {
                        container_span: container.span,
                        expr: expr.clone(),
                    },
                    JSXExpr::JSXEmptyExpr(_) => continue,
                },
                _ => continue,
            };
            out.push(ScannedAttr {
                name: name.sym.to_string(),
                span: attr.span,
                value,
            });
        }
        out
    }

    fn record_element(&mut self, n: &JSXElement) {
        let label = element_label(&n.opening, self.text);
        // spread insertion must follow `<Foo<T>` type arguments
        let name_end = n
            .opening
            .type_args
            .as_ref()
            .map(|args| args.span.hi)
            .unwrap_or_else(|| n.opening.name.span().hi);
        self.out.push(MarkupElement {
            tag: tag_name(&n.opening.name, self.text),
            label,
            ancestors: self.jsx_stack.clone(),
            name_end,
            span: n.span,
            attrs: self.scan_attrs(&n.opening),
            root: self.current_root(),
        });
    }

    fn push_method_frame(&mut self, name: Option<String>, function: &Function) {
        self.fn_stack.push(Frame {
            name,
            body: function.body.as_ref().map(|b| RootBody::Block(b.span)),
            params: function.params.iter().map(|p| p.pat.clone()).collect(),
            fn_span: function.span,
        });
    }
}

fn method_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(i) => Some(i.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

impl Visit for Scanner<'_> {
    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.fn_stack.push(Frame {
            name: Some(n.ident.sym.to_string()),
            body: n.function.body.as_ref().map(|b| RootBody::Block(b.span)),
            params: n.function.params.iter().map(|p| p.pat.clone()).collect(),
            fn_span: n.function.span,
        });
        n.visit_children_with(self);
        self.fn_stack.pop();
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        let name = n
            .ident
            .as_ref()
            .map(|i| i.sym.to_string())
            .or_else(|| self.pending_name.take());
        self.fn_stack.push(Frame {
            name,
            body: n.function.body.as_ref().map(|b| RootBody::Block(b.span)),
            params: n.function.params.iter().map(|p| p.pat.clone()).collect(),
            fn_span: n.function.span,
        });
        n.visit_children_with(self);
        self.fn_stack.pop();
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        let body = match &*n.body {
            BlockStmtOrExpr::BlockStmt(b) => RootBody::Block(b.span),
            BlockStmtOrExpr::Expr(e) => RootBody::Concise(e.span()),
        };
        self.fn_stack.push(Frame {
            name: self.pending_name.take(),
            body: Some(body),
            params: n.params.clone(),
            fn_span: n.span,
        });
        n.visit_children_with(self);
        self.fn_stack.pop();
    }

    fn visit_class_method(&mut self, n: &ClassMethod) {
        self.push_method_frame(method_name(&n.key), &n.function);
        n.visit_children_with(self);
        self.fn_stack.pop();
    }

    fn visit_method_prop(&mut self, n: &MethodProp) {
        self.push_method_frame(method_name(&n.key), &n.function);
        n.visit_children_with(self);
        self.fn_stack.pop();
    }

    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        let assigns_function = matches!(
            d.init.as_deref(),
            Some(Expr::Arrow(_)) | Some(Expr::Fn(_))
        );
        if assigns_function {
            if let Some(name) = d.name.as_ident() {
                self.pending_name = Some(name.id.sym.to_string());
            }
        }
        d.visit_children_with(self);
        self.pending_name = None;
    }

    fn visit_jsx_element(&mut self, n: &JSXElement) {
        self.record_element(n);
        let label = element_label(&n.opening, self.text);
        self.jsx_stack.push(label);
        n.visit_children_with(self);
        self.jsx_stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Recognition;
    use crate::source::parse_component;

    fn scan_src(src: &str) -> Vec<MarkupElement> {
        let tree = parse_component("test.tsx", src).unwrap();
        scan(&tree, &Recognition::default_set())
    }

    #[test]
    fn elements_in_preorder_with_ancestors() {
        let els = scan_src(
            "function Card() {\n  return <section><div><span /></div></section>;\n}\n",
        );
        let tags: Vec<_> = els.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["section", "div", "span"]);
        assert_eq!(els[2].ancestors, vec!["section", "div"]);
    }

    #[test]
    fn root_named_from_assigned_variable() {
        let els = scan_src("const Card = () => <div className=\"x\" />;\n");
        assert_eq!(els[0].root.as_ref().unwrap().name, "Card");
        assert!(matches!(
            els[0].root.as_ref().unwrap().body,
            RootBody::Concise(_)
        ));
    }

    #[test]
    fn unnamed_callback_has_no_root() {
        let els = scan_src(
            "const items: string[] = [];\nexport default items.map(() => <li />);\n",
        );
        assert!(els[0].root.is_none());
    }

    #[test]
    fn label_prefers_id_attribute() {
        let els = scan_src(
            "function Card() { return <div id=\"header\"><b /></div>; }\n",
        );
        assert_eq!(els[0].label, "header");
        assert_eq!(els[1].ancestors, vec!["header"]);
    }

    #[test]
    fn class_method_forms_its_own_root() {
        let els = scan_src(
            "class Panel {\n  render() {\n    return <div className=\"x\" />;\n  }\n}\n",
        );
        assert_eq!(els[0].root.as_ref().unwrap().name, "render");
    }

    #[test]
    fn object_method_forms_its_own_root() {
        let els = scan_src(
            "const views = {\n  card() {\n    return <div className=\"x\" />;\n  },\n};\n",
        );
        assert_eq!(els[0].root.as_ref().unwrap().name, "card");
    }

    #[test]
    fn spread_point_sits_after_type_arguments() {
        let src = "function Card() { return <Foo<string> className=\"x\" />; }\n";
        let tree = parse_component("test.tsx", src).unwrap();
        let els = scan(&tree, &Recognition::default_set());
        let head = &src[..tree.text.offset(els[0].name_end)];
        assert!(head.ends_with("<Foo<string>"), "{head}");
    }

    #[test]
    fn only_allow_listed_attrs_are_scanned() {
        let els = scan_src(
            "function Card() { return <div className=\"a\" style={{}} onClick={x} />; }\n",
        );
        let names: Vec<_> = els[0].attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["className", "style"]);
    }
}
