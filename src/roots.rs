use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::*;

use crate::source::SourceText;

/// Body shape of a root function. Concise arrow bodies are converted to
/// blocks when an accessor call is injected.
#[derive(Debug, Clone)]
pub enum RootBody {
    Block(Span),
    Concise(Span),
}

/// The nearest enclosing function-like declaration owning a markup subtree.
#[derive(Debug, Clone)]
pub struct RootInfo {
    pub name: String,
    pub body: RootBody,
    pub params: Vec<Pat>,
    pub fn_span: Span,
}

pub fn tag_name(name: &JSXElementName, text: &SourceText) -> String {
    match name {
        JSXElementName::Ident(i) => i.sym.to_string(),
        other => text.slice(other.span()).to_string(),
    }
}

/// Naming label of a markup container: an explicit `id`/`name` string
/// attribute when present, else the tag name.
pub fn element_label(opening: &JSXOpeningElement, text: &SourceText) -> String {
    for attr in &opening.attrs {
        let JSXAttrOrSpread::JSXAttr(attr) = attr else { continue };
        let JSXAttrName::Ident(name) = &attr.name else { continue };
        if name.sym.as_ref() != "id" && name.sym.as_ref() != "name" {
            continue;
        }
        if let Some(JSXAttrValue::Lit(Lit::Str(s))) = &attr.value {
            return s.value.to_string();
        }
    }
    tag_name(&opening.name, text)
}
