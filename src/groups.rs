use once_cell::sync::Lazy;
use regex::Regex;
use swc_core::common::BytePos;

use crate::error::{ExtractError, Result};
use crate::roots::RootInfo;
use crate::types::TypeInfo;

/// One accessor parameter. `source_name` is the emitted name and the dedup
/// key; `destination_name` carries a differing call-site expression (e.g.
/// `props.size` for parameter `size`).
#[derive(Debug, Clone)]
pub struct Parameter {
    pub source_name: String,
    pub destination_name: Option<String>,
    pub type_info: Option<TypeInfo>,
}

impl Parameter {
    /// Argument text inside the injected accessor call's object literal.
    pub fn call_argument(&self) -> String {
        match &self.destination_name {
            Some(dest) => format!("{}: {}", self.source_name, dest),
            None => self.source_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyEntry {
    pub attribute: String,
    pub value_text: String,
}

/// One property group: the extracted attributes of exactly one element.
pub struct StyleGroup {
    pub key: String,
    pub element_id: usize,
    pub properties: Vec<PropertyEntry>,
    /// End of the owning element's opening tag name; spread insertion point.
    pub insert_at: BytePos,
}

/// One accessor per root function, accumulating parameters and groups.
pub struct StyleFunction {
    pub name: String,
    pub root: RootInfo,
    pub parameters: Vec<Parameter>,
    pub groups: Vec<StyleGroup>,
}

impl StyleFunction {
    /// Adds a parameter unless one with the same source name exists.
    pub fn add_parameter(&mut self, param: Parameter) {
        if !self
            .parameters
            .iter()
            .any(|p| p.source_name == param.source_name)
        {
            self.parameters.push(param);
        }
    }

    pub fn parameter_mut(&mut self, source_name: &str) -> Option<&mut Parameter> {
        self.parameters
            .iter_mut()
            .find(|p| p.source_name == source_name)
    }

    /// Returns the group for `key`. A key already claimed by a different
    /// element gets a numeric suffix; one element maps to exactly one group.
    pub fn get_or_create_group(
        &mut self,
        key: &str,
        element_id: usize,
        insert_at: BytePos,
    ) -> usize {
        if let Some(idx) = self
            .groups
            .iter()
            .position(|g| g.element_id == element_id)
        {
            return idx;
        }
        let mut candidate = key.to_string();
        let mut n = 1usize;
        while self.groups.iter().any(|g| g.key == candidate) {
            n += 1;
            candidate = format!("{key}{n}");
        }
        self.groups.push(StyleGroup {
            key: candidate,
            element_id,
            properties: vec![],
            insert_at,
        });
        self.groups.len() - 1
    }

    /// Appends a property, rejecting an incompatible duplicate.
    pub fn push_property(
        &mut self,
        group: usize,
        entry: PropertyEntry,
    ) -> Result<()> {
        let key = self.groups[group].key.clone();
        let existing = self.groups[group]
            .properties
            .iter()
            .find(|p| p.attribute == entry.attribute);
        if let Some(existing) = existing {
            if existing.value_text == entry.value_text {
                return Ok(());
            }
            return Err(ExtractError::GroupCollision {
                function: self.name.clone(),
                key,
                detail: format!(
                    "attribute {} already holds a different value",
                    entry.attribute
                ),
            });
        }
        self.groups[group].properties.push(entry);
        Ok(())
    }

    pub fn has_properties(&self) -> bool {
        self.groups.iter().any(|g| !g.properties.is_empty())
    }

    pub fn all_parameters_optional(&self) -> bool {
        self.parameters
            .iter()
            .all(|p| p.type_info.as_ref().is_some_and(|t| t.optional))
    }
}

/// Registry of StyleFunctions for one run; names unique, numeric suffix on
/// collision.
#[derive(Default)]
pub struct StyleSheetBuilder {
    pub functions: Vec<StyleFunction>,
}

impl StyleSheetBuilder {
    pub fn get_or_create_function(
        &mut self,
        raw_name: &str,
        force_unique: bool,
        root: &RootInfo,
        keyword_suffix: &str,
    ) -> usize {
        let base = sanitize_identifier(raw_name, keyword_suffix);
        if !force_unique {
            if let Some(idx) = self.functions.iter().position(|f| {
                f.name == base && f.root.fn_span == root.fn_span
            }) {
                return idx;
            }
        }
        let mut candidate = base.clone();
        let mut n = 1usize;
        while self.functions.iter().any(|f| f.name == candidate) {
            n += 1;
            candidate = format!("{base}{n}");
        }
        self.functions.push(StyleFunction {
            name: candidate,
            root: root.clone(),
            parameters: vec![],
            groups: vec![],
        });
        self.functions.len() - 1
    }

    pub fn function(&mut self, idx: usize) -> &mut StyleFunction {
        &mut self.functions[idx]
    }
}

// -----------------------------------------------------------------------------
// Identifier sanitation
// -----------------------------------------------------------------------------

static IDENT_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_$]+").unwrap());

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "export", "extends", "false",
    "finally", "for", "function", "if", "import", "in", "instanceof", "new",
    "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "let", "static",
    "await", "implements", "interface", "package", "private", "protected",
    "public",
];

/// Sanitizes arbitrary text into a valid identifier: non-identifier runs
/// become token breaks, tokens camel-join (first token unchanged), a `_` is
/// prefixed while the leading char stays invalid, and reserved words get the
/// fixed suffix.
pub fn sanitize_identifier(raw: &str, keyword_suffix: &str) -> String {
    let spaced = IDENT_BREAK.replace_all(raw, " ");
    let mut tokens = spaced.split_whitespace();
    let mut out = String::new();
    if let Some(first) = tokens.next() {
        out.push_str(first);
    }
    for token in tokens {
        let mut chars = token.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    let leading_ok = out
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    if !leading_ok {
        out.insert(0, '_');
    }
    if RESERVED.contains(&out.as_str()) {
        out.push_str(keyword_suffix);
    }
    out
}

pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::{RootBody, RootInfo};
    use swc_core::common::{BytePos, Span};

    fn root(lo: u32) -> RootInfo {
        RootInfo {
            name: "Card".into(),
            body: RootBody::Block(Span::new(BytePos(lo), BytePos(lo + 10))),
            params: vec![],
            fn_span: Span::new(BytePos(lo), BytePos(lo + 20)),
        }
    }

    #[test]
    fn sanitize_prefixes_invalid_leading_char() {
        let out = sanitize_identifier("2for-each Styling", "_fn");
        assert!(out.starts_with('_'), "{out}");
        assert_eq!(out, "_2forEachStyling");
    }

    #[test]
    fn sanitize_suffixes_reserved_words() {
        assert_eq!(sanitize_identifier("class", "_fn"), "class_fn");
    }

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_identifier("Card", "_fn"), "Card");
    }

    #[test]
    fn function_names_get_numeric_suffixes() {
        let mut sheet = StyleSheetBuilder::default();
        let a = sheet.get_or_create_function("Card", false, &root(1), "_fn");
        let same = sheet.get_or_create_function("Card", false, &root(1), "_fn");
        let other = sheet.get_or_create_function("Card", false, &root(100), "_fn");
        assert_eq!(a, same);
        assert_ne!(a, other);
        assert_eq!(sheet.functions[other].name, "Card2");
    }

    #[test]
    fn group_keys_get_numeric_suffixes_per_element() {
        let mut sheet = StyleSheetBuilder::default();
        let f = sheet.get_or_create_function("Card", false, &root(1), "_fn");
        let func = sheet.function(f);
        let g1 = func.get_or_create_group("div", 0, BytePos(5));
        let g2 = func.get_or_create_group("div", 1, BytePos(9));
        assert_ne!(g1, g2);
        assert_eq!(func.groups[g1].key, "div");
        assert_eq!(func.groups[g2].key, "div2");
        // same element resolves to its existing group regardless of key
        assert_eq!(func.get_or_create_group("div", 0, BytePos(5)), g1);
    }

    #[test]
    fn parameters_dedupe_by_source_name() {
        let mut sheet = StyleSheetBuilder::default();
        let f = sheet.get_or_create_function("Card", false, &root(1), "_fn");
        let func = sheet.function(f);
        func.add_parameter(Parameter {
            source_name: "size".into(),
            destination_name: None,
            type_info: None,
        });
        func.add_parameter(Parameter {
            source_name: "size".into(),
            destination_name: Some("props.size".into()),
            type_info: None,
        });
        assert_eq!(func.parameters.len(), 1);
        assert!(func.parameters[0].destination_name.is_none());
    }

    #[test]
    fn incompatible_duplicate_property_is_fatal() {
        let mut sheet = StyleSheetBuilder::default();
        let f = sheet.get_or_create_function("Card", false, &root(1), "_fn");
        let func = sheet.function(f);
        let g = func.get_or_create_group("div", 0, BytePos(5));
        func.push_property(
            g,
            PropertyEntry { attribute: "className".into(), value_text: "cx(a)".into() },
        )
        .unwrap();
        let err = func
            .push_property(
                g,
                PropertyEntry { attribute: "className".into(), value_text: "cx(b)".into() },
            )
            .unwrap_err();
        assert!(matches!(err, crate::error::ExtractError::GroupCollision { .. }));
    }
}
