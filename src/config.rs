use std::collections::HashSet;

use once_cell::sync::Lazy;

/// A call that reads a value out of a framework context, e.g. `useContext`.
#[derive(Debug, Clone, Copy)]
pub struct ContextAccessor {
    pub name: &'static str,
    pub module: &'static str,
}

/// A recognized variant-authoring helper and the utility type that extracts
/// its variant prop types.
#[derive(Debug, Clone, Copy)]
pub struct VariantHelper {
    pub name: &'static str,
    pub utility: &'static str,
    pub utility_module: &'static str,
}

/// Fixed, compile-time recognition tables consumed by the pipeline.
///
/// Built once, passed by reference, never mutated. The wrapper-label rule is
/// a predicate rather than hardened policy; callers with different naming
/// conventions construct their own `Recognition`.
pub struct Recognition {
    pub presentation_attributes: HashSet<&'static str>,
    pub wrapper_label: fn(&str) -> bool,
    pub context_accessors: &'static [ContextAccessor],
    pub context_factory: &'static str,
    pub framework_module: &'static str,
    pub variant_helpers: &'static [VariantHelper],
    pub dependency_dir: &'static str,
    pub group_delimiter: &'static str,
    pub keyword_suffix: &'static str,
}

fn default_wrapper_label(label: &str) -> bool {
    label.ends_with("Wrapper")
}

const CONTEXT_ACCESSORS: &[ContextAccessor] = &[
    ContextAccessor { name: "useContext", module: "react" },
    ContextAccessor { name: "use", module: "react" },
];

const VARIANT_HELPERS: &[VariantHelper] = &[
    VariantHelper {
        name: "tv",
        utility: "VariantProps",
        utility_module: "tailwind-variants",
    },
    VariantHelper {
        name: "cva",
        utility: "VariantProps",
        utility_module: "class-variance-authority",
    },
];

impl Recognition {
    pub fn default_set() -> Self {
        Self {
            presentation_attributes: ["class", "className", "style", "css"]
                .into_iter()
                .collect(),
            wrapper_label: default_wrapper_label,
            context_accessors: CONTEXT_ACCESSORS,
            context_factory: "createContext",
            framework_module: "react",
            variant_helpers: VARIANT_HELPERS,
            dependency_dir: "node_modules",
            group_delimiter: ".",
            keyword_suffix: "_fn",
        }
    }

    pub fn is_presentation_attribute(&self, name: &str) -> bool {
        self.presentation_attributes.contains(name)
    }

    pub fn is_wrapper_label(&self, label: &str) -> bool {
        (self.wrapper_label)(label)
    }

    pub fn context_accessor(&self, name: &str) -> Option<&'static ContextAccessor> {
        self.context_accessors.iter().find(|a| a.name == name)
    }

    pub fn variant_helper(&self, name: &str) -> Option<&'static VariantHelper> {
        self.variant_helpers.iter().find(|h| h.name == name)
    }
}

/// Process-wide default tables.
pub static RECOGNITION: Lazy<Recognition> = Lazy::new(Recognition::default_set);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allow_list_covers_class_and_style() {
        let rec = Recognition::default_set();
        assert!(rec.is_presentation_attribute("className"));
        assert!(rec.is_presentation_attribute("style"));
        assert!(!rec.is_presentation_attribute("onClick"));
    }

    #[test]
    fn wrapper_predicate_matches_suffix_only() {
        let rec = Recognition::default_set();
        assert!(rec.is_wrapper_label("LayoutWrapper"));
        assert!(!rec.is_wrapper_label("WrapperLayout"));
    }
}
