//! Source-to-source extraction of presentation attributes from TSX
//! components.
//!
//! The pipeline parses a component, scans its markup for allow-listed
//! presentation attributes (`class`, `className`, `style`, `css`), resolves
//! each element to its nearest named function, classifies every identifier
//! the attribute values reference, and emits a generated module of typed
//! accessor functions. The original source is rewritten to consume the
//! accessors; all rewrites are deferred text edits, the tree itself is never
//! mutated.

pub mod analyze;
pub mod bindings;
pub mod config;
pub mod emit;
pub mod error;
pub mod groups;
pub mod manip;
pub mod prune;
pub mod roots;
pub mod scan;
pub mod source;
pub mod types;
pub mod worker;

use analyze::{Analyzer, FilePlan};
use emit::Emitter;
use scan::MarkupElement;
use types::TypeResolver;

pub use config::{Recognition, RECOGNITION};
pub use error::{ExtractError, Result};
pub use source::ModulePaths;
pub use worker::{run_jobs, JobDescriptor, JobOutcome};

/// Output of one component extraction.
pub struct Extraction {
    /// The component source after attribute removal, accessor injection, and
    /// import pruning.
    pub rewritten: String,
    /// Text of the generated accessor module.
    pub module: String,
    /// Element-scoped failures that aborted single elements.
    pub skipped: Vec<ExtractError>,
}

/// Runs the full pipeline over one component. `Ok(None)` means no element
/// contributed anything and both files stay untouched.
pub fn extract_component(
    source: &str,
    paths: &ModulePaths,
    rec: &Recognition,
) -> Result<Option<Extraction>> {
    let path_text = paths.source.to_string_lossy().to_string();
    let tree = source::parse_component(&path_text, source)?;
    let bindings = bindings::collect(&tree.module, rec);
    let elements = scan::scan(&tree, rec);

    let analyzer = Analyzer {
        text: &tree.text,
        bindings: &bindings,
        rec,
        resolver: TypeResolver {
            text: &tree.text,
            bindings: &bindings,
            paths,
            rec,
        },
    };

    let mut plan = FilePlan::default();
    for (id, elem) in elements.iter().enumerate() {
        if elem.attrs.is_empty() {
            continue;
        }
        let Some(root) = &elem.root else {
            let err = ExtractError::NamingResolution {
                tag: elem.tag.clone(),
                offset: tree.text.offset(elem.span.lo),
            };
            tracing::warn!(component = %path_text, "{err}");
            plan.skipped.push(err);
            continue;
        };
        let func = plan
            .sheet
            .get_or_create_function(&root.name, false, root, rec.keyword_suffix);
        let key = group_key(elem, rec);
        let group = plan
            .sheet
            .function(func)
            .get_or_create_group(&key, id, elem.name_end);
        for attr in &elem.attrs {
            analyzer.analyze_attribute(elem, attr, func, group, &mut plan)?;
        }
    }
    analyzer.refine_variant_parameters(&mut plan);

    if plan.sheet.functions.iter().all(|f| f.groups.is_empty()) {
        return Ok(None);
    }

    let FilePlan { queue, sheet, .. } = &mut plan;
    queue.run_before(&tree.text, sheet)?;

    let emitter = Emitter {
        text: &tree.text,
        bindings: &bindings,
        paths,
    };
    let module = emitter.generated_module(&plan);
    emitter.queue_source_edits(&mut plan);

    let queue = std::mem::take(&mut plan.queue);
    let rewritten = queue.run_after(&tree.text);
    let rewritten = prune::prune_unused_imports(&path_text, &rewritten, rec)?;

    Ok(Some(Extraction {
        rewritten,
        module,
        skipped: plan.skipped,
    }))
}

/// Group key of one element: its filtered ancestor labels below the markup
/// root, then its own label, joined by the group delimiter. The markup
/// root's segment is dropped; the accessor function already carries that
/// name.
fn group_key(elem: &MarkupElement, rec: &Recognition) -> String {
    let mut segments: Vec<&str> = elem
        .ancestors
        .iter()
        .skip(1)
        .filter(|label| !rec.is_wrapper_label(label.as_str()))
        .map(String::as_str)
        .collect();
    segments.push(&elem.label);
    segments.join(rec.group_delimiter)
}
