use swc_core::common::{BytePos, Span};

use crate::error::Result;
use crate::groups::{PropertyEntry, StyleSheetBuilder};
use crate::source::SourceText;

/// Mutations are queued, not applied, while the tree is still being read.
/// `BeforeGeneration` actions capture attribute values (with identifier
/// rewrites) into the style sheet; `AfterGeneration` actions are destructive
/// text edits on the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    BeforeGeneration,
    AfterGeneration,
}

/// A splice of the original source. `lo == hi` inserts; empty text deletes.
#[derive(Debug)]
pub struct TextEdit {
    pub lo: BytePos,
    pub hi: BytePos,
    pub text: String,
}

impl TextEdit {
    pub fn insert(at: BytePos, text: String) -> Self {
        Self { lo: at, hi: at, text }
    }

    pub fn remove(span: Span) -> Self {
        Self { lo: span.lo, hi: span.hi, text: String::new() }
    }
}

/// Capture of one presentation attribute's value into its property group,
/// with identifier rewrites applied to the captured text.
#[derive(Debug)]
pub struct CaptureProperty {
    pub function: usize,
    pub group: usize,
    pub attribute: String,
    pub value_span: Span,
    /// True for `{expr}` containers whose braces must be stripped.
    pub strip_container: bool,
    pub rewrites: Vec<(Span, String)>,
}

#[derive(Debug)]
pub enum Action {
    Capture(CaptureProperty),
    Edit(TextEdit),
}

#[derive(Debug)]
pub struct Manipulation {
    pub pass: Pass,
    pub action: Action,
}

#[derive(Default)]
pub struct ManipulationQueue {
    items: Vec<Manipulation>,
}

impl ManipulationQueue {
    pub fn capture(&mut self, op: CaptureProperty) {
        self.items.push(Manipulation {
            pass: Pass::BeforeGeneration,
            action: Action::Capture(op),
        });
    }

    pub fn edit(&mut self, edit: TextEdit) {
        self.items.push(Manipulation {
            pass: Pass::AfterGeneration,
            action: Action::Edit(edit),
        });
    }

    /// Executes and drains all `BeforeGeneration` captures, in queue order.
    pub fn run_before(
        &mut self,
        text: &SourceText,
        sheet: &mut StyleSheetBuilder,
    ) -> Result<()> {
        let items = std::mem::take(&mut self.items);
        for item in items {
            match item.action {
                Action::Capture(op) => {
                    let value = render_capture(&op, text);
                    sheet.function(op.function).push_property(
                        op.group,
                        PropertyEntry {
                            attribute: op.attribute,
                            value_text: value,
                        },
                    )?;
                }
                edit => self.items.push(Manipulation { pass: item.pass, action: edit }),
            }
        }
        Ok(())
    }

    /// Applies all `AfterGeneration` edits back-to-front and returns the
    /// rewritten source.
    pub fn run_after(self, text: &SourceText) -> String {
        let mut edits: Vec<(usize, TextEdit)> = self
            .items
            .into_iter()
            .filter_map(|item| match item.action {
                Action::Edit(edit) => Some(edit),
                Action::Capture(_) => None,
            })
            .enumerate()
            .collect();
        // Later positions first. At one position, deletions run before
        // inserts so a removal never swallows freshly inserted text; equal
        // inserts keep queue order in the output (the later-applied edit
        // ends up in front).
        edits.sort_by(|(ia, a), (ib, b)| {
            b.lo.cmp(&a.lo).then(b.hi.cmp(&a.hi)).then(ib.cmp(ia))
        });

        let mut out = text.as_str().to_string();
        for (_, edit) in edits {
            let lo = text.offset(edit.lo);
            let hi = text.offset(edit.hi);
            debug_assert!(lo <= hi && hi <= out.len());
            out.replace_range(lo..hi, &edit.text);
        }
        out
    }
}

fn render_capture(op: &CaptureProperty, text: &SourceText) -> String {
    let base = text.offset(op.value_span.lo);
    let raw = text.slice(op.value_span);

    let mut rewrites: Vec<&(Span, String)> = op.rewrites.iter().collect();
    rewrites.sort_by_key(|(span, _)| span.lo);

    let mut out = String::new();
    let mut cursor = 0usize;
    for (span, replacement) in rewrites {
        let lo = text.offset(span.lo) - base;
        let hi = text.offset(span.hi) - base;
        if lo < cursor {
            continue;
        }
        out.push_str(&raw[cursor..lo]);
        out.push_str(replacement);
        cursor = hi;
    }
    out.push_str(&raw[cursor..]);

    let trimmed = out.trim();
    if trimmed.starts_with('"') || trimmed.starts_with('\'') || trimmed.starts_with('`') {
        return trimmed.to_string();
    }
    if op.strip_container && trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed[1..trimmed.len() - 1].trim().to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceText, BASE_POS};

    fn span(lo: u32, hi: u32) -> Span {
        Span::new(BytePos(lo + BASE_POS), BytePos(hi + BASE_POS))
    }

    #[test]
    fn edits_apply_back_to_front() {
        let text = SourceText::new("abcdef".to_string());
        let mut q = ManipulationQueue::default();
        q.edit(TextEdit::remove(span(1, 2)));
        q.edit(TextEdit::insert(BytePos(4 + BASE_POS), "X".into()));
        assert_eq!(q.run_after(&text), "acdXef");
    }

    #[test]
    fn deletion_at_an_insert_position_applies_first() {
        //                         0123456789012345678901
        let text = SourceText::new("<div className=\"x\" />".to_string());
        let mut q = ManipulationQueue::default();
        // removal queued during analysis, insert queued later during
        // generation, both starting right after the tag name
        q.edit(TextEdit::remove(span(4, 18)));
        q.edit(TextEdit::insert(
            BytePos(4 + BASE_POS),
            " {...styles[\"div\"]}".into(),
        ));
        assert_eq!(q.run_after(&text), "<div {...styles[\"div\"]} />");
    }

    #[test]
    fn equal_position_inserts_keep_queue_order() {
        let text = SourceText::new("ab".to_string());
        let mut q = ManipulationQueue::default();
        q.edit(TextEdit::insert(BytePos(1 + BASE_POS), "1".into()));
        q.edit(TextEdit::insert(BytePos(1 + BASE_POS), "2".into()));
        assert_eq!(q.run_after(&text), "a12b");
    }

    #[test]
    fn capture_strips_container_braces_and_applies_rewrites() {
        //                         0123456789012345678
        let text = SourceText::new("{cx(props.size)}".to_string());
        let op = CaptureProperty {
            function: 0,
            group: 0,
            attribute: "className".into(),
            value_span: span(0, 16),
            strip_container: true,
            rewrites: vec![(span(4, 14), "size".into())],
        };
        assert_eq!(render_capture(&op, &text), "cx(size)");
    }

    #[test]
    fn capture_keeps_quoted_values_verbatim() {
        let text = SourceText::new("\"card\"".to_string());
        let op = CaptureProperty {
            function: 0,
            group: 0,
            attribute: "className".into(),
            value_span: span(0, 6),
            strip_container: false,
            rewrites: vec![],
        };
        assert_eq!(render_capture(&op, &text), "\"card\"");
    }
}
