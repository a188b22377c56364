use stylelift::{extract_component, Extraction, ModulePaths, RECOGNITION};

fn paths() -> ModulePaths {
    ModulePaths {
        source: "src/card.tsx".into(),
        generated: "src/card.styles.ts".into(),
    }
}

fn run(src: &str) -> Extraction {
    extract_component(src, &paths(), &RECOGNITION)
        .unwrap()
        .expect("extraction produced output")
}

#[test]
fn card_component_end_to_end() {
    let src = "\
import cx from \"classnames\";

interface CardProps { size?: string; }

function Card({ size }: CardProps) {
  return <div className={cx(\"card\", size)} />;
}
";
    let out = run(src);

    assert!(out.module.contains("import cx from \"classnames\";"));
    assert!(out.module.contains("export interface CardProps {\n  size?: string;\n}"));
    assert!(out
        .module
        .contains("getCardStyles({ size }: CardProps = {}) {"));
    assert!(out.module.contains("className: cx(\"card\", size),"));

    assert!(out
        .rewritten
        .contains("import { styling } from \"./card.styles\";"));
    assert!(out
        .rewritten
        .contains("const styles = styling.getCardStyles({ size });"));
    assert!(out.rewritten.contains("<div {...styles[\"div\"]} />"));
    assert!(!out.rewritten.contains("className="));
    // cx is no longer referenced by the rewritten component
    assert!(!out.rewritten.contains("classnames"));
    assert!(out.skipped.is_empty());
}

#[test]
fn member_access_through_props_object() {
    let src = "\
function Card(props: { size: string }) {
  return <div className={props.size} />;
}
";
    let out = run(src);
    assert!(out.module.contains("  size: string;\n"));
    // required parameter: no object-literal default
    assert!(out.module.contains("getCardStyles({ size }: CardProps) {"));
    assert!(out
        .rewritten
        .contains("const styles = styling.getCardStyles({ size: props.size });"));
    assert!(out.module.contains("className: size,"));
}

#[test]
fn second_run_is_a_no_op() {
    let src = "\
function Card() {
  return <div className=\"card\" />;
}
";
    let out = run(src);
    let again = extract_component(&out.rewritten, &paths(), &RECOGNITION).unwrap();
    assert!(again.is_none());
}

#[test]
fn same_tag_groups_get_numeric_suffixes() {
    let src = "\
function Card() {
  return (
    <section>
      <div className=\"a\" />
      <div className=\"b\" />
    </section>
  );
}
";
    let out = run(src);
    assert!(out.module.contains("\"div\": {"));
    assert!(out.module.contains("\"div2\": {"));
    assert!(out.rewritten.contains("{...styles[\"div\"]}"));
    assert!(out.rewritten.contains("{...styles[\"div2\"]}"));
}

#[test]
fn concise_arrow_body_becomes_block() {
    let src = "const Card = () => <div className=\"x\" />;\n";
    let out = run(src);
    assert!(out
        .rewritten
        .contains("{ const styles = styling.getCardStyles(); return ("));
    assert!(out.rewritten.contains("<div {...styles[\"div\"]} />); };"));
}

#[test]
fn module_variable_is_hoisted_out_of_the_source() {
    let src = "\
const tones = \"card-tones\";

function Card() {
  return <div className={tones} />;
}
";
    let out = run(src);
    assert!(out.module.contains("const tones = \"card-tones\";"));
    assert!(!out.module.contains("export const tones"));
    assert!(out.module.contains("className: tones,"));
    assert!(!out.rewritten.contains("card-tones"));
    assert!(out
        .rewritten
        .contains("import { styling } from \"./card.styles\";"));
}

#[test]
fn shared_module_variable_is_hoisted_with_export_and_imported_back() {
    let src = "\
const pad = \"p-4\";

function Card() {
  const also = pad;
  return <div className={pad} data-copy={also} />;
}
";
    let out = run(src);
    assert!(out.module.contains("export const pad = \"p-4\";"));
    assert!(out
        .rewritten
        .contains("import { styling, pad } from \"./card.styles\";"));
    assert!(out.rewritten.contains("const also = pad;"));
}

#[test]
fn group_keys_follow_labeled_ancestors_and_skip_wrappers() {
    let src = "\
const color = \"red\";

function Card() {
  return (
    <section>
      <div id=\"body\">
        <LayoutWrapper>
          <span style={{ color }} />
        </LayoutWrapper>
      </div>
    </section>
  );
}
";
    let out = run(src);
    assert!(out.module.contains("\"body.span\": {"));
    assert!(out.module.contains("style: { color },"));
    assert!(out.rewritten.contains("{...styles[\"body.span\"]}"));
}

#[test]
fn same_file_type_reference_is_exported_for_the_generated_module() {
    let src = "\
interface CardProps { size: string; tone: string; }

function Card({ size, ...rest }: CardProps) {
  return <div className={cx(size, rest)} />;
}
";
    let out = run(src);
    assert!(out.module.contains("import { CardProps } from \"./card\";"));
    assert!(out
        .rewritten
        .contains("export interface CardProps { size: string; tone: string; }"));
}

#[test]
fn already_exported_type_reference_is_left_alone() {
    let src = "\
export interface CardProps { size: string; tone: string; }

function Card({ size, ...rest }: CardProps) {
  return <div className={cx(size, rest)} />;
}
";
    let out = run(src);
    assert!(out.module.contains("import { CardProps } from \"./card\";"));
    assert!(!out.rewritten.contains("export export"));
}

#[test]
fn unnamed_root_skips_element_but_not_file() {
    let src = "\
function Card() {
  return <div className=\"ok\" />;
}

export const anon = [1].map(() => <li className=\"lost\" />);
";
    let out = run(src);
    assert_eq!(out.skipped.len(), 1);
    assert!(out.module.contains("className: \"ok\","));
    assert!(!out.module.contains("lost"));
    assert!(out.rewritten.contains("className=\"lost\""));
}

#[test]
fn union_types_render_joined_and_optional() {
    let src = "\
function Card({ tone }: { tone?: \"red\" | \"blue\" }) {
  return <div className={tone} />;
}
";
    let out = run(src);
    assert!(out.module.contains("tone?: \"red\" | \"blue\";"));
}

#[test]
fn variant_helper_parameters_use_the_variant_utility() {
    let src = "\
import { tv } from \"tailwind-variants\";

const button = tv({ variants: { size: { sm: \"text-sm\" } } });

function Card({ size }: { size: string }) {
  return <div className={button({ size })} />;
}
";
    let out = run(src);
    assert!(out
        .module
        .contains("import { tv, VariantProps } from \"tailwind-variants\";"));
    assert!(out
        .module
        .contains("size?: VariantProps<typeof button>[\"size\"];"));
    assert!(out.module.contains("const button = tv("));
}

#[test]
fn context_parameter_typed_from_create_context() {
    let src = "\
import { createContext, useContext } from \"react\";

const ThemeContext = createContext<\"light\" | \"dark\">(\"light\");

function Card() {
  const theme = useContext(ThemeContext);
  return <div className={theme} />;
}
";
    let out = run(src);
    assert!(out.module.contains("theme: \"light\" | \"dark\";"));
    assert!(out
        .rewritten
        .contains("const styles = styling.getCardStyles({ theme });"));
}
