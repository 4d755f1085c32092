//! End-to-end rendering tests: file inputs in, markdown out.

use diffbrief_core::markdown::render;
use diffbrief_core::review::FileBody;
use diffbrief_core::types::{Annotation, FileStatus, Side};
use diffbrief_core::{build_review, EngineConfig, FileInput};
use pretty_assertions::assert_eq;

fn numbered(n: usize) -> String {
    (1..=n).map(|i| format!("line {i}\n")).collect()
}

fn note(id: &str, line: u32, side: Side, text: &str) -> Annotation {
    Annotation {
        id: id.into(),
        start_line: line,
        end_line: line,
        side,
        text: text.into(),
        line_content: String::new(),
        line_contents: Vec::new(),
    }
}

fn file(path: &str, old: &str, new: &str, annotations: Vec<Annotation>) -> FileInput {
    FileInput {
        path: path.into(),
        status: FileStatus::Modified,
        staged: false,
        language: diffbrief_core::text::detect_language(path).into(),
        old_content: old.into(),
        new_content: new.into(),
        annotations,
        general_comment: None,
    }
}

#[test]
fn incremental_change_renders_hunk_comments_and_other_comments() {
    let old = numbered(10);
    let new = old.replace("line 5\n", "line five\n");
    let mut input = file(
        "src/app.ts",
        &old,
        &new,
        vec![
            note("b", 10, Side::New, "Trailing line?"),
            note("a", 5, Side::New, "Use a constant."),
        ],
    );
    input.general_comment = Some("Check naming.".into());

    let context = build_review(
        &[input],
        Some("Fix the naming issues.".into()),
        &EngineConfig::default(),
    );
    let expected = r#"# Review Context

## Summary

1 file(s) changed, 3 comment(s).

| File | Status | Stage | Comments | Language |
|------|--------|-------|----------|----------|
| `src/app.ts` | Modified | Unstaged | 3 | typescript |

## Focus

Fix the naming issues.

## `src/app.ts`

**Stage:** Unstaged | **Language:** typescript | **Lines:** 10 → 10 (+0)

> **File comment:** Check naming.

### Changes

```
@@ -2,7 +2,7 @@
2   line 2
3   line 3
4   line 4
  - line 5
5 + line five
6   line 6
7   line 7
8   line 8
```

**Line 5** (new):

> Use a constant.

#### Other Comments

**Line 10** (new):

```typescript
  8 | line 8
  9 | line 9
>10 | line 10
```

> Trailing line?

"#;
    assert_eq!(render(&context), expected);
}

#[test]
fn rendering_is_byte_identical_across_runs() {
    let old = numbered(40);
    let new = old.replace("line 7\n", "line seven\n").replace("line 33\n", "");
    let inputs = vec![file(
        "lib.rs",
        &old,
        &new,
        vec![note("x", 33, Side::Old, "why drop this?"), note("y", 1, Side::New, "header")],
    )];
    let config = EngineConfig::default();
    let first = render(&build_review(&inputs, None, &config));
    let second = render(&build_review(&inputs, None, &config));
    assert_eq!(first, second);
}

#[test]
fn rewrite_lists_declaration_churn_and_keeps_comments() {
    let old = "function foo() {\n  return 1;\n}\n";
    let new = "function bar() {\n  return 2;\n}\nexport class Widget {}\n";
    let input = file("src/widget.ts", old, new, vec![note("c", 4, Side::New, "Needs docs.")]);
    let context = build_review(&[input], None, &EngineConfig::default());
    assert!(matches!(context.sections[0].body, FileBody::Rewrite { .. }));

    let md = render(&context);
    assert!(md.contains("### Major Rewrite"));
    assert!(md.contains("- Removed function `foo`\n- Added function `bar`\n- Added class `Widget`\n"));
    assert!(md.contains("**New content:**"));
    assert!(md.contains(">4 | export class Widget {}"));
    assert!(md.contains("> Needs docs."));
}

#[test]
fn new_file_preview_is_truncated_past_one_hundred_lines() {
    let mut input = file("notes.txt", "", &numbered(150), vec![]);
    input.status = FileStatus::Added;
    let md = render(&build_review(&[input], None, &EngineConfig::default()));
    assert!(md.contains("### New File"));
    assert!(md.contains("**Content** (first 50 of 150 lines):"));
    assert!(md.contains("line 50\n```"));
    assert!(!md.contains("line 51\n"));
    assert!(md.contains("_… 100 more lines not shown._"));
}

#[test]
fn every_annotation_is_rendered_exactly_once() {
    let old = numbered(60);
    let new = old
        .replace("line 10\n", "line ten\n")
        .replace("line 50\n", "line fifty\n");
    let annotations: Vec<Annotation> = [(10, Side::New), (11, Side::Old), (30, Side::New), (50, Side::Old), (59, Side::New)]
        .into_iter()
        .enumerate()
        .map(|(i, (line, side))| note(&i.to_string(), line, side, &format!("marker-{i}")))
        .collect();
    let md = render(&build_review(&[file("a.go", &old, &new, annotations)], None, &EngineConfig::default()));
    for i in 0..5 {
        assert_eq!(md.matches(&format!("> marker-{i}\n")).count(), 1, "marker-{i}");
    }
}

#[test]
fn degraded_and_empty_exports_say_so() {
    let config = EngineConfig { max_lines: 5, ..EngineConfig::default() };
    let old = numbered(8);
    let new = old.replace("line 2\n", "line two\n");
    let md = render(&build_review(&[file("big.py", &old, &new, vec![])], None, &config));
    assert!(md.contains("_Diff too large to display (8 → 8 lines)._"));

    let empty = render(&build_review(&[], None, &config));
    assert_eq!(empty, "# Review Context\n\n## Summary\n\n_No changes to review._\n\n");
}

#[test]
fn backticks_in_paths_keep_code_spans_intact() {
    let old = numbered(8);
    let new = old.replace("line 4\n", "line four\n");
    let context = build_review(
        &[file("docs/a`b|c.md", &old, &new, Vec::new())],
        None,
        &EngineConfig::default(),
    );
    let md = render(&context);
    assert!(md.contains("| ``docs/a`b\\|c.md`` | Modified |"), "{md}");
    assert!(md.contains("\n## ``docs/a`b|c.md``\n"), "{md}");
}
