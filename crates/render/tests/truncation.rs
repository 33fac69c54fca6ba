use lens_code_printer::Language;
use lens_render::{truncate_literals, TruncateOptions};
use lens_source_map::count_lines;
use proptest::prelude::*;

fn newlines(text: &str) -> usize {
    text.matches('\n').count()
}

#[test]
fn three_hundred_char_literal_is_shortened_in_place() {
    let literal = format!("'{}'", "z".repeat(298));
    let text = format!("const banner = {literal};\nuse(banner);\n");
    let out = truncate_literals(&text, Language::JavaScript, &TruncateOptions::new(200, 50));

    assert!(out.contains("[truncated 300 chars]"));
    assert_eq!(newlines(&out), newlines(&text));
    assert!(out.len() < text.len());
    assert!(out.starts_with(&format!("const banner = '{}", "z".repeat(49))));
    assert!(out.ends_with(&format!("{}';\nuse(banner);\n", "z".repeat(49))));
}

#[test]
fn multiline_template_keeps_following_code_on_its_line() {
    let body: String = (0..40).map(|i| format!("row {i:02}\n")).collect();
    let text = format!("const t = `{body}`;\nconst after = 1;\n");
    let out = truncate_literals(&text, Language::TypeScript, &TruncateOptions::new(50, 10));

    let original_line = text.lines().position(|l| l == "const after = 1;");
    let truncated_line = out.lines().position(|l| l == "const after = 1;");
    assert_eq!(original_line, truncated_line);
}

#[test]
fn unparseable_text_is_returned_unchanged() {
    let text = "x = \"unterminated";
    let out = truncate_literals(text, Language::Unknown, &TruncateOptions::new(1, 1));
    assert_eq!(out, text);
}

proptest! {
    #[test]
    fn truncation_never_changes_line_count(
        string_body in "[a-z0-9 \\\\]{0,300}",
        template_body in "[a-z \\n${}]{0,300}",
        char_limit in 1usize..80,
        preview_len in 1usize..40,
    ) {
        let text = format!("a = \"{string_body}\";\nb = `{template_body}`;\nc();\n");
        let options = TruncateOptions::new(char_limit, preview_len);
        let out = truncate_literals(&text, Language::JavaScript, &options);
        prop_assert_eq!(count_lines(&out), count_lines(&text));
    }

    #[test]
    fn truncation_is_deterministic(
        body in "[a-z\\n]{0,200}",
        char_limit in 1usize..60,
        preview_len in 1usize..30,
    ) {
        let text = format!("f(`{body}`, '{body}');\n");
        let options = TruncateOptions::new(char_limit, preview_len);
        prop_assert_eq!(
            truncate_literals(&text, Language::JavaScript, &options),
            truncate_literals(&text, Language::JavaScript, &options)
        );
    }
}
