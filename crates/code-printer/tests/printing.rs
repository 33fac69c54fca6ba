use lens_code_printer::{CodePrinter, Language, PrinterConfig, PrinterError};
use lens_source_map::LineIndex;
use pretty_assertions::assert_eq;

const FIXTURES: &[(&str, Language)] = &[
    (
        "!function(e,t){var n={};function r(o){if(n[o])return n[o].exports;var i=n[o]={i:o,l:!1,exports:{}};return e[o].call(i.exports,i,i.exports,r),i.l=!0,i.exports}r.m=e}([]);",
        Language::JavaScript,
    ),
    (
        "class A extends B{constructor(x){super(x);this.y=x??0}get z(){return`v=${this.y}`}static #p=1}",
        Language::JavaScript,
    ),
    (
        "const el=<div className=\"c\">{items.map(i=><span key={i}>{i}</span>)}</div>;",
        Language::JavaScript,
    ),
    (
        "interface P{a:number;b?:string}function f<T>(x:T):T{return x as T}type U=A|B;",
        Language::TypeScript,
    ),
    (
        "do{i--}while(i>0);switch(k){case 1:a();break;default:b()}",
        Language::JavaScript,
    ),
];

fn non_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn printing_only_changes_whitespace() {
    let printer = CodePrinter::default();
    for (source, language) in FIXTURES {
        let printed = printer.format(source, *language, "in.js").unwrap();
        assert_eq!(non_whitespace(&printed.text), non_whitespace(source));
        assert!(printed.text.ends_with('\n'));
    }
}

#[test]
fn every_segment_points_at_the_same_character() {
    let printer = CodePrinter::default();
    for (source, language) in FIXTURES {
        let printed = printer.format(source, *language, "in.js").unwrap();
        let printed_index = LineIndex::new(&printed.text);
        let source_index = LineIndex::new(source);

        for (line_idx, segments) in printed.map.lines().iter().enumerate() {
            for segment in segments {
                let original = segment.original.unwrap();
                let generated_line = printed_index
                    .line_text(&printed.text, line_idx + 1)
                    .unwrap();
                let original_line = source_index
                    .line_text(source, original.line as usize + 1)
                    .unwrap();
                let generated = &generated_line[segment.generated_column as usize..];
                let expected = &original_line[original.column as usize..];
                assert_eq!(
                    generated.chars().next(),
                    expected.chars().next(),
                    "segment {}:{} in {source}",
                    line_idx + 1,
                    segment.generated_column
                );
            }
        }
    }
}

#[test]
fn printing_is_idempotent_on_its_own_output() {
    let printer = CodePrinter::default();
    for (source, language) in FIXTURES {
        let once = printer.format(source, *language, "in.js").unwrap();
        let twice = printer.format(&once.text, *language, "in.js").unwrap();
        assert_eq!(twice.text, once.text);
    }
}

#[test]
fn identifiers_carry_names() {
    let printed = CodePrinter::default()
        .format("function decrypt(k){return k^42}", Language::JavaScript, "in.js")
        .unwrap();
    assert!(printed.map.names().iter().any(|n| n == "decrypt"));
    assert!(printed.map.names().iter().any(|n| n == "k"));
}

#[test]
fn recoverable_errors_still_print() {
    let printed = CodePrinter::default()
        .format("let a=1;let b=;let c=3;", Language::JavaScript, "in.js")
        .unwrap();
    assert!(printed.text.contains("let c = 3"));
}

#[test]
fn strict_config_rejects_broken_input() {
    let printer = CodePrinter::new(PrinterConfig::strict()).unwrap();
    let err = printer
        .format("let a=1;let b=;", Language::JavaScript, "in.js")
        .unwrap_err();
    assert!(matches!(err, PrinterError::ParseError(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let config = PrinterConfig {
        indent_width: 0,
        ..Default::default()
    };
    assert!(matches!(
        CodePrinter::new(config),
        Err(PrinterError::InvalidConfig(_))
    ));
}
