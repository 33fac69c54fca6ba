use lens_code_printer::{CodePrinter, Language};
use lens_protocol::SearchMatch;
use lens_search::{search, SearchOptions};
use lens_source_map::{MapBuilder, OriginalLocation};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn hits_in_rendered_code_resolve_to_the_minified_line() {
    let minified = "var a=1;function check(k){return Decrypt(k)}\nvar b=check(a);";
    let printed = CodePrinter::default()
        .format(minified, Language::JavaScript, "bundle.min.js")
        .unwrap();

    let results = search(&printed.text, Some(&printed.map), &SearchOptions::new("decrypt")).unwrap();
    assert_eq!(results.total_matches, 1);

    let hit = &results.matches[0];
    assert_eq!(hit.content.trim(), "return Decrypt(k)");
    let original = hit.original.clone().unwrap();
    assert_eq!(original.source, "bundle.min.js");
    assert_eq!((original.line, original.column), (1, 33));
    assert_eq!(original.name.as_deref(), Some("Decrypt"));
}

#[test]
fn columns_before_the_first_segment_use_the_line_mapping() {
    let mut builder = MapBuilder::new();
    let source = builder.add_source("a.js");
    builder.add_mapping(0, 4, Some(OriginalLocation::new(source, 0, 10)));
    let map = builder.build();

    let text = "alpha\nbeta\n";
    let results = search(text, Some(&map), &SearchOptions::new("al")).unwrap();
    let original = results.matches[0].original.clone().unwrap();
    assert_eq!((original.line, original.column), (1, 10));

    let results = search(text, Some(&map), &SearchOptions::new("beta")).unwrap();
    assert_eq!(results.matches[0].original, None);
}

fn lines_of(matches: &[SearchMatch]) -> Vec<u32> {
    matches.iter().map(|m| m.line).collect()
}

proptest! {
    #[test]
    fn matches_are_capped_and_lines_are_unique(
        lines in proptest::collection::vec("[ab ]{0,12}", 0..40),
        max_matches in 1usize..10,
    ) {
        let text = lines.join("\n");
        let options = SearchOptions::new("a").with_max_matches(max_matches);
        let results = search(&text, None, &options).unwrap();

        let expected_total = lines.iter().filter(|line| line.contains('a')).count();
        prop_assert_eq!(results.total_matches, expected_total);
        prop_assert_eq!(results.matches.len(), expected_total.min(max_matches));
        prop_assert_eq!(results.truncated, expected_total > max_matches);

        let reported = lines_of(&results.matches);
        let mut unique = reported.clone();
        unique.dedup();
        prop_assert_eq!(&reported, &unique);
        prop_assert!(reported.windows(2).all(|pair| pair[0] < pair[1]));

        for hit in &results.matches {
            let line = &lines[hit.line as usize - 1];
            prop_assert_eq!(&hit.content, line);
            prop_assert_eq!(line.find('a'), Some(hit.column as usize));
        }
    }
}
