use crate::error::{Result, SearchError};
use crate::options::SearchOptions;
use lens_protocol::{ContextLine, OriginalPosition, Position, SearchMatch, SearchResults};
use lens_source_map::{LineIndex, PositionMap};
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};

/// Search `text` line by line.
///
/// Only the first occurrence on a line is reported, and `total_matches` counts
/// matching lines. Scanning continues past `max_matches` to keep counting
/// until the text is exhausted or the time budget runs out. With a `map`,
/// each match carries the original position of its match column.
pub fn search(text: &str, map: Option<&PositionMap>, options: &SearchOptions) -> Result<SearchResults> {
    options.validate().map_err(SearchError::InvalidOptions)?;
    if options.pattern.is_empty() {
        return Err(SearchError::EmptyPattern);
    }
    if options.require_map && map.is_none() {
        return Err(SearchError::MapUnavailable);
    }

    let regex = build_regex(options)?;
    let index = LineIndex::new(text);
    let started = Instant::now();
    let budget = (options.timeout_ms > 0).then(|| Duration::from_millis(options.timeout_ms));

    let mut matches = Vec::new();
    let mut total_matches = 0usize;
    let mut timed_out = false;
    let mut last_line = 0usize;
    let mut pos = 0usize;

    while pos <= text.len() {
        if budget.is_some_and(|budget| started.elapsed() >= budget) {
            timed_out = true;
            break;
        }
        let Some(found) = regex.find_at(text, pos) else {
            break;
        };

        let line = index.line_of_offset(found.start());
        if line != last_line {
            last_line = line;
            total_matches += 1;
            if matches.len() < options.max_matches {
                matches.push(materialize(text, &index, map, line, found.start(), options));
            }
        }

        let Some(next_line) = index.line_start(line + 1) else {
            break;
        };
        pos = next_line.max(found.end());
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    if timed_out {
        log::info!(
            "Search for '{}' stopped after {elapsed_ms}ms with {total_matches} matching line(s)",
            options.pattern
        );
    } else {
        log::debug!(
            "Search for '{}' found {total_matches} matching line(s) in {elapsed_ms}ms",
            options.pattern
        );
    }

    Ok(SearchResults {
        truncated: total_matches > matches.len(),
        matches,
        total_matches,
        timed_out,
        elapsed_ms,
    })
}

fn build_regex(options: &SearchOptions) -> Result<Regex> {
    let pattern = if options.is_regex {
        options.pattern.clone()
    } else {
        regex::escape(&options.pattern)
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()
        .map_err(|err| SearchError::invalid_pattern(&options.pattern, err))
}

fn materialize(
    text: &str,
    index: &LineIndex,
    map: Option<&PositionMap>,
    line: usize,
    offset: usize,
    options: &SearchOptions,
) -> SearchMatch {
    let line_start = index.line_start(line).unwrap_or(0);
    let column = to_u32(offset - line_start);
    let before = line.saturating_sub(options.context_lines).max(1)..line;
    let after = line + 1..(line + options.context_lines).min(index.line_count()) + 1;

    SearchMatch {
        line: to_u32(line),
        column,
        content: index.line_text(text, line).unwrap_or_default().to_string(),
        context_before: context(text, index, before),
        context_after: context(text, index, after),
        original: map.and_then(|map| resolve(map, to_u32(line), column)),
    }
}

fn context(text: &str, index: &LineIndex, lines: std::ops::Range<usize>) -> Vec<ContextLine> {
    lines
        .filter_map(|line| {
            index.line_text(text, line).map(|content| ContextLine {
                line: to_u32(line),
                content: content.to_string(),
            })
        })
        .collect()
}

fn resolve(map: &PositionMap, line: u32, column: u32) -> Option<OriginalPosition> {
    map.resolve(Position::new(line, column))
        .or_else(|| map.resolve_line(line))
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_protocol::SearchTruncation;
    use pretty_assertions::assert_eq;

    const TEXT: &str = "line one\nline two\nthree\nfour\nreturn Decrypt(x);\nsix\n";

    #[test]
    fn finds_case_insensitive_literal() {
        let results = search(TEXT, None, &SearchOptions::new("decrypt")).unwrap();
        assert_eq!(results.total_matches, 1);
        let hit = &results.matches[0];
        assert_eq!((hit.line, hit.column), (5, 7));
        assert_eq!(hit.content, "return Decrypt(x);");
        assert!(hit.original.is_none());
    }

    #[test]
    fn case_sensitive_search_misses_other_case() {
        let options = SearchOptions::new("decrypt").case_sensitive();
        assert_eq!(search(TEXT, None, &options).unwrap().total_matches, 0);
    }

    #[test]
    fn literal_patterns_are_escaped() {
        let results = search(TEXT, None, &SearchOptions::new("Decrypt(x)")).unwrap();
        assert_eq!(results.total_matches, 1);
    }

    #[test]
    fn reports_one_match_per_line() {
        let results = search(TEXT, None, &SearchOptions::new("line")).unwrap();
        assert_eq!(results.total_matches, 2);
        assert_eq!(results.matches[0].line, 1);
        assert_eq!(results.matches[1].line, 2);

        let results = search("aaa\n", None, &SearchOptions::new("a")).unwrap();
        assert_eq!(results.total_matches, 1);
    }

    #[test]
    fn context_is_clamped_to_the_buffer() {
        let options = SearchOptions::new("line one").with_context(2);
        let hit = &search(TEXT, None, &options).unwrap().matches[0];
        assert!(hit.context_before.is_empty());
        let after: Vec<u32> = hit.context_after.iter().map(|c| c.line).collect();
        assert_eq!(after, vec![2, 3]);

        let options = SearchOptions::new("six").with_context(3);
        let hit = &search(TEXT, None, &options).unwrap().matches[0];
        let before: Vec<u32> = hit.context_before.iter().map(|c| c.line).collect();
        assert_eq!(before, vec![3, 4, 5]);
        let after: Vec<&str> = hit.context_after.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(after, vec![""]);
    }

    #[test]
    fn caps_materialized_matches_but_keeps_counting() {
        let text = "x\n".repeat(10);
        let options = SearchOptions::new("x").with_max_matches(3);
        let results = search(&text, None, &options).unwrap();
        assert_eq!(results.matches.len(), 3);
        assert_eq!(results.total_matches, 10);
        assert!(results.truncated);
        assert!(!results.timed_out);
    }

    #[test]
    fn invalid_regex_names_the_pattern() {
        let err = search(TEXT, None, &SearchOptions::new("(unclosed").regex()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(matches!(
            search(TEXT, None, &SearchOptions::default()),
            Err(SearchError::EmptyPattern)
        ));
    }

    #[test]
    fn required_map_must_be_present() {
        let options = SearchOptions {
            require_map: true,
            ..SearchOptions::new("four")
        };
        assert!(matches!(
            search(TEXT, None, &options),
            Err(SearchError::MapUnavailable)
        ));
    }

    #[test]
    fn matches_resolve_through_the_map() {
        let map = PositionMap::identity(TEXT, "app.min.js");
        let results = search(TEXT, Some(&map), &SearchOptions::new("x")).unwrap();
        let original = results.matches[0].original.clone().unwrap();
        assert_eq!(original.source, "app.min.js");
        assert_eq!((original.line, original.column), (5, 15));
    }

    #[test]
    fn spent_time_budget_stops_the_scan_softly() {
        let text = "needle in a haystack\n".repeat(500_000);
        let options = SearchOptions {
            timeout_ms: 1,
            ..SearchOptions::new("needle").with_max_matches(5)
        };
        let results = search(&text, None, &options).unwrap();

        assert!(results.timed_out);
        assert!(results.total_matches < 500_000);
        assert_eq!(results.matches.len(), results.total_matches.min(5));
        assert_eq!(results.truncated, results.total_matches > 5);
        assert_eq!(results.truncation(), Some(SearchTruncation::Timeout));
    }

    #[test]
    fn zero_timeout_scans_everything() {
        let text = "needle\n".repeat(2_000);
        let options = SearchOptions {
            timeout_ms: 0,
            ..SearchOptions::new("needle").with_max_matches(5)
        };
        let results = search(&text, None, &options).unwrap();
        assert!(!results.timed_out);
        assert_eq!(results.total_matches, 2_000);
        assert_eq!(results.truncation(), Some(SearchTruncation::MaxMatches));
    }

    #[test]
    fn regex_anchors_apply_per_line() {
        let options = SearchOptions::new("^f").regex();
        let results = search(TEXT, None, &options).unwrap();
        assert_eq!(results.total_matches, 1);
        assert_eq!(results.matches[0].line, 4);
    }
}
