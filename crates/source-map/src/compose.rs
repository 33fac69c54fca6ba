//! Cascade of position maps across successive transformation stages.

use crate::map::{MapBuilder, OriginalLocation, PositionMap};

/// Compose `outer` (C → B) with `inner` (B → A) into a map from C straight to A.
///
/// Every outer segment is resolved through `inner` with nearest-match semantics.
/// A lookup that finds no enclosing segment produces an unmapped segment. The
/// result carries `inner`'s sources; names come from `inner` when it has one for
/// the location, otherwise from `outer`.
///
/// Redundant segments are dropped: within a generated line, a segment resolving
/// to the same location and name as its predecessor adds nothing to lookups, and
/// unmapped segments at the start of a line are equivalent to having none.
#[must_use]
pub fn compose(outer: &PositionMap, inner: &PositionMap) -> PositionMap {
    let mut builder = MapBuilder::with_sources(inner.sources());
    if let Some(file) = outer.file().or(inner.file()) {
        builder = builder.file(file);
    }

    let mut dropped = 0usize;
    for (line_idx, segments) in outer.lines().iter().enumerate() {
        let mut previous: Option<(OriginalLocation, Option<&str>)> = None;
        for segment in segments {
            let resolved = segment.original.and_then(|via| {
                let target = inner.lookup(via.line, via.column)?;
                let name = target.name_index.and_then(|idx| inner.name(idx));
                Some((target, name))
            });

            if same_target(resolved, previous) {
                dropped += 1;
                continue;
            }
            previous = resolved;

            let original = resolved.map(|(target, name)| {
                let mut location = OriginalLocation::new(target.source_index, target.line, target.column);
                location.name_index = name.map(|name| builder.add_name(name));
                location
            });
            builder.add_mapping(line_idx as u32, segment.generated_column, original);
        }
    }

    let composed = builder.build();
    log::debug!(
        "Composed position maps: {} outer segments -> {} ({} redundant)",
        outer.segment_count(),
        composed.segment_count(),
        dropped
    );
    composed
}

fn same_target(
    current: Option<(OriginalLocation, Option<&str>)>,
    previous: Option<(OriginalLocation, Option<&str>)>,
) -> bool {
    match (current, previous) {
        (None, None) => true,
        (Some((a, a_name)), Some((b, b_name))) => {
            a.source_index == b.source_index
                && a.line == b.line
                && a.column == b.column
                && a_name == b_name
        }
        _ => false,
    }
}

/// Collapse a cascade of stage maps, ordered outermost (last stage) first, into
/// one map from the last stage to the original file.
#[must_use]
pub fn compose_chain(stages: &[PositionMap]) -> Option<PositionMap> {
    let (first, rest) = stages.split_first()?;
    Some(
        rest.iter()
            .fold(first.clone(), |acc, inner| compose(&acc, inner)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_protocol::Position;
    use pretty_assertions::assert_eq;

    fn render_map() -> PositionMap {
        // original: "a=f(b)" ; rendered: "a = f(b);" over two lines
        let mut builder = MapBuilder::new().file("out.js");
        let src = builder.add_source("in.min.js");
        let a = builder.add_name("a");
        let f = builder.add_name("f");
        builder.add_mapping(0, 0, Some(OriginalLocation::new(src, 0, 0).with_name(a)));
        builder.add_mapping(0, 2, Some(OriginalLocation::new(src, 0, 1)));
        builder.add_mapping(0, 4, Some(OriginalLocation::new(src, 0, 2).with_name(f)));
        builder.add_mapping(0, 5, Some(OriginalLocation::new(src, 0, 3)));
        builder.add_mapping(1, 2, Some(OriginalLocation::new(src, 0, 4)));
        builder.build()
    }

    #[test]
    fn composes_through_nearest_segment() {
        let mut outer = MapBuilder::new();
        let src = outer.add_source("stage1.js");
        outer.add_mapping(0, 0, Some(OriginalLocation::new(src, 0, 5)));
        outer.add_mapping(0, 3, Some(OriginalLocation::new(src, 1, 3)));
        outer.add_mapping(0, 7, Some(OriginalLocation::new(src, 9, 0)));
        let composed = compose(&outer.build(), &render_map());

        assert_eq!(composed.sources(), &["in.min.js".to_string()]);
        let first = composed.resolve(Position::new(1, 1)).unwrap();
        assert_eq!((first.line, first.column), (1, 3));
        let second = composed.resolve(Position::new(1, 4)).unwrap();
        assert_eq!((second.line, second.column), (1, 4));
        assert_eq!(composed.resolve(Position::new(1, 8)), None);
    }

    #[test]
    fn identity_outer_reproduces_inner() {
        let rendered = "a = f(b);\n  x\n";
        let identity = PositionMap::identity(rendered, "out.js");
        let inner = render_map();
        assert_eq!(compose(&identity, &inner), inner);
    }

    #[test]
    fn names_come_from_the_inner_map() {
        let mut outer = MapBuilder::new();
        let src = outer.add_source("stage1.js");
        let name = outer.add_name("renamed");
        outer.add_mapping(0, 0, Some(OriginalLocation::new(src, 0, 2).with_name(name)));
        outer.add_mapping(0, 8, Some(OriginalLocation::new(src, 0, 0).with_name(name)));
        let composed = compose(&outer.build(), &render_map());

        let unnamed = composed.resolve(Position::new(1, 0)).unwrap();
        assert_eq!(unnamed.column, 1);
        assert_eq!(unnamed.name, None);
        let from_inner = composed.resolve(Position::new(1, 8)).unwrap();
        assert_eq!(from_inner.name.as_deref(), Some("a"));
    }

    #[test]
    fn chain_of_one_is_itself_and_empty_is_none() {
        assert!(compose_chain(&[]).is_none());
        let inner = render_map();
        assert_eq!(compose_chain(std::slice::from_ref(&inner)), Some(inner));
    }
}
