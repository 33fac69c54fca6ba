//! Version 3 wire form: `{ version, file?, sources, names, mappings }` where
//! `mappings` is `;`-separated generated lines of `,`-separated VLQ segments.
//!
//! Generated columns are delta-coded per line; source index, original line,
//! original column and name index are delta-coded across the whole string.

use crate::error::{MapError, Result};
use crate::map::{OriginalLocation, PositionMap, Segment};
use crate::vlq;
use serde::{Deserialize, Serialize};

pub const MAP_VERSION: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPositionMap {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl TryFrom<RawPositionMap> for PositionMap {
    type Error = MapError;

    fn try_from(raw: RawPositionMap) -> Result<Self> {
        if raw.version != MAP_VERSION {
            return Err(MapError::UnsupportedVersion(raw.version));
        }
        let lines = decode_mappings(&raw.mappings)?;
        Self::from_parts(raw.file, raw.sources, raw.names, lines)
    }
}

impl From<PositionMap> for RawPositionMap {
    fn from(map: PositionMap) -> Self {
        let (file, sources, names, lines) = map.into_parts();
        Self {
            version: MAP_VERSION,
            file,
            sources,
            names,
            mappings: encode_mappings(&lines),
        }
    }
}

impl PositionMap {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPositionMap = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&RawPositionMap::from(self.clone()))?)
    }
}

#[derive(Default)]
struct DecodeState {
    source: i64,
    line: i64,
    column: i64,
    name: i64,
}

/// Decode a `mappings` string into per-line segment lists.
pub fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>> {
    let mut lines = Vec::new();
    let mut state = DecodeState::default();

    for (line_idx, line) in mappings.split(';').enumerate() {
        let mut segments = Vec::new();
        let mut generated_column: i64 = 0;

        for raw in line.split(',').filter(|s| !s.is_empty()) {
            let bytes = raw.as_bytes();
            let mut pos = 0;
            let mut fields = [0_i64; 5];
            let mut count = 0;
            while pos < bytes.len() {
                if count == fields.len() {
                    return Err(MapError::invalid_mappings(
                        line_idx,
                        format!("segment '{raw}' has more than 5 fields"),
                    ));
                }
                fields[count] = vlq::decode(bytes, &mut pos)?;
                count += 1;
            }

            generated_column += fields[0];
            let column = non_negative(generated_column, line_idx, "generated column")?;

            let original = match count {
                1 => None,
                4 | 5 => {
                    state.source += fields[1];
                    state.line += fields[2];
                    state.column += fields[3];
                    let mut location = OriginalLocation::new(
                        non_negative(state.source, line_idx, "source index")?,
                        non_negative(state.line, line_idx, "original line")?,
                        non_negative(state.column, line_idx, "original column")?,
                    );
                    if count == 5 {
                        state.name += fields[4];
                        location.name_index = Some(non_negative(state.name, line_idx, "name index")?);
                    }
                    Some(location)
                }
                n => {
                    return Err(MapError::invalid_mappings(
                        line_idx,
                        format!("segment '{raw}' has {n} fields (expected 1, 4 or 5)"),
                    ))
                }
            };

            segments.push(Segment {
                generated_column: column,
                original,
            });
        }
        lines.push(segments);
    }

    Ok(lines)
}

fn non_negative(value: i64, line: usize, field: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| MapError::invalid_mappings(line, format!("{field} out of range: {value}")))
}

/// Encode per-line segment lists into a `mappings` string.
#[must_use]
pub fn encode_mappings(lines: &[Vec<Segment>]) -> String {
    let mut out = String::new();
    let mut state = DecodeState::default();

    for (line_idx, segments) in lines.iter().enumerate() {
        if line_idx > 0 {
            out.push(';');
        }
        let mut prev_column: i64 = 0;
        for (seg_idx, segment) in segments.iter().enumerate() {
            if seg_idx > 0 {
                out.push(',');
            }
            let column = i64::from(segment.generated_column);
            vlq::encode(column - prev_column, &mut out);
            prev_column = column;

            let Some(original) = segment.original else {
                continue;
            };
            let source = i64::from(original.source_index);
            let line = i64::from(original.line);
            let col = i64::from(original.column);
            vlq::encode(source - state.source, &mut out);
            vlq::encode(line - state.line, &mut out);
            vlq::encode(col - state.column, &mut out);
            state.source = source;
            state.line = line;
            state.column = col;
            if let Some(name) = original.name_index {
                let name = i64::from(name);
                vlq::encode(name - state.name, &mut out);
                state.name = name;
            }
        }
    }

    out
}
