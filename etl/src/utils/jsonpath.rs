//! The subset of JSONPath accepted in Redshift `jsonpaths` files: a root `$`
//! followed by dot members, bracketed quoted members and array indexes.

use common::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn select<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for segment in &self.segments {
            current = match segment {
                Segment::Key(key) => current.get(key.as_str())?,
                Segment::Index(index) => current.get(*index)?,
            };
        }
        Some(current)
    }
}

impl FromStr for JsonPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidInput(format!("invalid JSONPath {:?}: {}", s, reason));

        let mut rest = s
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| invalid("must start with $"))?;
        let mut segments = Vec::new();

        while !rest.is_empty() {
            if let Some(after_dot) = rest.strip_prefix('.') {
                let end = after_dot
                    .find(|c: char| c == '.' || c == '[')
                    .unwrap_or(after_dot.len());
                if end == 0 {
                    return Err(invalid("empty member name"));
                }
                segments.push(Segment::Key(after_dot[..end].to_string()));
                rest = &after_dot[end..];
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                let quote = after_bracket.chars().next();
                match quote {
                    Some(q @ ('\'' | '"')) => {
                        let body = &after_bracket[1..];
                        let end = body.find(q).ok_or_else(|| invalid("unterminated quote"))?;
                        segments.push(Segment::Key(body[..end].to_string()));
                        rest = body[end + 1..]
                            .strip_prefix(']')
                            .ok_or_else(|| invalid("expected ]"))?;
                    }
                    _ => {
                        let end = after_bracket.find(']').ok_or_else(|| invalid("expected ]"))?;
                        let index = after_bracket[..end]
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| invalid("array index must be a non-negative integer"))?;
                        segments.push(Segment::Index(index));
                        rest = &after_bracket[end + 1..];
                    }
                }
            } else {
                return Err(invalid("expected . or ["));
            }
        }

        Ok(Self { segments })
    }
}

#[derive(Deserialize)]
struct JsonPathsDocument {
    jsonpaths: Vec<String>,
}

/// Parses a `{"jsonpaths": [...]}` document into positional column paths.
pub fn parse_jsonpaths_document(content: &[u8]) -> Result<Vec<JsonPath>> {
    let document: JsonPathsDocument = serde_json::from_slice(content)?;
    document
        .jsonpaths
        .iter()
        .map(|path| path.parse())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bracket_and_dot_notation() {
        let document = json!({"artist": "Muse", "song": {"tags": ["rock", "alt"]}});

        let artist: JsonPath = "$['artist']".parse().unwrap();
        assert_eq!(artist.select(&document), Some(&json!("Muse")));

        let tag: JsonPath = "$.song.tags[1]".parse().unwrap();
        assert_eq!(tag.select(&document), Some(&json!("alt")));

        let quoted: JsonPath = r#"$["song"]['tags'][0]"#.parse().unwrap();
        assert_eq!(quoted.select(&document), Some(&json!("rock")));
    }

    #[test]
    fn test_missing_member_selects_nothing() {
        let path: JsonPath = "$.userId".parse().unwrap();
        assert_eq!(path.select(&json!({"other": 1})), None);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for bad in ["artist", "$.", "$['artist'", "$[x]", "$artist"] {
            assert!(bad.parse::<JsonPath>().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_parses_jsonpaths_document() {
        let content = br#"{"jsonpaths": ["$['artist']", "$['auth']", "$.ts"]}"#;
        let paths = parse_jsonpaths_document(content).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2], "$.ts".parse::<JsonPath>().unwrap());
    }
}
