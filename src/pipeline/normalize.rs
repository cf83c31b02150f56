//! Response normalisation: flatten the recognition payload into a [`ResultSet`].
//!
//! The payload is walked as a loosely-typed JSON tree rather than decoded into
//! strict structs. The service's shape is a contract we do not own, and a
//! single unexpected type deep inside one candidate must not cost the caller
//! every other candidate. Each access is matched against presence and type;
//! anything off-shape becomes `None` or is skipped.
//!
//! ```text
//! { "detected_items": [
//!     { "candidate_items": [
//!         { "name", "score", "image_url",
//!           "external_items":   [ { "url" }, … ],
//!           "candidate_colors": [ { "name", "score" }, … ] },
//!         … ] },
//!     … ] }
//! ```

use crate::output::{CandidateMatch, ResultSet, TopColor};
use crate::pipeline::upload::RecognitionResponse;
use serde_json::{Map, Value};
use tracing::debug;

/// Flatten every candidate of every detected item, preserving service order.
///
/// Total: never fails and never panics, whatever JSON it is given.
pub fn normalize(raw: &RecognitionResponse) -> ResultSet {
    let candidates: Vec<CandidateMatch> = list(raw.as_value(), "detected_items")
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|item| list_in(item, "candidate_items"))
        .filter_map(Value::as_object)
        .map(candidate_match)
        .collect();

    debug!("Normalised {} candidates", candidates.len());
    ResultSet::new(candidates)
}

fn candidate_match(c: &Map<String, Value>) -> CandidateMatch {
    CandidateMatch {
        name: string(c, "name"),
        score: number(c, "score"),
        image_url: string(c, "image_url"),
        external_url: first_object(c, "external_items").and_then(|e| string(e, "url")),
        top_color: first_object(c, "candidate_colors").map(|color| TopColor {
            name: string(color, "name"),
            score: number(color, "score"),
        }),
    }
}

// ── Shape-tolerant accessors ────────────────────────────────────────────────

fn list<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.as_object().map(|o| list_in(o, key)).unwrap_or(&[])
}

fn list_in<'a>(o: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    o.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn first_object<'a>(o: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    list_in(o, key).first().and_then(Value::as_object)
}

fn string(o: &Map<String, Value>, key: &str) -> Option<String> {
    o.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn number(o: &Map<String, Value>, key: &str) -> Option<f64> {
    o.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NO_CANDIDATES_MESSAGE;
    use serde_json::json;

    fn run(v: Value) -> ResultSet {
        normalize(&RecognitionResponse::from_value(v))
    }

    #[test]
    fn empty_detections_yield_successful_empty_set() {
        let rs = run(json!({ "detected_items": [] }));
        assert!(rs.success);
        assert_eq!(rs.count, 0);
        assert!(rs.candidates.is_empty());
        assert_eq!(rs.to_text(), NO_CANDIDATES_MESSAGE);
    }

    #[test]
    fn bare_candidate_has_no_link_or_color() {
        let rs = run(json!({
            "detected_items": [{
                "candidate_items": [{
                    "name": "Brick 2x4",
                    "score": 0.987,
                    "image_url": "http://x/i.png"
                }]
            }]
        }));
        assert_eq!(rs.count, 1);
        let c = &rs.candidates[0];
        assert_eq!(c.name.as_deref(), Some("Brick 2x4"));
        assert_eq!(c.score, Some(0.987));
        assert_eq!(c.image_url.as_deref(), Some("http://x/i.png"));
        assert_eq!(c.external_url, None);
        assert_eq!(c.top_color, None);

        let text = rs.to_text();
        assert!(text.contains("Candidate 1: Brick 2x4"));
        assert!(text.contains("probability: 0.987"));
        assert!(!text.contains("bricklink"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn first_external_item_and_color_are_taken() {
        let rs = run(json!({
            "detected_items": [{
                "candidate_items": [{
                    "name": "Plate",
                    "score": 0.5,
                    "image_url": "http://x/p.png",
                    "external_items": [
                        { "url": "https://bricklink.com/x" },
                        { "url": "https://bricklink.com/y" }
                    ],
                    "candidate_colors": [
                        { "name": "Red", "score": 0.75 },
                        { "name": "Blue", "score": 0.2 }
                    ]
                }]
            }]
        }));
        let c = &rs.candidates[0];
        assert_eq!(c.external_url.as_deref(), Some("https://bricklink.com/x"));
        assert_eq!(
            c.top_color,
            Some(TopColor {
                name: Some("Red".into()),
                score: Some(0.75)
            })
        );
    }

    #[test]
    fn order_is_detection_then_candidate_without_sorting() {
        let rs = run(json!({
            "detected_items": [
                { "candidate_items": [
                    { "name": "a", "score": 0.1 },
                    { "name": "b", "score": 0.9 }
                ]},
                { "candidate_items": [] },
                { "candidate_items": [ { "name": "c", "score": 0.5 } ] }
            ]
        }));
        let names: Vec<_> = rs.candidates.iter().filter_map(|c| c.name.clone()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(rs.count, 3);
    }

    #[test]
    fn missing_lists_are_empty() {
        assert_eq!(run(json!({})).count, 0);
        assert_eq!(run(json!({ "detected_items": [{}] })).count, 0);
        assert_eq!(run(json!({ "detected_items": null })).count, 0);
        assert!(run(json!({ "detected_items": [{ "candidate_items": null }] })).success);
    }

    #[test]
    fn malformed_shapes_degrade_to_none() {
        let rs = run(json!({
            "detected_items": [{
                "candidate_items": [
                    {
                        "name": 42,
                        "score": "high",
                        "image_url": ["nope"],
                        "external_items": { "url": "https://not-a-list" },
                        "candidate_colors": "Red"
                    },
                    {
                        "name": "Tile",
                        "score": 1,
                        "external_items": [],
                        "candidate_colors": []
                    },
                    {
                        "name": "Slope",
                        "external_items": ["https://bare-string"],
                        "candidate_colors": [null]
                    }
                ]
            }]
        }));
        assert_eq!(rs.count, 3);
        let odd = &rs.candidates[0];
        assert_eq!(odd.name, None);
        assert_eq!(odd.score, None);
        assert_eq!(odd.image_url, None);
        assert_eq!(odd.external_url, None);
        assert_eq!(odd.top_color, None);

        let tile = &rs.candidates[1];
        assert_eq!(tile.score, Some(1.0));
        assert_eq!(tile.external_url, None);
        assert_eq!(tile.top_color, None);

        let slope = &rs.candidates[2];
        assert_eq!(slope.external_url, None);
        assert_eq!(slope.top_color, None);
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let rs = run(json!({
            "detected_items": [
                "junk",
                { "candidate_items": [7, { "name": "ok" }, null] }
            ]
        }));
        assert_eq!(rs.count, 1);
        assert_eq!(rs.candidates[0].name.as_deref(), Some("ok"));
    }

    #[test]
    fn non_object_root_is_tolerated() {
        for v in [json!(null), json!([]), json!("text"), json!(3.5)] {
            let rs = run(v);
            assert!(rs.success);
            assert_eq!(rs.count, 0);
        }
    }

    #[test]
    fn color_without_score_keeps_name() {
        let rs = run(json!({
            "detected_items": [{ "candidate_items": [{
                "name": "Brick",
                "candidate_colors": [{ "name": "Black" }]
            }]}]
        }));
        assert_eq!(
            rs.candidates[0].top_color,
            Some(TopColor {
                name: Some("Black".into()),
                score: None
            })
        );
    }
}
