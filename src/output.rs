//! Normalised result types and their renderings.
//!
//! A [`ResultSet`] is produced once per invocation by
//! [`crate::pipeline::normalize::normalize`]. Machine consumers get it as
//! JSON through serde; humans get [`ResultSet::to_text`]. Both are views over
//! the same value.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// Sentence returned instead of a listing when nothing was recognised.
pub const NO_CANDIDATES_MESSAGE: &str = "No candidates found in the image.";

/// The dominant colour predicted for a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopColor {
    pub name: Option<String>,
    pub score: Option<f64>,
}

/// One proposed identity for a detected brick.
///
/// Every field is optional: sparse upstream data yields `None`, never an
/// error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch {
    pub name: Option<String>,
    pub score: Option<f64>,
    pub image_url: Option<String>,
    /// First BrickLink catalogue link.
    pub external_url: Option<String>,
    pub top_color: Option<TopColor>,
}

/// Ordered candidates for one image, in the order the service reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub success: bool,
    pub count: usize,
    pub candidates: Vec<CandidateMatch>,
}

impl ResultSet {
    pub fn new(candidates: Vec<CandidateMatch>) -> Self {
        Self {
            success: true,
            count: candidates.len(),
            candidates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Render the human-readable listing.
    ///
    /// ```text
    /// Found 1 candidate(s):
    ///
    /// Candidate 1: Brick 2 x 4
    ///   probability: 0.987
    ///   image: https://…/3001.png
    ///   bricklink: https://www.bricklink.com/v2/catalog/catalogitem.page?P=3001
    ///   color: Red (0.750)
    /// ```
    pub fn to_text(&self) -> String {
        if self.is_empty() {
            return NO_CANDIDATES_MESSAGE.to_string();
        }

        let mut out = format!("Found {} candidate(s):\n", self.count);
        for (i, c) in self.candidates.iter().enumerate() {
            // Writing into a String cannot fail.
            let _ = write!(
                out,
                "\nCandidate {}: {}\n  probability: {}\n",
                i + 1,
                c.name.as_deref().unwrap_or("unknown"),
                fmt_score(c.score),
            );
            if let Some(ref url) = c.image_url {
                let _ = writeln!(out, "  image: {url}");
            }
            if let Some(ref url) = c.external_url {
                let _ = writeln!(out, "  bricklink: {url}");
            }
            if let Some(ref color) = c.top_color {
                let name = color.name.as_deref().unwrap_or("unknown");
                match color.score {
                    Some(s) => {
                        let _ = writeln!(out, "  color: {name} ({s:.3})");
                    }
                    None => {
                        let _ = writeln!(out, "  color: {name}");
                    }
                }
            }
        }
        out
    }

    /// Pretty JSON of the structured view.
    pub fn to_json_pretty(&self) -> String {
        // Plain data with string keys; serialisation is infallible in practice.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{s:.3}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brick(name: &str, score: f64) -> CandidateMatch {
        CandidateMatch {
            name: Some(name.into()),
            score: Some(score),
            image_url: None,
            external_url: None,
            top_color: None,
        }
    }

    #[test]
    fn empty_set_collapses_to_sentence() {
        let rs = ResultSet::new(vec![]);
        assert!(rs.success);
        assert_eq!(rs.count, 0);
        assert_eq!(rs.to_text(), NO_CANDIDATES_MESSAGE);
    }

    #[test]
    fn optional_lines_only_when_present() {
        let rs = ResultSet::new(vec![brick("Brick 2x4", 0.987)]);
        let text = rs.to_text();
        assert!(text.starts_with("Found 1 candidate(s):"));
        assert!(text.contains("Candidate 1: Brick 2x4"));
        assert!(text.contains("probability: 0.987"));
        assert!(!text.contains("image:"));
        assert!(!text.contains("bricklink:"));
        assert!(!text.contains("color:"));
    }

    #[test]
    fn full_candidate_renders_every_line() {
        let mut c = brick("Plate 1x2", 0.5);
        c.image_url = Some("http://x/i.png".into());
        c.external_url = Some("https://bricklink.com/x".into());
        c.top_color = Some(TopColor {
            name: Some("Red".into()),
            score: Some(0.75),
        });
        let text = ResultSet::new(vec![c]).to_text();
        assert!(text.contains("probability: 0.500"));
        assert!(text.contains("  image: http://x/i.png"));
        assert!(text.contains("  bricklink: https://bricklink.com/x"));
        assert!(text.contains("  color: Red (0.750)"));
    }

    #[test]
    fn missing_name_and_score_use_placeholders() {
        let c = CandidateMatch {
            name: None,
            score: None,
            image_url: None,
            external_url: None,
            top_color: Some(TopColor {
                name: None,
                score: None,
            }),
        };
        let text = ResultSet::new(vec![c]).to_text();
        assert!(text.contains("Candidate 1: unknown"));
        assert!(text.contains("probability: n/a"));
        assert!(text.contains("  color: unknown\n"));
    }

    #[test]
    fn indices_are_one_based_and_ordered() {
        let rs = ResultSet::new(vec![brick("A", 0.1), brick("B", 0.9)]);
        let text = rs.to_text();
        let a = text.find("Candidate 1: A").expect("first");
        let b = text.find("Candidate 2: B").expect("second");
        assert!(a < b);
        assert_eq!(rs.to_string(), text);
    }

    #[test]
    fn structured_view_uses_camel_case_and_nulls() {
        let v = serde_json::to_value(ResultSet::new(vec![brick("Brick 2x4", 0.987)])).unwrap();
        assert_eq!(
            v,
            json!({
                "success": true,
                "count": 1,
                "candidates": [{
                    "name": "Brick 2x4",
                    "score": 0.987,
                    "imageUrl": null,
                    "externalUrl": null,
                    "topColor": null
                }]
            })
        );
    }
}
