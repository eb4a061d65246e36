//! Exemplar ranking.
//!
//! Scores already-retrieved exemplars against a keyword set and returns
//! the best matches. The score is additive on a 0..=100 scale:
//!
//! | component | range | source |
//! |-----------|-------|--------|
//! | keywords  | 0..=50 | matched / max(search, matched), or 25 for an empty search |
//! | quality   | 0..=30 | stored quality, or 15 when unset |
//! | usage     | 0..=20 | usage count, saturating at 100 uses |

use std::cmp::Ordering;

use crate::normalize::keywords_match;
use crate::types::{DesignExemplar, ExtractedDesign, MatchedDesign};

/// Keyword component awarded when the search set is empty.
const EMPTY_SEARCH_KEYWORD_SCORE: f64 = 25.0;
const MAX_KEYWORD_SCORE: f64 = 50.0;
const MAX_QUALITY_SCORE: f64 = 30.0;
/// Quality component for exemplars without a stored quality.
const UNSET_QUALITY_SCORE: f64 = 15.0;
const MAX_USAGE_SCORE: f64 = 20.0;

/// Style keywords copied into a synthesized fallback design.
const FALLBACK_STYLE_KEYWORDS: usize = 5;
/// Above this match score a synthesized design is rated higher.
const FALLBACK_QUALITY_THRESHOLD: f64 = 50.0;
const FALLBACK_QUALITY_HIGH: u8 = 75;
const FALLBACK_QUALITY_LOW: u8 = 50;

/// Score components for one exemplar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub keyword: f64,
    pub quality: f64,
    pub usage: f64,
    pub total: f64,
    /// Exemplar keywords that matched the search.
    pub matched_keywords: Vec<String>,
}

/// Score one exemplar, or `None` if it is not eligible.
///
/// With a non-empty search, exemplars without keywords or without any
/// matching keyword are ineligible. With an empty search, keyword
/// filtering is off and only exemplars with a stored spec are eligible.
pub fn score_exemplar(search: &[String], exemplar: &DesignExemplar) -> Option<ScoreBreakdown> {
    let (keyword, matched_keywords) = if search.is_empty() {
        exemplar.extracted_spec.as_ref()?;
        (EMPTY_SEARCH_KEYWORD_SCORE, Vec::new())
    } else {
        if exemplar.keywords.is_empty() {
            return None;
        }
        let matched: Vec<String> = exemplar
            .keywords
            .iter()
            .filter(|candidate| search.iter().any(|s| keywords_match(s, candidate)))
            .cloned()
            .collect();
        if matched.is_empty() {
            return None;
        }
        // Share of the search covered: matched candidate keywords over
        // max(|search|, |matched|). "design" is a stopword, so "modern design"
        // against [modern, blue] is 1/1 and scores 50 + 27 + 2 = 79 at
        // quality 90 and 10 uses.
        let denominator = search.len().max(matched.len()) as f64;
        (matched.len() as f64 / denominator * MAX_KEYWORD_SCORE, matched)
    };

    let quality = match exemplar.quality_score {
        Some(q) => f64::from(q) / 100.0 * MAX_QUALITY_SCORE,
        None => UNSET_QUALITY_SCORE,
    };
    let usage = (f64::from(exemplar.usage_count) / 100.0 * MAX_USAGE_SCORE).min(MAX_USAGE_SCORE);

    Some(ScoreBreakdown {
        keyword,
        quality,
        usage,
        total: keyword + quality + usage,
        matched_keywords,
    })
}

/// Rank exemplars against a search keyword set and keep the top `limit`.
///
/// Sorting is stable, so equal scores keep retrieval order. Exemplars
/// without a stored spec get a synthesized default design.
pub fn rank_exemplars(
    search: &[String],
    candidates: &[DesignExemplar],
    limit: usize,
) -> Vec<MatchedDesign> {
    let mut scored: Vec<(&DesignExemplar, ScoreBreakdown)> = candidates
        .iter()
        .filter(|exemplar| is_well_formed(exemplar))
        .filter_map(|exemplar| score_exemplar(search, exemplar).map(|s| (exemplar, s)))
        .collect();

    scored.sort_by(|a, b| b.1.total.partial_cmp(&a.1.total).unwrap_or(Ordering::Equal));

    log::debug!(
        "Ranked {} of {} candidates for {} search keywords",
        scored.len(),
        candidates.len(),
        search.len()
    );

    scored
        .into_iter()
        .take(limit)
        .map(|(exemplar, score)| to_matched(exemplar, score.total))
        .collect()
}

fn to_matched(exemplar: &DesignExemplar, total: f64) -> MatchedDesign {
    let extracted_design = match &exemplar.extracted_spec {
        Some(spec) => spec.clone(),
        None => {
            let quality = if total > FALLBACK_QUALITY_THRESHOLD {
                FALLBACK_QUALITY_HIGH
            } else {
                FALLBACK_QUALITY_LOW
            };
            let style_keywords = exemplar
                .keywords
                .iter()
                .take(FALLBACK_STYLE_KEYWORDS)
                .cloned()
                .collect();
            ExtractedDesign::fallback(style_keywords, quality)
        }
    };

    MatchedDesign {
        design_id: exemplar.id.clone(),
        match_score: round2(total),
        keywords: exemplar.keywords.clone(),
        extracted_design,
        category: exemplar.category_tag.clone(),
    }
}

/// Reject records that could not have come from a valid insert.
fn is_well_formed(exemplar: &DesignExemplar) -> bool {
    if exemplar.id.is_empty() {
        log::warn!("Skipping exemplar with empty id");
        return false;
    }
    if exemplar.quality_score.is_some_and(|q| q > 100) {
        log::warn!("Skipping exemplar {}: quality score out of range", exemplar.id);
        return false;
    }
    true
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn exemplar(id: &str, keywords: &[&str], quality: Option<u8>, usage: u32) -> DesignExemplar {
        DesignExemplar {
            id: id.to_string(),
            category_tag: "general".to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            extracted_spec: Some(ExtractedDesign::fallback(vec![], 80)),
            quality_score: quality,
            usage_count: usage,
            uploaded_by: None,
            image_ref: None,
            created_at: Utc::now(),
        }
    }

    fn search(keywords: &[&str]) -> Vec<String> {
        keywords.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_containment_match_scores() {
        let e = exemplar("e1", &["mathematics"], None, 0);
        let score = score_exemplar(&search(&["math"]), &e).unwrap();
        assert!(score.total > 0.0);
        assert_eq!(score.matched_keywords, vec!["mathematics"]);
    }

    #[test]
    fn test_full_score_components() {
        let e = exemplar("e1", &["modern", "blue"], Some(90), 10);
        let score = score_exemplar(&search(&["modern"]), &e).unwrap();
        assert_eq!(score.keyword, 50.0);
        assert!((score.quality - 27.0).abs() < 1e-9);
        assert!((score.usage - 2.0).abs() < 1e-9);
        assert!((score.total - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_keyword_score() {
        let e = exemplar("e1", &["modern", "blue"], None, 0);
        let score = score_exemplar(&search(&["modern", "finance"]), &e).unwrap();
        assert_eq!(score.keyword, 25.0);
        assert_eq!(score.quality, 15.0);
    }

    #[test]
    fn test_usage_saturates() {
        let e = exemplar("e1", &["modern"], Some(0), 5000);
        let score = score_exemplar(&search(&["modern"]), &e).unwrap();
        assert_eq!(score.usage, 20.0);
    }

    #[test]
    fn test_non_matching_is_ineligible() {
        let e = exemplar("e1", &["bold", "red"], Some(40), 0);
        assert!(score_exemplar(&search(&["modern"]), &e).is_none());
    }

    #[test]
    fn test_empty_keywords_ineligible_for_keyword_search() {
        let e = exemplar("e1", &[], Some(90), 0);
        assert!(score_exemplar(&search(&["modern"]), &e).is_none());
    }

    #[test]
    fn test_empty_search_requires_stored_spec() {
        let with_spec = exemplar("e1", &[], Some(90), 0);
        let score = score_exemplar(&[], &with_spec).unwrap();
        assert_eq!(score.keyword, 25.0);

        let mut without = exemplar("e2", &["bold"], Some(90), 0);
        without.extracted_spec = None;
        assert!(score_exemplar(&[], &without).is_none());
    }

    #[test]
    fn test_rank_orders_and_limits() {
        let candidates = vec![
            exemplar("low", &["modern"], Some(10), 0),
            exemplar("high", &["modern"], Some(90), 0),
            exemplar("mid", &["modern"], Some(50), 0),
        ];
        let ranked = rank_exemplars(&search(&["modern"]), &candidates, 2);
        let ids: Vec<&str> = ranked.iter().map(|m| m.design_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }

    #[test]
    fn test_ties_keep_retrieval_order() {
        let candidates = vec![
            exemplar("first", &["modern"], Some(50), 0),
            exemplar("second", &["modern"], Some(50), 0),
            exemplar("third", &["modern"], Some(50), 0),
        ];
        let ranked = rank_exemplars(&search(&["modern"]), &candidates, 10);
        let ids: Vec<&str> = ranked.iter().map(|m| m.design_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_synthesized_fallback_design() {
        let mut e = exemplar("e1", &["bold", "orange"], None, 0);
        e.extracted_spec = None;
        let ranked = rank_exemplars(&search(&["bold"]), &[e], 1);
        assert_eq!(ranked.len(), 1);
        let design = &ranked[0].extracted_design;
        assert!(design.quality_score == 50 || design.quality_score == 75);
        assert_eq!(design.style_keywords, vec!["bold", "orange"]);
        assert_eq!(design.layout_pattern, "title-and-bullets");
    }

    #[test]
    fn test_fallback_quality_threshold() {
        // 25 keyword + 15 unset quality
        let mut weak = exemplar("weak", &["bold"], None, 0);
        weak.extracted_spec = None;
        let ranked = rank_exemplars(&search(&["bold", "serif"]), &[weak], 1);
        assert_eq!(ranked[0].match_score, 40.0);
        assert_eq!(ranked[0].extracted_design.quality_score, FALLBACK_QUALITY_LOW);

        // 50 keyword + 15 unset quality
        let mut single = exemplar("single", &["bold"], None, 0);
        single.extracted_spec = None;
        let ranked = rank_exemplars(&search(&["bold"]), &[single], 1);
        assert_eq!(ranked[0].match_score, 65.0);
        assert_eq!(ranked[0].extracted_design.quality_score, FALLBACK_QUALITY_HIGH);
        assert_eq!(ranked[0].extracted_design.style_keywords, vec!["bold"]);
    }

    #[test]
    fn test_fallback_keywords_truncated() {
        let mut e = exemplar("e1", &["a1", "a2", "a3", "a4", "a5", "a6", "a7"], None, 0);
        e.extracted_spec = None;
        let ranked = rank_exemplars(&search(&["a1"]), &[e], 1);
        assert_eq!(ranked[0].extracted_design.style_keywords.len(), 5);
    }

    #[test]
    fn test_score_rounded_to_two_decimals() {
        let e = exemplar("e1", &["modern"], Some(33), 1);
        let ranked = rank_exemplars(&search(&["modern"]), &[e], 1);
        // 50 + 9.9 + 0.2
        assert_eq!(ranked[0].match_score, 60.1);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let bad = exemplar("bad", &["modern"], Some(200), 0);
        let good = exemplar("good", &["modern"], Some(50), 0);
        let ranked = rank_exemplars(&search(&["modern"]), &[bad, good], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].design_id, "good");
    }
}
