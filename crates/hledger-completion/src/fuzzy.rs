//! Fuzzy matching and scoring.
//!
//! Scoring is intentionally simple: every matched character earns points,
//! consecutive matches earn more, and a match right after a segment or
//! word boundary earns the most. The absolute weights are not part of the
//! contract; the ordering they induce is.

/// Points for a matched character.
const MATCH: i64 = 1;
/// Extra points when the previous character also matched.
const CONSECUTIVE: i64 = 2;
/// Extra points for a match at a segment or word boundary.
const BOUNDARY: i64 = 3;
/// Score of an empty query: everything passes with a positive score.
const BASELINE: i64 = 1;

fn fold(c: char) -> char {
    // one-to-one lowercase covers the scripts journals are written in
    c.to_lowercase().next().unwrap_or(c)
}

fn is_boundary(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => matches!(c, ':' | ' ' | '-' | '_' | '.' | '/'),
    }
}

/// Match `query` as a case-folded subsequence of `target`.
///
/// Returns the score, or `None` when some query character has no match.
/// An empty query scores [`BASELINE`].
pub fn fuzzy_score(query: &str, target: &str) -> Option<i64> {
    if query.is_empty() {
        return Some(BASELINE);
    }
    let needles: Vec<char> = query.chars().map(fold).collect();
    let mut needle_idx = 0;
    let mut score = 0;
    let mut prev: Option<char> = None;
    let mut prev_matched = false;

    for c in target.chars() {
        if needle_idx < needles.len() && fold(c) == needles[needle_idx] {
            score += MATCH;
            if prev_matched {
                score += CONSECUTIVE;
            }
            if is_boundary(prev) {
                score += BOUNDARY;
            }
            needle_idx += 1;
            prev_matched = true;
        } else {
            prev_matched = false;
        }
        prev = Some(c);
    }

    (needle_idx == needles.len()).then_some(score)
}

/// Segment-based account matching.
///
/// The query and the account name are split on `:`; every query segment
/// must fuzzy-match some account segment, in order. A query segment with
/// no matching account segment disqualifies the account entirely.
pub fn account_score(query: &str, target: &str) -> Option<i64> {
    if query.is_empty() {
        return Some(BASELINE);
    }
    let target_segments: Vec<&str> = target.split(':').collect();
    let mut next_segment = 0;
    let mut total = 0;

    for query_segment in query.split(':') {
        if query_segment.is_empty() {
            // a trailing/leading colon just moves to the next segment
            continue;
        }
        let mut matched = None;
        for (offset, segment) in target_segments[next_segment..].iter().enumerate() {
            if let Some(score) = fuzzy_score(query_segment, segment) {
                matched = Some((next_segment + offset + 1, score));
                break;
            }
        }
        let (after, score) = matched?;
        next_segment = after;
        total += score;
    }
    Some(total + BASELINE)
}

/// Plain case-insensitive substring matching, for clients that disable
/// fuzzy completion.
pub fn substring_score(query: &str, target: &str) -> Option<i64> {
    if query.is_empty() {
        return Some(BASELINE);
    }
    let folded_target: String = target.chars().map(fold).collect();
    let folded_query: String = query.chars().map(fold).collect();
    folded_target.contains(&folded_query).then_some(BASELINE + folded_query.len() as i64)
}
