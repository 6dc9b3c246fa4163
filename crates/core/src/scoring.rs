//! Heuristic relevance scoring over chunk records.
//!
//! Additive substring-overlap scoring; there is deliberately no vector
//! math here. Keyword overlap is weighted heavily relative to raw
//! lexical overlap, and a small bonus favors substantial chunks that
//! already matched something. The exact weights are part of the
//! retrieval contract and are pinned by the tests below.

use crate::models::{ChunkRecord, RetrievedChunk};

const WORD_MATCH: f64 = 1.0;
const KEYWORD_PAIR_MATCH: f64 = 3.0;
const KEYWORD_TEXT_MATCH: f64 = 1.0;
const LENGTH_BONUS: f64 = 0.5;
const LENGTH_BONUS_FLOOR: usize = 200;

/// Words of this many characters or fewer never contribute to lexical
/// scoring. Measured in characters, not bytes, so short words in
/// non-ASCII scripts are filtered the same way as English ones.
const MIN_WORD_LEN: usize = 3;

pub fn score_chunk(query: &str, query_keywords: &[String], chunk: &ChunkRecord) -> f64 {
    let text = chunk.text.to_lowercase();
    let query = query.to_lowercase();

    let mut score = 0.0;

    for word in query.split_whitespace() {
        if word.chars().count() > MIN_WORD_LEN && text.contains(word) {
            score += WORD_MATCH;
        }
    }

    let chunk_keywords = chunk.keywords.as_deref().unwrap_or_default();
    for query_keyword in query_keywords {
        let query_keyword = query_keyword.to_lowercase();

        for chunk_keyword in chunk_keywords {
            let chunk_keyword = chunk_keyword.to_lowercase();
            if query_keyword.contains(&chunk_keyword) || chunk_keyword.contains(&query_keyword) {
                score += KEYWORD_PAIR_MATCH;
            }
        }

        if text.contains(&query_keyword) {
            score += KEYWORD_TEXT_MATCH;
        }
    }

    if chunk.text.chars().count() > LENGTH_BONUS_FLOOR && score > 0.0 {
        score += LENGTH_BONUS;
    }

    score
}

/// Scores every candidate and keeps the strictly positive ones, sorted
/// descending. Ties preserve input order (stable sort), and zero-score
/// chunks are never used as filler: a query with no overlap against any
/// candidate legitimately returns an empty result.
pub fn rank_chunks(
    query: &str,
    query_keywords: &[String],
    candidates: Vec<ChunkRecord>,
    top_k: usize,
) -> Vec<RetrievedChunk> {
    let mut retained: Vec<RetrievedChunk> = candidates
        .into_iter()
        .filter_map(|chunk| {
            let score = score_chunk(query, query_keywords, &chunk);
            (score > 0.0).then_some(RetrievedChunk { chunk, score })
        })
        .collect();

    retained.sort_by(|left, right| {
        right
            .score
            .partial_cmp(&left.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    retained.truncate(top_k);
    retained
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str, keywords: Option<Vec<&str>>) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            document_id: format!("doc-{id}"),
            source_id: None,
            chunk_index: 0,
            text: text.to_string(),
            keywords: keywords.map(|list| list.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn query_words_longer_than_three_chars_score_one_each() {
        let candidate = chunk("1", "seed funding for fintech startups", None);
        // "for" is 3 chars and ignored; "seed", "funding", "fintech" hit.
        let score = score_chunk("seed funding for fintech", &[], &candidate);
        assert_eq!(score, 3.0);
    }

    #[test]
    fn word_length_filter_counts_characters_not_bytes() {
        let candidate = chunk("1", "कब से शुरू होगी योजना", None);
        // Two characters, six UTF-8 bytes: stays below the filter.
        assert_eq!(score_chunk("कब", &[], &candidate), 0.0);
        // Five characters: qualifies and matches.
        assert_eq!(score_chunk("योजना", &[], &candidate), 1.0);
    }

    #[test]
    fn keyword_pair_overlap_scores_three_per_pair() {
        let candidate = chunk("1", "unrelated body", Some(vec!["seed funding"]));
        let score = score_chunk(
            "anything",
            &["funding".to_string()],
            &candidate,
        );
        // "seed funding" contains "funding": one pair, no text match.
        assert_eq!(score, 3.0);
    }

    #[test]
    fn query_keyword_in_text_scores_one() {
        let candidate = chunk("1", "the seed fund scheme opened", None);
        let score = score_chunk("zzzz", &["seed fund".to_string()], &candidate);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn length_bonus_only_applies_to_positive_scores() {
        let long_text = format!("{} seed", "x".repeat(250));
        let matched = chunk("1", &long_text, None);
        assert_eq!(score_chunk("seed", &[], &matched), 1.5);

        let unmatched = chunk("2", &"x".repeat(250), None);
        assert_eq!(score_chunk("seed", &[], &unmatched), 0.0);
    }

    #[test]
    fn adding_a_query_word_occurrence_never_decreases_score() {
        let query = "startup india seed fund scheme";
        let keywords = vec!["seed fund".to_string()];

        let base = chunk("1", "grants for incubators under the scheme", None);
        let enriched = chunk(
            "1",
            "grants for incubators under the scheme for startup founders",
            None,
        );

        assert!(
            score_chunk(query, &keywords, &enriched) >= score_chunk(query, &keywords, &base)
        );
    }

    #[test]
    fn ties_preserve_input_order() {
        let candidates = vec![
            chunk("first", "seed capital notes", None),
            chunk("second", "seed capital notes", None),
            chunk("third", "seed capital notes", None),
        ];
        let ranked = rank_chunks("seed capital", &[], candidates, 5);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].chunk.id, "first");
        assert_eq!(ranked[1].chunk.id, "second");
        assert_eq!(ranked[2].chunk.id, "third");
    }

    #[test]
    fn zero_overlap_returns_empty_result() {
        let candidates = vec![
            chunk("1", "completely unrelated body", Some(vec!["other"])),
            chunk("2", "nothing in common here", None),
        ];
        let ranked = rank_chunks("quarterly valuations", &["deals".to_string()], candidates, 5);
        assert!(ranked.is_empty());
    }

    #[test]
    fn seed_fund_query_ranks_the_matching_chunk_first() {
        let candidates = vec![
            chunk("filler-1", "weather patterns across the deccan plateau", None),
            chunk(
                "hit",
                "The Startup India Seed Fund Scheme provides financial assistance to early-stage startups.",
                None,
            ),
            chunk("filler-2", "cricket league auction results", None),
        ];

        let ranked = rank_chunks(
            "What is the Startup India Seed Fund Scheme deadline?",
            &[],
            candidates,
            1,
        );

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.id, "hit");
        // "startup", "india", "seed", "fund", "scheme" all match lexically.
        assert!(ranked[0].score >= 3.0);
    }

    #[test]
    fn top_k_truncates_after_sorting() {
        let candidates = vec![
            chunk("weak", "seed", None),
            chunk(
                "strong",
                "seed funding rounds for fintech startups in india",
                None,
            ),
        ];
        let ranked = rank_chunks("seed funding fintech india", &[], candidates, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].chunk.id, "strong");
    }
}
