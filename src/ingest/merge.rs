// src/ingest/merge.rs
use std::collections::HashSet;

use crate::ingest::types::CandidateTopic;

pub const DEFAULT_MAX_TRENDS: usize = 15;

/// Result of one merge pass plus counts of what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub topics: Vec<CandidateTopic>,
    pub filtered: usize,
    pub deduped: usize,
}

pub fn is_allowed(category: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|a| a.eq_ignore_ascii_case(category))
}

/// Concatenate in the given order, keep allow-listed categories, drop repeated
/// case-folded titles (first wins), rank by engagement and cap at `max`.
pub fn merge(lists: Vec<Vec<CandidateTopic>>, allowed: &[String], max: usize) -> MergeOutcome {
    let mut filtered = 0usize;
    let mut deduped = 0usize;
    let mut seen: HashSet<String> = HashSet::new();
    let mut topics = Vec::new();

    for topic in lists.into_iter().flatten() {
        if !is_allowed(&topic.category, allowed) {
            filtered += 1;
            continue;
        }
        if !seen.insert(topic.key()) {
            deduped += 1;
            continue;
        }
        topics.push(topic);
    }

    // `sort_by` is stable: equal scores keep encounter order.
    topics.sort_by(|a, b| b.score().total_cmp(&a.score()));
    topics.truncate(max);

    MergeOutcome {
        topics,
        filtered,
        deduped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;

    fn topic(title: &str, source: SourceKind, score: Option<f64>, category: &str) -> CandidateTopic {
        CandidateTopic {
            title: title.into(),
            source,
            url: None,
            description: None,
            engagement: score,
            category: category.into(),
        }
    }

    fn allowed() -> Vec<String> {
        vec!["entertainment".into(), "gossip".into(), "politics".into()]
    }

    #[test]
    fn first_seen_wins_across_sources() {
        let out = merge(
            vec![
                vec![topic("Taylor Swift tour", SourceKind::Social, Some(500.0), "entertainment")],
                vec![topic("taylor swift TOUR", SourceKind::News, Some(10.0), "entertainment")],
                vec![],
            ],
            &allowed(),
            DEFAULT_MAX_TRENDS,
        );
        assert_eq!(out.topics.len(), 1);
        assert_eq!(out.topics[0].title, "Taylor Swift tour");
        assert_eq!(out.topics[0].source, SourceKind::Social);
        assert_eq!(out.deduped, 1);
    }

    #[test]
    fn first_seen_wins_even_with_lower_score() {
        let out = merge(
            vec![
                vec![topic("Senate vote", SourceKind::Social, None, "politics")],
                vec![topic("SENATE VOTE", SourceKind::Aggregator, Some(900.0), "politics")],
            ],
            &allowed(),
            DEFAULT_MAX_TRENDS,
        );
        assert_eq!(out.topics.len(), 1);
        assert_eq!(out.topics[0].source, SourceKind::Social);
        assert_eq!(out.topics[0].engagement, None);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let out = merge(
            vec![vec![
                topic("a", SourceKind::Aggregator, None, "gossip"),
                topic("b", SourceKind::Aggregator, Some(5.0), "gossip"),
                topic("c", SourceKind::Aggregator, Some(0.0), "gossip"),
                topic("d", SourceKind::Aggregator, Some(50.0), "gossip"),
                topic("e", SourceKind::Aggregator, None, "gossip"),
            ]],
            &allowed(),
            DEFAULT_MAX_TRENDS,
        );
        let titles: Vec<&str> = out.topics.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "b", "a", "c", "e"]);
        assert!(out.topics.windows(2).all(|w| w[0].score() >= w[1].score()));
    }

    #[test]
    fn non_allowed_categories_are_filtered() {
        let out = merge(
            vec![vec![
                topic("Local bakery", SourceKind::News, Some(3.0), "other"),
                topic("Oscar night", SourceKind::News, Some(1.0), "entertainment"),
            ]],
            &allowed(),
            DEFAULT_MAX_TRENDS,
        );
        assert_eq!(out.topics.len(), 1);
        assert_eq!(out.filtered, 1);
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let list = vec![
            topic("x", SourceKind::Social, Some(1.0), "gossip"),
            topic("X", SourceKind::News, Some(9.0), "gossip"),
            topic("y", SourceKind::News, Some(2.0), "politics"),
        ];
        let once = merge(vec![list.clone()], &allowed(), DEFAULT_MAX_TRENDS).topics;
        let doubled = merge(vec![list.clone(), list], &allowed(), DEFAULT_MAX_TRENDS).topics;
        let again = merge(vec![once.clone()], &allowed(), DEFAULT_MAX_TRENDS).topics;
        assert_eq!(once, doubled);
        assert_eq!(once, again);
    }

    #[test]
    fn truncates_to_max() {
        let list: Vec<CandidateTopic> = (0..20)
            .map(|i| topic(&format!("t{i}"), SourceKind::Aggregator, Some(i as f64), "gossip"))
            .collect();
        let out = merge(vec![list], &allowed(), DEFAULT_MAX_TRENDS);
        assert_eq!(out.topics.len(), 15);
        assert_eq!(out.topics[0].title, "t19");
    }
}
