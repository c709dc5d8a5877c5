use fragdupe::duplicates::{DuplicateDetector, DuplicateGroup};
use fragdupe::index::{CorpusIndex, CorpusIndexer, SegmentId};
use fragdupe::options::{DuplicateFinderOptions, ParserType};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

const VOCABULARY: [&str; 6] = ["alpha", "beta", "gamma", "delta", "omega", "sigma"];

fn documents() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..VOCABULARY.len(), 2..12), 0..8)
}

fn write_corpus(docs: &[Vec<usize>]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (i, words) in docs.iter().enumerate() {
        let text = words
            .iter()
            .map(|&w| VOCABULARY[w])
            .collect::<Vec<_>>()
            .join(" ");
        fs::write(dir.path().join(format!("doc{i}.txt")), text).unwrap();
    }
    dir
}

fn options(dir: &TempDir) -> DuplicateFinderOptions {
    DuplicateFinderOptions::new(dir.path())
        .with_parser(ParserType::File)
        .with_min_length(1)
        .with_ngram_length(2)
        .with_min_similarity(0.3)
}

fn build(options: &DuplicateFinderOptions) -> CorpusIndex {
    CorpusIndexer::new(options).index_directory().unwrap().0
}

fn groups_at(index: &CorpusIndex, options: &DuplicateFinderOptions) -> Vec<DuplicateGroup> {
    DuplicateDetector::new(index).find_all(options).unwrap().0
}

fn member_sets(groups: &[DuplicateGroup]) -> Vec<BTreeSet<SegmentId>> {
    groups
        .iter()
        .map(|g| g.members.iter().map(|m| m.segment).collect())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_similarity_symmetric_and_bounded(docs in documents()) {
        let dir = write_corpus(&docs);
        let options = options(&dir);
        let index = build(&options);
        let detector = DuplicateDetector::new(&index);

        let n = index.segments.len() as u32;
        for a in 0..n {
            for b in 0..n {
                let ab = detector.similarity(SegmentId(a), SegmentId(b)).unwrap();
                let ba = detector.similarity(SegmentId(b), SegmentId(a)).unwrap();
                prop_assert_eq!(ab, ba);
                prop_assert!((0.0..=1.0).contains(&ab));
                if a == b {
                    prop_assert_eq!(ab, 1.0);
                }
            }
        }
    }

    #[test]
    fn test_groups_respect_thresholds(docs in documents(), min_similarity in 0.0f64..=1.0) {
        let dir = write_corpus(&docs);
        let options = options(&dir).with_min_similarity(min_similarity);
        let index = build(&options);
        let groups = groups_at(&index, &options);

        let mut seen = BTreeSet::new();
        for group in &groups {
            prop_assert!(group.len() >= options.effective_min_duplicates());
            prop_assert!(group.similarity >= min_similarity);
            prop_assert!(group.similarity <= 1.0);
            for member in &group.members {
                prop_assert!(member.length >= options.effective_min_length());
                // a segment belongs to at most one group
                prop_assert!(seen.insert(member.segment));
            }
        }
        for pair in groups.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_detection_is_deterministic(docs in documents()) {
        let dir = write_corpus(&docs);
        let single = options(&dir).with_io_threads(1);
        let multi = options(&dir).with_io_threads(3);

        let first = groups_at(&build(&single), &single);
        let second = groups_at(&build(&multi), &multi);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_raising_similarity_refines_groups(
        docs in documents(),
        low in 0.0f64..=1.0,
        delta in 0.0f64..=0.5,
    ) {
        let dir = write_corpus(&docs);
        let loose = options(&dir).with_min_similarity(low);
        let strict = options(&dir).with_min_similarity((low + delta).min(1.0));
        let index = build(&loose);

        let loose_sets = member_sets(&groups_at(&index, &loose));
        let strict_sets = member_sets(&groups_at(&index, &strict));

        for set in &strict_sets {
            prop_assert!(loose_sets.iter().any(|outer| set.is_subset(outer)));
        }
        let loose_total: usize = loose_sets.iter().map(BTreeSet::len).sum();
        let strict_total: usize = strict_sets.iter().map(BTreeSet::len).sum();
        prop_assert!(strict_total <= loose_total);
    }

    #[test]
    fn test_raising_min_duplicates_never_adds_groups(docs in documents(), k in 1usize..5) {
        let dir = write_corpus(&docs);
        let base = options(&dir).with_min_duplicates(k);
        let more = options(&dir).with_min_duplicates(k + 1);
        let index = build(&base);

        let fewer_members = member_sets(&groups_at(&index, &base));
        let more_members = member_sets(&groups_at(&index, &more));

        prop_assert!(more_members.len() <= fewer_members.len());
        for set in &more_members {
            prop_assert!(fewer_members.contains(set));
        }
    }

    #[test]
    fn test_length_filter_is_at_least_ngram(docs in documents(), ngram in 1usize..4) {
        let dir = write_corpus(&docs);
        let options = options(&dir).with_min_length(0).with_ngram_length(ngram);
        let index = build(&options);

        for segment in index.segments.iter() {
            prop_assert!(segment.length >= ngram);
            prop_assert!(!segment.shingles.is_empty());
            prop_assert!(segment.shingles.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
