// tests/aggregate_merge.rs
use chrono::{TimeZone, Utc};

use livefeed_aggregator::aggregate::merge::{Absorbed, MergeIndex, MergeKey};
use livefeed_aggregator::aggregate::normalize::{NormalizerTable, SourceFormat};
use livefeed_aggregator::aggregate::types::{RawEventRecord, RawLinks, RawOption};

fn option_record(options: &[(&str, &str)]) -> RawEventRecord {
    RawEventRecord {
        source: "s1".into(),
        title: Some("GP Race".into()),
        time: Some("14:00".into()),
        links: RawLinks::Options(
            options
                .iter()
                .map(|(name, link)| RawOption {
                    name: name.to_string(),
                    link: link.to_string(),
                })
                .collect(),
        ),
        ..Default::default()
    }
}

fn key() -> MergeKey {
    MergeKey {
        title: "GP Race".into(),
        time: "14:00".into(),
        source: "s1".into(),
    }
}

#[test]
fn merging_the_same_record_twice_changes_nothing() {
    let table = NormalizerTable::new().register("s1", SourceFormat::OptionList);
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let raw = option_record(&[("feedA", "u1"), ("feedB", "u2")]);

    let mut idx = MergeIndex::new();
    idx.absorb(table.parse(raw.clone(), now).unwrap());
    let before = idx.get(&key()).unwrap().clone();

    assert_eq!(idx.absorb(table.parse(raw, now).unwrap()), Absorbed::Merged(0));
    let after = idx.get(&key()).unwrap();
    assert_eq!(after, &before);
    assert_eq!(idx.len(), 1);
}

#[test]
fn disjoint_option_sets_add_up_first_record_first() {
    let table = NormalizerTable::new().register("s1", SourceFormat::OptionList);
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let first = option_record(&[("a", "u1"), ("b", "u2"), ("c", "u3")]);
    let second = option_record(&[("d", "u4"), ("e", "u5")]);

    let mut idx = MergeIndex::new();
    idx.absorb(table.parse(first, now).unwrap());
    assert_eq!(idx.absorb(table.parse(second, now).unwrap()), Absorbed::Merged(2));

    let ev = idx.get(&key()).unwrap();
    assert_eq!(ev.options, vec!["u1", "u2", "u3", "u4", "u5"]);
    assert_eq!(ev.buttons, vec!["A", "B", "C", "D", "E"]);
}

#[test]
fn overlapping_urls_keep_original_labels() {
    let table = NormalizerTable::new().register("s1", SourceFormat::OptionList);
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    let mut idx = MergeIndex::new();
    idx.absorb(table.parse(option_record(&[("hd", "u1")]), now).unwrap());
    idx.absorb(table.parse(option_record(&[("mirror", "u1"), ("sd", "u2")]), now).unwrap());

    let ev = idx.get(&key()).unwrap();
    assert_eq!(ev.options, vec!["u1", "u2"]);
    assert_eq!(ev.buttons, vec!["HD", "SD"]);
}
