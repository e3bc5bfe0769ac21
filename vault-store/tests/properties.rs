mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;
use vault_store::models::{RecordPatch, Tags};
use vault_store::ListQuery;

use common::{open, packet, sorted};

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", "e"]), 0..5)
        .prop_map(|v| v.into_iter().map(str::to_owned).collect())
}

#[derive(Debug, Clone)]
enum Op {
    Create { slot: usize, tags: Vec<String> },
    Update { slot: usize, tags: Option<Vec<String>> },
    Delete { slot: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, arb_tags()).prop_map(|(slot, tags)| Op::Create { slot, tags }),
        (0..4usize, prop::option::of(arb_tags())).prop_map(|(slot, tags)| Op::Update { slot, tags }),
        (0..4usize).prop_map(|slot| Op::Delete { slot }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the tag index always equals every row's tag list
    #[test]
    fn prop_tag_index_never_drifts(ops in prop::collection::vec(arb_op(), 1..25)) {
        let t = open();
        let packets = t.vault.data_packets();

        for (n, op) in ops.into_iter().enumerate() {
            // Errors (already exists, not found) are expected; drift is not
            let _ = match op {
                Op::Create { slot, tags } => {
                    let refs: Vec<&str> = tags.iter().map(String::as_str).collect();
                    packets.create(&format!("c{n}"), packet(&format!("p{slot}"), "u1", &refs)).map(|_| ())
                }
                Op::Update { slot, tags } => {
                    let mut patch = RecordPatch::new();
                    if let Some(tags) = tags {
                        patch = patch.with_tags(Tags::new(tags).unwrap());
                    }
                    packets.update(&format!("e{n}"), &format!("p{slot}"), patch).map(|_| ())
                }
                Op::Delete { slot } => packets.delete(&format!("p{slot}")),
            };

            for slot in 0..4 {
                let id = format!("p{slot}");
                let indexed = packets.indexed_tags(&id).unwrap();
                match packets.get(&id) {
                    Ok(record) => prop_assert_eq!(sorted(&record.tags), indexed),
                    Err(_) => prop_assert!(indexed.is_empty()),
                }
            }
        }
    }

    /// Property: paging with a fixed limit visits every match exactly once
    #[test]
    fn prop_pagination_is_total(
        count in 0..30usize,
        limit in 1..10u32,
        tagged in prop::collection::vec(any::<bool>(), 30),
    ) {
        let t = open();
        let packets = t.vault.data_packets();
        let mut expected = BTreeSet::new();
        for i in 0..count {
            let tags: &[&str] = if tagged[i] { &["hit"] } else { &[] };
            packets.create(&format!("r{i}"), packet(&format!("p{i:02}"), "u1", tags)).unwrap();
            if tagged[i] {
                expected.insert(format!("p{i:02}"));
            }
            // Several records share each timestamp
            if i % 3 == 2 {
                t.clock.advance(chrono::Duration::seconds(1));
            }
        }

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = packets
                .list(&ListQuery::for_user("u1").tag("hit").limit(limit).offset(offset))
                .unwrap();
            if page.is_empty() {
                break;
            }
            prop_assert!(page.len() <= limit as usize);
            seen.extend(page.into_iter().map(|r| r.id));
            offset += limit;
        }

        prop_assert_eq!(seen.len(), expected.len());
        prop_assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
    }
}
