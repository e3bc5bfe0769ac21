mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use vault_store::models::{RecordPatch, Tags};
use vault_store::ListQuery;

use common::{open, packet, packet_rows};

const WORKERS: usize = 8;

#[test]
fn racing_creates_with_one_token_store_one_row() {
    let t = open();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let vault = t.vault.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let tag = format!("attempt{i}");
                vault
                    .data_packets()
                    .create("shared-token", packet("p1", "u1", &[tag.as_str()]))
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for record in &results {
        assert_eq!(record, &results[0]);
    }
    assert_eq!(packet_rows(&t.vault), 1);

    let stored = t.vault.data_packets().get("p1").unwrap();
    assert_eq!(
        t.vault.data_packets().indexed_tags("p1").unwrap(),
        stored.tags.as_slice()
    );
}

#[test]
fn concurrent_writers_serialize() {
    let t = open();
    t.vault
        .data_packets()
        .create("seed", packet("shared", "u1", &[]))
        .unwrap();

    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let vault = t.vault.clone();
            thread::spawn(move || {
                let packets = vault.data_packets();
                packets
                    .create(&format!("c{i}"), packet(&format!("p{i}"), "u1", &["batch"]))
                    .unwrap();
                let tags = Tags::new([format!("w{i}")]).unwrap();
                packets
                    .update(&format!("e{i}"), "shared", RecordPatch::new().with_tags(tags))
                    .unwrap();
                vault.close_current_thread()
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }

    let packets = t.vault.data_packets();
    assert_eq!(packets.count(&ListQuery::for_user("u1").tag("batch")).unwrap(), WORKERS as u64);
    for i in 0..WORKERS {
        let entry = packets.ledger_entry(&format!("e{i}")).unwrap().unwrap();
        assert_eq!(entry.resource_id, "shared");
    }

    // Whichever update committed last owns both the row and the index
    let shared = packets.get("shared").unwrap();
    assert_eq!(shared.tags.len(), 1);
    assert_eq!(packets.indexed_tags("shared").unwrap(), shared.tags.as_slice());

    // Worker connections were released; only this thread's remains
    assert_eq!(t.vault.connections().open_connections(), 1);
}

#[test]
fn failed_scope_leaves_no_partial_writes() {
    let t = open();
    let packets = t.vault.data_packets();
    packets.create("r1", packet("p1", "u1", &["a"])).unwrap();

    let bad = t
        .vault
        .connections()
        .with_transaction(|tx| -> vault_store::StoreResult<()> {
            tx.execute("DELETE FROM data_packets_tags WHERE resource_id = 'p1'", [])?;
            tx.execute("INSERT INTO data_packets_tags VALUES ('p1', 'a')", [])?;
            tx.execute("INSERT INTO data_packets_tags VALUES ('missing', 'b')", [])?;
            Ok(())
        });

    assert!(bad.is_err(), "foreign key should reject the orphan tag row");
    assert_eq!(packets.indexed_tags("p1").unwrap(), ["a"]);
}
