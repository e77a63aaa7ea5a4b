//! Concurrent access smoke test: many readers against one writer, each
//! read transaction seeing one internally consistent snapshot.

use std::sync::Arc;
use std::thread;
use verdb_core::{Entity, ReadContext};
use verdb_testkit::fixtures::seeded_shop;
use verdb_testkit::Item;

#[test]
fn readers_always_see_a_consistent_snapshot() {
    let seeded = seeded_shop().unwrap();
    let database = Arc::new(seeded.database);
    let soap = seeded.soap;

    let writer = {
        let database = Arc::clone(&database);
        thread::spawn(move || {
            for step in 0..50u32 {
                database
                    .update(|tx| {
                        let item = soap.resolve(tx)?;
                        Item::set_price(&item, tx, f64::from(200 + step) / 100.0)?;
                        Ok(())
                    })
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let database = Arc::clone(&database);
            thread::spawn(move || {
                for _ in 0..200 {
                    database.perform(|ctx| {
                        let snapshot = ctx.snapshot();
                        let item = soap.resolve(ctx).unwrap();
                        // The revision resolved through the context is
                        // the one its snapshot holds, whatever the
                        // writer is doing meanwhile.
                        assert!(Arc::ptr_eq(snapshot.get(item.id()).unwrap(), &item));
                        assert!(snapshot.verify_back_refs());
                    });
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    let final_price = database
        .perform(|ctx| soap.resolve(ctx))
        .unwrap()
        .as_item()
        .unwrap()
        .price();
    assert_eq!(final_price, f64::from(249) / 100.0);
}
