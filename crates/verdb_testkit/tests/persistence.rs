//! Persistence round trips: the append-only log replayed into a fresh
//! database instance must reproduce the committed state.

use std::sync::Arc;
use verdb_core::{Config, Database, DiffPolicy, Entity, Id, ReadContext, SnapshotVersion};
use verdb_storage::{FileStore, LogStore, MemoryStore, RecordKind, RecordName};
use verdb_testkit::fixtures::{compact_codec, group_titled, seeded_shop_with_parts};
use verdb_testkit::{Item, Shop, ShopEntity};

fn reopen_over(store: Arc<MemoryStore>) -> Database<ShopEntity> {
    Database::with_parts("shop", Shop::empty(), Config::new(), store, compact_codec()).unwrap()
}

#[test]
fn diff_records_replay_into_the_same_state() {
    let store = Arc::new(MemoryStore::new());
    let seeded = seeded_shop_with_parts(
        Config::new(),
        Arc::clone(&store) as Arc<dyn LogStore>,
        compact_codec(),
    )
    .unwrap();
    let soap = seeded.soap;
    seeded
        .database
        .update(|tx| {
            let item = soap.resolve(tx)?;
            Item::set_price(&item, tx, 2.99)?;
            Ok(())
        })
        .unwrap();

    // One baseline plus one diff per committed version.
    let mut names = store.list("shop").unwrap();
    names.sort();
    assert_eq!(
        names,
        vec![
            RecordName::new("shop", 0, RecordKind::Diff),
            RecordName::new("shop", 1, RecordKind::Diff),
            RecordName::new("shop", 2, RecordKind::Diff),
        ]
    );

    let restored = reopen_over(Arc::clone(&store));
    restored.read_from_file_system().unwrap();

    let original = seeded.database.current_snapshot();
    let replayed = restored.current_snapshot();
    assert_eq!(replayed.version(), original.version());
    assert_eq!(replayed.len(), original.len());
    assert!(replayed.verify_back_refs());
    for version in 0..2 {
        let version = SnapshotVersion::new(version);
        let original_changed: Vec<_> = original
            .history_snapshot(version)
            .unwrap()
            .changed_ids()
            .collect();
        let replayed_changed: Vec<_> = replayed
            .history_snapshot(version)
            .unwrap()
            .changed_ids()
            .collect();
        assert_eq!(original_changed.len(), replayed_changed.len());
    }

    restored.perform(|ctx| {
        assert_eq!(ctx.root().unwrap().title(), "Shop 1");
        let item = soap.resolve(ctx).unwrap();
        assert_eq!(item.as_item().unwrap().price(), 2.99);
        // The history walk works on replayed state too.
        let before = ctx.version_before(&item).unwrap();
        assert_eq!(before.entry().as_item().unwrap().price(), 1.79);
    });
}

#[test]
fn replay_resumes_from_a_full_baseline() {
    let store = Arc::new(MemoryStore::new());
    let seeded = seeded_shop_with_parts(
        Config::new().with_diff_policy(DiffPolicy::full_every(2)),
        Arc::clone(&store) as Arc<dyn LogStore>,
        compact_codec(),
    )
    .unwrap();
    let soap = seeded.soap;
    seeded
        .database
        .update(|tx| {
            let item = soap.resolve(tx)?;
            Item::set_price(&item, tx, 2.99)?;
            Ok(())
        })
        .unwrap();
    assert!(store.read(&RecordName::new("shop", 2, RecordKind::Full)).is_ok());

    let restored = reopen_over(Arc::clone(&store));
    restored.read_from_file_system().unwrap();

    assert_eq!(restored.current_version(), SnapshotVersion::new(2));
    restored.perform(|ctx| {
        let item = soap.resolve(ctx).unwrap();
        assert_eq!(item.as_item().unwrap().price(), 2.99);
        // A full baseline carries no object history.
        assert!(ctx.version_before(&item).is_none());
    });

    // New commits continue from fresh ids, not reused ones.
    let milk_id = restored
        .update(|tx| {
            let milk = Item::of(tx, "Milk", 1.29)?;
            let group1 = group_titled(tx, "Group1")?;
            verdb_testkit::ItemGroup::add_item(&group1, tx, &milk)?;
            Ok(milk.id())
        })
        .unwrap();
    assert!(milk_id > Id::new(5));
}

#[test]
fn clear_history_rebaselines_the_log() {
    let store = Arc::new(MemoryStore::new());
    let seeded = seeded_shop_with_parts(
        Config::new(),
        Arc::clone(&store) as Arc<dyn LogStore>,
        compact_codec(),
    )
    .unwrap();
    seeded.database.clear_history().unwrap();
    assert!(store.read(&RecordName::new("shop", 1, RecordKind::Full)).is_ok());

    let restored = reopen_over(store);
    restored.read_from_file_system().unwrap();
    assert_eq!(restored.current_version(), SnapshotVersion::new(1));
    restored.perform(|ctx| {
        assert_eq!(ctx.root().unwrap().title(), "Shop 1");
        let group1 = group_titled(ctx, "Group1").unwrap();
        assert_eq!(group1.as_item_group().unwrap().item_ids().len(), 1);
    });
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new()
        .with_directory(dir.path())
        .with_pretty_print(true);
    {
        let db = Database::new("shop", Shop::empty(), config.clone()).unwrap();
        db.update(|tx| {
            let root = tx.root()?;
            Shop::change(&root, tx, "Shop 1")?;
            Ok(())
        })
        .unwrap();
    }
    let baseline = dir.path().join("shop_v0_diff.json");
    let first = dir.path().join("shop_v1_diff.json");
    assert!(baseline.is_file());
    assert!(first.is_file());
    // Pretty printing was requested.
    let text = std::fs::read_to_string(&first).unwrap();
    assert!(text.contains('\n'));

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let restored = Database::with_parts(
        "shop",
        Shop::empty(),
        Config::ephemeral(),
        store,
        compact_codec(),
    )
    .unwrap();
    restored.read_from_file_system().unwrap();
    assert_eq!(restored.current_version(), SnapshotVersion::new(1));
    restored.perform(|ctx| {
        assert_eq!(ctx.root().unwrap().title(), "Shop 1");
    });
}
