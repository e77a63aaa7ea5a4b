//! Walkthrough of the shop example: build a small shop, change prices
//! across several transactions, then walk an item's history backwards.
//!
//! Run with `RUST_LOG=verdb_core=debug` to watch the commits.

use tracing::info;
use tracing_subscriber::EnvFilter;
use verdb_core::{CoreError, CoreResult, Database, ReadContext, Reference};
use verdb_testkit::fixtures::group_titled;
use verdb_testkit::{Item, ItemGroup, Shop, ShopEntity};

fn main() -> CoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let database = Database::in_memory("shop", Shop::empty())?;

    let soap: Reference<ShopEntity> = database.update(|tx| {
        let soap = Item::of(tx, "Soap", 1.79)?;
        let melon = Item::of(tx, "Melon", 0.99)?;
        let deo = ItemGroup::of(tx, "Deo")?;
        let deo = ItemGroup::add_item(&deo, tx, &soap)?;
        let test = ItemGroup::of(tx, "Test")?;
        let test = ItemGroup::add_item(&test, tx, &melon)?;
        let root = tx.root()?;
        let root = Shop::change(&root, tx, "test title")?;
        Shop::add_item_groups(&root, tx, &[deo, test])?;
        Ok(Reference::to(soap.as_ref()))
    })?;

    database.update(|tx| {
        let milk = Item::of(tx, "Milk", 1.29)?;
        let deo = group_titled(tx, "Deo")?;
        ItemGroup::add_item(&deo, tx, &milk)?;
        Ok(())
    })?;

    database.update(|tx| {
        let root = tx.root()?;
        Shop::change(&root, tx, "My Shop")?;
        let item = soap.resolve(tx)?;
        Item::set_price(&item, tx, 2.99)?;
        Ok(())
    })?;

    database.update(|tx| {
        let item = soap.resolve(tx)?;
        Item::set_price(&item, tx, 3.99)?;
        Ok(())
    })?;

    // Same price again: nothing to commit, no new version.
    database.update(|tx| {
        let item = soap.resolve(tx)?;
        Item::set_price(&item, tx, 3.99)?;
        Ok(())
    })?;

    database.perform(|ctx| -> CoreResult<()> {
        let deo = group_titled(ctx, "Deo")?;
        let group = deo.as_item_group().ok_or_else(|| CoreError::invariant("not a group"))?;
        info!(version = %ctx.snapshot().version(), items = group.item_ids().len(), "current group");

        if let Some(before) = ctx.version_before(&deo) {
            let older = before
                .entry()
                .as_item_group()
                .ok_or_else(|| CoreError::invariant("not a group"))?;
            info!(version = %before.snapshot_version(), items = older.item_ids().len(), "previous group revision");
        }

        let item = soap.resolve(ctx)?;
        for entry in ctx.versions_before(&item) {
            let price = entry
                .entry()
                .as_item()
                .map(Item::price)
                .ok_or_else(|| CoreError::invariant("not an item"))?;
            entry.perform(|old| -> CoreResult<()> {
                info!(
                    version = %old.snapshot().version(),
                    price,
                    shop = old.root()?.title(),
                    "historical price"
                );
                Ok(())
            })?;
        }
        Ok(())
    })?;

    Ok(())
}
