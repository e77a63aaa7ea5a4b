//! Canonical shop fixtures for the integration suite.

use crate::shop::{Item, ItemGroup, Shop, ShopEntity};
use std::sync::Arc;
use verdb_core::{Config, CoreError, CoreResult, Database, ReadContext, Reference};
use verdb_codec::{Codec, JsonCodec};
use verdb_storage::LogStore;

/// A freshly seeded database plus a reference to the soap item.
pub struct SeededShop {
    /// The database, one committed transaction past the empty root.
    pub database: Database<ShopEntity>,
    /// Reference to the "Soap" item (price 1.79, in "Group1").
    pub soap: Reference<ShopEntity>,
}

/// Seeds the canonical state in one transaction:
/// `Shop 1` holding `Group1` (Soap, 1.79) and `Group2` (Melon, 0.99).
///
/// # Errors
///
/// Propagates engine errors; a fresh in-memory database cannot conflict.
pub fn seeded_shop() -> CoreResult<SeededShop> {
    let database = Database::in_memory("shop", Shop::empty())?;
    let soap = seed(&database)?;
    Ok(SeededShop { database, soap })
}

/// Seeds the canonical state into a database built over caller-provided
/// parts, for persistence round trips.
///
/// # Errors
///
/// Propagates construction and commit errors.
pub fn seeded_shop_with_parts(
    config: Config,
    store: Arc<dyn LogStore>,
    codec: Arc<dyn Codec>,
) -> CoreResult<SeededShop> {
    let database = Database::with_parts("shop", Shop::empty(), config, store, codec)?;
    let soap = seed(&database)?;
    Ok(SeededShop { database, soap })
}

/// A compact codec for persistence fixtures.
#[must_use]
pub fn compact_codec() -> Arc<dyn Codec> {
    Arc::new(JsonCodec::compact())
}

fn seed(database: &Database<ShopEntity>) -> CoreResult<Reference<ShopEntity>> {
    database.update(|tx| {
        let soap = Item::of(tx, "Soap", 1.79)?;
        let melon = Item::of(tx, "Melon", 0.99)?;
        let group1 = ItemGroup::of(tx, "Group1")?;
        let group1 = ItemGroup::add_item(&group1, tx, &soap)?;
        let group2 = ItemGroup::of(tx, "Group2")?;
        let group2 = ItemGroup::add_item(&group2, tx, &melon)?;
        let root = tx.root()?;
        let root = Shop::change(&root, tx, "Shop 1")?;
        Shop::add_item_groups(&root, tx, &[group1, group2])?;
        Ok(Reference::to(soap.as_ref()))
    })
}

/// Finds the group with the given title among the shop's groups.
///
/// # Errors
///
/// Fails when no group carries that title.
pub fn group_titled<'db, C: ReadContext<'db, ShopEntity>>(
    ctx: &C,
    title: &str,
) -> CoreResult<Arc<ShopEntity>> {
    let root = ctx.root()?;
    Shop::item_groups(&root, ctx)?
        .into_iter()
        .find(|group| group.title() == title)
        .ok_or_else(|| CoreError::invariant(format!("no item group titled {title:?}")))
}
