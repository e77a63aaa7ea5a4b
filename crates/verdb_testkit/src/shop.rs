//! The shop example domain.
//!
//! A closed entity type with three kinds: a single `Shop` root holding
//! item groups through reference slot 0, `ItemGroup`s holding items
//! through their own slot 0, and leaf `Item`s. The operation style is
//! deliberately mechanical, each mutator checks currency, compares
//! fields, and persists, because these methods stand in for generated
//! entity code. The engine derives the back-reference deltas from the
//! persisted revisions itself.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use verdb_core::{
    ChangeContext, CoreError, CoreResult, Entity, Id, ReadContext, RefSets, RefSlot,
    SnapshotVersion,
};

/// The closed entity type of the shop domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShopEntity {
    /// The root entity.
    Shop(Shop),
    /// A named group of items, referenced by the shop.
    ItemGroup(ItemGroup),
    /// A sellable item, referenced by one group.
    Item(Item),
}

impl ShopEntity {
    /// Downcast to a shop.
    #[must_use]
    pub fn as_shop(&self) -> Option<&Shop> {
        match self {
            Self::Shop(shop) => Some(shop),
            _ => None,
        }
    }

    /// Downcast to an item group.
    #[must_use]
    pub fn as_item_group(&self) -> Option<&ItemGroup> {
        match self {
            Self::ItemGroup(group) => Some(group),
            _ => None,
        }
    }

    /// Downcast to an item.
    #[must_use]
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    /// The entity's display title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Shop(shop) => &shop.title,
            Self::ItemGroup(group) => &group.title,
            Self::Item(item) => &item.title,
        }
    }
}

impl Entity for ShopEntity {
    fn id(&self) -> Id {
        match self {
            Self::Shop(shop) => shop.id,
            Self::ItemGroup(group) => group.id,
            Self::Item(item) => item.id,
        }
    }

    fn version(&self) -> u64 {
        match self {
            Self::Shop(shop) => shop.version,
            Self::ItemGroup(group) => group.version,
            Self::Item(item) => item.version,
        }
    }

    fn snapshot_version(&self) -> SnapshotVersion {
        match self {
            Self::Shop(shop) => shop.snapshot_version,
            Self::ItemGroup(group) => group.snapshot_version,
            Self::Item(item) => item.snapshot_version,
        }
    }

    fn referenced_ids(&self) -> RefSets {
        let mut sets = RefSets::new();
        match self {
            Self::Shop(shop) => {
                sets.insert(Shop::ITEM_GROUPS, shop.item_group_ids.clone());
            }
            Self::ItemGroup(group) => {
                sets.insert(ItemGroup::ITEMS, group.item_ids.clone());
            }
            Self::Item(_) => {}
        }
        sets
    }
}

/// Fails with `StaleRead` unless `entity` is the revision its bound
/// context resolves for the same id. Unlike the engine-level check, this
/// one also holds inside historical contexts.
fn check_current<'db, C: ReadContext<'db, ShopEntity>>(
    entity: &Arc<ShopEntity>,
    ctx: &C,
) -> CoreResult<()> {
    let live = ctx.resolve(entity.id())?;
    if Arc::ptr_eq(&live, entity) {
        Ok(())
    } else {
        Err(CoreError::stale_read(entity.id()))
    }
}

fn expect_shop(entity: &Arc<ShopEntity>) -> CoreResult<&Shop> {
    entity
        .as_shop()
        .ok_or_else(|| CoreError::invariant(format!("{} is not a shop", entity.id())))
}

fn expect_item_group(entity: &Arc<ShopEntity>) -> CoreResult<&ItemGroup> {
    entity
        .as_item_group()
        .ok_or_else(|| CoreError::invariant(format!("{} is not an item group", entity.id())))
}

fn expect_item(entity: &Arc<ShopEntity>) -> CoreResult<&Item> {
    entity
        .as_item()
        .ok_or_else(|| CoreError::invariant(format!("{} is not an item", entity.id())))
}

fn resolve_sorted<'db, C: ReadContext<'db, ShopEntity>>(
    ids: &im::HashSet<Id>,
    ctx: &C,
) -> CoreResult<Vec<Arc<ShopEntity>>> {
    let mut entries: Vec<Arc<ShopEntity>> = ids
        .iter()
        .map(|id| ctx.resolve(*id))
        .collect::<CoreResult<_>>()?;
    entries.sort_by_key(|entry| entry.id());
    Ok(entries)
}

/// The root entity: a titled shop holding item groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    id: Id,
    version: u64,
    snapshot_version: SnapshotVersion,
    title: String,
    item_group_ids: im::HashSet<Id>,
}

impl Shop {
    /// Reference slot holding the item-group ids.
    pub const ITEM_GROUPS: RefSlot = RefSlot::new(0);

    /// The untitled shop every database starts with, id 1.
    #[must_use]
    pub fn empty() -> Arc<ShopEntity> {
        Arc::new(ShopEntity::Shop(Self {
            id: Id::new(1),
            version: 0,
            snapshot_version: SnapshotVersion::new(0),
            title: String::new(),
            item_group_ids: im::HashSet::new(),
        }))
    }

    /// The shop's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ids of the groups this shop holds.
    #[must_use]
    pub fn item_group_ids(&self) -> &im::HashSet<Id> {
        &self.item_group_ids
    }

    fn change_intern(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: String,
        item_group_ids: im::HashSet<Id>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let shop = expect_shop(this)?;
        check_current(this, tx)?;
        if title == shop.title && item_group_ids == shop.item_group_ids {
            return Ok(Arc::clone(this));
        }
        tx.persist(Arc::new(ShopEntity::Shop(Self {
            id: shop.id,
            version: shop.version + 1,
            snapshot_version: tx.next_snapshot_version(),
            title,
            item_group_ids,
        })))
    }

    /// Renames the shop. Returns the input revision when nothing changes.
    pub fn change(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: &str,
    ) -> CoreResult<Arc<ShopEntity>> {
        let shop = expect_shop(this)?;
        Self::change_intern(this, tx, title.to_owned(), shop.item_group_ids.clone())
    }

    /// Adds one group to the shop.
    pub fn add_item_group(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        group: &Arc<ShopEntity>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let shop = expect_shop(this)?;
        let mut ids = shop.item_group_ids.clone();
        ids.insert(group.id());
        Self::change_intern(this, tx, shop.title.clone(), ids)
    }

    /// Adds several groups to the shop.
    pub fn add_item_groups(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        groups: &[Arc<ShopEntity>],
    ) -> CoreResult<Arc<ShopEntity>> {
        let shop = expect_shop(this)?;
        let mut ids = shop.item_group_ids.clone();
        for group in groups {
            ids.insert(group.id());
        }
        Self::change_intern(this, tx, shop.title.clone(), ids)
    }

    /// Removes one group from the shop. The group itself stays in the
    /// database; only the reference goes away.
    pub fn remove_item_group(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        group: &Arc<ShopEntity>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let shop = expect_shop(this)?;
        let mut ids = shop.item_group_ids.clone();
        ids.remove(&group.id());
        Self::change_intern(this, tx, shop.title.clone(), ids)
    }

    /// Resolves the shop's groups, sorted by id.
    pub fn item_groups<'db, C: ReadContext<'db, ShopEntity>>(
        this: &Arc<ShopEntity>,
        ctx: &C,
    ) -> CoreResult<Vec<Arc<ShopEntity>>> {
        let shop = expect_shop(this)?;
        check_current(this, ctx)?;
        resolve_sorted(&shop.item_group_ids, ctx)
    }
}

/// A named group of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    id: Id,
    version: u64,
    snapshot_version: SnapshotVersion,
    title: String,
    item_ids: im::HashSet<Id>,
}

impl ItemGroup {
    /// Reference slot holding the item ids.
    pub const ITEMS: RefSlot = RefSlot::new(0);

    /// Creates and persists a new, empty group.
    pub fn of(tx: &mut ChangeContext<'_, ShopEntity>, title: &str) -> CoreResult<Arc<ShopEntity>> {
        tx.persist(Arc::new(ShopEntity::ItemGroup(Self {
            id: tx.next_id(),
            version: 0,
            snapshot_version: tx.next_snapshot_version(),
            title: title.to_owned(),
            item_ids: im::HashSet::new(),
        })))
    }

    /// The group's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ids of the items this group holds.
    #[must_use]
    pub fn item_ids(&self) -> &im::HashSet<Id> {
        &self.item_ids
    }

    fn change_intern(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: String,
        item_ids: im::HashSet<Id>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let group = expect_item_group(this)?;
        check_current(this, tx)?;
        if title == group.title && item_ids == group.item_ids {
            return Ok(Arc::clone(this));
        }
        tx.persist(Arc::new(ShopEntity::ItemGroup(Self {
            id: group.id,
            version: group.version + 1,
            snapshot_version: tx.next_snapshot_version(),
            title,
            item_ids,
        })))
    }

    /// Renames the group.
    pub fn change(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: &str,
    ) -> CoreResult<Arc<ShopEntity>> {
        let group = expect_item_group(this)?;
        Self::change_intern(this, tx, title.to_owned(), group.item_ids.clone())
    }

    /// Adds one item to the group.
    pub fn add_item(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        item: &Arc<ShopEntity>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let group = expect_item_group(this)?;
        let mut ids = group.item_ids.clone();
        ids.insert(item.id());
        Self::change_intern(this, tx, group.title.clone(), ids)
    }

    /// Adds several items to the group.
    pub fn add_items(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        items: &[Arc<ShopEntity>],
    ) -> CoreResult<Arc<ShopEntity>> {
        let group = expect_item_group(this)?;
        let mut ids = group.item_ids.clone();
        for item in items {
            ids.insert(item.id());
        }
        Self::change_intern(this, tx, group.title.clone(), ids)
    }

    /// Removes one item from the group.
    pub fn remove_item(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        item: &Arc<ShopEntity>,
    ) -> CoreResult<Arc<ShopEntity>> {
        let group = expect_item_group(this)?;
        let mut ids = group.item_ids.clone();
        ids.remove(&item.id());
        Self::change_intern(this, tx, group.title.clone(), ids)
    }

    /// Resolves the group's items, sorted by id.
    pub fn items<'db, C: ReadContext<'db, ShopEntity>>(
        this: &Arc<ShopEntity>,
        ctx: &C,
    ) -> CoreResult<Vec<Arc<ShopEntity>>> {
        let group = expect_item_group(this)?;
        check_current(this, ctx)?;
        resolve_sorted(&group.item_ids, ctx)
    }

    /// The shop holding this group, found through the back-reference
    /// index.
    pub fn shop<'db, C: ReadContext<'db, ShopEntity>>(
        this: &Arc<ShopEntity>,
        ctx: &C,
    ) -> CoreResult<Arc<ShopEntity>> {
        expect_item_group(this)?;
        check_current(this, ctx)?;
        ctx.referenced_by(this.id(), Shop::ITEM_GROUPS)?
            .into_iter()
            .find(|entry| entry.as_shop().is_some())
            .ok_or_else(|| {
                CoreError::invariant(format!("{} is not held by any shop", this.id()))
            })
    }
}

/// A sellable item with a price. Items hold no outgoing references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: Id,
    version: u64,
    snapshot_version: SnapshotVersion,
    title: String,
    price: f64,
}

impl Item {
    /// Creates and persists a new item.
    pub fn of(
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: &str,
        price: f64,
    ) -> CoreResult<Arc<ShopEntity>> {
        tx.persist(Arc::new(ShopEntity::Item(Self {
            id: tx.next_id(),
            version: 0,
            snapshot_version: tx.next_snapshot_version(),
            title: title.to_owned(),
            price,
        })))
    }

    /// The item's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The item's price.
    #[must_use]
    pub fn price(&self) -> f64 {
        self.price
    }

    /// Retitles and/or reprices the item. Returns the input revision
    /// when nothing changes.
    pub fn change(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        title: &str,
        price: f64,
    ) -> CoreResult<Arc<ShopEntity>> {
        let item = expect_item(this)?;
        check_current(this, tx)?;
        if title == item.title && price == item.price {
            return Ok(Arc::clone(this));
        }
        tx.persist(Arc::new(ShopEntity::Item(Self {
            id: item.id,
            version: item.version + 1,
            snapshot_version: tx.next_snapshot_version(),
            title: title.to_owned(),
            price,
        })))
    }

    /// Reprices the item, keeping its title.
    pub fn set_price(
        this: &Arc<ShopEntity>,
        tx: &mut ChangeContext<'_, ShopEntity>,
        price: f64,
    ) -> CoreResult<Arc<ShopEntity>> {
        let item = expect_item(this)?;
        let title = item.title.clone();
        Self::change(this, tx, &title, price)
    }

    /// The group holding this item, found through the back-reference
    /// index.
    pub fn item_group<'db, C: ReadContext<'db, ShopEntity>>(
        this: &Arc<ShopEntity>,
        ctx: &C,
    ) -> CoreResult<Arc<ShopEntity>> {
        expect_item(this)?;
        check_current(this, ctx)?;
        ctx.referenced_by(this.id(), ItemGroup::ITEMS)?
            .into_iter()
            .find(|entry| entry.as_item_group().is_some())
            .ok_or_else(|| {
                CoreError::invariant(format!("{} is not held by any group", this.id()))
            })
    }
}
