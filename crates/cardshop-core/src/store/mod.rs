// ── Reactive data store ──
//
// One `EntityCollection` per entity family. The store is the only writer
// of its collection; views and streams only ever see snapshots.

mod collection;

pub use collection::{
    Change, EntityCollection, InsertPosition, Prior, Snapshot, StoreEvent, SubscriptionId,
};
