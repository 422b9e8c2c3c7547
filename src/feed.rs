// 📡 Collection Feeds - Live snapshots, replace-on-change
//
// A feed delivers the COMPLETE current set of records for one collection every time
// the underlying data changes. There are no diffs: consumers recompute from scratch.
//
// Transport is a plain channel per subscriber; the aggregation logic never sees it.

use crate::model::{Collection, Record};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, warn};

/// Full, ordered-by-arrival snapshot of one collection
pub type Snapshot<T> = Vec<Record<T>>;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum FeedError {
    /// The persistence collaborator could not deliver the collection at all
    #[error("collection '{collection}' is unavailable: {reason}")]
    Unavailable {
        collection: Collection,
        reason: String,
    },

    /// One document did not match the expected entity shape
    #[error("document '{id}' in '{collection}' could not be decoded: {reason}")]
    Decode {
        collection: Collection,
        id: String,
        reason: String,
    },
}

// ============================================================================
// FEED CONTRACT
// ============================================================================

pub trait CollectionFeed<T> {
    /// Latest complete snapshot
    fn current(&self) -> &[Record<T>];
}

/// Raw document source (the document store). One call per logical collection.
pub trait SnapshotSource {
    fn fetch(&self, collection: Collection) -> Result<Vec<Record<Value>>, FeedError>;
}

// ============================================================================
// LIVE FEED
// ============================================================================

/// In-process live feed: `publish` replaces the snapshot and pushes a copy to
/// every subscriber that is still listening.
pub struct LiveFeed<T: Clone> {
    collection: Collection,
    current: Snapshot<T>,
    subscribers: Vec<Sender<Snapshot<T>>>,
}

impl<T: Clone> LiveFeed<T> {
    pub fn new(collection: Collection) -> Self {
        LiveFeed {
            collection,
            current: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Subscribe to snapshots. The receiver immediately holds the current one.
    pub fn subscribe(&mut self) -> Receiver<Snapshot<T>> {
        let (tx, rx) = mpsc::channel();
        // Receiver is alive right here, send cannot fail
        let _ = tx.send(self.current.clone());
        self.subscribers.push(tx);
        rx
    }

    /// Replace the snapshot and notify subscribers. Returns how many were notified.
    pub fn publish(&mut self, records: Snapshot<T>) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(records.clone()).is_ok());
        self.current = records;

        debug!(
            collection = %self.collection,
            records = self.current.len(),
            notified = self.subscribers.len(),
            dropped = before - self.subscribers.len(),
            "published snapshot"
        );

        self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone> CollectionFeed<T> for LiveFeed<T> {
    fn current(&self) -> &[Record<T>] {
        &self.current
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode one raw document into a typed record
pub fn decode_document<T: DeserializeOwned>(
    collection: Collection,
    doc: Record<Value>,
) -> Result<Record<T>, FeedError> {
    let Record { id, value } = doc;
    serde_json::from_value::<T>(value)
        .map(|value| Record::new(id.clone(), value))
        .map_err(|e| FeedError::Decode {
            collection,
            id,
            reason: e.to_string(),
        })
}

/// Decode a whole raw snapshot. Documents that do not decode are skipped and
/// logged; they never fail the snapshot.
pub fn decode_snapshot<T: DeserializeOwned>(
    collection: Collection,
    docs: Vec<Record<Value>>,
) -> Snapshot<T> {
    docs.into_iter()
        .filter_map(|doc| match decode_document(collection, doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("{}", e);
                None
            }
        })
        .collect()
}

// ============================================================================
// STATIC SOURCE
// ============================================================================

/// Fixed in-memory document source. Collections can be marked unavailable to
/// model a failing persistence layer.
#[derive(Debug, Default, Clone)]
pub struct StaticSource {
    documents: HashMap<Collection, Vec<Record<Value>>>,
    unavailable: Vec<Collection>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(mut self, collection: Collection, docs: Vec<Record<Value>>) -> Self {
        self.documents.insert(collection, docs);
        self
    }

    pub fn with_unavailable(mut self, collection: Collection) -> Self {
        self.unavailable.push(collection);
        self
    }
}

impl SnapshotSource for StaticSource {
    fn fetch(&self, collection: Collection) -> Result<Vec<Record<Value>>, FeedError> {
        if self.unavailable.contains(&collection) {
            return Err(FeedError::Unavailable {
                collection,
                reason: "marked unavailable".to_string(),
            });
        }

        Ok(self.documents.get(&collection).cloned().unwrap_or_default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Status, TaxType, Devotee};
    use serde_json::json;

    fn devotee(name: &str) -> Record<Devotee> {
        Record::new(
            format!("d-{}", name),
            Devotee {
                village_name: "Kovilur".to_string(),
                taxperson_name: name.to_string(),
                father_name: String::new(),
                tax_type: Some(TaxType::Full),
                status: Status::Active,
                spl_name: String::new(),
                current_location: String::new(),
                created_at: String::new(),
            },
        )
    }

    #[test]
    fn test_subscribe_receives_current_snapshot() {
        let mut feed = LiveFeed::new(Collection::Devotees);
        feed.publish(vec![devotee("A")]);

        let rx = feed.subscribe();
        let first = rx.try_recv().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].taxperson_name, "A");
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let mut feed = LiveFeed::new(Collection::Devotees);
        let rx = feed.subscribe();
        assert!(rx.try_recv().unwrap().is_empty());

        feed.publish(vec![devotee("A"), devotee("B")]);
        feed.publish(vec![devotee("C")]);

        assert_eq!(rx.try_recv().unwrap().len(), 2);
        let latest = rx.try_recv().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].taxperson_name, "C");
        assert_eq!(feed.current().len(), 1);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut feed: LiveFeed<Devotee> = LiveFeed::new(Collection::Devotees);
        let keep = feed.subscribe();
        let gone = feed.subscribe();
        drop(gone);

        let notified = feed.publish(vec![devotee("A")]);

        assert_eq!(notified, 1);
        assert_eq!(feed.subscriber_count(), 1);
        drop(keep);
    }

    #[test]
    fn test_decode_snapshot_skips_bad_documents() {
        let docs = vec![
            Record::new(
                "ok",
                json!({"taxpersonName": "A", "taxType": "Full", "status": "Active"}),
            ),
            Record::new("bad", json!({"taxpersonName": ["B"], "status": "Active"})),
        ];

        let snapshot: Snapshot<Devotee> = decode_snapshot(Collection::Devotees, docs);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "ok");
    }

    #[test]
    fn test_decode_document_reports_id() {
        let err = decode_document::<Devotee>(
            Collection::Devotees,
            Record::new("x9", json!({"taxpersonName": 4})),
        )
        .unwrap_err();

        match err {
            FeedError::Decode { id, collection, .. } => {
                assert_eq!(id, "x9");
                assert_eq!(collection, Collection::Devotees);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_static_source_unavailable() {
        let source = StaticSource::new()
            .with_documents(Collection::Villages, vec![Record::new("v1", json!({"name": "Kovilur"}))])
            .with_unavailable(Collection::TaxEntries);

        assert_eq!(source.fetch(Collection::Villages).unwrap().len(), 1);
        assert!(source.fetch(Collection::Devotees).unwrap().is_empty());
        assert!(matches!(
            source.fetch(Collection::TaxEntries),
            Err(FeedError::Unavailable { .. })
        ));
    }
}
