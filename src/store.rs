// 🗄️ Document Store - SQLite-backed collections of JSON documents
//
// Stand-in for the remote collection store: one table, one row per document,
// keyed by (collection, doc_id). Bodies are stored as JSON text exactly as the
// entity serializes (camelCase fields), so the feeds decode them unchanged.

use crate::feed::{FeedError, SnapshotSource};
use crate::model::{Collection, Record};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (collection, doc_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database: {:?}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

/// Insert or replace documents. Missing ids get a fresh UUID and missing
/// `createdAt` gets the current time. Returns the stored records.
pub fn upsert_documents(
    conn: &Connection,
    collection: Collection,
    documents: Vec<Value>,
) -> Result<Vec<Record<Value>>> {
    let now = Utc::now().to_rfc3339();
    let mut stored = Vec::with_capacity(documents.len());

    for document in documents {
        let mut body: Map<String, Value> = match document {
            Value::Object(map) => map,
            other => anyhow::bail!(
                "Document in '{}' must be a JSON object, got: {}",
                collection,
                other
            ),
        };

        let id = match body.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(n)) => n.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        body.entry("createdAt")
            .or_insert_with(|| Value::String(now.clone()));

        let body = Value::Object(body);
        let json = serde_json::to_string(&body)?;

        conn.execute(
            "INSERT INTO documents (collection, doc_id, body, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, doc_id) DO UPDATE SET body = excluded.body",
            params![collection.name(), id, json, now],
        )
        .with_context(|| format!("Failed to store document '{}' in '{}'", id, collection))?;

        stored.push(Record::new(id, body));
    }

    debug!(collection = %collection, count = stored.len(), "documents upserted");
    Ok(stored)
}

/// Returns true if a document was removed
pub fn delete_document(conn: &Connection, collection: Collection, doc_id: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
        params![collection.name(), doc_id],
    )?;
    Ok(removed > 0)
}

/// All documents of one collection in insertion order
pub fn load_collection(conn: &Connection, collection: Collection) -> Result<Vec<Record<Value>>> {
    let mut stmt = conn.prepare(
        "SELECT doc_id, body FROM documents
         WHERE collection = ?1
         ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map([collection.name()], |row| {
            let id: String = row.get(0)?;
            let body: String = row.get(1)?;
            Ok((id, body))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, body)| {
            let value: Value = serde_json::from_str(&body)
                .with_context(|| format!("Corrupt document '{}' in '{}'", id, collection))?;
            Ok(Record::new(id, value))
        })
        .collect()
}

pub fn count_documents(conn: &Connection, collection: Collection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE collection = ?1",
        [collection.name()],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// Load a seed file: a JSON object keyed by collection name, each holding an
/// array of documents. Returns how many documents were stored per collection.
pub fn import_seed(conn: &Connection, seed_path: &Path) -> Result<BTreeMap<Collection, usize>> {
    let text = fs::read_to_string(seed_path)
        .with_context(|| format!("Failed to read seed file: {:?}", seed_path))?;
    let seed: BTreeMap<String, Vec<Value>> =
        serde_json::from_str(&text).context("Seed file must map collection names to arrays")?;

    // Every key must name a collection before anything is written
    let batches = seed
        .into_iter()
        .map(|(name, documents)| Ok((name.parse::<Collection>()?, documents)))
        .collect::<Result<Vec<_>>>()?;

    let tx = conn
        .unchecked_transaction()
        .context("Failed to begin seed import")?;

    let mut imported = BTreeMap::new();
    for (collection, documents) in batches {
        let stored = upsert_documents(&tx, collection, documents)?;
        imported.insert(collection, stored.len());
    }
    tx.commit().context("Failed to commit seed import")?;

    info!(
        path = %seed_path.display(),
        documents = imported.values().sum::<usize>(),
        "seed imported"
    );
    Ok(imported)
}

// ============================================================================
// SNAPSHOT SOURCE
// ============================================================================

/// Feeds the books straight from the document table
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    pub fn new(conn: Connection) -> Self {
        SqliteSource { conn }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(SqliteSource::new(open_database(path)?))
    }
}

impl SnapshotSource for SqliteSource {
    fn fetch(&self, collection: Collection) -> Result<Vec<Record<Value>>, FeedError> {
        load_collection(&self.conn, collection).map_err(|e| FeedError::Unavailable {
            collection,
            reason: format!("{:#}", e),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_upsert_assigns_ids_and_replaces() {
        let conn = memory_db();

        let stored = upsert_documents(
            &conn,
            Collection::Villages,
            vec![json!({"name": "Kovilur"}), json!({"id": "v2", "name": "Pallathur"})],
        )
        .unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id.len(), 36);
        assert_eq!(stored[1].id, "v2");
        assert!(stored[0].value.get("createdAt").is_some());

        upsert_documents(
            &conn,
            Collection::Villages,
            vec![json!({"id": "v2", "name": "Pallathur North"})],
        )
        .unwrap();

        let loaded = load_collection(&conn, Collection::Villages).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].value["name"], "Pallathur North");
        assert_eq!(count_documents(&conn, Collection::Villages).unwrap(), 2);
    }

    #[test]
    fn test_collections_are_isolated() {
        let conn = memory_db();
        upsert_documents(&conn, Collection::Villages, vec![json!({"id": "x", "name": "A"})]).unwrap();

        assert!(load_collection(&conn, Collection::Devotees).unwrap().is_empty());
        assert!(delete_document(&conn, Collection::Villages, "x").unwrap());
        assert!(!delete_document(&conn, Collection::Villages, "x").unwrap());
    }

    #[test]
    fn test_non_object_document_rejected() {
        let conn = memory_db();
        assert!(upsert_documents(&conn, Collection::Villages, vec![json!(42)]).is_err());
    }

    #[test]
    fn test_import_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.json");
        let mut file = fs::File::create(&seed_path).unwrap();
        write!(
            file,
            "{}",
            json!({
                "devotees": [{"taxpersonName": "A", "taxType": "Full", "status": "Active"}],
                "taxEntries": [
                    {"devoteeName": "A", "taxType": "Full", "year": 2024, "amount": 100, "paid": true},
                    {"devoteeName": "A", "taxType": "Full", "year": 2023, "amount": 100, "paid": false}
                ]
            })
        )
        .unwrap();

        let conn = open_database(&dir.path().join("temple.db")).unwrap();
        let imported = import_seed(&conn, &seed_path).unwrap();

        assert_eq!(imported.get(&Collection::TaxEntries), Some(&2));
        assert_eq!(imported.get(&Collection::Devotees), Some(&1));

        let source = SqliteSource::new(conn);
        assert_eq!(source.fetch(Collection::TaxEntries).unwrap().len(), 2);
    }

    #[test]
    fn test_import_rejects_unknown_collection() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.json");
        fs::write(&seed_path, r#"{"temples": []}"#).unwrap();

        let conn = memory_db();
        assert!(import_seed(&conn, &seed_path).is_err());
    }

    #[test]
    fn test_import_writes_nothing_when_any_key_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.json");
        // "devotees" sorts before "temples", so it would be written first
        fs::write(
            &seed_path,
            json!({
                "devotees": [{"taxpersonName": "A", "taxType": "Full", "status": "Active"}],
                "temples": [{"name": "Main"}]
            })
            .to_string(),
        )
        .unwrap();

        let conn = memory_db();
        assert!(import_seed(&conn, &seed_path).is_err());
        assert_eq!(count_documents(&conn, Collection::Devotees).unwrap(), 0);
    }

    #[test]
    fn test_import_rolls_back_on_bad_document() {
        let dir = tempfile::tempdir().unwrap();
        let seed_path = dir.path().join("seed.json");
        fs::write(
            &seed_path,
            json!({
                "devotees": [{"taxpersonName": "A", "taxType": "Full", "status": "Active"}],
                "villages": [42]
            })
            .to_string(),
        )
        .unwrap();

        let conn = memory_db();
        assert!(import_seed(&conn, &seed_path).is_err());
        assert_eq!(count_documents(&conn, Collection::Devotees).unwrap(), 0);
        println!("✅ Seed import rollback test passed");
    }
}
