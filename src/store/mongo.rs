//! MongoDB result store: one document per record, indexed server-side.

use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::sync::{Client, Collection};
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::migration::Migration;

use super::{ResultStore, StoreResult, StoredResult};

/// Document layout for one stored result.
///
/// Unlike the flat file, documents carry the description snapshot, and the
/// timestamp is a native BSON datetime so the `ts` index sorts correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultDoc {
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    ts: DateTime<Utc>,
    num: u32,
    name: String,
    short: String,
    long: String,
    source: String,
    digest: String,
    outcome: bool,
}

/// MongoDB implementation of [`ResultStore`].
///
/// Keeps no local cache: every query goes to the server, relying on the
/// `ts` index and the `(num, name)` compound index created on first use.
/// The connection is established lazily, so constructing the store is free.
pub struct MongoStore {
    host: String,
    port: u16,
    db_name: String,
    collection_name: String,
    collection: Option<Collection<ResultDoc>>,
}

impl MongoStore {
    /// Creates a store over `collection` in database `db_name` without
    /// connecting yet.
    pub fn new(host: &str, port: u16, db_name: &str, collection_name: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            db_name: db_name.to_string(),
            collection_name: collection_name.to_string(),
            collection: None,
        }
    }

    fn collection(&mut self) -> StoreResult<Collection<ResultDoc>> {
        if let Some(collection) = &self.collection {
            return Ok(collection.clone());
        }

        let uri = format!("mongodb://{}:{}/", self.host, self.port);
        let client = Client::with_uri_str(&uri)?;
        let collection = client
            .database(&self.db_name)
            .collection::<ResultDoc>(&self.collection_name);

        collection
            .create_index(IndexModel::builder().keys(doc! { "ts": 1 }).build())
            .run()?;
        collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "num": 1, "name": 1 })
                    .build(),
            )
            .run()?;

        debug!(
            host = %self.host,
            port = self.port,
            db = %self.db_name,
            collection = %self.collection_name,
            "connected to document store"
        );
        self.collection = Some(collection.clone());
        Ok(collection)
    }

    fn collect(cursor: mongodb::sync::Cursor<ResultDoc>) -> StoreResult<Vec<StoredResult>> {
        let mut results = Vec::new();
        for doc in cursor {
            results.push(StoredResult::from(doc?));
        }
        Ok(results)
    }
}

impl ResultStore for MongoStore {
    fn all_results(&mut self) -> StoreResult<Vec<StoredResult>> {
        let cursor = self
            .collection()?
            .find(doc! {})
            .sort(doc! { "ts": 1 })
            .run()?;
        Self::collect(cursor)
    }

    fn add(&mut self, migration: &Migration, outcome: bool) -> StoreResult<()> {
        let doc = ResultDoc {
            ts: Utc::now(),
            num: migration.num(),
            name: migration.name().to_string(),
            short: migration.short()?.to_string(),
            long: migration.long()?.to_string(),
            source: migration.source()?.to_string(),
            digest: migration.digest()?.to_string(),
            outcome,
        };
        self.collection()?.insert_one(doc).run()?;
        Ok(())
    }

    fn find(&mut self, num: u32, name: &str) -> StoreResult<Vec<StoredResult>> {
        let cursor = self
            .collection()?
            .find(doc! { "num": i64::from(num), "name": name })
            .sort(doc! { "ts": 1 })
            .run()?;
        Self::collect(cursor)
    }
}

impl From<ResultDoc> for StoredResult {
    fn from(doc: ResultDoc) -> Self {
        Self {
            ts: doc.ts,
            num: doc.num,
            name: doc.name,
            short: Some(doc.short),
            long: Some(doc.long),
            source: doc.source,
            digest: doc.digest,
            outcome: doc.outcome,
        }
    }
}
