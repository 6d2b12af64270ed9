//! Partition and entry operations on the SQLite store.
//!
//! Each operation runs as a single statement (or a single transaction) on the
//! connection's background thread, which gives atomic per-key writes.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::entry::{CacheEntry, RequestKey, ResponseSnapshot};
use super::store::PartitionStore;
use crate::Error;

fn partition_exists(conn: &rusqlite::Connection, name: &str) -> Result<bool, Error> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

#[async_trait]
impl PartitionStore for CacheDb {
    async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        let partition = partition.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                if !partition_exists(conn, &partition)? {
                    return Err(Error::PartitionMissing(partition));
                }

                let row = conn
                    .query_row(
                        "SELECT method, url, response_url, status, status_text, headers_json, body, stored_at
                         FROM entries WHERE partition = ?1 AND key_hash = ?2",
                        params![partition, key_hash],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, u16>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, String>(5)?,
                                row.get::<_, Vec<u8>>(6)?,
                                row.get::<_, String>(7)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((method, url, response_url, status, status_text, headers_json, body, stored_at)) = row else {
                    return Ok(None);
                };

                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                let response = ResponseSnapshot { url: response_url, status, status_text, headers, body };
                Ok(Some(CacheEntry { key: RequestKey { method, url }, response, stored_at }))
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<(), Error> {
        let partition = partition.to_string();
        let key_hash = entry.key.hash();
        let headers_json = serde_json::to_string(&entry.response.headers)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                if !partition_exists(conn, &partition)? {
                    return Err(Error::PartitionMissing(partition));
                }

                conn.execute(
                    "INSERT INTO entries (
                        partition, key_hash, method, url, response_url, status, status_text, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        response_url = excluded.response_url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &partition,
                        &key_hash,
                        &entry.key.method,
                        &entry.key.url,
                        &entry.response.url,
                        entry.response.status,
                        &entry.response.status_text,
                        &headers_json,
                        &entry.response.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                if !partition_exists(conn, &partition)? {
                    return Err(Error::PartitionMissing(partition));
                }

                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE partition = ?1 ORDER BY url")?;
                let keys = stmt
                    .query_map(params![partition], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<CacheEntry>, Error> {
        let key_hash = key.hash();
        let partition: Option<String> = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let name = conn
                    .query_row(
                        "SELECT partition FROM entries WHERE key_hash = ?1 ORDER BY partition LIMIT 1",
                        params![key_hash],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(name)
            })
            .await
            .map_err(Error::from)?;

        match partition {
            Some(name) => match self.get(&name, key).await {
                Err(Error::PartitionMissing(_)) => Ok(None),
                other => other,
            },
            None => Ok(None),
        }
    }
}
