use chrono::{DateTime, SecondsFormat, Utc};
use outsweep_models::catalog::{CatalogEntry, Eligibility};
use outsweep_models::outbound::{ItemInstance, OutboundOffer};
use outsweep_models::store_schema::{OutboundRow, STORE_DDL};
use rusqlite::Connection;

use crate::catalog::CatalogSnapshot;
use crate::error::StoreError;

/// SQLite-backed storage for outbounds, the item catalog and partner cooldowns.
///
/// Not `Sync`; share it through `SqliteRepository`.
pub struct SqliteStore {
    conn: Connection,
}

/// Timestamps are stored as fixed-width RFC 3339 so they sort lexically.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Timestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl SqliteStore {
    /// Open (or create) the store database. Creates the schema and enables WAL.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(STORE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database with the schema applied. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(STORE_DDL)?;
        Ok(Self { conn })
    }

    /// Record a newly sent outbound. Replaces any row with the same id.
    pub fn insert_outbound(&self, offer: &OutboundOffer) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO outbounds \
             (id, trade_type, partner_id, created_at, offering_json, requesting_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                offer.id as i64,
                offer.trade_type,
                offer.partner_id as i64,
                timestamp(offer.created_at),
                serde_json::to_string(&offer.offering)?,
                serde_json::to_string(&offer.requesting)?,
            ],
        )?;
        Ok(())
    }

    /// Raw outbound rows, oldest first.
    pub fn outbound_rows(&self) -> Result<Vec<OutboundRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, trade_type, partner_id, created_at, offering_json, requesting_json \
             FROM outbounds ORDER BY created_at, id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(OutboundRow {
                    id: row.get(0)?,
                    trade_type: row.get(1)?,
                    partner_id: row.get(2)?,
                    created_at: row.get(3)?,
                    offering_json: row.get(4)?,
                    requesting_json: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// All pending outbounds, oldest first.
    ///
    /// Rows whose item lists or timestamp cannot be decoded are logged and
    /// left out; they never hide the remaining rows.
    pub fn list_pending(&self) -> Result<Vec<OutboundOffer>, StoreError> {
        let rows = self.outbound_rows()?;
        let mut offers = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match decode_outbound(row) {
                Ok(offer) => offers.push(offer),
                Err(e) => {
                    tracing::error!(offer_id = id, error = %e, "Skipping malformed outbound row");
                }
            }
        }
        Ok(offers)
    }

    /// Delete an outbound. Returns whether a row was removed.
    pub fn remove_outbound(&self, offer_id: u64) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM outbounds WHERE id = ?1",
            rusqlite::params![offer_id as i64],
        )?;
        Ok(deleted > 0)
    }

    pub fn count_outbounds(&self) -> Result<usize, StoreError> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM outbounds", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert or update a single catalog entry.
    pub fn upsert_item(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO items \
             (item_id, name, value, rap, offer_value, request_value, offerable, requestable, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                entry.item_id as i64,
                entry.name,
                entry.value,
                entry.rap,
                entry.offer_value,
                entry.request_value,
                entry.eligibility.offerable,
                entry.eligibility.requestable,
                timestamp(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Batch upsert of catalog entries within one transaction.
    pub fn upsert_items(&mut self, entries: &[CatalogEntry]) -> Result<usize, StoreError> {
        let updated_at = timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO items \
                 (item_id, name, value, rap, offer_value, request_value, offerable, requestable, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for entry in entries {
                stmt.execute(rusqlite::params![
                    entry.item_id as i64,
                    entry.name,
                    entry.value,
                    entry.rap,
                    entry.offer_value,
                    entry.request_value,
                    entry.eligibility.offerable,
                    entry.eligibility.requestable,
                    updated_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    /// Read the whole item catalog into an immutable snapshot.
    pub fn load_catalog(&self) -> Result<CatalogSnapshot, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT item_id, name, value, rap, offer_value, request_value, offerable, requestable \
             FROM items",
        )?;

        let entries = stmt
            .query_map([], |row| {
                let item_id: i64 = row.get(0)?;
                Ok(CatalogEntry {
                    item_id: item_id as u64,
                    name: row.get(1)?,
                    value: row.get(2)?,
                    rap: row.get(3)?,
                    offer_value: row.get(4)?,
                    request_value: row.get(5)?,
                    eligibility: Eligibility {
                        offerable: row.get(6)?,
                        requestable: row.get(7)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CatalogSnapshot::from_entries(entries, Utc::now()))
    }

    /// Put a partner on cooldown until `expires_at`.
    pub fn set_cooldown(&self, partner_id: u64, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cooldowns (partner_id, expires_at) VALUES (?1, ?2)",
            rusqlite::params![partner_id as i64, timestamp(expires_at)],
        )?;
        Ok(())
    }

    pub fn is_on_cooldown(&self, partner_id: u64, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM cooldowns WHERE partner_id = ?1 AND expires_at > ?2")?;
        let count: usize =
            stmt.query_row(rusqlite::params![partner_id as i64, timestamp(now)], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Remove a partner's cooldown. Returns whether one existed.
    pub fn clear_cooldown(&self, partner_id: u64) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM cooldowns WHERE partner_id = ?1",
            rusqlite::params![partner_id as i64],
        )?;
        Ok(deleted > 0)
    }

    /// Delete cooldowns that have run out. Returns the number of rows deleted.
    pub fn expire_cooldowns(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM cooldowns WHERE expires_at <= ?1",
            rusqlite::params![timestamp(now)],
        )?;
        Ok(deleted)
    }
}

fn decode_outbound(row: OutboundRow) -> Result<OutboundOffer, StoreError> {
    let offering: Vec<ItemInstance> = serde_json::from_str(&row.offering_json)?;
    let requesting: Vec<ItemInstance> = serde_json::from_str(&row.requesting_json)?;
    Ok(OutboundOffer {
        id: row.id as u64,
        trade_type: row.trade_type,
        partner_id: row.partner_id as u64,
        created_at: parse_timestamp(&row.created_at)?,
        offering,
        requesting,
    })
}
