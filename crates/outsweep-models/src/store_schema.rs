/// SQLite schema shared by everything that reads or writes the store.
///
/// Outbounds are written by whatever sends trades and read/deleted by the
/// sweeper. The same sender puts partners on cooldown; the sweeper only
/// clears cooldown rows. Item lists are stored as JSON arrays of `ItemInstance`.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS outbounds (
///     id              INTEGER PRIMARY KEY,
///     trade_type      TEXT NOT NULL,
///     partner_id      INTEGER NOT NULL,
///     created_at      TEXT NOT NULL,
///     offering_json   TEXT NOT NULL,
///     requesting_json TEXT NOT NULL
/// );
/// ```
pub const STORE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS outbounds (
    id              INTEGER PRIMARY KEY,
    trade_type      TEXT NOT NULL,
    partner_id      INTEGER NOT NULL,
    created_at      TEXT NOT NULL,
    offering_json   TEXT NOT NULL,
    requesting_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_outbounds_created ON outbounds(created_at);
CREATE INDEX IF NOT EXISTS idx_outbounds_partner ON outbounds(partner_id);

CREATE TABLE IF NOT EXISTS items (
    item_id       INTEGER PRIMARY KEY,
    name          TEXT,
    value         INTEGER NOT NULL,
    rap           INTEGER NOT NULL,
    offer_value   INTEGER,
    request_value INTEGER,
    offerable     INTEGER NOT NULL DEFAULT 1,
    requestable   INTEGER NOT NULL DEFAULT 1,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cooldowns (
    partner_id INTEGER PRIMARY KEY,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cooldowns_expires ON cooldowns(expires_at);
";

/// A raw outbound row as read from SQLite, before the item lists are decoded.
#[derive(Debug, Clone)]
pub struct OutboundRow {
    pub id: i64,
    pub trade_type: String,
    pub partner_id: i64,
    pub created_at: String,
    pub offering_json: String,
    pub requesting_json: String,
}
