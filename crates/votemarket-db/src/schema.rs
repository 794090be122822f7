//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Market settings and epoch oracle
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS oracle_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    epoch_start INTEGER NOT NULL
);

-- ============================================================
-- Whitelist registry and capabilities
-- ============================================================

CREATE TABLE IF NOT EXISTS registry_tokens (
    token BLOB PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS registry_gauges (
    gauge BLOB PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS capabilities (
    account BLOB NOT NULL,
    capability TEXT NOT NULL,
    PRIMARY KEY (account, capability)
);

-- ============================================================
-- Bribes
-- ============================================================

CREATE TABLE IF NOT EXISTS bribes (
    gauge BLOB NOT NULL,
    epoch_start_time INTEGER NOT NULL,
    bribe_index INTEGER NOT NULL,
    token BLOB NOT NULL,
    briber BLOB NOT NULL,
    amount TEXT NOT NULL,
    PRIMARY KEY (gauge, epoch_start_time, bribe_index)
);

-- ============================================================
-- Distributions and claims
-- ============================================================

CREATE TABLE IF NOT EXISTS distributions (
    token BLOB NOT NULL,
    distributor BLOB NOT NULL,
    distribution_id INTEGER NOT NULL,
    merkle_root BLOB NOT NULL,
    amount TEXT NOT NULL,
    bribe_gauge BLOB NOT NULL,
    bribe_epoch_start_time INTEGER NOT NULL,
    bribe_index INTEGER NOT NULL,
    PRIMARY KEY (token, distributor, distribution_id),
    UNIQUE (bribe_gauge, bribe_epoch_start_time, bribe_index),
    FOREIGN KEY (bribe_gauge, bribe_epoch_start_time, bribe_index)
        REFERENCES bribes (gauge, epoch_start_time, bribe_index)
);

CREATE TABLE IF NOT EXISTS channel_balances (
    token BLOB NOT NULL,
    distributor BLOB NOT NULL,
    remaining TEXT NOT NULL,
    PRIMARY KEY (token, distributor)
);

CREATE TABLE IF NOT EXISTS claims (
    token BLOB NOT NULL,
    distributor BLOB NOT NULL,
    distribution_id INTEGER NOT NULL,
    claimer BLOB NOT NULL,
    amount TEXT NOT NULL,
    PRIMARY KEY (token, distributor, distribution_id, claimer),
    FOREIGN KEY (token, distributor, distribution_id)
        REFERENCES distributions (token, distributor, distribution_id)
);

-- ============================================================
-- Token balances held by the token system
-- ============================================================

CREATE TABLE IF NOT EXISTS token_balances (
    token BLOB NOT NULL,
    holder BLOB NOT NULL,
    amount TEXT NOT NULL,
    PRIMARY KEY (token, holder)
);

CREATE TABLE IF NOT EXISTS token_allowances (
    token BLOB NOT NULL,
    owner BLOB NOT NULL,
    spender BLOB NOT NULL,
    amount TEXT NOT NULL,
    PRIMARY KEY (token, owner, spender)
);

-- ============================================================
-- Event journal
-- ============================================================

CREATE TABLE IF NOT EXISTS journal (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    recorded_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_journal_type ON journal(event_type);
"#;
