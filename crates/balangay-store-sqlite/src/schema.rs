//! SQL schema for the Balangay SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sitios (
    sitio_id TEXT PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

-- Deduplicated on the full field tuple; get-or-create only, never updated.
CREATE TABLE IF NOT EXISTS addresses (
    address_id     TEXT PRIMARY KEY,
    province       TEXT NOT NULL,
    city           TEXT NOT NULL,
    barangay       TEXT NOT NULL,
    street         TEXT NOT NULL,
    sitio_id       TEXT REFERENCES sitios(sitio_id),
    external_sitio TEXT             -- free text when the sitio is not registered
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id   TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    role       TEXT NOT NULL,       -- 'admin' | 'staff'
    assignment TEXT NOT NULL,       -- 'profiling' | 'clinic' | 'unassigned'
    rp_id      TEXT REFERENCES residents(rp_id),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    person_id    TEXT PRIMARY KEY,
    first_name   TEXT NOT NULL,
    middle_name  TEXT,
    last_name    TEXT NOT NULL,
    suffix       TEXT,
    birth_date   TEXT NOT NULL,     -- ISO 8601 calendar date
    sex          TEXT NOT NULL,     -- 'male' | 'female'
    civil_status TEXT NOT NULL,     -- 'single' | 'married' | 'widowed' | 'separated'
    contact_no   TEXT,
    email        TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS person_addresses (
    person_id  TEXT NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    address_id TEXT NOT NULL REFERENCES addresses(address_id),
    PRIMARY KEY (person_id, address_id)
);

-- Every link is journalled with the person's history version at link time;
-- joining on (person_id, history_id) answers address-as-of-version queries.
CREATE TABLE IF NOT EXISTS person_address_history (
    person_id   TEXT NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    address_id  TEXT NOT NULL REFERENCES addresses(address_id),
    history_id  INTEGER NOT NULL,
    recorded_at TEXT NOT NULL
);

-- History tables are strictly append-only.
-- No UPDATE is ever issued; rows leave only by parent cascade.
CREATE TABLE IF NOT EXISTS person_history (
    person_id     TEXT NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    history_id    INTEGER NOT NULL, -- 1, 2, 3… per person
    staff_id      TEXT NOT NULL REFERENCES staff(staff_id),
    reason        TEXT,
    snapshot_json TEXT NOT NULL,    -- full prior state of the person row
    recorded_at   TEXT NOT NULL,
    PRIMARY KEY (person_id, history_id)
);

CREATE TABLE IF NOT EXISTS residents (
    rp_id         TEXT PRIMARY KEY, -- display id, {YY}{MM}{DD}{seq:05}
    person_id     TEXT NOT NULL UNIQUE REFERENCES persons(person_id),
    staff_id      TEXT NOT NULL REFERENCES staff(staff_id),
    voter         INTEGER NOT NULL DEFAULT 0,
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id  TEXT PRIMARY KEY,
    rp_id       TEXT NOT NULL REFERENCES residents(rp_id) ON DELETE CASCADE,
    username    TEXT NOT NULL UNIQUE,
    secret_hash TEXT NOT NULL,      -- opaque; verification lives elsewhere
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS households (
    hh_id         TEXT PRIMARY KEY, -- HH-{YY}{MM}-{seq:05}
    address_id    TEXT NOT NULL REFERENCES addresses(address_id),
    owner_rp_id   TEXT NOT NULL REFERENCES residents(rp_id),
    staff_id      TEXT NOT NULL REFERENCES staff(staff_id),
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS families (
    fam_id        TEXT PRIMARY KEY, -- {YY}{MM}{DD}{seq:04}-{O|R|S}
    hh_id         TEXT NOT NULL REFERENCES households(hh_id),
    occupancy     TEXT NOT NULL,    -- 'owner' | 'renter' | 'sharer'
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS family_compositions (
    composition_id TEXT PRIMARY KEY,
    fam_id         TEXT NOT NULL REFERENCES families(fam_id) ON DELETE CASCADE,
    rp_id          TEXT NOT NULL REFERENCES residents(rp_id),
    role           TEXT NOT NULL,   -- 'independent' | 'mother' | 'father' | 'dependent' | 'guardian'
    joined_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS respondents (
    br_id      TEXT PRIMARY KEY,    -- BR-{YY}{MM}{DD}-{seq:05}
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    contact_no TEXT
);

CREATE TABLE IF NOT EXISTS businesses (
    bus_id        TEXT PRIMARY KEY, -- BUS-{YY}{MM}-{seq:05}
    name          TEXT NOT NULL,
    nature        TEXT NOT NULL,
    status        TEXT NOT NULL,    -- 'active' | 'inactive' | 'closed'
    owner_rp_id   TEXT REFERENCES residents(rp_id),
    owner_br_id   TEXT REFERENCES respondents(br_id),
    verified_on   TEXT NOT NULL,
    staff_id      TEXT NOT NULL REFERENCES staff(staff_id),
    registered_at TEXT NOT NULL,
    CHECK ((owner_rp_id IS NULL) != (owner_br_id IS NULL))
);

CREATE TABLE IF NOT EXISTS business_history (
    bus_id        TEXT NOT NULL REFERENCES businesses(bus_id) ON DELETE CASCADE,
    history_id    INTEGER NOT NULL,
    staff_id      TEXT NOT NULL REFERENCES staff(staff_id),
    reason        TEXT,
    snapshot_json TEXT NOT NULL,
    recorded_at   TEXT NOT NULL,
    PRIMARY KEY (bus_id, history_id)
);

CREATE TABLE IF NOT EXISTS business_files (
    file_id    TEXT PRIMARY KEY,
    bus_id     TEXT NOT NULL REFERENCES businesses(bus_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    media_type TEXT NOT NULL,
    url        TEXT NOT NULL        -- object-storage location; bytes never land here
);

-- Staged registrations awaiting approval; swept 30 days after creation.
CREATE TABLE IF NOT EXISTS requests (
    request_id   TEXT PRIMARY KEY,
    payload_json TEXT NOT NULL,     -- the full RegistrationRequest
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS request_compositions (
    request_id TEXT NOT NULL REFERENCES requests(request_id) ON DELETE CASCADE,
    rp_id      TEXT NOT NULL REFERENCES residents(rp_id),
    role       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS medicines (
    medicine_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    unit        TEXT NOT NULL,
    quantity    INTEGER NOT NULL,
    CHECK (quantity >= 0)
);

CREATE TABLE IF NOT EXISTS dispenses (
    dispense_id  TEXT PRIMARY KEY,
    medicine_id  TEXT NOT NULL REFERENCES medicines(medicine_id),
    rp_id        TEXT NOT NULL REFERENCES residents(rp_id),
    staff_id     TEXT NOT NULL REFERENCES staff(staff_id),
    quantity     INTEGER NOT NULL,
    dispensed_at TEXT NOT NULL
);

-- Display-id sequence counters, claimed with an atomic upsert inside the
-- transaction that inserts the row. Never derived from row counts.
CREATE TABLE IF NOT EXISTS id_sequences (
    entity_kind TEXT PRIMARY KEY,
    next_seq    INTEGER NOT NULL
);

-- Mirror queue for the sibling system. Rows are written in the same
-- transaction as the entity change they describe.
CREATE TABLE IF NOT EXISTS sync_outbox (
    sync_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    op           TEXT NOT NULL,     -- 'create' | 'update' | 'delete'
    entity       TEXT NOT NULL,
    entity_id    TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    attempts     INTEGER NOT NULL DEFAULT 0,
    last_error   TEXT,
    delivered_at TEXT
);

CREATE INDEX IF NOT EXISTS residents_person_idx     ON residents(person_id);
CREATE INDEX IF NOT EXISTS compositions_rp_idx      ON family_compositions(rp_id);
CREATE INDEX IF NOT EXISTS compositions_fam_idx     ON family_compositions(fam_id);
CREATE INDEX IF NOT EXISTS person_history_idx       ON person_history(person_id);
CREATE INDEX IF NOT EXISTS business_history_idx     ON business_history(bus_id);
CREATE INDEX IF NOT EXISTS requests_created_idx     ON requests(created_at);
CREATE INDEX IF NOT EXISTS outbox_pending_idx       ON sync_outbox(delivered_at);

PRAGMA user_version = 1;
";
