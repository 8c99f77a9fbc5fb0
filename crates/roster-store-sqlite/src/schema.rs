//! SQL schema for the roster SQLite store.
//!
//! JSON object columns are stored as text and merged in Rust before being
//! written back, so no JSON1 functions are needed.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tenants (
    tenant_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organizations (
    org_id            TEXT PRIMARY KEY,
    tenant_id         TEXT NOT NULL REFERENCES tenants(tenant_id),
    name              TEXT NOT NULL,
    name_kana         TEXT,
    name_short        TEXT,
    corporate_number  TEXT,
    org_type          TEXT NOT NULL DEFAULT 'client_company',
    business_division TEXT NOT NULL DEFAULT 'dispatch',
    address           TEXT NOT NULL DEFAULT '{}',   -- JSON Address
    settings          TEXT NOT NULL DEFAULT '{}',   -- JSON OrgSettings
    created_at        TEXT NOT NULL,
    deleted_at        TEXT
);

-- Canonical names are unique per tenant among live organizations only.
CREATE UNIQUE INDEX IF NOT EXISTS organizations_name_idx
    ON organizations(tenant_id, name) WHERE deleted_at IS NULL;

-- Alias text is unique across tenants.
CREATE TABLE IF NOT EXISTS organization_aliases (
    alias_id    TEXT PRIMARY KEY,
    org_id      TEXT NOT NULL REFERENCES organizations(org_id),
    alias_name  TEXT NOT NULL UNIQUE,
    source      TEXT NOT NULL,   -- 'partial_match' | 'auto_generated' | 'manual'
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS aliases_org_idx ON organization_aliases(org_id);

CREATE TABLE IF NOT EXISTS people (
    person_id            TEXT PRIMARY KEY,
    tenant_id            TEXT NOT NULL REFERENCES tenants(tenant_id),
    full_name            TEXT NOT NULL,
    names                TEXT NOT NULL DEFAULT '{}',
    demographics         TEXT NOT NULL DEFAULT '{}',
    contact_info         TEXT NOT NULL DEFAULT '{}',
    attributes           TEXT NOT NULL DEFAULT '{}',
    nationality          TEXT,
    current_status       TEXT NOT NULL DEFAULT 'monitoring',
    current_status_notes TEXT,            -- JSON or NULL
    current_visa_type    TEXT,
    visa_expiry_date     TEXT,            -- YYYY-MM-DD
    smarthr_crew_id      TEXT,
    smarthr_synced_at    TEXT,
    slack_hr_list_id     TEXT,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    deleted_at           TEXT,
    UNIQUE (tenant_id, full_name)
);

CREATE TABLE IF NOT EXISTS visa_cases (
    case_id          TEXT PRIMARY KEY,
    tenant_id        TEXT NOT NULL REFERENCES tenants(tenant_id),
    person_id        TEXT NOT NULL REFERENCES people(person_id),
    client_org_id    TEXT REFERENCES organizations(org_id),
    client_name_raw  TEXT,
    case_type        TEXT NOT NULL,
    target_visa_type TEXT,
    deadline         TEXT,            -- YYYY-MM-DD or NULL
    status_tags      TEXT NOT NULL DEFAULT '[]',
    priority         INTEGER NOT NULL DEFAULT 2 CHECK (priority BETWEEN 1 AND 5),
    is_completed     INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL
);

-- Dedup key; a missing deadline equals another missing deadline.
CREATE UNIQUE INDEX IF NOT EXISTS visa_cases_key_idx
    ON visa_cases(tenant_id, person_id, case_type, IFNULL(deadline, ''));

PRAGMA user_version = 1;
";
