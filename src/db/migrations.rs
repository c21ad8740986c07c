use anyhow::{bail, Context, Result};
use rusqlite::{Connection, Transaction};

const CURRENT_SCHEMA_VERSION: i32 = 2;

const SCHEMA_V1: &str = "
CREATE TABLE stages (
    id                 TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    timer_status       TEXT NOT NULL DEFAULT 'Stopped',
    time_spent_minutes INTEGER NOT NULL DEFAULT 0,
    timer_started_at   TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);
";

const SCHEMA_V2: &str = "
CREATE TABLE work_sessions (
    id               TEXT PRIMARY KEY,
    stage_id         TEXT NOT NULL REFERENCES stages(id),
    started_at       TEXT NOT NULL,
    ended_at         TEXT,
    status           TEXT NOT NULL,
    duration_minutes INTEGER,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX idx_work_sessions_stage
    ON work_sessions(stage_id, started_at);

CREATE INDEX idx_work_sessions_status
    ON work_sessions(status);
";

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(SCHEMA_V1)
                .context("failed to create stages table")?;
            Ok(())
        }
        2 => {
            tx.execute_batch(SCHEMA_V2)
                .context("failed to create work_sessions table")?;
            Ok(())
        }
        _ => bail!("unknown migration target version: {version}"),
    }
}
