mod queries;

use common::{Error, Result};
use std::fmt;
use std::time::Instant;
use tracing::info;

use crate::warehouse::Warehouse;

/// The transformation steps, in the order they have to run: song and artist
/// population filter on fact rows written by `Songplay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Songplay,
    Users,
    Song,
    Artist,
    Time,
}

impl Step {
    pub const ORDER: [Step; 5] = [
        Step::Songplay,
        Step::Users,
        Step::Song,
        Step::Artist,
        Step::Time,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::Songplay => "songplay",
            Step::Users => "users",
            Step::Song => "song",
            Step::Artist => "artist",
            Step::Time => "time",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserUpsert {
    pub inserted: u64,
    pub updated: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub songplays: u64,
    pub users: UserUpsert,
    pub songs: u64,
    pub artists: u64,
    pub times: u64,
}

/// Runs a step's statements as one unit and returns the per-statement counts.
async fn run_step(warehouse: &dyn Warehouse, step: Step, statements: &[String]) -> Result<Vec<u64>> {
    warehouse
        .execute_unit(statements)
        .await
        .map_err(|e| Error::Transform {
            step: step.name().to_string(),
            message: e.to_string(),
        })
}

fn affected_at(affected: &[u64], index: usize) -> u64 {
    affected.get(index).copied().unwrap_or(0)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Appends one fact row per staged event.
pub async fn insert_songplays(warehouse: &dyn Warehouse) -> Result<u64> {
    let started = Instant::now();
    let affected = run_step(warehouse, Step::Songplay, &[queries::SONGPLAY_INSERT.to_string()]).await?;
    let rows = affected_at(&affected, 0);
    info!(step = %Step::Songplay, rows, elapsed_ms = elapsed_ms(started), "Transformation step done");
    Ok(rows)
}

/// Inserts users seen for the first time and moves existing users to the
/// level of their latest song play.
pub async fn upsert_users(warehouse: &dyn Warehouse) -> Result<UserUpsert> {
    let started = Instant::now();
    let affected = run_step(warehouse, Step::Users, &queries::user_upsert()).await?;
    let upsert = UserUpsert {
        inserted: affected_at(&affected, queries::USERS_INSERTED_AT),
        updated: affected_at(&affected, queries::USERS_UPDATED_AT),
    };
    info!(
        step = %Step::Users,
        inserted = upsert.inserted,
        updated = upsert.updated,
        elapsed_ms = elapsed_ms(started),
        "Transformation step done"
    );
    Ok(upsert)
}

pub async fn insert_songs(warehouse: &dyn Warehouse) -> Result<u64> {
    let started = Instant::now();
    let affected = run_step(warehouse, Step::Song, &[queries::SONG_INSERT.to_string()]).await?;
    let rows = affected_at(&affected, 0);
    info!(step = %Step::Song, rows, elapsed_ms = elapsed_ms(started), "Transformation step done");
    Ok(rows)
}

pub async fn insert_artists(warehouse: &dyn Warehouse) -> Result<u64> {
    let started = Instant::now();
    let affected = run_step(warehouse, Step::Artist, &[queries::ARTIST_INSERT.to_string()]).await?;
    let rows = affected_at(&affected, 0);
    info!(step = %Step::Artist, rows, elapsed_ms = elapsed_ms(started), "Transformation step done");
    Ok(rows)
}

pub async fn insert_times(warehouse: &dyn Warehouse) -> Result<u64> {
    let started = Instant::now();
    let sql = queries::time_insert(warehouse.dialect());
    let affected = run_step(warehouse, Step::Time, &[sql]).await?;
    let rows = affected_at(&affected, 0);
    info!(step = %Step::Time, rows, elapsed_ms = elapsed_ms(started), "Transformation step done");
    Ok(rows)
}

/// Runs every step in [`Step::ORDER`]. Steps commit independently, so a
/// failure leaves the earlier ones in place.
pub async fn run_all(warehouse: &dyn Warehouse) -> Result<TransformReport> {
    let mut report = TransformReport::default();
    for step in Step::ORDER {
        match step {
            Step::Songplay => report.songplays = insert_songplays(warehouse).await?,
            Step::Users => report.users = upsert_users(warehouse).await?,
            Step::Song => report.songs = insert_songs(warehouse).await?,
            Step::Artist => report.artists = insert_artists(warehouse).await?,
            Step::Time => report.times = insert_times(warehouse).await?,
        }
    }
    Ok(report)
}
