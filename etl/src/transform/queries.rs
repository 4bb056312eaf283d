//! Set-based SQL for the five transformation steps, written in the subset
//! shared by Redshift and SQLite.

use crate::warehouse::Dialect;

/// Scratch table holding the latest song-play state per user.
pub const USER_LAST_SONG: &str = "user_last_song";

/// Every staged event becomes a fact row. Catalog matches need the exact
/// artist, title and duration; anything else keeps NULL song and artist ids.
pub const SONGPLAY_INSERT: &str = "
INSERT INTO songplay (start_time, user_id, song_id, artist_id, session_id, user_agent)
SELECT e.ts, e.userId, s.song_id, s.artist_id, e.sessionId, e.userAgent
FROM staging_event e
LEFT JOIN staging_song s
    ON e.artist = s.artist_name
    AND e.song = s.title
    AND e.length = s.duration";

const USER_LAST_SONG_CREATE: &str = "
CREATE TEMP TABLE user_last_song AS
SELECT userId, firstName, lastName, gender, level
FROM (
    SELECT userId, firstName, lastName, gender, level,
        ROW_NUMBER() OVER (
            PARTITION BY userId
            ORDER BY ts DESC, sessionId DESC NULLS LAST, itemInSession DESC NULLS LAST, level DESC NULLS LAST
        ) AS recency
    FROM staging_event
    WHERE page = 'NextSong'
        AND userId IS NOT NULL
        AND ts IS NOT NULL
) ranked
WHERE recency = 1";

const USERS_INSERT_MISSING: &str = "
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT uls.userId, uls.firstName, uls.lastName, uls.gender, uls.level
FROM user_last_song uls
LEFT JOIN users ON users.user_id = uls.userId
WHERE users.user_id IS NULL";

// Only level follows the latest event; names and gender keep their first values.
const USERS_UPDATE_LEVEL: &str = "
UPDATE users
SET level = uls.level
FROM user_last_song uls
WHERE users.user_id = uls.userId
    AND (users.level <> uls.level
        OR (users.level IS NULL AND uls.level IS NOT NULL)
        OR (users.level IS NOT NULL AND uls.level IS NULL))";

/// Position of the insert within [`user_upsert`].
pub const USERS_INSERTED_AT: usize = 2;
/// Position of the level update within [`user_upsert`].
pub const USERS_UPDATED_AT: usize = 3;

pub fn user_upsert() -> Vec<String> {
    let drop_scratch = format!("DROP TABLE IF EXISTS {}", USER_LAST_SONG);
    vec![
        drop_scratch.clone(),
        USER_LAST_SONG_CREATE.to_string(),
        USERS_INSERT_MISSING.to_string(),
        USERS_UPDATE_LEVEL.to_string(),
        drop_scratch,
    ]
}

/// Songs referenced by at least one fact row and not yet in the dimension.
pub const SONG_INSERT: &str = "
INSERT INTO song (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT s.song_id, s.title, s.artist_id, s.year, s.duration,
        ROW_NUMBER() OVER (
            PARTITION BY s.song_id
            ORDER BY s.title, s.artist_id, s.year, s.duration
        ) AS occurrence
    FROM staging_song s
    WHERE s.song_id IS NOT NULL
        AND NOT EXISTS (SELECT 1 FROM song WHERE song.song_id = s.song_id)
        AND s.song_id IN (SELECT DISTINCT song_id FROM songplay)
) candidates
WHERE occurrence = 1";

/// Artists referenced by at least one fact row and not yet in the dimension.
pub const ARTIST_INSERT: &str = "
INSERT INTO artist (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT s.artist_id, s.artist_name, s.artist_location, s.artist_latitude, s.artist_longitude,
        ROW_NUMBER() OVER (
            PARTITION BY s.artist_id
            ORDER BY s.song_id
        ) AS occurrence
    FROM staging_song s
    WHERE s.artist_id IS NOT NULL
        AND NOT EXISTS (SELECT 1 FROM artist WHERE artist.artist_id = s.artist_id)
        AND s.artist_id IN (SELECT DISTINCT artist_id FROM songplay)
) candidates
WHERE occurrence = 1";

/// Calendar breakdown of every staged timestamp, song play or not.
pub fn time_insert(dialect: Dialect) -> String {
    format!(
        "
INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT converted.ts,
    date_part('hour', converted.ts_converted),
    date_part('day', converted.ts_converted),
    date_part('week', converted.ts_converted),
    date_part('month', converted.ts_converted),
    date_part('year', converted.ts_converted),
    date_part('dow', converted.ts_converted)
FROM (
    SELECT DISTINCT ts, {} AS ts_converted
    FROM staging_event
    WHERE ts IS NOT NULL
) converted
LEFT JOIN time ON time.start_time = converted.ts
WHERE time.start_time IS NULL",
        dialect.epoch_millis_to_timestamp("ts")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_insert_converts_per_dialect() {
        let redshift = time_insert(Dialect::Redshift);
        assert!(redshift.contains("'epoch'::timestamp + ts / 1000.0 * INTERVAL '1 second' AS ts_converted"));

        let sqlite = time_insert(Dialect::Sqlite);
        assert!(sqlite.contains("SELECT DISTINCT ts, ts AS ts_converted"));
    }

    #[test]
    fn test_user_upsert_scratch_table_is_dropped_both_ends() {
        let statements = user_upsert();
        assert_eq!(statements.len(), 5);
        assert_eq!(statements.first(), statements.last());
        assert!(statements[USERS_INSERTED_AT].trim_start().starts_with("INSERT INTO users"));
        assert!(statements[USERS_UPDATED_AT].trim_start().starts_with("UPDATE users"));
    }
}
