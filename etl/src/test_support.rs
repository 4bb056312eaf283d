//! On-disk sources and settings for tests running against the SQLite backend.

use common::config::{
    Backend, IamRoleConfig, LoggingConfig, S3Config, Settings, WarehouseConfig,
};
use serde_json::json;
use std::fs;
use std::path::Path;

/// The paths of the event-log jsonpaths document, in `staging_event` column order.
const EVENT_PATHS: [&str; 18] = [
    "$.artist",
    "$.auth",
    "$.firstName",
    "$.gender",
    "$.itemInSession",
    "$.lastName",
    "$.length",
    "$.level",
    "$.location",
    "$.method",
    "$.page",
    "$.registration",
    "$.sessionId",
    "$.song",
    "$.status",
    "$.ts",
    "$['userAgent']",
    "$.userId",
];

/// Two song plays from user 8 and one logged-out page view, two catalog songs of
/// which only "Uprising" is ever played.
#[derive(Default)]
pub struct SourceFixture {
    pub extra_event_line: Option<String>,
}

pub fn local_settings(dir: &Path) -> Settings {
    let location = |name: &str| dir.join(name).to_string_lossy().into_owned();

    Settings {
        cluster: None,
        s3: S3Config {
            log_data: location("log_data"),
            log_jsonpath: location("log_json_path.json"),
            song_data: location("song_data"),
            region: "us-west-2".to_string(),
        },
        iam_role: IamRoleConfig {
            arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
        },
        warehouse: WarehouseConfig {
            backend: Backend::Sqlite,
            sqlite_path: location("dwh.sqlite"),
        },
        logging: LoggingConfig::default(),
    }
}

pub fn write_sources(dir: &Path, fixture: &SourceFixture) {
    fs::write(
        dir.join("log_json_path.json"),
        serde_json::to_vec_pretty(&json!({ "jsonpaths": EVENT_PATHS })).unwrap(),
    )
    .unwrap();

    let events = [
        json!({
            "artist": "Muse", "auth": "Logged In", "firstName": "Kaylee", "gender": "F",
            "itemInSession": 0, "lastName": "Summers", "length": 305.0, "level": "free",
            "location": "Phoenix-Mesa-Scottsdale, AZ", "method": "PUT", "page": "NextSong",
            "registration": 1540344794796.0, "sessionId": 139, "song": "Uprising",
            "status": 200, "ts": 1541105830796i64, "userAgent": "Mozilla/5.0", "userId": "8"
        }),
        json!({
            "artist": null, "auth": "Logged Out", "firstName": null, "gender": null,
            "itemInSession": 0, "lastName": null, "length": null, "level": "free",
            "location": null, "method": "GET", "page": "Home", "registration": null,
            "sessionId": 52, "song": null, "status": 200, "ts": 1541106106796i64,
            "userAgent": null, "userId": ""
        }),
        json!({
            "artist": "Unknown Band", "auth": "Logged In", "firstName": "Kaylee", "gender": "F",
            "itemInSession": 1, "lastName": "Summers", "length": 200.0, "level": "paid",
            "location": "Phoenix-Mesa-Scottsdale, AZ", "method": "PUT", "page": "NextSong",
            "registration": 1540344794796.0, "sessionId": 139, "song": "Nope",
            "status": 200, "ts": 1541106352796i64, "userAgent": "Mozilla/5.0", "userId": "8"
        }),
    ];
    let mut log = events
        .iter()
        .map(|event| event.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    if let Some(line) = &fixture.extra_event_line {
        log.push('\n');
        log.push_str(line);
    }
    fs::create_dir_all(dir.join("log_data/2018/11")).unwrap();
    fs::write(dir.join("log_data/2018/11/2018-11-01-events.json"), log).unwrap();

    let songs = [
        (
            "A/A/A/TRAAAUP128F4288A1B.json",
            json!({
                "num_songs": 1, "artist_id": "ARMUSE", "artist_latitude": 50.54,
                "artist_longitude": -3.49, "artist_location": "Teignmouth", "artist_name": "Muse",
                "song_id": "SOUPRISING", "title": "Uprising", "duration": 305.0, "year": 2009
            }),
        ),
        (
            "A/B/C/TRABCNV128F4288A1C.json",
            json!({
                "num_songs": 1, "artist_id": "ARNOBODY", "artist_latitude": null,
                "artist_longitude": null, "artist_location": "", "artist_name": "Nobody",
                "song_id": "SONEVER", "title": "Never Played", "duration": 100.0, "year": 0
            }),
        ),
    ];
    for (key, song) in songs {
        let path = dir.join("song_data").join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, song.to_string()).unwrap();
    }
}
