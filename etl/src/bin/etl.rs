use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config path from the first argument, dwh.cfg otherwise
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dwh.cfg".to_string());

    let report = etl::run_etl_pipeline(&config_path)
        .await
        .with_context(|| format!("ETL pipeline failed with config {}", config_path))?;

    println!(
        "Loaded {} events and {} songs, {} song plays added",
        report.staging.events_loaded, report.staging.songs_loaded, report.transform.songplays
    );
    Ok(())
}
