use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dwh.cfg".to_string());

    etl::run_create_tables(&config_path)
        .await
        .with_context(|| format!("Schema reset failed with config {}", config_path))?;

    println!("Warehouse tables recreated");
    Ok(())
}
