use clap::{Arg, Command};
use std::process;

const DEFAULT_CONFIG: &str = "dwh.cfg";

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

#[tokio::main]
async fn main() {
    let matches = Command::new("Sparkify Warehouse ETL")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Provisions the star schema and loads it from S3")
        .subcommand(
            Command::new("create-tables")
                .about("Drop and recreate every staging and star-schema table")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("etl")
                .about("Load staging tables and populate the star schema")
                .arg(config_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("create-tables", create_matches)) => {
            let config_path = create_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_CONFIG);
            println!("Resetting warehouse schema with config: {}", config_path);

            if let Err(e) = etl::run_create_tables(config_path).await {
                eprintln!("Schema reset error: {}", e);
                process::exit(1);
            }
        }
        Some(("etl", etl_matches)) => {
            let config_path = etl_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_CONFIG);
            println!("Starting ETL pipeline with config: {}", config_path);

            match etl::run_etl_pipeline(config_path).await {
                Ok(report) => {
                    for (table, rows) in &report.row_counts {
                        println!("{:<15} {:>10}", table.name(), rows);
                    }
                }
                Err(e) => {
                    eprintln!("ETL pipeline error: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Please specify a valid subcommand. Use --help for usage information.");
            process::exit(1);
        }
    }
}
