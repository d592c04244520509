use std::env;
use std::fs;

use drugclass_tools::models::classification::parse_tree;
use drugclass_tools::{ExportConfig, ExportOutcome, ExporterBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example export_tree -- <TREE_JSON> [CYCLE_ID ...]");
        return Ok(());
    }

    let json = fs::read_to_string(&args[1])?;
    let tree = parse_tree(&json)?;
    let selected: Vec<u32> = if args.len() > 2 {
        args[2..]
            .iter()
            .map(|id| id.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()?
    } else {
        tree.iter().map(|cycle| cycle.id).collect()
    };
    log::info!("Loaded {} cycles, exporting {:?}", tree.len(), selected);

    let exporter = ExporterBuilder::new()
        .set_config(ExportConfig::from_env()?)
        .build()?;
    match exporter.export_selection(&tree, &selected).await? {
        ExportOutcome::Skipped => println!("Nothing selected."),
        ExportOutcome::Delivered { strategy, path, failures, .. } => {
            for failure in failures.values() {
                println!("  skipped: {failure}");
            }
            println!("Saved {} (via {strategy})", path.display());
        }
        ExportOutcome::PrintOpened { strategy, location, .. } => {
            println!("Print view opened at {} (via {strategy})", location.display());
        }
    }
    Ok(())
}
