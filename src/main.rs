use anyhow::Context;
use clap::{Parser, Subcommand};
use device_heatmap::config::AppConfig;
use device_heatmap::{data, export, group, heatmap, ShapeLayer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count unique devices inside each configured region
    Count {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Write the labeled regions as GeoJSON (defaults to output.shapes_geojson)
        #[arg(short, long)]
        write: bool,
    },
    /// Render the event heatmap for the configured view
    Heatmap {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Count { config, write } => {
            let app_config = AppConfig::load_from_file(config)?;

            // 1. Group events into a snapshot
            let events = data::load_events(&app_config.input)?;
            let snapshot = group(&events).context("Failed to group point events")?;

            // 2. Label every region against it
            let mut layer = ShapeLayer::new(app_config.input.regions_crs);
            layer.attach(Arc::new(snapshot));

            for named in data::load_regions(&app_config.input)? {
                match layer.finalize(named.region) {
                    Ok(id) => {
                        let label = layer.label(id).map(|c| c.label()).unwrap_or_default();
                        println!("{}\t{}\t{}", id, named.name, label);
                    }
                    Err(e) => warn!(region = %named.name, error = %e, "skipping region"),
                }
            }

            // 3. Export
            if *write {
                let path = &app_config.output.shapes_geojson;
                export::write_geojson(path, export::shapes_to_geojson(&layer)?)?;
                info!(path = ?path, shapes = layer.len(), "wrote labeled shapes");
            }
        }
        Commands::Heatmap { config, out } => {
            let app_config = AppConfig::load_from_file(config)?;
            let events = data::load_events(&app_config.input)?;

            let img = heatmap::render_heatmap(&app_config.view, &app_config.heatmap, &events)?;
            let path = out.as_ref().unwrap_or(&app_config.output.heatmap_png);
            heatmap::save_heatmap(path, &img)?;
        }
    }

    Ok(())
}
