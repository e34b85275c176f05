// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replays a scripted gesture sequence against a graph scene.
//!
//! ```text
//! graphcanvas-replay --scene scene.ron --script drag.ron --out result.ron
//! ```

mod script;

use clap::Parser;
use graphcanvas::Graph;
use script::{replay, ReplayError, Script};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene to load (RON graph). Starts empty when omitted.
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Gesture script (RON)
    #[arg(short = 'g', long)]
    script: PathBuf,

    /// Write the resulting graph here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("graphcanvas=info,graphcanvas_replay=info")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!("Replay failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let mut graph = match &args.scene {
        Some(path) => {
            let graph: Graph = ron::from_str(&std::fs::read_to_string(path)?)?;
            if let Err(e) = graph.validate_reroutes() {
                tracing::warn!("Scene {} has invalid reroutes: {e}", path.display());
            }
            graph
        }
        None => Graph::new("replay"),
    };
    let script = Script::from_ron(&std::fs::read_to_string(&args.script)?)?;
    tracing::info!(
        "Replaying {} step(s) on {} node(s), {} link(s)",
        script.steps.len(),
        graph.node_count(),
        graph.link_count()
    );

    let report = replay(&script, &mut graph)?;
    tracing::info!(
        "Done: {} event(s), {} frame(s), {} item(s) selected",
        report.events.len(),
        report.frames,
        report.selected
    );

    let config = ron::ser::PrettyConfig::default().struct_names(true);
    let text = ron::ser::to_string_pretty(&graph, config)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!("Saved graph to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
