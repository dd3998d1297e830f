//! Development inspector for an Unfold data directory
//!
//! Opens the database named by the `UNFOLD_*` environment (see
//! `unfold_core::config`), prints the active space, and optionally exports.
//!
//! # Usage
//!
//! ```bash
//! # Print spaces and the active page tree
//! cargo run --bin unfold-dev
//!
//! # Export the whole active space as plain text
//! cargo run --bin unfold-dev -- export space
//!
//! # Export one page with its descendants
//! cargo run --bin unfold-dev -- export branch <node-id>
//!
//! # Work on a scratch directory
//! UNFOLD_DB_PATH=/tmp/u/unfold.db UNFOLD_SETTINGS_PATH=/tmp/u/settings.json cargo run --bin unfold-dev
//! ```
//!
//! Log level comes from `RUST_LOG`, defaulting to `info`.

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;
use unfold_core::app::{AppController, ExportOptions};
use unfold_core::config::AppConfig;
use unfold_core::export::PrintScope;
use unfold_core::models::TreeItem;

fn print_tree(items: &[TreeItem], depth: usize) {
    for item in items {
        let marker = if item.children.is_empty() {
            " "
        } else if item.node.is_open {
            "v"
        } else {
            ">"
        };
        let pin = if item.node.is_pinned { " *" } else { "" };
        println!(
            "{}{} {}{}  [{}]",
            "  ".repeat(depth),
            marker,
            item.node.name,
            pin,
            item.node.id
        );
        if item.node.is_open {
            print_tree(&item.children, depth + 1);
        }
    }
}

fn parse_scope(arg: Option<&str>) -> anyhow::Result<PrintScope> {
    match arg.unwrap_or("space") {
        "current" => Ok(PrintScope::Current),
        "branch" => Ok(PrintScope::Branch),
        "space" => Ok(PrintScope::Space),
        other => bail!("unknown export scope '{}', expected current, branch or space", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = AppConfig::from_env();
    println!("Database: {}", config.database_path.display());

    let mut app = AppController::open(config)
        .await
        .context("Failed to open Unfold data")?;

    let active = app.workspace().active_space_id().await;
    println!("\nSpaces:");
    for space in app.workspace().spaces().await {
        let marker = if Some(&space.id) == active.as_ref() { "*" } else { " " };
        println!("  {} {}  [{}]", marker, space.name, space.id);
    }

    println!("\nPages:");
    let tree = app.workspace().file_tree().await;
    if tree.is_empty() {
        println!("  (empty)");
    }
    print_tree(&tree, 1);

    if args.first().map(String::as_str) == Some("export") {
        let scope = parse_scope(args.get(1).map(String::as_str))?;
        match args.get(2) {
            Some(node_id) => {
                if !app.open_page(node_id).await? {
                    bail!("no page with id {}", node_id);
                }
            }
            None if scope != PrintScope::Space => {
                app.restore_last_page().await?;
            }
            None => {}
        }

        match app.export(scope, ExportOptions::default()).await? {
            Some(path) => println!("\nExported to {}", path.display()),
            None => println!("\nNothing to export"),
        }
    }

    app.shutdown().await
}
