use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use todosync_core::vault::ListMode;
use todosync_core::{Query, SyncConfig};

use super::build_reconciler;
use crate::render::{Render, render_day};
use crate::utils::tui;

/// A `.md` file is searched for fenced query blocks; anything else is one
/// YAML query.
fn load_query(path: &Path) -> Result<Query> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read query file {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "md") {
        let mut queries = Query::from_note(&content)?;
        if queries.is_empty() {
            anyhow::bail!("No ```todosync block in {}", path.display());
        }
        return Ok(queries.swap_remove(0));
    }
    Ok(Query::parse(&content)?)
}

pub async fn run(mode: ListMode, query: Option<PathBuf>, json: bool) -> Result<()> {
    let query = match query {
        Some(path) => load_query(&path)?,
        None => Query::default(),
    };

    let config = SyncConfig::load()?;
    let reconciler = build_reconciler(&config)?;

    let spinner = tui::create_spinner("Fetching todos");
    let result = reconciler.plan(mode).await;
    spinner.finish_and_clear();

    let todos = query.apply(result?.active);

    if json {
        println!("{}", serde_json::to_string_pretty(&todos)?);
        return Ok(());
    }

    if let Some(name) = &query.name {
        println!("{}\n", name);
    }

    let groups = query.groups(todos);
    let grouped = query.group;
    for (i, (day, todos)) in groups.iter().enumerate() {
        if grouped {
            if i > 0 {
                println!();
            }
            println!("{}", render_day(*day));
        }
        for todo in todos {
            println!("   {}", todo.render());
        }
    }

    Ok(())
}
