use anyhow::{Context, Result};
use serde::Serialize;
use sonify_store::JobStore;
use std::collections::HashMap;

#[derive(Serialize)]
struct CatalogSummary {
    version: String,
    motif_count: usize,
    by_label: HashMap<String, usize>,
}

pub async fn run(store: &JobStore, version: Option<&str>) -> Result<()> {
    let catalog = store
        .services()
        .catalog(version)
        .context("loading motif catalog")?;
    let by_label = catalog
        .stats()
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    let summary = CatalogSummary {
        version: catalog.version.clone(),
        motif_count: catalog.motifs.len(),
        by_label,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
