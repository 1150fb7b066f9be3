use anyhow::{Context, Result};
use sonify_spec::PaletteSummary;
use sonify_store::JobStore;

pub async fn run(store: &JobStore) -> Result<()> {
    let palettes = store.services().palettes().context("loading palettes")?;
    let mut summaries: Vec<PaletteSummary> = palettes.values().map(PaletteSummary::from).collect();
    summaries.sort_by(|a, b| a.slug.cmp(&b.slug));
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}
