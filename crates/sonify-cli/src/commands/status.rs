use anyhow::{Context, Result};
use sonify_store::JobStore;

pub async fn run(store: &JobStore, job_id: &str) -> Result<()> {
    let view = store.get(job_id).await.context("fetching job status")?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
