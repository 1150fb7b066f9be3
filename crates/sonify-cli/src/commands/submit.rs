use anyhow::{Context, Result};
use sonify_spec::{ControlsOverride, JobState, SubmitRequest};
use sonify_store::JobStore;
use std::io::Read;
use std::time::Duration;

pub async fn run(
    store: &JobStore,
    input: Option<&str>,
    palette: Option<String>,
    seed: Option<u64>,
    bars: Option<i32>,
    render_mp3: bool,
    wait: bool,
) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading request JSON from stdin")?;
            buf
        }
    };

    let mut request: SubmitRequest = serde_json::from_str(&raw).context("parsing submit request JSON")?;

    if let Some(slug) = palette {
        request.palette_slug = slug;
    }
    if seed.is_some() {
        request.seed = seed;
    }
    if bars.is_some() {
        request.controls_override = ControlsOverride {
            bars,
            ..request.controls_override
        };
    }
    if render_mp3 {
        request.render_mp3 = true;
    }

    let job_id = store.submit(request).await.context("submitting job")?;

    if wait {
        loop {
            let view = store.get(&job_id).await.context("polling job")?;
            if view.state.is_terminal() {
                println!("{}", serde_json::to_string_pretty(&view)?);
                if view.state == JobState::Failed {
                    anyhow::bail!("job {job_id} failed: {}", view.error.unwrap_or_default());
                }
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("{job_id}");
    Ok(())
}
