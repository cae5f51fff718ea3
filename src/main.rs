use cold_pack::cluster::http::HttpCluster;
use cold_pack::consolidate::run::consolidate_all;
use cold_pack::logging;
use cold_pack::shared::config::CONFIG;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;
    info!("Starting cold_pack");

    let cluster = HttpCluster::new(CONFIG.cluster.endpoint.clone());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown requested; finishing the in-flight merge safely");
            let _ = cancel_tx.send(true);
        }
    });

    let summaries = consolidate_all(
        &cluster,
        &CONFIG.cluster.name_pattern,
        &CONFIG.consolidation,
        cancel_rx,
    )
    .await?;

    for summary in &summaries {
        let Some(target) = summary.target.as_deref() else {
            info!("No partitions below the target threshold; nothing to consolidate");
            continue;
        };
        info!(
            target_partition = target,
            merged = summary.merged().count(),
            bytes_merged = summary.bytes_merged,
            stop_reason = ?summary.stop_reason,
            "Consolidation run complete"
        );
        for op in summary.abandoned() {
            warn!(
                source = %op.source,
                attempts = op.attempt,
                reason = op.reason.as_deref().unwrap_or(""),
                "Source left unmerged"
            );
        }
    }

    Ok(())
}
