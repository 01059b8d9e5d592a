use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, ensure};
use edgefind_common::config::Config;
use edgefind_common::network::RangeSet;
use edgefind_core::network::{FingerprintConfig, FingerprintProbe, LivenessProbe};
use edgefind_core::pipeline::{Pipeline, PipelineSummary};
use edgefind_core::provider::{self, ProviderKind, RangeProvider};
use tracing::info;

use crate::terminal::print;

pub async fn scan(cfg: &Config, provider_kind: ProviderKind) -> anyhow::Result<()> {
    cfg.validate()?;
    print::run_config(cfg, provider_kind);

    let provider: Box<dyn RangeProvider> = provider_kind.build()?;
    let ranges: RangeSet = provider::resolve_asn(provider.as_ref(), cfg.asn)
        .await
        .with_context(|| format!("failed to resolve IPv4 ranges of AS{}", cfg.asn))?;
    ensure!(!ranges.is_empty(), "AS{} has no IPv4 ranges to scan", cfg.asn);

    info!(
        "Scanning {} addresses in {} ranges",
        ranges.total_addresses(),
        ranges.len()
    );

    let liveness = LivenessProbe::from_config(cfg);
    let fingerprint = FingerprintProbe::new(Arc::new(FingerprintConfig::from_config(cfg)));

    let start_time: Instant = Instant::now();
    let mut handle = Pipeline::new(cfg.concurrency, liveness, fingerprint).spawn(ranges);

    while let Some(addr) = handle.recv().await {
        print::hit(addr).context("failed to write result")?;
    }

    let summary: PipelineSummary = handle.join().await?;
    print::summary(&summary, start_time.elapsed());
    Ok(())
}
