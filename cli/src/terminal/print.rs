use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::time::Duration;

use colored::*;
use edgefind_common::config::Config;
use edgefind_core::pipeline::PipelineSummary;
use edgefind_core::provider::ProviderKind;
use tracing::info;

pub const TOTAL_WIDTH: usize = 64;

/// Writes one matching address to stdout and flushes immediately.
pub fn hit(addr: Ipv4Addr) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{addr}")?;
    stdout.flush()
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    info!("{line}");
}

pub fn run_config(cfg: &Config, provider: ProviderKind) {
    header(&format!("edgefind v{}", env!("CARGO_PKG_VERSION")));
    aligned_line("server name", &cfg.server_name);
    aligned_line("asn", &format!("AS{}", cfg.asn));
    aligned_line("provider", &provider.to_string());
    aligned_line("port", &cfg.port.to_string());
    aligned_line("concurrency", &cfg.concurrency.to_string());
    aligned_line("port timeout", &format!("{}ms", cfg.liveness_timeout.as_millis()));
    aligned_line("trace timeout", &format!("{}ms", cfg.fingerprint_timeout.as_millis()));
}

pub fn summary(summary: &PipelineSummary, total_time: Duration) {
    let matched: ColoredString = format!("{} matching hosts", summary.matched).bold().green();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    info!(
        "Scan complete: {matched} out of {} live, {} probed, in {total_time}",
        summary.alive, summary.enumerated
    );
}

fn aligned_line(key: &str, value: &str) {
    const KEY_WIDTH: usize = 14;
    let dots: String = ".".repeat(KEY_WIDTH.saturating_sub(key.len()));
    info!("{}{}{} {}", key.cyan(), dots.bright_black(), ":".bright_black(), value);
}
