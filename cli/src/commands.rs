pub mod scan;

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use edgefind_common::config::Config;
use edgefind_core::provider::ProviderKind;

/// Multi-letter flags that are also accepted with a single dash (`-asn 13335`).
const SINGLE_DASH_LONG_FLAGS: &[&str] = &["asn", "t_p", "t_cf"];

#[derive(Parser, Debug)]
#[command(name = "edgefind")]
#[command(version, about = "Find hosts in an AS that reverse-proxy a given site.")]
pub struct CommandLine {
    /// Server name used for TLS SNI, the Host header and the trace match
    #[arg(short = 's', long = "server-name", value_parser = NonEmptyStringValueParser::new())]
    pub server_name: String,

    /// Autonomous system number whose IPv4 ranges are scanned
    #[arg(long = "asn", value_parser = clap::value_parser!(u32).range(1..))]
    pub asn: u32,

    /// Workers per stage
    #[arg(short = 'n', long = "concurrency", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: u32,

    /// Port check timeout in milliseconds
    #[arg(long = "t_p", default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub port_timeout_ms: u64,

    /// Trace fingerprint timeout in milliseconds
    #[arg(long = "t_cf", default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
    pub trace_timeout_ms: u64,

    /// TCP port probed on every address
    #[arg(short = 'p', long = "port", default_value_t = 443, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Where the AS ranges come from: ipverse or ipip
    #[arg(long = "provider", default_value_t = ProviderKind::Ipverse)]
    pub provider: ProviderKind,
}

impl CommandLine {
    /// Parses the process arguments, exiting with status 1 on any usage error.
    pub fn parse_args() -> Self {
        match Self::try_parse_from(normalize_args(std::env::args_os())) {
            Ok(cmd) => cmd,
            Err(e) => {
                // Help and version go to stdout and are not failures.
                let code: i32 = if e.use_stderr() { 1 } else { 0 };
                let _ = e.print();
                std::process::exit(code);
            }
        }
    }

    pub fn to_config(&self) -> Config {
        Config {
            server_name: self.server_name.clone(),
            asn: self.asn,
            concurrency: self.concurrency as usize,
            port: self.port,
            liveness_timeout: Duration::from_millis(self.port_timeout_ms),
            fingerprint_timeout: Duration::from_millis(self.trace_timeout_ms),
        }
    }
}

/// Rewrites `-asn`, `-t_p` and `-t_cf` (optionally `=value`) to their `--` form.
///
/// Everything after a bare `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough: bool = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg: OsString| {
            if passthrough {
                return arg;
            }
            if arg.to_str() == Some("--") {
                passthrough = true;
                return arg;
            }
            let rewritten: Option<OsString> = arg
                .to_str()
                .and_then(|s| s.strip_prefix('-'))
                .filter(|rest| is_single_dash_long(rest))
                .map(|rest| OsString::from(format!("--{rest}")));
            rewritten.unwrap_or(arg)
        })
        .collect()
}

fn is_single_dash_long(rest: &str) -> bool {
    let name: &str = rest.split_once('=').map_or(rest, |(name, _)| name);
    SINGLE_DASH_LONG_FLAGS.contains(&name)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
