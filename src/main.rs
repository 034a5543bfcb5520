//! hoptrace - sequential IPv4 traceroute with ICMP echo or UDP probes.
//!
//! This is the command-line interface for the hoptrace library.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::Parser;
use hoptrace::{
    CancellationToken, HopResult, ProbeKind, TraceStatus, TracerouteConfig, TracerouteError,
    TracerouteResult,
};
use hickory_resolver::TokioResolver;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Get the version string for hoptrace
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the traceroute tool.
#[derive(Parser, Debug)]
#[clap(author, version, about = "Sequential IPv4 traceroute using ICMP echo or UDP probes", long_about = None)]
struct Args {
    /// Target hostname or IPv4 address
    host: String,

    /// Protocol to use (icmp, udp)
    #[clap(long, value_enum, default_value_t = ProtocolArg::Icmp)]
    protocol: ProtocolArg,

    /// Starting TTL value
    #[clap(short = 'f', long, default_value_t = 1)]
    start_ttl: u8,

    /// Maximum number of hops (default: 30 for icmp, 255 for udp)
    #[clap(short = 'm', long)]
    max_hops: Option<u8>,

    /// Timeout for individual probes in milliseconds
    #[clap(long, default_value_t = 1000)]
    probe_timeout_ms: u64,

    /// Destination port for UDP probes
    #[clap(short, long, default_value_t = 33434)]
    port: u16,

    /// Look up hostnames for responding hops
    #[clap(long)]
    rdns: bool,

    /// Output results in JSON format
    #[clap(long)]
    json: bool,

    /// Enable verbose logging (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ProtocolArg {
    Icmp,
    Udp,
}

impl From<ProtocolArg> for ProbeKind {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Icmp => ProbeKind::Echo,
            ProtocolArg::Udp => ProbeKind::Reachability,
        }
    }
}

/// JSON output structure for a single hop
#[derive(Debug, serde::Serialize)]
struct JsonHop {
    ttl: u8,
    kind: &'static str,
    address: Option<String>,
    hostname: Option<String>,
    rtt_ms: Option<f64>,
}

/// JSON output structure for the entire traceroute result
#[derive(Debug, serde::Serialize)]
struct JsonOutput {
    version: String,
    target: String,
    destination: String,
    protocol: String,
    status: String,
    error: Option<String>,
    error_code: Option<u8>,
    hops: Vec<JsonHop>,
    total_duration_ms: u64,
}

/// A hop as displayed, with its optional hostname
struct DisplayedHop {
    hop: HopResult,
    hostname: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    // Create single-threaded tokio runtime for lower overhead
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(args)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<TracerouteConfig, TracerouteError> {
    let mut builder = TracerouteConfig::builder()
        .strategy(args.protocol.into())
        .start_ttl(args.start_ttl)
        .probe_timeout(Duration::from_millis(args.probe_timeout_ms))
        .port(args.port);
    if let Some(max_hops) = args.max_hops {
        builder = builder.max_hops(max_hops);
    }
    builder.build().map_err(TracerouteError::ConfigError)
}

async fn async_main(args: Args) -> Result<ExitCode> {
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => return Ok(report_error(&e)),
    };

    // Warn if port was explicitly specified but won't be used
    if args.port != 33434 && args.protocol == ProtocolArg::Icmp {
        eprintln!(
            "Warning: Port {} specified but will be ignored for ICMP protocol",
            args.port
        );
    }

    let destination = match hoptrace::resolve_ipv4(&args.host).await {
        Ok(ip) => ip,
        Err(e) => return Ok(report_error(&e)),
    };

    if !args.json {
        println!(
            "hoptrace to {} ({}), {} max hops, {}ms probe timeout, {}",
            args.host,
            destination,
            config.effective_max_hops(),
            args.probe_timeout_ms,
            config.strategy.description()
        );
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, stopping after the current probe");
                cancel.cancel();
            }
        });
    }

    let (hop_tx, mut hop_rx) = mpsc::unbounded_channel::<HopResult>();
    let trace_config = config.clone();
    let trace_cancel = cancel.clone();
    let trace_task = tokio::task::spawn_blocking(move || {
        let mut forward = |hop: &HopResult| {
            if hop_tx.send(hop.clone()).is_err() {
                debug!(ttl = hop.ttl(), "hop display closed, dropping hop");
            }
        };
        hoptrace::trace_with_sink(destination, &trace_config, &trace_cancel, &mut forward)
    });

    let resolver = args.rdns.then(hoptrace::create_default_resolver);
    let mut displayed = Vec::new();
    while let Some(hop) = hop_rx.recv().await {
        let hostname = lookup_hostname(resolver.as_ref(), &hop).await;
        if !args.json {
            println!("{}", format_hop(&hop, hostname.as_deref()));
        }
        displayed.push(DisplayedHop { hop, hostname });
    }

    let result = match trace_task.await.context("trace task failed")? {
        Ok(result) => result,
        Err(e) => return Ok(report_error(&e)),
    };

    if args.json {
        display_json_results(&args.host, &result, displayed)?;
    } else {
        display_footer(&result);
    }

    Ok(match &result.status {
        TraceStatus::Failed(e) => {
            if !args.json {
                report_error(e)
            } else {
                ExitCode::from(e.code())
            }
        }
        _ => ExitCode::SUCCESS,
    })
}

async fn lookup_hostname(resolver: Option<&TokioResolver>, hop: &HopResult) -> Option<String> {
    let resolver = resolver?;
    let addr = hop.addr()?;
    hoptrace::reverse_dns_lookup(resolver, addr).await.ok()
}

/// One line per hop: `ttl address (rtt)`, `ttl *` or `ttl ?`
fn format_hop(hop: &HopResult, hostname: Option<&str>) -> String {
    match hop {
        HopResult::Reached { addr, rtt, ttl } => {
            let rtt_ms = rtt.as_secs_f64() * 1000.0;
            match hostname {
                Some(name) => format!("{:2} {} ({}) {:.3} ms", ttl, name, addr, rtt_ms),
                None => format!("{:2} {} ({:.3} ms)", ttl, addr, rtt_ms),
            }
        }
        HopResult::Timeout { ttl } => format!("{:2} *", ttl),
        HopResult::Unclassified { ttl } => format!("{:2} ?", ttl),
    }
}

fn display_footer(result: &TracerouteResult) {
    let summary = match &result.status {
        TraceStatus::DestinationReached => format!("reached {}", result.destination),
        TraceStatus::HopsExhausted => format!(
            "{} not reached within {} hops",
            result.destination,
            result.max_ttl().unwrap_or(0)
        ),
        TraceStatus::Cancelled => "cancelled".to_string(),
        TraceStatus::Failed(_) => "failed".to_string(),
    };
    println!(
        "\n{} after {} hops in {:.0} ms",
        summary,
        result.hop_count(),
        result.total_duration.as_secs_f64() * 1000.0
    );
}

/// Display results in JSON format
fn display_json_results(
    target: &str,
    result: &TracerouteResult,
    displayed: Vec<DisplayedHop>,
) -> Result<()> {
    let json_output = JsonOutput {
        version: get_version().to_string(),
        target: target.to_string(),
        destination: result.destination.to_string(),
        protocol: result.strategy.description().to_string(),
        status: result.status.label().to_string(),
        error: result.error().map(ToString::to_string),
        error_code: result.error().map(TracerouteError::code),
        hops: displayed
            .into_iter()
            .map(|DisplayedHop { hop, hostname }| JsonHop {
                ttl: hop.ttl(),
                kind: match &hop {
                    HopResult::Reached { .. } => "reached",
                    HopResult::Timeout { .. } => "timeout",
                    HopResult::Unclassified { .. } => "unclassified",
                },
                address: hop.addr().as_ref().map(ToString::to_string),
                hostname,
                rtt_ms: hop.rtt_ms(),
            })
            .collect(),
        total_duration_ms: result.total_duration.as_millis() as u64,
    };

    println!("{}", serde_json::to_string_pretty(&json_output)?);
    Ok(())
}

/// Print `err` to stderr and map it to the process exit code
fn report_error(err: &TracerouteError) -> ExitCode {
    eprintln!("Error ({}): {}", err.code(), err);
    if let TracerouteError::InsufficientPermissions { suggestion, .. } = err {
        eprintln!("{}", suggestion);
    }
    ExitCode::from(err.code())
}
