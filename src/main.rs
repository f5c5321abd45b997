use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cfddns::{
    config::Settings,
    dns::CloudflareProvider,
    ip::{AddressFamily, IpResolver},
    sync,
};

#[derive(Parser)]
#[command(name = "cfddns")]
#[command(about = "Dynamic DNS updater - syncs public IPv4/IPv6 addresses to Cloudflare DNS records")]
#[command(version)]
struct Cli {
    /// Cloudflare zone identifier
    #[arg(long)]
    zoneid: String,

    /// Cloudflare API key
    #[arg(long)]
    apikey: String,

    /// Name of the A/AAAA record to keep in sync
    #[arg(long)]
    recordname: String,

    /// Cloudflare account email address
    #[arg(long)]
    email: String,

    /// Name of the DNS zone; when set, lookups use recordname.zonename
    #[arg(long)]
    zonename: Option<String>,

    /// Log raw write-operation response bodies
    #[arg(long)]
    debug: bool,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings {
        email: cli.email,
        api_key: cli.apikey,
        zone_id: cli.zoneid,
        record_name: cli.recordname,
        zone_name: cli.zonename,
        debug: cli.debug,
    };

    init_logging(if settings.debug { "debug" } else { "info" });

    settings.validate()?;

    let resolver = IpResolver::new()?;
    let provider = CloudflareProvider::new(&settings)?;

    // One pass per address family; a failure in one family is reported
    // but does not stop the other.
    let mut failed = false;
    for family in [AddressFamily::V4, AddressFamily::V6] {
        if let Err(e) = sync::sync_family(&settings, &resolver, &provider, family).await {
            error!("{} reconciliation failed: {}", family, e);
            failed = true;
        }
    }

    if failed {
        anyhow::bail!("one or more address families failed to reconcile");
    }

    Ok(())
}
