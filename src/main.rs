use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use searchsvc::{DEFAULT_BASE_URL, options::ServerOpenOptions};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "searchsvc", about = "Look up country metadata by name")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "SEARCHSVC_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Number of countries kept in memory, 0 disables caching.
    #[arg(long, env = "SEARCHSVC_CACHE_CAPACITY", default_value_t = 1000)]
    cache_capacity: usize,

    /// Upstream endpoint the country name is appended to.
    #[arg(long, env = "SEARCHSVC_UPSTREAM", default_value = DEFAULT_BASE_URL)]
    upstream: String,

    /// Timeout for a single upstream lookup, in seconds.
    #[arg(long, env = "SEARCHSVC_FETCH_TIMEOUT", default_value_t = 10)]
    fetch_timeout: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    #[arg(long, env = "SEARCHSVC_SHUTDOWN_TIMEOUT", default_value_t = 10)]
    shutdown_timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut options = ServerOpenOptions::new();
    options
        .listen_addr(cli.listen)
        .cache_capacity(cli.cache_capacity)
        .upstream_url(cli.upstream)
        .fetch_timeout(Duration::from_secs(cli.fetch_timeout))
        .shutdown_timeout(Duration::from_secs(cli.shutdown_timeout));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(options.serve())?;
    Ok(())
}
