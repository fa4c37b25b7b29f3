use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::{error::Result, source::DEFAULT_BASE_URL};

#[derive(Debug)]
pub struct ServerOptions {
    pub(crate) listen_addr: SocketAddr,

    pub(crate) cache_capacity: usize,

    pub(crate) upstream_url: String,

    pub(crate) fetch_timeout: Duration,

    pub(crate) shutdown_timeout: Duration,
}

#[derive(Debug)]
pub struct ServerOpenOptions {
    listen_addr: SocketAddr,

    cache_capacity: usize,

    upstream_url: String,

    fetch_timeout: Duration,

    shutdown_timeout: Duration,
}

impl Default for ServerOpenOptions {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cache_capacity: 1000,
            upstream_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerOpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the HTTP server binds to
    pub fn listen_addr(&mut self, addr: SocketAddr) -> &mut Self {
        self.listen_addr = addr;
        self
    }

    /// Number of countries kept in memory, 0 disables caching
    pub fn cache_capacity(&mut self, cap: usize) -> &mut Self {
        self.cache_capacity = cap;
        self
    }

    /// Base URL the percent-encoded country name is appended to
    pub fn upstream_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.upstream_url = url.into();
        self
    }

    /// Upper bound for a single upstream lookup
    pub fn fetch_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.fetch_timeout = timeout;
        self
    }

    /// How long in-flight requests may run after a shutdown signal
    pub fn shutdown_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn build(&self) -> Result<Arc<ServerOptions>> {
        crate::source::validate_base_url(&self.upstream_url)?;

        let opts = ServerOptions {
            listen_addr: self.listen_addr,
            cache_capacity: self.cache_capacity,
            upstream_url: self.upstream_url.clone(),
            fetch_timeout: self.fetch_timeout,
            shutdown_timeout: self.shutdown_timeout,
        };
        Ok(Arc::new(opts))
    }

    pub async fn serve(&self) -> Result<()> {
        crate::server::serve(self.build()?).await
    }
}
