use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};

use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    error::{Error, Result},
    models::{Country, CountryName, Currency},
    source::CountrySource,
};

pub fn run_async_test<F, Fut>(test_fn: F) -> anyhow::Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(4)
        .build()?;

    rt.block_on(async { test_fn().await })?;
    Ok(())
}

/// Serves `router` on an ephemeral local port for the rest of the test.
pub async fn spawn_router(router: Router) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("test server failed: {}", e);
        }
    });
    Ok(addr)
}

pub fn country(name: &str, population: u64, capital: &str, symbol: &str) -> Country {
    let mut currencies = std::collections::BTreeMap::new();
    currencies.insert(
        "TST".to_string(),
        Currency {
            name: format!("{name} currency"),
            symbol: symbol.to_string(),
        },
    );
    Country {
        name: CountryName {
            common: name.to_string(),
        },
        population,
        capital: vec![capital.to_string()],
        currencies,
    }
}

pub enum StubResponse {
    Countries(Vec<Country>),
    Status(u16),
}

/// In-memory source that counts how often it is asked.
#[derive(Default)]
pub struct StubSource {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: AtomicUsize,
}

impl StubSource {
    pub fn with(self, name: &str, response: StubResponse) -> Self {
        self.responses.lock().insert(name.to_string(), response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CountrySource for StubSource {
    async fn search(&self, name: &str) -> Result<Vec<Country>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().get(name) {
            Some(StubResponse::Countries(countries)) => Ok(countries.clone()),
            Some(StubResponse::Status(code)) => Err(Error::UpstreamStatus(*code)),
            None => Ok(Vec::new()),
        }
    }
}
