use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::Notify, task::JoinError};
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    models::CountryMetadata,
    options::ServerOptions,
    service::CountryService,
    source::{CountrySource, RestCountries},
};

pub fn router<S>(service: Arc<CountryService<S>>) -> Router
where
    S: CountrySource,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/countries/search", get(search_country::<S>))
        .with_state(service)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    name: Option<String>,
}

async fn search_country<S>(
    State(service): State<Arc<CountryService<S>>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response>
where
    S: CountrySource,
{
    // no name and no match both answer with an empty record
    let name = query.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Ok(Json(CountryMetadata::default()).into_response());
    }

    let meta = service.search(name).await?.unwrap_or_default();
    Ok(Json(meta).into_response())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("search failed: {}", self);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &self.to_string())
    }
}

/// Runs the service described by `options` until SIGINT or SIGTERM.
pub async fn serve(options: Arc<ServerOptions>) -> Result<()> {
    let source = RestCountries::new(options.upstream_url.clone(), options.fetch_timeout)?;
    let service = Arc::new(CountryService::new(source, options.cache_capacity));

    let listener = TcpListener::bind(options.listen_addr).await?;
    info!(
        "listening on {}, cache capacity: {}",
        listener.local_addr()?,
        options.cache_capacity
    );

    serve_with_shutdown(
        listener,
        router(service),
        shutdown_signal(),
        options.shutdown_timeout,
    )
    .await
}

/// Serves `router` until `signal` resolves, then gives in-flight requests
/// at most `grace` to finish.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    router: Router,
    signal: F,
    grace: Duration,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, router).with_graceful_shutdown({
        let stop = stop.clone();
        async move { stop.notified().await }
    });
    let mut server_task = tokio::spawn(server.into_future());

    tokio::select! {
        res = &mut server_task => return flatten(res),
        _ = signal => {}
    }

    info!("shutting down server gracefully");
    stop.notify_one();

    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(res) => {
            flatten(res)?;
            info!("server closed");
            Ok(())
        }
        Err(_) => {
            warn!("server forced to shutdown after {:?}", grace);
            server_task.abort();
            Ok(())
        }
    }
}

fn flatten(res: std::result::Result<std::io::Result<()>, JoinError>) -> Result<()> {
    Ok(res.map_err(std::io::Error::other)??)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
