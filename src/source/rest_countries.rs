use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{Request, StatusCode, Uri, header, http::uri::Scheme};
use hyper_util::rt::TokioIo;
use rustls::{ClientConfig, RootCertStore, pki_types::ServerName};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_rustls::TlsConnector;

use super::CountrySource;
use crate::{
    error::{Error, Result},
    models::Country,
};

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1/name/";

/// Client for the REST Countries `name` endpoint.
pub struct RestCountries {
    base_url: String,
    timeout: Duration,
    client: HttpClient,
}

impl RestCountries {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;

        Ok(Self {
            base_url,
            timeout,
            client: HttpClient::new()?,
        })
    }

    fn search_uri(&self, name: &str) -> Result<Uri> {
        let uri = format!("{}{}", self.base_url, urlencoding::encode(name));
        uri.parse()
            .map_err(|e| Error::InvalidUrl(format!("{uri}: {e}")))
    }
}

impl CountrySource for RestCountries {
    async fn search(&self, name: &str) -> Result<Vec<Country>> {
        let uri = self.search_uri(name)?;
        tracing::debug!("fetching {}", uri);

        let (status, body) = tokio::time::timeout(self.timeout, self.client.get(&uri))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;

        match status {
            StatusCode::OK => Ok(serde_json::from_slice(&body)?),
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(Error::UpstreamStatus(status.as_u16())),
        }
    }
}

pub(crate) fn validate_base_url(url: &str) -> Result<Uri> {
    let uri: Uri = url
        .parse()
        .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;

    if !matches!(uri.scheme_str(), Some("http" | "https")) {
        return Err(Error::InvalidUrl(format!(
            "{url}: scheme must be http or https"
        )));
    }
    if uri.host().is_none() {
        return Err(Error::InvalidUrl(format!("{url}: missing host")));
    }

    Ok(uri)
}

/// One-shot HTTP/1.1 GET over a fresh connection, TLS for `https`.
pub(crate) struct HttpClient {
    tls: TlsConnector,
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            tls: TlsConnector::from(Arc::new(config)),
        })
    }

    pub(crate) async fn get(&self, uri: &Uri) -> Result<(StatusCode, Bytes)> {
        let host = uri
            .host()
            .ok_or_else(|| Error::InvalidUrl(format!("{uri}: missing host")))?;
        let https = uri.scheme() == Some(&Scheme::HTTPS);
        let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });
        let authority = uri.authority().map_or(host, |a| a.as_str());
        let path = uri.path_and_query().map_or("/", |p| p.as_str());

        let req = Request::get(path)
            .header(header::HOST, authority)
            .header(header::ACCEPT, "application/json")
            .header(
                header::USER_AGENT,
                concat!("searchsvc/", env!("CARGO_PKG_VERSION")),
            )
            .body(Empty::<Bytes>::new())?;

        let tcp = TcpStream::connect((host, port)).await?;
        if https {
            let server_name = ServerName::try_from(host.to_string())
                .map_err(|e| Error::InvalidUrl(format!("{host}: {e}")))?;
            let stream = self.tls.connect(server_name, tcp).await?;
            send_request(stream, req).await
        } else {
            send_request(tcp, req).await
        }
    }
}

async fn send_request<T>(io: T, req: Request<Empty<Bytes>>) -> Result<(StatusCode, Bytes)>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::warn!("upstream connection error: {}", e);
        }
    });

    let resp = sender.send_request(req).await?;
    let status = resp.status();
    let body = resp.into_body().collect().await?.to_bytes();
    Ok((status, body))
}
