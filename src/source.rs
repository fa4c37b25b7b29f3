mod rest_countries;

#[cfg(test)]
pub(crate) use rest_countries::HttpClient;
pub(crate) use rest_countries::validate_base_url;
pub use rest_countries::{DEFAULT_BASE_URL, RestCountries};

use crate::{error::Result, models::Country};

/// A remote place countries can be looked up by name.
///
/// An empty result means the source has no such country, an `Err` means
/// the lookup itself failed and may succeed when retried.
pub trait CountrySource: Send + Sync + 'static {
    fn search(&self, name: &str) -> impl Future<Output = Result<Vec<Country>>> + Send;
}

impl<S: CountrySource> CountrySource for std::sync::Arc<S> {
    async fn search(&self, name: &str) -> Result<Vec<Country>> {
        self.as_ref().search(name).await
    }
}
