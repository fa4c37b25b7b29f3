use searchsvc_cache::{Cache, LruCache};
use tracing::{debug, info};

use crate::{error::Result, models::CountryMetadata, source::CountrySource};

/// Resolves country names, answering from the cache when it can.
pub struct CountryService<S, C = LruCache<String, CountryMetadata>> {
    source: S,
    cache: C,
}

impl<S> CountryService<S>
where
    S: CountrySource,
{
    pub fn new(source: S, cache_capacity: usize) -> Self {
        Self::with_cache(source, LruCache::new(cache_capacity))
    }
}

impl<S, C> CountryService<S, C>
where
    S: CountrySource,
    C: Cache<String, CountryMetadata>,
{
    pub fn with_cache(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Looks up `name`.
    ///
    /// `Ok(None)` means the source has no country with exactly this common
    /// name. Such answers are not cached, only found records are.
    pub async fn search(&self, name: &str) -> Result<Option<CountryMetadata>> {
        if let Some(meta) = self.cache.get(name) {
            debug!("cache hit: {}", name);
            return Ok(Some(meta));
        }

        debug!("cache miss: {}, fetching from source", name);
        let countries = self.source.search(name).await?;

        let Some(meta) = countries
            .into_iter()
            .find(|c| c.name.common == name)
            .map(CountryMetadata::from)
        else {
            info!("country not found: {}", name);
            return Ok(None);
        };

        self.cache.insert(name.to_string(), meta.clone());
        Ok(Some(meta))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Json, Router, routing::get};

    use super::*;
    use crate::{
        error::Error,
        source::RestCountries,
        test_utils::{StubResponse, StubSource, country, run_async_test, spawn_router},
    };

    fn cached_land() -> CountryMetadata {
        CountryMetadata {
            name: "CachedLand".to_string(),
            population: 42,
            capital: "CacheCity".to_string(),
            currency: "CCH".to_string(),
        }
    }

    #[test]
    fn test_cache_hit_skips_source() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = Arc::new(StubSource::default());
            let service = CountryService::new(source.clone(), 10);
            service
                .cache()
                .insert("CachedLand".to_string(), cached_land());

            let res = service.search("CachedLand").await?;
            assert_eq!(res, Some(cached_land()));
            assert_eq!(source.calls(), 0);
            Ok(())
        })
    }

    #[test]
    fn test_miss_fetches_and_caches() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = Arc::new(StubSource::default().with(
                "Testland",
                StubResponse::Countries(vec![country("Testland", 12345, "T-City", "T$")]),
            ));
            let service = CountryService::new(source.clone(), 10);

            let res = service.search("Testland").await?.unwrap();
            assert_eq!(res.name, "Testland");
            assert_eq!(res.population, 12345);
            assert_eq!(res.capital, "T-City");
            assert_eq!(res.currency, "T$");
            assert_eq!(source.calls(), 1);

            assert_eq!(service.cache().get("Testland"), Some(res.clone()));
            assert_eq!(service.search("Testland").await?, Some(res));
            assert_eq!(source.calls(), 1);
            Ok(())
        })
    }

    #[test]
    fn test_exact_common_name_match() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = StubSource::default().with(
                "Guinea",
                StubResponse::Countries(vec![
                    country("Equatorial Guinea", 1, "Malabo", "FCFA"),
                    country("Guinea", 2, "Conakry", "FG"),
                    country("Guinea-Bissau", 3, "Bissau", "Fr"),
                ]),
            );
            let service = CountryService::new(source, 10);

            let res = service.search("Guinea").await?.unwrap();
            assert_eq!(res.capital, "Conakry");
            Ok(())
        })
    }

    #[test]
    fn test_not_found_is_not_cached() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = Arc::new(StubSource::default().with(
                "Land",
                StubResponse::Countries(vec![country("Landia", 1, "L", "L$")]),
            ));
            let service = CountryService::new(source.clone(), 10);

            assert_eq!(service.search("Land").await?, None);
            assert_eq!(service.search("Nowhere").await?, None);
            assert_eq!(service.search("Nowhere").await?, None);
            assert_eq!(source.calls(), 3);
            assert!(service.cache().is_empty());
            Ok(())
        })
    }

    #[test]
    fn test_source_error_propagates() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = StubSource::default().with("Anything", StubResponse::Status(500));
            let service = CountryService::new(source, 10);

            let err = service.search("Anything").await.unwrap_err();
            assert!(matches!(err, Error::UpstreamStatus(500)));
            assert!(service.cache().is_empty());
            Ok(())
        })
    }

    #[test]
    fn test_zero_capacity_always_fetches() -> anyhow::Result<()> {
        run_async_test(|| async {
            let source = Arc::new(StubSource::default().with(
                "Testland",
                StubResponse::Countries(vec![country("Testland", 1, "T", "T$")]),
            ));
            let service = CountryService::new(source.clone(), 0);

            for _ in 0..3 {
                assert!(service.search("Testland").await?.is_some());
            }
            assert_eq!(source.calls(), 3);
            Ok(())
        })
    }

    #[test]
    fn test_fetch_from_rest_api() -> anyhow::Result<()> {
        run_async_test(|| async {
            let upstream = Router::new().route(
                "/v3.1/name/:name",
                get(|| async { Json(vec![country("Testland", 12345, "T-City", "T$")]) }),
            );
            let addr = spawn_router(upstream).await?;
            let source = RestCountries::new(
                format!("http://{addr}/v3.1/name/"),
                Duration::from_secs(5),
            )?;
            let service = CountryService::new(source, 10);

            let res = service.search("Testland").await?.unwrap();
            assert_eq!(res.capital, "T-City");
            assert_eq!(res.currency, "T$");

            let cached = service.cache().get("Testland").unwrap();
            assert_eq!(cached.name, "Testland");
            Ok(())
        })
    }
}
