use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A country as returned by the upstream API. Only the fields the
/// service reads are modelled, the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: CountryName,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub currencies: BTreeMap<String, Currency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryName {
    pub common: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

/// The record handed out to callers and kept in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMetadata {
    pub name: String,
    pub population: u64,
    pub capital: String,
    pub currency: String,
}

impl From<Country> for CountryMetadata {
    fn from(country: Country) -> Self {
        let capital = country.capital.into_iter().next().unwrap_or_default();
        // currencies are keyed by ISO code, so "first" is stable
        let currency = country
            .currencies
            .into_values()
            .next()
            .map(|c| c.symbol)
            .unwrap_or_default();

        Self {
            name: country.name.common,
            population: country.population,
            capital,
            currency,
        }
    }
}
