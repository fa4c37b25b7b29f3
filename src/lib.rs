mod service;
mod source;

pub mod error;
pub mod models;
pub mod options;
pub mod server;

pub use searchsvc_cache as cache;
pub use service::CountryService;
pub use source::{CountrySource, DEFAULT_BASE_URL, RestCountries};

#[cfg(test)]
mod test_utils;
