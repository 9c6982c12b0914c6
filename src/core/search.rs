use std::str::FromStr;

use super::store::PropertyStore;
use super::types::PropertyRecord;
use crate::error::{Error, Result};

pub const MAX_QUERY_LEN: usize = 128;

/// What a search with no match returns.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum FallbackPolicy {
    /// Return the store's default property so a caller always has a record
    /// to show.
    #[default]
    Default,
    NotFound,
}

impl FromStr for FallbackPolicy {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(FallbackPolicy::Default),
            "not-found" | "not_found" | "notfound" | "none" => Ok(FallbackPolicy::NotFound),
            other => Err(Error::Config(format!(
                "unknown search fallback policy {other:?}, expected default or not-found"
            ))),
        }
    }
}

pub struct SearchResolver<'a> {
    store: &'a PropertyStore,
    fallback: FallbackPolicy,
}

impl<'a> SearchResolver<'a> {
    pub fn new(store: &'a PropertyStore, fallback: FallbackPolicy) -> Self {
        Self { store, fallback }
    }

    /// Matches a postcode fragment or address substring; the first record in
    /// store order wins.
    ///
    /// A blank query is `InvalidInput`. It does not match every address and
    /// so never silently selects the first property.
    pub fn resolve(&self, query: &str) -> Result<&'a PropertyRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidInput("search query must not be empty".to_string()));
        }
        if needle.chars().count() > MAX_QUERY_LEN {
            return Err(Error::InvalidInput(format!(
                "search query must be at most {MAX_QUERY_LEN} characters"
            )));
        }

        let found = self.store.iter().find(|record| {
            let postcode = record.postcode.to_lowercase();
            needle.contains(&postcode)
                || postcode.contains(&needle)
                || record.address.to_lowercase().contains(&needle)
        });

        if let Some(record) = found {
            tracing::debug!(query = %needle, postcode = %record.postcode, "search matched");
            return Ok(record);
        }

        match self.fallback {
            FallbackPolicy::Default => {
                let record = self.store.default_property();
                tracing::debug!(
                    query = %needle,
                    postcode = %record.postcode,
                    "search fell back to default"
                );
                Ok(record)
            }
            FallbackPolicy::NotFound => Err(Error::not_found(format!(
                "property matching {:?}",
                query.trim()
            ))),
        }
    }
}
