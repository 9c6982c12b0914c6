use std::collections::HashMap;

use super::types::PropertyRecord;
use crate::error::{Error, Result};

fn key(postcode: &str) -> String {
    postcode.trim().to_lowercase()
}

/// Postcode-keyed property records, kept in insertion order.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    records: Vec<PropertyRecord>,
    index: HashMap<String, usize>,
}

impl PropertyStore {
    /// Builds a store, rejecting duplicate postcodes and records that break
    /// the floor area, valuation or confidence invariants. An empty store is
    /// rejected too since search always needs a default.
    pub fn new(records: Vec<PropertyRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::InvalidRecord(
                "property store needs at least one record".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            validate(record)?;
            if index.insert(key(&record.postcode), position).is_some() {
                return Err(Error::InvalidRecord(format!(
                    "duplicate postcode {}",
                    record.postcode
                )));
            }
        }

        Ok(Self { records, index })
    }

    pub fn lookup(&self, postcode: &str) -> Result<&PropertyRecord> {
        self.index
            .get(&key(postcode))
            .map(|&position| &self.records[position])
            .ok_or_else(|| Error::not_found(format!("postcode {}", postcode.trim())))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyRecord> {
        self.records.iter()
    }

    /// First record in insertion order.
    pub fn default_property(&self) -> &PropertyRecord {
        &self.records[0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn validate(record: &PropertyRecord) -> Result<()> {
    if record.postcode.trim().is_empty() {
        return Err(Error::InvalidRecord(format!(
            "{}: postcode must not be empty",
            record.address
        )));
    }

    if !record.floor_area.is_finite() || record.floor_area <= 0.0 {
        return Err(Error::InvalidRecord(format!(
            "{}: floor area must be > 0",
            record.postcode
        )));
    }

    if record.valuation == 0 {
        return Err(Error::InvalidRecord(format!(
            "{}: valuation must be > 0",
            record.postcode
        )));
    }

    if record.confidence > 100 {
        return Err(Error::InvalidRecord(format!(
            "{}: confidence must be between 0 and 100",
            record.postcode
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::FixtureSource;
    use crate::core::source::DataSource;

    fn fixture_records() -> Vec<PropertyRecord> {
        FixtureSource.load().expect("fixtures load").properties
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        let store = PropertyStore::new(fixture_records()).expect("valid store");
        assert_eq!(
            store.lookup("ig3 9bb").expect("known").address,
            "45 Oak Road, Redbridge, IG3 9BB"
        );
        assert_eq!(store.lookup("  IG3 9AA ").expect("known").valuation, 485_000);
    }

    #[test]
    fn lookup_unknown_postcode_is_not_found() {
        let store = PropertyStore::new(fixture_records()).expect("valid store");
        let err = store.lookup("E1 6AN").expect_err("unknown");
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn iteration_and_default_follow_insertion_order() {
        let store = PropertyStore::new(fixture_records()).expect("valid store");
        let postcodes: Vec<_> = store.iter().map(|r| r.postcode.as_str()).collect();
        assert_eq!(postcodes, vec!["IG3 9AA", "IG3 9BB"]);
        assert_eq!(store.default_property().postcode, "IG3 9AA");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_duplicate_postcodes() {
        let mut records = fixture_records();
        let mut copy = records[0].clone();
        copy.postcode = "ig3 9aa".to_string();
        records.push(copy);
        let err = PropertyStore::new(records).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate postcode"));
    }

    #[test]
    fn rejects_records_breaking_invariants() {
        let mut records = fixture_records();
        records[1].floor_area = 0.0;
        assert!(PropertyStore::new(records).is_err());

        let mut records = fixture_records();
        records[0].confidence = 101;
        assert!(PropertyStore::new(records).is_err());

        let mut records = fixture_records();
        records[0].valuation = 0;
        assert!(PropertyStore::new(records).is_err());

        assert!(PropertyStore::new(Vec::new()).is_err());
    }
}
