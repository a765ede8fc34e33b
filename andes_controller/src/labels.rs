use crate::{
    error::{Error, Result},
    sequencer::MAX_PINS,
};
use std::collections::BTreeMap;

/// Names of the sequencer output pins.
///
/// Every name maps to a distinct pin address, so the reverse lookup is always unambiguous.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct PinLabels {
    by_name: BTreeMap<String, u8>,
    by_address: BTreeMap<u8, String>,
}

impl PinLabels {
    /// Builds labels from `(name, address)` pairs. When a name is repeated the last pair wins.
    ///
    /// Fails with [`Error::DuplicateAddress`] listing every name involved in a collision.
    pub fn new<I, S>(mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let mut by_name = BTreeMap::new();
        for (name, address) in mapping {
            if address as usize >= MAX_PINS {
                return Err(Error::OutOfRange {
                    field: "pin address",
                    value: address.into(),
                    min: 0,
                    max: MAX_PINS as i64 - 1,
                });
            }
            by_name.insert(name.into(), address);
        }

        let mut groups: BTreeMap<u8, Vec<String>> = BTreeMap::new();
        for (name, address) in &by_name {
            groups.entry(*address).or_default().push(name.clone());
        }
        let duplicates: Vec<_> = groups
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .map(|(address, names)| (*address, names.clone()))
            .collect();
        if !duplicates.is_empty() {
            return Err(Error::DuplicateAddress(duplicates));
        }

        let by_address = groups
            .into_iter()
            .filter_map(|(address, mut names)| names.pop().map(|n| (address, n)))
            .collect();
        Ok(PinLabels {
            by_name,
            by_address,
        })
    }

    pub fn address_of(&self, name: &str) -> Result<u8> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    pub fn name_of(&self, address: u8) -> Result<&str> {
        self.by_address
            .get(&address)
            .map(String::as_str)
            .ok_or(Error::UnknownAddress(address))
    }

    /// Labels ordered by pin address
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.by_address.iter().map(|(a, n)| (n.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
