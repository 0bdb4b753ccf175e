use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;

pub type Symbol = String;

/// Last two observed prices for a symbol. `0.0` means "no data".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceEntry {
    pub previous: f64,
    pub current: f64,
}

/// Immutable copy of every entry, ascending by symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(Symbol, PriceEntry)>,
}

impl Snapshot {
    pub fn entries(&self) -> &[(Symbol, PriceEntry)] {
        &self.entries
    }

    pub fn get(&self, symbol: &str) -> Option<PriceEntry> {
        self.entries
            .binary_search_by(|(key, _)| key.as_str().cmp(symbol))
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Symbol → price pair map behind a single mutex.
///
/// Every operation holds the guard only for one read-modify-write (or one copy
/// for [`PriceStore::snapshot`]), so no caller can observe a half-written pair.
#[derive(Debug, Default)]
pub struct PriceStore {
    quotes: Mutex<BTreeMap<Symbol, PriceEntry>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let store = Self::new();
        for symbol in symbols {
            store.register(symbol);
        }
        store
    }

    pub fn register(&self, symbol: impl Into<Symbol>) {
        self.lock().entry(symbol.into()).or_default();
    }

    /// Shift `current` into `previous` and store `price` as the new `current`.
    pub fn update(&self, symbol: &str, price: f64) -> Result<PriceEntry, StoreError> {
        let mut quotes = self.lock();
        let entry = quotes
            .get_mut(symbol)
            .ok_or_else(|| StoreError::UnregisteredSymbol(symbol.to_string()))?;
        *entry = PriceEntry {
            previous: entry.current,
            current: price,
        };
        Ok(*entry)
    }

    pub fn get(&self, symbol: &str) -> Option<PriceEntry> {
        self.lock().get(symbol).copied()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.lock().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let quotes = self.lock();
        Snapshot {
            entries: quotes
                .iter()
                .map(|(symbol, entry)| (symbol.clone(), *entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Entries are replaced in a single assignment, so a poisoned guard still
    // protects consistent data.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<Symbol, PriceEntry>> {
        self.quotes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_starts_at_sentinel_and_is_idempotent() {
        let store = PriceStore::new();
        store.register("AAPL");
        store.update("AAPL", 12.5).unwrap();
        store.register("AAPL");

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("AAPL").unwrap().current, 12.5);

        store.register("MSFT");
        assert_eq!(store.get("MSFT"), Some(PriceEntry::default()));
    }

    #[test]
    fn update_shifts_current_into_previous() {
        let store = PriceStore::with_symbols(["AAPL"]);
        store.update("AAPL", 5.0).unwrap();
        let entry = store.update("AAPL", 7.0).unwrap();

        assert_eq!(
            entry,
            PriceEntry {
                previous: 5.0,
                current: 7.0
            }
        );
        assert_eq!(store.get("AAPL"), Some(entry));
    }

    #[test]
    fn update_of_unknown_symbol_is_rejected() {
        let store = PriceStore::with_symbols(["AAPL"]);
        let err = store.update("aapl", 1.0).unwrap_err();

        assert_eq!(err, StoreError::UnregisteredSymbol("aapl".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_sorted_and_repeatable() {
        let store = PriceStore::with_symbols(["MSFT", "AAPL", "GOOG"]);
        store.update("GOOG", 140.25).unwrap();

        let first = store.snapshot();
        let second = store.snapshot();
        assert_eq!(first, second);

        let symbols: Vec<_> = first.entries().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "GOOG", "MSFT"]);
        assert_eq!(first.get("GOOG").unwrap().current, 140.25);
        assert_eq!(first.get("TSLA"), None);
    }

    #[test]
    fn snapshot_does_not_alias_store() {
        let store = PriceStore::with_symbols(["AAPL"]);
        let before = store.snapshot();
        store.update("AAPL", 3.0).unwrap();

        assert_eq!(before.get("AAPL").unwrap().current, 0.0);
        assert_eq!(store.snapshot().get("AAPL").unwrap().current, 3.0);
    }
}
