use std::{
    cell::Cell,
    cmp::Ordering,
    collections::{BTreeMap, btree_map},
    iter::Peekable,
    ops::Bound,
};

use super::{LedgerStore, RangeScan, StoreError};

type Entries = BTreeMap<String, Vec<u8>>;

/// Ordered in memory ledger.
///
/// Writes made directly through [`LedgerStore::put`] are visible immediately. Contract
/// invocations should instead run against [`InMemoryStore::begin`], so that a failed
/// invocation leaves no partial writes behind.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Entries,
    open_scans: Cell<usize>,
}

impl InMemoryStore {
    pub fn begin(&mut self) -> StagedWrites<'_> {
        StagedWrites {
            base: self,
            pending: Entries::new(),
        }
    }

    /// Number of range scans that were handed out and not yet dropped.
    pub fn open_scans(&self) -> usize {
        self.open_scans.get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tracked<'a>(
        &'a self,
        iter: impl Iterator<Item = (&'a String, &'a Vec<u8>)> + 'a,
    ) -> RangeScan<'a> {
        self.open_scans.set(self.open_scans.get() + 1);
        Box::new(TrackedScan {
            inner: iter,
            open_scans: &self.open_scans,
        })
    }
}

impl LedgerStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn scan_range(&self, start: &str, end: &str) -> Result<RangeScan<'_>, StoreError> {
        let range = key_range(start, end)?;
        Ok(self.tracked(self.entries.range::<str, _>(range)))
    }
}

/// Write set of a single invocation on top of an [`InMemoryStore`].
///
/// Reads observe the staged writes. Nothing reaches the underlying store until
/// [`StagedWrites::commit`]; dropping the handle discards every staged write.
#[derive(Debug)]
pub struct StagedWrites<'s> {
    base: &'s mut InMemoryStore,
    pending: Entries,
}

impl StagedWrites<'_> {
    /// Applies all staged writes at once, returns how many keys were written.
    pub fn commit(self) -> usize {
        let written = self.pending.len();
        self.base.entries.extend(self.pending);
        written
    }
}

impl LedgerStore for StagedWrites<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.pending.insert(key.to_owned(), value);
        Ok(())
    }

    fn scan_range(&self, start: &str, end: &str) -> Result<RangeScan<'_>, StoreError> {
        let range = key_range(start, end)?;
        let merged = MergedRange {
            base: self.base.entries.range::<str, _>(range).peekable(),
            pending: self.pending.range::<str, _>(range).peekable(),
        };
        Ok(self.base.tracked(merged))
    }
}

fn key_range<'k>(start: &'k str, end: &'k str) -> Result<(Bound<&'k str>, Bound<&'k str>), StoreError> {
    if !start.is_empty() && !end.is_empty() && start > end {
        return Err(StoreError::InvalidRange {
            start: start.to_owned(),
            end: end.to_owned(),
        });
    }
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start)
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    Ok((lower, upper))
}

struct TrackedScan<'a, I> {
    inner: I,
    open_scans: &'a Cell<usize>,
}

impl<'a, I> Iterator for TrackedScan<'a, I>
where
    I: Iterator<Item = (&'a String, &'a Vec<u8>)>,
{
    type Item = Result<(String, Vec<u8>), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| Ok((key.clone(), value.clone())))
    }
}

impl<I> Drop for TrackedScan<'_, I> {
    fn drop(&mut self) {
        self.open_scans.set(self.open_scans.get() - 1);
    }
}

/// Key ordered union of committed and staged entries, staged values win.
struct MergedRange<'a> {
    base: Peekable<btree_map::Range<'a, String, Vec<u8>>>,
    pending: Peekable<btree_map::Range<'a, String, Vec<u8>>>,
}

impl<'a> Iterator for MergedRange<'a> {
    type Item = (&'a String, &'a Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.base.peek(), self.pending.peek()) {
            (Some((base_key, _)), Some((pending_key, _))) => base_key.cmp(pending_key),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };
        match order {
            Ordering::Less => self.base.next(),
            Ordering::Greater => self.pending.next(),
            Ordering::Equal => {
                self.base.next();
                self.pending.next()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(scan: RangeScan<'_>) -> Vec<String> {
        scan.map(|entry| entry.unwrap().0).collect()
    }

    fn store_with(keys: &[&str]) -> InMemoryStore {
        let mut store = InMemoryStore::default();
        for key in keys {
            store.put(key, key.as_bytes().to_vec()).unwrap();
        }
        store
    }

    #[test]
    fn get_and_put() {
        let mut store = InMemoryStore::default();
        assert_eq!(store.get("US_Bank").unwrap(), None);
        store.put("US_Bank", b"{}".to_vec()).unwrap();
        assert_eq!(store.get("US_Bank").unwrap(), Some(b"{}".to_vec()));
        assert!(matches!(
            store.put("", b"{}".to_vec()).unwrap_err(),
            StoreError::EmptyKey
        ));
    }

    #[test]
    fn scan_in_key_order() {
        let store = store_with(&["b", "d", "a", "c"]);
        assert_eq!(keys(store.scan_range("", "").unwrap()), ["a", "b", "c", "d"]);
        // start inclusive, end exclusive
        assert_eq!(keys(store.scan_range("b", "d").unwrap()), ["b", "c"]);
        assert_eq!(keys(store.scan_range("c", "").unwrap()), ["c", "d"]);
        assert_eq!(keys(store.scan_range("", "b").unwrap()), ["a"]);
        assert!(keys(store.scan_range("b", "b").unwrap()).is_empty());
        assert!(matches!(
            store.scan_range("d", "a").err().unwrap(),
            StoreError::InvalidRange { .. }
        ));
    }

    #[test]
    fn scans_released_on_drop() {
        let store = store_with(&["a", "b"]);
        let mut scan = store.scan_range("", "").unwrap();
        assert_eq!(store.open_scans(), 1);
        // partially consumed scan is released as well
        scan.next();
        drop(scan);
        assert_eq!(store.open_scans(), 0);
    }

    #[test]
    fn staged_writes_visible_only_after_commit() {
        let mut store = store_with(&["a"]);
        let mut tx = store.begin();
        tx.put("b", b"staged".to_vec()).unwrap();
        tx.put("a", b"replaced".to_vec()).unwrap();
        assert_eq!(tx.get("b").unwrap(), Some(b"staged".to_vec()));
        assert_eq!(tx.get("a").unwrap(), Some(b"replaced".to_vec()));
        assert_eq!(tx.commit(), 2);

        assert_eq!(store.get("a").unwrap(), Some(b"replaced".to_vec()));
        assert_eq!(store.get("b").unwrap(), Some(b"staged".to_vec()));
    }

    #[test]
    fn dropped_staged_writes_are_discarded() {
        let mut store = store_with(&["a"]);
        {
            let mut tx = store.begin();
            tx.put("a", b"replaced".to_vec()).unwrap();
            tx.put("z", b"new".to_vec()).unwrap();
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap(), Some(b"a".to_vec()));
    }

    #[test]
    fn staged_scan_merges_pending_entries() {
        let mut store = store_with(&["a", "c", "e"]);
        let mut tx = store.begin();
        tx.put("b", b"new".to_vec()).unwrap();
        tx.put("c", b"replaced".to_vec()).unwrap();
        tx.put("f", b"new".to_vec()).unwrap();

        let entries: Vec<_> = tx
            .scan_range("", "")
            .unwrap()
            .map(Result::unwrap)
            .collect();
        let keys: Vec<_> = entries.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c", "e", "f"]);
        assert_eq!(entries[2].1, b"replaced".to_vec());

        assert_eq!(keys_of(&tx, "b", "f"), ["b", "c", "e"]);
        drop(tx);
        assert_eq!(store.open_scans(), 0);
    }

    fn keys_of(store: &impl LedgerStore, start: &str, end: &str) -> Vec<String> {
        keys(store.scan_range(start, end).unwrap())
    }
}
