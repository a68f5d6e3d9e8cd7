use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tracing::debug;

use super::{CompositeKey, KeyValue, StateIterator, StateStore, StoreError};

type State = BTreeMap<CompositeKey, Vec<u8>>;

/// Committed state, kept in key order so partial key scans are plain range reads.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: State,
    open_iterators: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Starts staging writes for a single invocation.
    pub fn begin(&mut self) -> InMemoryTransaction<'_> {
        InMemoryTransaction {
            store: self,
            writes: State::new(),
        }
    }

    /// Number of iterators handed out and not closed yet.
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    fn open_iterator(&self, entries: Vec<KeyValue>) -> InMemoryIterator {
        self.open_iterators.fetch_add(1, Ordering::SeqCst);
        InMemoryIterator {
            entries: entries.into_iter(),
            open_iterators: Arc::clone(&self.open_iterators),
            closed: false,
        }
    }
}

fn scan_prefix<'a>(
    state: &'a State,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a CompositeKey, &'a Vec<u8>)> + 'a {
    state
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(key, _)| key.as_str().starts_with(prefix))
}

impl StateStore for InMemoryStore {
    fn get_state(&self, key: &CompositeKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &CompositeKey, value: Vec<u8>) -> Result<(), StoreError> {
        self.state.insert(key.clone(), value);
        Ok(())
    }

    fn state_by_partial_composite_key(
        &self,
        partial_key: &CompositeKey,
    ) -> Result<Box<dyn StateIterator + '_>, StoreError> {
        let entries = scan_prefix(&self.state, partial_key.as_str())
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(Box::new(self.open_iterator(entries)))
    }
}

/// Writes staged on top of an [`InMemoryStore`].
///
/// Nothing reaches the store until [`commit`](Self::commit); dropping the
/// transaction discards every staged write.
pub struct InMemoryTransaction<'s> {
    store: &'s mut InMemoryStore,
    writes: State,
}

impl InMemoryTransaction<'_> {
    pub fn commit(mut self) {
        let writes = std::mem::take(&mut self.writes);
        debug!(writes = writes.len(), "Committing transaction");
        self.store.state.extend(writes);
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.writes.is_empty() {
            debug!(writes = self.writes.len(), "Discarding staged writes");
        }
    }
}

impl StateStore for InMemoryTransaction<'_> {
    fn get_state(&self, key: &CompositeKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .writes
            .get(key)
            .or_else(|| self.store.state.get(key))
            .cloned())
    }

    fn put_state(&mut self, key: &CompositeKey, value: Vec<u8>) -> Result<(), StoreError> {
        self.writes.insert(key.clone(), value);
        Ok(())
    }

    fn state_by_partial_composite_key(
        &self,
        partial_key: &CompositeKey,
    ) -> Result<Box<dyn StateIterator + '_>, StoreError> {
        let prefix = partial_key.as_str();
        // staged writes shadow committed values with the same key
        let mut merged: BTreeMap<&CompositeKey, &Vec<u8>> =
            scan_prefix(&self.store.state, prefix).collect();
        merged.extend(scan_prefix(&self.writes, prefix));
        let entries = merged
            .into_iter()
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(Box::new(self.store.open_iterator(entries)))
    }
}

pub struct InMemoryIterator {
    entries: std::vec::IntoIter<KeyValue>,
    open_iterators: Arc<AtomicUsize>,
    closed: bool,
}

impl StateIterator for InMemoryIterator {
    fn next_entry(&mut self) -> Result<Option<KeyValue>, StoreError> {
        if self.closed {
            return Err(StoreError::IteratorClosed);
        }
        Ok(self.entries.next())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::IteratorClosed);
        }
        self.closed = true;
        self.open_iterators.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
