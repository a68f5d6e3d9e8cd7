use std::{borrow::Borrow, fmt};

use thiserror::Error;
use tracing::warn;

pub mod in_memory_store;

/// Separates the object type and every attribute of a composite key.
const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';
/// Reserved by hosts as an open-ended range bound, so never allowed inside a key.
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Composite key attribute {attribute:?} contains a reserved character")]
    InvalidKeyAttribute { attribute: String },
    #[error("Key {key:?} is not a composite key")]
    MalformedCompositeKey { key: String },
    #[error("State iterator is already closed")]
    IteratorClosed,
}

/// Storage key built from an object type followed by ordered attributes.
///
/// Keys created with fewer attributes are prefixes of keys created with more,
/// which is what makes [`StateStore::state_by_partial_composite_key`] work.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    pub fn new(object_type: &str, attributes: &[&str]) -> Result<Self, StoreError> {
        validate_attribute(object_type)?;
        let mut key = String::with_capacity(
            object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>() + 2,
        );
        key.push(COMPOSITE_KEY_NAMESPACE);
        key.push_str(object_type);
        key.push(COMPOSITE_KEY_NAMESPACE);
        for attribute in attributes {
            validate_attribute(attribute)?;
            key.push_str(attribute);
            key.push(COMPOSITE_KEY_NAMESPACE);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the object type and the attributes the key was built from.
    pub fn split(&self) -> Result<(&str, Vec<&str>), StoreError> {
        let body = self
            .0
            .strip_prefix(COMPOSITE_KEY_NAMESPACE)
            .and_then(|rest| rest.strip_suffix(COMPOSITE_KEY_NAMESPACE))
            .ok_or_else(|| StoreError::MalformedCompositeKey {
                key: self.0.clone(),
            })?;
        Ok(match body.split_once(COMPOSITE_KEY_NAMESPACE) {
            Some((object_type, attributes)) => (
                object_type,
                attributes.split(COMPOSITE_KEY_NAMESPACE).collect(),
            ),
            None => (body, Vec::new()),
        })
    }
}

impl Borrow<str> for CompositeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // namespace separators are not printable
        f.write_str(&self.0.replace(COMPOSITE_KEY_NAMESPACE, "/"))
    }
}

fn validate_attribute(attribute: &str) -> Result<(), StoreError> {
    if attribute.contains([COMPOSITE_KEY_NAMESPACE, MAX_UNICODE_RUNE]) {
        return Err(StoreError::InvalidKeyAttribute {
            attribute: attribute.to_owned(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: CompositeKey,
    pub value: Vec<u8>,
}

/// Forward-only cursor over a range of the state.
///
/// Every iterator handed out by a store holds a host resource until [`close`](Self::close)
/// is called. Prefer wrapping it into a [`ScanGuard`].
pub trait StateIterator {
    /// `Ok(None)` signals the range is exhausted.
    fn next_entry(&mut self) -> Result<Option<KeyValue>, StoreError>;

    fn close(&mut self) -> Result<(), StoreError>;
}

/// The host key-value store, as seen from a single invocation.
///
/// Implementations must provide read-your-writes for the lifetime of the value.
/// Whether writes become durable is decided by the host after the invocation.
pub trait StateStore {
    fn get_state(&self, key: &CompositeKey) -> Result<Option<Vec<u8>>, StoreError>;

    fn put_state(&mut self, key: &CompositeKey, value: Vec<u8>) -> Result<(), StoreError>;

    fn state_by_partial_composite_key(
        &self,
        partial_key: &CompositeKey,
    ) -> Result<Box<dyn StateIterator + '_>, StoreError>;

    /// Empty values are treated the same as missing ones.
    fn state_exists(&self, key: &CompositeKey) -> Result<bool, StoreError> {
        Ok(self
            .get_state(key)?
            .is_some_and(|value| !value.is_empty()))
    }
}

/// Owns a [`StateIterator`] and guarantees it is closed, whichever way the scan ends.
pub struct ScanGuard<'a> {
    iter: Box<dyn StateIterator + 'a>,
    closed: bool,
}

impl<'a> ScanGuard<'a> {
    pub fn new(iter: Box<dyn StateIterator + 'a>) -> Self {
        Self {
            iter,
            closed: false,
        }
    }

    pub fn close(mut self) -> Result<(), StoreError> {
        self.closed = true;
        self.iter.close()
    }
}

impl Iterator for ScanGuard<'_> {
    type Item = Result<KeyValue, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.iter.next_entry().transpose()
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(err) = self.iter.close() {
                warn!(%err, "Failed to close state iterator");
            }
        }
    }
}
