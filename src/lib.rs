/// Account records, their storage keys and amount parsing.
pub mod account;

/// Caller identity and the owner check guarding account mutations.
pub mod identity;

/// Per-invocation handles to the host store and the caller identity.
pub mod context;

/// Host key-value store interface, composite keys, plus "in memory" implementation.
pub mod store;

/// Balance mutations: account creation, balance override and transfers.
pub mod transfer;

/// Enumeration of stored accounts.
pub mod lister;

/// Maps named invocations with string arguments onto the operations above.
pub mod command;

/// Invocation processor interface, plus "in memory" implementation.
/// Runs each invocation as one all-or-nothing unit of writes.
pub mod processor;

/// Ideally, this module should exist in its own crate, as a way to
/// bootstrap core logic. It is kept here so the integration tests can use it.
pub mod bin_utils;
