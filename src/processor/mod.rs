use thiserror::Error;

use crate::{account::AccountError, command::ContractCommandError, identity::ClientIdentity};

pub mod in_memory_processor;

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    CommandErr(#[from] ContractCommandError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
}

/// Serialized payload returned by an invocation, if the operation has one.
pub type Response = Option<String>;

pub trait InvocationProcessor {
    /// Runs one named operation as a single atomic unit: either every write it
    /// makes is kept, or none is.
    fn process_invocation<I>(
        &mut self,
        identity: &I,
        function: &str,
        args: &[String],
    ) -> Result<Response, InvocationError>
    where
        I: ClientIdentity;
}
