use crate::account::AccountError;
use crate::identity::ClientIdentity;
use crate::store::StateStore;

/// Everything the host hands to a single invocation.
pub struct Context<'a, S, I> {
    pub stub: &'a mut S,
    pub client_identity: &'a I,
}

impl<'a, S, I> Context<'a, S, I>
where
    S: StateStore,
    I: ClientIdentity,
{
    pub fn new(stub: &'a mut S, client_identity: &'a I) -> Self {
        Self {
            stub,
            client_identity,
        }
    }

    pub fn caller_identity(&self) -> Result<String, AccountError> {
        crate::identity::caller_identity(self.client_identity)
    }
}
