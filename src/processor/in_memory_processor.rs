use tracing::debug;

use crate::{
    account::{Account, AccountError},
    command::ContractCommand,
    context::Context,
    identity::ClientIdentity,
    lister::scan_accounts,
    store::in_memory_store::InMemoryStore,
};

use super::{InvocationError, InvocationProcessor, Response};

#[derive(Default)]
pub struct InMemoryInvocationProcessor {
    pub store: InMemoryStore,
}

impl InMemoryInvocationProcessor {
    /// Every committed account, in key order.
    pub fn accounts(&self) -> Result<Vec<Account>, AccountError> {
        scan_accounts(&self.store, |_| true)
    }
}

impl InvocationProcessor for InMemoryInvocationProcessor {
    fn process_invocation<I>(
        &mut self,
        identity: &I,
        function: &str,
        args: &[String],
    ) -> Result<Response, InvocationError>
    where
        I: ClientIdentity,
    {
        let cmd = ContractCommand::parse_command(function, args)?;
        let function = cmd.function();
        let mut tx = self.store.begin();
        let response = cmd.execute(&mut Context::new(&mut tx, identity))?;
        // commit only when the whole operation succeeded, dropping `tx` discards it
        tx.commit();
        debug!(function = function.name(), "Invocation committed");
        Ok(response)
    }
}
