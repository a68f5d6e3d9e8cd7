use tracing::debug;

use crate::{
    account::{ACCOUNT_OBJECT_TYPE, Account, AccountError, decode_account},
    context::Context,
    identity::ClientIdentity,
    store::{CompositeKey, KeyValue, ScanGuard, StateStore},
};

/// Returns every account owned by the caller, as a JSON array.
pub fn list_accounts<S, I>(ctx: &Context<'_, S, I>) -> Result<String, AccountError>
where
    S: StateStore,
    I: ClientIdentity,
{
    let owner = ctx.caller_identity()?;
    let accounts = scan_accounts(&*ctx.stub, |account| account.owner() == owner)?;
    debug!(count = accounts.len(), "Listed accounts");
    Ok(serde_json::to_string(&accounts)?)
}

/// Decodes every account record in key order, keeping those accepted by `keep`.
///
/// The scan handle is released whether the scan completes or fails midway.
pub fn scan_accounts<S>(
    stub: &S,
    mut keep: impl FnMut(&Account) -> bool,
) -> Result<Vec<Account>, AccountError>
where
    S: StateStore,
{
    let prefix = CompositeKey::new(ACCOUNT_OBJECT_TYPE, &[])?;
    let mut scan = ScanGuard::new(stub.state_by_partial_composite_key(&prefix)?);
    let mut accounts = Vec::new();
    for entry in &mut scan {
        let KeyValue { key, value } = entry?;
        if value.is_empty() {
            continue;
        }
        let account = decode_account(&key, &value)?;
        if keep(&account) {
            accounts.push(account);
        }
    }
    scan.close()?;
    Ok(accounts)
}
