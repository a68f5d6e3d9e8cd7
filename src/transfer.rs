use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    account::{
        Account, AccountError, AccountStore, parse_balance, parse_transfer_amount,
    },
    context::Context,
    identity::{ClientIdentity, require_owner},
    store::StateStore,
};

/// Creates a new account owned by the caller.
pub fn init_account<S, I>(
    ctx: &mut Context<'_, S, I>,
    id: &str,
    balance: &str,
) -> Result<(), AccountError>
where
    S: StateStore,
    I: ClientIdentity,
{
    let balance = parse_balance(balance)?;
    let owner = ctx.caller_identity()?;
    let mut accounts = AccountStore::new(&mut *ctx.stub);
    if accounts.exists(id)? {
        return Err(AccountError::AccountAlreadyExists { id: id.to_owned() });
    }
    accounts.put(&Account::new(id.to_owned(), owner, balance))?;
    info!(id, %balance, "Account created");
    Ok(())
}

/// Overrides the balance of an account owned by the caller.
pub fn set_balance<S, I>(
    ctx: &mut Context<'_, S, I>,
    id: &str,
    new_balance: &str,
) -> Result<(), AccountError>
where
    S: StateStore,
    I: ClientIdentity,
{
    let mut accounts = AccountStore::new(&mut *ctx.stub);
    let mut account = accounts.get(id)?;
    require_owner(&account, ctx.client_identity)?;
    let balance = parse_balance(new_balance)?;
    account.set_balance(balance);
    accounts.put(&account)?;
    info!(id, %balance, "Balance set");
    Ok(())
}

/// Moves `amount` out of an account owned by the caller into any other account.
pub fn transfer<S, I>(
    ctx: &mut Context<'_, S, I>,
    id_from: &str,
    id_to: &str,
    amount: &str,
) -> Result<(), AccountError>
where
    S: StateStore,
    I: ClientIdentity,
{
    let mut accounts = AccountStore::new(&mut *ctx.stub);
    let from = accounts.get(id_from)?;
    require_owner(&from, ctx.client_identity)?;
    let amount = parse_transfer_amount(amount)?;
    ensure_funds(&from, amount)?;
    let to = accounts.get(id_to)?;
    settle(&mut accounts, from, to, amount)
}

/// Same movement as [`transfer`], without any ownership check.
pub fn transfer_balance<S, I>(
    ctx: &mut Context<'_, S, I>,
    from_id: &str,
    to_id: &str,
    amount: &str,
) -> Result<(), AccountError>
where
    S: StateStore,
    I: ClientIdentity,
{
    let amount = parse_transfer_amount(amount)?;
    let mut accounts = AccountStore::new(&mut *ctx.stub);
    let from = accounts.get(from_id)?;
    let to = accounts.get(to_id)?;
    ensure_funds(&from, amount)?;
    settle(&mut accounts, from, to, amount)
}

fn ensure_funds(from: &Account, amount: Decimal) -> Result<(), AccountError> {
    if from.balance() < amount {
        return Err(AccountError::InsufficientFunds {
            id: from.id().to_owned(),
        });
    }
    Ok(())
}

/// Applies the debit and credit, then writes both legs.
///
/// Both balances are computed before anything is written, so an error leaves the
/// store as it was.
fn settle<S>(
    accounts: &mut AccountStore<'_, S>,
    mut from: Account,
    mut to: Account,
    amount: Decimal,
) -> Result<(), AccountError>
where
    S: StateStore,
{
    if from.id() == to.id() {
        debug!(id = from.id(), %amount, "Transfer to the same account, nothing to write");
        return Ok(());
    }
    from.withdraw(amount)?;
    to.deposit(amount)?;
    accounts.put(&from)?;
    accounts.put(&to)?;
    info!(from = from.id(), to = to.id(), %amount, "Funds transferred");
    Ok(())
}
