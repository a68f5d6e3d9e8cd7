use std::str::FromStr;

use thiserror::Error;

use crate::{
    account::AccountError,
    context::Context,
    identity::ClientIdentity,
    lister::list_accounts,
    store::StateStore,
    transfer::{init_account, set_balance, transfer, transfer_balance},
};

/// Operations that can be invoked by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFunction {
    InitAccount,
    SetBalance,
    Transfer,
    TransferBalance,
    ListAccounts,
}

impl ContractFunction {
    pub fn name(self) -> &'static str {
        match self {
            Self::InitAccount => "initAccount",
            Self::SetBalance => "setBalance",
            Self::Transfer => "transfer",
            Self::TransferBalance => "transferBalance",
            Self::ListAccounts => "listAccounts",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::InitAccount | Self::SetBalance => 2,
            Self::Transfer | Self::TransferBalance => 3,
            Self::ListAccounts => 0,
        }
    }
}

impl FromStr for ContractFunction {
    type Err = ContractCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initAccount" => Ok(Self::InitAccount),
            "setBalance" => Ok(Self::SetBalance),
            "transfer" => Ok(Self::Transfer),
            "transferBalance" => Ok(Self::TransferBalance),
            "listAccounts" => Ok(Self::ListAccounts),
            _ => Err(ContractCommandError::UnknownFunction {
                name: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContractCommandError {
    #[error("Unknown function {name:?}")]
    UnknownFunction { name: String },
    #[error("{function:?} expects {expected} arguments, got {actual}")]
    WrongArgumentCount {
        function: ContractFunction,
        expected: usize,
        actual: usize,
    },
}

/// Fully parsed invocation. Amounts stay as text, they are validated by the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCommand {
    InitAccount {
        id: String,
        balance: String,
    },
    SetBalance {
        id: String,
        new_balance: String,
    },
    Transfer {
        id_from: String,
        id_to: String,
        amount: String,
    },
    TransferBalance {
        from_id: String,
        to_id: String,
        amount: String,
    },
    ListAccounts,
}

impl ContractCommand {
    pub fn parse_command(function: &str, args: &[String]) -> Result<Self, ContractCommandError> {
        let function = ContractFunction::from_str(function)?;
        Ok(match (function, args) {
            (ContractFunction::InitAccount, [id, balance]) => Self::InitAccount {
                id: id.clone(),
                balance: balance.clone(),
            },
            (ContractFunction::SetBalance, [id, new_balance]) => Self::SetBalance {
                id: id.clone(),
                new_balance: new_balance.clone(),
            },
            (ContractFunction::Transfer, [id_from, id_to, amount]) => Self::Transfer {
                id_from: id_from.clone(),
                id_to: id_to.clone(),
                amount: amount.clone(),
            },
            (ContractFunction::TransferBalance, [from_id, to_id, amount]) => {
                Self::TransferBalance {
                    from_id: from_id.clone(),
                    to_id: to_id.clone(),
                    amount: amount.clone(),
                }
            }
            (ContractFunction::ListAccounts, []) => Self::ListAccounts,
            _ => {
                return Err(ContractCommandError::WrongArgumentCount {
                    function,
                    expected: function.arity(),
                    actual: args.len(),
                });
            }
        })
    }

    pub fn function(&self) -> ContractFunction {
        match self {
            Self::InitAccount { .. } => ContractFunction::InitAccount,
            Self::SetBalance { .. } => ContractFunction::SetBalance,
            Self::Transfer { .. } => ContractFunction::Transfer,
            Self::TransferBalance { .. } => ContractFunction::TransferBalance,
            Self::ListAccounts => ContractFunction::ListAccounts,
        }
    }

    /// Runs the command against the invocation context.
    ///
    /// Returns the serialized response for operations that produce one.
    pub fn execute<S, I>(self, ctx: &mut Context<'_, S, I>) -> Result<Option<String>, AccountError>
    where
        S: StateStore,
        I: ClientIdentity,
    {
        match self {
            Self::InitAccount { id, balance } => init_account(ctx, &id, &balance)?,
            Self::SetBalance { id, new_balance } => set_balance(ctx, &id, &new_balance)?,
            Self::Transfer {
                id_from,
                id_to,
                amount,
            } => transfer(ctx, &id_from, &id_to, &amount)?,
            Self::TransferBalance {
                from_id,
                to_id,
                amount,
            } => transfer_balance(ctx, &from_id, &to_id, &amount)?,
            Self::ListAccounts => return list_accounts(ctx).map(Some),
        }
        Ok(None)
    }
}
