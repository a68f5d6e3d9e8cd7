use serde::Serialize;

use crate::account::{Account, AccountError};

/// Identity of whoever submitted the current invocation, as verified by the host.
pub trait ClientIdentity {
    /// Identifier of the membership service provider (trust domain) of the caller.
    fn msp_id(&self) -> &str;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub msp_id: String,
    pub id: String,
}

impl Caller {
    pub fn new(msp_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            id: id.into(),
        }
    }
}

impl ClientIdentity for Caller {
    fn msp_id(&self) -> &str {
        &self.msp_id
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Serialize)]
struct OwnerDescriptor<'a> {
    mspid: &'a str,
    id: &'a str,
}

/// Descriptor recorded as the owner of accounts created by `identity`.
///
/// Only ever compared for equality, never parsed back.
pub fn caller_identity<I>(identity: &I) -> Result<String, AccountError>
where
    I: ClientIdentity + ?Sized,
{
    let descriptor = OwnerDescriptor {
        mspid: identity.msp_id(),
        id: identity.id(),
    };
    Ok(serde_json::to_string(&descriptor)?)
}

pub fn require_owner<I>(account: &Account, identity: &I) -> Result<(), AccountError>
where
    I: ClientIdentity + ?Sized,
{
    if account.owner() != caller_identity(identity)? {
        return Err(AccountError::Unauthorized {
            id: account.id().to_owned(),
        });
    }
    Ok(())
}
