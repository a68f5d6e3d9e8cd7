use rust_decimal::{Decimal, prelude::Zero};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::store::{CompositeKey, StateStore, StoreError};

/// Object type every account key is created under.
pub const ACCOUNT_OBJECT_TYPE: &str = "Account";

pub type AccountId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    Unparsable,
    Negative,
    NotPositive,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("The account {id} does not exist")]
    AccountNotFound { id: AccountId },
    #[error("The account {id} already exists")]
    AccountAlreadyExists { id: AccountId },
    #[error("Caller is not the owner of account {id}")]
    Unauthorized { id: AccountId },
    #[error("Invalid amount {value:?}: {reason:?}")]
    InvalidAmount { value: String, reason: AmountError },
    #[error("Insufficient funds in account {id}")]
    InsufficientFunds { id: AccountId },
    #[error("Balance of account {id} would overflow")]
    BalanceOverflow { id: AccountId },
    #[error("Record stored at {key} is not a valid account")]
    CorruptRecord {
        key: CompositeKey,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode account: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single account record, stored as JSON under [`account_key`].
///
/// `balance` is serialized as a decimal string, but numbers are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    owner: String,
    balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, owner: String, balance: Decimal) -> Self {
        Self { id, owner, balance }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn set_balance(&mut self, balance: Decimal) {
        self.balance = balance;
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if self.balance < amount {
            return Err(AccountError::InsufficientFunds {
                id: self.id.clone(),
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        self.balance =
            self.balance
                .checked_add(amount)
                .ok_or_else(|| AccountError::BalanceOverflow {
                    id: self.id.clone(),
                })?;
        Ok(())
    }
}

pub fn account_key(id: &str) -> Result<CompositeKey, StoreError> {
    CompositeKey::new(ACCOUNT_OBJECT_TYPE, &[id])
}

/// Parses an amount received as text.
///
/// Accepts `[+-]digits[.digits]` with an optional `e[+-]digits` exponent, surrounded
/// by whitespace. Input that cannot be represented without rounding is rejected,
/// nothing is coerced.
pub fn parse_amount(value: &str) -> Result<Decimal, AccountError> {
    parse_exact(value.trim()).ok_or_else(|| AccountError::InvalidAmount {
        value: value.to_owned(),
        reason: AmountError::Unparsable,
    })
}

fn parse_exact(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent.parse::<i64>().ok()?)),
        None => (text, None),
    };
    if !is_plain_number(mantissa) {
        return None;
    }
    let mantissa = Decimal::from_str_exact(mantissa).ok()?;
    match exponent {
        Some(exponent) => scale_by_power_of_ten(mantissa, exponent),
        None => Some(mantissa),
    }
}

fn is_plain_number(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(unsigned),
    }
}

fn scale_by_power_of_ten(mantissa: Decimal, exponent: i64) -> Option<Decimal> {
    let base = mantissa.normalize();
    if base.is_zero() {
        return Some(Decimal::zero());
    }
    let scale = i64::from(base.scale()) - exponent;
    if scale >= 0 {
        return Decimal::try_from_i128_with_scale(base.mantissa(), u32::try_from(scale).ok()?)
            .ok();
    }
    // 10^29 already exceeds the 96-bit mantissa
    if scale < -28 {
        return None;
    }
    let mut value = Decimal::try_from_i128_with_scale(base.mantissa(), 0).ok()?;
    for _ in 0..-scale {
        value = value.checked_mul(Decimal::TEN)?;
    }
    Some(value)
}

/// Amount that may be zero, such as an opening or overriding balance.
pub fn parse_balance(value: &str) -> Result<Decimal, AccountError> {
    let amount = parse_amount(value)?;
    if amount < Decimal::zero() {
        return Err(AccountError::InvalidAmount {
            value: value.to_owned(),
            reason: AmountError::Negative,
        });
    }
    // "-0" parses with the sign bit set
    Ok(if amount.is_zero() { Decimal::zero() } else { amount })
}

/// Amount that is moved between accounts, so it must be strictly positive.
pub fn parse_transfer_amount(value: &str) -> Result<Decimal, AccountError> {
    let amount = parse_amount(value)?;
    if amount <= Decimal::zero() {
        return Err(AccountError::InvalidAmount {
            value: value.to_owned(),
            reason: AmountError::NotPositive,
        });
    }
    Ok(amount)
}

pub(crate) fn decode_account(key: &CompositeKey, bytes: &[u8]) -> Result<Account, AccountError> {
    serde_json::from_slice(bytes).map_err(|source| AccountError::CorruptRecord {
        key: key.clone(),
        source,
    })
}

/// Reads and writes [`Account`] records in the host store.
///
/// `put` overwrites unconditionally, every precondition must be checked before.
pub struct AccountStore<'s, S> {
    stub: &'s mut S,
}

impl<'s, S> AccountStore<'s, S>
where
    S: StateStore,
{
    pub fn new(stub: &'s mut S) -> Self {
        Self { stub }
    }

    pub fn exists(&self, id: &str) -> Result<bool, AccountError> {
        Ok(self.stub.state_exists(&account_key(id)?)?)
    }

    pub fn get(&self, id: &str) -> Result<Account, AccountError> {
        let key = account_key(id)?;
        match self.stub.get_state(&key)? {
            Some(bytes) if !bytes.is_empty() => decode_account(&key, &bytes),
            _ => Err(AccountError::AccountNotFound { id: id.to_owned() }),
        }
    }

    pub fn put(&mut self, account: &Account) -> Result<(), AccountError> {
        let key = account_key(&account.id)?;
        let bytes = serde_json::to_vec(account)?;
        debug!(id = %account.id, balance = %account.balance, "Writing account");
        self.stub.put_state(&key, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::prelude::FromPrimitive;

    use crate::store::in_memory_store::InMemoryStore;

    use super::*;

    #[test]
    fn parse_amounts() {
        assert_eq!(parse_amount("100").unwrap(), Decimal::from_u32(100).unwrap());
        assert_eq!(
            parse_amount(" 12.50 ").unwrap(),
            Decimal::from_str("12.5").unwrap()
        );
        assert_eq!(parse_amount("1e3").unwrap(), Decimal::from_u32(1000).unwrap());
        assert_eq!(parse_amount("-3").unwrap(), Decimal::from_i32(-3).unwrap());

        for value in [
            "", "abc", "NaN", "Infinity", "10abc", "1.2.3", "1_000", "--1", "0x10", ".5", "1e",
            "e5", "1e1.5", "1e_3",
        ] {
            let err = parse_amount(value).unwrap_err();
            assert!(
                matches!(
                    err,
                    AccountError::InvalidAmount {
                        reason: AmountError::Unparsable,
                        ..
                    }
                ),
                "{value:?} should not parse"
            );
        }
    }

    #[test]
    fn scientific_amounts() {
        assert_eq!(parse_amount("1.5e2").unwrap(), Decimal::from_u32(150).unwrap());
        assert_eq!(parse_amount("25E-2").unwrap(), Decimal::from_str("0.25").unwrap());
        assert_eq!(parse_amount("-4e+1").unwrap(), Decimal::from_i32(-40).unwrap());
        assert_eq!(parse_amount("0e99").unwrap(), Decimal::zero());
        assert_eq!(
            parse_amount("1e28").unwrap(),
            Decimal::from_str("10000000000000000000000000000").unwrap()
        );
        assert_eq!(
            parse_amount("1e-28").unwrap(),
            Decimal::from_str("0.0000000000000000000000000001").unwrap()
        );
    }

    #[test]
    fn amounts_are_never_rounded() {
        for value in [
            "0.00000000000000000000000000005",
            "0.12345678901234567890123456789",
            "1e-29",
            "5e-29",
            "1e29",
            "79228162514264337593543950336",
        ] {
            let err = parse_amount(value).unwrap_err();
            assert!(
                matches!(
                    err,
                    AccountError::InvalidAmount {
                        reason: AmountError::Unparsable,
                        ..
                    }
                ),
                "{value:?} cannot be represented exactly"
            );
        }
        assert!(parse_transfer_amount("0.00000000000000000000000000005").is_err());
        assert!(parse_balance("0.12345678901234567890123456789").is_err());

        assert_eq!(
            parse_amount("0.1234567890123456789012345678").unwrap().to_string(),
            "0.1234567890123456789012345678"
        );
    }

    #[test]
    fn balance_and_transfer_amount_bounds() {
        assert_eq!(parse_balance("0").unwrap(), Decimal::zero());
        assert!(!parse_balance("-0").unwrap().is_sign_negative());
        let err = parse_balance("-0.01").unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidAmount {
                reason: AmountError::Negative,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Invalid amount \"-0.01\": Negative");

        assert_eq!(
            parse_transfer_amount("0.01").unwrap(),
            Decimal::from_str("0.01").unwrap()
        );
        for value in ["0", "-5"] {
            let err = parse_transfer_amount(value).unwrap_err();
            assert!(matches!(
                err,
                AccountError::InvalidAmount {
                    reason: AmountError::NotPositive,
                    ..
                }
            ));
        }
    }

    #[test]
    fn withdraw_and_deposit() {
        let mut acc = Account::new(
            "a1".to_string(),
            "owner".to_string(),
            Decimal::from_u32(10).unwrap(),
        );
        acc.withdraw(Decimal::from_u32(10).unwrap()).unwrap();
        assert_eq!(acc.balance(), Decimal::zero());

        let err = acc.withdraw(Decimal::from_str("0.1").unwrap()).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { id } if id == "a1"));
        assert_eq!(acc.balance(), Decimal::zero());

        acc.deposit(Decimal::from_str("0.1").unwrap()).unwrap();
        acc.deposit(Decimal::from_str("0.2").unwrap()).unwrap();
        assert_eq!(acc.balance(), Decimal::from_str("0.3").unwrap());

        acc.set_balance(Decimal::MAX);
        let err = acc.deposit(Decimal::from_u32(1).unwrap()).unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
        assert_eq!(acc.balance(), Decimal::MAX);
    }

    #[test]
    fn store_round_trip() {
        let mut stub = InMemoryStore::default();
        let mut accounts = AccountStore::new(&mut stub);
        assert!(!accounts.exists("a1").unwrap());
        let err = accounts.get("a1").unwrap_err();
        assert!(matches!(err, AccountError::AccountNotFound { id } if id == "a1"));

        let acc = Account::new(
            "a1".to_string(),
            "owner".to_string(),
            Decimal::from_str("12.5").unwrap(),
        );
        accounts.put(&acc).unwrap();
        assert!(accounts.exists("a1").unwrap());
        assert_eq!(accounts.get("a1").unwrap(), acc);

        let stored = stub.get_state(&account_key("a1").unwrap()).unwrap().unwrap();
        assert_eq!(
            std::str::from_utf8(&stored).unwrap(),
            r#"{"id":"a1","owner":"owner","balance":"12.5"}"#
        );
    }

    #[test]
    fn read_numeric_balance() {
        let mut stub = InMemoryStore::default();
        stub.put_state(
            &account_key("a1").unwrap(),
            br#"{"id":"a1","owner":"owner","balance":42}"#.to_vec(),
        )
        .unwrap();
        let acc = AccountStore::new(&mut stub).get("a1").unwrap();
        assert_eq!(acc.balance(), Decimal::from_u32(42).unwrap());
    }

    #[test]
    fn corrupt_and_empty_records() {
        let mut stub = InMemoryStore::default();
        stub.put_state(&account_key("bad").unwrap(), b"not json".to_vec())
            .unwrap();
        stub.put_state(&account_key("empty").unwrap(), Vec::new())
            .unwrap();
        let accounts = AccountStore::new(&mut stub);

        let err = accounts.get("bad").unwrap_err();
        assert!(matches!(err, AccountError::CorruptRecord { .. }));
        assert_eq!(
            err.to_string(),
            "Record stored at /Account/bad/ is not a valid account"
        );

        let err = accounts.get("empty").unwrap_err();
        assert!(matches!(err, AccountError::AccountNotFound { .. }));

        let err = accounts.get("a\u{0}").unwrap_err();
        assert!(matches!(
            err,
            AccountError::Store(StoreError::InvalidKeyAttribute { .. })
        ));
    }
}
