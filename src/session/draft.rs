//! Draft transfer form and transfer construction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::chain::types::{Account, Amount};
use crate::wallet::TransferIntent;

/// Transient form data edited field by field by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTransfer {
    pub address_to: String,
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

/// One editable field of a [`DraftTransfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    AddressTo,
    Amount,
    Keyword,
    Message,
}

impl DraftField {
    pub const ALL: [DraftField; 4] = [
        DraftField::AddressTo,
        DraftField::Amount,
        DraftField::Keyword,
        DraftField::Message,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown draft field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for DraftField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addressTo" | "address_to" => Ok(DraftField::AddressTo),
            "amount" => Ok(DraftField::Amount),
            "keyword" => Ok(DraftField::Keyword),
            "message" => Ok(DraftField::Message),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

impl DraftTransfer {
    pub fn set(&mut self, field: DraftField, value: String) {
        match field {
            DraftField::AddressTo => self.address_to = value,
            DraftField::Amount => self.amount = value,
            DraftField::Keyword => self.keyword = value,
            DraftField::Message => self.message = value,
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::AddressTo => &self.address_to,
            DraftField::Amount => &self.amount,
            DraftField::Keyword => &self.keyword,
            DraftField::Message => &self.message,
        }
    }

    /// Where a transfer built from this draft goes.
    pub fn destination(&self, from: &Account) -> Destination {
        let to = self.address_to.trim();
        if to.is_empty() || to == from.as_str() {
            Destination::OwnAccount
        } else {
            Destination::Other(Account::new(to))
        }
    }
}

/// Destination selection for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// No distinct destination: the fixed demo transfer to self.
    OwnAccount,
    /// The draft's `address_to`.
    Other(Account),
}

/// Why a draft cannot become a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("amount '{0}' is not a valid SOL amount")]
    InvalidAmount(String),

    #[error("amount must be greater than zero")]
    ZeroAmount,
}

/// Build the transfer for `draft` sent from `from`.
///
/// Without a distinct destination this is the demo transfer of
/// `demo_lamports` to self and the draft amount is ignored. Otherwise the
/// draft amount must parse and be non-zero. A non-empty message becomes
/// the memo in both cases.
pub fn build_transfer(
    draft: &DraftTransfer,
    from: &Account,
    demo_lamports: u64,
) -> Result<TransferIntent, DraftError> {
    let memo = Some(draft.message.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    match draft.destination(from) {
        Destination::OwnAccount => Ok(TransferIntent {
            from: from.clone(),
            to: from.clone(),
            lamports: demo_lamports,
            memo,
        }),
        Destination::Other(to) => {
            let amount: Amount = draft
                .amount
                .parse()
                .map_err(|_| DraftError::InvalidAmount(draft.amount.clone()))?;
            if amount == Amount::ZERO {
                return Err(DraftError::ZeroAmount);
            }
            Ok(TransferIntent {
                from: from.clone(),
                to,
                lamports: amount.lamports(),
                memo,
            })
        }
    }
}
