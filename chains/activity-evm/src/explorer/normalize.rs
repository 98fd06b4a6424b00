use activity_core::{
    Activity, ActivityStatus, AssetId, AssetMetadata, AssetsMetadata, Operation, OperationKind,
};

use super::types::{ExplorerTransaction, TokenTransfer};
use crate::calldata::{same_address, Call};

impl TokenTransfer {
    fn asset(&self) -> AssetId {
        let token_id = self.total.as_ref().and_then(|t| t.token_id.clone());
        AssetId::token(self.token.address.to_lowercase(), token_id)
    }

    fn amount(&self) -> String {
        // non fungible transfers come without a value
        self.total
            .as_ref()
            .and_then(|t| t.value.clone())
            .unwrap_or_else(|| "1".to_owned())
    }

    fn operation(&self) -> Operation {
        Operation::new(OperationKind::Transfer {
            from: self.from.hash.clone(),
            to: self.to.hash.clone(),
            asset: self.asset(),
            amount: self.amount(),
        })
        .with_log_index(self.log_index)
    }

    fn metadata(&self) -> AssetMetadata {
        AssetMetadata {
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            decimals: self.token.decimals.as_deref().and_then(|d| d.parse().ok()),
        }
    }
}

/// Collects the token descriptors of the page's transfers
pub(crate) fn transfers_metadata<'a>(
    transfers: impl IntoIterator<Item = &'a TokenTransfer>,
) -> AssetsMetadata {
    transfers
        .into_iter()
        .map(|t| (t.asset(), t.metadata()))
        .collect()
}

fn status(status: Option<&str>) -> ActivityStatus {
    match status {
        Some("ok") => ActivityStatus::Applied,
        Some("error") => ActivityStatus::Failed,
        _ => ActivityStatus::Other,
    }
}

/// Normalizes an account transaction together with the token transfers
/// it emitted.
pub(crate) fn normalize_transaction(
    tx: ExplorerTransaction,
    transfers: &[TokenTransfer],
) -> Activity {
    let status = status(tx.status.as_deref());
    let call = tx.raw_input.as_deref().map_or(Some(Call::Plain), Call::decode);
    let to = tx.to.as_ref().map(|to| to.hash.clone());
    let value = tx.value.as_deref().filter(|v| !v.is_empty() && *v != "0");

    let mut operations: Vec<Operation> = transfers.iter().map(TokenTransfer::operation).collect();

    if let Some(created) = &tx.created_contract {
        operations.push(Operation::new(OperationKind::Deployment {
            contract: created.hash.clone(),
        }));
    }

    // value wrapped by the called token contract shows up as a transfer of
    // the same amount
    let covered = |value: &str| {
        transfers.iter().any(|t| {
            to.as_deref()
                .is_some_and(|to| same_address(&t.token.address, to))
                && t.total.as_ref().and_then(|t| t.value.as_deref()) == Some(value)
        })
    };
    if let Some(value) = value {
        if status == ActivityStatus::Applied && !covered(value) {
            let receiver = to
                .clone()
                .or_else(|| tx.created_contract.as_ref().map(|c| c.hash.clone()));
            if let Some(receiver) = receiver {
                operations.push(Operation::new(OperationKind::Transfer {
                    from: tx.from.hash.clone(),
                    to: receiver,
                    asset: AssetId::Native,
                    amount: value.to_owned(),
                }));
            }
        }
    }

    if let (Some(contract), Some(call)) = (&to, &call) {
        let token = || AssetId::token(contract.to_lowercase(), None);
        match call {
            Call::Approve { spender, amount } => {
                operations.push(Operation::new(OperationKind::Approval {
                    owner: tx.from.hash.clone(),
                    spender: spender.clone(),
                    asset: token(),
                    amount: amount.clone(),
                }));
            }
            // reverted token sends emit no transfer, the calldata still
            // tells what was attempted
            Call::Transfer { to: receiver, amount } if transfers.is_empty() => {
                operations.push(Operation::new(OperationKind::Transfer {
                    from: tx.from.hash.clone(),
                    to: receiver.clone(),
                    asset: token(),
                    amount: amount.clone(),
                }));
            }
            Call::TransferFrom {
                from,
                to: receiver,
                amount,
            } if transfers.is_empty() => {
                operations.push(Operation::new(OperationKind::Transfer {
                    from: from.clone(),
                    to: receiver.clone(),
                    asset: token(),
                    amount: amount.clone(),
                }));
            }
            _ => {}
        }
    }

    if operations.is_empty() {
        if let Some(contract) = &to {
            operations.push(Operation::new(OperationKind::Interaction {
                contract: contract.clone(),
                entrypoint: tx
                    .method
                    .clone()
                    .or_else(|| call.as_ref().and_then(Call::method_name)),
            }));
        }
    }

    let mut activity = Activity {
        hash: tx.hash,
        added_at: tx.timestamp,
        status,
        operations,
        block_height: tx.block_number,
        index: tx.position.unwrap_or_default(),
    };
    activity.sort_operations();
    activity
}

/// Normalizes token transfers whose transaction is not listed among the
/// account's transactions, e.g. incoming airdrops.
///
/// The transfers endpoint does not report the transaction's in-block
/// position, so the first log index stands in for it.
pub(crate) fn normalize_transfers(hash: String, transfers: &[TokenTransfer]) -> Option<Activity> {
    let first = transfers.iter().min_by_key(|t| t.log_index)?;
    let mut activity = Activity {
        hash,
        added_at: first.timestamp,
        status: ActivityStatus::Applied,
        operations: transfers.iter().map(TokenTransfer::operation).collect(),
        block_height: first.block_number,
        index: first.log_index,
    };
    activity.sort_operations();
    Some(activity)
}
