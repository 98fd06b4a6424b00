use activity_core::{Activity, ActivityStatus, AssetId, Operation, OperationKind};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct Alias {
    address: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Parameter {
    entrypoint: String,
    value: Value,
}

/// One operation of an operation group as the indexer reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupOperation {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    level: u64,
    timestamp: DateTime<Utc>,
    hash: String,
    status: Option<String>,
    sender: Option<Alias>,
    target: Option<Alias>,
    #[serde(default)]
    amount: u64,
    parameter: Option<Parameter>,
    new_delegate: Option<Alias>,
    originated_contract: Option<Alias>,
}

#[derive(Debug, Deserialize)]
struct Fa12Transfer {
    from: String,
    to: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct Fa2Transfer {
    from_: String,
    txs: Vec<Fa2Tx>,
}

#[derive(Debug, Deserialize)]
struct Fa2Tx {
    to_: String,
    token_id: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct Fa12Approve {
    spender: String,
    value: String,
}

fn address(alias: &Option<Alias>) -> Option<&str> {
    alias.as_ref().map(|a| a.address.as_str())
}

impl GroupOperation {
    fn sent_by(&self, account: &str) -> bool {
        address(&self.sender) == Some(account)
    }

    fn status(&self) -> ActivityStatus {
        match self.status.as_deref() {
            Some("applied") => ActivityStatus::Applied,
            Some("failed") => ActivityStatus::Failed,
            _ => ActivityStatus::Other,
        }
    }

    /// Token transfers of a `transfer` call touching `account`. `None` when
    /// the parameter matches neither token standard.
    fn token_transfers(&self, contract: &str, value: &Value, account: &str) -> Option<Vec<OperationKind>> {
        if let Ok(fa12) = serde_json::from_value::<Fa12Transfer>(value.clone()) {
            let involved = fa12.from == account || fa12.to == account;
            return Some(
                involved
                    .then(|| OperationKind::Transfer {
                        from: fa12.from,
                        to: fa12.to,
                        asset: AssetId::token(contract, None),
                        amount: fa12.value,
                    })
                    .into_iter()
                    .collect(),
            );
        }
        let batches = serde_json::from_value::<Vec<Fa2Transfer>>(value.clone()).ok()?;
        Some(
            batches
                .into_iter()
                .flat_map(|batch| {
                    let from = batch.from_;
                    batch.txs.into_iter().filter_map(move |tx| {
                        (from == account || tx.to_ == account).then(|| OperationKind::Transfer {
                            from: from.clone(),
                            to: tx.to_,
                            asset: AssetId::token(contract, Some(tx.token_id)),
                            amount: tx.amount,
                        })
                    })
                })
                .collect(),
        )
    }

    fn operations(&self, account: &str) -> Vec<OperationKind> {
        let mut kinds = vec![];
        match self.kind.as_str() {
            "transaction" => {
                let target = address(&self.target).unwrap_or_default();
                if self.amount > 0 && (self.sent_by(account) || target == account) {
                    kinds.push(OperationKind::Transfer {
                        from: address(&self.sender).unwrap_or_default().to_owned(),
                        to: target.to_owned(),
                        asset: AssetId::Native,
                        amount: self.amount.to_string(),
                    });
                }
                let Some(parameter) = &self.parameter else {
                    return kinds;
                };
                match parameter.entrypoint.as_str() {
                    "transfer" => match self.token_transfers(target, &parameter.value, account) {
                        Some(transfers) => kinds.extend(transfers),
                        None => debug!(
                            hash = %self.hash,
                            id = self.id,
                            "Skipping transfer with unparsable parameters"
                        ),
                    },
                    "approve" if self.sent_by(account) => {
                        match serde_json::from_value::<Fa12Approve>(parameter.value.clone()) {
                            Ok(approve) => kinds.push(OperationKind::Approval {
                                owner: account.to_owned(),
                                spender: approve.spender,
                                asset: AssetId::token(target, None),
                                amount: approve.value,
                            }),
                            Err(err) => debug!(
                                hash = %self.hash,
                                id = self.id,
                                error = %err,
                                "Skipping approval with unparsable parameters"
                            ),
                        }
                    }
                    entrypoint if self.sent_by(account) => kinds.push(OperationKind::Interaction {
                        contract: target.to_owned(),
                        entrypoint: Some(entrypoint.to_owned()),
                    }),
                    _ => {}
                }
            }
            "delegation" if self.sent_by(account) => kinds.push(OperationKind::Delegation {
                delegate: address(&self.new_delegate).map(str::to_owned),
            }),
            "origination" if self.sent_by(account) => {
                if let Some(contract) = address(&self.originated_contract) {
                    kinds.push(OperationKind::Deployment {
                        contract: contract.to_owned(),
                    });
                }
            }
            _ => {}
        }
        kinds
    }
}

/// Turns the operations of one group into the account's activity.
///
/// Operations that do not parse are skipped; `None` when nothing in the
/// group concerns `account`. The activity's index is the group's lowest
/// operation id.
pub(crate) fn normalize_group(hash: &str, group: Vec<Value>, account: &str) -> Option<Activity> {
    let mut parsed: Vec<GroupOperation> = group
        .into_iter()
        .filter_map(|raw| match serde_json::from_value(raw) {
            Ok(op) => Some(op),
            Err(err) => {
                debug!(%hash, error = %err, "Skipping unparsable operation");
                None
            }
        })
        .collect();
    parsed.sort_by_key(|op| op.id);

    let first = parsed.first()?;
    let mut activity = Activity {
        hash: first.hash.clone(),
        added_at: first.timestamp,
        status: first.status(),
        operations: vec![],
        block_height: first.level,
        index: first.id,
    };
    for op in &parsed {
        activity.operations.extend(
            op.operations(account)
                .into_iter()
                .map(|kind| Operation::new(kind).with_log_index(op.id)),
        );
    }
    if activity.operations.is_empty() {
        debug!(%hash, "No operation of the group concerns the account");
        return None;
    }
    activity.sort_operations();
    Some(activity)
}
