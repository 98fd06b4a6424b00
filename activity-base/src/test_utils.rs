use std::collections::VecDeque;
use std::sync::Arc;

use activity_core::{
    Activity, ActivitySource, ActivityStatus, AssetId, CacheKey, CancellationToken, Cancelled,
    HistoryCursor, Operation, OperationKind, SourceError, SourcePage, SourceResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Block height cursor, genesis is height 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Height(pub u64);

impl HistoryCursor for Height {
    fn genesis() -> Self {
        Height(0)
    }
}

pub fn activity(hash: &str, block_height: u64, operations: Vec<Operation>) -> Activity {
    Activity {
        hash: hash.into(),
        added_at: DateTime::<Utc>::default(),
        status: ActivityStatus::Applied,
        operations,
        block_height,
        index: 0,
    }
}

pub fn native_transfer() -> Operation {
    token_transfer(AssetId::Native)
}

pub fn token_transfer(asset: AssetId) -> Operation {
    Operation::new(OperationKind::Transfer {
        from: "alice".into(),
        to: "bob".into(),
        asset,
        amount: "1".into(),
    })
}

#[derive(Debug)]
pub enum Scripted {
    Page(SourcePage<Height>),
    Fail,
    Hang,
}

/// Source that replays a script, one entry per call
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<Option<Height>>>>,
}

impl ScriptedSource {
    pub fn push(&self, step: Scripted) -> &Self {
        self.script.lock().push_back(step);
        self
    }

    pub fn calls(&self) -> Vec<Option<Height>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ActivitySource for ScriptedSource {
    type Cursor = Height;

    async fn fetch_page(
        &self,
        _key: &CacheKey,
        older_than: Option<&Height>,
        cancel: &CancellationToken,
    ) -> SourceResult<SourcePage<Height>> {
        self.calls.lock().push(older_than.copied());
        let step = self.script.lock().pop_front();
        match step {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Fail) => Err(SourceError::from_other_str("backend unavailable")),
            Some(Scripted::Hang) => {
                cancel.cancelled().await;
                Err(Cancelled.into())
            }
            None => panic!("unexpected source call with cursor {older_than:?}"),
        }
    }
}
