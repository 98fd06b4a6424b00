use std::{path::Path, sync::Arc};

use eyre::WrapErr;
use rocksdb::{Options, DB as Rocks};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

pub use intervals::*;
pub use memory::*;
pub use rocks_store::*;

mod intervals;
mod memory;
mod rocks_store;

/// A KV Store
#[derive(Debug, Clone)]
pub struct DB(Arc<Rocks>);

impl From<Rocks> for DB {
    fn from(rocks: Rocks) -> Self {
        Self(Arc::new(rocks))
    }
}

/// DB Error type
#[derive(thiserror::Error, Debug)]
pub enum DbError {
    /// Rocks DB Error
    #[error("{0}")]
    RockError(#[from] rocksdb::Error),
    /// Stored value could not be (de)serialized
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

/// Rocks DB result type
pub type DbResult<T> = std::result::Result<T, DbError>;

impl DB {
    /// Opens db at `db_path` and creates if missing
    #[tracing::instrument(err)]
    pub fn from_path(db_path: &Path) -> eyre::Result<DB> {
        match db_path.is_dir() {
            true => info!(path = ?db_path, "Opening existing db"),
            false => info!(path = ?db_path, "Creating db"),
        }

        let mut opts = Options::default();
        opts.create_if_missing(true);

        Rocks::open(&opts, db_path)
            .wrap_err(format!("Failed to open db path {db_path:?}"))
            .map(Into::into)
    }

    fn prefixed(prefix: impl AsRef<[u8]>, key: impl AsRef<[u8]>) -> Vec<u8> {
        let mut buf = vec![];
        buf.extend(prefix.as_ref());
        buf.extend(key.as_ref());
        buf
    }

    /// Serialize as JSON and store under the prefixed key
    pub fn store_value<V: Serialize + ?Sized>(
        &self,
        prefix: impl AsRef<[u8]>,
        key: impl AsRef<[u8]>,
        value: &V,
    ) -> DbResult<()> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.0.put(Self::prefixed(prefix, key), bytes)?)
    }

    /// Retrieve and attempt to deserialize the value under the prefixed key
    pub fn retrieve_value<V: DeserializeOwned>(
        &self,
        prefix: impl AsRef<[u8]>,
        key: impl AsRef<[u8]>,
    ) -> DbResult<Option<V>> {
        self.0
            .get(Self::prefixed(prefix, key))?
            .map(|bytes| serde_json::from_slice(&bytes))
            .transpose()
            .map_err(Into::into)
    }
}
