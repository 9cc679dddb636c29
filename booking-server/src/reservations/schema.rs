//! Store schema capability probe
//!
//! 启动时读取表头并缓存；`refresh` 重新探测并报告变化。

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use shared::columns;

use crate::store::{ReservationStore, StoreResult};

/// Optional column support of the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchemaCapabilities {
    /// Both `PhoneNumber` and `Email` columns present
    pub phone_email: bool,
    /// `Arrived` column present
    pub arrival: bool,
}

impl SchemaCapabilities {
    pub fn from_headers(headers: &[String]) -> Self {
        let has = |name: &str| headers.iter().any(|h| h.trim() == name);
        Self {
            phone_email: has(columns::PHONE_NUMBER) && has(columns::EMAIL),
            arrival: has(columns::ARRIVED),
        }
    }
}

/// Result of a re-probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaChange {
    pub previous: SchemaCapabilities,
    pub current: SchemaCapabilities,
}

impl SchemaChange {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug)]
pub struct SchemaRegistry {
    store: Arc<dyn ReservationStore>,
    current: RwLock<SchemaCapabilities>,
}

impl SchemaRegistry {
    /// Probe once; a store that cannot be read here is a startup failure.
    pub async fn probe(store: Arc<dyn ReservationStore>) -> StoreResult<Self> {
        let caps = SchemaCapabilities::from_headers(&store.headers().await?);
        tracing::info!(
            phone_email = caps.phone_email,
            arrival = caps.arrival,
            "Store schema probed"
        );
        Ok(Self {
            store,
            current: RwLock::new(caps),
        })
    }

    pub fn current(&self) -> SchemaCapabilities {
        *self.current.read()
    }

    pub async fn refresh(&self) -> StoreResult<SchemaChange> {
        let caps = SchemaCapabilities::from_headers(&self.store.headers().await?);
        let previous = std::mem::replace(&mut *self.current.write(), caps);
        let change = SchemaChange {
            previous,
            current: caps,
        };
        if change.changed() {
            tracing::info!(?previous, current = ?caps, "Store schema changed");
        }
        Ok(change)
    }
}
