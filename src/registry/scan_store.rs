// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{LifecycleError, StoreError};
use crate::types::{Scan, ScanId};

/// State change applied to a scan inside the store. Either the whole mutation
/// commits or nothing does.
pub type ScanMutation = Box<dyn FnOnce(&mut Scan) -> Result<(), LifecycleError> + Send>;

/// Write capability for one scan, handed out once at insertion.
///
/// Not `Clone`: whoever holds the lease is the only writer of that scan.
#[derive(Debug, PartialEq, Eq)]
pub struct WriterLease {
    scan_id: ScanId,
    token: Uuid,
}

impl WriterLease {
    pub fn scan_id(&self) -> &ScanId {
        &self.scan_id
    }
}

/// Key -> Scan store with get / insert / update-if-owner semantics.
///
/// Readers always observe a complete snapshot: a mutation is applied to a
/// private copy and becomes visible only if it succeeds.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert(&self, scan: Scan) -> Result<WriterLease, StoreError>;

    async fn get(&self, id: &ScanId) -> Result<Option<Scan>, StoreError>;

    /// Apply `mutation` if `lease` owns the scan, returning the new snapshot
    async fn update(
        &self,
        lease: &WriterLease,
        mutation: ScanMutation,
    ) -> Result<Scan, StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}

struct Entry {
    scan: Scan,
    owner: Uuid,
}

#[derive(Clone, Default)]
pub struct InMemoryScanStore {
    entries: Arc<RwLock<HashMap<ScanId, Entry>>>,
}

impl InMemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn insert(&self, scan: Scan) -> Result<WriterLease, StoreError> {
        let mut entries = self.entries.write();
        if entries.contains_key(&scan.id) {
            return Err(StoreError::Duplicate(scan.id));
        }

        let lease = WriterLease {
            scan_id: scan.id.clone(),
            token: Uuid::new_v4(),
        };
        debug!(scan_id = %scan.id, "Scan inserted");
        entries.insert(
            scan.id.clone(),
            Entry {
                scan,
                owner: lease.token,
            },
        );

        Ok(lease)
    }

    async fn get(&self, id: &ScanId) -> Result<Option<Scan>, StoreError> {
        Ok(self.entries.read().get(id).map(|entry| entry.scan.clone()))
    }

    async fn update(
        &self,
        lease: &WriterLease,
        mutation: ScanMutation,
    ) -> Result<Scan, StoreError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&lease.scan_id)
            .ok_or_else(|| StoreError::Missing(lease.scan_id.clone()))?;

        if entry.owner != lease.token {
            return Err(StoreError::NotOwner(lease.scan_id.clone()));
        }

        let mut next = entry.scan.clone();
        mutation(&mut next)?;
        entry.scan = next.clone();

        Ok(next)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().len())
    }
}
