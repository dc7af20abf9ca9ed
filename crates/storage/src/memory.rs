//! In-memory `RequestStore` backend.
//!
//! A `RwLock` over a `BTreeMap` keyed by request id. Suits tests, the demo
//! CLI, and single-process deployments; the ordering of the map gives
//! deterministic listing without an index.

use std::collections::BTreeMap;

use async_trait::async_trait;
use curio_core::{RentalRequest, RequestStatus};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::query::{Page, PageRequest, RequestFilter, RequestSummary, Statistics, TimeRange};
use crate::traits::RequestStore;

/// In-memory backend. Cheap to clone behind an `Arc`; construct one per
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, RentalRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, request: RentalRequest) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        if records.contains_key(&request.id) {
            return Err(StorageError::AlreadyExists {
                id: request.id.clone(),
            });
        }
        records.insert(request.id.clone(), request);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<RentalRequest, StorageError> {
        let records = self.records.read().await;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn update(
        &self,
        request: RentalRequest,
        expected_version: i64,
    ) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        let stored = records
            .get(&request.id)
            .ok_or_else(|| StorageError::NotFound {
                id: request.id.clone(),
            })?;
        if stored.version != expected_version {
            return Err(StorageError::VersionConflict {
                id: request.id.clone(),
                expected: expected_version,
            });
        }
        records.insert(request.id.clone(), request);
        Ok(())
    }

    async fn list(
        &self,
        filter: &RequestFilter,
        page: &PageRequest,
    ) -> Result<Page<RequestSummary>, StorageError> {
        let records = self.records.read().await;
        let mut matching: Vec<&RentalRequest> =
            records.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .map(RequestSummary::from)
            .collect();

        Ok(Page {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }

    async fn list_active_ending_before(
        &self,
        deadline: OffsetDateTime,
    ) -> Result<Vec<RentalRequest>, StorageError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.status == RequestStatus::Active && r.window.end_date < deadline)
            .cloned()
            .collect())
    }

    async fn statistics(&self, range: Option<&TimeRange>) -> Result<Statistics, StorageError> {
        let records = self.records.read().await;
        Ok(Statistics::from_requests(
            records
                .values()
                .filter(|r| range.is_none_or(|range| range.contains(r.created_at))),
        ))
    }
}
