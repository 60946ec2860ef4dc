//! Trait and implementations for reading fleet data from storage.

mod supabase;

pub use supabase::SupabaseSource;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::prediction::types::{TireHistory, TireSnapshot, TreadReading};

/// Abstraction over the storage layer that holds tires and inspections.
#[async_trait::async_trait]
pub trait InspectionSource {
    /// Returns every tire of the tenant together with its inspection samples.
    async fn tire_histories(&self, tenant_id: &str) -> Result<Vec<TireHistory>>;

    /// Returns the current state of the tenant's mounted tires.
    async fn tire_snapshots(&self, tenant_id: &str) -> Result<Vec<TireSnapshot>>;

    /// Returns tread readings of the tenant's inspections taken at or after `since`.
    async fn tread_readings(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TreadReading>>;
}
