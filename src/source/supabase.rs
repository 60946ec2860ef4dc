use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::fetch::auth::SupabaseKey;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::ingest::{InspectionRow, deserialize_timestamp, join_histories};
use crate::prediction::types::{TireHistory, TireRecord, TireSnapshot, TreadReading};
use crate::source::InspectionSource;

const TIRE_COLUMNS: &str =
    "id,numero_serie,marca,modelo,sulco_inicial,sulco_atual,km_rodados,valor_compra";
const DETAIL_COLUMNS: &str =
    "tire_id,tread_depth,inspections!inner(created_at,odometer_km,tenant_id)";

/// Rows requested per PostgREST call. Must not exceed the project's
/// `max-rows` setting (1000 on Supabase by default), or a capped page would be
/// taken for the last one.
const PAGE_SIZE: usize = 1000;

/// `tire_inventory` row. Column names are the ones used by the fleet backend.
#[derive(Debug, Deserialize)]
struct TireInventoryRow {
    id: String,
    #[serde(rename = "numero_serie")]
    serial_number: Option<String>,
    #[serde(rename = "marca")]
    brand: Option<String>,
    #[serde(rename = "modelo")]
    model: Option<String>,
    #[serde(rename = "sulco_inicial")]
    initial_tread_mm: Option<f64>,
    #[serde(rename = "sulco_atual")]
    current_tread_mm: Option<f64>,
    #[serde(rename = "km_rodados")]
    km_run: Option<f64>,
    #[serde(rename = "valor_compra")]
    cost: Option<f64>,
}

impl TireInventoryRow {
    fn into_record(self) -> TireRecord {
        TireRecord {
            tire_id: self.id,
            serial_number: self.serial_number.unwrap_or_default(),
            brand: self.brand.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            initial_tread_mm: self.initial_tread_mm,
            initial_odometer_km: None,
            cost: self.cost,
            avg_monthly_km: None,
        }
    }

    fn into_snapshot(self) -> TireSnapshot {
        TireSnapshot {
            tire_id: self.id,
            serial_number: self.serial_number.unwrap_or_default(),
            brand: self.brand.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            initial_tread_mm: self.initial_tread_mm.unwrap_or(0.0),
            current_tread_mm: self.current_tread_mm.unwrap_or(0.0),
            km_run: self.km_run.unwrap_or(0.0),
        }
    }
}

/// `inspection_details` row embedded with its parent inspection.
#[derive(Debug, Deserialize)]
struct InspectionDetailRow {
    tire_id: String,
    tread_depth: Option<f64>,
    inspections: InspectionHeader,
}

#[derive(Debug, Deserialize)]
struct InspectionHeader {
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    odometer_km: f64,
}

impl InspectionDetailRow {
    fn into_row(self) -> Option<InspectionRow> {
        Some(InspectionRow {
            tire_id: self.tire_id,
            date: self.inspections.created_at,
            odometer_km: self.inspections.odometer_km,
            tread_mm: self.tread_depth?,
        })
    }

    fn into_reading(self) -> TreadReading {
        TreadReading {
            timestamp: self.inspections.created_at,
            avg_tread_mm: self.tread_depth,
        }
    }
}

/// Reads tires and inspections from a Supabase project through PostgREST.
pub struct SupabaseSource<C: HttpClient = SupabaseKey<BasicClient>> {
    rest_url: Url,
    client: C,
    page_size: usize,
}

impl SupabaseSource {
    /// Connects to the project at `base_url` (e.g. `https://xyz.supabase.co`)
    /// using the service key.
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        let client = SupabaseKey::new(BasicClient::new()?, service_key)?;
        Self::with_client(base_url, client)
    }

    /// Builds a source from `SUPABASE_URL` and `SUPABASE_SERVICE_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?;
        let key =
            std::env::var("SUPABASE_SERVICE_KEY").context("SUPABASE_SERVICE_KEY must be set")?;
        Self::new(&url, &key)
    }
}

impl<C: HttpClient> SupabaseSource<C> {
    pub fn with_client(base_url: &str, client: C) -> Result<Self> {
        let rest_url = Url::parse(&format!("{}/rest/v1/", base_url.trim_end_matches('/')))
            .with_context(|| format!("invalid Supabase URL '{base_url}'"))?;
        Ok(Self {
            rest_url,
            client,
            page_size: PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.rest_url.join(table)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    /// Reads every row matching `params`, one `limit`/`offset` page at a time
    /// until a short page comes back. `params` must carry an `order` that is a
    /// total order, or rows can shift between pages.
    async fn fetch_all<T: DeserializeOwned + Send>(
        &self,
        table: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let limit = self.page_size.to_string();
        let mut rows: Vec<T> = Vec::new();
        let mut pages = 0;

        loop {
            let offset = rows.len().to_string();
            let mut url = self.table_url(table, params)?;
            url.query_pairs_mut()
                .append_pair("limit", &limit)
                .append_pair("offset", &offset);

            let page: Vec<T> = fetch_json(&self.client, url.as_str())
                .await
                .with_context(|| format!("failed to read {table} at offset {offset}"))?;
            pages += 1;

            let last = page.len() < self.page_size;
            rows.extend(page);
            if last {
                break;
            }
        }

        debug!(table, pages, rows = rows.len(), "Table read");
        Ok(rows)
    }

    async fn tires(&self, tenant_id: &str) -> Result<Vec<TireRecord>> {
        let tenant = format!("eq.{tenant_id}");
        let rows: Vec<TireInventoryRow> = self
            .fetch_all(
                "tire_inventory",
                &[("select", TIRE_COLUMNS), ("tenant_id", tenant.as_str()), ("order", "id")],
            )
            .await?;
        Ok(rows.into_iter().map(TireInventoryRow::into_record).collect())
    }

    /// Inspection details of the tenant, oldest first. Rows created in the
    /// same instant keep their insertion order through the `id` tie-break.
    async fn inspection_details(
        &self,
        tenant_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<InspectionDetailRow>> {
        let tenant = format!("eq.{tenant_id}");
        let mut params = vec![
            ("select", DETAIL_COLUMNS.to_string()),
            ("inspections.tenant_id", tenant),
            ("order", "created_at.asc,id.asc".to_string()),
        ];
        if let Some(since) = since {
            params.push((
                "inspections.created_at",
                format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ));
        }
        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        self.fetch_all("inspection_details", &params).await
    }
}

#[async_trait]
impl<C: HttpClient> InspectionSource for SupabaseSource<C> {
    #[tracing::instrument(skip(self))]
    async fn tire_histories(&self, tenant_id: &str) -> Result<Vec<TireHistory>> {
        let tires = self.tires(tenant_id).await?;
        let details = self.inspection_details(tenant_id, None).await?;

        let total = details.len();
        let rows: Vec<InspectionRow> = details
            .into_iter()
            .filter_map(InspectionDetailRow::into_row)
            .collect();
        debug!(total, kept = rows.len(), "Details with a tread depth kept");

        info!(tires = tires.len(), inspections = rows.len(), "Fleet data loaded");
        Ok(join_histories(tires, &rows))
    }

    #[tracing::instrument(skip(self))]
    async fn tire_snapshots(&self, tenant_id: &str) -> Result<Vec<TireSnapshot>> {
        let tenant = format!("eq.{tenant_id}");
        let rows: Vec<TireInventoryRow> = self
            .fetch_all(
                "tire_inventory",
                &[
                    ("select", TIRE_COLUMNS),
                    ("tenant_id", tenant.as_str()),
                    ("status", "eq.em_uso"),
                    ("sulco_inicial", "gt.0"),
                    ("order", "sulco_atual.asc,id.asc"),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TireInventoryRow::into_snapshot).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn tread_readings(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TreadReading>> {
        let details = self.inspection_details(tenant_id, Some(since)).await?;
        Ok(details
            .into_iter()
            .map(InspectionDetailRow::into_reading)
            .collect())
    }
}
