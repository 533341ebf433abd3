//! One search, start to finish: fetch → infer → detect → resolve.
//!
//! Nothing here outlives a search. Labels and the detected identifier
//! column are recomputed from the freshly fetched table every time.

use futures::future::{abortable, AbortHandle, Abortable, Aborted};
use serde::Serialize;
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::fetch::TableSource;
use crate::render::Slip;
use crate::resolve::{resolve, ResolvedRecord};
use crate::schema::{detect_id_column, infer, ColumnLabels, HeaderDecision, RawRow, RawTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub sheet_id: String,
    /// Sheet (tab) name; doubles as the month label on the slip.
    pub sheet_name: String,
    pub employee_id: String,
}

/// What schema inference made of a sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub decision: HeaderDecision,
    pub labels: ColumnLabels,
    pub id_column: usize,
    pub data_rows: usize,
}

impl SchemaReport {
    pub fn id_column_label(&self) -> String {
        self.labels.get(self.id_column)
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub record: ResolvedRecord,
    pub month: String,
    pub schema: SchemaReport,
}

impl SearchOutcome {
    pub fn into_slip(self) -> Slip {
        Slip::new(self.record, self.month)
    }
}

/// A single search, threaded explicitly through each stage.
#[derive(Debug)]
pub struct SearchSession<'a> {
    request: SearchRequest,
    config: &'a Config,
}

impl<'a> SearchSession<'a> {
    pub fn new(request: SearchRequest, config: &'a Config) -> Self {
        Self { request, config }
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }

    #[instrument(level = "info", skip_all, fields(sheet = %self.request.sheet_name, employee = %self.request.employee_id))]
    pub async fn run<S: TableSource>(&self, source: &S) -> Result<SearchOutcome> {
        let table = source
            .fetch_table(&self.request.sheet_id, &self.request.sheet_name)
            .await?;
        self.process(table)
    }

    /// Fetch and infer only; no identifier needed.
    #[instrument(level = "info", skip_all, fields(sheet = %self.request.sheet_name))]
    pub async fn inspect<S: TableSource>(&self, source: &S) -> Result<SchemaReport> {
        let table = source
            .fetch_table(&self.request.sheet_id, &self.request.sheet_name)
            .await?;
        let (report, _) = self.infer_schema(table)?;
        Ok(report)
    }

    /// The synchronous part of the pipeline, over an already fetched table.
    pub fn process(&self, table: RawTable) -> Result<SearchOutcome> {
        let (schema, rows) = self.infer_schema(table)?;

        let record = resolve(
            &self.request.employee_id,
            &rows,
            &schema.labels,
            schema.id_column,
            &self.config.resolve,
            &self.config.record,
        )?;

        if record.used_fallback() {
            warn!(
                matched = %record.identifier_label(),
                detected = %schema.id_column_label(),
                "record found by full-sheet scan"
            );
        }
        info!(column = %record.identifier_label(), "employee found");

        Ok(SearchOutcome {
            record,
            month: self.request.sheet_name.trim().to_string(),
            schema,
        })
    }

    fn infer_schema(&self, table: RawTable) -> Result<(SchemaReport, Vec<RawRow>)> {
        let inferred = infer(table, &self.config.heuristics);
        if inferred.data_rows.iter().all(|r| r.is_blank()) {
            return Err(SearchError::EmptyData(self.request.sheet_name.clone()));
        }

        let id_column = detect_id_column(&inferred.labels, &self.config.heuristics.id_keywords);
        debug!(
            decision = ?inferred.decision,
            id_column,
            rows = inferred.data_rows.len(),
            "schema inferred"
        );

        let report = SchemaReport {
            decision: inferred.decision,
            labels: inferred.labels,
            id_column,
            data_rows: inferred.data_rows.len(),
        };
        Ok((report, inferred.data_rows))
    }
}

/// Holds at most one in-flight search. Starting a new one cancels the
/// previous one, which then resolves to `SearchError::Superseded`.
#[derive(Debug, Default)]
pub struct SearchSlot {
    current: Mutex<Option<(u64, AbortHandle)>>,
    next_id: AtomicU64,
}

/// A search registered with a [`SearchSlot`] but not yet awaited.
#[must_use = "a registered search only runs once passed to `SearchSlot::finish`"]
pub struct Ticket<F> {
    id: u64,
    search: Abortable<F>,
}

impl SearchSlot {
    /// Register `search` as the newest one and cancel whatever was in
    /// flight. Registration order, not polling order, decides which
    /// search survives.
    pub fn begin<F: Future>(&self, search: F) -> Ticket<F> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (search, handle) = abortable(search);

        if let Some((prev, old)) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((id, handle))
        {
            debug!(superseded = prev, by = id, "cancelling in-flight search");
            old.abort();
        }
        Ticket { id, search }
    }

    /// Drive a registered search and free the slot if it is still ours.
    pub async fn finish<F, T>(&self, ticket: Ticket<F>) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Ticket { id, search } = ticket;
        let out = search.await;

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*current, Some((cur, _)) if cur == id) {
            *current = None;
        }
        drop(current);

        match out {
            Ok(res) => res,
            Err(Aborted) => Err(SearchError::Superseded),
        }
    }

    pub async fn run<F, T>(&self, search: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.finish(self.begin(search)).await
    }

    pub fn is_busy(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
