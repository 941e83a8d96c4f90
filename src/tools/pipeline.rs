//! Batch pagination and definition search over procedure candidate lists.
//!
//! Candidates arrive already filtered and ordered by the catalog. They are
//! split into fixed-size batches in order; definitions are fetched one item at
//! a time on the caller's connection. A failed definition lookup aborts the
//! whole call and discards the batches built so far.

use crate::db::CatalogSource;
use crate::error::{DbError, DbResult};
use crate::models::ProcedureDescriptor;
use schemars::JsonSchema;
use serde::Serialize;

pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Reference summaries longer than this are cut and suffixed with `...`.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// A validated, strictly positive batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(usize);

impl BatchSize {
    pub fn new(raw: i64) -> DbResult<Self> {
        if raw <= 0 {
            return Err(DbError::invalid_input(format!(
                "batch_size must be greater than 0, got {}",
                raw
            )));
        }
        let size = usize::try_from(raw)
            .map_err(|_| DbError::invalid_input(format!("batch_size {} is too large", raw)))?;
        Ok(Self(size))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn batch_count(self, total: usize) -> usize {
        total.div_ceil(self.0)
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProcedureBatch {
    /// 1-based
    pub batch_number: usize,
    pub procedures: Vec<ProcedureDescriptor>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProcedureBatchesOutput {
    pub total_procedures: usize,
    pub batch_count: usize,
    pub batch_size: usize,
    pub batches: Vec<ProcedureBatch>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchMatch {
    #[serde(flatten)]
    pub procedure: ProcedureDescriptor,
    /// First definition line containing the search text
    pub reference_summary: String,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchBatch {
    /// 1-based
    pub batch_number: usize,
    /// Matches among this batch's candidates; may be empty
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProcedureSearchOutput {
    pub search_text: String,
    /// Candidates scanned
    pub total_procedures: usize,
    pub total_matches: usize,
    pub batch_count: usize,
    pub batch_size: usize,
    pub batches: Vec<SearchBatch>,
}

/// Partition candidates into batches, fetching definitions when requested.
///
/// An item whose definition lookup returns no row is kept without one.
pub async fn collect_batches<S: CatalogSource>(
    source: &mut S,
    candidates: Vec<ProcedureDescriptor>,
    batch_size: BatchSize,
    include_definitions: bool,
) -> DbResult<ProcedureBatchesOutput> {
    let total_procedures = candidates.len();
    let batch_count = batch_size.batch_count(total_procedures);
    let mut batches = Vec::with_capacity(batch_count);
    let mut items = candidates.into_iter();

    for batch_number in 1..=batch_count {
        let mut procedures = Vec::with_capacity(batch_size.get());
        for procedure in items.by_ref().take(batch_size.get()) {
            let procedure = if include_definitions {
                let definition = source.procedure_definition(&procedure.identity()).await?;
                procedure.with_definition(definition)
            } else {
                procedure
            };
            procedures.push(procedure);
        }
        batches.push(ProcedureBatch {
            batch_number,
            procedures,
        });
    }

    Ok(ProcedureBatchesOutput {
        total_procedures,
        batch_count,
        batch_size: batch_size.get(),
        batches,
    })
}

/// Scan candidate definitions for `search_text`, batch by batch.
///
/// Matching is case-insensitive. Candidates without a definition or whose
/// definition lacks the text are dropped from their batch.
pub async fn search_batches<S: CatalogSource>(
    source: &mut S,
    candidates: Vec<ProcedureDescriptor>,
    batch_size: BatchSize,
    search_text: &str,
    include_definitions: bool,
) -> DbResult<ProcedureSearchOutput> {
    let needle = search_text.to_lowercase();
    let total_procedures = candidates.len();
    let batch_count = batch_size.batch_count(total_procedures);
    let mut batches = Vec::with_capacity(batch_count);
    let mut total_matches = 0;
    let mut items = candidates.into_iter();

    for batch_number in 1..=batch_count {
        let mut matches = Vec::new();
        for procedure in items.by_ref().take(batch_size.get()) {
            let Some(definition) = source.procedure_definition(&procedure.identity()).await?
            else {
                continue;
            };
            if !definition.to_lowercase().contains(&needle) {
                continue;
            }

            let reference_summary = reference_summary(&definition, &needle);
            let procedure = if include_definitions {
                procedure.with_definition(Some(definition))
            } else {
                procedure
            };
            matches.push(SearchMatch {
                procedure,
                reference_summary,
            });
        }
        total_matches += matches.len();
        batches.push(SearchBatch {
            batch_number,
            matches,
        });
    }

    Ok(ProcedureSearchOutput {
        search_text: search_text.to_string(),
        total_procedures,
        total_matches,
        batch_count,
        batch_size: batch_size.get(),
        batches,
    })
}

/// First non-empty line containing `needle` (already lowercased), trimmed and
/// capped at [`SUMMARY_MAX_CHARS`]. Empty when no line matches.
pub fn reference_summary(definition: &str, needle: &str) -> String {
    let Some(line) = definition
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .find(|line| line.to_lowercase().contains(needle))
    else {
        return String::new();
    };

    let line = line.trim();
    if line.chars().count() > SUMMARY_MAX_CHARS {
        let mut summary: String = line.chars().take(SUMMARY_MAX_CHARS).collect();
        summary.push_str("...");
        summary
    } else {
        line.to_string()
    }
}
