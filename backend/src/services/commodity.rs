//! Commodity extraction and resolution against the PSD data source
//!
//! The resolver walks a fixed query plan (Brazil for every code and the last
//! three market years, then World for the primary code) and accepts the first
//! non-empty answer. When the plan is exhausted the source is probed once so
//! the user-facing diagnostic can say why.

use chrono::{Datelike, Local, NaiveDate};
use shared::{
    fold_accents, is_non_empty_response, CommodityQueryPlan, CommodityReference,
    CommoditySummary, NormalizationKind, QueryAttempt, COMMODITIES, SOJA,
};
use serde_json::Value;
use std::sync::Arc;

use super::formatting;
use super::normalizer::TextNormalizer;
use crate::error::AppError;
use crate::external::CommodityDataSource;

/// Minimum token length considered for normalization
const MIN_TOKEN_CHARS: usize = 3;

/// Result of one query attempt
#[derive(Debug)]
pub enum FetchOutcome {
    Data(Value),
    Empty,
    Failed(AppError),
}

/// Availability of the data source after a plan came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Source answers; the data just isn't there
    Reachable,
    EndpointNotFound,
    Unauthorized,
    Failing,
}

impl SourceStatus {
    fn from_error(err: &AppError) -> Self {
        match err {
            AppError::UpstreamNotFound(_) => SourceStatus::EndpointNotFound,
            AppError::UpstreamUnauthorized(_) => SourceStatus::Unauthorized,
            _ => SourceStatus::Failing,
        }
    }
}

/// What the resolver hands back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum CommodityReply {
    Found(String),
    /// No data anywhere in the plan; the diagnostic is for logs and callers
    /// that want to show it
    Unavailable { diagnostic: String },
}

/// Direct dictionary match on folded text, without normalization
pub fn match_commodity(folded: &str) -> Option<CommodityReference> {
    if folded.contains("soja") || folded.contains("sojx") {
        return Some(SOJA);
    }
    COMMODITIES
        .iter()
        .find(|c| folded.contains(c.canonical_name))
        .copied()
}

#[derive(Clone)]
pub struct CommodityService {
    source: Arc<dyn CommodityDataSource>,
    normalizer: TextNormalizer,
}

impl CommodityService {
    pub fn new(source: Arc<dyn CommodityDataSource>, normalizer: TextNormalizer) -> Self {
        Self { source, normalizer }
    }

    /// Find the commodity a message is about
    ///
    /// Tries a direct dictionary match first, then normalizes each token of
    /// three or more characters and matches by containment either way.
    pub async fn extract_commodity(&self, text: &str) -> Option<CommodityReference> {
        let folded = fold_accents(text);
        if let Some(found) = match_commodity(&folded) {
            return Some(found);
        }

        for token in folded
            .split_whitespace()
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        {
            let normalized = fold_accents(
                &self
                    .normalizer
                    .normalize(token, NormalizationKind::Commodity)
                    .await,
            );
            if normalized.is_empty() {
                continue;
            }

            let hit = COMMODITIES.iter().find(|c| {
                normalized.contains(c.canonical_name) || c.canonical_name.contains(&normalized)
            });
            if let Some(reference) = hit {
                tracing::debug!("Token {:?} normalized to commodity {}", token, reference.canonical_name);
                return Some(*reference);
            }
        }

        None
    }

    /// Extract and resolve in one step; `None` when no commodity is named
    pub async fn answer(&self, text: &str) -> Option<CommodityReply> {
        let reference = self.extract_commodity(text).await?;
        Some(self.resolve(&reference).await)
    }

    /// Resolve against the current calendar year
    pub async fn resolve(&self, reference: &CommodityReference) -> CommodityReply {
        let today = Local::now().date_naive();
        self.resolve_for_year(reference, today.year(), today).await
    }

    /// Walk the query plan starting at `year`
    pub async fn resolve_for_year(
        &self,
        reference: &CommodityReference,
        year: i32,
        today: NaiveDate,
    ) -> CommodityReply {
        let plan = CommodityQueryPlan::new(reference, year);

        let attempts = plan
            .brazil_attempts()
            .into_iter()
            .chain(plan.world_attempts());

        for attempt in attempts {
            match self.fetch(&attempt).await {
                FetchOutcome::Data(body) => {
                    tracing::info!(
                        "Commodity data for {} from {} code {} year {}",
                        reference.canonical_name,
                        attempt.region,
                        attempt.code,
                        attempt.year
                    );
                    let summary =
                        CommoditySummary::from_response(reference.display_name, &body, attempt.year);
                    return CommodityReply::Found(formatting::commodity_summary(&summary, today));
                }
                FetchOutcome::Empty => {}
                FetchOutcome::Failed(e) => {
                    tracing::debug!(
                        "Attempt {} {} {} failed: {}",
                        attempt.code,
                        attempt.region,
                        attempt.year,
                        e
                    );
                }
            }
        }

        let status = self.probe_source().await;
        tracing::warn!(
            "No commodity data for {} after exhausting the query plan (source: {:?})",
            reference.canonical_name,
            status
        );
        CommodityReply::Unavailable {
            diagnostic: formatting::commodity_unavailable(reference.canonical_name, status),
        }
    }

    async fn fetch(&self, attempt: &QueryAttempt) -> FetchOutcome {
        match self
            .source
            .commodity_data(&attempt.code, &attempt.region, attempt.year)
            .await
        {
            Ok(body) if is_non_empty_response(&body) => FetchOutcome::Data(body),
            Ok(_) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// Classify why nothing was found by listing commodities once
    pub async fn probe_source(&self) -> SourceStatus {
        match self.source.list_commodities().await {
            Ok(_) => SourceStatus::Reachable,
            Err(e) => SourceStatus::from_error(&e),
        }
    }
}
