//! Analysis pipeline orchestrator.
//!
//! Coordinates one analysis run:
//! 1. Resolve the player's identity
//! 2. List recent match ids (over-fetching to absorb filtered matches)
//! 3. Fetch and summarize match details until enough valid matches are found
//! 4. Aggregate the collected matches

mod progress;

#[cfg(test)]
mod mock;

pub use progress::{PipelineEvent, PipelineStage};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::calculate::aggregate;
use crate::fetch::{summarize_match, ApiKey, FetchError, MatchApi, MAX_MATCH_IDS_PER_REQUEST};
use crate::models::{AnalysisResult, MatchSummary, Region, RegionRoute};
use progress::{detail_progress, ProgressReporter};

/// Largest number of matches a single run may analyze.
pub const MAX_MATCH_COUNT: u32 = 50;

/// Errors that end (or, for per-match failures, are absorbed by) a run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    Configuration(String),

    #[error("Could not resolve player {game_name}#{tag_line}. Check the Riot ID and API key.")]
    IdentityNotFound { game_name: String, tag_line: String },

    #[error("No matches found for this player")]
    NoMatchHistory,

    #[error("Match {match_id} unavailable: {reason}")]
    UpstreamUnavailable { match_id: String, reason: String },

    #[error("None of the listed matches could be analyzed")]
    NoValidMatches,

    #[error("Network failure: {0}")]
    TransientNetwork(String),

    #[error("An error occurred: {0}")]
    Pipeline(String),

    #[error("An analysis is already running")]
    AlreadyRunning,
}

/// Coarse classification of [`AnalysisError`] for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationError,
    IdentityNotFound,
    NoMatchHistory,
    UpstreamUnavailable,
    NoValidMatches,
    TransientNetworkFailure,
    PipelineFailure,
    AlreadyRunning,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Configuration(_) => ErrorKind::ConfigurationError,
            AnalysisError::IdentityNotFound { .. } => ErrorKind::IdentityNotFound,
            AnalysisError::NoMatchHistory => ErrorKind::NoMatchHistory,
            AnalysisError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            AnalysisError::NoValidMatches => ErrorKind::NoValidMatches,
            AnalysisError::TransientNetwork(_) => ErrorKind::TransientNetworkFailure,
            AnalysisError::Pipeline(_) => ErrorKind::PipelineFailure,
            AnalysisError::AlreadyRunning => ErrorKind::AlreadyRunning,
        }
    }

    /// Map failures shared by every upstream call; `None` for plain non-success statuses.
    fn from_transport(err: &FetchError) -> Option<Self> {
        match err {
            FetchError::InvalidUrl(msg) => Some(AnalysisError::Configuration(msg.clone())),
            FetchError::Json(e) => Some(AnalysisError::Pipeline(e.to_string())),
            FetchError::HttpStatus { .. } => None,
            e if e.is_transient() => Some(AnalysisError::TransientNetwork(e.to_string())),
            e => Some(AnalysisError::Pipeline(e.to_string())),
        }
    }

    fn identity(err: FetchError, request: &AnalysisRequest) -> Self {
        Self::from_transport(&err).unwrap_or_else(|| AnalysisError::IdentityNotFound {
            game_name: request.game_name.clone(),
            tag_line: request.tag_line.clone(),
        })
    }

    fn listing(err: FetchError) -> Self {
        Self::from_transport(&err).unwrap_or(AnalysisError::NoMatchHistory)
    }

    fn detail(err: FetchError, match_id: &str) -> Self {
        if err.is_transient() {
            AnalysisError::TransientNetwork(format!("{}: {}", match_id, err))
        } else {
            AnalysisError::UpstreamUnavailable {
                match_id: match_id.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Inputs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub api_key: ApiKey,
    pub game_name: String,
    pub tag_line: String,
    pub region: Region,
    /// Number of valid matches wanted
    pub match_count: u32,
}

impl AnalysisRequest {
    /// Build a request from raw text inputs, resolving the region code.
    pub fn new(
        api_key: &str,
        game_name: &str,
        tag_line: &str,
        region_code: &str,
        match_count: u32,
    ) -> Result<Self, AnalysisError> {
        let region = region_code
            .parse::<Region>()
            .map_err(|e| AnalysisError::Configuration(e.to_string()))?;

        let request = Self {
            api_key: ApiKey::new(api_key),
            game_name: game_name.trim().to_string(),
            tag_line: tag_line.trim().trim_start_matches('#').to_string(),
            region,
            match_count,
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject requests the upstream could never satisfy.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.api_key.is_empty() || self.game_name.is_empty() || self.tag_line.is_empty() {
            return Err(AnalysisError::Configuration(
                "API key, name and tag are all required".to_string(),
            ));
        }

        if self.match_count == 0 || self.match_count > MAX_MATCH_COUNT {
            return Err(AnalysisError::Configuration(format!(
                "Match count must be between 1 and {}",
                MAX_MATCH_COUNT
            )));
        }

        Ok(())
    }

    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// Tuning for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Match ids listed per wanted match
    pub over_fetch_factor: u32,

    /// Upper bound on in-flight detail requests
    pub max_concurrent_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            over_fetch_factor: 2,
            max_concurrent_requests: 1,
        }
    }
}

impl PipelineConfig {
    /// Number of ids to list for `desired` valid matches.
    pub fn listing_count(&self, desired: u32) -> u32 {
        desired
            .saturating_mul(self.over_fetch_factor.max(1))
            .min(MAX_MATCH_IDS_PER_REQUEST)
    }
}

/// State of the pipeline, readable while a run is in flight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    pub status: PipelineStage,
    pub run_id: Option<Uuid>,
    pub last_run_started: Option<DateTime<Utc>>,
    pub last_run_completed: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Valid matches collected so far in the current/last run
    pub matches_collected: u32,
    /// Listed matches skipped (filtered out or failed) in the current/last run
    pub matches_skipped: u32,
}

/// Analysis pipeline orchestrator.
pub struct AnalysisPipeline {
    api: Arc<dyn MatchApi>,
    config: PipelineConfig,
    state: Arc<RwLock<PipelineState>>,
}

impl AnalysisPipeline {
    /// Create a new pipeline over an upstream API.
    pub fn new(api: Arc<dyn MatchApi>, config: PipelineConfig) -> Self {
        Self {
            api,
            config,
            state: Arc::new(RwLock::new(PipelineState::default())),
        }
    }

    /// Get current pipeline state.
    pub async fn state(&self) -> PipelineState {
        self.state.read().await.clone()
    }

    /// Check if a run is currently in flight.
    pub async fn is_running(&self) -> bool {
        self.state.read().await.status.is_active()
    }

    /// Run an analysis from raw inputs.
    pub async fn run_analysis(
        &self,
        api_key: &str,
        game_name: &str,
        tag_line: &str,
        region_code: &str,
        match_count: u32,
        events: Option<UnboundedSender<PipelineEvent>>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(api_key, game_name, tag_line, region_code, match_count)?;
        self.run(&request, events).await
    }

    /// Run one analysis. Fails with [`AnalysisError::AlreadyRunning`] if another
    /// run on this pipeline has not finished.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        events: Option<UnboundedSender<PipelineEvent>>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let run_id = Uuid::new_v4();
        {
            let mut state = self.state.write().await;
            if state.status.is_active() {
                warn!("Analysis already in progress");
                return Err(AnalysisError::AlreadyRunning);
            }
            *state = PipelineState {
                status: PipelineStage::ResolvingIdentity,
                run_id: Some(run_id),
                last_run_started: Some(Utc::now()),
                last_run_completed: state.last_run_completed,
                ..Default::default()
            };
        }

        let guard = RunGuard::new(Arc::clone(&self.state));
        let span = info_span!("analysis", %run_id, region = %request.region);
        let mut reporter = ProgressReporter::new(events);

        let start = std::time::Instant::now();
        let outcome = self
            .execute(request, &mut reporter)
            .instrument(span.clone())
            .await;

        let final_stage = match &outcome {
            Ok(result) => {
                span.in_scope(|| {
                    info!(
                        "Analysis completed: {} matches, quality {} ({:.2}) in {:?}",
                        result.match_count(),
                        result.quality,
                        result.team_quality,
                        start.elapsed()
                    )
                });
                PipelineStage::Completed
            }
            Err(e) => {
                span.in_scope(|| error!("Analysis failed: {}", e));
                PipelineStage::Failed
            }
        };

        {
            let mut state = self.state.write().await;
            state.status = final_stage;
            state.last_run_completed = Some(Utc::now());
            state.last_error = outcome.as_ref().err().map(|e| e.to_string());
        }
        guard.disarm();
        reporter.stage(final_stage);

        outcome
    }

    async fn execute(
        &self,
        request: &AnalysisRequest,
        reporter: &mut ProgressReporter,
    ) -> Result<AnalysisResult, AnalysisError> {
        request.validate()?;
        let route = request.region.route();

        self.enter(PipelineStage::ResolvingIdentity, reporter).await;
        reporter.progress(5);
        let player_id = self.resolve_identity(request, route).await?;
        reporter.progress(10);

        self.enter(PipelineStage::ListingMatches, reporter).await;
        let match_ids = self.list_match_ids(request, route, &player_id).await?;
        reporter.progress(30);

        self.enter(PipelineStage::FetchingDetails, reporter).await;
        let matches = self
            .collect_matches(request, route, &player_id, &match_ids, reporter)
            .await?;

        if matches.is_empty() {
            return Err(AnalysisError::NoValidMatches);
        }
        if matches.len() < request.match_count as usize {
            warn!(
                "Only {} of {} requested matches could be analyzed",
                matches.len(),
                request.match_count
            );
        }

        self.enter(PipelineStage::Aggregating, reporter).await;
        let result = aggregate(matches);
        reporter.progress(100);

        Ok(result)
    }

    async fn enter(&self, stage: PipelineStage, reporter: &mut ProgressReporter) {
        self.state.write().await.status = stage;
        reporter.stage(stage);
    }

    async fn resolve_identity(
        &self,
        request: &AnalysisRequest,
        route: RegionRoute,
    ) -> Result<String, AnalysisError> {
        info!("Resolving player {}", request.riot_id());

        let account = self
            .api
            .account_by_riot_id(route, &request.api_key, &request.game_name, &request.tag_line)
            .await
            .map_err(|e| AnalysisError::identity(e, request))?;

        Ok(account.puuid)
    }

    async fn list_match_ids(
        &self,
        request: &AnalysisRequest,
        route: RegionRoute,
        player_id: &str,
    ) -> Result<Vec<String>, AnalysisError> {
        let count = self.config.listing_count(request.match_count);

        let ids = self
            .api
            .match_ids(route, &request.api_key, player_id, count)
            .await
            .map_err(AnalysisError::listing)?;

        if ids.is_empty() {
            return Err(AnalysisError::NoMatchHistory);
        }

        info!("Listed {} match ids (requested {})", ids.len(), count);
        Ok(ids)
    }

    /// Fetch details in listing order until `match_count` valid matches are collected.
    ///
    /// Each window holds at most as many ids as valid matches are still needed,
    /// so no id past the last needed match is ever requested.
    async fn collect_matches(
        &self,
        request: &AnalysisRequest,
        route: RegionRoute,
        player_id: &str,
        match_ids: &[String],
        reporter: &mut ProgressReporter,
    ) -> Result<Vec<MatchSummary>, AnalysisError> {
        let wanted = request.match_count as usize;
        let total = match_ids.len();
        let width = self.config.max_concurrent_requests.max(1);

        let mut collected: Vec<MatchSummary> = Vec::with_capacity(wanted);
        let mut next = 0;

        while collected.len() < wanted && next < total {
            let window = (wanted - collected.len()).min(width).min(total - next);
            let batch = &match_ids[next..next + window];

            let summaries = self.fetch_window(request, route, player_id, batch).await?;

            let mut skipped = 0;
            for (offset, summary) in summaries.into_iter().enumerate() {
                reporter.progress(detail_progress(next + offset + 1, total));
                match summary {
                    Some(summary) => collected.push(summary),
                    None => skipped += 1,
                }
            }
            next += window;

            let mut state = self.state.write().await;
            state.matches_collected = collected.len() as u32;
            state.matches_skipped += skipped;
        }

        if next < total {
            info!("Collected {} matches, {} ids left unfetched", collected.len(), total - next);
        }

        Ok(collected)
    }

    /// Fetch one window of ids, returning summaries in the window's order.
    ///
    /// Every fetch runs on its own task, so a panicking fetch fails the run
    /// with [`AnalysisError::Pipeline`].
    async fn fetch_window(
        &self,
        request: &AnalysisRequest,
        route: RegionRoute,
        player_id: &str,
        batch: &[String],
    ) -> Result<Vec<Option<MatchSummary>>, AnalysisError> {
        let mut tasks = JoinSet::new();
        for (index, match_id) in batch.iter().enumerate() {
            let api = Arc::clone(&self.api);
            let key = request.api_key.clone();
            let player_id = player_id.to_string();
            let match_id = match_id.clone();
            tasks.spawn(
                async move {
                    let summary = fetch_match(api.as_ref(), route, &key, &player_id, &match_id).await;
                    (index, summary)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<MatchSummary>> = vec![None; batch.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, summary) =
                joined.map_err(|e| AnalysisError::Pipeline(format!("match fetch task failed: {}", e)))?;
            slots[index] = summary;
        }

        Ok(slots)
    }
}

/// Marks the run failed if it ends without reaching its final state update,
/// either because the caller dropped the run or because it unwound.
struct RunGuard {
    state: Arc<RwLock<PipelineState>>,
    armed: bool,
}

impl RunGuard {
    fn new(state: Arc<RwLock<PipelineState>>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Analysis run abandoned before completion");

        match self.state.try_write() {
            Ok(mut state) => mark_abandoned(&mut state),
            Err(_) => {
                // Lock is busy; finish the reset once it frees up.
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    let state = Arc::clone(&self.state);
                    handle.spawn(async move { mark_abandoned(&mut *state.write().await) });
                }
            }
        }
    }
}

fn mark_abandoned(state: &mut PipelineState) {
    state.status = PipelineStage::Failed;
    state.last_run_completed = Some(Utc::now());
    state.last_error = Some("Analysis run abandoned".to_string());
}

/// Fetch and summarize one match. Failures and filtered matches yield `None`.
pub async fn fetch_match(
    api: &dyn MatchApi,
    route: RegionRoute,
    key: &ApiKey,
    player_id: &str,
    match_id: &str,
) -> Option<MatchSummary> {
    match api.match_detail(route, key, match_id).await {
        Ok(payload) => summarize_match(payload, player_id),
        Err(e) => {
            warn!("Skipping match: {}", AnalysisError::detail(e, match_id));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockMatchApi, Reply};
    use super::*;
    use crate::fetch::fixtures::match_dto;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn request(count: u32) -> AnalysisRequest {
        AnalysisRequest::new("RGAPI-test", "Player", "EUW", "EUW", count).unwrap()
    }

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("EUW1_{}", i)).collect()
    }

    /// Mock where every listed id is a valid ranked match.
    fn all_valid(n: usize) -> MockMatchApi {
        let mut api = MockMatchApi::new("me").with_ids(Reply::Ok(ids(n)));
        for id in ids(n) {
            api = api.with_detail(&id, Reply::Ok(match_dto(&id, 11, 420, 100)));
        }
        api
    }

    fn pipeline(api: Arc<MockMatchApi>, concurrency: usize) -> AnalysisPipeline {
        AnalysisPipeline::new(
            api,
            PipelineConfig {
                over_fetch_factor: 2,
                max_concurrent_requests: concurrency,
            },
        )
    }

    fn match_ids_of(result: &AnalysisResult) -> Vec<&str> {
        result.matches.iter().map(|m| m.match_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_takes_first_valid_matches_in_order() {
        let api = Arc::new(all_valid(10));
        let result = pipeline(api.clone(), 1).run(&request(5), None).await.unwrap();

        assert_eq!(
            match_ids_of(&result),
            vec!["EUW1_1", "EUW1_2", "EUW1_3", "EUW1_4", "EUW1_5"]
        );
        assert_eq!(api.calls()[1], "ids:me:10");
        assert_eq!(api.detail_requests().len(), 5);
        assert!(!api.detail_requests().contains(&"EUW1_6".to_string()));
    }

    #[tokio::test]
    async fn test_early_stop_with_concurrency() {
        let api = Arc::new(all_valid(10));
        let result = pipeline(api.clone(), 4).run(&request(5), None).await.unwrap();

        assert_eq!(
            match_ids_of(&result),
            vec!["EUW1_1", "EUW1_2", "EUW1_3", "EUW1_4", "EUW1_5"]
        );
        assert_eq!(
            api.detail_requests(),
            vec!["EUW1_1", "EUW1_2", "EUW1_3", "EUW1_4", "EUW1_5"]
        );
    }

    #[tokio::test]
    async fn test_filtered_matches_do_not_count() {
        let api = MockMatchApi::new("me")
            .with_ids(Reply::Ok(ids(4)))
            .with_detail("EUW1_1", Reply::Ok(match_dto("EUW1_1", 12, 450, 100)))
            .with_detail("EUW1_2", Reply::Ok(match_dto("EUW1_2", 11, 420, 100)))
            .with_detail("EUW1_3", Reply::Status(503))
            .with_detail("EUW1_4", Reply::Ok(match_dto("EUW1_4", 11, 440, 200)));
        let api = Arc::new(api);
        let pipeline = pipeline(api.clone(), 3);

        let result = pipeline.run(&request(2), None).await.unwrap();

        assert_eq!(match_ids_of(&result), vec!["EUW1_2", "EUW1_4"]);
        assert_eq!(api.detail_requests().len(), 4);
        let state = pipeline.state().await;
        assert_eq!(state.matches_collected, 2);
        assert_eq!(state.matches_skipped, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_fewer_matches() {
        let api = MockMatchApi::new("me")
            .with_ids(Reply::Ok(ids(6)))
            .with_detail("EUW1_3", Reply::Ok(match_dto("EUW1_3", 11, 420, 100)))
            .with_detail("EUW1_5", Reply::Ok(match_dto("EUW1_5", 11, 1100, 100)))
            .with_detail("EUW1_6", Reply::RateLimited);
        let api = Arc::new(api);

        let result = pipeline(api.clone(), 1).run(&request(3), None).await.unwrap();

        assert_eq!(match_ids_of(&result), vec!["EUW1_3"]);
        assert_eq!(api.detail_requests().len(), 6);
    }

    #[tokio::test]
    async fn test_no_valid_matches() {
        let api = MockMatchApi::new("me")
            .with_ids(Reply::Ok(ids(2)))
            .with_detail("EUW1_1", Reply::Ok(match_dto("EUW1_1", 11, 450, 100)))
            .with_detail("EUW1_2", Reply::Ok(match_dto("EUW1_2", 11, 1090, 100)));
        let pipeline = pipeline(Arc::new(api), 1);

        let err = pipeline.run(&request(1), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoValidMatches);
        assert_eq!(pipeline.state().await.status, PipelineStage::Failed);
    }

    #[tokio::test]
    async fn test_identity_failure_stops_pipeline() {
        let api = Arc::new(all_valid(10).with_account(Reply::Status(404)));

        let err = pipeline(api.clone(), 1).run(&request(5), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IdentityNotFound);
        assert_eq!(api.calls(), vec!["account:Player#EUW".to_string()]);
    }

    #[tokio::test]
    async fn test_identity_transient_failure() {
        let api = Arc::new(all_valid(1).with_account(Reply::RateLimited));

        let err = pipeline(api.clone(), 1).run(&request(1), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransientNetworkFailure);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let api = Arc::new(MockMatchApi::new("me").with_ids(Reply::Ok(Vec::new())));

        let err = pipeline(api.clone(), 1).run(&request(5), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoMatchHistory);
        assert!(api.detail_requests().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let api = Arc::new(MockMatchApi::new("me").with_ids(Reply::Status(403)));

        let err = pipeline(api, 1).run(&request(5), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NoMatchHistory);
    }

    #[tokio::test]
    async fn test_listing_transient_failure() {
        let api = Arc::new(all_valid(4).with_ids(Reply::RateLimited));

        let err = pipeline(api.clone(), 1).run(&request(2), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransientNetworkFailure);
        assert!(api.detail_requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_detail_is_skipped() {
        let api = MockMatchApi::new("me")
            .with_ids(Reply::Ok(ids(2)))
            .with_detail("EUW1_1", Reply::Malformed)
            .with_detail("EUW1_2", Reply::Ok(match_dto("EUW1_2", 11, 420, 100)));
        let pipeline = pipeline(Arc::new(api), 1);

        let result = pipeline.run(&request(1), None).await.unwrap();

        assert_eq!(match_ids_of(&result), vec!["EUW1_2"]);
        assert_eq!(pipeline.state().await.matches_skipped, 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_fails_run() {
        let api = all_valid(2).with_detail("EUW1_1", Reply::Panic);
        let pipeline = pipeline(Arc::new(api), 1);

        let err = pipeline.run(&request(1), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PipelineFailure);
        assert_eq!(pipeline.state().await.status, PipelineStage::Failed);
        assert!(!pipeline.is_running().await);
    }

    #[tokio::test]
    async fn test_dropped_run_releases_pipeline() {
        let api = Arc::new(all_valid(2).with_detail("EUW1_1", Reply::Hang));
        let pipeline = pipeline(api.clone(), 1);

        let first = timeout(Duration::from_millis(50), pipeline.run(&request(1), None)).await;
        assert!(first.is_err());

        let state = pipeline.state().await;
        assert_eq!(state.status, PipelineStage::Failed);
        assert!(state.last_run_completed.is_some());
        assert!(state.last_error.is_some());

        // The second run is accepted and reaches the hanging fetch again.
        let second = timeout(Duration::from_millis(50), pipeline.run(&request(1), None)).await;
        assert!(second.is_err());
        let lookups = api
            .calls()
            .iter()
            .filter(|c| c.starts_with("account:"))
            .count();
        assert_eq!(lookups, 2);
    }

    #[tokio::test]
    async fn test_progress_events() {
        let api = Arc::new(all_valid(4));
        let (tx, mut rx) = mpsc::unbounded_channel();

        pipeline(api, 1).run(&request(2), Some(tx)).await.unwrap();

        let mut percents = Vec::new();
        let mut stages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                PipelineEvent::Progress { percent } => percents.push(percent),
                PipelineEvent::Stage { stage } => stages.push(stage),
            }
        }

        // 4 ids listed: detail steps land on 47 and 65, then the run completes.
        assert_eq!(percents, vec![5, 10, 30, 47, 65, 100]);
        assert_eq!(
            stages,
            vec![
                PipelineStage::ResolvingIdentity,
                PipelineStage::ListingMatches,
                PipelineStage::FetchingDetails,
                PipelineStage::Aggregating,
                PipelineStage::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_run_reports_failed_stage() {
        let api = Arc::new(MockMatchApi::new("me").with_account(Reply::Status(401)));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _ = pipeline(api, 1).run(&request(1), Some(tx)).await;

        let mut last_stage = None;
        while let Ok(event) = rx.try_recv() {
            if let PipelineEvent::Stage { stage } = event {
                last_stage = Some(stage);
            }
        }
        assert_eq!(last_stage, Some(PipelineStage::Failed));
    }

    #[tokio::test]
    async fn test_rejects_concurrent_run() {
        let api = Arc::new(all_valid(2));
        let pipeline = pipeline(api, 1);
        pipeline.state.write().await.status = PipelineStage::FetchingDetails;

        let err = pipeline.run(&request(1), None).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyRunning);
    }

    #[tokio::test]
    async fn test_pipeline_can_run_again() {
        let api = Arc::new(all_valid(2));
        let pipeline = pipeline(api, 1);

        pipeline.run(&request(1), None).await.unwrap();
        let second = pipeline.run(&request(2), None).await.unwrap();

        assert_eq!(second.match_count(), 2);
        assert!(!pipeline.is_running().await);
        assert_eq!(pipeline.state().await.status, PipelineStage::Completed);
    }

    #[tokio::test]
    async fn test_run_analysis_unknown_region() {
        let pipeline = pipeline(Arc::new(all_valid(1)), 1);

        let err = pipeline
            .run_analysis("key", "Player", "EUW", "ATLANTIS", 5, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_request_validation() {
        assert!(AnalysisRequest::new("key", "Player", "#EUW", "euw", 10).is_ok());
        assert_eq!(
            AnalysisRequest::new("key", "Player", "#EUW", "euw", 10)
                .unwrap()
                .tag_line,
            "EUW"
        );
        for (key, name, tag, count) in [
            ("", "Player", "EUW", 10),
            ("key", "  ", "EUW", 10),
            ("key", "Player", "", 10),
            ("key", "Player", "EUW", 0),
            ("key", "Player", "EUW", MAX_MATCH_COUNT + 1),
        ] {
            let err = AnalysisRequest::new(key, name, tag, "EUW", count).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        }
    }

    #[test]
    fn test_listing_count() {
        let config = PipelineConfig::default();
        assert_eq!(config.listing_count(5), 10);
        assert_eq!(config.listing_count(50), 100);
        assert_eq!(config.listing_count(80), 100);

        let no_overfetch = PipelineConfig {
            over_fetch_factor: 0,
            ..Default::default()
        };
        assert_eq!(no_overfetch.listing_count(7), 7);
    }

    #[test]
    fn test_detail_error_classification() {
        let err = AnalysisError::detail(
            FetchError::HttpStatus {
                status: 500,
                message: "Internal Server Error".to_string(),
            },
            "EUW1_1",
        );
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);

        let err = AnalysisError::detail(
            FetchError::RateLimited {
                host: "europe".to_string(),
                retry_after_secs: 1,
            },
            "EUW1_1",
        );
        assert_eq!(err.kind(), ErrorKind::TransientNetworkFailure);
    }
}
