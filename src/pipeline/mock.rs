//! Scripted in-memory [`MatchApi`] for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::dto::{AccountDto, MatchDto};
use crate::fetch::{ApiKey, FetchError, MatchApi};
use crate::models::RegionRoute;

/// Canned upstream answer.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    Status(u16),
    RateLimited,
    /// Body that is not valid JSON
    Malformed,
    /// Never answers
    Hang,
    Panic,
}

impl<T: Clone> Reply<T> {
    async fn resolve(&self) -> Result<T, FetchError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(status) => Err(FetchError::HttpStatus {
                status: *status,
                message: "scripted".to_string(),
            }),
            Reply::RateLimited => Err(FetchError::RateLimited {
                host: "mock".to_string(),
                retry_after_secs: 1,
            }),
            Reply::Malformed => Err(FetchError::Json(
                serde_json::from_str::<serde_json::Value>("{\"info\":").unwrap_err(),
            )),
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("scripted upstream panic"),
        }
    }
}

pub struct MockMatchApi {
    account: Reply<AccountDto>,
    ids: Reply<Vec<String>>,
    details: HashMap<String, Reply<MatchDto>>,
    calls: Mutex<Vec<String>>,
}

impl MockMatchApi {
    pub fn new(player_id: &str) -> Self {
        Self {
            account: Reply::Ok(AccountDto {
                puuid: player_id.to_string(),
                game_name: None,
                tag_line: None,
            }),
            ids: Reply::Ok(Vec::new()),
            details: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(mut self, reply: Reply<AccountDto>) -> Self {
        self.account = reply;
        self
    }

    pub fn with_ids(mut self, reply: Reply<Vec<String>>) -> Self {
        self.ids = reply;
        self
    }

    pub fn with_detail(mut self, match_id: &str, reply: Reply<MatchDto>) -> Self {
        self.details.insert(match_id.to_string(), reply);
        self
    }

    /// Every request made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Match ids whose detail was requested, sorted.
    pub fn detail_requests(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("detail:").map(str::to_string))
            .collect();
        ids.sort();
        ids
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MatchApi for MockMatchApi {
    async fn account_by_riot_id(
        &self,
        _route: RegionRoute,
        _key: &ApiKey,
        game_name: &str,
        tag_line: &str,
    ) -> Result<AccountDto, FetchError> {
        self.record(format!("account:{}#{}", game_name, tag_line));
        self.account.resolve().await
    }

    async fn match_ids(
        &self,
        _route: RegionRoute,
        _key: &ApiKey,
        player_id: &str,
        count: u32,
    ) -> Result<Vec<String>, FetchError> {
        self.record(format!("ids:{}:{}", player_id, count));
        let ids = self.ids.resolve().await?;
        Ok(ids.into_iter().take(count as usize).collect())
    }

    async fn match_detail(
        &self,
        _route: RegionRoute,
        _key: &ApiKey,
        match_id: &str,
    ) -> Result<MatchDto, FetchError> {
        self.record(format!("detail:{}", match_id));
        let reply = self.details.get(match_id).cloned().unwrap_or(Reply::Status(404));
        reply.resolve().await
    }
}
