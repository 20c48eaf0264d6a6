use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::access_log::AccessLogView;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct KeyUsageTotals {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub total_requests: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStats {
    pub total_api_keys: i64,
    pub active_api_keys: i64,
    pub inactive_api_keys: i64,
    pub total_requests: i64,
    /// Accounts with the `user` role
    pub total_users: i64,
    pub recent_logs: Vec<AccessLogView>,
}

impl ApiStats {
    pub fn new(totals: KeyUsageTotals, total_users: i64, recent_logs: Vec<AccessLogView>) -> Self {
        Self {
            total_api_keys: totals.total,
            active_api_keys: totals.active,
            inactive_api_keys: totals.inactive,
            total_requests: totals.total_requests,
            total_users,
            recent_logs,
        }
    }
}
