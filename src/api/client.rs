// ==========================================
// 废弃物影响追踪系统 - 远端 REST 客户端
// ==========================================
// 依据: 后端 REST 接口约定 (auth / impact / community)
// 协议: JSON over HTTP, bearer token
// 红线: 需认证接口在无 token 时直接返回认证错误（零网络调用）
// 红线: 非 2xx 响应体文本即错误消息; 无自动重试
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::log_entry::LogEntry;
use crate::domain::types::DisposalMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

/// 默认后端基地址
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
/// 请求超时（秒）- 超时即取消
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ==========================================
// DTO - 与后端 JSON 对齐（snake_case）
// ==========================================

/// 注册入参
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// 用户资料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// 登录返回的 token 包
#[derive(Debug, Clone, Deserialize)]
struct TokenBundle {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ImpactCalculationRequest<'a> {
    material_id: &'a str,
    disposal_method: &'a str,
    weight_grams: i64,
}

/// POST /api/impact/calculate 响应
#[derive(Debug, Clone, Deserialize)]
pub struct ImpactCalculationResponse {
    pub impact_id: String,
    pub material_id: String,
    pub disposal_method: String,
    pub weight_grams: i64,
    pub impact_value: f64, // 带符号 kg CO₂e（正=避免排放）
    pub nudge_text: String,
    pub created_at: DateTime<Utc>,
}

/// GET /api/impact/recent 条目
#[derive(Debug, Clone, Deserialize)]
pub struct RecentImpact {
    pub id: String,
    pub material_id: String,
    pub disposal_method: String,
    pub weight_grams: i64,
    pub impact_value: f64,
    pub nudge_text: String,
    pub created_at: DateTime<Utc>,
}

impl RecentImpact {
    /// 转为本地缓存条目（远端路径: 仅本地字段为 None）
    pub fn into_log_entry(self) -> LogEntry {
        let method =
            DisposalMethod::from_id(&self.disposal_method).unwrap_or(DisposalMethod::Landfilled);
        LogEntry {
            id: self.id,
            material_id: None,
            impact_material: None,
            friendly_name: self.material_id,
            category: None,
            method,
            weight_grams: self.weight_grams,
            confidence: None,
            impact_value: self.impact_value,
            nudge_text: self.nudge_text,
            water_savings: None,
            energy_savings: None,
            timestamp: self.created_at,
        }
    }
}

/// GET /api/impact/summary 响应
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySummary {
    pub total_items: i64,
    pub total_impact_value: f64,
}

/// GET /api/community/stats 响应
#[derive(Debug, Clone, Deserialize)]
pub struct CommunityStats {
    pub user_total_impact: f64,
    pub user_total_items: i64,
    pub community_average_impact: f64,
    pub community_size: i64,
}

/// 排行榜条目
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub username: String,
    pub total_impact_value: f64,
    pub total_items: i64,
}

/// GET /api/community/leaderboard 响应
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardPayload {
    pub entries: Vec<LeaderboardEntry>,
    pub generated_at: DateTime<Utc>,
}

// ==========================================
// ImpactApiClient - REST 客户端
// ==========================================
/// 后端 API 客户端
///
/// token 持有于内存槽; 登录成功后自动附带 Authorization 头。
pub struct ImpactApiClient {
    base_url: String,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl ImpactApiClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - base_url: 后端基地址（尾部斜杠会被剔除）
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: RwLock::new(None),
        })
    }

    /// 基地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 当前是否已认证（持有 token）
    pub fn is_authenticated(&self) -> bool {
        self.token.read().map(|t| t.is_some()).unwrap_or(false)
    }

    /// 注入 token（会话恢复）
    pub fn set_token(&self, token: String) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
    }

    /// 清除 token
    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// 认证前置检查: 无 token → 认证错误, 零网络调用
    fn assert_authenticated(&self) -> ApiResult<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::AuthenticationRequired)
        }
    }

    /// 发送请求并解析 JSON 响应
    ///
    /// 非 2xx → TransportError, 消息为响应体文本（空则为状态码描述）
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ApiResult<T> {
        let request = match self.current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                format!("Request failed: {}", status.as_u16())
            } else {
                text
            };
            return Err(ApiError::TransportError(message));
        }
        Ok(response.json::<T>().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ==========================================
    // 认证接口
    // ==========================================

    /// POST /api/auth/register
    pub async fn register(&self, payload: &RegisterPayload) -> ApiResult<UserProfile> {
        self.send_json(self.http.post(self.url("/api/auth/register")).json(payload))
            .await
    }

    /// POST /api/auth/login - 成功后持有 access_token
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        let bundle: TokenBundle = self
            .send_json(
                self.http
                    .post(self.url("/api/auth/login"))
                    .json(&LoginPayload { username, password }),
            )
            .await?;
        self.set_token(bundle.access_token);
        Ok(())
    }

    /// POST /api/auth/logout - 请求失败也清除本地 token
    pub async fn logout(&self) {
        let result: ApiResult<serde_json::Value> =
            self.send_json(self.http.post(self.url("/api/auth/logout"))).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "登出请求失败, 仍清除本地 token");
        }
        self.clear_token();
    }

    /// GET /api/auth/me
    pub async fn current_user(&self) -> ApiResult<UserProfile> {
        self.assert_authenticated()?;
        self.send_json(self.http.get(self.url("/api/auth/me"))).await
    }

    // ==========================================
    // 影响接口
    // ==========================================

    /// POST /api/impact/calculate - 服务端权威影响计算 + 记录
    pub async fn calculate_impact(
        &self,
        impact_material: &str,
        method: DisposalMethod,
        weight_grams: i64,
    ) -> ApiResult<ImpactCalculationResponse> {
        self.assert_authenticated()?;
        self.send_json(
            self.http
                .post(self.url("/api/impact/calculate"))
                .json(&ImpactCalculationRequest {
                    material_id: impact_material,
                    disposal_method: method.id(),
                    weight_grams,
                }),
        )
        .await
    }

    /// GET /api/impact/recent?limit=N
    pub async fn recent_impacts(&self, limit: u32) -> ApiResult<Vec<RecentImpact>> {
        self.assert_authenticated()?;
        self.send_json(
            self.http
                .get(self.url(&format!("/api/impact/recent?limit={}", limit))),
        )
        .await
    }

    /// GET /api/impact/summary
    pub async fn impact_summary(&self) -> ApiResult<ActivitySummary> {
        self.assert_authenticated()?;
        self.send_json(self.http.get(self.url("/api/impact/summary"))).await
    }

    // ==========================================
    // 社区接口
    // ==========================================

    /// GET /api/community/stats
    pub async fn community_stats(&self) -> ApiResult<CommunityStats> {
        self.assert_authenticated()?;
        self.send_json(self.http.get(self.url("/api/community/stats"))).await
    }

    /// GET /api/community/leaderboard
    pub async fn leaderboard(&self) -> ApiResult<LeaderboardPayload> {
        self.assert_authenticated()?;
        self.send_json(self.http.get(self.url("/api/community/leaderboard")))
            .await
    }
}
