//!
//! contextvault HTTP server
//! ------------------------
//! Axum-based HTTP API over the context vault.
//!
//! Responsibilities:
//! - Resolve the caller's credential (header first, then cookie) through the
//!   configured `IdentityResolver` before any vault access.
//! - Drive every vault operation with the verified identity only; identity-like
//!   fields in request bodies are ignored.
//! - Gate unscoped operations (global history, context listing, sweep) behind
//!   the `PrivilegePolicy`.
//! - Map vault outcomes and failures to HTTP statuses via `AppError`.
//! - Run the background idle sweeper.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::VaultConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{
    AllowAuthenticated, AllowList, IdentityResolver, Principal, PrivilegePolicy, PrivilegedOp, RemoteResolver,
    RequestContext, ResolveError, SessionTable,
};
use crate::vault::{ActiveContext, ContextVault, Scope};

pub mod credentials;

use credentials::CredentialChain;

pub const SERVICE_NAME: &str = "contextvault";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub vault: ContextVault,
    pub resolver: Arc<dyn IdentityResolver>,
    pub policy: Arc<dyn PrivilegePolicy>,
    pub credentials: Arc<CredentialChain>,
    /// Default window for `POST /sweep` when the caller does not pass one.
    pub idle_ttl: Duration,
}

impl AppState {
    pub fn new(
        vault: ContextVault,
        resolver: Arc<dyn IdentityResolver>,
        policy: Arc<dyn PrivilegePolicy>,
        credentials: CredentialChain,
        idle_ttl: Duration,
    ) -> Self {
        Self { vault, resolver, policy, credentials: Arc::new(credentials), idle_ttl }
    }
}

pub fn build_resolver(cfg: &VaultConfig) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    if let Some(url) = cfg.resolver_url.as_deref() {
        let r = RemoteResolver::new(url, cfg.resolver_timeout())
            .with_context(|| format!("While building remote resolver for {}", url))?;
        return Ok(Arc::new(r));
    }
    if let Some(path) = cfg.sessions_file.as_deref() {
        return Ok(Arc::new(SessionTable::load_file(path)?));
    }
    warn!(target: "contextvault::server", "no resolver_url or sessions_file configured; every credential will be rejected");
    Ok(Arc::new(SessionTable::new()))
}

pub fn build_policy(cfg: &VaultConfig) -> Arc<dyn PrivilegePolicy> {
    if cfg.open_privileged {
        warn!(target: "contextvault::server", "open_privileged is set: any authenticated identity may read all contexts, global history and trigger sweeps");
        Arc::new(AllowAuthenticated)
    } else {
        Arc::new(AllowList::new(cfg.privileged_identities.iter().cloned()))
    }
}

/// Assemble the vault, resolver, policy and credential chain described by `cfg`.
pub fn build_state(cfg: &VaultConfig) -> anyhow::Result<AppState> {
    cfg.validate()?;
    let vault = ContextVault::new(cfg.history_capacity);
    let resolver = build_resolver(cfg)?;
    let policy = build_policy(cfg);
    let credentials = CredentialChain::from_config(cfg)?;
    Ok(AppState::new(vault, resolver, policy, credentials, cfg.idle_ttl()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/context", get(get_context).put(put_context).delete(delete_context))
        .route("/history", get(history))
        .route("/contexts", get(list_contexts))
        .route("/sweep", post(sweep))
        .with_state(state)
}

/// Start the periodic idle sweeper. Returns `None` when disabled.
pub fn spawn_sweeper(vault: ContextVault, interval: Option<Duration>, max_idle: Duration) -> Option<tokio::task::JoinHandle<()>> {
    let interval = interval?;
    Some(tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = vault.sweep_idle(max_idle);
            if removed > 0 { debug!(target: "contextvault::server", removed = removed, "idle_sweep"); }
        }
    }))
}

pub async fn run_with_config(cfg: VaultConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg)?;
    info!(
        target: "startup",
        "contextvault starting: history_capacity={}, idle_ttl_secs={}, sweep_interval_secs={}, resolver={}, privileged={}, credential_channels={:?}",
        cfg.history_capacity,
        cfg.idle_ttl_secs,
        cfg.sweep_interval_secs,
        state.resolver.describe(),
        state.policy.describe(),
        state.credentials.channels(),
    );

    let sweeper = spawn_sweeper(state.vault.clone(), cfg.sweep_interval(), cfg.idle_ttl());
    if sweeper.is_none() {
        info!(target: "startup", "background idle sweeper disabled");
    }

    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", cfg.bind_address, cfg.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", cfg.bind_address, cfg.http_port))?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    if let Some(h) = sweeper { h.abort(); }
    info!("contextvault stopped; all active contexts discarded");
    Ok(())
}

/// Convenience entry point: configuration from defaults, file and environment.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(VaultConfig::from_env()?).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Credential lookup for one request:
/// no credential -> `CredentialMissing` without consulting the resolver;
/// credential present -> resolver -> verified principal, or rejection.
/// Only a verified principal ever reaches the vault.
async fn authenticate(state: &AppState, headers: &HeaderMap, rc: &mut RequestContext) -> AppResult<Principal> {
    let Some((channel, credential)) = state.credentials.extract(headers) else {
        debug!(target: "contextvault::auth", request_id = %rc.request_id, "no credential on request");
        return Err(AppError::credential_missing("no_credential", "no credential supplied"));
    };
    rc.channel = Some(channel);
    match state.resolver.resolve(&credential).await {
        Ok(principal) => {
            rc.principal = Some(principal.clone());
            Ok(principal)
        }
        Err(ResolveError::Unavailable(detail)) => {
            error!(target: "contextvault::auth", request_id = %rc.request_id, channel = channel, "identity resolver unavailable: {}", detail);
            Err(ResolveError::Unavailable(detail).into())
        }
        Err(e) => {
            warn!(target: "contextvault::auth", request_id = %rc.request_id, channel = channel, "credential rejected: {}", e);
            Err(e.into())
        }
    }
}

fn require_privilege(state: &AppState, principal: &Principal, op: PrivilegedOp, rc: &RequestContext) -> AppResult<()> {
    if state.policy.allows(principal, op) {
        return Ok(());
    }
    warn!(target: "contextvault::auth", request_id = %rc.request_id, identity = %principal.identity, op = op.as_str(), "privileged operation denied");
    Err(AppError::forbidden("forbidden".to_string(), format!("{} requires a privileged identity", op.as_str())))
}

#[derive(Debug, Default, Deserialize)]
struct SetContextPayload {
    #[serde(default, alias = "resourceRef", alias = "patient_id")]
    resource_ref: Option<String>,
    #[serde(default, alias = "set_by")]
    actor: Option<String>,
    #[serde(default, alias = "displayMeta")]
    display_meta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClearContextPayload {
    #[serde(default, alias = "cleared_by")]
    actor: Option<String>,
}

fn parse_body<T: serde::de::DeserializeOwned + Default>(body: &Bytes) -> AppResult<T> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::validation("invalid_body".to_string(), format!("malformed JSON body: {}", e)))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "message": "Context vault is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "active_contexts": state.vault.count(),
    }))
}

async fn get_context(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<ActiveContext>> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    match state.vault.read(&principal.identity) {
        Some(ctx) => Ok(Json(ctx)),
        None => Err(AppError::not_found("no_active_context", "No active context")),
    }
}

async fn put_context(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<Json<ActiveContext>> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    let payload: SetContextPayload = parse_body(&body)?;
    let resource_ref = payload.resource_ref.unwrap_or_default();
    if resource_ref.trim().is_empty() {
        return Err(AppError::validation("resource_ref_required", "resource_ref must be a non-empty string"));
    }
    let actor = payload.actor.unwrap_or_default();
    let display_meta = payload.display_meta.or_else(|| principal.display_name.clone());
    let ctx = state.vault.write(&principal.identity, &resource_ref, &actor, display_meta)?;
    info!(target: "contextvault::server", request_id = %rc.request_id, identity = %principal.identity, actor = %ctx.actor, "active context set");
    Ok(Json(ctx))
}

async fn delete_context(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<StatusCode> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    let payload: ClearContextPayload = parse_body(&body)?;
    if state.vault.erase(&principal.identity, payload.actor.as_deref()) {
        info!(target: "contextvault::server", request_id = %rc.request_id, identity = %principal.identity, "active context cleared");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("no_active_context", "No active context to clear"))
    }
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    scope: Option<String>,
}

async fn history(State(state): State<AppState>, headers: HeaderMap, Query(params): Query<HistoryParams>) -> AppResult<Json<serde_json::Value>> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    let scope = match params.scope.as_deref() {
        None => Scope::Own,
        Some(s) => s.parse::<Scope>().map_err(|e| AppError::user("invalid_scope".to_string(), e.to_string()))?,
    };
    if scope == Scope::All {
        require_privilege(&state, &principal, PrivilegedOp::GlobalHistory, &rc)?;
    }
    let events = state.vault.query_events(Some(&principal.identity), scope)?;
    let mut body = json!({
        "scope": scope.as_str(),
        "count": events.len(),
        "history": events,
    });
    if scope == Scope::Own {
        body["identity"] = json!(principal.identity);
    }
    Ok(Json(body))
}

async fn list_contexts(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    require_privilege(&state, &principal, PrivilegedOp::ListContexts, &rc)?;
    let contexts = state.vault.list_all();
    Ok(Json(json!({ "count": contexts.len(), "contexts": contexts })))
}

#[derive(Debug, Deserialize)]
struct SweepParams {
    max_idle_secs: Option<String>,
}

async fn sweep(State(state): State<AppState>, headers: HeaderMap, Query(params): Query<SweepParams>) -> AppResult<Json<serde_json::Value>> {
    let mut rc = RequestContext::new();
    let principal = authenticate(&state, &headers, &mut rc).await?;
    require_privilege(&state, &principal, PrivilegedOp::Sweep, &rc)?;
    let max_idle = match params.max_idle_secs.as_deref() {
        None => state.idle_ttl,
        Some(s) => Duration::from_secs(
            s.trim().parse::<u64>().map_err(|_| AppError::user("invalid_max_idle".to_string(), format!("max_idle_secs must be a non-negative integer, got '{}'", s)))?,
        ),
    };
    let evicted = state.vault.sweep_idle(max_idle);
    info!(target: "contextvault::server", request_id = %rc.request_id, identity = %principal.identity, evicted = evicted, "manual sweep");
    Ok(Json(json!({ "status": "ok", "evicted": evicted, "max_idle_secs": max_idle.as_secs() })))
}
