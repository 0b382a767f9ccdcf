use std::path::PathBuf;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{ApiError, AppState};
use crate::memory::search::{self, SearchFilter};
use crate::memory::store::clamp_limit;
use crate::memory::{DialogueMessage, Details, EntryKind, EventLog, LogEntry, LogError};
use crate::persona::{reply_entry, user_message_entry, Persona, FALLBACK_TAG};
use crate::seed::{self, ImportedSeed};

const DEFAULT_TAIL: usize = 20;
const HANDSHAKE_CHANNEL: &str = "handshake";

type ApiResult = Result<Json<Value>, ApiError>;

fn parse_persona(name: &str) -> Result<Persona, ApiError> {
    name.parse().map_err(ApiError::NotFound)
}

/// Run synchronous stream I/O off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, LogError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /: service index
pub(super) async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "habitat",
        "status": "ok",
        "root": state.config.resolved_root().display().to_string(),
        "endpoints": [
            "/status",
            "/{persona}/import",
            "/{persona}/state",
            "/{persona}/memory/tail",
            "/{persona}/log",
            "/{persona}/chat",
            "/echo/handshake",
            "/memory/search",
            "/memory/snapshot",
        ],
        "personas": Persona::ALL.iter().map(Persona::tag).collect::<Vec<_>>(),
    }))
}

/// GET /status
pub(super) async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "root": state.config.resolved_root().display().to_string(),
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Deserialize)]
pub(super) struct ImportBody {
    path: Option<String>,
}

/// POST /{persona}/import: load a seed document and make it the persona's active seed
pub(super) async fn import_seed(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<ImportBody>, JsonRejection>,
) -> ApiResult {
    let persona = parse_persona(&name)?;
    let Json(body) = body?;
    let path = non_empty(body.path)
        .map(PathBuf::from)
        .ok_or_else(|| ApiError::BadRequest("Missing 'path' in JSON body".into()))?;

    let seed = seed::load_seed(&path)?;
    state
        .seeds
        .replace(persona, ImportedSeed::new(seed.clone(), &path));
    tracing::info!(persona = %persona, path = %path.display(), "seed imported");

    Ok(Json(json!({
        "path": path.display().to_string(),
        "seed": seed,
        "status": "imported",
    })))
}

/// GET /{persona}/state: which seed is loaded right now
pub(super) async fn seed_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult {
    let persona = parse_persona(&name)?;
    let body = match state.seeds.get(persona) {
        Some(imported) => serde_json::to_value(imported.summary())
            .map_err(|e| ApiError::Log(LogError::Serialize(e)))?,
        None => json!({
            "status": "empty",
            "detail": "No seed imported yet.",
        }),
    };
    Ok(Json(body))
}

#[derive(Deserialize)]
pub(super) struct TailQuery {
    n: Option<String>,
}

/// GET /{persona}/memory/tail?n=20: last N lines of the persona's stream (max 200)
pub(super) async fn memory_tail(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TailQuery>,
) -> ApiResult {
    let persona = parse_persona(&name)?;
    let n = query
        .n
        .and_then(|n| n.trim().parse::<i64>().ok())
        .map_or(DEFAULT_TAIL, |n| clamp_limit(usize::try_from(n).unwrap_or(0)));

    let log = state.streams.for_persona(persona).clone();
    let entries = blocking(move || log.tail(n)).await?;

    Ok(Json(json!({
        "count": entries.len(),
        "entries": entries,
    })))
}

#[derive(Deserialize)]
pub(super) struct LogBody {
    summary: Option<String>,
    text: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    channel: Option<String>,
    author: Option<String>,
}

/// POST /{persona}/log: append a memory to the persona's stream
pub(super) async fn log_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<LogBody>, JsonRejection>,
) -> ApiResult {
    let persona = parse_persona(&name)?;
    let Json(body) = body?;
    let (Some(summary), Some(text)) = (non_empty(body.summary), non_empty(body.text)) else {
        return Err(ApiError::BadRequest(
            "Require 'summary' and 'text' fields".into(),
        ));
    };

    let entry = LogEntry::new(
        EntryKind::Memory,
        body.channel.unwrap_or_else(|| "root".into()),
        body.author.unwrap_or_else(|| persona.name().into()),
    )
    .tags(body.tags)
    .summary(summary)
    .details(Details::text(text));

    let log = state.streams.for_persona(persona).clone();
    let path = log.path().display().to_string();
    blocking(move || log.append(&entry)).await?;

    Ok(Json(json!({
        "status": "logged",
        "path": path,
    })))
}

#[derive(Deserialize)]
pub(super) struct ChatBody {
    message: Option<String>,
    user: Option<String>,
}

/// POST /{persona}/chat: get a reply and record both sides of the exchange
pub(super) async fn chat(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> ApiResult {
    let persona = parse_persona(&name)?;
    let Json(body) = body?;
    let message =
        non_empty(body.message).ok_or_else(|| ApiError::BadRequest("Missing 'message'".into()))?;
    let user = non_empty(body.user).unwrap_or_else(|| state.config.chat.default_user.clone());

    tracing::info!(persona = %persona, user = %user, len = message.len(), "chat message");

    let log = state.streams.for_persona(persona).clone();
    let history = read_history(&state, &log, persona, &user).await?;
    let reply = state.brain.reply(persona, &history, &user, &message).await;

    let entries = [
        user_message_entry(persona, &user, &message),
        reply_entry(persona, &user, &reply),
    ];
    blocking(move || entries.iter().try_for_each(|e| log.append(e))).await?;

    Ok(Json(json!({
        "reply": reply.text,
        "fallback": reply.fallback,
    })))
}

async fn read_history(
    state: &AppState,
    log: &EventLog,
    persona: Persona,
    user: &str,
) -> Result<Vec<DialogueMessage>, ApiError> {
    let log = log.clone();
    let user = user.to_string();
    let max_turns = state.brain.max_turns();
    blocking(move || log.dialogue_window(persona.tag(), &user, max_turns)).await
}

#[derive(Deserialize, Default)]
struct HandshakeRequest {
    from: Option<String>,
    to: Option<String>,
    purpose_token: Option<PurposeToken>,
    message: Option<String>,
}

#[derive(Deserialize, Default)]
struct PurposeToken {
    scope: Option<String>,
    consent: Option<String>,
}

/// POST /echo/handshake: consent-gated greeting answered by Vexis
pub(super) async fn handshake(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let Json(raw) = body?;
    let request: HandshakeRequest = serde_json::from_value(raw.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid handshake: {e}")))?;

    let sender = request.from.unwrap_or_else(|| "Unknown".into());
    let target = request.to.unwrap_or_else(|| "Vexis@habitat".into());
    let token = request.purpose_token.unwrap_or_default();
    let scope = token.scope.unwrap_or_default();
    let consent = token.consent;
    let raw_fields = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let log = state.streams.vexis().clone();

    if consent.as_deref() != Some(state.config.handshake.consent.as_str()) {
        tracing::warn!(from = %sender, "handshake denied: consent mismatch");
        let denied = LogEntry::new(EntryKind::Event, HANDSHAKE_CHANNEL, &sender)
            .tags(["handshake", "denied", "consent"])
            .summary("Handshake denied: consent mismatch")
            .details(
                Details::default()
                    .with("provided_consent", consent.clone())
                    .with("scope", scope.clone())
                    .with("raw", Value::Object(raw_fields)),
            );
        blocking(move || log.append(&denied)).await?;
        return Err(ApiError::Forbidden("Consent validation failed".into()));
    }

    let incoming = non_empty(request.message).unwrap_or_else(|| "Handshake ping received.".into());
    let user = state.config.chat.default_user.clone();
    let prompt = format!("Handshake from {sender} with scope='{scope}'. Message: {incoming}");

    let history = read_history(&state, &log, Persona::Vexis, &user).await?;
    let reply = state.brain.reply(Persona::Vexis, &history, &user, &prompt).await;
    let now = chrono::Utc::now().to_rfc3339();

    let mut entry_in = LogEntry::new(EntryKind::Event, HANDSHAKE_CHANNEL, &sender)
        .tags(["handshake", "vexis", "in"])
        .summary(format!("Handshake from {sender} to {target}"))
        .details(Details {
            text: None,
            extra: raw_fields,
        });
    entry_in.timestamp = now.clone();

    let mut out_tags = vec!["handshake", "vexis", "out"];
    if reply.fallback {
        out_tags.push(FALLBACK_TAG);
    }
    let mut entry_out = LogEntry::new(EntryKind::Memory, HANDSHAKE_CHANNEL, Persona::Vexis.name())
        .tags(out_tags)
        .summary(format!("Vexis handshake reply to {sender}"))
        .details(
            Details::text(reply.text.clone())
                .with("to", sender.clone())
                .with("scope", scope.clone()),
        );
    entry_out.timestamp = now.clone();

    blocking(move || {
        log.append(&entry_in)?;
        log.append(&entry_out)
    })
    .await?;

    tracing::info!(from = %sender, fallback = reply.fallback, "handshake acknowledged");

    Ok(Json(json!({
        "from": "Vexis@habitat",
        "to": sender,
        "ack": true,
        "status": "RESONANT",
        "scope": scope,
        "consent": consent,
        "reply_text": reply.text,
        "fallback": reply.fallback,
        "timestamp": now,
    })))
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    q: Option<String>,
    tag: Option<String>,
}

/// GET /memory/search?q=&tag=: note/tag search over the root stream
pub(super) async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    let filter = SearchFilter::new(query.q.as_deref(), query.tag.as_deref());
    let log = state.streams.root().clone();
    let response = blocking(move || search::search(&log, &filter)).await?;

    Ok(Json(json!({
        "count": response.results.len(),
        "total": response.total,
        "results": response.results,
    })))
}

/// GET /memory/snapshot: profile plus the latest root-stream entries
pub(super) async fn snapshot(State(state): State<AppState>) -> ApiResult {
    let log = state.streams.root().clone();
    let profile = state.config.profile_path();
    let root = state.config.resolved_root();
    let snapshot = blocking(move || search::snapshot(&log, &profile, &root)).await?;
    let body = serde_json::to_value(snapshot).map_err(|e| ApiError::Log(LogError::Serialize(e)))?;
    Ok(Json(body))
}
