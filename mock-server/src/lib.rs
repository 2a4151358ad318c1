use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub uuid: String,
    pub name: Option<String>,
    pub urns: Vec<String>,
    pub groups: Vec<String>,
    pub fields: BTreeMap<String, Option<String>>,
    pub language: Option<String>,
}

#[derive(Deserialize)]
pub struct WriteContact {
    pub uuid: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub urns: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    pub language: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Broadcast {
    pub id: i64,
    pub urns: Vec<String>,
    pub contacts: Vec<String>,
    pub groups: Vec<String>,
    pub text: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct SendBroadcast {
    #[serde(default)]
    pub urns: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    pub text: String,
}

/// A list endpoint response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub next: Option<String>,
}

#[derive(Default)]
pub struct Store {
    pub contacts: Vec<Contact>,
    pub broadcasts: Vec<Broadcast>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    token: Arc<str>,
    page_size: usize,
    db: Db,
}

type Params = Query<HashMap<String, String>>;

pub fn app(token: &str) -> Router {
    app_with_page_size(token, DEFAULT_PAGE_SIZE)
}

pub fn app_with_page_size(token: &str, page_size: usize) -> Router {
    let state = AppState {
        token: token.into(),
        page_size: page_size.max(1),
        db: Db::default(),
    };
    Router::new()
        .route(
            "/api/v1/contacts.json",
            get(list_contacts).post(write_contact).delete(delete_contacts),
        )
        .route("/api/v1/broadcasts.json", get(list_broadcasts).post(send_broadcast))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Token {}", state.token);
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(expected.as_str()) {
        tracing::info!(uri = %request.uri(), "rejected request with bad token");
        let detail = serde_json::json!({"detail": "Invalid token"});
        return (StatusCode::FORBIDDEN, Json(detail)).into_response();
    }
    tracing::info!(method = %request.method(), uri = %request.uri(), "handling request");
    next.run(request).await
}

/// Slices `items` into the requested page and links the following one.
///
/// The `next` cursor repeats `filters` so it can be followed on its own.
fn paginate<T: Clone>(
    items: &[T],
    params: &HashMap<String, String>,
    filters: &[&str],
    page_size: usize,
    headers: &HeaderMap,
    path: &str,
) -> Result<Page<T>, StatusCode> {
    let page: usize = match params.get("page") {
        Some(raw) => raw.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => 1,
    };
    if page == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let start = (page - 1) * page_size;
    if start > items.len() || (start == items.len() && page > 1) {
        return Err(StatusCode::NOT_FOUND);
    }
    let end = (start + page_size).min(items.len());

    let next = if end < items.len() {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        let mut query = vec![("page", (page + 1).to_string())];
        for name in filters {
            if let Some(value) = params.get(*name) {
                query.push((*name, value.clone()));
            }
        }
        let query = serde_urlencoded::to_string(&query).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Some(format!("http://{host}{path}?{query}"))
    } else {
        None
    };

    Ok(Page { results: items[start..end].to_vec(), next })
}

/// Comma-separated filter values, or `None` when the filter is absent.
fn split(params: &HashMap<String, String>, name: &str) -> Option<Vec<String>> {
    params
        .get(name)
        .map(|raw| raw.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
}

fn matching_contacts(store: &Store, params: &HashMap<String, String>) -> Vec<Contact> {
    let uuids = split(params, "uuid");
    let groups = split(params, "group");
    store
        .contacts
        .iter()
        .filter(|c| uuids.as_ref().is_none_or(|u| u.contains(&c.uuid)))
        .filter(|c| groups.as_ref().is_none_or(|g| c.groups.iter().any(|cg| g.contains(cg))))
        .cloned()
        .collect()
}

async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Page<Contact>>, StatusCode> {
    let store = state.db.read().await;
    let contacts = matching_contacts(&store, &params);
    let page = paginate(
        &contacts,
        &params,
        &["uuid", "group"],
        state.page_size,
        &headers,
        "/api/v1/contacts.json",
    )?;
    Ok(Json(page))
}

async fn write_contact(
    State(state): State<AppState>,
    Json(input): Json<WriteContact>,
) -> Result<(StatusCode, Json<Contact>), StatusCode> {
    let mut store = state.db.write().await;
    if let Some(uuid) = &input.uuid {
        let contact = store
            .contacts
            .iter_mut()
            .find(|c| &c.uuid == uuid)
            .ok_or(StatusCode::BAD_REQUEST)?;
        contact.name = input.name;
        contact.urns = input.urns;
        contact.groups = input.groups;
        contact.fields = input.fields;
        contact.language = input.language;
        return Ok((StatusCode::CREATED, Json(contact.clone())));
    }

    let contact = Contact {
        uuid: Uuid::new_v4().to_string(),
        name: input.name,
        urns: input.urns,
        groups: input.groups,
        fields: input.fields,
        language: input.language,
    };
    store.contacts.push(contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn delete_contacts(
    State(state): State<AppState>,
    Query(params): Params,
) -> Result<StatusCode, StatusCode> {
    let mut store = state.db.write().await;
    let doomed: Vec<String> = matching_contacts(&store, &params).into_iter().map(|c| c.uuid).collect();
    if doomed.is_empty() || params.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    store.contacts.retain(|c| !doomed.contains(&c.uuid));
    Ok(StatusCode::NO_CONTENT)
}

async fn list_broadcasts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Page<Broadcast>>, StatusCode> {
    let ids = split(&params, "id");
    let store = state.db.read().await;
    let broadcasts: Vec<Broadcast> = store
        .broadcasts
        .iter()
        .filter(|b| ids.as_ref().is_none_or(|ids| ids.contains(&b.id.to_string())))
        .cloned()
        .collect();
    let page = paginate(
        &broadcasts,
        &params,
        &["id"],
        state.page_size,
        &headers,
        "/api/v1/broadcasts.json",
    )?;
    Ok(Json(page))
}

async fn send_broadcast(
    State(state): State<AppState>,
    Json(input): Json<SendBroadcast>,
) -> Result<(StatusCode, Json<Broadcast>), StatusCode> {
    if input.urns.is_empty() && input.contacts.is_empty() && input.groups.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut store = state.db.write().await;
    let broadcast = Broadcast {
        id: store.broadcasts.len() as i64 + 1,
        urns: input.urns,
        contacts: input.contacts,
        groups: input.groups,
        text: input.text,
        status: "Q".to_string(),
    };
    store.broadcasts.push(broadcast.clone());
    Ok((StatusCode::CREATED, Json(broadcast)))
}
