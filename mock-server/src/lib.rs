use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

/// Largest page the API hands out.
pub const MAX_LIMIT: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Workspace {
    pub gid: String,
    pub name: String,
    pub is_organization: bool,
    #[serde(default)]
    pub email_domains: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub gid: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Compact {
    pub gid: String,
    pub resource_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Story {
    pub gid: String,
    pub resource_subtype: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_text: String,
    #[serde(default)]
    pub is_pinned: bool,
    pub target: Compact,
    /// Subtype-specific fields, e.g. `old_name` / `new_name`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    fn is_comment(&self) -> bool {
        self.resource_subtype == "comment_added"
    }

    fn is_pinnable(&self) -> bool {
        self.is_comment() || self.resource_subtype == "attachment_added"
    }
}

#[derive(Deserialize)]
pub struct StoryInput {
    pub text: Option<String>,
    pub html_text: Option<String>,
    pub is_pinned: Option<bool>,
}

/// `{"data": ...}` wrapper used for request and response bodies.
#[derive(Debug, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NextPage {
    pub offset: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_page: Option<NextPage>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<String>,
}

/// Error response in the API's `{"errors": [{"message": ...}]}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{what}: Not Found"),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"errors": [{"message": self.message}]}))).into_response()
    }
}

/// In-memory state. Gids are sequential numeric strings; collections keep
/// insertion order so pages are stable.
#[derive(Debug, Default)]
pub struct Store {
    next_gid: u64,
    workspaces: Vec<Workspace>,
    tasks: HashMap<String, Task>,
    stories: Vec<Story>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            next_gid: 1000,
            ..Self::default()
        }
    }

    /// Demo data for the standalone binary: enough workspaces to span
    /// several pages and one task with a short history.
    pub fn demo() -> Self {
        let mut store = Self::new();
        for i in 1..=250 {
            store.add_workspace(&format!("Workspace {i}"), i % 10 == 0);
        }
        let task = store.add_task("Ship the client");
        store.add_story(&task, "name_changed", json!({"old_name": "Draft", "new_name": "Ship the client"}));
        store.add_story(&task, "marked_complete", json!({}));
        store
    }

    fn gid(&mut self) -> String {
        self.next_gid += 1;
        self.next_gid.to_string()
    }

    pub fn add_workspace(&mut self, name: &str, is_organization: bool) -> String {
        let gid = self.gid();
        self.workspaces.push(Workspace {
            gid: gid.clone(),
            name: name.to_string(),
            is_organization,
            email_domains: if is_organization {
                vec![format!("{}.test", name.to_lowercase().replace(' ', "-"))]
            } else {
                Vec::new()
            },
        });
        gid
    }

    pub fn add_task(&mut self, name: &str) -> String {
        let gid = self.gid();
        self.tasks.insert(
            gid.clone(),
            Task {
                gid: gid.clone(),
                name: name.to_string(),
                completed: false,
            },
        );
        gid
    }

    /// Append a system story. `fields` must be a JSON object of the
    /// subtype-specific fields.
    pub fn add_story(&mut self, task_gid: &str, resource_subtype: &str, fields: Value) -> String {
        let gid = self.gid();
        let extra = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.stories.push(Story {
            gid: gid.clone(),
            resource_subtype: resource_subtype.to_string(),
            text: String::new(),
            html_text: String::new(),
            is_pinned: false,
            target: Compact {
                gid: task_gid.to_string(),
                resource_type: "task".to_string(),
            },
            extra,
        });
        gid
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::new())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/workspaces", get(list_workspaces))
        .route("/workspaces/{gid}", get(get_workspace))
        .route("/tasks/{gid}", get(get_task))
        .route("/tasks/{gid}/stories", get(list_stories).post(create_story))
        .route("/stories/{gid}", get(get_story).put(update_story).delete(delete_story))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::new()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

/// Slice one page out of `items`. Without a `limit` the whole remainder is
/// returned and there is no next page.
fn paginate<T: Clone>(items: &[T], params: &PageParams, path: &str) -> Result<Page<T>, ApiFailure> {
    let start = match params.offset.as_deref() {
        None | Some("") => 0,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|start| *start <= items.len())
            .ok_or_else(|| ApiFailure::bad_request("offset: Your pagination token is invalid."))?,
    };

    let Some(limit) = params.limit else {
        return Ok(Page {
            data: items[start..].to_vec(),
            next_page: None,
        });
    };
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ApiFailure::bad_request("limit: Must be between 1 and 100"));
    }

    let end = (start + limit).min(items.len());
    let next_page = (end < items.len()).then(|| NextPage {
        offset: end.to_string(),
        path: format!("{path}?limit={limit}&offset={end}"),
    });
    Ok(Page {
        data: items[start..end].to_vec(),
        next_page,
    })
}

async fn list_workspaces(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Workspace>>, ApiFailure> {
    let store = db.read().await;
    paginate(&store.workspaces, &params, "/workspaces").map(Json)
}

async fn get_workspace(
    State(db): State<Db>,
    Path(gid): Path<String>,
) -> Result<Json<Data<Workspace>>, ApiFailure> {
    let store = db.read().await;
    store
        .workspaces
        .iter()
        .find(|w| w.gid == gid)
        .cloned()
        .map(|data| Json(Data { data }))
        .ok_or_else(|| ApiFailure::not_found("workspace"))
}

async fn get_task(State(db): State<Db>, Path(gid): Path<String>) -> Result<Json<Data<Task>>, ApiFailure> {
    let store = db.read().await;
    store
        .tasks
        .get(&gid)
        .cloned()
        .map(|data| Json(Data { data }))
        .ok_or_else(|| ApiFailure::not_found("task"))
}

async fn list_stories(
    State(db): State<Db>,
    Path(task_gid): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Story>>, ApiFailure> {
    let store = db.read().await;
    if !store.tasks.contains_key(&task_gid) {
        return Err(ApiFailure::not_found("task"));
    }
    let stories: Vec<Story> = store
        .stories
        .iter()
        .filter(|s| s.target.gid == task_gid)
        .cloned()
        .collect();
    paginate(&stories, &params, &format!("/tasks/{task_gid}/stories")).map(Json)
}

async fn create_story(
    State(db): State<Db>,
    Path(task_gid): Path<String>,
    Json(input): Json<Data<StoryInput>>,
) -> Result<(StatusCode, Json<Data<Story>>), ApiFailure> {
    let input = input.data;
    let text = input.text.unwrap_or_default();
    let html_text = input.html_text.unwrap_or_default();
    if text.is_empty() && html_text.is_empty() {
        return Err(ApiFailure::bad_request("text: Missing input"));
    }
    if !text.is_empty() && !html_text.is_empty() {
        return Err(ApiFailure::bad_request("Only one of text and html_text may be given"));
    }

    let mut store = db.write().await;
    if !store.tasks.contains_key(&task_gid) {
        return Err(ApiFailure::not_found("task"));
    }
    let gid = store.gid();
    let story = Story {
        gid: gid.clone(),
        resource_subtype: "comment_added".to_string(),
        text,
        html_text,
        is_pinned: input.is_pinned.unwrap_or(false),
        target: Compact {
            gid: task_gid.clone(),
            resource_type: "task".to_string(),
        },
        extra: Map::new(),
    };
    store.stories.push(story.clone());
    info!(task = %task_gid, story = %gid, "comment created");
    Ok((StatusCode::CREATED, Json(Data { data: story })))
}

async fn get_story(State(db): State<Db>, Path(gid): Path<String>) -> Result<Json<Data<Story>>, ApiFailure> {
    let store = db.read().await;
    store
        .stories
        .iter()
        .find(|s| s.gid == gid)
        .cloned()
        .map(|data| Json(Data { data }))
        .ok_or_else(|| ApiFailure::not_found("story"))
}

async fn update_story(
    State(db): State<Db>,
    Path(gid): Path<String>,
    Json(input): Json<Data<StoryInput>>,
) -> Result<Json<Data<Story>>, ApiFailure> {
    let input = input.data;
    let mut store = db.write().await;
    let story = store
        .stories
        .iter_mut()
        .find(|s| s.gid == gid)
        .ok_or_else(|| ApiFailure::not_found("story"))?;

    if input.text.is_some() && input.html_text.is_some() {
        return Err(ApiFailure::bad_request("Only one of text and html_text may be given"));
    }
    if (input.text.is_some() || input.html_text.is_some()) && !story.is_comment() {
        return Err(ApiFailure::bad_request("Only comment stories can be edited"));
    }
    if input.is_pinned.is_some() && !story.is_pinnable() {
        return Err(ApiFailure::bad_request("Only comment and attachment stories can be pinned"));
    }

    if let Some(text) = input.text {
        story.text = text;
        story.html_text.clear();
        story.extra.insert("is_edited".to_string(), Value::Bool(true));
    }
    if let Some(html_text) = input.html_text {
        story.html_text = html_text;
        story.text.clear();
        story.extra.insert("is_edited".to_string(), Value::Bool(true));
    }
    if let Some(is_pinned) = input.is_pinned {
        story.is_pinned = is_pinned;
    }
    info!(story = %gid, "story updated");
    Ok(Json(Data { data: story.clone() }))
}

async fn delete_story(State(db): State<Db>, Path(gid): Path<String>) -> Result<Json<Value>, ApiFailure> {
    let mut store = db.write().await;
    let index = store
        .stories
        .iter()
        .position(|s| s.gid == gid)
        .ok_or_else(|| ApiFailure::not_found("story"))?;
    store.stories.remove(index);
    info!(story = %gid, "story deleted");
    Ok(Json(json!({"data": {}})))
}
