//! Test doubles: an in-memory school with the server's rules, exposed both
//! as a `RosterApi` fake and as a real HTTP server.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use shared::{
    domain::{Activity, Roster},
    error::{ApiRejection, ErrorDetail},
    protocol::{AuthStatusResponse, EmailQuery, LoginForm, LoginResponse, MessageResponse},
};
use tokio::{net::TcpListener, sync::broadcast};

use crate::{
    api::{ApiFailure, RosterApi},
    events::UiEvent,
    notifier::DEFAULT_MESSAGE_TTL,
    token_store::TokenStore,
    RosterApp,
};

pub const TEACHER: &str = "mrodriguez";
pub const PASSWORD: &str = "art123";
pub const AUTH_REQUIRED: &str = "Authentication required. Only teachers can perform this action.";

fn activity(name: &str, max_participants: i64, participants: &[&str]) -> Activity {
    Activity {
        name: name.to_string(),
        description: format!("{name} description"),
        schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
        max_participants,
        participants: participants.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn sample_roster() -> Roster {
    [
        activity(
            "Chess Club",
            12,
            &["michael@mergington.edu", "daniel@mergington.edu"],
        ),
        activity(
            "Programming Class",
            20,
            &["emma@mergington.edu", "sophia@mergington.edu"],
        ),
        activity("Drama Club", 20, &[]),
    ]
    .into_iter()
    .collect()
}

struct School {
    roster: Roster,
    teachers: Vec<(String, String)>,
    sessions: HashSet<String>,
    issued: usize,
}

/// Server-side rules: token issuance, status checks, and the duplicate /
/// missing participant checks on mutations.
pub struct SchoolState {
    inner: Mutex<School>,
}

fn rejection(status: u16, detail: &str) -> ApiRejection {
    ApiRejection::new(status, ErrorDetail::new(detail))
}

impl SchoolState {
    pub fn new(roster: Roster) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(School {
                roster,
                teachers: vec![(TEACHER.to_string(), PASSWORD.to_string())],
                sessions: HashSet::new(),
                issued: 0,
            }),
        })
    }

    pub fn seeded() -> Arc<Self> {
        Self::new(sample_roster())
    }

    pub fn roster(&self) -> Roster {
        self.inner.lock().expect("school").roster.clone()
    }

    pub fn set_roster(&self, roster: Roster) {
        self.inner.lock().expect("school").roster = roster;
    }

    pub fn revoke_all(&self) {
        self.inner.lock().expect("school").sessions.clear();
    }

    pub fn honors(&self, token: &str) -> bool {
        self.inner.lock().expect("school").sessions.contains(token)
    }

    pub fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiRejection> {
        let mut school = self.inner.lock().expect("school");
        let known = school
            .teachers
            .iter()
            .any(|(u, p)| *u == form.username && *p == form.password);
        if !known {
            return Err(rejection(401, "Invalid username or password"));
        }
        let token = format!("teacher_{}_{}", form.username, school.issued);
        school.issued += 1;
        school.sessions.insert(token.clone());
        Ok(LoginResponse {
            token,
            username: form.username.clone(),
            message: Some("Login successful".to_string()),
        })
    }

    pub fn status(&self, token: Option<&str>) -> AuthStatusResponse {
        match token.filter(|token| self.honors(token)) {
            Some(token) => AuthStatusResponse {
                authenticated: true,
                username: token.split('_').nth(1).map(str::to_string),
            },
            None => AuthStatusResponse {
                authenticated: false,
                username: None,
            },
        }
    }

    pub fn logout(&self, token: Option<&str>) -> Result<(), ApiRejection> {
        let mut school = self.inner.lock().expect("school");
        match token {
            Some(token) if school.sessions.remove(token) => Ok(()),
            _ => Err(rejection(401, "Not authenticated")),
        }
    }

    pub fn signup(
        &self,
        name: &str,
        email: &str,
        token: Option<&str>,
    ) -> Result<MessageResponse, ApiRejection> {
        let mut school = self.inner.lock().expect("school");
        if !token.is_some_and(|token| school.sessions.contains(token)) {
            return Err(rejection(401, AUTH_REQUIRED));
        }
        let activity = school
            .roster
            .get_mut(name)
            .ok_or_else(|| rejection(404, "Activity not found"))?;
        if activity.participants.iter().any(|p| p == email) {
            return Err(rejection(400, "Student is already signed up"));
        }
        activity.participants.push(email.to_string());
        Ok(MessageResponse {
            message: format!("Signed up {email} for {name}"),
        })
    }

    pub fn unregister(
        &self,
        name: &str,
        email: &str,
        token: Option<&str>,
    ) -> Result<MessageResponse, ApiRejection> {
        let mut school = self.inner.lock().expect("school");
        if !token.is_some_and(|token| school.sessions.contains(token)) {
            return Err(rejection(401, AUTH_REQUIRED));
        }
        let activity = school
            .roster
            .get_mut(name)
            .ok_or_else(|| rejection(404, "Activity not found"))?;
        let Some(position) = activity.participants.iter().position(|p| p == email) else {
            return Err(rejection(400, "Student is not signed up for this activity"));
        };
        activity.participants.remove(position);
        Ok(MessageResponse {
            message: format!("Unregistered {email} from {name}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchActivities,
    AuthStatus { token: String },
    Login { username: String },
    Logout { token: String },
    Signup { activity: String, email: String },
    Unregister { activity: String, email: String },
}

/// `RosterApi` backed directly by a `SchoolState`, recording every call.
pub struct FakeServer {
    pub school: Arc<SchoolState>,
    calls: Mutex<Vec<ApiCall>>,
    offline: AtomicBool,
    garbled_roster: AtomicBool,
    auth_status_reply: Mutex<Option<Result<AuthStatusResponse, ApiFailure>>>,
}

impl FakeServer {
    pub fn new(school: Arc<SchoolState>) -> Arc<Self> {
        Arc::new(Self {
            school,
            calls: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            garbled_roster: AtomicBool::new(false),
            auth_status_reply: Mutex::new(None),
        })
    }

    pub fn seeded() -> Arc<Self> {
        Self::new(SchoolState::seeded())
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls").clear();
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_garbled_roster(&self, garbled: bool) {
        self.garbled_roster.store(garbled, Ordering::SeqCst);
    }

    /// Answers every status check with `reply` instead of consulting the school.
    pub fn set_auth_status_reply(&self, reply: Result<AuthStatusResponse, ApiFailure>) {
        *self.auth_status_reply.lock().expect("reply") = Some(reply);
    }

    fn record(&self, call: ApiCall) -> Result<(), ApiFailure> {
        self.calls.lock().expect("calls").push(call);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiFailure::Transport(
                "error sending request: connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterApi for FakeServer {
    async fn fetch_activities(&self) -> Result<Roster, ApiFailure> {
        self.record(ApiCall::FetchActivities)?;
        if self.garbled_roster.load(Ordering::SeqCst) {
            return Err(ApiFailure::Decode("expected value at line 1".to_string()));
        }
        Ok(self.school.roster())
    }

    async fn auth_status(&self, token: &str) -> Result<AuthStatusResponse, ApiFailure> {
        self.record(ApiCall::AuthStatus {
            token: token.to_string(),
        })?;
        let canned = self.auth_status_reply.lock().expect("reply").clone();
        if let Some(reply) = canned {
            return reply;
        }
        Ok(self.school.status(Some(token)))
    }

    async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiFailure> {
        self.record(ApiCall::Login {
            username: form.username.clone(),
        })?;
        Ok(self.school.login(form)?)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiFailure> {
        self.record(ApiCall::Logout {
            token: token.to_string(),
        })?;
        Ok(self.school.logout(Some(token))?)
    }

    async fn signup(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure> {
        self.record(ApiCall::Signup {
            activity: activity.to_string(),
            email: email.to_string(),
        })?;
        Ok(self.school.signup(activity, email, Some(token))?)
    }

    async fn unregister(
        &self,
        activity: &str,
        email: &str,
        token: &str,
    ) -> Result<MessageResponse, ApiFailure> {
        self.record(ApiCall::Unregister {
            activity: activity.to_string(),
            email: email.to_string(),
        })?;
        Ok(self.school.unregister(activity, email, Some(token))?)
    }
}

pub fn app_with(api: Arc<FakeServer>, store: Arc<dyn TokenStore>) -> RosterApp {
    RosterApp::new(api, store, DEFAULT_MESSAGE_TTL)
}

pub fn drain_events(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub method: &'static str,
    pub route: &'static str,
    pub activity: Option<String>,
    pub email: Option<String>,
    pub bearer: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct MockServer {
    pub school: Arc<SchoolState>,
    hits: Arc<Mutex<Vec<Hit>>>,
    garbled_roster: Arc<AtomicBool>,
    auth_status_body: Arc<Mutex<Option<(StatusCode, &'static str)>>>,
}

impl MockServer {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hits").clone()
    }

    pub fn set_garbled_roster(&self, garbled: bool) {
        self.garbled_roster.store(garbled, Ordering::SeqCst);
    }

    /// Serves `body` verbatim with `status` from `/auth/status`.
    pub fn set_auth_status_body(&self, status: StatusCode, body: &'static str) {
        *self.auth_status_body.lock().expect("status body") = Some((status, body));
    }

    fn record(
        &self,
        method: &'static str,
        route: &'static str,
        headers: &HeaderMap,
        activity: Option<String>,
        email: Option<String>,
    ) -> Option<String> {
        let bearer = bearer(headers);
        self.hits.lock().expect("hits").push(Hit {
            method,
            route,
            activity,
            email,
            bearer: bearer.clone(),
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        });
        bearer
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

type Rejection = (StatusCode, Json<ErrorDetail>);

fn reject(rejection: ApiRejection) -> Rejection {
    (
        StatusCode::from_u16(rejection.status).expect("status"),
        Json(ErrorDetail {
            detail: rejection.detail,
        }),
    )
}

async fn handle_activities(State(server): State<MockServer>, headers: HeaderMap) -> Response {
    server.record("GET", "/activities", &headers, None, None);
    if server.garbled_roster.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    Json(server.school.roster()).into_response()
}

async fn handle_auth_status(State(server): State<MockServer>, headers: HeaderMap) -> Response {
    let token = server.record("GET", "/auth/status", &headers, None, None);
    let canned = *server.auth_status_body.lock().expect("status body");
    if let Some((status, body)) = canned {
        return (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response();
    }
    Json(server.school.status(token.as_deref())).into_response()
}

async fn handle_login(
    State(server): State<MockServer>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, Rejection> {
    server.record("POST", "/login", &headers, None, None);
    server.school.login(&form).map(Json).map_err(reject)
}

async fn handle_logout(
    State(server): State<MockServer>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, Rejection> {
    let token = server.record("POST", "/logout", &headers, None, None);
    server
        .school
        .logout(token.as_deref())
        .map(|()| {
            Json(MessageResponse {
                message: "Logout successful".to_string(),
            })
        })
        .map_err(reject)
}

async fn handle_signup(
    State(server): State<MockServer>,
    Path(name): Path<String>,
    Query(query): Query<EmailQuery>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, Rejection> {
    let token = server.record(
        "POST",
        "/activities/{name}/signup",
        &headers,
        Some(name.clone()),
        Some(query.email.clone()),
    );
    server
        .school
        .signup(&name, &query.email, token.as_deref())
        .map(Json)
        .map_err(reject)
}

async fn handle_unregister(
    State(server): State<MockServer>,
    Path(name): Path<String>,
    Query(query): Query<EmailQuery>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, Rejection> {
    let token = server.record(
        "DELETE",
        "/activities/{name}/unregister",
        &headers,
        Some(name.clone()),
        Some(query.email.clone()),
    );
    server
        .school
        .unregister(&name, &query.email, token.as_deref())
        .map(Json)
        .map_err(reject)
}

pub async fn spawn_roster_server(school: Arc<SchoolState>) -> (String, MockServer) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = MockServer {
        school,
        hits: Arc::new(Mutex::new(Vec::new())),
        garbled_roster: Arc::new(AtomicBool::new(false)),
        auth_status_body: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .route("/activities", get(handle_activities))
        .route("/auth/status", get(handle_auth_status))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/activities/:name/signup", post(handle_signup))
        .route("/activities/:name/unregister", delete(handle_unregister))
        .with_state(server.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), server)
}

/// A loopback address nothing is listening on.
pub async fn unreachable_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
