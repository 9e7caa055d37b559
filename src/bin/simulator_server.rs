use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use clap::Parser;
use path_simulator::common::Direction;
use path_simulator::config::SimulatorConfig;
use path_simulator::grid::{render_svg, SvgStyle};
use path_simulator::planner::{Planner, ReplayPlanner};
use path_simulator::runtime::{RuntimeError, SimulatorHandle};
use path_simulator::scenarios::ScenarioId;
use path_simulator::session::{Notification, SessionError, SessionEvent, SessionView};
use path_simulator::Simulator;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

const NOTICE_HISTORY: usize = 64;

/// Serve the path simulator visualizer over HTTP
#[derive(Parser, Debug)]
#[command(name = "simulator_server")]
#[command(about = "Web visualizer for the path simulator", long_about = None)]
struct Cli {
    /// Replay a saved planner response instead of calling the service
    #[arg(long)]
    replay: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState {
    sim: SimulatorHandle,
    notices: Arc<Mutex<NoticeLog>>,
}

#[derive(Default)]
struct NoticeLog {
    next_seq: u64,
    items: VecDeque<Notice>,
}

impl NoticeLog {
    fn push(&mut self, notification: Notification) {
        self.next_seq += 1;
        self.items.push_back(Notice {
            seq: self.next_seq,
            notification,
        });
        if self.items.len() > NOTICE_HISTORY {
            self.items.pop_front();
        }
    }

    /// Notices newer than `after`, oldest first
    fn since(&self, after: u64) -> Vec<Notice> {
        self.items
            .iter()
            .filter(|n| n.seq > after)
            .cloned()
            .collect()
    }
}

#[derive(Clone, Serialize)]
struct Notice {
    seq: u64,
    #[serde(flatten)]
    notification: Notification,
}

#[derive(Deserialize)]
struct NoticeQuery {
    #[serde(default)]
    after: u64,
}

struct ApiError(RuntimeError);

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &RuntimeError) -> StatusCode {
    match err {
        RuntimeError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        RuntimeError::Session(SessionError::ReadOnlyScenario(_)) => StatusCode::FORBIDDEN,
        RuntimeError::Session(SessionError::Busy | SessionError::NoPendingRun) => {
            StatusCode::CONFLICT
        }
        RuntimeError::Session(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status_for(&self.0), Json(body)).into_response()
    }
}

type ApiResult = Result<Json<SessionView>, ApiError>;

async fn apply(state: &AppState, event: SessionEvent) -> ApiResult {
    state.sim.send(event).await?;
    Ok(Json(state.sim.view()))
}

async fn get_state(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.sim.view())
}

async fn get_svg(State(state): State<AppState>) -> impl IntoResponse {
    let svg = render_svg(&state.sim.view().grid, &SvgStyle::default());
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}

async fn get_scenarios() -> Json<Vec<&'static str>> {
    Json(ScenarioId::ALL.iter().map(|id| id.name()).collect())
}

async fn get_notices(
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Json<Vec<Notice>> {
    Json(state.notices.lock().await.since(query.after))
}

async fn planner_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.sim.planner_status().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

async fn run(State(state): State<AppState>) -> ApiResult {
    apply(&state, SessionEvent::RunRequested).await
}

fn control(event: SessionEvent) -> MethodRouter<AppState> {
    post(move |State(state): State<AppState>| {
        let event = event.clone();
        async move { apply(&state, event).await }
    })
}

async fn scrub(State(state): State<AppState>, Path(step): Path<usize>) -> ApiResult {
    apply(&state, SessionEvent::ScrubTo(step)).await
}

async fn select_scenario(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match name.parse::<ScenarioId>() {
        Ok(id) => apply(&state, SessionEvent::SelectScenario(id))
            .await
            .into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

async fn click_cell(State(state): State<AppState>, Path((x, y)): Path<(i32, i32)>) -> ApiResult {
    apply(&state, SessionEvent::CellClicked { x, y }).await
}

async fn set_start(
    State(state): State<AppState>,
    Path((x, y, d)): Path<(i32, i32, String)>,
) -> Response {
    match Direction::parse(&d) {
        Ok(d) => apply(&state, SessionEvent::SetStartPose { x, y, d })
            .await
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// Keep the latest notifications so polling pages can show them as toasts.
fn spawn_notice_log(mut rx: broadcast::Receiver<Notification>, log: Arc<Mutex<NoticeLog>>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => log.lock().await.push(notification),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("path_simulator=info".parse()?)
                .add_directive("simulator_server=info".parse()?),
        )
        .init();

    let config = SimulatorConfig::from_env()?;
    let simulator = Simulator::new(config)?;

    let planner: Arc<dyn Planner> = match &args.replay {
        Some(path) => Arc::new(ReplayPlanner::from_file(path)?),
        None => Arc::new(simulator.http_planner()?),
    };

    let sim = simulator.start(planner);
    let notices = Arc::new(Mutex::new(NoticeLog::default()));
    spawn_notice_log(sim.notifications(), notices.clone());
    let state = AppState { sim, notices };

    let app = Router::new()
        .route("/", get(|| async { Html(PAGE) }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/planner/status", get(planner_status))
        .route("/state", get(get_state))
        .route("/grid.svg", get(get_svg))
        .route("/scenarios", get(get_scenarios))
        .route("/notifications", get(get_notices))
        .route("/run", post(run))
        .route("/control/play", control(SessionEvent::Play))
        .route("/control/pause", control(SessionEvent::Pause))
        .route("/control/next", control(SessionEvent::StepForward))
        .route("/control/prev", control(SessionEvent::StepBack))
        .route("/control/release", control(SessionEvent::ReleaseScrub))
        .route("/control/scrub/:step", post(scrub))
        .route("/scenario/:name", post(select_scenario))
        .route("/cells/:x/:y", post(click_cell))
        .route("/start/:x/:y/:d", post(set_start))
        .with_state(state);

    let bind_addr = simulator.config().server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(
        "Simulator listening on http://{} (planner {})",
        bind_addr,
        simulator.config().planner.base_url
    );
    axum::serve(listener, app).await?;
    Ok(())
}

const PAGE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Path Simulator</title>
<style>
  body { font-family: sans-serif; margin: 16px; }
  .row { display: flex; gap: 8px; align-items: center; margin: 8px 0; }
  #status { font-family: monospace; font-size: 13px; color: #444; }
  #toasts { position: fixed; top: 12px; right: 12px; width: 320px; }
  .toast { padding: 8px 12px; margin-bottom: 6px; border-radius: 4px; color: #fff; }
  .success, .scan { background: #15803d; } .error { background: #b91c1c; } .warning { background: #b45309; }
  rect[data-action] { cursor: pointer; }
</style>
</head>
<body>
<h2>Path Simulator</h2>
<div class="row">
  <select id="scenario"></select>
  start x <input id="sx" type="number" min="0" value="1" style="width:4em">
  y <input id="sy" type="number" min="0" value="1" style="width:4em">
  <select id="sd"><option>N</option><option>E</option><option>S</option><option>W</option></select>
  <button id="set-start">Set start</button>
  <button id="run">Run algorithm</button>
</div>
<div class="row">
  <button data-control="prev">Prev</button>
  <button data-control="play">Play</button>
  <button data-control="pause">Pause</button>
  <button data-control="next">Next</button>
  <input id="slider" type="range" min="0" value="0" style="width:300px">
</div>
<div id="status">loading</div>
<div id="grid"></div>
<div id="toasts"></div>
<script>
(function(){
  let lastNotice = 0;
  const post = (url) => fetch(url, { method: 'POST' }).then(async (r) => {
    if (!r.ok) { const body = await r.json().catch(() => ({ error: r.statusText })); toast('error', body.error); }
    refresh();
  });
  const toast = (level, message) => {
    const el = document.createElement('div');
    el.className = 'toast ' + level;
    el.textContent = message;
    document.getElementById('toasts').appendChild(el);
    setTimeout(() => el.remove(), 3000);
  };
  const scenario = document.getElementById('scenario');
  fetch('/scenarios').then(r => r.json()).then(names => {
    for (const name of names) { const o = document.createElement('option'); o.textContent = name; scenario.appendChild(o); }
  });
  scenario.onchange = () => post('/scenario/' + encodeURIComponent(scenario.value));
  document.getElementById('run').onclick = () => post('/run');
  document.getElementById('set-start').onclick = () => post('/start/' + document.getElementById('sx').value + '/' + document.getElementById('sy').value + '/' + document.getElementById('sd').value);
  for (const b of document.querySelectorAll('[data-control]')) { b.onclick = () => post('/control/' + b.dataset.control); }
  const slider = document.getElementById('slider');
  slider.oninput = () => post('/control/scrub/' + slider.value);
  slider.onchange = () => post('/control/release');
  document.getElementById('grid').onclick = (ev) => {
    const cell = ev.target.closest('rect[data-action]');
    if (cell) post('/cells/' + cell.dataset.x + '/' + cell.dataset.y);
  };
  async function refresh() {
    const view = await fetch('/state').then(r => r.json());
    const step = view.step === null ? 'no path' : 'step ' + (view.step + 1) + '/' + view.total_steps;
    let line = view.scenario + ' | ' + view.state + ' | ' + step + ' | pose (' + view.pose.x + ', ' + view.pose.y + ')';
    if (view.cost !== null) line += ' | cost ' + view.cost.toFixed(2) + ' in ' + view.runtime.toFixed(3) + 's';
    if (view.annotation) line += ' | ' + view.annotation;
    document.getElementById('status').textContent = line;
    slider.max = Math.max(view.total_steps - 1, 0);
    if (view.step !== null && view.state !== 'scrubbing') slider.value = view.step;
    slider.disabled = view.state === 'playing' || view.step === null;
    if (scenario.value !== view.scenario) scenario.value = view.scenario;
    document.getElementById('grid').innerHTML = await fetch('/grid.svg').then(r => r.text());
    const notices = await fetch('/notifications?after=' + lastNotice).then(r => r.json());
    for (const n of notices) { toast(n.level, n.message); lastNotice = n.seq; }
  }
  setInterval(refresh, 150);
  refresh();
})();
</script>
</body>
</html>
"#;
