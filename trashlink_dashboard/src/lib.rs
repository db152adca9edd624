use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::{broadcast, watch};
use trashlink::core_modules::utils::image_helper::image_helper::DEFAULT_JPEG_QUALITY;
use trashlink::dashboard::FillStatus;
use trashlink::{FrameFormat, StatusReport};

pub mod actor;

pub use actor::{BinHandle, spawn_bin_actor};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
const DEFAULT_FRAME_DELAY_MS: u64 = 10;

/// Shown once after the bins are emptied.
pub const RESET_NOTICE: &str = "Bins emptied successfully!";

#[derive(Debug, Clone)]
pub struct FramePacket {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data: Arc<[u8]>,
}

/// Status text and levels for the page chrome, sent alongside frames.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "web", derive(serde::Serialize, serde::Deserialize))]
pub struct Meta {
    pub biomedical_level: u8,
    pub general_level: u8,
    pub biomedical_status: FillStatus,
    pub general_status: FillStatus,
    pub biomedical_message: Option<String>,
    pub general_message: Option<String>,
    pub warning_light: bool,
    pub animating: bool,
    pub notice: Option<String>,
}

impl Meta {
    pub fn from_status(status: &StatusReport, animating: bool) -> Self {
        Self {
            biomedical_level: status.biomedical.level,
            general_level: status.general.level,
            biomedical_status: status.biomedical.status,
            general_status: status.general.status,
            biomedical_message: status.biomedical.message.clone(),
            general_message: status.general.message.clone(),
            warning_light: status.warning_light,
            animating,
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: &str) -> Self {
        self.notice = Some(notice.to_string());
        self
    }
}

/// Frame and meta fan-out. The broadcast channels do not replay, so the last
/// published frame is also kept for viewers that join between updates.
#[derive(Clone)]
pub struct FrameBus {
    pub frames_tx: broadcast::Sender<FramePacket>,
    pub meta_tx: broadcast::Sender<Meta>,
    latest_frame: Arc<watch::Sender<Option<FramePacket>>>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = broadcast::channel::<FramePacket>(capacity.max(1));
        let (meta_tx, _) = broadcast::channel::<Meta>(capacity.max(1));
        let (latest_frame, _) = watch::channel(None);
        Self {
            frames_tx,
            meta_tx,
            latest_frame: Arc::new(latest_frame),
        }
    }

    /// Sends `packet` to current subscribers and remembers it for late ones.
    pub fn publish_frame(&self, packet: FramePacket) {
        self.latest_frame.send_replace(Some(packet.clone()));
        // No subscribers is fine: nobody is watching yet.
        let _ = self.frames_tx.send(packet);
    }

    /// The most recently published frame, if any.
    pub fn latest_frame(&self) -> Option<FramePacket> {
        self.latest_frame.borrow().clone()
    }
}

/// Pacing and encoding of published frames.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    pub frame_delay: Duration,
    pub jpeg_quality: u8,
    pub format: FrameFormat,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(DEFAULT_FRAME_DELAY_MS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            format: FrameFormat::Jpeg,
        }
    }
}

impl ActorConfig {
    /// Reads `TL_FRAME_DELAY_MS` and `TL_JPEG_QUALITY`, keeping defaults for unset
    /// or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            frame_delay: read_setting("TL_FRAME_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.frame_delay),
            jpeg_quality: read_setting::<u8>("TL_JPEG_QUALITY")
                .filter(|q| (1..=100).contains(q))
                .unwrap_or(defaults.jpeg_quality),
            format: defaults.format,
        }
    }
}

fn read_setting<T: std::str::FromStr>(name: &str) -> Option<T> {
    parse_setting(name, std::env::var(name).ok())
}

fn parse_setting<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("TL_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}

#[cfg(feature = "web")]
pub async fn start_server(
    handle: BinHandle,
    bus: FrameBus,
    cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::{Html, IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use futures_util::{SinkExt, StreamExt};
    use log::{debug, error, info};
    use tokio::sync::broadcast::error::RecvError;
    use trashlink::WasteKind;

    // Dashboard page: two drop buttons, reset, fill bars and the streamed bin image.
    const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>TrashLink</title>
<style>
  body { font-family: sans-serif; display: flex; flex-direction: column; align-items: center; }
  main { display: flex; gap: 32px; }
  button { width: 100%; border-radius: 10px; height: 3em; margin: 6px 0; background: #4CAF50; color: white; border: 0; }
  button:disabled { background: #9e9e9e; }
  .bar { width: 260px; height: 14px; background: #eee; border-radius: 7px; overflow: hidden; }
  .fill { height: 100%; width: 0%; background: linear-gradient(to right, #ff6b6b, #ff8787); }
  .warning { color: #b26a00; } .alert { color: #c62828; font-weight: bold; }
  .notice { color: #2e7d32; }
</style>
</head>
<body>
<h1>TrashLink</h1>
<main>
  <canvas id="bin" width="400" height="500"></canvas>
  <section>
    <h3>Waste Disposal Controls</h3>
    <button data-kind="biomedical">Throw Biomedical Waste</button>
    <button data-kind="general">Throw General Waste</button>
    <h3>Bin Levels</h3>
    <p><b>Biomedical Waste Compartment</b></p>
    <div class="bar"><div class="fill" id="fill-biomedical"></div></div>
    <p id="msg-biomedical"></p>
    <p><b>General Waste Compartment</b></p>
    <div class="bar"><div class="fill" id="fill-general"></div></div>
    <p id="msg-general"></p>
    <button id="reset">Reset Bins</button>
    <p id="notice" class="notice"></p>
  </section>
</main>
<script>
(function(){
  const ctx = document.getElementById('bin').getContext('2d');
  const buttons = document.querySelectorAll('button');
  const show = (kind, level, status, message) => {
    document.getElementById('fill-' + kind).style.width = level + '%';
    const msg = document.getElementById('msg-' + kind);
    msg.className = status;
    msg.textContent = message || '';
  };
  document.querySelectorAll('button[data-kind]').forEach(b => {
    b.onclick = () => fetch('/control/drop/' + b.dataset.kind, { method: 'POST' });
  });
  document.getElementById('reset').onclick = () => fetch('/control/reset', { method: 'POST' });
  const ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/ws/frames');
  ws.binaryType = 'arraybuffer';
  ws.onmessage = async (ev) => {
    if (ev.data instanceof ArrayBuffer) {
      const bmp = await createImageBitmap(new Blob([ev.data], { type: 'image/jpeg' }));
      ctx.drawImage(bmp, 0, 0);
      return;
    }
    const meta = JSON.parse(ev.data);
    show('biomedical', meta.biomedical_level, meta.biomedical_status, meta.biomedical_message);
    show('general', meta.general_level, meta.general_status, meta.general_message);
    document.getElementById('notice').textContent = meta.notice || '';
    buttons.forEach(b => b.disabled = meta.animating);
  };
})();
</script>
</body>
</html>"#;

    #[derive(Clone)]
    struct AppState {
        handle: BinHandle,
        bus: FrameBus,
    }

    fn actor_failure(e: anyhow::Error) -> Response {
        error!("bin actor request failed: {e}");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
    }

    async fn status(State(state): State<AppState>) -> Response {
        match state.handle.status().await {
            Ok(report) => Json(report).into_response(),
            Err(e) => actor_failure(e),
        }
    }

    async fn drop_waste(State(state): State<AppState>, Path(kind): Path<String>) -> Response {
        let kind = match kind.parse::<WasteKind>() {
            Ok(kind) => kind,
            Err(e) => {
                warn!("rejected drop: {e}");
                return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
            }
        };
        match state.handle.drop_waste(kind).await {
            Ok(report) => Json(report).into_response(),
            Err(e) => actor_failure(e),
        }
    }

    async fn reset(State(state): State<AppState>) -> Response {
        match state.handle.reset().await {
            Ok(report) => Json(report).into_response(),
            Err(e) => actor_failure(e),
        }
    }

    async fn frames_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
        ws.on_upgrade(move |socket| stream_frames(socket, state))
    }

    async fn stream_frames(socket: WebSocket, state: AppState) {
        let mut frames = state.bus.frames_tx.subscribe();
        let mut meta = state.bus.meta_tx.subscribe();
        let (mut tx, mut rx) = socket.split();

        // Late joiners start from the last frame on screen and the committed bin.
        if let Some(packet) = state.bus.latest_frame() {
            if tx.send(Message::Binary(packet.data.to_vec())).await.is_err() {
                return;
            }
        }
        if let Ok(report) = state.handle.status().await {
            if let Ok(text) = serde_json::to_string(&Meta::from_status(&report, false)) {
                if tx.send(Message::Text(text)).await.is_err() {
                    return;
                }
            }
        }

        loop {
            tokio::select! {
                packet = frames.recv() => match packet {
                    Ok(packet) => {
                        if tx.send(Message::Binary(packet.data.to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => debug!("viewer lagged by {skipped} frames"),
                    Err(RecvError::Closed) => break,
                },
                update = meta.recv() => match update {
                    Ok(update) => {
                        let Ok(text) = serde_json::to_string(&update) else { continue };
                        if tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                incoming = rx.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                },
            }
        }
        debug!("viewer disconnected");
    }

    let app = Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/control/drop/:kind", post(drop_waste))
        .route("/control/reset", post(reset))
        .route("/ws/frames", get(frames_ws))
        .with_state(AppState { handle, bus });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!("dashboard listening on http://{}", cfg.bind_addr);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("dashboard server stopped: {e}");
        }
    });

    Ok(server)
}

#[cfg(not(feature = "web"))]
pub async fn start_server(
    _handle: BinHandle,
    _bus: FrameBus,
    _cfg: ServerConfig,
) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    Err(anyhow::anyhow!("web feature not enabled for trashlink_dashboard"))
}
