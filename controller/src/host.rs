use std::{
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{info, warn};

use led_monitor_common::{
    dispatch, LedController, LightConfig, OutputError, QueryParams, Reply, Rgb, RgbOutput, Route,
    SettingsStore, StatusSlot, StorageError, StorageVolume,
};

const STATUS_POLL_MS: u64 = 250;

type HostController = LedController<SimulatedPwm, FileVolume>;

#[derive(Clone)]
struct AppState {
    controller: Arc<Mutex<HostController>>,
    status: StatusSlot,
}

struct SimulatedPwm {
    last: Rgb,
}

impl RgbOutput for SimulatedPwm {
    fn write_rgb(&mut self, rgb: Rgb) -> Result<(), OutputError> {
        if rgb != self.last {
            info!(r = rgb.r, g = rgb.g, b = rgb.b, "pwm output");
        }
        self.last = rgb;
        Ok(())
    }
}

struct FileVolume {
    path: PathBuf,
    force_read_only: bool,
}

impl FileVolume {
    fn from_env(record_key: &str) -> Self {
        let data_dir = std::env::var("LED_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.ledmonitor"));
        let force_read_only = std::env::var("LED_READ_ONLY")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            path: data_dir.join(format!("{record_key}.json")),
            force_read_only,
        }
    }
}

impl StorageVolume for FileVolume {
    fn mount(&mut self) -> Result<(), StorageError> {
        if self.force_read_only {
            return Err(StorageError::Mount("LED_READ_ONLY is set".to_string()));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| StorageError::Mount(format!("{}: {err}", parent.display())))?;
        }
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Read(err.to_string())),
        }
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        use std::io::Write;

        let mut file = std::fs::File::create(&self.path)
            .map_err(|err| StorageError::Write(err.to_string()))?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|err| StorageError::Write(err.to_string()))
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = LightConfig::default();
    config.http_port = std::env::var("LED_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    config.sanitize();

    let status = StatusSlot::new();
    status.publish(">led-monitor bootup<");
    spawn_status_loop(status.clone());

    let store = SettingsStore::mount(FileVolume::from_env(&config.record_key));
    if store.is_read_only() {
        warn!("+ Error while mounting storage");
        status.publish("Error while mounting storage");
    } else {
        info!("+ FS mounted. Settings will be saved");
        status.publish("FS mounted. Settings will be saved");
    }

    let controller = LedController::new(SimulatedPwm { last: Rgb::OFF }, store, status.clone());
    let app_state = AppState {
        controller: Arc::new(Mutex::new(controller)),
        status: status.clone(),
    };

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind light server at {addr}"))?;

    info!("+ Init complete. Listening on http://{addr}");
    status.publish("Init complete. Listening ...");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    Route::ALL
        .into_iter()
        .fold(Router::new(), |router, route| {
            router.route(
                route.path(),
                get(
                    move |State(state): State<AppState>, Query(params): Query<QueryParams>| async move {
                        handle_route(route, state, params).await
                    },
                ),
            )
        })
        .with_state(app_state)
}

async fn handle_route(route: Route, state: AppState, params: QueryParams) -> impl IntoResponse {
    let reply = {
        let mut controller = state.controller.lock().await;
        dispatch(route, &params, &mut controller, &state.status)
    };
    reply_response(reply)
}

fn reply_response(reply: Reply) -> axum::response::Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}

fn spawn_status_loop(status: StatusSlot) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(STATUS_POLL_MS));
        loop {
            interval.tick().await;
            if let Some(event) = status.take() {
                info!("display: {event}");
            }
        }
    });
}
