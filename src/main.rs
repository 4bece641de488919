//! Rollcall Capture CLI
//!
//! Captures a still from a camera source and submits it to the
//! attendance server, either to register a face or to mark attendance.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use rollcall_capture::{
    capture::{CameraProvider, CaptureSession, MockCameraProvider, Page, StillImageCamera},
    config::FileConfig,
    metrics::{MetricsRegistry, MetricsSnapshot},
    notify::{NotificationId, NotificationPresenter},
    submission::{ReqwestHttpClient, SharedJarCookies, SubmissionClient},
    workflow::{kiosk_pause, CaptureWorkflow, SurfaceIds},
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "rollcall-capture", version, about = "Capture a face and submit it for attendance")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base url, overriding the config file.
    #[arg(long)]
    base_url: Option<String>,

    /// Use an image file as the camera.
    #[arg(long, conflicts_with = "mock")]
    image: Option<PathBuf>,

    /// Use a synthetic camera.
    #[arg(long)]
    mock: bool,

    /// Anti-forgery token to send when the server has not set one.
    #[arg(long)]
    csrf_token: Option<String>,

    /// Metrics server port (0 disables), overriding the config file.
    #[arg(long)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register the captured face for a student.
    Register {
        /// Student identifier (alphanumeric, up to 50 characters).
        #[arg(long)]
        student_id: String,
    },
    /// Capture once and mark attendance.
    Attend,
    /// Mark attendance repeatedly until interrupted.
    Kiosk {
        /// Seconds between captures, overriding the config file.
        #[arg(long)]
        interval: Option<u64>,
    },
}

type Workflow<P> = CaptureWorkflow<P, ReqwestHttpClient, SharedJarCookies>;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Rollcall Capture v{}", rollcall_capture::VERSION);

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.server.base_url = base_url.clone();
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = &cli.image {
        run(StillImageCamera::new(path), &cli, &config).await
    } else if cli.mock {
        run(MockCameraProvider::new(), &cli, &config).await
    } else {
        run_native(&cli, &config).await
    }
}

#[cfg(feature = "camera")]
async fn run_native(cli: &Cli, config: &FileConfig) -> ExitCode {
    run(rollcall_capture::capture::NativeCameraProvider::new(), cli, config).await
}

#[cfg(not(feature = "camera"))]
async fn run_native(_cli: &Cli, _config: &FileConfig) -> ExitCode {
    eprintln!("No camera source: pass --image or --mock, or build with --features camera");
    ExitCode::FAILURE
}

async fn run<P: CameraProvider>(provider: P, cli: &Cli, config: &FileConfig) -> ExitCode {
    let http = match ReqwestHttpClient::new(&config.server) {
        Ok(http) => http,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &config.server.csrf_bootstrap_path {
        if let Err(e) = http.bootstrap_cookies(path).await {
            warn!("Could not fetch anti-forgery cookie: {}", e);
        }
    }
    if let Some(token) = &cli.csrf_token {
        http.set_cookie(&config.server.csrf_cookie_name, token);
    }

    let surfaces = SurfaceIds::default();
    let page = Page::new();
    page.add_video_surface(surfaces.video.clone());
    if let Some(preview) = &surfaces.preview {
        page.add_image_surface(preview.clone());
    }

    let cookies = http.cookies();
    let session = CaptureSession::with_constraints(provider, page, config.camera.clone());
    let client = SubmissionClient::new(http, cookies, &config.server);
    let presenter =
        NotificationPresenter::new(Duration::from_secs(config.notifications.display_secs));
    let mut workflow = CaptureWorkflow::new(session, client, presenter, surfaces);

    let metrics = match MetricsSink::start(config.metrics.port) {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut last_seen = None;
    let outcome = workflow.start_camera().await;
    print_new_banners(workflow.presenter(), &mut last_seen);
    if !outcome.success {
        metrics.update(&workflow.metrics_snapshot()).await;
        return ExitCode::FAILURE;
    }

    let succeeded = match &cli.command {
        Command::Register { student_id } => {
            let result = workflow.register_face(student_id).await;
            print_new_banners(workflow.presenter(), &mut last_seen);
            result.success
        }
        Command::Attend => {
            let result = workflow.mark_attendance().await;
            print_new_banners(workflow.presenter(), &mut last_seen);
            result.success
        }
        Command::Kiosk { interval } => {
            let interval = Duration::from_secs(interval.unwrap_or(config.kiosk.interval_secs).max(1));
            run_kiosk(&mut workflow, interval, &metrics, &mut last_seen).await
        }
    };

    workflow.stop_camera();
    let snapshot = workflow.metrics_snapshot();
    metrics.update(&snapshot).await;
    info!(
        frames = snapshot.frames_captured,
        submissions = snapshot.submissions,
        failures = snapshot.submission_failures,
        "Done"
    );

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_kiosk<P: CameraProvider>(
    workflow: &mut Workflow<P>,
    interval: Duration,
    metrics: &MetricsSink,
    last_seen: &mut Option<NotificationId>,
) -> bool {
    let stop = Arc::new(Notify::new());
    let signal = Arc::clone(&stop);
    if let Err(e) = ctrlc::set_handler(move || signal.notify_one()) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    info!(interval_secs = interval.as_secs(), "Kiosk mode, press Ctrl-C to stop");
    loop {
        workflow.mark_attendance().await;
        print_new_banners(workflow.presenter(), last_seen);
        workflow.presenter_mut().prune_expired();
        metrics.update(&workflow.metrics_snapshot()).await;
        if !kiosk_pause(interval, &stop).await {
            info!("Kiosk stopped");
            break;
        }
    }
    true
}

fn print_new_banners(presenter: &NotificationPresenter, last_seen: &mut Option<NotificationId>) {
    for banner in presenter.active() {
        if last_seen.map_or(true, |seen| banner.id() > seen) {
            println!(
                "{} {}",
                chrono::Local::now().format("%H:%M:%S"),
                banner.render_banner()
            );
            *last_seen = Some(banner.id());
        }
    }
}

/// Where metric snapshots go.
enum MetricsSink {
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served(Arc<tokio::sync::RwLock<rollcall_capture::metrics::MetricsState>>),
}

impl MetricsSink {
    fn start(port: u16) -> Result<Self, rollcall_capture::metrics::MetricsError> {
        let registry = MetricsRegistry::new()?;
        if port == 0 {
            return Ok(MetricsSink::Local(registry));
        }

        #[cfg(feature = "metrics")]
        {
            use rollcall_capture::metrics::{MetricsServer, MetricsServerConfig};

            let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
            let state = server.state();
            tokio::spawn(async move {
                if let Err(e) = server.run().await {
                    warn!("Metrics server stopped: {}", e);
                }
            });
            Ok(MetricsSink::Served(state))
        }

        #[cfg(not(feature = "metrics"))]
        {
            warn!(port, "Metrics exporter requires the `metrics` feature; not serving");
            Ok(MetricsSink::Local(registry))
        }
    }

    async fn update(&self, snapshot: &MetricsSnapshot) {
        match self {
            MetricsSink::Local(registry) => {
                registry.update(snapshot);
                if let Ok(text) = registry.encode() {
                    tracing::trace!(metrics = %text, "Metrics updated");
                }
            }
            #[cfg(feature = "metrics")]
            MetricsSink::Served(state) => state.write().await.update(snapshot),
        }
    }
}
