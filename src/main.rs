//! examguard CLI
//!
//! Local proctoring agent for browser-based coding exams.

use clap::{Parser, Subcommand};
use examguard::audit::AuditLog;
use examguard::config::{GuardConfig, MonitorConfig};
use examguard::engine::{Directive, ProctorEngine};
use examguard::error::MonitorError;
use examguard::sensor::{event_channel, EventSource, ReplaySource};
use examguard::session::{CALIBRATION_POINTS, SAMPLES_PER_POINT};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "examguard", version, about = "Proctoring monitor agent for browser-based coding exams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local agent server the exam front-end reports to
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: std::net::SocketAddr,
        /// Comma-separated guard selection (gaze,clipboard,fullscreen,mouse,all)
        #[arg(long)]
        guards: Option<String>,
    },
    /// Feed a recorded JSONL event log through the engine
    Replay {
        /// Path to the event log, one JSON event per line
        file: PathBuf,
        /// Comma-separated guard selection (gaze,clipboard,fullscreen,mouse,all)
        #[arg(long)]
        guards: Option<String>,
    },
    /// Show persisted audit logs
    Status,
    /// Show the active configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        save_defaults: bool,
    },
    /// Print the proctoring notice shown to candidates
    Notice,
    /// Submit code to a grading backend
    #[cfg(feature = "grader")]
    Submit {
        /// Grader base URL
        #[arg(long)]
        url: String,
        /// Source file to submit
        file: PathBuf,
        /// JSON file with the test cases
        #[arg(long)]
        tests: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { addr, guards } => cmd_serve(addr, guards)?,
        Commands::Replay { file, guards } => cmd_replay(file, guards)?,
        Commands::Status => cmd_status()?,
        Commands::Config { save_defaults } => cmd_config(save_defaults)?,
        Commands::Notice => println!("{}", examguard::PROCTORING_NOTICE),
        #[cfg(feature = "grader")]
        Commands::Submit { url, file, tests } => cmd_submit(url, file, tests)?,
    }
    Ok(())
}

fn load_config(guards: Option<String>) -> Result<MonitorConfig, MonitorError> {
    let mut config = MonitorConfig::load()?;
    if let Some(g) = guards {
        config.guards = GuardConfig::from_csv(&g);
        if !config.guards.any_enabled() {
            return Err(MonitorError::Config(format!("no known guard in '{g}'")));
        }
    }
    Ok(config)
}

#[cfg(feature = "server")]
fn cmd_serve(addr: std::net::SocketAddr, guards: Option<String>) -> Result<(), MonitorError> {
    let config = load_config(guards)?;
    config.ensure_directories()?;
    let engine = ProctorEngine::new(config);

    let runtime = tokio::runtime::Runtime::new()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let shutdown_tx = std::sync::Mutex::new(Some(shutdown_tx));
    ctrlc::set_handler(move || {
        if let Ok(mut guard) = shutdown_tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    })
    .map_err(|e| MonitorError::Config(format!("failed to set signal handler: {e}")))?;

    println!("examguard agent listening on {addr} (Ctrl+C to stop)");
    runtime.block_on(examguard::server::run(engine, addr, shutdown_rx))
}

fn cmd_replay(file: PathBuf, guards: Option<String>) -> Result<(), MonitorError> {
    let config = load_config(guards)?;
    let data_path = config.data_path.clone();
    let fallback = !config.guards.gaze_tracking;
    let mut engine = ProctorEngine::new(config);

    // Recorded logs start after the candidate calibrated, so the gate is
    // walked to completion before the stream is fed in.
    if engine.config().guards.gaze_tracking {
        for point in 0..CALIBRATION_POINTS.len() {
            for _ in 0..SAMPLES_PER_POINT {
                engine.record_calibration_sample(point)?;
            }
        }
    }

    let (tx, rx) = event_channel();
    let mut source = ReplaySource::new(&file);
    source.start(tx)?;
    info!(file = %file.display(), "replaying event log");

    let mut events = 0u64;
    while let Ok(event) = rx.recv() {
        events += 1;
        // In fallback mode the wall clock is the recorded one.
        if fallback {
            for directive in engine.tick(event.timestamp()) {
                print_directive(&directive);
            }
        }
        for directive in engine.handle(&event) {
            print_directive(&directive);
        }
    }
    source.stop();

    let audit = engine.audit();
    let snapshot = audit.snapshot();
    println!("---");
    println!("events replayed:      {events}");
    println!("tracker samples:      {}", snapshot.tracker_samples);
    println!("abnormal samples:     {}", snapshot.abnormal_samples);
    println!("warnings shown:       {}", snapshot.warnings_shown);
    println!("pastes blocked:       {}", snapshot.blocked_pastes);
    println!("mouse-leave events:   {}", snapshot.mouse_leave_violations);
    println!("fullscreen losses:    {}", snapshot.fullscreen_violations);
    println!("forced exits:         {}", snapshot.forced_exits);

    let path = audit.save(&data_path, engine.session().id())?;
    println!("audit log saved to {}", path.display());
    Ok(())
}

fn print_directive(directive: &Directive) {
    match directive {
        Directive::ShowWarning { level } => println!("[warning] level {level}"),
        Directive::DismissWarning => println!("[warning] dismissed"),
        Directive::BlockPaste { formats } => println!("[paste] blocked (formats: {formats:?})"),
        Directive::ShowFocusReminder => println!("[focus] pointer left the window"),
        Directive::RequireFullscreen => println!("[fullscreen] lost, re-entry required"),
        Directive::DismissFullscreenPrompt => println!("[fullscreen] restored"),
        Directive::ForceExit { reason } => println!("[exit] session terminated: {}", reason.as_str()),
        Directive::AllowPaste | Directive::TagClipboard { .. } => {}
    }
}

fn cmd_status() -> Result<(), MonitorError> {
    let config = MonitorConfig::load()?;
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(&config.data_path) {
        Ok(dir) => dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("audit-") && n.ends_with(".json"))
                    .unwrap_or(false)
            })
            .collect(),
        Err(_) => vec![],
    };
    entries.sort();

    if entries.is_empty() {
        println!("no audit logs in {}", config.data_path.display());
        return Ok(());
    }

    for path in entries {
        let (counters, trail) = AuditLog::load(&path)?;
        println!(
            "{}: {} samples ({} abnormal), {} warnings, {} blocked pastes, {} forced exits, {} trail entries",
            path.display(),
            counters.tracker_samples,
            counters.abnormal_samples,
            counters.warnings_shown,
            counters.blocked_pastes,
            counters.forced_exits,
            trail.len(),
        );
    }
    Ok(())
}

fn cmd_config(save_defaults: bool) -> Result<(), MonitorError> {
    if save_defaults {
        let config = MonitorConfig::default();
        config.save()?;
        println!("defaults written to {}", MonitorConfig::config_path().display());
        return Ok(());
    }
    let config = MonitorConfig::load()?;
    println!("config file: {}", MonitorConfig::config_path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(feature = "grader")]
fn cmd_submit(url: String, file: PathBuf, tests: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    use examguard::grader::{BlockingGraderClient, SubmissionRequest, TestCase};

    let code = std::fs::read_to_string(&file)?;
    let test_cases: Vec<TestCase> = serde_json::from_str(&std::fs::read_to_string(&tests)?)?;

    let client = BlockingGraderClient::new(url)?;
    let result = client.submit(&SubmissionRequest { code, test_cases })?;

    println!("status: {:?}", result.status);
    if let Some(message) = &result.message {
        println!("message: {message}");
    }
    if let Some(output) = &result.compiler_output {
        println!("compiler output:\n{output}");
    }
    for (i, case) in result.results.iter().enumerate() {
        let mark = if case.passed { "pass" } else { "FAIL" };
        println!("  case {}: {mark}", i + 1);
        if !case.passed {
            println!("    input:    {}", case.input);
            println!("    expected: {}", case.expected_output);
            if let Some(actual) = &case.actual_output {
                println!("    actual:   {actual}");
            }
            if let Some(err) = &case.error_message {
                println!("    error:    {err}");
            }
        }
    }
    Ok(())
}
