use fallwatch::model::{parse_inbound, Inbound};
use fallwatch::{
    apply_command, telemetry, AlertWorkflow, Config, Detector, EmergencyAlert, Evaluator,
    MonitorError, PhaseChange,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// **Outbound stream**
///
/// One JSON object per line on stdout, tagged with `type` so a dashboard can
/// tell phase updates from alerts.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Outbound<'a> {
    PhaseChange(&'a PhaseChange),
    EmergencyAlert(&'a EmergencyAlert),
}

async fn emit(stdout: &mut Stdout, message: &Outbound<'_>) -> Result<(), MonitorError> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}

/// Routes one inbound line: commands first, then samples, then location fixes.
fn route_line(detector: &Detector, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match parse_inbound(text) {
        Ok(Inbound::Command(cmd)) => apply_command(detector, cmd),
        Ok(Inbound::Sample(magnitude)) => detector.push_sample(magnitude),
        Ok(Inbound::Location(loc)) => {
            info!(location = %loc, "📍 location updated");
            detector.push_location(loc.latitude, loc.longitude);
        }
        Err(e) => warn!(error = %e, line = text, "⚠️ skipping unrecognised input"),
    }
}

/// **Application Entry Point**
///
/// Reads sensor samples, location fixes and commands from stdin, and writes
/// phase changes and emergency alerts to stdout.
#[tokio::main]
async fn main() -> Result<(), MonitorError> {
    // 1. Load configuration (.env + environment) and logging
    let config = Config::from_env()?;
    telemetry::init(config.log_level)?;

    // 2. Detector and its background tasks
    let detector = Detector::new(config.event_capacity);
    let mut phases = detector.subscribe();
    let (alert_tx, mut alert_rx) = mpsc::channel::<EmergencyAlert>(8);

    let evaluator = Evaluator::spawn(detector.clone(), config.tick_interval);
    let workflow = AlertWorkflow::spawn(detector.clone(), config.confirm_window, alert_tx);

    info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        confirm_secs = config.confirm_window.as_secs(),
        "🚀 fall monitor started, reading from stdin"
    );

    // 3. Main loop: input, phase updates, alerts, Ctrl-C
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(text) => route_line(&detector, &text),
                None => {
                    info!("input closed");
                    break;
                }
            },
            change = phases.recv() => match change {
                Ok(change) => emit(&mut stdout, &Outbound::PhaseChange(&change)).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "output fell behind on phase changes"),
                Err(RecvError::Closed) => break,
            },
            Some(alert) = alert_rx.recv() => {
                emit(&mut stdout, &Outbound::EmergencyAlert(&alert)).await?;
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    // 4. Shutdown: stop ticking, then flush whatever the workflow already raised
    evaluator.stop().await;
    workflow.stop().await;
    while let Ok(alert) = alert_rx.try_recv() {
        emit(&mut stdout, &Outbound::EmergencyAlert(&alert)).await?;
    }

    let last = detector.snapshot();
    info!(phase = %last.phase, location = %last.location, "🛑 monitor stopped");
    Ok(())
}
