//! Writes a simulated fall as JSON lines, e.g. `simulator | fallwatch`.

use serde_json::json;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::time::{sleep, Duration};

const SAMPLE_PERIOD: Duration = Duration::from_millis(20);
const GRAVITY: f64 = 9.81;

async fn send(out: &mut Stdout, packet: serde_json::Value) -> std::io::Result<()> {
    let mut line = packet.to_string();
    line.push('\n');
    out.write_all(line.as_bytes()).await?;
    out.flush().await
}

/// Holds one magnitude for `duration`, one line per sensor period.
async fn hold(out: &mut Stdout, magnitude: f64, duration: Duration) -> std::io::Result<()> {
    let count = (duration.as_millis() / SAMPLE_PERIOD.as_millis()).max(1);
    for _ in 0..count {
        send(out, json!({ "magnitude": magnitude })).await?;
        sleep(SAMPLE_PERIOD).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let mut out = tokio::io::stdout();

    eprintln!("🔌 Starting simulated fall...");

    // 1. Position fix
    send(&mut out, json!({ "lat": 44.4268, "lon": 26.1025 })).await?;

    // 2. Normal walking: ~1g on the vertical axis with a little jitter
    for _ in 0..100 {
        let jitter = || (rand::random::<f64>() - 0.5) * 1.5;
        send(
            &mut out,
            json!({ "x": jitter(), "y": GRAVITY + jitter(), "z": jitter() }),
        )
        .await?;
        sleep(SAMPLE_PERIOD).await;
    }

    // 3. Free fall, impact, then lying still
    eprintln!("⚠️ SIMULATING FALL EVENT!");
    hold(&mut out, 0.5, Duration::from_millis(1000)).await?;
    // A spike shorter than three ticks, or Recovery would still see it and stand down
    hold(&mut out, 15.0, Duration::from_millis(60)).await?;

    // Long enough to pass the recovery window and the confirmation countdown
    eprintln!("🛌 Lying still...");
    hold(&mut out, 2.0, Duration::from_secs(17)).await?;

    eprintln!("🛑 Simulation Finished.");
    Ok(())
}
