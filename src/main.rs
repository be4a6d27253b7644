use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use traffic_cycle::adapters::console::{self, ConsoleCommand, HELP};
use traffic_cycle::adapters::{HttpDetectionClient, TracingDisplay};
use traffic_cycle::application::CycleController;
use traffic_cycle::config::AppConfig;
use traffic_cycle::ports::DetectionClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load_validated()?;
    config.log.init();

    info!(backend = %config.backend.base_url, mode = %config.cycle.mode, "traffic cycle starting");

    let client = Arc::new(HttpDetectionClient::new(
        &config.backend.base_url,
        config.backend.timeout(),
    )?);
    let display = Arc::new(TracingDisplay::new(config.display.class_names_list()));

    match client.camera_status().await {
        Ok(status) if status.ok => info!(
            width = status.width,
            height = status.height,
            fps = status.fps,
            "camera ready"
        ),
        Ok(status) => warn!(error = ?status.error, "camera reports a problem"),
        Err(e) => warn!(error = %e, "camera status unavailable"),
    }

    let controller = CycleController::new(client, display, config.cycle.settings());
    controller.start();
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let keep_going = match line.parse::<ConsoleCommand>() {
                    Ok(command) => console::submit(&controller, command).await,
                    Err(e) => Err(e),
                };
                match keep_going {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    controller.shutdown();
    Ok(())
}
