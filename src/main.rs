use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;

use edgesense::config::PipelineConfig;
use edgesense::engine::CycleOrchestrator;
use edgesense::hal::mock::SimulatedImu;
use edgesense::inference::HeuristicEngine;
use edgesense::transport::{AckMode, SimulatedTransport};

/// Simulated network round trip for publish acknowledgements.
const SIMULATED_ACK_DELAY: Duration = Duration::from_millis(50);

fn load_config() -> Result<(PipelineConfig, Value)> {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("No config file given, using device defaults");
        return Ok((PipelineConfig::default(), Value::Null));
    };

    let (config, simulator) = PipelineConfig::from_file_with_section(&path, "simulator")?;
    log::info!("Loaded config from {}", path);
    Ok((config, simulator))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (config, simulator) = load_config()?;

    let mut imu = SimulatedImu::new();
    if !simulator.is_null() {
        imu.configure(&simulator)?;
    }
    let engine = HeuristicEngine::new(config.window_len());
    let transport = Arc::new(SimulatedTransport::new(AckMode::Delayed(SIMULATED_ACK_DELAY)));

    let mut orchestrator = CycleOrchestrator::new(config, Box::new(imu), Box::new(engine), transport)?;

    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, finishing current cycle");
            shutdown.shutdown();
        }
    });

    let outcome = orchestrator.run().await;
    log::info!("\n{}", orchestrator.monitor().generate_report());

    outcome?;
    Ok(())
}
