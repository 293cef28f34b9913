use edgesense::core::Reading;
use edgesense::hal::mock::SimulatedImu;
use edgesense::hal::SampleSource;
use serde_json::json;
use tokio::time::{Duration, Instant};

#[tokio::test]
async fn test_default_reads_one_g_on_z() {
    let mut imu = SimulatedImu::new();
    assert_eq!(imu.source_id(), "simulated-imu");
    assert_eq!(imu.read().await.unwrap(), Reading::new([0, 0, 1000], [0, 0, 0]));
}

#[tokio::test]
async fn test_configured_constant_reading() {
    let mut imu = SimulatedImu::new();
    imu.configure(&json!({
        "mode": "constant",
        "linear": [300, -300, 300],
        "angular": [10, 20, 30]
    }))
    .unwrap();

    assert_eq!(imu.read().await.unwrap(), Reading::new([300, -300, 300], [10, 20, 30]));
}

#[tokio::test]
async fn test_oscillating_mode_varies() {
    let mut imu = SimulatedImu::new();
    imu.configure(&json!({ "mode": "oscillating", "amplitude_mg": 800.0, "period_samples": 8 }))
        .unwrap();

    let mut readings = Vec::new();
    for _ in 0..8 {
        readings.push(imu.read().await.unwrap());
    }
    assert!(readings.iter().any(|r| r != &readings[0]));
}

#[tokio::test]
async fn test_fail_every_nth_read() {
    let mut imu = SimulatedImu::new();
    imu.configure(&json!({ "fail_every": 3 })).unwrap();

    assert!(imu.read().await.is_ok());
    assert!(imu.read().await.is_ok());
    assert!(imu.read().await.is_err());
    assert!(imu.read().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_latencies_applied_round_robin() {
    let mut imu = SimulatedImu::new();
    imu.configure(&json!({ "latencies_us": [2000, 8000] })).unwrap();

    let start = Instant::now();
    imu.read().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(2));
    imu.read().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(10));
}

#[test]
fn test_unknown_mode_rejected() {
    let mut imu = SimulatedImu::new();
    assert!(imu.configure(&json!({ "mode": "teleport" })).is_err());
}
