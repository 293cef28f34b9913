use std::sync::Arc;
use std::time::Duration;

use edgesense::config::TransportConfig;
use edgesense::core::PipelineError;
use edgesense::observability::PipelineMetrics;
use edgesense::transport::{
    AckMode, ConnectionReason, MessageDisposition, SimulatedTransport, TransportOption, TransportSession,
};

#[test]
fn test_options_applied_in_order() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    let config = TransportConfig {
        connection_string: "HostName=hub.example.net;DeviceId=1583;SharedAccessKey=abc".into(),
        log_trace: true,
        trusted_certificates: Some("-----BEGIN CERTIFICATE-----".into()),
        ..Default::default()
    };

    let session = TransportSession::open(transport.clone(), &config, Arc::new(PipelineMetrics::new())).unwrap();

    assert_eq!(
        transport.options(),
        vec![
            TransportOption::LogTrace(true),
            TransportOption::TrustedCertificates("-----BEGIN CERTIFICATE-----".into()),
            TransportOption::DoWorkFrequency(Duration::from_millis(100)),
        ]
    );
    assert!(session.link().is_connected());
    assert!(transport.is_connected());
    assert_eq!(
        transport.connection_string().as_deref(),
        Some("HostName=hub.example.net;DeviceId=1583;SharedAccessKey=abc")
    );
}

#[test]
fn test_certificates_skipped_when_not_configured() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    let _session =
        TransportSession::open(transport.clone(), &TransportConfig::default(), Arc::new(PipelineMetrics::new()))
            .unwrap();

    let names: Vec<_> = transport.options().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["logtrace", "do_work_freq_ms"]);
}

#[test]
fn test_option_failure_releases_transport() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual).reject_option("TrustedCerts"));
    let config = TransportConfig {
        trusted_certificates: Some("pem".into()),
        ..Default::default()
    };

    let result = TransportSession::open(transport.clone(), &config, Arc::new(PipelineMetrics::new()));
    match result {
        Err(PipelineError::ConnectionFault(msg)) => assert!(msg.contains("TrustedCerts")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("session should not open"),
    }
    assert_eq!(transport.disconnect_calls(), 1);
    assert!(!transport.is_connected());
}

#[test]
fn test_auth_failure_leaves_link_down() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual).fail_connect());
    let metrics = Arc::new(PipelineMetrics::new());

    let session = TransportSession::open(transport.clone(), &TransportConfig::default(), metrics.clone()).unwrap();

    assert!(!session.link().is_connected());
    assert_eq!(metrics.connection_faults(), 1);
}

#[test]
fn test_link_follows_connection_callbacks() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    let metrics = Arc::new(PipelineMetrics::new());
    let session = TransportSession::open(transport.clone(), &TransportConfig::default(), metrics.clone()).unwrap();
    let link = session.link();

    transport.drop_connection(ConnectionReason::NoPingResponse);
    assert!(!link.is_connected());
    assert_eq!(metrics.connection_faults(), 1);

    transport.restore_connection();
    assert!(link.is_connected());
}

#[test]
fn test_inbound_message_dispositions() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    let metrics = Arc::new(PipelineMetrics::new());
    let _session = TransportSession::open(transport.clone(), &TransportConfig::default(), metrics.clone()).unwrap();

    assert_eq!(transport.deliver_inbound(b"{\"reset\":true}"), Some(MessageDisposition::Accepted));
    assert_eq!(transport.deliver_inbound(&[0xff, 0xfe, 0x00]), Some(MessageDisposition::Abandoned));
    assert_eq!(metrics.inbound_messages(), 2);
}

#[test]
fn test_session_released_exactly_once() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    {
        let mut session =
            TransportSession::open(transport.clone(), &TransportConfig::default(), Arc::new(PipelineMetrics::new()))
                .unwrap();
        assert!(session.close());
        assert!(session.is_released());
        assert!(!session.link().is_connected());
    }
    // Drop after close does not disconnect again.
    assert_eq!(transport.disconnect_calls(), 1);
}

#[test]
fn test_drop_releases_open_session() {
    let transport = Arc::new(SimulatedTransport::new(AckMode::Manual));
    let session =
        TransportSession::open(transport.clone(), &TransportConfig::default(), Arc::new(PipelineMetrics::new()))
            .unwrap();
    drop(session);

    assert_eq!(transport.disconnect_calls(), 1);
    assert!(transport.deliver_inbound(b"late").is_none());
}
