use std::sync::Arc;

use edgesense::config::TransportConfig;
use edgesense::core::{StateLabel, StateRecord};
use edgesense::nodes::{PublishDisposition, TelemetryPublisher};
use edgesense::observability::PipelineMetrics;
use edgesense::transport::{AckMode, ConnectionReason, PublishResult, SimulatedTransport, TransportSession};
use tokio::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

struct Harness {
    transport: Arc<SimulatedTransport>,
    session: TransportSession,
    metrics: Arc<PipelineMetrics>,
    publisher: TelemetryPublisher,
}

fn harness(mode: AckMode) -> Harness {
    let transport = Arc::new(SimulatedTransport::new(mode));
    let metrics = Arc::new(PipelineMetrics::new());
    let session = TransportSession::open(transport.clone(), &TransportConfig::default(), metrics.clone()).unwrap();
    let publisher = TelemetryPublisher::new(session.transport(), session.link(), metrics.clone(), TIMEOUT);
    Harness {
        transport,
        session,
        metrics,
        publisher,
    }
}

fn record(index: usize, name: &str) -> StateRecord {
    StateRecord::new(1583, &StateLabel::trained(index, name), 400)
}

#[test]
fn test_only_latest_pending_reaches_transport() {
    let mut h = harness(AckMode::Manual);

    assert_eq!(h.publisher.publish(&record(0, "Squat")), PublishDisposition::Submitted);
    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Queued);
    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::Superseded);

    assert_eq!(h.transport.in_flight_count(), 1);
    assert!(h.publisher.pending_payload().unwrap().contains("Walk"));

    // Still outstanding: nothing new goes out.
    h.publisher.pump();
    assert_eq!(h.transport.sent_payloads().len(), 1);

    assert!(h.transport.complete_next(PublishResult::Ok));
    h.publisher.pump();

    assert_eq!(
        h.transport.sent_payloads(),
        vec![
            r#"{"DeviceID":1583,"State":"Squat","Duration":400}"#.to_string(),
            r#"{"DeviceID":1583,"State":"Walk","Duration":400}"#.to_string(),
        ]
    );
    assert!(h.publisher.pending_payload().is_none());
    assert_eq!(h.metrics.publish_acked(), 1);
    assert_eq!(h.metrics.publish_superseded(), 1);
    assert_eq!(h.metrics.publish_submitted(), 2);
}

#[test]
fn test_completed_handle_reaped_on_next_publish() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(0, "Squat"));
    assert!(h.transport.complete_next(PublishResult::Ok));

    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Submitted);
    assert_eq!(h.metrics.handles_closed(), 1);
}

#[test]
fn test_failed_completion_counted_not_retried() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(2, "Stoop"));
    assert!(h.transport.complete_next(PublishResult::MessageTimeout));
    h.publisher.pump();

    assert!(!h.publisher.has_outstanding());
    assert_eq!(h.metrics.publish_failures(), 1);
    assert_eq!(h.transport.sent_payloads().len(), 1);
}

#[test]
fn test_disconnected_records_are_dropped() {
    let mut h = harness(AckMode::Manual);
    h.transport.drop_connection(ConnectionReason::NoNetwork);

    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::DroppedDisconnected);
    assert!(h.transport.sent_payloads().is_empty());
    assert!(h.publisher.pending_payload().is_none());
    assert_eq!(h.metrics.publish_dropped(), 1);

    h.transport.restore_connection();
    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::Submitted);
}

#[test]
fn test_pending_cleared_when_link_drops() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(0, "Squat"));
    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Queued);

    h.transport.drop_connection(ConnectionReason::CommunicationError);
    h.publisher.pump();

    assert!(h.publisher.pending_payload().is_none());
    assert_eq!(h.metrics.publish_dropped(), 1);
    assert_eq!(h.metrics.connection_faults(), 1);
}

#[test]
fn test_newest_record_is_last_on_the_wire() {
    let mut h = harness(AckMode::Manual);

    assert_eq!(h.publisher.publish(&record(0, "Squat")), PublishDisposition::Submitted);
    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Queued);

    // Ack lands mid-cycle, before the next pump.
    assert!(h.transport.complete_next(PublishResult::Ok));
    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::Submitted);
    assert!(h.publisher.pending_payload().is_none());

    assert!(h.transport.complete_next(PublishResult::Ok));
    h.publisher.pump();

    let sent = h.transport.sent_payloads();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Squat"));
    assert!(sent[1].contains("Walk"));
    assert_eq!(h.metrics.publish_superseded(), 1);
}

#[test]
fn test_queued_record_dropped_with_newer_disconnected_one() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(0, "Squat"));
    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Queued);

    h.transport.drop_connection(ConnectionReason::NoNetwork);
    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::DroppedDisconnected);
    assert!(h.publisher.pending_payload().is_none());
    assert_eq!(h.metrics.publish_dropped(), 2);

    // Link returns before the next pump: nothing stale goes out.
    h.transport.restore_connection();
    assert!(h.transport.complete_next(PublishResult::Ok));
    h.publisher.pump();

    let sent = h.transport.sent_payloads();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Squat"));
}

#[test]
fn test_refused_submission_is_rejected() {
    let mut h = harness(AckMode::Manual);
    h.transport.refuse_publishes(true);

    assert_eq!(h.publisher.publish(&record(0, "Squat")), PublishDisposition::Rejected);
    assert!(!h.publisher.has_outstanding());
    assert_eq!(h.publisher.slot().outstanding_id(), None);
    assert_eq!(h.metrics.publish_failures(), 1);

    h.transport.refuse_publishes(false);
    assert_eq!(h.publisher.publish(&record(0, "Squat")), PublishDisposition::Submitted);
}

#[test]
fn test_overlong_label_rejected_before_transport() {
    let mut h = harness(AckMode::Manual);
    let name = "VeryLongActivityLabel";

    assert_eq!(h.publisher.publish(&record(0, name)), PublishDisposition::Rejected);
    assert!(h.transport.sent_payloads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_publish_times_out() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(0, "Squat"));
    assert_eq!(h.publisher.publish(&record(1, "Stand")), PublishDisposition::Queued);

    tokio::time::advance(TIMEOUT / 2).await;
    h.publisher.pump();
    assert!(h.publisher.has_outstanding());

    tokio::time::advance(TIMEOUT).await;
    h.publisher.pump();

    assert_eq!(h.metrics.publish_timeouts(), 1);
    assert_eq!(h.metrics.handles_closed(), 1);
    // The queued record went out once the slot freed up.
    assert_eq!(h.transport.sent_payloads().len(), 2);
    assert_eq!(h.publisher.outstanding().map(|handle| handle.id), Some(2));

    // A late ack for the abandoned publish is ignored.
    assert!(h.transport.complete_next(PublishResult::Ok));
    assert_eq!(h.metrics.late_completions(), 1);
    assert_eq!(h.metrics.publish_acked(), 0);
    assert!(h.publisher.has_outstanding());
}

#[test]
fn test_close_is_exactly_once_and_silences_callbacks() {
    let mut h = harness(AckMode::Manual);

    h.publisher.publish(&record(0, "Squat"));
    h.publisher.publish(&record(1, "Stand"));

    assert!(h.publisher.close());
    assert!(!h.publisher.close());
    assert_eq!(h.metrics.handles_closed(), 1);
    assert!(h.publisher.pending_payload().is_none());

    assert!(h.session.close());
    assert!(!h.session.close());
    assert_eq!(h.transport.disconnect_calls(), 1);
    assert_eq!(h.transport.in_flight_count(), 0);
    assert_eq!(h.metrics.late_completions(), 1);
    assert_eq!(h.metrics.publish_acked(), 0);
    assert_eq!(h.metrics.publish_failures(), 0);

    assert_eq!(h.publisher.publish(&record(3, "Walk")), PublishDisposition::Rejected);
}

#[test]
fn test_immediate_ack_mode() {
    let mut h = harness(AckMode::Immediate);

    h.publisher.publish(&record(3, "Walk"));
    // The worker thread acks on its own; wait for it.
    for _ in 0..200 {
        if h.metrics.publish_acked() == 1 {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(h.metrics.publish_acked(), 1);

    h.publisher.pump();
    assert!(!h.publisher.has_outstanding());
}
