use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};

use super::traits::MessagingTransport;
use super::types::{
    CompletionCallback, ConnectionCallback, ConnectionReason, ConnectionStatus, InboundCallback,
    MessageDisposition, PublishResult, TransportOption,
};

/// How the simulated hub acknowledges publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Ack as soon as the worker sees the publish
    Immediate,
    /// Ack after a fixed network delay
    Delayed(Duration),
    /// Hold acks until `complete_next` is called
    Manual,
}

enum Command {
    Publish,
    Complete { result: PublishResult, reply: Sender<bool> },
    Inbound { body: Vec<u8>, reply: Sender<Option<MessageDisposition>> },
    SetLink { up: bool, reason: ConnectionReason, reply: Sender<()> },
    Shutdown { reply: Sender<()> },
}

struct InFlight {
    due: Option<Instant>,
    on_complete: CompletionCallback,
}

#[derive(Default)]
struct Inner {
    options: Vec<TransportOption>,
    connection_cb: Option<Arc<dyn Fn(ConnectionStatus, ConnectionReason) + Send + Sync>>,
    inbound_cb: Option<Arc<dyn Fn(&[u8]) -> MessageDisposition + Send + Sync>>,
    in_flight: VecDeque<InFlight>,
    sent: Vec<String>,
    connection_string: Option<String>,
    connected: bool,
    running: bool,
    disconnect_calls: u64,
    reject_option: Option<&'static str>,
    refuse_publish: bool,
    fail_connect: bool,
}

/// In-process stand-in for the telemetry hub client.
///
/// Callbacks run on a dedicated worker thread fed through a crossbeam
/// channel, like a real client's network thread.
pub struct SimulatedTransport {
    mode: AckMode,
    shared: Arc<Mutex<Inner>>,
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedTransport {
    pub fn new(mode: AckMode) -> Self {
        let shared = Arc::new(Mutex::new(Inner {
            running: true,
            ..Default::default()
        }));
        let (commands, rx) = unbounded();

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("transport-sim".into())
            .spawn(move || worker_loop(worker_shared, rx, mode))
            .ok();

        Self {
            mode,
            shared,
            commands,
            worker: Mutex::new(worker),
        }
    }

    /// Fail `set_option` for the option with this name.
    pub fn reject_option(self, name: &'static str) -> Self {
        lock(&self.shared).reject_option = Some(name);
        self
    }

    /// Report an authentication failure instead of connecting.
    pub fn fail_connect(self) -> Self {
        lock(&self.shared).fail_connect = true;
        self
    }

    /// Refuse every `publish_async` submission.
    pub fn refuse_publishes(&self, refuse: bool) {
        lock(&self.shared).refuse_publish = refuse;
    }

    pub fn mode(&self) -> AckMode {
        self.mode
    }

    /// Every payload accepted by `publish_async`, in submission order.
    pub fn sent_payloads(&self) -> Vec<String> {
        lock(&self.shared).sent.clone()
    }

    pub fn options(&self) -> Vec<TransportOption> {
        lock(&self.shared).options.clone()
    }

    /// Connection string from the last `connect` call.
    pub fn connection_string(&self) -> Option<String> {
        lock(&self.shared).connection_string.clone()
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.shared).in_flight.len()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared).connected
    }

    pub fn disconnect_calls(&self) -> u64 {
        lock(&self.shared).disconnect_calls
    }

    /// Deliver the oldest held ack. Blocks until its callback has run;
    /// returns `false` when nothing was in flight.
    pub fn complete_next(&self, result: PublishResult) -> bool {
        let (reply, done) = bounded(1);
        if self.commands.send(Command::Complete { result, reply }).is_err() {
            return false;
        }
        done.recv().unwrap_or(false)
    }

    /// Push a cloud-to-device message through the inbound callback.
    pub fn deliver_inbound(&self, body: &[u8]) -> Option<MessageDisposition> {
        let (reply, done) = bounded(1);
        let command = Command::Inbound { body: body.to_vec(), reply };
        if self.commands.send(command).is_err() {
            return None;
        }
        done.recv().ok().flatten()
    }

    pub fn drop_connection(&self, reason: ConnectionReason) {
        self.set_link(false, reason);
    }

    pub fn restore_connection(&self) {
        self.set_link(true, ConnectionReason::ConnectionOk);
    }

    fn set_link(&self, up: bool, reason: ConnectionReason) {
        let (reply, done) = bounded(1);
        if self.commands.send(Command::SetLink { up, reason, reply }).is_ok() {
            let _ = done.recv();
        }
    }
}

impl MessagingTransport for SimulatedTransport {
    fn transport_id(&self) -> &str {
        "simulated-hub"
    }

    fn set_option(&self, option: TransportOption) -> Result<()> {
        let mut inner = lock(&self.shared);
        if inner.reject_option == Some(option.name()) {
            return Err(anyhow!("Option {} not supported", option.name()));
        }
        inner.options.push(option);
        Ok(())
    }

    fn set_connection_callback(&self, callback: ConnectionCallback) -> Result<()> {
        lock(&self.shared).connection_cb = Some(Arc::from(callback));
        Ok(())
    }

    fn set_inbound_message_callback(&self, callback: InboundCallback) -> Result<()> {
        lock(&self.shared).inbound_cb = Some(Arc::from(callback));
        Ok(())
    }

    fn connect(&self, connection_string: &str) -> Result<()> {
        lock(&self.shared).connection_string = Some(connection_string.to_string());

        // Wait for the status callback so callers observe a settled link.
        let (reply, done) = bounded(1);
        self.commands
            .send(Command::SetLink { up: true, reason: ConnectionReason::ConnectionOk, reply })
            .map_err(|_| anyhow!("Transport worker is not running"))?;
        let _ = done.recv();
        Ok(())
    }

    fn publish_async(&self, payload: String, on_complete: CompletionCallback) -> Result<()> {
        {
            let mut inner = lock(&self.shared);
            if !inner.running {
                return Err(anyhow!("Transport is disconnected"));
            }
            if inner.refuse_publish {
                return Err(anyhow!("Transport refused message"));
            }
            let due = match self.mode {
                AckMode::Immediate => Some(Instant::now()),
                AckMode::Delayed(delay) => Some(Instant::now() + delay),
                AckMode::Manual => None,
            };
            inner.sent.push(payload);
            inner.in_flight.push_back(InFlight { due, on_complete });
        }
        self.commands
            .send(Command::Publish)
            .map_err(|_| anyhow!("Transport worker is not running"))
    }

    fn disconnect(&self) {
        lock(&self.shared).disconnect_calls += 1;

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(worker) = worker else {
            return;
        };

        let (reply, done) = bounded(1);
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = done.recv();
        }
        let _ = worker.join();
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(worker) = worker {
            let (reply, _done) = bounded(1);
            let _ = self.commands.send(Command::Shutdown { reply });
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: Arc<Mutex<Inner>>, rx: Receiver<Command>, mode: AckMode) {
    loop {
        let next_due = lock(&shared).in_flight.iter().filter_map(|f| f.due).min();
        let command = match next_due {
            Some(due) => match rx.recv_timeout(due.saturating_duration_since(Instant::now())) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return,
            },
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            },
        };

        match command {
            None | Some(Command::Publish) => {}
            Some(Command::Complete { result, reply }) => {
                let next = lock(&shared).in_flight.pop_front();
                let delivered = next.is_some();
                if let Some(flight) = next {
                    (flight.on_complete)(result);
                }
                let _ = reply.send(delivered);
            }
            Some(Command::Inbound { body, reply }) => {
                let callback = lock(&shared).inbound_cb.clone();
                let _ = reply.send(callback.map(|cb| cb(&body)));
            }
            Some(Command::SetLink { up, reason, reply }) => {
                let (callback, status, reason) = {
                    let mut inner = lock(&shared);
                    let (up, reason) = if up && inner.fail_connect {
                        (false, ConnectionReason::BadCredential)
                    } else {
                        (up, reason)
                    };
                    inner.connected = up;
                    let status = if up {
                        ConnectionStatus::Authenticated
                    } else {
                        ConnectionStatus::Unauthenticated
                    };
                    (inner.connection_cb.clone(), status, reason)
                };
                if let Some(cb) = callback {
                    cb(status, reason);
                }
                let _ = reply.send(());
            }
            Some(Command::Shutdown { reply }) => {
                let drained: Vec<InFlight> = {
                    let mut inner = lock(&shared);
                    inner.running = false;
                    inner.connected = false;
                    inner.in_flight.drain(..).collect()
                };
                for flight in drained {
                    (flight.on_complete)(PublishResult::Destroyed);
                }
                let _ = reply.send(());
                return;
            }
        }

        if mode != AckMode::Manual {
            deliver_due(&shared);
        }
    }
}

fn deliver_due(shared: &Mutex<Inner>) {
    let now = Instant::now();
    loop {
        let flight = {
            let mut inner = lock(shared);
            let ready = inner
                .in_flight
                .front()
                .and_then(|f| f.due)
                .map_or(false, |due| due <= now);
            if !ready {
                break;
            }
            let result = if inner.connected {
                PublishResult::Ok
            } else {
                PublishResult::Error
            };
            inner.in_flight.pop_front().map(|f| (f, result))
        };
        if let Some((flight, result)) = flight {
            (flight.on_complete)(result);
        }
    }
}
