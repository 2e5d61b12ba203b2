//! Command-protocol tests: engine dispatch, replies, and a full
//! client ↔ engine round trip over the shared line codec.

use std::sync::{Arc, Mutex};

use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{ConfigError, ConfigPort};
use coopdoor::config::MotionConfig;
use coopdoor::drivers::motor::Direction;
use coopdoor::link::engine::CommandEngine;
use coopdoor::motion::{DoorState, MotionStatus};

use crate::mock_hw::{
    MemoryStore, MockClock, MockHardware, MotorCall, RecordingDispatcher, RecordingSink,
};

impl ConfigPort for &MemoryStore {
    fn load(&self) -> Result<MotionConfig, ConfigError> {
        (**self).load()
    }

    fn save(&self, config: &MotionConfig) -> Result<(), ConfigError> {
        (**self).save(config)
    }
}

struct Rig<'a> {
    engine: CommandEngine<&'a MemoryStore>,
    config: Arc<Mutex<MotionConfig>>,
    status: Arc<MotionStatus>,
    hw: Mutex<MockHardware>,
    dispatcher: RecordingDispatcher,
    sink: RecordingSink,
}

impl<'a> Rig<'a> {
    fn new(store: &'a MemoryStore) -> Self {
        let config = Arc::new(Mutex::new(MotionConfig::default()));
        let status = Arc::new(MotionStatus::new());
        let engine = CommandEngine::new(Arc::clone(&config), store, Arc::clone(&status));
        Self {
            engine,
            config,
            status,
            hw: Mutex::new(MockHardware::new()),
            dispatcher: RecordingDispatcher::new(),
            sink: RecordingSink::new(),
        }
    }

    fn send(&mut self, line: &str) -> String {
        self.engine
            .handle_line(line, &self.hw, &mut self.dispatcher, &mut self.sink)
            .as_str()
            .to_owned()
    }
}

// ── Movement dispatch ────────────────────────────────────────

#[test]
fn open_dispatches_and_acks() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("open"), "ack");
    assert_eq!(rig.dispatcher.dispatched, vec![Direction::Open]);
    assert!(rig.status.is_busy(), "claim must be held for the worker");
}

#[test]
fn movement_while_busy_replies_busy_and_never_dispatches() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("open"), "ack");
    // Scenario E: second movement command while the first is in flight.
    assert_eq!(rig.send("open"), "busy");
    assert_eq!(rig.send("close"), "busy");
    assert_eq!(rig.dispatcher.dispatched, vec![Direction::Open]);
}

#[test]
fn failed_handoff_releases_the_claim() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    rig.dispatcher.accept = false;

    assert_eq!(rig.send("close"), "busy");
    assert!(!rig.status.is_busy(), "claim must not leak on refusal");
    assert_eq!(rig.send("close"), "busy");
    rig.dispatcher.accept = true;
    assert_eq!(rig.send("close"), "ack");
}

// ── Stop ─────────────────────────────────────────────────────

#[test]
fn stop_when_idle_stops_bridge_and_resets_state() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    rig.status.set_door_state(DoorState::Open);

    assert_eq!(rig.send("stop"), "ack");
    assert_eq!(rig.hw.lock().unwrap().calls, vec![MotorCall::Stop]);
    assert_eq!(rig.status.door_state(), DoorState::Unknown);
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::DoorStateChanged { to: DoorState::Unknown, .. })));
}

#[test]
fn stop_during_move_is_rejected() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    assert!(rig.status.try_claim());

    assert_eq!(rig.send("stop"), "busy");
    assert!(
        rig.hw.lock().unwrap().calls.is_empty(),
        "no second task may touch the bridge mid-move"
    );
}

// ── Queries ──────────────────────────────────────────────────

#[test]
fn status_reports_wire_state_names() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("status"), "unknown");
    for (state, wire) in [
        (DoorState::Opening, "opening"),
        (DoorState::Open, "open"),
        (DoorState::CloseBlocked, "closeblocked"),
        (DoorState::TimedOut, "timedout"),
    ] {
        rig.status.set_door_state(state);
        assert_eq!(rig.send("status"), wire);
    }
}

#[test]
fn current_when_idle_reads_the_sensor() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    rig.hw.lock().unwrap().script_current(37.5, 4);

    assert_eq!(rig.send("current"), "37.5");
}

#[test]
fn current_during_move_reports_published_average() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    assert!(rig.status.try_claim());
    rig.status.publish_current(123.4);

    assert_eq!(rig.send("current"), "123.4");
    // The sensor owned by the worker was never touched.
    assert!(rig.hw.lock().unwrap().calls.is_empty());
}

#[test]
fn config_reply_is_the_full_json_record() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    let reply = rig.send("config");
    let parsed: MotionConfig = serde_json::from_str(&reply).unwrap();
    assert_eq!(parsed, MotionConfig::default());
}

#[test]
fn log_marker_is_acknowledged() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);
    assert_eq!(rig.send("log"), "logged");
}

// ── Config updates ───────────────────────────────────────────

#[test]
fn threshold_update_persists_full_record() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("threshold:450"), "threshold updated");
    assert_eq!(store.saves(), 1);
    assert_eq!(rig.config.lock().unwrap().current_threshold, 450);

    let saved = store.last_saved().unwrap();
    assert_eq!(saved.current_threshold, 450);
    // Untouched fields are rewritten along with the changed one.
    assert_eq!(saved.move_timeout_open_ms, 40_000);

    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ConfigUpdated { key: "threshold", value: 450 }
    )));
}

#[test]
fn timeout_updates_persist() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("timeout_open:12345"), "timeout_open updated");
    assert_eq!(rig.send("timeout_close:9876"), "timeout_close updated");
    assert_eq!(store.saves(), 2);
    let cfg = rig.config.lock().unwrap();
    assert_eq!(cfg.move_timeout_open_ms, 12_345);
    assert_eq!(cfg.move_timeout_close_ms, 9_876);
}

#[test]
fn malformed_threshold_leaves_store_untouched() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    // Scenario D: non-numeric value.
    assert_eq!(rig.send("threshold:abc"), "invalid threshold");
    assert_eq!(store.saves(), 0, "no rewrite on rejected update");
    assert_eq!(*rig.config.lock().unwrap(), MotionConfig::default());

    assert_eq!(rig.send("timeout_open:"), "invalid timeout_open");
    assert_eq!(rig.send("timeout_close:12.5"), "invalid timeout_close");
    assert_eq!(store.saves(), 0);
}

#[test]
fn unrecognised_input_replies_unknown() {
    let store = MemoryStore::new();
    let mut rig = Rig::new(&store);

    assert_eq!(rig.send("wibble"), "unknown");
    assert_eq!(rig.send(""), "unknown");
    assert_eq!(rig.send("OPEN"), "unknown");
    assert_eq!(rig.send("frobnicate:7"), "unknown");
}

// ── Client ↔ engine round trip over the shared codec ─────────

mod round_trip {
    use super::*;
    use core::cell::RefCell;
    use std::collections::VecDeque;

    use coopdoor::LinkError;
    use coopdoor::link::client::LinkClient;
    use coopdoor::link::codec::LineDecoder;
    use coopdoor::link::uart::LinkTransport;

    /// Loopback transport: client writes land in the engine, engine
    /// replies land in the client's read buffer — the same dataflow as
    /// the UART task, minus the wire.
    struct EngineLink<'a> {
        engine: RefCell<CommandEngine<&'a MemoryStore>>,
        hw: Mutex<MockHardware>,
        decoder: RefCell<LineDecoder>,
        dispatcher: RefCell<RecordingDispatcher>,
        sink: RefCell<RecordingSink>,
        outbox: RefCell<VecDeque<u8>>,
    }

    impl<'a> EngineLink<'a> {
        fn new(store: &'a MemoryStore) -> Self {
            let config = Arc::new(Mutex::new(MotionConfig::default()));
            let status = Arc::new(MotionStatus::new());
            Self {
                engine: RefCell::new(CommandEngine::new(config, store, status)),
                hw: Mutex::new(MockHardware::new()),
                decoder: RefCell::new(LineDecoder::new()),
                dispatcher: RefCell::new(RecordingDispatcher::new()),
                sink: RefCell::new(RecordingSink::new()),
                outbox: RefCell::new(VecDeque::new()),
            }
        }
    }

    impl LinkTransport for &EngineLink<'_> {
        fn write(&mut self, data: &[u8]) -> Result<(), LinkError> {
            let mut lines = Vec::new();
            self.decoder.borrow_mut().feed(data, |line| {
                lines.push(line.to_string());
            });
            for line in lines {
                let reply = self.engine.borrow_mut().handle_line(
                    &line,
                    &self.hw,
                    &mut *self.dispatcher.borrow_mut(),
                    &mut *self.sink.borrow_mut(),
                );
                let mut outbox = self.outbox.borrow_mut();
                outbox.extend(reply.as_bytes());
                outbox.push_back(b'\n');
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> usize {
            let mut outbox = self.outbox.borrow_mut();
            let mut n = 0;
            while n < buf.len() {
                match outbox.pop_front() {
                    Some(byte) => {
                        buf[n] = byte;
                        n += 1;
                    }
                    None => break,
                }
            }
            n
        }
    }

    #[test]
    fn full_exchange_sequence() {
        let store = MemoryStore::new();
        let link = EngineLink::new(&store);
        let clock = MockClock::new();
        let mut client = LinkClient::new(&link, &clock);

        assert_eq!(client.exchange("status").unwrap().as_str(), "unknown");
        assert_eq!(
            client.exchange("threshold:700").unwrap().as_str(),
            "threshold updated"
        );
        assert_eq!(client.exchange("open").unwrap().as_str(), "ack");
        // Move still "in flight" (no worker in this rig): busy reply.
        assert_eq!(client.exchange("close").unwrap().as_str(), "busy");
        assert_eq!(client.exchange("status").unwrap().as_str(), "unknown");
        assert_eq!(client.exchange("nonsense").unwrap().as_str(), "unknown");

        assert_eq!(store.saves(), 1);
        assert_eq!(
            link.dispatcher.borrow().dispatched,
            vec![Direction::Open]
        );
    }
}
