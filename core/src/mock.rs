//! Test doubles for the hardware traits
//!
//! Every double is a cheap handle over shared state, so a test keeps a
//! clone to script behaviour and inspect calls after moving the original
//! into the manager.
#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use hal_abstractions::network::Ipv4Octets;
use hal_abstractions::{BrokerSession, Clock, ConnectOptions, LinkDriver, LinkError, SessionError};

use crate::inbound::{InboundHandler, InboundMessage};

/// Address handed out by [`MockLink`]
pub const LEASE: Ipv4Octets = [192, 168, 0, 42];

/// Clock advanced by hand
#[derive(Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn at(now_ms: u64) -> Self {
        let clock = Self::default();
        clock.set(now_ms);
        clock
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

#[derive(Default)]
struct LinkScript {
    reachable: bool,
    attempts: u32,
    last_hw_addr: Option<[u8; 6]>,
    last_timeout_ms: Option<u32>,
}

/// DHCP stand-in: succeeds while reachable, times out otherwise
#[derive(Clone, Default)]
pub struct MockLink {
    script: Rc<RefCell<LinkScript>>,
}

impl MockLink {
    pub fn set_reachable(&self, reachable: bool) {
        self.script.borrow_mut().reachable = reachable;
    }

    pub fn attempts(&self) -> u32 {
        self.script.borrow().attempts
    }

    pub fn last_hw_addr(&self) -> Option<[u8; 6]> {
        self.script.borrow().last_hw_addr
    }

    pub fn last_timeout_ms(&self) -> Option<u32> {
        self.script.borrow().last_timeout_ms
    }
}

impl LinkDriver for MockLink {
    async fn acquire(
        &mut self,
        hw_addr: &[u8; 6],
        timeout_ms: u32,
    ) -> Result<Ipv4Octets, LinkError> {
        let mut script = self.script.borrow_mut();
        script.attempts += 1;
        script.last_hw_addr = Some(*hw_addr);
        script.last_timeout_ms = Some(timeout_ms);
        if script.reachable {
            Ok(LEASE)
        } else {
            Err(LinkError::Timeout)
        }
    }
}

/// What the broker saw in CONNECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedConnect {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u16,
}

#[derive(Default)]
struct SessionScript {
    reachable: bool,
    connected: bool,
    fail_subscribe: bool,
    fail_publish: bool,
    drop_on_service: bool,
    close_on_service: bool,
    connect_attempts: u32,
    service_calls: u32,
    last_connect: Option<RecordedConnect>,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
    inbound: VecDeque<(String, Vec<u8>)>,
}

/// Broker stand-in with scripted reachability and an inbound queue
#[derive(Clone, Default)]
pub struct MockSession {
    script: Rc<RefCell<SessionScript>>,
}

impl MockSession {
    pub fn set_reachable(&self, reachable: bool) {
        self.script.borrow_mut().reachable = reachable;
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.script.borrow_mut().fail_subscribe = fail;
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.script.borrow_mut().fail_publish = fail;
    }

    /// Next service pass loses the connection
    pub fn drop_on_service(&self) {
        self.script.borrow_mut().drop_on_service = true;
    }

    /// Next service pass completes, but the broker closed the session
    pub fn close_on_service(&self) {
        self.script.borrow_mut().close_on_service = true;
    }

    /// Broker closes the session without the client noticing yet
    pub fn disconnect(&self) {
        self.script.borrow_mut().connected = false;
    }

    pub fn push_inbound(&self, topic: &str, payload: &[u8]) {
        self.script
            .borrow_mut()
            .inbound
            .push_back((topic.to_string(), payload.to_vec()));
    }

    pub fn connect_attempts(&self) -> u32 {
        self.script.borrow().connect_attempts
    }

    pub fn service_calls(&self) -> u32 {
        self.script.borrow().service_calls
    }

    pub fn last_connect(&self) -> Option<RecordedConnect> {
        self.script.borrow().last_connect.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.script.borrow().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.script.borrow().published.clone()
    }
}

impl BrokerSession for MockSession {
    async fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), SessionError> {
        let mut script = self.script.borrow_mut();
        script.connect_attempts += 1;
        script.last_connect = Some(RecordedConnect {
            host: options.host.to_string(),
            port: options.port,
            client_id: options.client_id.to_string(),
            username: options.username.map(ToString::to_string),
            password: options.password.map(ToString::to_string),
            keep_alive_secs: options.keep_alive_secs,
        });
        if script.reachable {
            script.connected = true;
            Ok(())
        } else {
            Err(SessionError::Unreachable)
        }
    }

    fn is_connected(&self) -> bool {
        self.script.borrow().connected
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        let mut script = self.script.borrow_mut();
        if script.fail_subscribe {
            return Err(SessionError::Protocol);
        }
        script.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        let mut script = self.script.borrow_mut();
        if !script.connected {
            return Err(SessionError::NotConnected);
        }
        if script.fail_publish {
            return Err(SessionError::Io);
        }
        script.published.push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }

    async fn service<F>(&mut self, mut on_message: F) -> Result<(), SessionError>
    where
        F: FnMut(&str, &[u8]),
    {
        let pending: Vec<(String, Vec<u8>)> = {
            let mut script = self.script.borrow_mut();
            script.service_calls += 1;
            if script.drop_on_service {
                script.drop_on_service = false;
                script.connected = false;
                return Err(SessionError::Io);
            }
            if script.close_on_service {
                script.close_on_service = false;
                script.connected = false;
            }
            script.inbound.drain(..).collect()
        };

        for (topic, payload) in &pending {
            on_message(topic.as_str(), payload.as_slice());
        }
        Ok(())
    }
}

/// Output pin remembering its level
#[derive(Clone, Default)]
pub struct MockPin {
    level: Rc<Cell<Option<bool>>>,
    writes: Rc<Cell<u32>>,
}

impl MockPin {
    /// `None` until the first write
    pub fn level(&self) -> Option<bool> {
        self.level.get()
    }

    pub fn is_high(&self) -> bool {
        self.level.get() == Some(true)
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    fn write(&self, high: bool) {
        self.level.set(Some(high));
        self.writes.set(self.writes.get() + 1);
    }
}

impl ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// Output pin whose every write fails
#[derive(Clone, Copy, Default)]
pub struct FailingPin;

impl ErrorType for FailingPin {
    type Error = ErrorKind;
}

impl OutputPin for FailingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(ErrorKind::Other)
    }
}

/// Handler keeping (topic, text) of every message
#[derive(Clone, Default)]
pub struct RecordingHandler {
    seen: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingHandler {
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.borrow().clone()
    }
}

impl InboundHandler for RecordingHandler {
    fn on_message(&mut self, message: &InboundMessage<'_>) {
        self.seen
            .borrow_mut()
            .push((message.topic().to_string(), message.text().to_string()));
    }
}
