//! Inbound message dispatch
//!
//! The broker session hands every received PUBLISH to the [`Dispatcher`]
//! during its service pass. The dispatcher copies at most
//! [`PAYLOAD_CAPACITY`] bytes of the payload into a fixed buffer and
//! passes topic + bounded text to the application's [`InboundHandler`],
//! synchronously and fire-and-forget.

use heapless::Vec;

/// Visible bytes kept from an inbound payload
pub const PAYLOAD_CAPACITY: usize = 16;

/// Inbound payload cut to [`PAYLOAD_CAPACITY`] bytes
///
/// The copy behaves like a C string copy: it stops at the first NUL byte
/// as well as at the capacity. Excess bytes are silently discarded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundedPayload {
    bytes: Vec<u8, PAYLOAD_CAPACITY>,
    truncated: bool,
}

impl BoundedPayload {
    /// Copy the visible part of `payload`
    pub fn copy_from(payload: &[u8]) -> Self {
        let visible = payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(payload.len());
        let len = visible.min(PAYLOAD_CAPACITY);

        Self {
            // Cannot fail, len <= PAYLOAD_CAPACITY
            bytes: Vec::from_slice(&payload[..len]).unwrap_or_default(),
            truncated: visible > PAYLOAD_CAPACITY,
        }
    }

    /// Copied bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Longest valid UTF-8 prefix of the copied bytes
    ///
    /// The cut at the capacity may split a multi-byte character; the
    /// partial character is left out.
    pub fn text(&self) -> &str {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    /// Number of copied bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was copied
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether visible bytes were discarded
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Message handed to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    topic: &'a str,
    payload: BoundedPayload,
}

impl<'a> InboundMessage<'a> {
    /// Build a message from a raw PUBLISH
    pub fn new(topic: &'a str, payload: &[u8]) -> Self {
        Self {
            topic,
            payload: BoundedPayload::copy_from(payload),
        }
    }

    /// Topic the message arrived on
    pub fn topic(&self) -> &'a str {
        self.topic
    }

    /// Bounded payload
    pub fn payload(&self) -> &BoundedPayload {
        &self.payload
    }

    /// Bounded payload as text
    pub fn text(&self) -> &str {
        self.payload.text()
    }
}

/// Application hook for inbound messages
///
/// Called synchronously from within the session service pass; it must
/// not block. Closures taking `&InboundMessage` implement it directly.
pub trait InboundHandler {
    /// Handle one message
    fn on_message(&mut self, message: &InboundMessage<'_>);
}

impl<F> InboundHandler for F
where
    F: FnMut(&InboundMessage<'_>),
{
    fn on_message(&mut self, message: &InboundMessage<'_>) {
        self(message)
    }
}

/// Handler that only logs what arrives (debug verbosity)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

impl InboundHandler for LogHandler {
    fn on_message(&mut self, message: &InboundMessage<'_>) {
        log_debug!("Inbound message [{}] {}", message.topic(), message.text());
    }
}

/// Routes raw broker messages to the registered handler
#[derive(Debug)]
pub struct Dispatcher<H> {
    handler: H,
    delivered: u32,
}

impl<H: InboundHandler> Dispatcher<H> {
    /// Register `handler` as the single message consumer
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            delivered: 0,
        }
    }

    /// Bound the payload and hand the message to the handler
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) {
        let message = InboundMessage::new(topic, payload);
        if message.payload().is_truncated() {
            log_debug!("Inbound payload cut to {} bytes", PAYLOAD_CAPACITY);
        }
        self.handler.on_message(&message);
        self.delivered = self.delivered.wrapping_add(1);
    }

    /// Messages delivered since start-up (wrapping)
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// The registered handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The registered handler, mutably
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
