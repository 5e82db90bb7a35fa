//! Connectivity manager
//!
//! Owns the link and broker session state of the probe and drives the
//! reconnection protocol:
//!
//! 1. Link down: try to acquire an address. On failure the cycle ends
//!    there; there is no broker attempt without a link.
//! 2. Link up, no session: connect with the client ID derived from the
//!    hardware address, subscribe to the command topic, light the
//!    indicator. On failure wait for the next supervisory interval.
//! 3. Link up, session alive: nothing to do.
//!
//! The link is never re-validated once up (DHCP is slow and the wire is
//! reliable); the session is re-checked every cycle by asking the broker
//! client directly, since broker drops are the common failure.
//!
//! # Usage
//!
//! ```ignore
//! let mut manager = ConnectivityManager::new(config, link, session, clock, led, LogHandler)?;
//! manager.begin(&mut sd_card_cs).await;
//! loop {
//!     manager.tick().await;
//!     manager.publish("temperature", dht.read_temperature()).await;
//! }
//! ```
//!
//! None of `begin`, `tick` and `publish` can fail. They return reports
//! describing what happened, which the caller is free to ignore.

use embedded_hal::digital::OutputPin;
use hal_abstractions::network::Ipv4Octets;
use hal_abstractions::{BrokerSession, Clock, ConnectOptions, LinkDriver, LinkError, SessionError};
use heapless::String;

use crate::config::ProbeConfig;
use crate::encode::{OutboundMessage, MESSAGE_CAPACITY};
use crate::error::{ConfigError, EncodeError};
use crate::identity::CLIENT_ID_LEN;
use crate::inbound::{Dispatcher, InboundHandler};
use crate::log::Verbosity;
use crate::timer::SupervisoryTimer;

/// State of the physical network link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No address yet, or explicitly marked for redetection
    Down,
    /// Address acquired
    Up,
}

/// State of the broker session, as reported live by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No active session
    Disconnected,
    /// Session established and alive
    Connected,
}

/// Link part of a reconnection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStep {
    /// Link was already up, nothing attempted
    AlreadyUp,
    /// Address acquired in this cycle
    Acquired(Ipv4Octets),
    /// Address acquisition failed
    Failed(LinkError),
}

/// Session part of a reconnection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionStep {
    /// No link, broker not attempted
    SkippedNoLink,
    /// Session was already alive
    AlreadyConnected,
    /// Session established in this cycle
    Connected {
        /// Whether the command topic subscription went through
        subscribed: bool,
    },
    /// Broker connection failed
    Failed(SessionError),
}

/// Outcome of one run of the reconnection protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReconnectReport {
    /// What happened on the link
    pub link: LinkStep,
    /// What happened with the broker
    pub session: SessionStep,
}

impl ReconnectReport {
    /// Whether a session is up at the end of the cycle
    pub fn is_ready(&self) -> bool {
        matches!(
            self.session,
            SessionStep::AlreadyConnected | SessionStep::Connected { .. }
        )
    }

    /// Most severe log level the cycle produced, `None` for an idle cycle
    pub fn severity(&self) -> Option<Verbosity> {
        let failed = matches!(self.link, LinkStep::Failed(_))
            || matches!(
                self.session,
                SessionStep::Failed(_) | SessionStep::Connected { subscribed: false }
            );
        if failed {
            return Some(Verbosity::Warn);
        }

        let changed = matches!(self.link, LinkStep::Acquired(_))
            || matches!(self.session, SessionStep::Connected { .. });
        changed.then_some(Verbosity::Info)
    }
}

/// Outcome of servicing the broker session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceStep {
    /// Service pass completed
    Serviced {
        /// Inbound messages handed to the handler
        dispatched: u32,
    },
    /// Service pass completed but the session is gone afterwards
    Lost,
    /// Service pass failed
    Failed(SessionError),
}

/// Outcome of one [`ConnectivityManager::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Set when the supervisory interval elapsed and the protocol ran
    pub reconnect: Option<ReconnectReport>,
    /// Set when a session was alive and got serviced
    pub service: Option<ServiceStep>,
}

/// Outcome of one [`ConnectivityManager::publish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// No session, reading dropped
    Skipped,
    /// Handed to the broker client
    Sent {
        /// Message was cut to fit the buffer
        truncated: bool,
    },
    /// Reading could not be encoded
    Rejected(EncodeError),
    /// Broker client refused the message
    Failed(SessionError),
}

/// Link, session and indicator supervisor
///
/// Generic over the board's link driver `L`, broker client `S`, clock `C`,
/// indicator output `I` and inbound handler `H`.
pub struct ConnectivityManager<L, S, C, I, H> {
    config: ProbeConfig,
    client_id: String<CLIENT_ID_LEN>,
    link: L,
    session: S,
    clock: C,
    indicator: I,
    dispatcher: Dispatcher<H>,
    link_state: LinkState,
    timer: SupervisoryTimer,
}

impl<L, S, C, I, H> ConnectivityManager<L, S, C, I, H>
where
    L: LinkDriver,
    S: BrokerSession,
    C: Clock,
    I: OutputPin,
    H: InboundHandler,
{
    /// Create a manager with the link down and no session
    ///
    /// Nothing touches the hardware until [`begin`](Self::begin) or the
    /// first [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` does not validate.
    pub fn new(
        config: ProbeConfig,
        link: L,
        session: S,
        clock: C,
        indicator: I,
        handler: H,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            client_id: config.hw_address.client_id(),
            timer: SupervisoryTimer::new(config.supervisory_interval_ms),
            config,
            link,
            session,
            clock,
            indicator,
            dispatcher: Dispatcher::new(handler),
            link_state: LinkState::Down,
        })
    }

    /// Start-up sequence
    ///
    /// Sets the supervisory baseline, disables the SD card sharing the
    /// SPI bus (chip select high), turns the indicator off and runs one
    /// reconnection attempt. Failures are left to later ticks.
    pub async fn begin<P: OutputPin>(&mut self, card_select: &mut P) -> ReconnectReport {
        self.timer.reset(self.clock.now_ms());

        if card_select.set_high().is_err() {
            log_error!("Failed to deselect SD card");
        }
        self.set_indicator(false);

        self.reconnect().await
    }

    /// Periodic servicing, call as often as the main loop allows
    ///
    /// Runs the reconnection protocol once per supervisory interval, then
    /// services the broker session if one is alive. Inbound messages are
    /// dispatched from within this call.
    pub async fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let reconnect = if self.timer.poll(now) {
            Some(self.reconnect().await)
        } else {
            None
        };

        let service = if self.session.is_connected() {
            Some(self.service().await)
        } else {
            None
        };

        TickReport { reconnect, service }
    }

    /// Run the reconnection protocol now, regardless of the timer
    pub async fn reconnect(&mut self) -> ReconnectReport {
        let link = match self.link_state {
            LinkState::Up => LinkStep::AlreadyUp,
            LinkState::Down => match self.acquire_link().await {
                Ok(address) => LinkStep::Acquired(address),
                Err(e) => {
                    return ReconnectReport {
                        link: LinkStep::Failed(e),
                        session: SessionStep::SkippedNoLink,
                    };
                }
            },
        };

        let session = if self.session.is_connected() {
            // Keep the indicator in line after a link redetection
            self.set_indicator(true);
            SessionStep::AlreadyConnected
        } else {
            self.connect_session().await
        };

        ReconnectReport { link, session }
    }

    /// Publish one reading, best effort
    ///
    /// Dropped silently when no session is alive. Oversized messages are
    /// truncated and still sent.
    pub async fn publish(&mut self, field: &str, value: f32) -> PublishOutcome {
        if !self.session.is_connected() {
            return PublishOutcome::Skipped;
        }

        let message = match OutboundMessage::encode(
            self.config.publication_topic,
            self.config.location,
            field,
            value,
        ) {
            Ok(message) => message,
            Err(e) => {
                log_warn!("Reading {} not published: {}", field, e);
                return PublishOutcome::Rejected(e);
            }
        };

        if message.is_truncated() {
            log_warn!("Message for {} cut to {} bytes", field, MESSAGE_CAPACITY);
        }

        match self
            .session
            .publish(self.config.publication_topic, message.as_bytes())
            .await
        {
            Ok(()) => {
                log_debug!("{}", message.as_str());
                PublishOutcome::Sent {
                    truncated: message.is_truncated(),
                }
            }
            Err(e) => {
                log_warn!("Failed to publish {}: {}", field, e);
                PublishOutcome::Failed(e)
            }
        }
    }

    /// Force address re-acquisition on the next cycle
    ///
    /// The only way the link goes from up to down: broker failures never
    /// demote it.
    pub fn redetect_link(&mut self) {
        if self.link_state == LinkState::Up {
            log_info!("Link marked for redetection");
        }
        self.link_state = LinkState::Down;
        self.set_indicator(false);
    }

    /// Current link state
    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    /// Session state, queried from the broker client
    pub fn session_state(&self) -> SessionState {
        if self.session.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Broker client ID derived from the hardware address
    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// Active configuration
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Supervisory timer state
    pub fn timer(&self) -> &SupervisoryTimer {
        &self.timer
    }

    /// Inbound dispatcher and its handler
    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    /// Inbound dispatcher, mutably
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<H> {
        &mut self.dispatcher
    }

    /// Link driver
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Broker client
    pub fn session(&self) -> &S {
        &self.session
    }

    async fn acquire_link(&mut self) -> Result<Ipv4Octets, LinkError> {
        log_info!("Acquiring address...");
        match self
            .link
            .acquire(self.config.hw_address.octets(), self.config.link_timeout_ms)
            .await
        {
            Ok(address) => {
                self.link_state = LinkState::Up;
                log_info!(
                    "DHCP assigned IP {}.{}.{}.{}",
                    address[0],
                    address[1],
                    address[2],
                    address[3]
                );
                Ok(address)
            }
            Err(e) => {
                self.set_indicator(false);
                log_warn!("Address acquisition failed: {}", e);
                Err(e)
            }
        }
    }

    async fn connect_session(&mut self) -> SessionStep {
        let broker = self.config.broker;
        log_info!(
            "Connecting to broker {}:{} as {}",
            broker.host,
            broker.port,
            self.client_id.as_str()
        );

        let (username, password) = broker.credentials();
        let options = ConnectOptions {
            host: broker.host,
            port: broker.port,
            client_id: self.client_id.as_str(),
            username,
            password,
            keep_alive_secs: broker.keep_alive_secs,
        };

        if let Err(e) = self.session.connect(&options).await {
            self.set_indicator(false);
            log_warn!("Failed to connect to broker: {}", e);
            return SessionStep::Failed(e);
        }

        let topic = self.config.subscription_topic;
        let subscribed = match self.session.subscribe(topic).await {
            Ok(()) => true,
            Err(e) => {
                log_warn!("Failed to subscribe to {}: {}", topic, e);
                false
            }
        };

        self.set_indicator(true);
        log_info!("Connected to broker");
        SessionStep::Connected { subscribed }
    }

    async fn service(&mut self) -> ServiceStep {
        let dispatcher = &mut self.dispatcher;
        let mut dispatched = 0u32;

        let result = self
            .session
            .service(|topic, payload| {
                dispatched += 1;
                dispatcher.dispatch(topic, payload);
            })
            .await;

        let step = match result {
            Ok(()) if self.session.is_connected() => return ServiceStep::Serviced { dispatched },
            Ok(()) => ServiceStep::Lost,
            Err(e) => ServiceStep::Failed(e),
        };

        self.set_indicator(false);
        log_warn!("Broker session lost");
        step
    }

    fn set_indicator(&mut self, ready: bool) {
        let result = if ready {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
        if result.is_err() {
            log_error!("Failed to drive status indicator");
        }
    }
}
