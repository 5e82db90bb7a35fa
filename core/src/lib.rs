//! Platform-agnostic core logic for the environmental probe
//!
//! This crate contains the connectivity and publication logic shared by
//! all supported boards. It has NO hardware dependencies: the network
//! link, the broker client and the clock come in through the traits of
//! `hal-abstractions`, GPIO lines through `embedded-hal`.
//!
//! - **`config`**: compile-time settings and [`ProbeConfig`]
//! - **`identity`**: hardware address and broker client identifier
//! - **`encode`**: reading → line-protocol message, bounded
//! - **`inbound`**: bounded copy of inbound payloads and handler dispatch
//! - **`timer`**: supervisory re-check interval
//! - **`manager`**: [`ConnectivityManager`], the state machine tying it together
//!
//! ## Driving the manager
//!
//! ```ignore
//! let mut manager = ConnectivityManager::new(
//!     ProbeConfig::default(),
//!     DhcpLink::new(stack),
//!     mqtt_session,
//!     EmbassyClock,
//!     led,
//!     LogHandler,
//! )?;
//! manager.begin(&mut sd_card_cs).await;
//!
//! loop {
//!     manager.tick().await;
//!     if reading_due {
//!         manager.publish("temperature", sensor.read()).await;
//!     }
//!     Timer::after_millis(100).await;
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod log;

pub mod config;
pub mod encode;
pub mod error;
pub mod identity;
pub mod inbound;
pub mod manager;
pub mod timer;

#[cfg(test)]
mod mock;

pub use config::{BrokerConfig, ProbeConfig};
pub use encode::{OutboundMessage, SplitValue};
pub use error::{ConfigError, EncodeError};
pub use identity::HardwareAddress;
pub use inbound::{BoundedPayload, InboundHandler, InboundMessage, LogHandler};
pub use log::Verbosity;
pub use manager::{
    ConnectivityManager, LinkState, LinkStep, PublishOutcome, ReconnectReport, ServiceStep,
    SessionState, SessionStep, TickReport,
};
