//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; the platform-agnostic
//! logic in `probe-core` only ever talks to them.
//!
//! - **`clock`**: monotonic millisecond clock
//! - **`network`**: link (DHCP) and broker session capabilities
//!
//! GPIO lines are not abstracted here: `embedded_hal::digital::OutputPin`
//! already covers them.
//!
//! With the `embassy` feature enabled, adapters over `embassy-time` and
//! `embassy-net` are provided for boards running the embassy network stack.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod clock;
pub mod network;

pub use clock::Clock;
pub use network::{BrokerSession, ConnectOptions, LinkDriver, LinkError, SessionError};
