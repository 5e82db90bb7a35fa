//! Probe configuration
//!
//! Compile-time settings live in the constants below. [`ProbeConfig`]
//! bundles them for the manager; its `Default` is built from the
//! constants so firmware normally never spells a value twice.

use crate::error::ConfigError;
use crate::identity::HardwareAddress;
use crate::log::Verbosity;

/// Log verbosity: 0 none, 1 error/warning, 2 info, 3 debug
pub const LOG_VERBOSITY: Verbosity = Verbosity::from_level(2);

/// Hardware address of the Ethernet controller (printed on the board)
pub const HW_ADDRESS: [u8; 6] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

/// Upper bound for one DHCP attempt in milliseconds
pub const LINK_TIMEOUT_MS: u32 = 5000;

/// Broker address (IP literal or hostname)
pub const BROKER_HOST: &str = "192.168.0.1";

/// Broker TCP port (plain MQTT)
pub const BROKER_PORT: u16 = 1883;

/// Broker username; empty means anonymous
pub const BROKER_USERNAME: &str = "";

/// Broker password; ignored for anonymous sessions
pub const BROKER_PASSWORD: &str = "";

/// Keep-alive announced in CONNECT, in seconds
pub const KEEP_ALIVE_SECS: u16 = 15;

/// Topic every reading is published on
pub const PUBLICATION_TOPIC: &str = "probes";

/// Topic the probe listens on for commands
pub const SUBSCRIPTION_TOPIC: &str = "probes/com";

/// Location tag embedded in each reading
pub const LOCATION: &str = "living_room";

/// Period of the link/session health check in milliseconds
pub const SUPERVISORY_INTERVAL_MS: u64 = 30_000;

/// Broker connection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Broker hostname or IP literal
    pub host: &'static str,
    /// Broker port (typically 1883 for plain MQTT)
    pub port: u16,
    /// Username, empty for anonymous sessions
    pub username: &'static str,
    /// Password, only sent with a username
    pub password: &'static str,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
}

impl BrokerConfig {
    /// Credentials as sent in CONNECT
    ///
    /// An empty username means no authentication at all, whatever the
    /// password holds. An empty password is sent as absent.
    pub fn credentials(&self) -> (Option<&'static str>, Option<&'static str>) {
        if self.username.is_empty() {
            return (None, None);
        }
        let password = (!self.password.is_empty()).then_some(self.password);
        (Some(self.username), password)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: BROKER_HOST,
            port: BROKER_PORT,
            username: BROKER_USERNAME,
            password: BROKER_PASSWORD,
            keep_alive_secs: KEEP_ALIVE_SECS,
        }
    }
}

/// Connectivity manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Identity used for DHCP and as broker client id
    pub hw_address: HardwareAddress,
    /// Timeout of one address acquisition attempt
    pub link_timeout_ms: u32,
    /// Broker endpoint and credentials
    pub broker: BrokerConfig,
    /// Outbound topic (also the measurement name in the message body)
    pub publication_topic: &'static str,
    /// Inbound command topic
    pub subscription_topic: &'static str,
    /// Location tag value
    pub location: &'static str,
    /// Supervisory interval
    pub supervisory_interval_ms: u64,
}

impl ProbeConfig {
    /// Check topics and tags before they reach the broker
    ///
    /// The publication topic follows MQTT topic-name rules: non-empty, no
    /// wildcards, no NUL. The subscription topic is a filter, so wildcards
    /// are allowed there. The location ends up inside a line-protocol tag
    /// and must be free of separators.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_topic(self.publication_topic, false)?;
        validate_topic(self.subscription_topic, true)?;

        if self.location.is_empty() {
            return Err(ConfigError::EmptyLocation);
        }
        if self
            .location
            .chars()
            .any(|c| matches!(c, ' ' | ',' | '=' | '\0'))
        {
            return Err(ConfigError::InvalidLocation);
        }
        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            hw_address: HardwareAddress::new(HW_ADDRESS),
            link_timeout_ms: LINK_TIMEOUT_MS,
            broker: BrokerConfig::default(),
            publication_topic: PUBLICATION_TOPIC,
            subscription_topic: SUBSCRIPTION_TOPIC,
            location: LOCATION,
            supervisory_interval_ms: SUPERVISORY_INTERVAL_MS,
        }
    }
}

fn validate_topic(topic: &str, is_filter: bool) -> Result<(), ConfigError> {
    if topic.is_empty() {
        return Err(ConfigError::EmptyTopic);
    }
    if topic.contains('\0') || (!is_filter && (topic.contains('+') || topic.contains('#'))) {
        return Err(ConfigError::InvalidTopic);
    }
    Ok(())
}
