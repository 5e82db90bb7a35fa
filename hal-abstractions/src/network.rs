//! Network capabilities: link acquisition and broker session
//!
//! The connectivity logic never touches sockets directly. A board provides
//! one [`LinkDriver`] (address acquisition on the wired interface) and one
//! [`BrokerSession`] (the publish/subscribe client running over it).
//!
//! Every method that may suspend returns a future. Implementations must
//! bound each call with a timeout: the caller shares a single thread of
//! execution with sensor polling and has no way to cancel a stalled call.

use core::future::Future;

/// IPv4 address as four octets, most significant first
pub type Ipv4Octets = [u8; 4];

/// Link acquisition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// No lease obtained before the timeout elapsed
    Timeout,
    /// The stack came up without an IPv4 configuration
    NoLease,
    /// Interface or PHY failure
    Hardware,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "address acquisition timed out"),
            Self::NoLease => write!(f, "no address lease"),
            Self::Hardware => write!(f, "link hardware error"),
        }
    }
}

impl core::error::Error for LinkError {}

/// Broker session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// TCP connection to the broker could not be opened
    Unreachable,
    /// Broker rejected the connection (bad credentials, client id in use, ...)
    Refused,
    /// No answer within the transport timeout
    Timeout,
    /// Operation requires an active session
    NotConnected,
    /// Malformed or unexpected packet
    Protocol,
    /// Socket read/write failure
    Io,
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "broker unreachable"),
            Self::Refused => write!(f, "connection refused by broker"),
            Self::Timeout => write!(f, "broker timeout"),
            Self::NotConnected => write!(f, "no active session"),
            Self::Protocol => write!(f, "protocol error"),
            Self::Io => write!(f, "socket I/O error"),
        }
    }
}

impl core::error::Error for SessionError {}

/// Address acquisition on the physical interface
pub trait LinkDriver {
    /// Bring the interface up and obtain an address (DHCP)
    ///
    /// `hw_addr` doubles as the DHCP client identifier. The call must give
    /// up after `timeout_ms` and report [`LinkError::Timeout`].
    fn acquire(
        &mut self,
        hw_addr: &[u8; 6],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<Ipv4Octets, LinkError>>;
}

/// Parameters of a broker CONNECT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    /// Broker address (IP literal or hostname)
    pub host: &'a str,
    /// Broker TCP port
    pub port: u16,
    /// Client identifier presented to the broker
    pub client_id: &'a str,
    /// `None` means an anonymous connection
    pub username: Option<&'a str>,
    /// Only meaningful together with a username
    pub password: Option<&'a str>,
    /// Keep-alive interval in seconds (0 disables keep-alive)
    pub keep_alive_secs: u16,
}

/// Publish/subscribe client bound to one broker
pub trait BrokerSession {
    /// Open a session with the broker
    fn connect(
        &mut self,
        options: &ConnectOptions<'_>,
    ) -> impl Future<Output = Result<(), SessionError>>;

    /// Whether the session is alive right now
    ///
    /// Must reflect the transport's current view (socket closed, keep-alive
    /// missed, ...), not a flag cached at connect time.
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic filter
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), SessionError>>;

    /// Publish a payload on a topic (fire-and-forget, QoS 0)
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), SessionError>>;

    /// Run one bounded service pass
    ///
    /// Handles buffered inbound packets and sends keep-alives when due.
    /// Every inbound PUBLISH is handed to `on_message` as `(topic, payload)`,
    /// synchronously, before the future completes.
    fn service<F>(&mut self, on_message: F) -> impl Future<Output = Result<(), SessionError>>
    where
        F: FnMut(&str, &[u8]);
}

/// DHCPv4 link over an `embassy-net` stack
///
/// The stack must have been created with `Config::dhcpv4(..)` and a device
/// carrying the probe's hardware address; the DHCP client then runs in the
/// stack runner and this adapter only waits for the lease.
#[cfg(any(feature = "embassy", test))]
pub struct DhcpLink<'d> {
    stack: embassy_net::Stack<'d>,
}

#[cfg(any(feature = "embassy", test))]
impl<'d> DhcpLink<'d> {
    /// Wrap an initialized stack
    pub fn new(stack: embassy_net::Stack<'d>) -> Self {
        Self { stack }
    }
}

#[cfg(any(feature = "embassy", test))]
impl LinkDriver for DhcpLink<'_> {
    async fn acquire(
        &mut self,
        hw_addr: &[u8; 6],
        timeout_ms: u32,
    ) -> Result<Ipv4Octets, LinkError> {
        // The DHCP client identifies itself with the device's address
        check_hardware_address(hw_addr, self.stack.hardware_address())?;

        wait_with_timeout(self.stack.wait_config_up(), timeout_ms).await?;

        self.stack
            .config_v4()
            .map(|config| config.address.address().octets())
            .ok_or(LinkError::NoLease)
    }
}

#[cfg(any(feature = "embassy", test))]
fn check_hardware_address(
    expected: &[u8; 6],
    actual: embassy_net::HardwareAddress,
) -> Result<(), LinkError> {
    if actual == embassy_net::HardwareAddress::Ethernet(embassy_net::EthernetAddress(*expected)) {
        Ok(())
    } else {
        Err(LinkError::Hardware)
    }
}

#[cfg(any(feature = "embassy", test))]
async fn wait_with_timeout<F: Future>(future: F, timeout_ms: u32) -> Result<F::Output, LinkError> {
    embassy_time::with_timeout(
        embassy_time::Duration::from_millis(u64::from(timeout_ms)),
        future,
    )
    .await
    .map_err(|_| LinkError::Timeout)
}
