//! Device identity
//!
//! The probe has a single identity: the 6-byte hardware address of its
//! Ethernet controller. It serves as DHCP client identifier and, printed
//! as uppercase colon-separated hex, as the broker client ID.
//!
//! ```ignore
//! let id = HardwareAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]).client_id();
//! assert_eq!(id.as_str(), "01:02:03:04:05:06");
//! ```

use core::fmt::{self, Write};

use heapless::String;

/// Length of the textual client ID: 6 octets * 2 hex digits + 5 colons
pub const CLIENT_ID_LEN: usize = 17;

/// Hardware (MAC) address, immutable for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareAddress([u8; 6]);

impl HardwareAddress {
    /// Wrap raw octets
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Raw octets, first transmitted first
    pub const fn octets(&self) -> &[u8; 6] {
        &self.0
    }

    /// Broker client ID in the form `XX:XX:XX:XX:XX:XX`
    ///
    /// Always exactly [`CLIENT_ID_LEN`] characters.
    pub fn client_id(&self) -> String<CLIENT_ID_LEN> {
        let mut client_id = String::<CLIENT_ID_LEN>::new();

        // Cannot fail: every octet renders as two digits, so the text is
        // always 17 bytes, which is exactly CLIENT_ID_LEN
        write!(client_id, "{}", self).expect("client ID should fit");

        client_id
    }
}

impl From<[u8; 6]> for HardwareAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self::new(octets)
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_format() {
        let id = HardwareAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]).client_id();
        assert_eq!(id.as_str(), "01:02:03:04:05:06");
    }

    #[test]
    fn test_client_id_uppercase() {
        let id = HardwareAddress::new([0xDE, 0xAD, 0xbe, 0xef, 0x0a, 0xff]).client_id();
        assert_eq!(id.as_str(), "DE:AD:BE:EF:0A:FF");
    }

    #[test]
    fn test_client_id_length_is_fixed() {
        let samples = [
            [0x00; 6],
            [0xFF; 6],
            [0x00, 0x01, 0x10, 0x7F, 0x80, 0xFE],
            [0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
        ];
        for octets in samples {
            let id = HardwareAddress::from(octets).client_id();
            assert_eq!(id.len(), CLIENT_ID_LEN, "wrong length for {:?}", octets);
            assert_eq!(id.matches(':').count(), 5);
        }
    }

    #[test]
    fn test_display_matches_client_id() {
        let address = HardwareAddress::new([0x02, 0x00, 0x00, 0x12, 0x34, 0x56]);
        assert_eq!(address.to_string(), address.client_id().as_str());
    }
}
