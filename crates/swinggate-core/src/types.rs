use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One physical gate arm with its own motor and open-position sensor.
///
/// `Left` is wired as GATE_1 and `Right` as GATE_2 on the controller board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leaf {
    Left,
    Right,
}

impl Leaf {
    /// Both leaves in wiring order.
    pub const ALL: [Leaf; 2] = [Leaf::Left, Leaf::Right];

    /// Zero-based index, usable for per-leaf arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Leaf::Left => 0,
            Leaf::Right => 1,
        }
    }

    /// Gate number as printed on the wiring diagram (1 or 2).
    #[inline]
    #[must_use]
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// The opposite leaf.
    #[inline]
    #[must_use]
    pub fn other(self) -> Leaf {
        match self {
            Leaf::Left => Leaf::Right,
            Leaf::Right => Leaf::Left,
        }
    }

    /// Create a leaf from its gate number.
    ///
    /// # Errors
    /// Returns `Error::InvalidLeaf` for anything but 1 or 2.
    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            1 => Ok(Leaf::Left),
            2 => Ok(Leaf::Right),
            other => Err(Error::InvalidLeaf(other)),
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "gate {}", self.number())
    }
}

/// Lifecycle of a single leaf.
///
/// The numeric values match the status codes logged by the controller
/// firmware and are used when restoring a leaf's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LeafStatus {
    Closed = 0,
    Opening = 1,
    Open = 2,
    Closing = 3,
}

impl LeafStatus {
    /// Convert the status to its numeric code.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` while the motor is expected to be running.
    #[inline]
    #[must_use]
    pub fn is_moving(self) -> bool {
        matches!(self, LeafStatus::Opening | LeafStatus::Closing)
    }
}

impl TryFrom<u8> for LeafStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(LeafStatus::Closed),
            1 => Ok(LeafStatus::Opening),
            2 => Ok(LeafStatus::Open),
            3 => Ok(LeafStatus::Closing),
            _ => Err(Error::UnknownLeafStatus { value }),
        }
    }
}

impl fmt::Display for LeafStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            LeafStatus::Closed => "Closed",
            LeafStatus::Opening => "Opening",
            LeafStatus::Open => "Open",
            LeafStatus::Closing => "Closing",
        };
        write!(f, "{s}")
    }
}

/// Digital inputs wired to the gate controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputId {
    /// Local "open gate" push button.
    OpenButton,
    /// Open-position limit sensor of a leaf.
    OpenSensor(Leaf),
    /// Through-beam sensor across the gate opening.
    BreakBeam,
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputId::OpenButton => write!(f, "open button"),
            InputId::OpenSensor(leaf) => write!(f, "{leaf} open sensor"),
            InputId::BreakBeam => write!(f, "break-beam sensor"),
        }
    }
}

/// Timer slots owned by the gate controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerId {
    /// Shared keep-open countdown that triggers the close sequence.
    Countdown,
    /// Open-loop close duration of one leaf.
    LeafClose(Leaf),
    /// Periodic status lamp toggle.
    LampBlink,
}

impl TimerId {
    /// Every timer slot, in a stable order.
    pub const ALL: [TimerId; 4] = [
        TimerId::Countdown,
        TimerId::LeafClose(Leaf::Left),
        TimerId::LeafClose(Leaf::Right),
        TimerId::LampBlink,
    ];
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimerId::Countdown => write!(f, "countdown timer"),
            TimerId::LeafClose(leaf) => write!(f, "{leaf} close timer"),
            TimerId::LampBlink => write!(f, "lamp blink timer"),
        }
    }
}

/// Radio node address (6-byte MAC of the node's station interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Broadcast address.
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl std::str::FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(Error::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(Error::InvalidMacAddress(s.to_string()));
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidMacAddress(s.to_string()))?;
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

/// RFID card unique identifier (4-10 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardUid(Vec<u8>);

impl CardUid {
    /// Create a UID with length validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the UID is not 4-10 bytes long.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidCardUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(CardUid(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex without prefix, e.g. `04ABCDEF`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(Error::InvalidCardUid(s.to_string()));
        }

        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| Error::InvalidCardUid(s.to_string()))?;
        CardUid::new(bytes)
    }
}

impl TryFrom<String> for CardUid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CardUid> for String {
    fn from(uid: CardUid) -> Self {
        uid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, LeafStatus::Closed)]
    #[case(1, LeafStatus::Opening)]
    #[case(2, LeafStatus::Open)]
    #[case(3, LeafStatus::Closing)]
    fn test_leaf_status_from_u8(#[case] value: u8, #[case] expected: LeafStatus) {
        assert_eq!(LeafStatus::try_from(value).unwrap(), expected);
        assert_eq!(expected.to_u8(), value);
    }

    #[test]
    fn test_leaf_status_unknown_value() {
        let err = LeafStatus::try_from(4).unwrap_err();
        assert!(matches!(err, Error::UnknownLeafStatus { value: 4 }));
    }

    #[test]
    fn test_leaf_numbering() {
        assert_eq!(Leaf::Left.number(), 1);
        assert_eq!(Leaf::Right.number(), 2);
        assert_eq!(Leaf::Left.other(), Leaf::Right);
        assert_eq!(Leaf::from_number(2).unwrap(), Leaf::Right);
        assert!(Leaf::from_number(3).is_err());
        assert_eq!(Leaf::Right.to_string(), "gate 2");
    }

    #[rstest]
    #[case("1c:69:20:ce:fa:24", [0x1c, 0x69, 0x20, 0xce, 0xfa, 0x24])]
    #[case("C8-2E-18-51-C8-5C", [0xc8, 0x2e, 0x18, 0x51, 0xc8, 0x5c])]
    fn test_mac_address_valid(#[case] input: &str, #[case] expected: [u8; 6]) {
        let mac: MacAddress = input.parse().unwrap();
        assert_eq!(mac.as_bytes(), &expected);
    }

    #[rstest]
    #[case("1c:69:20:ce:fa")] // too short
    #[case("1c:69:20:ce:fa:24:00")] // too long
    #[case("zz:69:20:ce:fa:24")] // not hex
    #[case("1c6:9:20:ce:fa:24")] // misaligned
    fn test_mac_address_invalid(#[case] input: &str) {
        assert!(input.parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_mac_address_display_round_trip() {
        let mac = MacAddress::new([0x84, 0x0d, 0x8e, 0xae, 0x59, 0x66]);
        assert_eq!(mac.to_string(), "84:0d:8e:ae:59:66");
        assert_eq!(mac.to_string().parse::<MacAddress>().unwrap(), mac);
    }

    #[rstest]
    #[case("0x04ABCDEF", vec![0x04, 0xAB, 0xCD, 0xEF])]
    #[case("04abcdef", vec![0x04, 0xAB, 0xCD, 0xEF])]
    #[case("0x01020304050607", vec![1, 2, 3, 4, 5, 6, 7])]
    fn test_card_uid_parse(#[case] input: &str, #[case] expected: Vec<u8>) {
        let uid: CardUid = input.parse().unwrap();
        assert_eq!(uid.as_bytes(), expected.as_slice());
    }

    #[rstest]
    #[case("0x010203")] // too short
    #[case("0x0102030405060708090A0B")] // too long
    #[case("0x0102030")] // odd length
    #[case("0xGG020304")] // not hex
    fn test_card_uid_invalid(#[case] input: &str) {
        assert!(input.parse::<CardUid>().is_err());
    }

    #[test]
    fn test_card_uid_display() {
        let uid = CardUid::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(uid.to_string(), "0x04ABCDEF");
        assert_eq!(uid.to_hex(), "04ABCDEF");
    }
}
