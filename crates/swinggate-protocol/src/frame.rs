use crate::commands::CommandCode;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use swinggate_core::{CardUid, Error, Result, constants::*};

/// A decoded relay frame.
///
/// # Wire Format
///
/// ```text
/// 01                  open request
/// A1 04 AB CD EF      card scan of UID 0x04ABCDEF
/// A2                  access granted
/// A3                  access denied
/// ```
///
/// Decoding is exact: a single-byte command followed by extra bytes is
/// rejected rather than truncated.
///
/// ```
/// use swinggate_core::CardUid;
/// use swinggate_protocol::RelayFrame;
///
/// let uid = CardUid::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
/// let frame = RelayFrame::CardScan(uid);
///
/// let bytes = frame.encode();
/// assert_eq!(&bytes[..], &[0xA1, 0x04, 0xAB, 0xCD, 0xEF]);
/// assert_eq!(RelayFrame::decode(&bytes).unwrap(), frame);
///
/// assert_eq!(RelayFrame::decode(&[0x01]).unwrap(), RelayFrame::OpenRequest);
/// assert!(RelayFrame::decode(&[0x01, 0x01]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelayFrame {
    OpenRequest,
    CardScan(CardUid),
    AccessGranted,
    AccessDenied,
}

impl RelayFrame {
    pub fn command(&self) -> CommandCode {
        match self {
            Self::OpenRequest => CommandCode::OpenRequest,
            Self::CardScan(_) => CommandCode::CardScan,
            Self::AccessGranted => CommandCode::AccessGranted,
            Self::AccessDenied => CommandCode::AccessDenied,
        }
    }

    /// Returns `true` for the two admin decisions.
    pub fn is_decision(&self) -> bool {
        matches!(self, Self::AccessGranted | Self::AccessDenied)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + MAX_UID_LENGTH);
        buf.put_u8(self.command().as_byte());
        if let Self::CardScan(uid) = self {
            buf.put_slice(uid.as_bytes());
        }
        buf.freeze()
    }

    /// Decode one frame.
    ///
    /// # Errors
    ///
    /// - `Error::EmptyFrame` for an empty payload
    /// - `Error::UnknownCommandCode` if the first byte is not a command code
    /// - `Error::InvalidFrameLength` if the length does not match the command
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&code, payload) = bytes.split_first().ok_or(Error::EmptyFrame)?;
        let command = CommandCode::from_byte(code)?;

        match command {
            CommandCode::CardScan => {
                if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&payload.len()) {
                    return Err(Error::InvalidFrameLength {
                        command: command.name(),
                        expected: format!("{}-{}", MIN_UID_LENGTH + 1, MAX_UID_LENGTH + 1),
                        actual: bytes.len(),
                    });
                }
                Ok(Self::CardScan(CardUid::new(payload)?))
            }
            CommandCode::OpenRequest => bare(command, bytes).map(|()| Self::OpenRequest),
            CommandCode::AccessGranted => bare(command, bytes).map(|()| Self::AccessGranted),
            CommandCode::AccessDenied => bare(command, bytes).map(|()| Self::AccessDenied),
        }
    }
}

/// Single-byte commands carry nothing after the code.
fn bare(command: CommandCode, bytes: &[u8]) -> Result<()> {
    if bytes.len() != 1 {
        return Err(Error::InvalidFrameLength {
            command: command.name(),
            expected: "1".to_string(),
            actual: bytes.len(),
        });
    }
    Ok(())
}

impl fmt::Display for RelayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CardScan(uid) => write!(f, "card scan {uid}"),
            other => write!(f, "{}", other.command().name()),
        }
    }
}

impl From<&RelayFrame> for Bytes {
    fn from(frame: &RelayFrame) -> Self {
        frame.encode()
    }
}

impl TryFrom<&[u8]> for RelayFrame {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RelayFrame::OpenRequest, &[0x01])]
    #[case(RelayFrame::AccessGranted, &[0xA2])]
    #[case(RelayFrame::AccessDenied, &[0xA3])]
    fn test_single_byte_frames(#[case] frame: RelayFrame, #[case] wire: &[u8]) {
        assert_eq!(&frame.encode()[..], wire);
        assert_eq!(RelayFrame::decode(wire).unwrap(), frame);
    }

    #[test]
    fn test_card_scan_with_seven_byte_uid() {
        let wire = [0xA1, 0x04, 0x52, 0x8C, 0x1A, 0x3B, 0x61, 0x80];
        let frame = RelayFrame::decode(&wire).unwrap();
        match &frame {
            RelayFrame::CardScan(uid) => assert_eq!(uid.to_hex(), "04528C1A3B6180"),
            other => panic!("expected card scan, got {other:?}"),
        }
        assert_eq!(&frame.encode()[..], &wire);
    }

    #[test]
    fn test_empty_frame() {
        assert!(matches!(RelayFrame::decode(&[]), Err(Error::EmptyFrame)));
    }

    #[rstest]
    #[case(&[0xA1])]
    #[case(&[0xA1, 0x01, 0x02, 0x03])]
    #[case(&[0xA1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10])]
    fn test_card_scan_bad_length(#[case] wire: &[u8]) {
        assert!(matches!(
            RelayFrame::decode(wire),
            Err(Error::InvalidFrameLength { command: "card scan", .. })
        ));
    }

    #[rstest]
    #[case(&[0x01, 0x00])]
    #[case(&[0xA2, 0xA2])]
    #[case(&[0xA3, 0x01, 0x02])]
    fn test_trailing_bytes_rejected(#[case] wire: &[u8]) {
        assert!(matches!(
            RelayFrame::decode(wire),
            Err(Error::InvalidFrameLength { actual, .. }) if actual == wire.len()
        ));
    }

    #[test]
    fn test_serde_json_round_trip() {
        let uid = CardUid::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        for frame in [
            RelayFrame::OpenRequest,
            RelayFrame::CardScan(uid),
            RelayFrame::AccessDenied,
        ] {
            let json = serde_json::to_string(&frame).unwrap();
            let back: RelayFrame = serde_json::from_str(&json).unwrap();
            assert_eq!(back, frame);
        }
        assert_eq!(
            serde_json::to_string(&RelayFrame::OpenRequest).unwrap(),
            "\"OpenRequest\""
        );
    }

    #[test]
    fn test_display() {
        let uid = CardUid::new(vec![0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(RelayFrame::CardScan(uid).to_string(), "card scan 0xDEADBEEF");
        assert_eq!(RelayFrame::AccessDenied.to_string(), "access denied");
        assert!(RelayFrame::AccessDenied.is_decision());
        assert!(!RelayFrame::OpenRequest.is_decision());
    }
}
