use crate::{Error, constants::MIN_PACKET_SIZE, crc};

/// Validate a response packet and expose its payload.
///
/// The payload is everything between the length byte and the CRC trailer:
/// `n - 3` bytes of a packet of total length `n`. Nothing is returned unless
/// the trailer checks out.
pub fn validate(packet: &[u8]) -> Result<&[u8], Error> {
    if packet.len() < MIN_PACKET_SIZE {
        return Err(Error::Malformed { len: packet.len() });
    }
    let split = packet.len() - 2;
    let claimed = u16::from_le_bytes([packet[split], packet[split + 1]]);
    let computed = crc::crc16(&packet[..split]);
    if claimed != computed {
        return Err(Error::ChecksumMismatch { claimed, computed });
    }
    Ok(&packet[1..split])
}

/// Validate and require exactly the four payload bytes of a word read.
pub fn expect_word(packet: &[u8]) -> Result<[u8; 4], Error> {
    let payload = validate(packet)?;
    payload.try_into().map_err(|_| Error::UnexpectedLength {
        expected: 4,
        actual: payload.len(),
    })
}
