use enum_repr::EnumRepr;

/// First byte of every host write: tells the chip what the write means.
///
/// Only `Command` starts a framed packet; the other three are sent alone as
/// single-byte writes.
#[EnumRepr(type = "u8")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum WordAddress {
    Reset = 0x00,
    Sleep = 0x01,
    Idle = 0x02,
    Command = 0x03,
}

/// Command opcodes this crate builds packets for.
#[EnumRepr(type = "u8")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Opcode {
    Read = 0x02,
    Random = 0x1B,
}

/// Status byte of a 4-byte wake acknowledgement.
pub const WAKE_OK: u8 = 0x11;

/// Smallest well-formed packet: length byte, one payload byte, CRC trailer.
pub const MIN_PACKET_SIZE: usize = 4;
/// The length field is one byte, so no packet exceeds this.
pub const MAX_PACKET_SIZE: usize = 255;
/// Word-address byte + length byte + CRC trailer around a command body.
pub const FRAME_OVERHEAD: usize = 4;

/// Bounds on a caller-supplied command body: at least opcode + param1 +
/// param2, at most what fits the length field once framed.
pub const MIN_BODY_SIZE: usize = 4;
pub const MAX_BODY_SIZE: usize = MAX_PACKET_SIZE - FRAME_OVERHEAD;

/// Zone selector for the configuration region.
pub const ZONE_CONFIG: u8 = 0x00;

/// Config-zone word holding the two lock bytes.
pub const LOCK_WORD_ADDR: u16 = 0x15;
/// Value of a lock byte while its zone is still unlocked.
pub const UNLOCKED: u8 = 0x55;
/// Byte offsets of the lock flags within the lock word.
pub const LOCK_CONFIG_OFFSET: usize = 3;
pub const LOCK_DATA_OFFSET: usize = 2;
