use crate::{
    Error, Instruction, PacketBuf,
    constants::{FRAME_OVERHEAD, MAX_PACKET_SIZE, Opcode, WordAddress},
    crc::Crc,
};

/// Frame a command body for transmission:
/// `[word address][len][body...][crc_lo][crc_hi]`.
///
/// The length byte counts itself, the body, and the CRC trailer; the CRC
/// covers `[len][body...]` and excludes the word-address byte.
pub fn frame(word_address: WordAddress, body: &[u8]) -> Result<PacketBuf, Error> {
    if body.is_empty() || body.len() + FRAME_OVERHEAD > MAX_PACKET_SIZE {
        return Err(Error::InvalidSize { body_len: body.len() });
    }
    let mut packet = PacketBuf::new();
    // The size check above bounds everything below by the buffer capacity.
    let _ = packet.push(word_address.repr());
    let _ = packet.push((body.len() + 3) as u8);
    let _ = packet.extend_from_slice(body);
    let mut crc = Crc::new();
    crc.push_all(&packet[1..]);
    let _ = packet.extend_from_slice(&crc.collapse().to_le_bytes());
    Ok(packet)
}

/// Read one four-byte word from a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct Read {
    pub zone: u8,
    pub address: u16,
}

impl Instruction for Read {
    const OPCODE: Opcode = Opcode::Read;
    const RESPONSE_LEN: usize = 4;
    const EXEC_TIME_US: u32 = 4_000;

    fn encode(&self) -> Result<PacketBuf, Error> {
        let address = self.address.to_le_bytes();
        let body = [Self::OPCODE.repr(), self.zone, address[0], address[1]];
        frame(WordAddress::Command, &body)
    }
}

/// Ask the RNG for a 32-byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct Random {
    /// 0x00 refreshes the EEPROM seed first; 0x01 uses the existing one.
    pub mode: u8,
}

impl Default for Random {
    fn default() -> Self {
        Self { mode: 0x01 }
    }
}

impl Instruction for Random {
    const OPCODE: Opcode = Opcode::Random;
    const RESPONSE_LEN: usize = 32;
    const EXEC_TIME_US: u32 = 50_000;

    fn encode(&self) -> Result<PacketBuf, Error> {
        frame(
            WordAddress::Command,
            &[Self::OPCODE.repr(), self.mode, 0x00, 0x00],
        )
    }
}
