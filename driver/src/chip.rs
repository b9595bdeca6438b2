//! Owned handle to one chip: high-level operations and the pass-through
//! session.

use {
    crate::{
        ChipError, OpenError,
        bus::Bus,
        comm::Comm,
        mutex::Mutex,
    },
    core::sync::atomic::{AtomicBool, Ordering},
    embedded_hal_async::delay::DelayNs,
    sha204_packet::{
        Instruction, PacketBuf, constants, recv,
        send::{self, Random, Read},
    },
};

/// One attached chip.
///
/// The bus lock serializes transactions; the availability flag additionally
/// admits at most one open [`Session`] at a time, independent of that lock.
pub struct Chip<M> {
    bus: M,
    available: AtomicBool,
}

impl<C, D, M> Chip<M>
where
    C: Comm,
    D: DelayNs,
    M: Mutex<Item = Bus<C, D>>,
{
    pub fn new(bus: Bus<C, D>) -> Self {
        Self {
            bus: M::new(bus),
            available: AtomicBool::new(true),
        }
    }

    /// Confirm something is on the bus: wake it, then park it again.
    pub async fn probe(&self) -> Result<(), ChipError<C, M>> {
        let mut bus = self.bus.lock().await.map_err(ChipError::Mutex)?;
        bus.wake().await.map_err(ChipError::Bus)?;
        bus.idle().await;
        Ok(())
    }

    async fn run<I: Instruction>(&self, instruction: &I) -> Result<PacketBuf, ChipError<C, M>> {
        let command = instruction.encode().map_err(ChipError::Packet)?;
        let mut bus = self.bus.lock().await.map_err(ChipError::Mutex)?;
        bus.transact(&command, I::EXEC_TIME_US)
            .await
            .map_err(ChipError::Bus)
    }

    /// Read one four-byte word from a zone.
    pub async fn read_word(&self, zone: u8, address: u16) -> Result<[u8; 4], ChipError<C, M>> {
        let raw = self.run(&Read { zone, address }).await?;
        recv::expect_word(&raw).map_err(ChipError::Packet)
    }

    /// Fill `out` with chip-generated random bytes, returning how many one
    /// response could cover.
    pub async fn random(&self, out: &mut [u8]) -> Result<usize, ChipError<C, M>> {
        let raw = self.run(&Random::default()).await?;
        let payload = recv::validate(&raw).map_err(ChipError::Packet)?;
        let n = out.len().min(payload.len());
        out[..n].copy_from_slice(&payload[..n]);
        log::debug!("returning {n} random bytes");
        Ok(n)
    }

    /// The first twelve configuration bytes, which carry the serial number.
    pub async fn serial_number(&self) -> Result<[u8; 12], ChipError<C, M>> {
        let mut serial = [0u8; 12];
        for (word, chunk) in serial.chunks_exact_mut(4).enumerate() {
            let bytes = self.read_word(constants::ZONE_CONFIG, word as u16).await?;
            chunk.copy_from_slice(&bytes);
        }
        Ok(serial)
    }

    /// Dump the whole 128-byte configuration zone, one word at a time.
    pub async fn read_config_zone(&self, out: &mut [u8; 128]) -> Result<(), ChipError<C, M>> {
        for (word, chunk) in out.chunks_exact_mut(4).enumerate() {
            let bytes = self.read_word(constants::ZONE_CONFIG, word as u16).await?;
            chunk.copy_from_slice(&bytes);
        }
        Ok(())
    }

    async fn lock_byte(&self, offset: usize) -> Result<bool, ChipError<C, M>> {
        let word = self
            .read_word(constants::ZONE_CONFIG, constants::LOCK_WORD_ADDR)
            .await?;
        Ok(word[offset] != constants::UNLOCKED)
    }

    /// Has the configuration zone been locked?
    pub async fn config_locked(&self) -> Result<bool, ChipError<C, M>> {
        self.lock_byte(constants::LOCK_CONFIG_OFFSET).await
    }

    /// Has the data zone been locked?
    pub async fn data_locked(&self) -> Result<bool, ChipError<C, M>> {
        self.lock_byte(constants::LOCK_DATA_OFFSET).await
    }

    /// Claim the single pass-through session.
    pub fn open(&self) -> Result<Session<'_, M>, OpenError> {
        if self
            .available
            .compare_exchange(true, false, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            return Err(OpenError::Busy);
        }
        Ok(Session {
            chip: self,
            response: PacketBuf::new(),
            cursor: 0,
        })
    }
}

/// Two-phase pass-through interface: a submitted command stores its raw
/// response on the session, and later fetches drain it from a cursor.
pub struct Session<'chip, M> {
    chip: &'chip Chip<M>,
    response: PacketBuf,
    cursor: usize,
}

impl<C, D, M> Session<'_, M>
where
    C: Comm,
    D: DelayNs,
    M: Mutex<Item = Bus<C, D>>,
{
    /// Frame and run a raw command body, keeping the raw response for
    /// [`Session::fetch`]. Returns the number of body bytes accepted.
    pub async fn submit(&mut self, body: &[u8]) -> Result<usize, ChipError<C, M>> {
        if !(constants::MIN_BODY_SIZE..=constants::MAX_BODY_SIZE).contains(&body.len()) {
            return Err(ChipError::Packet(sha204_packet::Error::InvalidSize {
                body_len: body.len(),
            }));
        }
        let command =
            send::frame(constants::WordAddress::Command, body).map_err(ChipError::Packet)?;
        let mut bus = self.chip.bus.lock().await.map_err(ChipError::Mutex)?;
        self.response = bus.transact(&command, 0).await.map_err(ChipError::Bus)?;
        self.cursor = 1;
        Ok(body.len())
    }

    /// Drain stored response bytes from the read cursor.
    ///
    /// The stored buffer keeps its framing; the cursor starts past the
    /// length byte and stops short of the CRC trailer, so callers see
    /// exactly the payload. The trailer is checked once, on the first fetch
    /// after a submit.
    pub fn fetch(&mut self, out: &mut [u8]) -> Result<usize, sha204_packet::Error> {
        if self.response.is_empty() {
            return Ok(0);
        }
        if self.cursor == 1 {
            recv::validate(&self.response)?;
        }
        let end = self.response.len() - 2;
        if self.cursor >= end {
            return Ok(0);
        }
        let n = out.len().min(end - self.cursor);
        out[..n].copy_from_slice(&self.response[self.cursor..self.cursor + n]);
        self.cursor += n;
        Ok(n)
    }

    /// Detach ritual: wake the chip and put it fully to sleep, clearing its
    /// volatile memory, then free the session slot. Dropping the session
    /// frees the slot without touching the chip.
    pub async fn close(self) -> Result<(), ChipError<C, M>> {
        let mut bus = self.chip.bus.lock().await.map_err(ChipError::Mutex)?;
        if let Err(e) = bus.wake().await {
            log::warn!("wake before sleep failed: {e:?}");
        }
        bus.sleep().await.map_err(ChipError::Bus)
    }
}

impl<M> Drop for Session<'_, M> {
    fn drop(&mut self) {
        self.chip.available.store(true, Ordering::Release);
    }
}
