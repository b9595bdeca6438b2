//! The wake → command → poll → idle transaction machine.

use {
    crate::comm::Comm,
    embedded_hal_async::delay::DelayNs,
    sha204_packet::{PacketBuf, constants, recv},
};

/// Polling cadence while the chip executes a command.
const POLL_INTERVAL_US: u32 = 4_000;
/// Total poll budget before a command is declared lost.
const POLL_BUDGET_US: u32 = 60_000;
/// Wake attempts before concluding nothing is on the bus.
const WAKE_ATTEMPTS: usize = 5;

pub enum Error<C: Comm> {
    Send(C::SendError),
    Recv(C::RecvError),
    /// The wake acknowledgement never arrived.
    NoDevice,
    /// The wake acknowledgement arrived with the wrong status byte.
    WakeRejected { status: u8 },
    ShortWrite { written: usize, expected: usize },
    ShortRead { read: usize, expected: usize },
    /// Poll budget exhausted without a response header.
    Timeout,
    Packet(sha204_packet::Error),
    /// Response would not fit the packet buffer.
    OutOfMemory,
}

impl<C: Comm> core::fmt::Debug for Error<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Send(ref e) => f.debug_tuple("Send").field(e).finish(),
            Self::Recv(ref e) => f.debug_tuple("Recv").field(e).finish(),
            Self::NoDevice => write!(f, "NoDevice"),
            Self::WakeRejected { status } => f
                .debug_struct("WakeRejected")
                .field("status", &status)
                .finish(),
            Self::ShortWrite { written, expected } => f
                .debug_struct("ShortWrite")
                .field("written", &written)
                .field("expected", &expected)
                .finish(),
            Self::ShortRead { read, expected } => f
                .debug_struct("ShortRead")
                .field("read", &read)
                .field("expected", &expected)
                .finish(),
            Self::Timeout => write!(f, "Timeout"),
            Self::Packet(ref e) => f.debug_tuple("Packet").field(e).finish(),
            Self::OutOfMemory => write!(f, "OutOfMemory"),
        }
    }
}

impl<C: Comm> defmt::Format for Error<C> {
    #[inline]
    fn format(&self, f: defmt::Formatter) {
        match *self {
            Self::Send(ref e) => defmt::write!(f, "Error sending to the chip: {}", e),
            Self::Recv(ref e) => defmt::write!(f, "Error receiving from the chip: {}", e),
            Self::NoDevice => defmt::write!(f, "No wake acknowledgement; nothing on the bus"),
            Self::WakeRejected { status } => {
                defmt::write!(f, "Chip rejected the wake (status {=u8:x})", status)
            }
            Self::ShortWrite { written, expected } => defmt::write!(
                f,
                "Bus accepted {=usize} of {=usize} bytes",
                written,
                expected
            ),
            Self::ShortRead { read, expected } => defmt::write!(
                f,
                "Bus returned {=usize} of {=usize} bytes",
                read,
                expected
            ),
            Self::Timeout => defmt::write!(f, "Chip did not answer within the poll budget"),
            Self::Packet(ref e) => defmt::Format::format(e, f),
            Self::OutOfMemory => defmt::write!(f, "Response larger than the packet buffer"),
        }
    }
}

/// Exclusive handle on the wire to one chip.
///
/// One value of this type exists per physical chip; callers serialize on it
/// through a `mutex::Mutex`, so a transaction in flight is never interleaved
/// with another.
pub struct Bus<C: Comm, D: DelayNs> {
    comm: C,
    delay: D,
}

impl<C: Comm, D: DelayNs> Bus<C, D> {
    #[inline(always)]
    pub const fn new(comm: C, delay: D) -> Self {
        Self { comm, delay }
    }

    /// Wake the chip and check its 4-byte acknowledgement.
    ///
    /// Each attempt pulses the data line low, waits t_WHI for the variant on
    /// the bus, then tries to read the acknowledgement. A malformed
    /// acknowledgement fails immediately; a missing one is retried.
    pub async fn wake(&mut self) -> Result<(), Error<C>> {
        let mut ack = [0u8; 4];
        for attempt in 1..=WAKE_ATTEMPTS {
            log::debug!("send wake-up ({attempt})");
            self.comm.wake_pulse().await;
            self.delay
                .delay_us(self.comm.variant().wake_high_delay_us())
                .await;
            match self.comm.recv(&mut ack).await {
                Ok(4) => {
                    let payload = recv::validate(&ack).map_err(Error::Packet)?;
                    return match payload {
                        [constants::WAKE_OK] => Ok(()),
                        [status] => Err(Error::WakeRejected { status: *status }),
                        _ => Err(Error::Packet(sha204_packet::Error::Malformed {
                            len: ack.len(),
                        })),
                    };
                }
                Ok(n) => log::debug!("wake read returned {n} bytes"),
                Err(e) => log::trace!("wake read failed: {e:?}"),
            }
        }
        Err(Error::NoDevice)
    }

    /// Transmit one framed command in a single bus write.
    async fn send_command(&mut self, packet: &[u8]) -> Result<(), Error<C>> {
        log::trace!("sending {packet:02x?}");
        let written = self.comm.send(packet).await.map_err(Error::Send)?;
        if written != packet.len() {
            return Err(Error::ShortWrite {
                written,
                expected: packet.len(),
            });
        }
        Ok(())
    }

    /// Poll for the 4-byte response header while the chip executes.
    async fn poll_header(&mut self) -> Result<[u8; 4], Error<C>> {
        let mut header = [0u8; 4];
        let mut remaining = POLL_BUDGET_US;
        loop {
            match self.comm.recv(&mut header).await {
                Ok(4) => return Ok(header),
                Ok(n) => log::trace!("partial response header: {n} bytes"),
                Err(e) => log::trace!("response not ready: {e:?}"),
            }
            if remaining < POLL_INTERVAL_US {
                return Err(Error::Timeout);
            }
            remaining -= POLL_INTERVAL_US;
            self.delay.delay_us(POLL_INTERVAL_US).await;
        }
    }

    /// Read the rest of the packet once the header names its total length.
    async fn recv_remainder(&mut self, header: [u8; 4]) -> Result<PacketBuf, Error<C>> {
        let declared = header[0] as usize;
        if declared < constants::MIN_PACKET_SIZE {
            return Err(Error::Packet(sha204_packet::Error::Malformed {
                len: declared,
            }));
        }
        let mut packet = PacketBuf::new();
        packet
            .extend_from_slice(&header)
            .map_err(|_| Error::OutOfMemory)?;
        packet.resize(declared, 0).map_err(|_| Error::OutOfMemory)?;
        if declared > header.len() {
            let (_, rest) = packet.split_at_mut(header.len());
            let read = self.comm.recv(rest).await.map_err(Error::Recv)?;
            if read != rest.len() {
                return Err(Error::ShortRead {
                    read,
                    expected: rest.len(),
                });
            }
        }
        Ok(packet)
    }

    /// Park the chip between transactions, keeping its volatile state.
    ///
    /// Best-effort: by the time this runs the response is already in hand,
    /// so failure is logged and swallowed.
    pub async fn idle(&mut self) {
        match self
            .comm
            .send(&[constants::WordAddress::Idle.repr()])
            .await
        {
            Ok(1) => {}
            Ok(n) => log::warn!("idle write accepted {n} bytes"),
            Err(e) => log::warn!("idle write failed: {e:?}"),
        }
    }

    /// Put the chip fully to sleep, dropping its volatile state.
    pub async fn sleep(&mut self) -> Result<(), Error<C>> {
        let written = self
            .comm
            .send(&[constants::WordAddress::Sleep.repr()])
            .await
            .map_err(Error::Send)?;
        if written != 1 {
            return Err(Error::ShortWrite {
                written,
                expected: 1,
            });
        }
        Ok(())
    }

    /// Run one full transaction and hand back the raw, unvalidated response.
    ///
    /// `exec_time_us` is the command's execution time; polling starts after
    /// it has elapsed. Callers with no estimate pass zero and lean on the
    /// poll loop alone. CRC validation and payload extraction are the
    /// caller's next step, so the raw buffer stays available for two-phase
    /// read-back.
    pub async fn transact(
        &mut self,
        command: &[u8],
        exec_time_us: u32,
    ) -> Result<PacketBuf, Error<C>> {
        self.wake().await?;
        self.send_command(command).await?;
        if exec_time_us > 0 {
            self.delay.delay_us(exec_time_us).await;
        }
        let header = self.poll_header().await?;
        let response = self.recv_remainder(header).await?;
        log::trace!("received {:02x?}", &response[..]);
        self.idle().await;
        Ok(response)
    }
}
