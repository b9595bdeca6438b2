/// Which part is on the bus. The two supported chips speak the same
/// protocol but need different wake-high delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Variant {
    Sha204,
    Ecc108,
}

impl Variant {
    /// Wait after the wake pulse before the acknowledgement is readable
    /// (t_WHI).
    #[inline(always)]
    pub const fn wake_high_delay_us(self) -> u32 {
        match self {
            Self::Sha204 => 2_500,
            Self::Ecc108 => 1_500,
        }
    }
}

/// How bytes reach the chip.
#[expect(
    async_fn_in_trait,
    reason = "single-executor embedded use; auto-trait bounds belong to callers"
)]
pub trait Comm {
    type SendError: core::fmt::Debug + defmt::Format;
    type RecvError: core::fmt::Debug + defmt::Format;

    /// Write `bytes` to the chip, returning how many the bus accepted.
    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::SendError>;

    /// Read up to `buffer.len()` bytes, returning how many arrived.
    async fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, Self::RecvError>;

    /// Hold the data line low long enough for the chip's wake pulse.
    ///
    /// Whatever the bus reports back is irrelevant; the transfer exists only
    /// for the low-hold its address phase produces.
    async fn wake_pulse(&mut self);

    fn variant(&self) -> Variant;
}
