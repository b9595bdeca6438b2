//! `Comm` over any `embedded-hal-async` I2C bus.

use {
    crate::comm::{Comm, Variant},
    embedded_hal_async::i2c::I2c,
};

/// Default 7-bit bus address of an ATSHA204.
pub const SHA204_ADDRESS: u8 = 0x64;
/// Default 7-bit bus address of an ATECC108.
pub const ECC108_ADDRESS: u8 = 0x60;

/// Wake writes go to a nonexistent device: the address phase drags the data
/// line low for the required pulse width, which holds as long as the bus
/// clock stays under ~133 kHz.
const WAKE_ADDRESS: u8 = 0x00;

pub struct I2cComm<I> {
    i2c: I,
    address: u8,
}

impl<I> I2cComm<I> {
    #[inline(always)]
    pub const fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }
}

impl<I: I2c> Comm for I2cComm<I>
where
    I::Error: defmt::Format,
{
    type SendError = I::Error;
    type RecvError = I::Error;

    #[inline]
    async fn send(&mut self, bytes: &[u8]) -> Result<usize, Self::SendError> {
        self.i2c.write(self.address, bytes).await?;
        Ok(bytes.len())
    }

    #[inline]
    async fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, Self::RecvError> {
        self.i2c.read(self.address, buffer).await?;
        Ok(buffer.len())
    }

    #[inline]
    async fn wake_pulse(&mut self) {
        // The NAK from the phantom device is expected; discard it.
        let _ = self.i2c.write(WAKE_ADDRESS, &[0x00]).await;
    }

    #[inline(always)]
    fn variant(&self) -> Variant {
        if self.address == ECC108_ADDRESS {
            Variant::Ecc108
        } else {
            Variant::Sha204
        }
    }
}
