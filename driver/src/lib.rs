#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod chip;
pub mod comm;
pub mod i2c;
pub mod mutex;

#[cfg(test)]
mod test_util;

use crate::{comm::Comm, mutex::Mutex};

/// Anything a high-level chip operation can fail with: taking the bus lock,
/// the transaction itself, or validating what came back.
pub enum ChipError<C: Comm, M: Mutex> {
    Mutex(M::Error),
    Bus(bus::Error<C>),
    Packet(sha204_packet::Error),
}

impl<C: Comm, M: Mutex> core::fmt::Debug for ChipError<C, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Mutex(ref e) => f.debug_tuple("Mutex").field(e).finish(),
            Self::Bus(ref e) => f.debug_tuple("Bus").field(e).finish(),
            Self::Packet(ref e) => f.debug_tuple("Packet").field(e).finish(),
        }
    }
}

impl<C: Comm, M: Mutex> defmt::Format for ChipError<C, M> {
    #[inline]
    fn format(&self, f: defmt::Formatter) {
        match *self {
            Self::Mutex(ref e) => defmt::write!(
                f,
                "Error waiting for exclusive use of the chip's bus: {}",
                e
            ),
            Self::Bus(ref e) => defmt::write!(f, "Error from the chip's bus: {}", e),
            Self::Packet(ref e) => defmt::write!(f, "Bad packet from the chip: {}", e),
        }
    }
}

/// A second caller tried to open the chip while a session was live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum OpenError {
    Busy,
}
