use {
    crate::comm::{Comm, Variant},
    core::{
        future::Future,
        pin::Pin,
        task::{Context, Poll, Waker},
    },
    std::{cell::RefCell, collections::VecDeque, rc::Rc},
};

/// Drive a future to completion with a no-op waker. Every await in these
/// tests resolves without a real executor behind it.
pub(crate) fn trivial_future<F: Future>(mut future: Pin<&mut F>) -> F::Output {
    let mut context = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut context) {
            return output;
        }
    }
}

/// The chip's on-wire acknowledgement of a successful wake.
pub(crate) const WAKE_ACK: [u8; 4] = [0x04, 0x11, 0x33, 0x43];

/// Wrap a payload in response framing with a correct trailer.
pub(crate) fn response(payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![(payload.len() + 3) as u8];
    packet.extend_from_slice(payload);
    packet.extend_from_slice(&sha204_packet::crc::crc16(&packet).to_le_bytes());
    packet
}

/// Queue a full response packet the way the chip serves it: a 4-byte header
/// read, then the remainder.
pub(crate) fn script_response(mock: &Mock, packet: &[u8]) {
    mock.expect_recv(Ok(packet[..4].to_vec()));
    if packet.len() > 4 {
        mock.expect_recv(Ok(packet[4..].to_vec()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockError {
    Nak,
}

impl defmt::Format for MockError {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "NAK")
    }
}

pub(crate) enum SendBehavior {
    Accept,
    Short(usize),
    Refuse,
}

#[derive(Default)]
struct Inner {
    sent: Vec<Vec<u8>>,
    send_script: VecDeque<SendBehavior>,
    recv_script: VecDeque<Result<Vec<u8>, MockError>>,
    wake_pulses: usize,
}

/// Scripted stand-in for the bus: sends are recorded, receives replay a
/// queue, and an empty queue answers NAK like an absent or busy chip.
#[derive(Clone)]
pub(crate) struct Mock(Rc<RefCell<Inner>>);

impl Mock {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(Inner::default())))
    }

    pub(crate) fn expect_recv(&self, outcome: Result<Vec<u8>, MockError>) {
        self.0.borrow_mut().recv_script.push_back(outcome);
    }

    pub(crate) fn expect_send(&self, behavior: SendBehavior) {
        self.0.borrow_mut().send_script.push_back(behavior);
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.0.borrow().sent.clone()
    }

    pub(crate) fn wake_pulses(&self) -> usize {
        self.0.borrow().wake_pulses
    }
}

impl Comm for Mock {
    type SendError = MockError;
    type RecvError = MockError;

    async fn send(&mut self, bytes: &[u8]) -> Result<usize, MockError> {
        let mut inner = self.0.borrow_mut();
        inner.sent.push(bytes.to_vec());
        match inner.send_script.pop_front() {
            None | Some(SendBehavior::Accept) => Ok(bytes.len()),
            Some(SendBehavior::Short(n)) => Ok(n),
            Some(SendBehavior::Refuse) => Err(MockError::Nak),
        }
    }

    async fn recv(&mut self, buffer: &mut [u8]) -> Result<usize, MockError> {
        let mut inner = self.0.borrow_mut();
        match inner.recv_script.pop_front() {
            None => Err(MockError::Nak),
            Some(Err(e)) => Err(e),
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buffer.len());
                buffer[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
        }
    }

    async fn wake_pulse(&mut self) {
        self.0.borrow_mut().wake_pulses += 1;
    }

    fn variant(&self) -> Variant {
        Variant::Sha204
    }
}

/// Clock that only counts: delays complete immediately and accumulate.
#[derive(Clone)]
pub(crate) struct MockClock(Rc<RefCell<u64>>);

impl MockClock {
    pub(crate) fn new() -> Self {
        Self(Rc::new(RefCell::new(0)))
    }

    pub(crate) fn elapsed_us(&self) -> u64 {
        *self.0.borrow() / 1_000
    }
}

impl embedded_hal_async::delay::DelayNs for MockClock {
    async fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += u64::from(ns);
    }
}
