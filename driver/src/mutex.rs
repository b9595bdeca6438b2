use core::ops::DerefMut;

/// Lock acquisition that cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Never {}

impl defmt::Format for Never {
    #[inline(always)]
    fn format(&self, _: defmt::Formatter) {
        match *self {}
    }
}

/// Locking seam for the one-transaction-at-a-time rule.
#[expect(
    async_fn_in_trait,
    reason = "single-executor embedded use; auto-trait bounds belong to callers"
)]
pub trait Mutex {
    type Item;
    type Error: core::fmt::Debug + defmt::Format;

    fn new(item: Self::Item) -> Self;
    async fn lock(&self) -> Result<impl DerefMut<Target = Self::Item>, Self::Error>;
}

impl<R: embassy_sync::blocking_mutex::raw::RawMutex, T> Mutex
    for embassy_sync::mutex::Mutex<R, T>
{
    type Item = T;
    type Error = Never;

    #[inline(always)]
    fn new(item: T) -> Self {
        embassy_sync::mutex::Mutex::new(item)
    }

    #[inline]
    async fn lock(&self) -> Result<impl DerefMut<Target = T>, Self::Error> {
        Ok(embassy_sync::mutex::Mutex::lock(self).await)
    }
}
