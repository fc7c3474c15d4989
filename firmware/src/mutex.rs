use core::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    ops::Deref,
};

pub use crate::hw::Mutex;
pub use avr_device::interrupt::CriticalSection;

use avr_device::interrupt;

/// Interrupt context handle.
///
/// Holding a reference to this object proves that the holder is
/// running inside an interrupt service routine.
pub struct IrqCtx<'cs>(CriticalSection<'cs>);

impl<'cs> IrqCtx<'cs> {
    /// Create a new interrupt context.
    ///
    /// # SAFETY
    ///
    /// This may only be called from an interrupt service routine.
    /// Interrupts do not nest on this device, so the full ISR body
    /// is one critical section.
    #[inline(always)]
    pub unsafe fn new() -> Self {
        // SAFETY: Upheld by the caller: we are in an ISR with
        //         interrupts globally disabled.
        let cs = unsafe { CriticalSection::new() };
        fence();
        Self(cs)
    }

    /// Get the `CriticalSection` that belongs to this context.
    #[inline(always)]
    pub fn cs(&self) -> CriticalSection<'cs> {
        self.0
    }
}

impl Drop for IrqCtx<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        fence();
    }
}

/// Main context initialization marker.
///
/// Functions taking this marker run once, from `main()`, before
/// interrupts are enabled.
pub struct MainInitCtx(());

impl MainInitCtx {
    /// # SAFETY
    ///
    /// May only be constructed once, at the beginning of `main()`,
    /// while interrupts are still disabled.
    #[inline(always)]
    pub unsafe fn new() -> Self {
        Self(())
    }
}

/// Lazy initialization of static variables.
///
/// The deref contract below requires that every instance is
/// initialized via [Self::init] before interrupts are enabled.
pub struct LazyMainInit<T>(UnsafeCell<MaybeUninit<T>>);

impl<T> LazyMainInit<T> {
    /// # SAFETY
    ///
    /// It must be ensured that the returned instance is initialized
    /// with a call to [Self::init] before interrupts are enabled.
    ///
    /// Using this object in any way before initializing it will
    /// result in Undefined Behavior.
    #[inline(always)]
    pub const unsafe fn uninit() -> Self {
        Self(UnsafeCell::new(MaybeUninit::uninit()))
    }

    #[inline(always)]
    pub fn init(&self, _c: &MainInitCtx, inner: T) {
        // SAFETY: &MainInitCtx proves that interrupts are still off,
        //         so nothing can observe the half-written value.
        unsafe { *self.0.get() = MaybeUninit::new(inner) };
    }
}

impl<T> Deref for LazyMainInit<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // SAFETY: The `Self::uninit` safety contract ensures that
        //         `Self::init` ran before interrupts were enabled,
        //         and all readers live in main() or in ISRs.
        unsafe { (*self.0.get()).assume_init_ref() }
    }
}

// SAFETY: If T is Send, then we can Send the whole object. The object only contains T state.
unsafe impl<T: Send> Send for LazyMainInit<T> {}

// SAFETY: After initialization the inner value is only ever accessed
//         via shared references.
unsafe impl<T> Sync for LazyMainInit<T> {}

/// Optimization and reordering fence.
#[inline(always)]
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

/// Cheaper Option::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_option<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => halt(),
    }
}

/// Halt the device.
///
/// There is no watchdog. Nothing in this firmware can actually get
/// here; only a power cycle recovers.
#[inline(always)]
pub fn halt() -> ! {
    interrupt::disable();
    loop {
        avr_device::asm::sleep();
    }
}

#[inline(always)]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    halt();
}

// vim: ts=4 sw=4 expandtab
