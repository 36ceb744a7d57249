//! Scoped recovery blocks.
//!
//! A [`RecoveryBlock`] pairs a try body with a catch body. The try body runs
//! once; if it returns a [`Fault`] or panics, the catch body runs exactly once
//! with the fault and its return value becomes the block's result. Nothing
//! escapes the block.
//!
//! Panics are the runtime faults of Rust: out-of-bounds indexing, `unwrap` on
//! `None`, arithmetic overflow in debug builds. They are caught with
//! [`std::panic::catch_unwind`] and presented to the catch body as a
//! [`FaultPayload::Unknown`] fault, indistinguishable in shape from an
//! explicit raise.
//!
//! # Example
//!
//! ```
//! use pnyx_core::{raise, FaultPayload, RecoveryBlock};
//!
//! let answer = RecoveryBlock::new(
//!     || {
//!         raise(FaultPayload::invalid_parameter("id"))?;
//!         Ok("unreachable")
//!     },
//!     |fault| {
//!         assert_eq!(fault.payload().parameter(), Some("id"));
//!         "recovered"
//!     },
//! )
//! .execute();
//!
//! assert_eq!(answer, "recovered");
//! ```
//!
//! # Panic hook
//!
//! The first block executed installs a process-wide panic hook. While any
//! block is active on a thread, panics on that thread record their stack
//! for the catch body and skip the default `thread panicked at` report.
//! Panics outside a block reach the previously installed hook untouched.
//! Binaries built with `panic = "abort"` cannot recover from panics at all.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::fault::{Fault, FaultPayload, FaultResult, Trace};

thread_local! {
    static ACTIVE_BLOCKS: Cell<usize> = const { Cell::new(0) };
    static PANIC_TRACE: RefCell<Option<Trace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if ACTIVE_BLOCKS.with(Cell::get) > 0 {
                let trace = Trace::capture();
                PANIC_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as being inside a recovery block.
struct ActiveGuard;

impl ActiveGuard {
    fn enter() -> Self {
        ACTIVE_BLOCKS.with(|count| count.set(count.get() + 1));
        PANIC_TRACE.with(|slot| slot.borrow_mut().take());
        Self
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE_BLOCKS.with(|count| count.set(count.get().saturating_sub(1)));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn fault_from_panic(payload: &(dyn Any + Send)) -> Fault {
    let detail = panic_message(payload);
    let trace = PANIC_TRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(Trace::capture);
    Fault::with_trace(FaultPayload::Unknown(detail), trace)
}

/// A try/catch pairing that intercepts at most one fault per execution.
///
/// The block is consumed by [`execute`](RecoveryBlock::execute), so each
/// value runs at most once.
pub struct RecoveryBlock<B, C> {
    try_body: B,
    catch_body: C,
}

impl<T, B, C> RecoveryBlock<B, C>
where
    B: FnOnce() -> FaultResult<T>,
    C: FnOnce(Fault) -> T,
{
    /// Pairs a try body with the catch body that handles its fault.
    pub fn new(try_body: B, catch_body: C) -> Self {
        Self {
            try_body,
            catch_body,
        }
    }

    /// Runs the try body, routing any fault or panic to the catch body.
    ///
    /// The catch body is invoked only when the try body fails, and then
    /// exactly once. Faults handled by a nested block never reach this one.
    pub fn execute(self) -> T {
        install_hook();

        let Self {
            try_body,
            catch_body,
        } = self;

        let outcome = {
            let _active = ActiveGuard::enter();
            panic::catch_unwind(AssertUnwindSafe(try_body))
        };

        match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(fault)) => catch_body(fault),
            Err(payload) => catch_body(fault_from_panic(&*payload)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::raise;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clean_body_never_invokes_catch() {
        let catches = AtomicUsize::new(0);

        for round in 0..10 {
            let value = RecoveryBlock::new(
                || Ok(round * 2),
                |_| {
                    catches.fetch_add(1, Ordering::SeqCst);
                    usize::MAX
                },
            )
            .execute();
            assert_eq!(value, round * 2);
        }

        assert_eq!(catches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_raise_mid_body_invokes_catch_once() {
        let catches = AtomicUsize::new(0);
        let tail_runs = AtomicUsize::new(0);

        for _ in 0..10 {
            RecoveryBlock::new(
                || {
                    raise::<()>("stop here")?;
                    tail_runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                |_| {
                    catches.fetch_add(1, Ordering::SeqCst);
                },
            )
            .execute();
        }

        assert_eq!(catches.load(Ordering::SeqCst), 10);
        assert_eq!(tail_runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_is_caught_as_unknown() {
        let fault_detail = RecoveryBlock::new(
            || {
                let items: Vec<u8> = Vec::new();
                let index = items.len() + 3;
                Ok(items[index].to_string())
            },
            |fault| match fault.into_payload() {
                FaultPayload::Unknown(detail) => detail,
                other => panic!("unexpected payload: {other:?}"),
            },
        )
        .execute();

        assert!(fault_detail.contains("index out of bounds"));
    }

    #[test]
    fn test_panic_with_string_payload() {
        let detail = RecoveryBlock::new(
            || -> FaultResult<String> { panic!("custom {}", 42) },
            |fault| fault.to_string(),
        )
        .execute();

        assert_eq!(detail, "unknown fault: custom 42");
    }

    #[test]
    fn test_panic_trace_is_recorded() {
        let header = RecoveryBlock::new(
            || -> FaultResult<String> { panic!("traced") },
            |fault| fault.trace().to_string(),
        )
        .execute();

        assert!(header.starts_with("fault backtrace (thread '"));
    }

    #[test]
    fn test_nested_block_intercepts_first() {
        let outer_catches = AtomicUsize::new(0);
        let inner_catches = AtomicUsize::new(0);

        let value = RecoveryBlock::new(
            || {
                let inner = RecoveryBlock::new(
                    || -> FaultResult<u32> { raise("inner failure") },
                    |_| {
                        inner_catches.fetch_add(1, Ordering::SeqCst);
                        7
                    },
                )
                .execute();
                Ok(inner + 1)
            },
            |_| {
                outer_catches.fetch_add(1, Ordering::SeqCst);
                0
            },
        )
        .execute();

        assert_eq!(value, 8);
        assert_eq!(inner_catches.load(Ordering::SeqCst), 1);
        assert_eq!(outer_catches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_active_count_restored_after_panic() {
        RecoveryBlock::new(|| -> FaultResult<()> { panic!("restore") }, |_| ()).execute();
        assert_eq!(ACTIVE_BLOCKS.with(Cell::get), 0);
    }

    #[test]
    fn test_panic_message_non_string_payload() {
        let payload: Box<dyn Any + Send> = Box::new(17_u32);
        assert_eq!(panic_message(&*payload), "non-string panic payload");
    }
}
