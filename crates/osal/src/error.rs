//! Global error reporting: diagnostic callback and last-error cache.
//!
//! The callback is a best-effort hook. It fires synchronously on the
//! reporting thread, exactly when the reported code is an error and a
//! callback is registered, and must be re-entrant safe. ISR-safe paths
//! never reach it.

use alloc::boxed::Box;
use spin::{Mutex, RwLock};

use crate::status::{Result, Status};
use crate::time;

/// Callback invoked by [`report_error`].
pub type ErrorCallback = Box<dyn Fn(Status, &str, &str) + Send + Sync>;

/// Snapshot of the most recently recorded error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecord {
    pub code: Status,
    /// Opaque token identifying the reporting component.
    pub source: usize,
    pub timestamp_ms: u32,
}

static CALLBACK: RwLock<Option<ErrorCallback>> = RwLock::new(None);
static LAST_ERROR: Mutex<Option<ErrorRecord>> = Mutex::new(None);

/// Register the global error callback, replacing any previous one.
pub fn set_error_callback<F>(callback: F)
where
    F: Fn(Status, &str, &str) + Send + Sync + 'static,
{
    *CALLBACK.write() = Some(Box::new(callback));
}

/// Remove the global error callback.
pub fn clear_error_callback() {
    *CALLBACK.write() = None;
}

/// Report an error on behalf of `module`.
///
/// Logs the condition and fires the global callback when `code` is an
/// error. Reporting `Status::Ok` is a no-op, so callers can forward
/// results unconditionally.
pub fn report_error(code: Status, module: &str, msg: &str) {
    if !code.is_error() {
        return;
    }
    log::error!("{}: {} ({})", module, msg, code);
    let guard = CALLBACK.read();
    if let Some(callback) = guard.as_ref() {
        callback(code, module, msg);
    }
}

/// Overwrite the single-slot last-error cache.
pub fn record_error(code: Status, source: usize) {
    *LAST_ERROR.lock() = Some(ErrorRecord {
        code,
        source,
        timestamp_ms: time::now_ms(),
    });
}

/// Most recently recorded error, or `NotFound` when the slot is empty.
pub fn get_last_error() -> Result<ErrorRecord> {
    LAST_ERROR.lock().ok_or(Status::NotFound)
}

/// Invalidate the last-error cache.
pub fn clear_error() {
    *LAST_ERROR.lock() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_last_error_slot() {
        clear_error();
        assert_eq!(get_last_error(), Err(Status::NotFound));

        record_error(Status::Overrun, 7);
        let record = get_last_error().unwrap();
        assert_eq!(record.code, Status::Overrun);
        assert_eq!(record.source, 7);

        record_error(Status::Nack, 9);
        assert_eq!(get_last_error().unwrap().code, Status::Nack);

        clear_error();
        assert_eq!(get_last_error(), Err(Status::NotFound));
    }

    #[test]
    fn test_callback_fires_only_on_error() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        set_error_callback(|code, module, _msg| {
            assert!(code.is_error());
            assert_eq!(module, "uart0");
            FIRED.fetch_add(1, Ordering::SeqCst);
        });

        report_error(Status::Ok, "uart0", "fine");
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);

        report_error(Status::Framing, "uart0", "rx frame");
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);

        clear_error_callback();
        report_error(Status::Framing, "uart0", "rx frame");
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }
}
