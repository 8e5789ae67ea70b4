/// The policy every subcommand runs under.
///
/// One invocation moves through
/// `Idle -> LoggingConfigured -> Executing -> {Succeeded | ClassifiedFailed |
/// UnclassifiedFailed} -> TelemetryFlushed -> Terminated`. The flush is owned
/// by a drop guard armed before the work starts, so it happens exactly once
/// on every path, including a panic while a failure is being handled.
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crate::exit::{ExitCode, Failure};
use crate::logging::RunLog;
use crate::telemetry::Telemetry;

/// How the wrapped work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    ClassifiedFailure(ExitCode),
    UnclassifiedFailure,
}

impl RunOutcome {
    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::OK,
            Self::ClassifiedFailure(code) => code,
            Self::UnclassifiedFailure => ExitCode::FATAL,
        }
    }
}

/// Run `work` under the policy and terminate the process with its exit code.
pub fn command_wrapper<L, T, F>(log: &L, telemetry: &mut T, version: &str, work: F) -> !
where
    L: RunLog + ?Sized,
    T: Telemetry + ?Sized,
    F: FnOnce() -> Result<(), Failure>,
{
    let code = run_under_policy(log, telemetry, version, work);
    std::process::exit(code.into())
}

/// Run `work` under the policy and return the exit code instead of exiting.
///
/// Telemetry has been flushed exactly once by the time this returns.
pub fn run_under_policy<L, T, F>(log: &L, telemetry: &mut T, version: &str, work: F) -> ExitCode
where
    L: RunLog + ?Sized,
    T: Telemetry + ?Sized,
    F: FnOnce() -> Result<(), Failure>,
{
    log.disable_propagation();
    telemetry.set_version(version);

    let mut flush = FlushGuard::arm(telemetry);
    let outcome = execute(log, work);
    let code = outcome.exit_code();
    flush.code = code;
    drop(flush);

    tracing::debug!(%code, ?outcome, "invocation finished");
    code
}

fn execute<L, F>(log: &L, work: F) -> RunOutcome
where
    L: RunLog + ?Sized,
    F: FnOnce() -> Result<(), Failure>,
{
    let capture = PanicCapture::install();
    let result = panic::catch_unwind(AssertUnwindSafe(work));
    let site = capture.finish();

    match result {
        Ok(Ok(())) => RunOutcome::Success,
        Ok(Err(Failure::Classified(err))) => {
            log.classified(&*err);
            RunOutcome::ClassifiedFailure(err.exit_code())
        }
        Ok(Err(Failure::Unclassified(err))) => {
            log.unclassified(&err);
            RunOutcome::UnclassifiedFailure
        }
        Err(payload) => {
            log.unclassified(&panic_error(payload.as_ref(), site));
            RunOutcome::UnclassifiedFailure
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn panic_error(payload: &(dyn Any + Send), site: Option<PanicSite>) -> anyhow::Error {
    let mut detail = format!("subcommand panicked: {}", panic_message(payload));
    if let Some(site) = site {
        if let Some(location) = site.location {
            detail.push_str(&format!("\n  at {location}"));
        }
        if site.backtrace.status() == BacktraceStatus::Captured {
            detail.push_str(&format!("\n\nstack backtrace:\n{}", site.backtrace));
        }
    }
    anyhow::anyhow!(detail)
}

type PanicHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Where a panic in the wrapped work was raised.
#[derive(Debug)]
struct PanicSite {
    location: Option<String>,
    backtrace: Backtrace,
}

/// A panic hook that records the invoking thread's panic instead of printing
/// it, so the failure is reported once, through the run log. Panics on other
/// threads still reach the previous hook.
struct PanicCapture {
    previous: PanicHook,
    slot: Arc<Mutex<Option<PanicSite>>>,
}

impl PanicCapture {
    fn install() -> Self {
        let previous: PanicHook = Arc::from(panic::take_hook());
        let slot = Arc::new(Mutex::new(None));
        let owner = thread::current().id();

        let hook_previous = Arc::clone(&previous);
        let hook_slot = Arc::clone(&slot);
        panic::set_hook(Box::new(move |info| {
            if thread::current().id() != owner {
                hook_previous(info);
                return;
            }
            let site = PanicSite {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::capture(),
            };
            *hook_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(site);
        }));

        Self { previous, slot }
    }

    /// Put the previous hook back and hand over what was recorded.
    fn finish(self) -> Option<PanicSite> {
        let previous = self.previous;
        panic::set_hook(Box::new(move |info| previous(info)));
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Sets the return code and sends the report when dropped.
///
/// Starts at `FATAL`; it only holds a different code once the outcome is known.
struct FlushGuard<'t, T: Telemetry + ?Sized> {
    telemetry: &'t mut T,
    code: ExitCode,
}

impl<'t, T: Telemetry + ?Sized> FlushGuard<'t, T> {
    fn arm(telemetry: &'t mut T) -> Self {
        Self {
            telemetry,
            code: ExitCode::FATAL,
        }
    }
}

impl<T: Telemetry + ?Sized> Drop for FlushGuard<'_, T> {
    fn drop(&mut self) {
        self.telemetry.set_return_code(self.code);
        self.telemetry.send();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::exit::Classified;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Version(String),
        ReturnCode(ExitCode),
        Send,
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        calls: Vec<Call>,
    }

    impl RecordingTelemetry {
        fn sends(&self) -> usize {
            self.calls.iter().filter(|c| **c == Call::Send).count()
        }

        fn return_codes(&self) -> Vec<ExitCode> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::ReturnCode(code) => Some(*code),
                    _ => None,
                })
                .collect()
        }
    }

    impl Telemetry for RecordingTelemetry {
        fn set_version(&mut self, version: &str) {
            self.calls.push(Call::Version(version.to_owned()));
        }

        fn set_return_code(&mut self, code: ExitCode) {
            self.calls.push(Call::ReturnCode(code));
        }

        fn send(&mut self) {
            self.calls.push(Call::Send);
        }
    }

    #[derive(Default)]
    struct RecordingLog {
        propagation_disabled: Cell<usize>,
        classified: RefCell<Vec<String>>,
        unclassified: RefCell<Vec<String>>,
        panic_on_unclassified: bool,
    }

    impl RunLog for RecordingLog {
        fn disable_propagation(&self) {
            self.propagation_disabled
                .set(self.propagation_disabled.get() + 1);
        }

        fn classified(&self, err: &dyn Classified) {
            self.classified.borrow_mut().push(err.to_string());
        }

        fn unclassified(&self, err: &anyhow::Error) {
            assert!(!self.panic_on_unclassified, "logger broke");
            self.unclassified.borrow_mut().push(format!("{err:?}"));
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{count} findings reported")]
    struct Findings {
        count: usize,
    }

    impl Classified for Findings {
        fn exit_code(&self) -> ExitCode {
            ExitCode::FINDINGS
        }

        fn slug(&self) -> &'static str {
            "findings_reported"
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("odd")]
    struct Odd(u8);

    impl Classified for Odd {
        fn exit_code(&self) -> ExitCode {
            ExitCode::new(self.0)
        }

        fn slug(&self) -> &'static str {
            "odd"
        }
    }

    #[test]
    fn test_success_exits_ok() {
        let log = RecordingLog::default();
        let mut telemetry = RecordingTelemetry::default();

        let code = run_under_policy(&log, &mut telemetry, "1.0.0", || Ok(()));

        assert_eq!(code, ExitCode::OK);
        assert_eq!(
            telemetry.calls,
            vec![
                Call::Version("1.0.0".to_owned()),
                Call::ReturnCode(ExitCode::OK),
                Call::Send,
            ]
        );
        assert_eq!(log.propagation_disabled.get(), 1);
        assert!(log.classified.borrow().is_empty());
        assert!(log.unclassified.borrow().is_empty());
    }

    #[test]
    fn test_classified_failure_forwards_code() {
        let log = RecordingLog::default();
        let mut telemetry = RecordingTelemetry::default();

        let code = run_under_policy(&log, &mut telemetry, "1.0.0", || {
            Err(Failure::classified(Findings { count: 3 }))
        });

        assert_eq!(code, ExitCode::FINDINGS);
        assert_eq!(telemetry.return_codes(), vec![ExitCode::FINDINGS]);
        assert_eq!(telemetry.sends(), 1);
        assert_eq!(*log.classified.borrow(), vec!["3 findings reported"]);
        assert!(log.unclassified.borrow().is_empty());
    }

    #[test]
    fn test_classified_codes_are_never_rewritten() {
        for raw in [0_u8, 1, 3, 42, 255] {
            let log = RecordingLog::default();
            let mut telemetry = RecordingTelemetry::default();

            let code = run_under_policy(&log, &mut telemetry, "v", || {
                Err(Failure::classified(Odd(raw)))
            });

            assert_eq!(code.get(), raw);
            assert_eq!(telemetry.return_codes(), vec![code]);
        }
    }

    #[test]
    fn test_unclassified_error_is_fatal_and_logged_once() {
        let log = RecordingLog::default();
        let mut telemetry = RecordingTelemetry::default();

        let code = run_under_policy(&log, &mut telemetry, "1.0.0", || {
            let err = anyhow::anyhow!("connection reset").context("uploading results");
            Err(err.into())
        });

        assert_eq!(code, ExitCode::FATAL);
        assert_eq!(telemetry.return_codes(), vec![ExitCode::FATAL]);
        assert_eq!(telemetry.sends(), 1);

        let logged = log.unclassified.borrow();
        assert_eq!(logged.len(), 1);
        assert!(logged[0].contains("uploading results"));
        assert!(logged[0].contains("connection reset"));
        assert!(log.classified.borrow().is_empty());
    }

    #[test]
    fn test_panicking_work_is_fatal() {
        let log = RecordingLog::default();
        let mut telemetry = RecordingTelemetry::default();

        let code = run_under_policy(&log, &mut telemetry, "1.0.0", || {
            panic!("index out of range");
        });

        assert_eq!(code, ExitCode::FATAL);
        assert_eq!(telemetry.sends(), 1);
        let logged = log.unclassified.borrow();
        assert_eq!(logged.len(), 1);
        assert!(logged[0].contains("index out of range"));
        assert!(logged[0].contains("wrapper.rs"), "no location in: {}", logged[0]);
    }

    #[test]
    fn test_panic_hook_is_restored_after_run() {
        let log = RecordingLog::default();
        let mut telemetry = RecordingTelemetry::default();
        run_under_policy(&log, &mut telemetry, "1.0.0", || panic!("first"));

        let result = panic::catch_unwind(|| panic!("outside the wrapper"));
        assert!(result.is_err());

        let mut telemetry = RecordingTelemetry::default();
        run_under_policy(&log, &mut telemetry, "1.0.0", || panic!("second"));
        let logged = log.unclassified.borrow();
        assert_eq!(logged.len(), 2);
        assert!(logged[1].contains("second"));
        assert!(logged[1].contains("wrapper.rs"));
    }

    #[test]
    fn test_panic_error_without_site() {
        let payload: Box<dyn Any + Send> = Box::new("lost");
        let err = panic_error(payload.as_ref(), None);
        assert_eq!(err.to_string(), "subcommand panicked: lost");
    }

    #[test]
    fn test_flush_survives_panic_while_handling_failure() {
        let log = RecordingLog {
            panic_on_unclassified: true,
            ..RecordingLog::default()
        };
        let mut telemetry = RecordingTelemetry::default();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            run_under_policy(&log, &mut telemetry, "1.0.0", || {
                Err(anyhow::anyhow!("boom").into())
            })
        }));

        assert!(result.is_err());
        assert_eq!(telemetry.return_codes(), vec![ExitCode::FATAL]);
        assert_eq!(telemetry.sends(), 1);
    }

    #[test]
    fn test_repeated_invocations_each_flush_once() {
        let log = RecordingLog::default();

        for _ in 0..3 {
            let mut telemetry = RecordingTelemetry::default();
            run_under_policy(&log, &mut telemetry, "1.0.0", || Ok(()));
            assert_eq!(telemetry.sends(), 1);
        }
        assert_eq!(log.propagation_disabled.get(), 3);
    }

    #[test]
    fn test_outcome_exit_codes() {
        assert_eq!(RunOutcome::Success.exit_code(), ExitCode::OK);
        assert_eq!(
            RunOutcome::ClassifiedFailure(ExitCode::MISSING_TARGET).exit_code(),
            ExitCode::MISSING_TARGET
        );
        assert_eq!(RunOutcome::UnclassifiedFailure.exit_code(), ExitCode::FATAL);
    }

    #[test]
    fn test_panic_message_extraction() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
