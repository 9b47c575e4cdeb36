//! Crash reporting
//!
//! Fatal signals dump a stack trace to stderr, restore the default handler
//! and re-raise, so the process dies with the original signal. The editor
//! client observes the exit, restarts the server, and passes
//! `restartFromCrash` so the first compile runs in safe mode.

use std::backtrace::Backtrace;

const SIGNALS: &[libc::c_int] = &[
    libc::SIGSEGV,
    libc::SIGABRT,
    libc::SIGFPE,
    libc::SIGILL,
    libc::SIGBUS,
];

/// Install the signal handlers and a panic hook
pub fn install() {
    let handler = handle_signal as extern "C" fn(libc::c_int);
    unsafe {
        for &sig in SIGNALS {
            libc::signal(sig, handler as usize);
        }
    }

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("\n=== PANIC ===");
        eprintln!("{}", Backtrace::force_capture());
        default_hook(info);
    }));
}

extern "C" fn handle_signal(sig: libc::c_int) {
    let name = match sig {
        libc::SIGSEGV => "SIGSEGV (segmentation fault)",
        libc::SIGABRT => "SIGABRT (abort)",
        libc::SIGFPE => "SIGFPE (floating point exception)",
        libc::SIGILL => "SIGILL (illegal instruction)",
        libc::SIGBUS => "SIGBUS (bus error)",
        _ => "unknown signal",
    };
    eprintln!("\n=== CRASH DETECTED ===");
    eprintln!("signal: {}", name);
    eprintln!("{}", Backtrace::force_capture());

    unsafe {
        libc::signal(sig, libc::SIG_DFL);
        libc::raise(sig);
    }
}
