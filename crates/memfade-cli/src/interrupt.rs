// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Ctrl-C wiring: the first interrupt requests cancellation, the second exits.

use std::io;
use std::process;
use std::thread;

use memfade_core::CancelToken;
use tokio::runtime;
use tracing::{debug, warn};

/// Exit status after a second interrupt (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

/// Starts a background thread that watches for Ctrl-C.
///
/// The first interrupt sets `cancel`; instances stop after their next
/// comparison. A second interrupt terminates the process with
/// [`FORCED_EXIT_CODE`].
pub fn install(cancel: &CancelToken) -> io::Result<()> {
    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    let cancel = cancel.clone();
    thread::Builder::new()
        .name("memfade-signals".to_owned())
        .spawn(move || rt.block_on(watch(cancel)))?;
    Ok(())
}

async fn watch(cancel: CancelToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {err}");
        return;
    }
    if cancel.cancel() {
        debug!("interrupt received; finishing in-flight comparisons");
    }
    if tokio::signal::ctrl_c().await.is_ok() {
        process::exit(FORCED_EXIT_CODE);
    }
}
