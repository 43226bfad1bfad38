//! Async utilities around the Tokio runtime.

use std::future::Future;


/// Block on the given future with a current-thread Tokio runtime with time and
/// I/O drivers enabled. The whole crate exposes a blocking API, this is the
/// single point where the internal async code is driven.
pub(crate) fn sync<F: Future>(future: F) -> F::Output {

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()
        .unwrap();

    rt.block_on(future)

}
