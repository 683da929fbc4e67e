//! Process-ending failures (§5 "shared-resource policy", §7 error
//! taxonomy): disk I/O on certificate persistence and key-pair generation
//! are not recoverable, so rather than unwind through callers that have no
//! sensible way to continue, we log the alarm banners the design calls for
//! and abort the whole process.

use std::fmt;

/// Log three alarm banners and a support line, then terminate the process.
///
/// Never returns. Used exclusively for the failure classes the design marks
/// fatal: `DiskIO` on CA/leaf persistence and ECDSA key-pair generation
/// failures (§7; see DESIGN.md's Open Question decisions for why the key
/// pairs this crate signs are ECDSA rather than the RSA-2048 spec.md §3
/// names).
pub fn fatal(what: &str, err: impl fmt::Display) -> ! {
    tracing::error!("################################################################");
    tracing::error!("################################################################");
    tracing::error!("################################################################");
    tracing::error!(error = %err, "fatal: {what}");
    tracing::error!("this is unrecoverable; the proxy is shutting down");
    tracing::error!("if this keeps happening, please contact your proxy administrator");
    std::process::abort();
}
