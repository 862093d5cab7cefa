pub mod cert;
pub mod endpoint;
pub mod probe;
pub mod result;

pub mod prelude {
    pub use super::cert::inspect_certificate;
    pub use super::endpoint::{Endpoint, Lookup, Scheme, resolve};
    pub use super::probe::Prober;
    pub use super::result::ProbeResult;
    pub use crate::error::ProbeError;
}

use std::fmt::Write;

/// Flattens an error and its `source()` chain into a single line, so one failure
/// stays on one report line.
pub(crate) fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}
