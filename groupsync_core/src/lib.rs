//!
//! Access to groupsync
//!
//! Provides the desired-state configuration, the reconciliation of that
//! configuration against a remote directory service, and the application of
//! the resulting change set.
#![cfg_attr(not(test), deny(missing_docs))]

pub use changeset::ChangeSet;
pub use config::DesiredConfig;
pub use reconcile::reconcile;
pub use remote::{DirectoryReader, DirectoryWriter, Lookup, MembershipAction};

pub mod access_request;
pub mod apply;
pub mod changeset;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod project;
pub mod reconcile;
pub mod remote;

#[cfg(test)]
pub(crate) mod test_util;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
