//! External service integrations.

pub mod notifier {
    pub use crate::notifier::*;
}

pub mod record_store {
    pub use crate::record_store::*;
}
