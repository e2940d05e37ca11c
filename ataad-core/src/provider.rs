//! Provider trait: a namespace of related makers.
//!
//! Providers group fixtures that belong together, so a test module can
//! bring in a whole set with one call:
//!
//! ```rust,ignore
//! struct AccountFixtures;
//!
//! impl Provider for AccountFixtures {
//!     fn makers(&self) -> Vec<Maker> {
//!         vec![maker!(user), maker!(todo_item)]
//!     }
//! }
//!
//! resources.add_provider(&AccountFixtures);
//! ```

use crate::maker::Maker;

/// A group of makers registered and activated together.
///
/// Every maker a provider returns is re-homed into the provider's
/// [`namespace`](Provider::namespace), so activating or deactivating
/// that namespace toggles the whole group.
pub trait Provider {
    /// The makers this provider contributes.
    fn makers(&self) -> Vec<Maker>;

    /// Namespace the makers are registered under.
    fn namespace(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
