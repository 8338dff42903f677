//! Ordering resolution for ranking windows.

use crate::ast::{OrderKey, Select};

/// The key a ranking window over `select` numbers its rows by.
///
/// The select's own ordering is used verbatim, whether requested at this
/// level or carried from a paged source. Without one the key is
/// [`OrderKey::Unspecified`], which the emitter turns into the dialect's
/// vacuous key. Never fails.
pub fn resolve(select: &Select) -> OrderKey {
    if select.order_by.is_empty() {
        OrderKey::Unspecified
    } else {
        OrderKey::Explicit(select.order_by.clone())
    }
}
