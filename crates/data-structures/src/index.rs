//! Index types.
//!
//! Every arena in the tree is an [`IndexVec`] addressed by a dedicated newtype, declared with
//! [`newtype_index!`](crate::newtype_index).

pub use index_vec::*;

/// Declares a `u32`-backed index newtype usable as an [`IndexVec`] key.
///
/// # Examples
///
/// ```
/// kiln_data_structures::newtype_index! {
///     /// A node.
///     pub struct NodeId;
/// }
///
/// let mut nodes = kiln_data_structures::index::IndexVec::<NodeId, &str>::new();
/// let id = nodes.push("root");
/// assert_eq!(nodes[id], "root");
/// assert_eq!(id.to_string(), "0");
/// ```
#[macro_export]
macro_rules! newtype_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $crate::index::define_index_type! {
            $(#[$attr])*
            $vis struct $name = u32;
            DISPLAY_FORMAT = "{}";
        }
    };
}
