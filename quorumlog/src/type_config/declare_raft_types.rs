#[allow(unused_imports)]
use crate::TypeConfig;

/// Define types for a Raft type configuration.
///
/// Since Rust has some limitations when deriving traits for types with generic
/// arguments and most types are parameterized by [`TypeConfig`], we need to
/// add supertraits to a type implementing [`TypeConfig`].
///
/// This macro does exactly that.
///
/// Example:
/// ```ignore
/// quorumlog::declare_raft_types!(
///    pub TypeConfig:
///        AppData = ClientRequest,
/// );
/// ```
///
/// `AppData` can be omitted, in which case `String` is used:
/// ```ignore
/// quorumlog::declare_raft_types!(pub TypeConfig);
/// ```
#[macro_export]
macro_rules! declare_raft_types {
    ($(#[$outer:meta])* $visibility:vis $id:ident) => {
        $crate::declare_raft_types!($(#[$outer])* $visibility $id: AppData = String);
    };

    ($(#[$outer:meta])* $visibility:vis $id:ident:) => {
        $crate::declare_raft_types!($(#[$outer])* $visibility $id: AppData = String);
    };

    ($(#[$outer:meta])* $visibility:vis $id:ident: $(#[$inner:meta])* AppData = $type:ty $(,)? ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd)]
        #[derive(serde::Deserialize, serde::Serialize)]
        $visibility struct $id {}

        impl $crate::TypeConfig for $id {
            $(#[$inner])*
            type AppData = $type;
        }
    };
}
