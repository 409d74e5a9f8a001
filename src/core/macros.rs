//! Macros for reducing boilerplate when defining query shapes
//!
//! Each shape needs the struct, the `QueryShape` impl, and a descriptor
//! constructor for registration; `query_shape!` generates all three.

/// Define a query shape struct with its discriminator
///
/// Generates the `Deserialize` struct (camelCase wire naming), the
/// [`QueryShape`](crate::core::shape::QueryShape) impl, a `DISCRIMINATOR`
/// constant, and a `descriptor()` constructor for registry registration.
/// Fields typed `Option<T>` are optional filters; everything else is
/// required.
///
/// # Example
///
/// ```rust,ignore
/// query_shape!(
///     /// Players belonging to one team, optionally narrowed to a season.
///     PlayersByTeam, "PlayersByTeam", {
///         team_id: i64,
///         season: Option<i64>,
///     }
/// );
///
/// let engine = QueryEngine::builder()
///     .register_shape(PlayersByTeam::descriptor())
///     ...
/// ```
#[macro_export]
macro_rules! query_shape {
    (
        $(#[$meta:meta])*
        $name:ident, $discriminator:literal, {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::core::shape::QueryShape for $name {
            fn discriminator(&self) -> &'static str {
                $discriminator
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $name {
            /// Discriminator string this shape is registered under
            pub const DISCRIMINATOR: &'static str = $discriminator;

            /// Registry descriptor for this shape
            pub fn descriptor() -> $crate::core::shape::ShapeDescriptor {
                $crate::core::shape::ShapeDescriptor::new::<$name>($discriminator)
            }
        }
    };
}
