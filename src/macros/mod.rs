//! Crate-internal declarative macros.

/// Declares a `Copy` enum stored as a fixed text code.
///
/// Generates `as_str`, `ALL`, `Display`, and a `FromStr` that fails with a
/// [`ValidationError`](crate::error::ValidationError) naming the enum.
///
/// ```ignore
/// text_enum! {
///     pub enum PaymentType {
///         Incoming => "incoming",
///         Outgoing => "outgoing",
///     }
/// }
/// ```
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::error::ValidationError::new(format!(
                        "unknown {} {:?}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}
