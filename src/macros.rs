/// Declares a fieldless enum that mirrors one of the platform's enumerations.
///
/// The generated type serialises under the platform's upper-case name, keeps
/// the platform's integer code and parses from either name form.
macro_rules! platform_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[repr(u8)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant = $code,
            )+
        }

        impl $name {
            /// Every variant, ordered by platform code
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Integer code used by the platform
            pub fn as_code(self) -> u8 {
                self as u8
            }

            /// Platform name of the variant
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<u8> for $name {
            type Error = crate::errors::Error;

            fn try_from(code: u8) -> crate::errors::Result<Self> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(crate::errors::Error::Parse(format!(
                        "invalid {} code: {}",
                        stringify!($name),
                        code
                    ))),
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::Error;

            fn from_str(s: &str) -> crate::errors::Result<Self> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_").replace(' ', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.as_str() == normalized)
                    .ok_or_else(|| {
                        crate::errors::Error::Parse(format!(
                            "unknown {}: {}",
                            stringify!($name),
                            s
                        ))
                    })
            }
        }
    };
}
