/// Declares a `String` newtype that can only hold values accepted by
/// `$is_valid`, together with its error type.
///
/// Deserialization goes through the same check, so invalid values never
/// make it past the edge of the model.
macro_rules! validated_text {
    ($(#[$meta:meta])* $name:ident, $error:ident, $expected:literal, $is_valid:path) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, ::thiserror::Error)]
        #[error("The value is not a valid {}: {:?}", $expected, .0)]
        pub struct $error(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, $error> {
                let value = value.into();
                if $is_valid(&value) {
                    Ok(Self(value))
                } else {
                    Err($error(value))
                }
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let inner = <String as ::serde::Deserialize<'de>>::deserialize(deserializer)?;
                Self::new(inner).map_err(|err| {
                    <D::Error as ::serde::de::Error>::invalid_value(
                        ::serde::de::Unexpected::Str(&err.0),
                        &$expected,
                    )
                })
            }
        }
    };
}

pub(crate) use validated_text;

/// Non-empty and at most `max` characters long.
pub(crate) fn has_length(value: &str, max: usize) -> bool {
    !value.is_empty() && value.chars().count() <= max
}
