use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Declaration order is the classification precedence (derived `Ord`).
str_enum!(FieldCategory {
    Morphology => "Morphology",
    Enzyme => "Enzyme",
    Fermentation => "Fermentation",
    Other => "Other",
});

impl FieldCategory {
    /// All categories in precedence order.
    pub fn all() -> &'static [FieldCategory] {
        &[
            FieldCategory::Morphology,
            FieldCategory::Enzyme,
            FieldCategory::Fermentation,
            FieldCategory::Other,
        ]
    }
}

str_enum!(ExtractionSource {
    Generative => "generative",
    Rules => "rules",
});
