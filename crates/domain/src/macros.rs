//! Macro for implementing Display and FromStr for string-keyed domain enums
//!
//! Used wherever an enum crosses a text boundary (settings keys, command
//! arguments, log fields). Parsing is case-insensitive; output is the
//! canonical snake_case key.
//!
//! # Example
//!
//! ```rust
//! use dealbridge_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum PickerKind {
//!     Warehouse,
//!     ShippingMethod,
//! }
//!
//! impl_domain_enum_conversions!(PickerKind {
//!     Warehouse => "warehouse",
//!     ShippingMethod => "shipping_method",
//! });
//!
//! assert_eq!(PickerKind::ShippingMethod.to_string(), "shipping_method");
//! assert_eq!("WAREHOUSE".parse::<PickerKind>(), Ok(PickerKind::Warehouse));
//! ```

/// Implements Display and FromStr traits for string-keyed enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStage {
        Validating,
        RollingBack,
    }

    impl_domain_enum_conversions!(TestStage {
        Validating => "validating",
        RollingBack => "rolling_back",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestStage::Validating.to_string(), "validating");
        assert_eq!(TestStage::RollingBack.to_string(), "rolling_back");
    }

    #[test]
    fn test_fromstr_mixed_case_and_whitespace() {
        assert_eq!(TestStage::from_str("Validating").unwrap(), TestStage::Validating);
        assert_eq!(TestStage::from_str(" ROLLING_BACK ").unwrap(), TestStage::RollingBack);
    }

    #[test]
    fn test_fromstr_invalid() {
        let err = TestStage::from_str("committed").unwrap_err();
        assert!(err.contains("Invalid TestStage"));
        assert!(err.contains("committed"));
    }
}
