mod minor_units;

pub mod op;
mod secret;

pub mod helpers;

pub use helpers::parse_boolean_flag;
pub use minor_units::{MinorUnits, MinorUnitsConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
