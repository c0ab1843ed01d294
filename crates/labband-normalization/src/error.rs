use thiserror::Error;

/// Failure while building unit tables from configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitTableError {
    #[error("conversion factor for {from}->{to} must be finite and positive, got {factor}")]
    InvalidFactor { from: String, to: String, factor: f64 },

    #[error("conversion rule maps {unit} onto itself")]
    SameUnit { unit: String },

    #[error("conflicting {scope} factors for {from}->{to}: {first} vs {second}")]
    ConflictingFactor {
        scope: String,
        from: String,
        to: String,
        first: f64,
        second: f64,
    },

    #[error("unit alias {alias} points at {target}, which is itself an alias")]
    AliasChain { alias: String, target: String },
}

/// No conversion path between two canonical units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("no_conversion:{from}->{to}")]
    NoConversion { from: String, to: String },
}
