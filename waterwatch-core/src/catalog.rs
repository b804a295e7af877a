//! Static units and regulatory limits for the tracked parameters.

use waterwatch_schemas::parameter::{Limit, Parameter};

/// Display unit of a parameter. Empty for dimensionless pH.
pub fn unit_of(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Ammonium
        | Parameter::Phosphate
        | Parameter::Cod
        | Parameter::Bod
        | Parameter::Nitrogen
        | Parameter::Nitrate
        | Parameter::Tss => "mg/L",
        Parameter::Conductivity => "mS/m",
        Parameter::Ph => "",
        Parameter::Turbidity => "NTU",
    }
}

/// Discharge limit of a parameter, if one is regulated.
pub fn limit_of(parameter: Parameter) -> Option<Limit> {
    let limit = match parameter {
        Parameter::Ammonium => Limit::at_most(1.5),
        Parameter::Phosphate => Limit::at_most(0.9),
        Parameter::Cod => Limit::at_most(125.0),
        Parameter::Bod => Limit::at_most(25.0),
        Parameter::Conductivity => Limit::at_most(100.0),
        Parameter::Ph => Limit::between(5.0, 11.0),
        Parameter::Nitrogen => Limit::at_most(25.0),
        Parameter::Nitrate => Limit::at_most(50.0),
        Parameter::Turbidity => Limit::at_most(50.0),
        Parameter::Tss => Limit::at_most(35.0),
    };
    Some(limit).filter(|l| !l.is_unbounded())
}

/// `name (unit)`, or the bare name for unitless parameters.
pub fn with_unit(name: &str, parameter: Parameter) -> String {
    match unit_of(parameter) {
        "" => name.to_string(),
        unit => format!("{} ({})", name, unit),
    }
}

/// Display name with unit, e.g. `COD (mg/L)` or `pH`.
pub fn label_with_unit(parameter: Parameter) -> String {
    with_unit(parameter.display_name(), parameter)
}
