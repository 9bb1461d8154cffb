// Declarative per-endpoint field schemas
use super::record::{MEASUREMENT_COLUMN, TIME_COLUMN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
    Timestamp,
}

/// A logical parameter whose extremes are stored as a min/max field pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterGroup {
    pub name: &'static str,
    pub min_field: &'static str,
    pub max_field: &'static str,
}

const REALTIME_FIELDS: &[&str] = &[
    "voltage",
    "current",
    "p_active",
    "p_reactive",
    "p_apparent",
    "frequency",
    "power_factor",
    "thd_voltage",
    "thd_current",
    "energy_import",
    "energy_export",
];

const POWER_FIELDS: &[&str] = &[
    "pv_power",
    "battery_power",
    "battery_soc",
    "grid_power",
    "load_power",
];

const CONSUMPTION_FIELDS: &[&str] = &["p_active"];

const fn group(
    name: &'static str,
    min_field: &'static str,
    max_field: &'static str,
) -> ParameterGroup {
    ParameterGroup {
        name,
        min_field,
        max_field,
    }
}

pub const EXTREME_GROUPS: &[ParameterGroup] = &[
    group("frequency", "frequency_min", "frequency_max"),
    group("voltage", "voltage_min", "voltage_max"),
    group("current", "current_min", "current_max"),
    group("power", "p_active_min", "p_active_max"),
    group("reactive_power", "p_reactive_min", "p_reactive_max"),
    group("apparent_power", "p_apparent_min", "p_apparent_max"),
    group("power_factor", "power_factor_min", "power_factor_max"),
    group("thd", "thd_min", "thd_max"),
];

/// What one endpoint fetches and how its columns are coerced.
#[derive(Debug, Clone)]
pub struct EndpointSchema {
    pub name: &'static str,
    pub measurement: String,
    /// Numeric fields, in the order they are queried and charted.
    pub fields: Vec<&'static str>,
    /// Trailing sample count kept for chart series.
    pub window: usize,
    pub groups: &'static [ParameterGroup],
}

impl EndpointSchema {
    pub fn realtime(measurement: impl Into<String>) -> Self {
        Self {
            name: "realtime",
            measurement: measurement.into(),
            fields: REALTIME_FIELDS.to_vec(),
            window: 60,
            groups: &[],
        }
    }

    pub fn power(measurement: impl Into<String>) -> Self {
        Self {
            name: "power",
            measurement: measurement.into(),
            fields: POWER_FIELDS.to_vec(),
            window: 30,
            groups: &[],
        }
    }

    pub fn extremes(measurement: impl Into<String>) -> Self {
        let fields = EXTREME_GROUPS
            .iter()
            .flat_map(|g| [g.min_field, g.max_field])
            .collect();
        Self {
            name: "extremes",
            measurement: measurement.into(),
            fields,
            window: 30,
            groups: EXTREME_GROUPS,
        }
    }

    pub fn consumption(measurement: impl Into<String>) -> Self {
        Self {
            name: "consumption",
            measurement: measurement.into(),
            fields: CONSUMPTION_FIELDS.to_vec(),
            window: 0,
            groups: &[],
        }
    }

    pub fn kind_of(&self, column: &str) -> FieldKind {
        if column == TIME_COLUMN {
            FieldKind::Timestamp
        } else if self.fields.iter().any(|f| *f == column) {
            FieldKind::Numeric
        } else {
            FieldKind::Text
        }
    }

    /// Field names reported in response metadata.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = vec![TIME_COLUMN.to_string(), MEASUREMENT_COLUMN.to_string()];
        names.extend(self.fields.iter().map(|f| f.to_string()));
        names
    }
}
