//! Request schema: which fields a deployment expects, their bounds, and the
//! validator that turns a raw JSON body into a [`ValidatedInput`].

use crate::error::Violation;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
}

/// A named numeric field with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
}

pub const YEAR: FieldSpec = FieldSpec {
    name: "year",
    kind: FieldKind::Integer,
    min: 2024.0,
    max: 2050.0,
};

pub const POPULATION_GROWTH: FieldSpec = FieldSpec {
    name: "population_growth",
    kind: FieldKind::Number,
    min: -5.0,
    max: 10.0,
};

pub const AGRICULTURAL_LAND_PERCENT: FieldSpec = FieldSpec {
    name: "agricultural_land_percent",
    kind: FieldKind::Number,
    min: 0.0,
    max: 100.0,
};

pub const LITERACY_RATE: FieldSpec = FieldSpec {
    name: "literacy_rate",
    kind: FieldKind::Number,
    min: 0.0,
    max: 100.0,
};

pub const OIL_PRICE: FieldSpec = FieldSpec {
    name: "oil_price",
    kind: FieldKind::Number,
    min: 0.0,
    max: 200.0,
};

const YEAR_FIELDS: &[FieldSpec] = &[YEAR];

// Column order the models were trained with.
const INDICATOR_FIELDS: &[FieldSpec] = &[
    YEAR,
    POPULATION_GROWTH,
    AGRICULTURAL_LAND_PERCENT,
    LITERACY_RATE,
    OIL_PRICE,
];

/// The feature vector a deployment's model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    /// Year only.
    #[default]
    Year,
    /// Year plus four economic indicators.
    Indicators,
}

impl FeatureSet {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            FeatureSet::Year => YEAR_FIELDS,
            FeatureSet::Indicators => INDICATOR_FIELDS,
        }
    }

    pub fn width(&self) -> usize {
        self.fields().len()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureSet::Year => "year",
            FeatureSet::Indicators => "indicators",
        }
    }

    /// Check every field of `body` and collect all violations.
    pub fn validate(&self, body: &Value) -> Result<ValidatedInput, Vec<Violation>> {
        let object = match body.as_object() {
            Some(object) => object,
            None => {
                return Err(vec![Violation::new("body", "expected a JSON object")
                    .with_input(body.clone())])
            }
        };

        let mut values = Vec::with_capacity(self.width());
        let mut violations = Vec::new();
        for spec in self.fields() {
            match check_field(spec, object) {
                Ok(value) => values.push(value),
                Err(violation) => violations.push(violation),
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ValidatedInput {
            feature_set: *self,
            values,
        })
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_field(spec: &FieldSpec, object: &Map<String, Value>) -> Result<f64, Violation> {
    let raw = match object.get(spec.name) {
        Some(Value::Null) | None => return Err(Violation::new(spec.name, "field required")),
        Some(raw) => raw,
    };

    let value = match raw.as_f64() {
        Some(value) if value.is_finite() => value,
        _ => {
            return Err(Violation::new(spec.name, "value is not a valid number")
                .with_input(raw.clone()))
        }
    };

    if spec.kind == FieldKind::Integer && value.fract() != 0.0 {
        return Err(Violation::new(spec.name, "value is not a valid integer")
            .with_input(raw.clone()));
    }

    if value < spec.min || value > spec.max {
        return Err(Violation::new(
            spec.name,
            format!(
                "ensure this value is between {} and {} inclusive",
                spec.min, spec.max
            ),
        )
        .with_input(raw.clone()));
    }

    Ok(value)
}

/// A request whose every field passed its bound check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput {
    feature_set: FeatureSet,
    values: Vec<f64>,
}

impl ValidatedInput {
    pub fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }

    pub fn year(&self) -> i64 {
        // year is always the first column and was checked to be integral
        self.values[0] as i64
    }

    /// Feature vector in training column order.
    pub fn features(&self) -> Array1<f64> {
        Array1::from(self.values.clone())
    }

    /// The validated fields as a JSON object, for echoing back to the client.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (spec, value) in self.feature_set.fields().iter().zip(&self.values) {
            let value = match spec.kind {
                FieldKind::Integer => Value::from(*value as i64),
                FieldKind::Number => Value::from(*value),
            };
            map.insert(spec.name.to_string(), value);
        }
        Value::Object(map)
    }
}
