//! Built-in conversion tables
//!
//! Each category is a near-minimum spanning tree: only as many edges as are
//! needed to connect every unit, smaller unit first. Temperature uses
//! Celsius as the hub, with explicit transforms in both directions.

use std::collections::BTreeMap;
use crate::error::GraphError;
use crate::graph::{ConversionGraph, TransformFn};
use crate::identifier::UnitId;

/// `(from, to, factor)` with `from_value * factor == to_value`
const SCALAR_EDGES: &[(&str, &str, f64)] = &[
    // Time
    ("time.s", "time.min", 1.0 / 60.0),
    ("time.min", "time.h", 1.0 / 60.0),
    ("time.h", "time.d", 1.0 / 24.0),
    ("time.d", "time.wk", 1.0 / 7.0),
    ("time.d", "time.yr", 1.0 / 365.25),

    // Distance
    ("distance.in", "distance.ft", 1.0 / 12.0),
    ("distance.in", "distance.cm", 2.54),
    ("distance.mm", "distance.cm", 1.0 / 10.0),
    ("distance.cm", "distance.m", 1.0 / 100.0),
    ("distance.m", "distance.km", 1.0 / 1000.0),
    ("distance.km", "distance.mi", 1.0 / 1.609344),

    // Weight
    ("weight.oz", "weight.lb", 1.0 / 16.0),
    ("weight.g", "weight.kg", 1.0 / 1000.0),
    ("weight.lb", "weight.kg", 0.453592),
    ("weight.lb", "weight.st", 1.0 / 14.0),
    ("weight.lb", "weight.t", 1.0 / 2000.0),

    // Volume
    ("volume.tsp", "volume.tbsp", 1.0 / 3.0),
    ("volume.tsp", "volume.ml", 4.92892),
    ("volume.tbsp", "volume.floz", 1.0 / 2.0),
    ("volume.tbsp", "volume.ml", 14.7868),
    ("volume.ml", "volume.floz", 1.0 / 29.5735),
    ("volume.ml", "volume.l", 1.0 / 1000.0),
    ("volume.floz", "volume.cup", 1.0 / 8.0),
    ("volume.pt", "volume.qt", 1.0 / 2.0),
    ("volume.pt", "volume.l", 0.473176),
    ("volume.qt", "volume.l", 0.946353),
    ("volume.qt", "volume.gal", 1.0 / 4.0),
    ("volume.l", "volume.gal", 1.0 / 3.78541),

    // Speed
    ("speed.mps", "speed.kph", 3.6),
    ("speed.kph", "speed.mph", 1.0 / 1.609344),
    ("speed.kph", "speed.kn", 1.0 / 1.852),
    ("speed.mph", "speed.kn", 1.0 / 1.15078),

    // Area
    ("area.in2", "area.ft2", 1.0 / 144.0),
    ("area.in2", "area.cm2", 6.4516),
    ("area.cm2", "area.m2", 1.0 / 10000.0),
    ("area.ft2", "area.m2", 0.092903),
    ("area.ft2", "area.ac", 1.0 / 43560.0),

    // Power
    ("power.w", "power.hp", 1.0 / 745.7),
];

fn celsius_to_fahrenheit(value: f64) -> f64 {
    value * 9.0 / 5.0 + 32.0
}

fn fahrenheit_to_celsius(value: f64) -> f64 {
    (value - 32.0) * 5.0 / 9.0
}

fn celsius_to_kelvin(value: f64) -> f64 {
    value + 273.15
}

fn kelvin_to_celsius(value: f64) -> f64 {
    value - 273.15
}

const TRANSFORM_EDGES: &[(&str, &str, TransformFn)] = &[
    ("temperature.c", "temperature.f", celsius_to_fahrenheit as TransformFn),
    ("temperature.f", "temperature.c", fahrenheit_to_celsius as TransformFn),
    ("temperature.c", "temperature.k", celsius_to_kelvin as TransformFn),
    ("temperature.k", "temperature.c", kelvin_to_celsius as TransformFn),
];

/// Abbreviation to full English name
const UNIT_NAMES: &[(&str, &str)] = &[
    // Time
    ("s", "seconds"),
    ("min", "minutes"),
    ("h", "hours"),
    ("d", "days"),
    ("wk", "weeks"),
    ("yr", "years"),

    // Temperature
    ("c", "Celsius"),
    ("f", "Fahrenheit"),
    ("k", "Kelvin"),

    // Distance
    ("in", "inches"),
    ("ft", "feet"),
    ("mm", "millimeters"),
    ("cm", "centimeters"),
    ("m", "meters"),
    ("km", "kilometers"),
    ("mi", "miles"),

    // Weight
    ("oz", "ounces"),
    ("lb", "pounds"),
    ("g", "grams"),
    ("kg", "kilograms"),
    ("st", "stone"),
    ("t", "tons"),

    // Volume
    ("tsp", "teaspoons"),
    ("tbsp", "tablespoons"),
    ("ml", "milliliters"),
    ("l", "liters"),
    ("floz", "fluid ounces"),
    ("cup", "cups"),
    ("pt", "pints"),
    ("qt", "quarts"),
    ("gal", "gallons"),

    // Speed
    ("mps", "meters/second"),
    ("kph", "kilometers/h"),
    ("mph", "miles/h"),
    ("kn", "knots"),

    // Area
    ("in2", "inches^2"),
    ("ft2", "feet^2"),
    ("cm2", "centimeters^2"),
    ("m2", "meters^2"),
    ("ac", "acres"),

    // Power
    ("w", "watts"),
    ("hp", "horsepower"),
];

/// Build the fixed edge table
pub fn builtin_graph() -> Result<ConversionGraph, GraphError> {
    let mut graph = ConversionGraph::new();

    for (from, to, factor) in SCALAR_EDGES {
        graph.insert_scalar(UnitId::parse(from)?, UnitId::parse(to)?, *factor)?;
    }
    for (from, to, transform) in TRANSFORM_EDGES {
        graph.insert_transform(UnitId::parse(from)?, UnitId::parse(to)?, *transform)?;
    }

    Ok(graph)
}

/// Display names for the built-in units
pub fn builtin_labels() -> BTreeMap<String, String> {
    UNIT_NAMES
        .iter()
        .map(|(abbrev, name)| (abbrev.to_string(), name.to_string()))
        .collect()
}
