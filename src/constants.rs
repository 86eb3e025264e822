//! Physical and mathematical constants.

/// Floating-point precision to use for constants.
#[allow(non_camel_case_types)]
pub type fcn = f64;

// Physical constants

/// Mean reference radius of the Earth [km], as adopted by the IGRF.
pub const R_EARTH_KM: fcn = 6371.2;

// Unit conversion factors

/// Conversion factor from degrees to radians.
pub const DEG_TO_RAD: fcn = std::f64::consts::PI / 180.0;
