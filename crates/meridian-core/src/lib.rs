//! # Meridian Core
//!
//! Coordinate Reference System support shared across the Meridian GIS
//! Platform: the projection definitions and point-transform primitives that
//! `meridian-analysis` reprojects forest-parcel geometry through before area
//! calculations.
//!
//! ```ignore
//! use meridian_core::crs::Crs;
//!
//! let mut wgs84 = Crs::wgs84();
//! let lambert93 = Crs::lambert93();
//! let (x, y) = wgs84.transform_point(2.35, 48.85, &lambert93)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use proj;

pub mod crs;
pub mod error;

/// The version of the Meridian Core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
