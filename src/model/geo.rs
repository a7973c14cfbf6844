// In: src/model/geo.rs

//! Packed geographic locations.
//!
//! Points store their location as one opaque 64-bit code. The codec only
//! needs to turn that code into a (latitude, longitude) pair on write and back
//! on read; how the pair is packed is pluggable.

use std::fmt::Debug;

/// Converts between packed location codes and degree pairs.
pub trait GeoCodec: Debug + Send + Sync {
    /// Packs a latitude/longitude pair, in degrees, into a location code.
    fn pack(&self, latitude: f64, longitude: f64) -> i64;

    /// Unpacks a location code into `(latitude, longitude)` in degrees.
    fn unpack(&self, code: i64) -> (f64, f64);
}

/// Stores the `f32` bit patterns of latitude (high word) and longitude (low
/// word) side by side.
///
/// Lossless for every coordinate that survives the `f32` columns of the
/// stream, which makes `unpack(pack(lat, lon))` exact after one write/read.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitPairGeoCodec;

impl GeoCodec for BitPairGeoCodec {
    fn pack(&self, latitude: f64, longitude: f64) -> i64 {
        let high = (latitude as f32).to_bits() as u64;
        let low = (longitude as f32).to_bits() as u64;
        ((high << 32) | low) as i64
    }

    fn unpack(&self, code: i64) -> (f64, f64) {
        let bits = code as u64;
        let latitude = f32::from_bits((bits >> 32) as u32);
        let longitude = f32::from_bits((bits & 0xFFFF_FFFF) as u32);
        (latitude as f64, longitude as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_pair_is_exact_for_f32_coordinates() {
        let codec = BitPairGeoCodec;
        let points = [(48.8566f32, 2.3522f32), (-33.8688, 151.2093), (0.0, -0.0), (90.0, -180.0)];
        for (lat, lon) in points {
            let code = codec.pack(lat as f64, lon as f64);
            let (out_lat, out_lon) = codec.unpack(code);
            assert_eq!(out_lat as f32, lat);
            assert_eq!(out_lon as f32, lon);
            assert_eq!(codec.pack(out_lat, out_lon), code);
        }
    }
}
