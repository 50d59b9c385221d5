// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast field parsing for the textual capture formats
//!
//! PLY rows and pose CSV rows are plain decimal fields. Floats go through
//! fast-float and integers through lexical-core, which keeps loading a
//! multi-million point cloud dominated by I/O rather than number parsing.

/// Parse a single float field, ignoring surrounding whitespace
#[inline]
pub fn parse_f32(field: &str) -> Option<f32> {
    fast_float::parse::<f32, _>(field.trim()).ok()
}

/// Parse a single signed integer field
#[inline]
pub fn parse_i64(field: &str) -> Option<i64> {
    lexical_core::parse::<i64>(field.trim().as_bytes()).ok()
}

/// Parse a single unsigned integer field
#[inline]
pub fn parse_u32(field: &str) -> Option<u32> {
    lexical_core::parse::<u32>(field.trim().as_bytes()).ok()
}

/// Parse an integer colour channel and clamp it into 0..=255
///
/// Values such as `300` or `-4` appear in hand-edited files; they are
/// clamped instead of rejected.
#[inline]
pub fn parse_channel(field: &str) -> Option<u8> {
    let value = lexical_core::parse::<i64>(field.trim().as_bytes())
        .ok()
        .or_else(|| parse_f32(field).map(|f| f as i64))?;
    Some(value.clamp(0, 255) as u8)
}

/// Split a whitespace separated row into fields
#[inline]
pub fn split_whitespace_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split_ascii_whitespace()
}

/// Parse the first `out.len()` whitespace separated floats of a row
///
/// Returns `false` if the row has fewer fields or a field is not a number.
pub fn parse_floats_into(line: &str, out: &mut [f32]) -> bool {
    let mut fields = split_whitespace_fields(line);
    for slot in out.iter_mut() {
        match fields.next().and_then(parse_f32) {
            Some(v) => *slot = v,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f32_variants() {
        assert_eq!(parse_f32("1.5"), Some(1.5));
        assert_eq!(parse_f32(" -0.25 "), Some(-0.25));
        assert_eq!(parse_f32("1.0E-5"), Some(1.0e-5));
        assert_eq!(parse_f32("abc"), None);
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse_i64("123456789012"), Some(123_456_789_012));
        assert_eq!(parse_u32("640"), Some(640));
        assert_eq!(parse_u32("-1"), None);
    }

    #[test]
    fn test_parse_channel_clamps() {
        assert_eq!(parse_channel("300"), Some(255));
        assert_eq!(parse_channel("-4"), Some(0));
        assert_eq!(parse_channel("17"), Some(17));
    }

    #[test]
    fn test_parse_floats_into() {
        let mut xyz = [0.0f32; 3];
        assert!(parse_floats_into("0.5 1 -2 200 10 0", &mut xyz));
        assert_eq!(xyz, [0.5, 1.0, -2.0]);
        assert!(!parse_floats_into("0.5 1", &mut xyz));
    }
}
