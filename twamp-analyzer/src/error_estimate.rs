//! TWAMP Error Estimate codec (RFC 4656 §4.1.2 field, as carried by RFC 5357
//! timestamps): a 16-bit field encoding a party's estimate of its own
//! timestamp error and whether its clock is externally synchronized.
//!
//! Bit layout: bit 15 = S (synchronized), bit 14 = Z (unavailable),
//! bits 8-13 = Scale (6 bits), bits 0-7 = Multiplier (8 bits).

const SYNCED_BIT: u16 = 1 << 15;
const UNAVAILABLE_BIT: u16 = 1 << 14;
const SCALE_SHIFT: u16 = 8;
const SCALE_MASK: u16 = 0b0011_1111;
const MULTIPLIER_MASK: u16 = 0x00FF;

/// Sentinel returned for `errorSeconds` when the estimate is unavailable or
/// the Multiplier is zero (a corrupt/unset estimate).
pub const UNAVAILABLE_SENTINEL: f64 = -1.0;

const MIN_ERROR_SECONDS: f64 = 1e-6;
const MAX_ERROR_SECONDS: f64 = 100.0;
const MAX_SCALE: u8 = 63;

/// A decoded Error Estimate field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedErrorEstimate {
    pub synced: bool,
    pub unavailable: bool,
    pub scale: u8,
    pub multiplier: u8,
    /// `multiplier * 2^(-scale)`, or [`UNAVAILABLE_SENTINEL`] when
    /// `unavailable` or `multiplier == 0`.
    pub error_seconds: f64,
}

/// Encode a clock-quality reading into the 16-bit wire field.
///
/// When `unavailable`, emits Z=1 with Multiplier=1, Scale=0 (a fixed,
/// recognizable pattern; its Multiplier/Scale are not meant to be decoded
/// as a real error estimate). Otherwise clamps `error_seconds` to
/// `[1e-6, 100]` and picks the smallest Scale in `[0, 63]` whose rounded
/// Multiplier lands in `[1, 255]`, preserving ~0.4% relative precision.
pub fn encode(synced: bool, unavailable: bool, error_seconds: f64) -> u16 {
    if unavailable {
        return UNAVAILABLE_BIT | (1u16 & MULTIPLIER_MASK);
    }

    let clamped = error_seconds.clamp(MIN_ERROR_SECONDS, MAX_ERROR_SECONDS);

    let mut scale: u8 = 0;
    let mut multiplier: u16 = 0;
    for candidate_scale in 0..=MAX_SCALE {
        let candidate_multiplier = (clamped * 2f64.powi(candidate_scale as i32)).round();
        if (1.0..=255.0).contains(&candidate_multiplier) {
            scale = candidate_scale;
            multiplier = candidate_multiplier as u16;
            break;
        }
        if candidate_scale == MAX_SCALE {
            scale = candidate_scale;
            multiplier = candidate_multiplier.clamp(1.0, 255.0) as u16;
        }
    }

    let mut field = (scale as u16) << SCALE_SHIFT;
    field |= multiplier & MULTIPLIER_MASK;
    if synced {
        field |= SYNCED_BIT;
    }
    field
}

/// Decode the 16-bit wire field into its components.
pub fn decode(raw: u16) -> DecodedErrorEstimate {
    let synced = raw & SYNCED_BIT != 0;
    let unavailable = raw & UNAVAILABLE_BIT != 0;
    let scale = ((raw >> SCALE_SHIFT) & SCALE_MASK) as u8;
    let multiplier = (raw & MULTIPLIER_MASK) as u8;

    let error_seconds = if unavailable || multiplier == 0 {
        UNAVAILABLE_SENTINEL
    } else {
        multiplier as f64 * 2f64.powi(-(scale as i32))
    };

    DecodedErrorEstimate { synced, unavailable, scale, multiplier, error_seconds }
}
