//! Display/mechanical angle conversion
//!
//! A joint has two angle spaces: the *display* angle shown on the control
//! surface (degrees, before home-offset correction) and the *mechanical*
//! angle written to the scene node's rotation field (radians, after the
//! correction). The home offset accounts for the model's rest geometry not
//! being zero-rotation for that joint.

/// Convert a display angle (degrees) to the mechanical angle (radians)
/// applied to the scene node.
pub fn to_mechanical(display_deg: f64, home_offset_deg: f64) -> f64 {
    (display_deg - home_offset_deg).to_radians()
}

/// Convert a mechanical angle (radians) read from the scene node back to
/// the display angle (degrees). Exact inverse of [`to_mechanical`].
pub fn to_display(mechanical_rad: f64, home_offset_deg: f64) -> f64 {
    mechanical_rad.to_degrees() + home_offset_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for offset in [-90.0, -35.0, 0.0, 45.0, 180.0] {
            let mut display = -345.0;
            while display <= 345.0 {
                let back = to_display(to_mechanical(display, offset), offset);
                assert!(
                    (back - display).abs() < 1e-9,
                    "round trip failed for display={display} offset={offset}: got {back}"
                );
                display += 7.5;
            }
        }
    }

    #[test]
    fn test_home_offset_maps_to_mechanical_zero() {
        // A joint whose rest geometry sits at -90 display degrees reads
        // zero radians on the scene node at that display angle.
        let mech = to_mechanical(-90.0, -90.0);
        assert!(mech.abs() < 1e-12);
    }

    #[test]
    fn test_quarter_turn() {
        let mech = to_mechanical(90.0, 0.0);
        assert!((mech - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((to_display(std::f64::consts::PI, 0.0) - 180.0).abs() < 1e-9);
    }
}
