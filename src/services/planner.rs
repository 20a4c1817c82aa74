pub const MIN_PANELS: u32 = 4;
pub const MAX_PANELS: u32 = 16;

/// Number of panels for a story read in `reading_time_minutes` by a child of
/// `child_age`. Younger readers and shorter sessions get fewer panels.
///
/// Inputs are expected to be positive; a zero reading time still counts as
/// one time unit.
pub fn plan(reading_time_minutes: u32, child_age: u32) -> u32 {
    let base: u32 = match child_age {
        0..=5 => 4,
        6..=8 => 6,
        9..=12 => 8,
        _ => 10,
    };

    let time_factor = (reading_time_minutes / 2).max(1);

    base.saturating_mul(time_factor).clamp(MIN_PANELS, MAX_PANELS)
}
