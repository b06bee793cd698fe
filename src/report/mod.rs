//! Reporting utilities: hover labels, run summaries and sector tables.

pub mod format;

pub use format::*;

/// Years reported in the run summary next to the horizon year.
pub const CHECKPOINT_YEARS: [i32; 1] = [2050];

/// Checkpoint years for a run: the fixed checkpoints that fall inside the
/// projection range, then the horizon itself.
pub fn checkpoint_years(horizon_year: i32) -> Vec<i32> {
    let mut years: Vec<i32> = CHECKPOINT_YEARS
        .iter()
        .copied()
        .filter(|&y| y < horizon_year)
        .collect();
    years.push(horizon_year);
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoints_end_at_horizon() {
        assert_eq!(checkpoint_years(2100), vec![2050, 2100]);
        assert_eq!(checkpoint_years(2040), vec![2040]);
    }
}
