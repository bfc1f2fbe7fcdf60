/// Format a tick count as `seconds;frames`, frames zero-padded to two digits.
pub fn format_ticks(ticks: u32, ticks_per_second: u32) -> String {
    let tps = ticks_per_second.max(1);
    format!("{};{:02}", ticks / tps, ticks % tps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_frames() {
        assert_eq!(format_ticks(0, 60), "0;00");
        assert_eq!(format_ticks(65, 60), "1;05");
        assert_eq!(format_ticks(719, 60), "11;59");
    }

    #[test]
    fn zero_rate_does_not_divide_by_zero() {
        assert_eq!(format_ticks(3, 0), "3;00");
    }
}
