//! Formatting utilities for display values.

/// Completion percentage in [0.0, 100.0]. Defined as 0.0 when total is zero.
pub fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert!((percentage(3, 4) - 75.0).abs() < f64::EPSILON);
        assert!((percentage(4, 4) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
