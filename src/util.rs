pub const NOT_AVAILABLE: &str = "not available";

pub fn entity_label(id: u32) -> String {
    format!("Subject {id}")
}

pub fn format_total(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_mean(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.1}"),
        None => NOT_AVAILABLE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_grouped_by_thousands() {
        assert_eq!(format_total(0.0), "0");
        assert_eq!(format_total(999.4), "999");
        assert_eq!(format_total(1000.0), "1,000");
        assert_eq!(format_total(12345.6), "12,346");
        assert_eq!(format_total(-2500000.0), "-2,500,000");
    }

    #[test]
    fn absent_mean_renders_placeholder() {
        assert_eq!(format_mean(Some(71.26)), "71.3");
        assert_eq!(format_mean(None), "not available");
    }
}
