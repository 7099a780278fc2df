use spg_common::MinorUnits;

/// The gateway expects amounts as decimal numbers in major units.
pub fn major_units_amount(amount: MinorUnits) -> f64 {
    amount.value() as f64 / 100.0
}

/// The gateway only accepts digits (and an optional leading `+`) in phone numbers.
pub fn sanitize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let plus = if trimmed.starts_with('+') { "+" } else { "" };
    let digits = trimmed.chars().filter(char::is_ascii_digit).collect::<String>();
    format!("{plus}{digits}")
}
