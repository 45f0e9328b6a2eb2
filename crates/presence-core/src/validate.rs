use crate::error::AppError;
use crate::models::Locator;

/// Normalize raw user input into locators, dropping anything unparseable.
///
/// Order is preserved and duplicates are kept. Fails only when nothing
/// survives.
pub fn validate_locators<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Locator>, AppError> {
    let locators: Vec<Locator> = raw
        .iter()
        .filter_map(|entry| match Locator::parse(entry.as_ref()) {
            Ok(locator) => Some(locator),
            Err(e) => {
                tracing::warn!(input = %entry.as_ref(), error = %e, "Invalid URL skipped");
                None
            }
        })
        .collect();

    if locators.is_empty() {
        return Err(AppError::InvalidInput("No valid URLs provided".into()));
    }

    Ok(locators)
}

/// Strict variant: every entry must parse. Returns the offending entries otherwise.
pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Locator>, Vec<String>> {
    let mut locators = Vec::with_capacity(raw.len());
    let mut invalid = Vec::new();

    for entry in raw {
        match Locator::parse(entry.as_ref()) {
            Ok(locator) => locators.push(locator),
            Err(_) => invalid.push(entry.as_ref().to_string()),
        }
    }

    if invalid.is_empty() {
        Ok(locators)
    } else {
        Err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_duplicates() {
        let out = validate_locators(&["b.com", "a.com", "b.com"]).unwrap();
        let hosts: Vec<&str> = out.iter().map(Locator::host).collect();
        assert_eq!(hosts, vec!["b.com", "a.com", "b.com"]);
    }

    #[test]
    fn skips_invalid_entries() {
        let out = validate_locators(&["", "example.com", "bad host.com"]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_str(), "https://example.com/");
    }

    #[test]
    fn all_invalid_is_an_error() {
        let err = validate_locators(&["", "   "]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(validate_locators::<&str>(&[]).is_err());
    }

    #[test]
    fn parse_all_reports_offenders() {
        let err = parse_all(&["example.com", "bad host.com", ""]).unwrap_err();
        assert_eq!(err, vec!["bad host.com".to_string(), String::new()]);
        assert_eq!(parse_all(&["example.com"]).unwrap().len(), 1);
    }
}
