use super::ApiError;

pub fn validate_non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn validate_display_name(name: &str) -> Result<&str, ApiError> {
    if name.len() > 80 {
        return Err(ApiError::validation(
            "Display name must be 80 characters or less",
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(ApiError::validation(
            "Display name cannot contain control characters",
        ));
    }

    Ok(name)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page numbers start at 1"));
    }
    Ok(page)
}

pub fn validate_page_size(page_size: u64) -> Result<u64, ApiError> {
    const MAX_PAGE_SIZE: u64 = 500;

    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {page_size}. Must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("value", "field").is_ok());
        assert_eq!(validate_non_empty("  x  ", "field").unwrap(), "x");
        assert!(validate_non_empty("", "field").is_err());
        assert!(validate_non_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Alice Example").is_ok());
        assert!(validate_display_name("").is_ok());
        assert!(validate_display_name(&"a".repeat(81)).is_err());
        assert!(validate_display_name("bad\nname").is_err());
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(500).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(501).is_err());
    }
}
