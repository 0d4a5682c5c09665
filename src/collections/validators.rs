/// Validates a collection name from a create request
pub fn validate_collection_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Collection name is required".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_collection_name() {
        assert!(validate_collection_name("Binder").is_ok());
        assert!(validate_collection_name("").is_err());
        // Whitespace-only names pass; only the empty string is rejected
        assert!(validate_collection_name(" ").is_ok());
    }
}
