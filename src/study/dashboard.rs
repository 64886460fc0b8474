use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeleteBlocked {
    #[error("You can't delete the last set!")]
    LastSet,
}

/// Trimmed set name, `None` when blank.
pub fn validate_set_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// At least one set must always remain.
pub fn can_delete_set(total_sets: usize) -> Result<(), DeleteBlocked> {
    if total_sets <= 1 {
        return Err(DeleteBlocked::LastSet);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_names_are_trimmed() {
        assert_eq!(validate_set_name("  Verbs "), Some("Verbs".to_string()));
        assert_eq!(validate_set_name(" \t "), None);
        assert_eq!(validate_set_name(""), None);
    }

    #[test]
    fn last_set_cannot_be_deleted() {
        assert_eq!(can_delete_set(1), Err(DeleteBlocked::LastSet));
        assert_eq!(DeleteBlocked::LastSet.to_string(), "You can't delete the last set!");
        assert_eq!(can_delete_set(2), Ok(()));
    }
}
