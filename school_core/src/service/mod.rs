pub mod avatars;
pub mod faculties;
pub mod roster;
pub mod students;

/// Folded lookup key for case-insensitive matching on names and colors.
pub(crate) fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::fold;

    #[test]
    fn fold_trims_and_lowercases_unicode() {
        assert_eq!(fold("  Gryffindor "), "gryffindor");
        assert_eq!(fold("ГРИФФИНДОР"), "гриффиндор");
        assert_eq!(fold("Ж"), "ж");
    }
}
