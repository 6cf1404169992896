/// Derive the filesystem-safe form of a human-readable media name.
///
/// Keeps Unicode letters and digits verbatim, maps space/`-`/`_` to `_`,
/// drops everything else, then collapses runs of `_` and trims the ends.
/// Pure and idempotent: `safe_name(safe_name(n)) == safe_name(n)`.
pub fn safe_name(name: &str) -> String {
    let mut mapped = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            mapped.push(ch);
        } else if ch == ' ' || ch == '-' || ch == '_' {
            mapped.push('_');
        }
        // everything else is dropped
    }

    let mut collapsed = String::with_capacity(mapped.len());
    let mut prev_underscore = false;
    for ch in mapped.chars() {
        if ch == '_' {
            if !prev_underscore {
                collapsed.push('_');
            }
            prev_underscore = true;
        } else {
            collapsed.push(ch);
            prev_underscore = false;
        }
    }

    collapsed.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_maps_separators() {
        assert_eq!(safe_name("It's a Test!"), "Its_a_Test");
        assert_eq!(safe_name("Movie (2024)"), "Movie_2024");
        assert_eq!(safe_name("The Matrix: Reloaded"), "The_Matrix_Reloaded");
    }

    #[test]
    fn collapses_runs_and_trims_ends() {
        assert_eq!(safe_name("  --Foo__Bar--  "), "Foo_Bar");
        assert_eq!(safe_name("___"), "");
    }

    #[test]
    fn keeps_unicode_letters_and_digits() {
        assert_eq!(safe_name("Amélie 2001"), "Amélie_2001");
        assert_eq!(safe_name("東京物語"), "東京物語");
    }

    #[test]
    fn is_idempotent() {
        for input in ["It's a Test!", "Movie (2024)", "already_safe", ""] {
            let once = safe_name(input);
            let twice = safe_name(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
