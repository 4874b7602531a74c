/// Normalize observation text before pattern matching.
///
/// Unifies dash variants to `-`, collapses every whitespace run (newlines
/// included) to a single space, and case-folds.
pub fn normalize_observation_text(raw: &str) -> String {
    let unified: String = raw
        .chars()
        .map(|c| match c {
            '\u{2010}' // Hyphen ‐
            | '\u{2011}' // Non-breaking hyphen
            | '\u{2012}' // Figure dash ‒
            | '\u{2013}' // En-dash –
            | '\u{2014}' // Em-dash —
            | '\u{2015}' // Horizontal bar ―
            | '\u{2212}' // Minus sign −
            | '\u{FE63}' // Small hyphen-minus
            | '\u{FF0D}' => '-', // Fullwidth hyphen-minus
            c if c.is_control() && !c.is_whitespace() => ' ',
            c => c,
        })
        .collect();

    unified
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize a schema field name the same way as observation text.
pub fn normalize_field_name(field: &str) -> String {
    normalize_observation_text(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_dash_variants() {
        let clean = normalize_observation_text("Oxidase \u{2013} catalase \u{2014} urease \u{2212}");
        assert_eq!(clean, "oxidase - catalase - urease -");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let clean = normalize_observation_text("  Gram   negative\n\trod  ");
        assert_eq!(clean, "gram negative rod");
    }

    #[test]
    fn case_folds() {
        assert_eq!(normalize_observation_text("OXIDASE Positive"), "oxidase positive");
    }

    #[test]
    fn strips_control_characters() {
        let clean = normalize_observation_text("catalase\x00positive");
        assert_eq!(clean, "catalase positive");
    }

    #[test]
    fn preserves_plus_sign() {
        assert_eq!(normalize_observation_text("Indole +"), "indole +");
    }

    #[test]
    fn field_names_normalize_like_text() {
        assert_eq!(normalize_field_name("Glucose  Fermentation"), "glucose fermentation");
    }
}
