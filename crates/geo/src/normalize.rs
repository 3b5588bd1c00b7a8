//! Query normalization shared by every resolution stage.

/// Chat-Spanish abbreviations expanded before matching. Token-level so
/// `av.` and `av` both become `avenida` without mangling words that
/// merely contain the letters.
const TOKEN_EXPANSIONS: &[(&str, &str)] = &[
    ("av", "avenida"),
    ("avda", "avenida"),
    ("stgo", "santiago"),
    ("rm", "region metropolitana"),
];

/// Tokens dropped entirely; "metro estación central" and "estación
/// central" should match the same gazetteer entry.
const TOKEN_NOISE: &[&str] = &["metro"];

/// Case-fold, strip accents, collapse punctuation and whitespace, and
/// expand the abbreviation table.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(strip_accent)
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect();

    let mut output: Vec<&str> = Vec::new();
    for token in folded.split_whitespace() {
        if TOKEN_NOISE.contains(&token) {
            continue;
        }
        match TOKEN_EXPANSIONS.iter().find(|(short, _)| *short == token) {
            Some((_, expansion)) => output.extend(expansion.split_whitespace()),
            None => output.push(token),
        }
    }

    output.join(" ")
}

pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

fn strip_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, tokens};

    #[test]
    fn folds_case_accents_and_punctuation() {
        assert_eq!(normalize("  Peñaflor,  RM "), "penaflor region metropolitana");
        assert_eq!(normalize("Ñuñoa"), "nunoa");
    }

    #[test]
    fn expands_street_abbreviations() {
        assert_eq!(normalize("Av. Libertador 1234"), "avenida libertador 1234");
        assert_eq!(normalize("avda Pajaritos"), "avenida pajaritos");
    }

    #[test]
    fn expands_city_shorthand() {
        assert_eq!(normalize("stgo centro"), "santiago centro");
    }

    #[test]
    fn drops_transport_noise_tokens() {
        assert_eq!(normalize("Metro Estación Central"), "estacion central");
    }

    #[test]
    fn tokenizes_on_whitespace() {
        assert_eq!(tokens("mall plaza oeste"), vec!["mall", "plaza", "oeste"]);
    }
}
