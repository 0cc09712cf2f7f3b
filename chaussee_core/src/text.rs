//! Text normalisation shared by label parsing and material-name matching.

/// Replace French accented letters by their base letter and spell out
/// the ligatures.
pub(crate) fn fold_accents(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'à' | 'â' | 'ä' => out.push('a'),
            'À' | 'Â' | 'Ä' => out.push('A'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'É' | 'È' | 'Ê' | 'Ë' => out.push('E'),
            'î' | 'ï' => out.push('i'),
            'Î' | 'Ï' => out.push('I'),
            'ô' | 'ö' => out.push('o'),
            'Ô' | 'Ö' => out.push('O'),
            'ù' | 'û' | 'ü' => out.push('u'),
            'Ù' | 'Û' | 'Ü' => out.push('U'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            other => out.push(other),
        }
    }
    out
}

/// Case-, accent- and whitespace-insensitive key.
///
/// Decimal commas become points so "GNT 0/31,5" and "GNT 0/31.5" collide.
pub(crate) fn normalize_key(input: &str) -> String {
    let folded = fold_accents(input.trim()).to_lowercase().replace(',', ".");
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Béton  Standard "), "beton standard");
        assert_eq!(normalize_key("GNT 0/31,5"), normalize_key("gnt 0/31.5"));
        assert_eq!(normalize_key("Matériau spécialisé"), "materiau specialise");
    }

    #[test]
    fn test_ligatures_fold() {
        assert_eq!(fold_accents("Cœur Œuvre"), "Coeur OEuvre");
        assert_eq!(fold_accents("ex æquo"), "ex aequo");
        assert_eq!(normalize_key("Cœur de chaussée"), normalize_key("COEUR DE CHAUSSEE"));
    }
}
