/// Heuristic structural complexity of rule text, in [0, 1].
///
/// `len/1000 + parens*0.1 + alternations*0.05 + wildcards*0.02 + repetitions*0.02`,
/// capped at 1.0. Parens are `(`, alternations `|`, wildcards `*` and `?`,
/// repetitions `+` and `{`.
pub fn rule_complexity(content: &str) -> f64 {
    let mut parens = 0usize;
    let mut alternations = 0usize;
    let mut wildcards = 0usize;
    let mut repetitions = 0usize;
    for c in content.chars() {
        match c {
            '(' => parens += 1,
            '|' => alternations += 1,
            '*' | '?' => wildcards += 1,
            '+' | '{' => repetitions += 1,
            _ => {}
        }
    }

    let score = content.chars().count() as f64 / 1000.0
        + parens as f64 * 0.1
        + alternations as f64 * 0.05
        + wildcards as f64 * 0.02
        + repetitions as f64 * 0.02;
    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_content_is_trivial() {
        assert_eq!(rule_complexity(""), 0.0);
    }

    #[test]
    fn test_weights_per_construct() {
        // 10 chars: "(a|b)*+{}?" -> 1 paren, 1 alternation, 2 wildcards, 2 repetitions
        let score = rule_complexity("(a|b)*+{}?");
        assert!(approx(score, 0.010 + 0.1 + 0.05 + 0.04 + 0.04));
    }

    #[test]
    fn test_length_contribution() {
        let content = "a".repeat(500);
        assert!(approx(rule_complexity(&content), 0.5));
    }

    #[test]
    fn test_capped_at_one() {
        let content = "(".repeat(50);
        assert_eq!(rule_complexity(&content), 1.0);
    }
}
