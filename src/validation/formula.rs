//! Chemical formula grammar validation (spec §4.4): non-empty, element/multiplicity tokens
//! only, balanced parentheses. Used both by C4 (CSV-batch `chemical_formula` column, via
//! the quality/accuracy dimension) and by C10 step 6 (validating extracted chemical
//! entities before they become graph nodes).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One element-multiplicity token, optionally parenthesized with a trailing
    /// multiplier: `H2`, `Ca`, `(OH)2`, `(NO3)3`.
    static ref FORMULA_GRAMMAR: Regex =
        Regex::new(r"^(\([A-Z][a-z]?(\d*)(?:[A-Z][a-z]?\d*)*\)\d*|[A-Z][a-z]?\d*)+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    Empty,
    UnbalancedParentheses,
    InvalidGrammar,
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormulaError::Empty => write!(f, "chemical formula is empty"),
            FormulaError::UnbalancedParentheses => write!(f, "chemical formula has unbalanced parentheses"),
            FormulaError::InvalidGrammar => write!(f, "chemical formula does not match the element-multiplicity grammar"),
        }
    }
}

pub fn validate_formula(formula: &str) -> Result<(), FormulaError> {
    let formula = formula.trim();
    if formula.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut depth: i32 = 0;
    for ch in formula.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(FormulaError::UnbalancedParentheses);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(FormulaError::UnbalancedParentheses);
    }

    if !FORMULA_GRAMMAR.is_match(formula) {
        return Err(FormulaError::InvalidGrammar);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_formulas() {
        assert!(validate_formula("H2SO4").is_ok());
        assert!(validate_formula("C6H12O6").is_ok());
        assert!(validate_formula("NaCl").is_ok());
    }

    #[test]
    fn accepts_parenthesized_groups() {
        assert!(validate_formula("Ca(OH)2").is_ok());
        assert!(validate_formula("Al2(SO4)3").is_ok());
    }

    #[test]
    fn rejects_empty_formula() {
        assert_eq!(validate_formula("").unwrap_err(), FormulaError::Empty);
        assert_eq!(validate_formula("   ").unwrap_err(), FormulaError::Empty);
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert_eq!(validate_formula("Ca(OH2").unwrap_err(), FormulaError::UnbalancedParentheses);
        assert_eq!(validate_formula("CaOH)2").unwrap_err(), FormulaError::UnbalancedParentheses);
    }

    #[test]
    fn rejects_invalid_tokens() {
        assert_eq!(validate_formula("h2so4").unwrap_err(), FormulaError::InvalidGrammar);
        assert_eq!(validate_formula("H2-SO4").unwrap_err(), FormulaError::InvalidGrammar);
    }
}
