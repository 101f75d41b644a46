// src/quiz/evaluator.rs

use crate::models::answer::AnswerValue;

/// Checks a selection against the reference answer.
///
/// * Single reference: exact, case-sensitive match.
/// * Set reference: the selection must be the same set. Order never matters
///   because both sides are ordered sets.
/// * Shape mismatch: only the degenerate one-element set can match a single
///   value.
pub fn evaluate(selected: &AnswerValue, reference: &AnswerValue) -> bool {
    match (selected, reference) {
        (AnswerValue::Single(s), AnswerValue::Single(r)) => s == r,
        (AnswerValue::Multiple(s), AnswerValue::Multiple(r)) => s == r,
        (AnswerValue::Single(s), AnswerValue::Multiple(r))
        | (AnswerValue::Multiple(r), AnswerValue::Single(s)) => {
            r.len() == 1 && r.contains(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_reference_is_exact_match() {
        let reference = AnswerValue::single("Paris");
        assert!(evaluate(&AnswerValue::single("Paris"), &reference));
        assert!(!evaluate(&AnswerValue::single("paris"), &reference));
        assert!(!evaluate(&AnswerValue::single("Paris "), &reference));
        assert!(!evaluate(&AnswerValue::single(""), &reference));
    }

    #[test]
    fn set_reference_ignores_order() {
        let options = ["A", "B", "C", "D"];
        let reference = AnswerValue::multiple(["B", "C"]);
        let permutations = [["B", "C"], ["C", "B"]];
        for p in permutations {
            assert!(evaluate(&AnswerValue::multiple(p), &reference));
            assert!(evaluate(&reference, &AnswerValue::multiple(p)));
        }
        for extra in options {
            if extra == "B" || extra == "C" {
                continue;
            }
            assert!(!evaluate(&AnswerValue::multiple(["C", "B", extra]), &reference));
        }
    }

    #[test]
    fn set_reference_needs_every_element() {
        let reference = AnswerValue::multiple(["B", "C"]);
        assert!(!evaluate(&AnswerValue::multiple(["B"]), &reference));
        assert!(!evaluate(&AnswerValue::multiple(Vec::<String>::new()), &reference));
        assert!(!evaluate(&AnswerValue::single("B"), &reference));
    }

    #[test]
    fn single_value_matches_one_element_set() {
        assert!(evaluate(&AnswerValue::single("A"), &AnswerValue::multiple(["A"])));
        assert!(evaluate(&AnswerValue::multiple(["A"]), &AnswerValue::single("A")));
        assert!(!evaluate(&AnswerValue::multiple(["A", "B"]), &AnswerValue::single("A")));
    }
}
