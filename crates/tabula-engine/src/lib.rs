//! tabula_engine - Arithmetic formula engine (positions, values, parsing, evaluation).

pub mod formula;

#[cfg(test)]
mod tests {
    use crate::formula::*;

    #[test]
    fn test_from_a1_single_letter_columns() {
        let a1 = Position::from_a1("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let b1 = Position::from_a1("B1").unwrap();
        assert_eq!(b1.row, 0);
        assert_eq!(b1.col, 1);

        let z1 = Position::from_a1("Z1").unwrap();
        assert_eq!(z1.row, 0);
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_from_a1_multi_letter_columns() {
        assert_eq!(Position::from_a1("AA1").unwrap().col, 26);
        assert_eq!(Position::from_a1("AB1").unwrap().col, 27);
        assert_eq!(Position::from_a1("AZ1").unwrap().col, 51);
        assert_eq!(Position::from_a1("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_a1_row_numbers() {
        assert_eq!(Position::from_a1("A1").unwrap().row, 0);
        assert_eq!(Position::from_a1("A10").unwrap().row, 9);
        assert_eq!(Position::from_a1("A100").unwrap().row, 99);
    }

    #[test]
    fn test_from_a1_case_insensitive() {
        let lower = Position::from_a1("a1").unwrap();
        assert_eq!(lower, Position::new(0, 0));

        let mixed = Position::from_a1("aA1").unwrap();
        assert_eq!(mixed.col, 26);
    }

    #[test]
    fn test_from_a1_invalid_inputs() {
        assert!(Position::from_a1("").is_none());
        assert!(Position::from_a1("123").is_none());
        assert!(Position::from_a1("ABC").is_none());
        assert!(Position::from_a1("A0").is_none());
        assert!(Position::from_a1("1A").is_none());
        assert!(Position::from_a1("A 1").is_none());
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["A1", "Z9", "AA10", "XFD16384"] {
            assert_eq!(Position::from_a1(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_formula_expression_is_canonical() {
        let formula = Formula::parse("1 + 2").unwrap();
        assert_eq!(formula.expression(), "1+2");
        assert_eq!(formula.execute(|_| Ok(0.0)), Ok(3.0));
    }

    #[test]
    fn test_formula_reports_parse_errors() {
        let err = Formula::parse("1 +* 2").unwrap_err();
        assert_eq!(err.offset, 3);
    }
}
