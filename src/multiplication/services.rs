use crate::multiplication::dto::Operands;

/// One row of a times table: first operand, second operand, product.
pub type TimesTableEntry = (i64, i64, i64);

/// Every product of `first.min..=first.max` by `second.min..=second.max`,
/// first operand outermost. An empty range yields an empty grid.
pub fn generate_times_table_grid(operands: &Operands) -> Vec<TimesTableEntry> {
    (operands.first.min..=operands.first.max)
        .flat_map(|a| (operands.second.min..=operands.second.max).map(move |b| (a, b, a * b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplication::dto::Operand;

    fn operands(first: (i64, i64), second: (i64, i64)) -> Operands {
        Operands {
            first: Operand { min: first.0, max: first.1 },
            second: Operand { min: second.0, max: second.1 },
        }
    }

    #[test]
    fn default_quiz_grid_has_132_entries() {
        let grid = generate_times_table_grid(&Operands::default());
        // 11 first operands by 12 second operands.
        assert_eq!(grid.len(), 132);
        assert_eq!(grid.first(), Some(&(2, 1, 2)));
        assert_eq!(grid.last(), Some(&(12, 12, 144)));
        assert!(grid.iter().all(|&(a, b, p)| a * b == p));
    }

    #[test]
    fn second_operand_varies_fastest() {
        let grid = generate_times_table_grid(&operands((3, 4), (5, 6)));
        assert_eq!(grid, vec![(3, 5, 15), (3, 6, 18), (4, 5, 20), (4, 6, 24)]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(generate_times_table_grid(&operands((5, 4), (1, 12))).is_empty());
        assert!(generate_times_table_grid(&operands((1, 12), (9, 1))).is_empty());
    }
}
