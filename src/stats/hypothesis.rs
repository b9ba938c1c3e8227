use serde::Serialize;

use super::distribution::{chi_square_sf, normal_two_sided};
use crate::models::{Dataset, Difference, Outcome};

/// Cross-tabulation of which corner holds the larger value against which
/// corner won. Built from records already passed through
/// `exclude_for(_, gate)`: no draws, no zero or missing differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvantageTable {
    pub gate: Difference,
    pub a_larger_a_wins: u64,
    pub a_larger_b_wins: u64,
    pub b_larger_a_wins: u64,
    pub b_larger_b_wins: u64,
}

impl AdvantageTable {
    pub fn count(dataset: &Dataset, gate: Difference) -> Self {
        let mut table = AdvantageTable {
            gate,
            a_larger_a_wins: 0,
            a_larger_b_wins: 0,
            b_larger_a_wins: 0,
            b_larger_b_wins: 0,
        };

        for record in dataset {
            let Some(diff) = record.diffs.get(gate) else {
                continue;
            };
            let cell = match (diff > 0.0, diff < 0.0, record.result) {
                (true, _, Outcome::WinA) => &mut table.a_larger_a_wins,
                (true, _, Outcome::WinB) => &mut table.a_larger_b_wins,
                (_, true, Outcome::WinA) => &mut table.b_larger_a_wins,
                (_, true, Outcome::WinB) => &mut table.b_larger_b_wins,
                // zero differences and draws carry no signal
                _ => continue,
            };
            *cell += 1;
        }

        table
    }

    pub fn total(&self) -> u64 {
        self.a_larger_a_wins + self.a_larger_b_wins + self.b_larger_a_wins + self.b_larger_b_wins
    }

    /// Bouts won by the corner with the larger value.
    pub fn larger_side_wins(&self) -> u64 {
        self.a_larger_a_wins + self.b_larger_b_wins
    }

    fn cells(&self) -> [[f64; 2]; 2] {
        [
            [self.a_larger_a_wins as f64, self.a_larger_b_wins as f64],
            [self.b_larger_a_wins as f64, self.b_larger_b_wins as f64],
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvantageTest {
    pub table: AdvantageTable,
    /// Share of bouts won by the corner with the larger value.
    pub larger_side_win_rate: f64,
    /// Normal-approximation test of `larger_side_win_rate` against 0.5.
    pub z: f64,
    pub z_p_value: f64,
    /// Pearson chi-square test of independence with Yates' correction.
    pub chi_square: f64,
    pub chi_square_p_value: f64,
}

/// Does the corner with the larger `gate` value win more often than chance,
/// and is winning independent of which corner holds the advantage?
///
/// Returns `None` for an empty table.
pub fn advantage_test(table: AdvantageTable) -> Option<AdvantageTest> {
    let n = table.total() as f64;
    if n == 0.0 {
        return None;
    }

    let wins = table.larger_side_wins() as f64;
    let rate = wins / n;
    let z = (wins - n / 2.0) / (n / 4.0).sqrt();

    let chi_square = yates_chi_square(table.cells());

    Some(AdvantageTest {
        table,
        larger_side_win_rate: rate,
        z,
        z_p_value: normal_two_sided(z),
        chi_square,
        chi_square_p_value: chi_square_sf(chi_square, 1.0),
    })
}

/// Continuity-corrected chi-square statistic of a 2x2 table. Rows or
/// columns summing to zero give a statistic of 0.
pub fn yates_chi_square(cells: [[f64; 2]; 2]) -> f64 {
    let row = [cells[0][0] + cells[0][1], cells[1][0] + cells[1][1]];
    let col = [cells[0][0] + cells[1][0], cells[0][1] + cells[1][1]];
    let n = row[0] + row[1];

    let mut stat = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let expected = row[i] * col[j] / n;
            if expected == 0.0 {
                return 0.0;
            }
            let deviation = ((cells[i][j] - expected).abs() - 0.5).max(0.0);
            stat += deviation * deviation / expected;
        }
    }
    stat
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{derive_differences, exclude_for};
    use crate::models::{Corner, Record};

    fn bout(age_a: f64, age_b: f64, result: Outcome) -> Record {
        Record::new(
            Corner {
                age: Some(age_a),
                ..Corner::default()
            },
            Corner {
                age: Some(age_b),
                ..Corner::default()
            },
            result,
        )
    }

    #[test]
    fn test_table_cells() {
        let ds = derive_differences(&Dataset::new(vec![
            bout(30.0, 25.0, Outcome::WinA),
            bout(30.0, 25.0, Outcome::WinB),
            bout(30.0, 25.0, Outcome::WinB),
            bout(22.0, 25.0, Outcome::WinA),
            bout(25.0, 25.0, Outcome::WinA),
            bout(22.0, 29.0, Outcome::Draw),
        ]));
        let table = AdvantageTable::count(&exclude_for(&ds, Difference::Age), Difference::Age);

        assert_eq!(table.a_larger_a_wins, 1);
        assert_eq!(table.a_larger_b_wins, 2);
        assert_eq!(table.b_larger_a_wins, 1);
        assert_eq!(table.b_larger_b_wins, 0);
        assert_eq!(table.total(), 4);
        assert_eq!(table.larger_side_wins(), 1);
    }

    #[test]
    fn test_yates_reference_value() {
        // expected counts 9.788, 9.212, 7.212, 6.788; |O - E| = 2.212 everywhere
        let stat = yates_chi_square([[12.0, 7.0], [5.0, 9.0]]);
        assert!((stat - 1.456_0).abs() < 1e-3, "stat = {stat}");
    }

    #[test]
    fn test_degenerate_table_is_zero() {
        assert_eq!(yates_chi_square([[10.0, 0.0], [5.0, 0.0]]), 0.0);
    }

    #[test]
    fn test_advantage_test_balanced_table() {
        let table = AdvantageTable {
            gate: Difference::Height,
            a_larger_a_wins: 50,
            a_larger_b_wins: 50,
            b_larger_a_wins: 50,
            b_larger_b_wins: 50,
        };
        let test = advantage_test(table).unwrap();
        assert_eq!(test.larger_side_win_rate, 0.5);
        assert_eq!(test.z, 0.0);
        assert!((test.z_p_value - 1.0).abs() < 1e-12);
        assert_eq!(test.chi_square, 0.0);
    }

    #[test]
    fn test_empty_table_has_no_test() {
        let table = AdvantageTable::count(&Dataset::default(), Difference::Reach);
        assert!(advantage_test(table).is_none());
    }
}
