use std::io::Write;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::NamedTempFile;

use bout_analysis::config::AppConfig;

pub const HEADER: &str = "age_A,age_B,height_A,height_B,reach_A,reach_B,stance_A,stance_B,\
weight_A,weight_B,won_A,won_B,lost_A,lost_B,drawn_A,drawn_B,kos_A,kos_B,result,decision,\
judge1_A,judge1_B";

/// One CSV row. Numeric fields use `None` for an empty cell.
#[derive(Debug, Clone)]
pub struct BoutRow {
    pub age: [Option<f64>; 2],
    pub height: [Option<f64>; 2],
    pub reach: [Option<f64>; 2],
    pub weight: [Option<f64>; 2],
    pub won: [f64; 2],
    pub lost: [f64; 2],
    pub drawn: [f64; 2],
    pub kos: [f64; 2],
    pub result: &'static str,
}

impl BoutRow {
    pub fn to_csv_line(&self) -> String {
        let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        format!(
            "{},{},{},{},{},{},Orthodox,Southpaw,{},{},{},{},{},{},{},{},{},{},{},UD,,",
            cell(self.age[0]),
            cell(self.age[1]),
            cell(self.height[0]),
            cell(self.height[1]),
            cell(self.reach[0]),
            cell(self.reach[1]),
            cell(self.weight[0]),
            cell(self.weight[1]),
            self.won[0],
            self.won[1],
            self.lost[0],
            self.lost[1],
            self.drawn[0],
            self.drawn[1],
            self.kos[0],
            self.kos[1],
            self.result,
        )
    }
}

/// Plausible bouts where the corner with the longer reach and the better
/// record usually wins; roughly one bout in twenty is a draw.
#[allow(dead_code)]
pub fn synthetic_bouts(n: usize, seed: u64) -> Vec<BoutRow> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let mut corner = || {
                let height: f64 = rng.gen_range(160.0..200.0_f64).round();
                let reach = (height + rng.gen_range(-5.0..10.0_f64)).round();
                let won = rng.gen_range(0..40) as f64;
                (
                    rng.gen_range(18..45) as f64,
                    height,
                    reach,
                    rng.gen_range(120..200) as f64,
                    won,
                    rng.gen_range(0..10) as f64,
                    rng.gen_range(0..3) as f64,
                    (won * rng.gen_range(0.2..0.8_f64)).floor(),
                )
            };
            let a = corner();
            let b = corner();

            let edge = (b.2 - a.2) / 4.0 + (b.4 - b.5 - a.4 + a.5) / 10.0;
            let noise: f64 = rng.gen_range(-3.0..3.0);
            let result = if rng.gen_bool(0.05) {
                "draw"
            } else if edge + noise > 0.0 {
                "win_B"
            } else {
                "win_A"
            };

            BoutRow {
                age: [Some(a.0), Some(b.0)],
                height: [Some(a.1), Some(b.1)],
                reach: [Some(a.2), Some(b.2)],
                weight: [Some(a.3), Some(b.3)],
                won: [a.4, b.4],
                lost: [a.5, b.5],
                drawn: [a.6, b.6],
                kos: [a.7, b.7],
                result,
            }
        })
        .collect()
}

#[allow(dead_code)]
pub fn csv_text(rows: &[BoutRow]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(&row.to_csv_line());
        text.push('\n');
    }
    text
}

/// Write `rows` to a temporary CSV that lives as long as the returned handle.
#[allow(dead_code)]
pub fn write_csv(rows: &[BoutRow]) -> NamedTempFile {
    write_text(&csv_text(rows))
}

#[allow(dead_code)]
pub fn write_text(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp CSV");
    file.write_all(text.as_bytes()).expect("Failed to write temp CSV");
    file.flush().expect("Failed to flush temp CSV");
    file
}

/// Small, fast run parameters over the CSV at `path`.
#[allow(dead_code)]
pub fn test_config(path: &Path) -> AppConfig {
    AppConfig {
        data_path: path.to_path_buf(),
        seed: 7,
        folds: 5,
        sample_per_class: 30,
        tree_counts: vec![4, 16],
        parallel: true,
        ..AppConfig::default()
    }
}
