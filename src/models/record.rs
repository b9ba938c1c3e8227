use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Bout result from side A's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "win_A")]
    WinA,
    #[serde(rename = "win_B")]
    WinB,
    #[serde(rename = "draw")]
    Draw,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::WinA, Outcome::WinB, Outcome::Draw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::WinA => "win_A",
            Outcome::WinB => "win_B",
            Outcome::Draw => "draw",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "win_A" => Some(Outcome::WinA),
            "win_B" => Some(Outcome::WinB),
            "draw" => Some(Outcome::Draw),
            _ => None,
        }
    }

    /// The label a binary classifier predicts when it rejects `self`.
    /// Only meaningful for the two decisive outcomes.
    pub fn opposite(&self) -> Self {
        match self {
            Outcome::WinA => Outcome::WinB,
            Outcome::WinB => Outcome::WinA,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Side / Attribute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Numeric per-side fields of a bout record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Age,
    Height,
    Reach,
    Weight,
    Won,
    Lost,
    Drawn,
    Kos,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Age,
        Attribute::Height,
        Attribute::Reach,
        Attribute::Weight,
        Attribute::Won,
        Attribute::Lost,
        Attribute::Drawn,
        Attribute::Kos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::Height => "height",
            Attribute::Reach => "reach",
            Attribute::Weight => "weight",
            Attribute::Won => "won",
            Attribute::Lost => "lost",
            Attribute::Drawn => "drawn",
            Attribute::Kos => "kos",
        }
    }

    /// CSV column name for this attribute on the given side, e.g. `height_A`.
    pub fn column(&self, side: Side) -> String {
        format!("{}_{}", self.as_str(), side)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Corner: one side's attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub reach: Option<f64>,
    pub weight: Option<f64>,
    pub won: Option<f64>,
    pub lost: Option<f64>,
    pub drawn: Option<f64>,
    pub kos: Option<f64>,
    pub stance: Option<String>,
}

impl Corner {
    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Age => self.age,
            Attribute::Height => self.height,
            Attribute::Reach => self.reach,
            Attribute::Weight => self.weight,
            Attribute::Won => self.won,
            Attribute::Lost => self.lost,
            Attribute::Drawn => self.drawn,
            Attribute::Kos => self.kos,
        }
    }
}

// ---------------------------------------------------------------------------
// Differentials: derived A − B fields
// ---------------------------------------------------------------------------

/// Physical attributes compared across corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difference {
    Age,
    Height,
    Reach,
}

impl Difference {
    pub const ALL: [Difference; 3] = [Difference::Age, Difference::Height, Difference::Reach];

    pub fn attribute(&self) -> Attribute {
        match self {
            Difference::Age => Attribute::Age,
            Difference::Height => Attribute::Height,
            Difference::Reach => Attribute::Reach,
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_diff", self.attribute())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Differentials {
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub reach: Option<f64>,
}

impl Differentials {
    pub fn get(&self, difference: Difference) -> Option<f64> {
        match difference {
            Difference::Age => self.age,
            Difference::Height => self.height,
            Difference::Reach => self.reach,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One labelled bout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub a: Corner,
    pub b: Corner,
    pub result: Outcome,
    pub decision: Option<String>,
    #[serde(default)]
    pub diffs: Differentials,
}

impl Record {
    pub fn new(a: Corner, b: Corner, result: Outcome) -> Self {
        Self {
            a,
            b,
            result,
            decision: None,
            diffs: Differentials::default(),
        }
    }

    pub fn corner(&self, side: Side) -> &Corner {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn value(&self, attribute: Attribute, side: Side) -> Option<f64> {
        self.corner(side).get(attribute)
    }
}
