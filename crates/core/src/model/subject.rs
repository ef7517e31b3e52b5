use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubjectError {
    #[error("unknown subject: {0}")]
    Unknown(String),
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// The fixed set of 17 curriculum subjects sessions are logged against.
///
/// The set is closed: every subject contributes to the overall prep score
/// denominator whether or not the user has logged sessions in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Medicine,
    Anatomy,
    Physiology,
    Pathology,
    Pharmacology,
    Biochemistry,
    Microbiology,
    Surgery,
    Immunology,
    PublicHealth,
    Genetics,
    Histology,
    Epidemiology,
    Embryology,
    Psychiatry,
    Biostatistics,
    MedicalEthics,
}

impl Subject {
    /// All 17 subjects, in curriculum-weight order.
    pub const ALL: [Subject; 17] = [
        Subject::Medicine,
        Subject::Anatomy,
        Subject::Physiology,
        Subject::Pathology,
        Subject::Pharmacology,
        Subject::Biochemistry,
        Subject::Microbiology,
        Subject::Surgery,
        Subject::Immunology,
        Subject::PublicHealth,
        Subject::Genetics,
        Subject::Histology,
        Subject::Epidemiology,
        Subject::Embryology,
        Subject::Psychiatry,
        Subject::Biostatistics,
        Subject::MedicalEthics,
    ];

    /// Stable storage encoding for this subject.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Medicine => "medicine",
            Subject::Anatomy => "anatomy",
            Subject::Physiology => "physiology",
            Subject::Pathology => "pathology",
            Subject::Pharmacology => "pharmacology",
            Subject::Biochemistry => "biochemistry",
            Subject::Microbiology => "microbiology",
            Subject::Surgery => "surgery",
            Subject::Immunology => "immunology",
            Subject::PublicHealth => "public_health",
            Subject::Genetics => "genetics",
            Subject::Histology => "histology",
            Subject::Epidemiology => "epidemiology",
            Subject::Embryology => "embryology",
            Subject::Psychiatry => "psychiatry",
            Subject::Biostatistics => "biostatistics",
            Subject::MedicalEthics => "medical_ethics",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = SubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .iter()
            .copied()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| SubjectError::Unknown(s.to_string()))
    }
}

//
// ─── SUBJECT WEIGHTS ───────────────────────────────────────────────────────────
//

/// Curriculum-importance weights used to blend subject scores into the
/// overall prep score.
///
/// Constructed once at startup and injected into the score engine rather
/// than read as an ambient global, so tests can substitute alternate
/// tables. The total is cached at construction; for the default table it
/// is 88 and structurally non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectWeights {
    weights: [u32; 17],
    total: u32,
}

impl SubjectWeights {
    /// Build a weight table from per-subject entries.
    ///
    /// `entries` may list subjects in any order; subjects not listed get
    /// weight 0 and contribute nothing to the denominator.
    #[must_use]
    pub fn from_entries(entries: &[(Subject, u32)]) -> Self {
        let mut weights = [0_u32; 17];
        for (subject, weight) in entries {
            weights[Self::index(*subject)] = *weight;
        }
        let total = weights.iter().sum();
        Self { weights, total }
    }

    /// Weight for a single subject.
    #[must_use]
    pub fn weight(&self, subject: Subject) -> u32 {
        self.weights[Self::index(subject)]
    }

    /// Sum of all weights; the normalization denominator.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    fn index(subject: Subject) -> usize {
        Subject::ALL
            .iter()
            .position(|s| *s == subject)
            .expect("Subject::ALL covers every variant")
    }
}

impl Default for SubjectWeights {
    /// The canonical curriculum table. Weights range 2..=15 and sum to 88.
    fn default() -> Self {
        Self::from_entries(&[
            (Subject::Medicine, 15),
            (Subject::Anatomy, 8),
            (Subject::Physiology, 8),
            (Subject::Pathology, 8),
            (Subject::Pharmacology, 7),
            (Subject::Biochemistry, 6),
            (Subject::Microbiology, 6),
            (Subject::Surgery, 5),
            (Subject::Immunology, 4),
            (Subject::PublicHealth, 4),
            (Subject::Genetics, 3),
            (Subject::Histology, 3),
            (Subject::Epidemiology, 3),
            (Subject::Embryology, 2),
            (Subject::Psychiatry, 2),
            (Subject::Biostatistics, 2),
            (Subject::MedicalEthics, 2),
        ])
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
