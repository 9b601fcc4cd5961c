pub use calculator::{ScoreCalculator, VerificationScores};
pub use quality::{QualityClassification, QualityClassifier, QualityFactors, QualityLevel};

pub mod calculator;
pub mod quality;
