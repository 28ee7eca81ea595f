//! Image Record Module
//!
//! Defines the record of one uploaded image and its classification outcome.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Verdict ==
/// Binary classification outcome for an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Genuine photograph
    Real,
    /// AI-generated image
    AiGenerated,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Real => write!(f, "Real Image"),
            Verdict::AiGenerated => write!(f, "AI Generated"),
        }
    }
}

// == Analysis ==
/// Result of classifying one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub verdict: Verdict,
    /// Model confidence in the verdict, in [0.5, 1.0]
    pub confidence: f64,
}

impl Analysis {
    /// Builds an analysis from the scorer's genuine-photograph probability.
    ///
    /// A probability of 0.5 or higher reads as a real image; confidence is
    /// the distance-adjusted probability of whichever verdict won.
    pub fn from_score(probability: f64) -> Self {
        let p = probability.clamp(0.0, 1.0);
        if p >= 0.5 {
            Self {
                verdict: Verdict::Real,
                confidence: p,
            }
        } else {
            Self {
                verdict: Verdict::AiGenerated,
                confidence: 1.0 - p,
            }
        }
    }
}

// == Scorer ==
/// Contract of the classification model.
///
/// Implementations score a stored image file and return the probability that
/// it is a genuine photograph, in [0, 1]. The model itself is an external
/// collaborator; the maintenance core only depends on this seam.
pub trait Scorer: Send + Sync {
    fn score(&self, path: &Path) -> Result<f64>;
}

// == Image Record ==
/// One uploaded image: its stored file, upload time, and optional analysis.
///
/// A record with no analysis is "unanalyzed"; the unanalyzed cleanup pass
/// retires such records on a shorter retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Store-assigned identifier (0 until inserted)
    pub id: u64,
    /// Path of the stored image file
    pub file_path: PathBuf,
    /// Name the file was uploaded under
    pub original_filename: String,
    /// Stored file size in bytes
    pub file_size: u64,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Classification outcome, if the image has been analyzed
    pub analysis: Option<Analysis>,
}

impl ImageRecord {
    /// Creates a new, unanalyzed record uploaded now.
    pub fn new(
        file_path: impl Into<PathBuf>,
        original_filename: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            id: 0,
            file_path: file_path.into(),
            original_filename: original_filename.into(),
            file_size,
            uploaded_at: Utc::now(),
            analysis: None,
        }
    }

    /// Whether this record carries a classification result.
    pub fn is_analyzed(&self) -> bool {
        self.analysis.is_some()
    }
}

impl fmt::Display for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.analysis {
            Some(analysis) => write!(f, "{} - {}", self.original_filename, analysis.verdict),
            None => write!(f, "{} - Not analyzed", self.original_filename),
        }
    }
}
