//! Similarity scoring of a sample against stored blend profiles.
//!
//! Each profile is scored by cosine similarity to its mean vector and by a
//! tolerance score derived from the per-channel standard deviation. The two
//! are weighted 60/40 into a combined score that selects a recommendation
//! tier. Reported scores are rounded to one decimal (distance to two); the
//! tier is chosen from the unrounded combined score.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{BlendSignature, ProfileCandidate, SensorReadings, SENSOR_CHANNEL_COUNT};
use crate::sqlite_persistence::JsonField;

const MATCH_WEIGHT: f64 = 0.6;
const TOLERANCE_WEIGHT: f64 = 0.4;
const TOLERANCE_PENALTY_PER_STD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Excellent,
    VeryGood,
    Good,
    Moderate,
    Weak,
    NoMatch,
}

/// Language of recommendation labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLocale {
    #[default]
    En,
    Ar,
}

impl Recommendation {
    pub fn from_score(combined_score: f64) -> Self {
        if combined_score >= 90.0 {
            Recommendation::Excellent
        } else if combined_score >= 80.0 {
            Recommendation::VeryGood
        } else if combined_score >= 70.0 {
            Recommendation::Good
        } else if combined_score >= 60.0 {
            Recommendation::Moderate
        } else if combined_score >= 40.0 {
            Recommendation::Weak
        } else {
            Recommendation::NoMatch
        }
    }

    pub fn label(&self, locale: RecommendationLocale) -> &'static str {
        match locale {
            RecommendationLocale::En => match self {
                Recommendation::Excellent => "Excellent match - practically the same blend",
                Recommendation::VeryGood => "Very good match - close to the reference blend",
                Recommendation::Good => "Good match - needs a slight adjustment",
                Recommendation::Moderate => "Moderate match - needs adjustment",
                Recommendation::Weak => "Weak match - needs a major adjustment",
                Recommendation::NoMatch => "No match - completely different from the blend",
            },
            RecommendationLocale::Ar => match self {
                Recommendation::Excellent => "تطابق ممتاز - نفس التوليفة تقريباً",
                Recommendation::VeryGood => "تطابق جيد جداً - قريب من التوليفة المرجعية",
                Recommendation::Good => "تطابق جيد - يحتاج تعديل طفيف",
                Recommendation::Moderate => "تطابق متوسط - يحتاج تعديل",
                Recommendation::Weak => "تطابق ضعيف - يحتاج تعديل كبير",
                Recommendation::NoMatch => "لا يوجد تطابق - مختلف تماماً عن التوليفة",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub profile_id: i64,
    pub profile_name: String,
    pub description: String,
    pub match_percentage: f64,
    pub tolerance_score: f64,
    pub combined_score: f64,
    pub distance: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchReport {
    pub matches: Vec<MatchResult>,
    /// Candidates left out because their signature was missing or malformed.
    pub skipped: usize,
}

impl MatchReport {
    pub fn best_match(&self) -> Option<&MatchResult> {
        self.matches.first()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn norm(v: &[f64; SENSOR_CHANNEL_COUNT]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// `v` divided by its largest absolute channel. `None` for a zero or
/// non-finite vector.
fn unit_scaled(v: &[f64; SENSOR_CHANNEL_COUNT]) -> Option<[f64; SENSOR_CHANNEL_COUNT]> {
    let scale = v.iter().fold(0.0, |max: f64, x| max.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    Some(v.map(|x| x / scale))
}

/// Cosine similarity in [-1, 1]; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f64; SENSOR_CHANNEL_COUNT], b: &[f64; SENSOR_CHANNEL_COUNT]) -> f64 {
    let (Some(a), Some(b)) = (unit_scaled(a), unit_scaled(b)) else {
        return 0.0;
    };
    let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    (dot / (norm(&a) * norm(&b))).clamp(-1.0, 1.0)
}

/// Scaled by the largest channel difference before squaring, so readings
/// past `f64::MAX.sqrt()` stay finite. Saturates to infinity only when a
/// single channel difference overflows.
pub fn euclidean_distance(a: &[f64; SENSOR_CHANNEL_COUNT], b: &[f64; SENSOR_CHANNEL_COUNT]) -> f64 {
    let scale = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| ((x - y) / scale).powi(2))
        .sum();
    scale * sum.sqrt()
}

/// Lowest per-channel tolerance, starting from 100. Channels with zero std
/// cannot lower it.
pub fn tolerance_score(query: &[f64; SENSOR_CHANNEL_COUNT], signature: &BlendSignature) -> f64 {
    let means = signature.means();
    let stds = signature.stds();
    let mut score: f64 = 100.0;
    for channel in 0..SENSOR_CHANNEL_COUNT {
        if stds[channel] > 0.0 {
            let deviation = (query[channel] - means[channel]).abs() / stds[channel];
            let candidate = (100.0 - deviation * TOLERANCE_PENALTY_PER_STD).clamp(0.0, 100.0);
            score = score.min(candidate);
        }
    }
    score
}

pub fn score_profile(query: &SensorReadings, candidate: &ProfileCandidate, signature: &BlendSignature) -> MatchResult {
    let query = query.as_array();
    let means = signature.means();

    let match_percentage = (cosine_similarity(&query, &means) * 100.0).clamp(0.0, 100.0);
    let tolerance = tolerance_score(&query, signature);
    let combined = match_percentage * MATCH_WEIGHT + tolerance * TOLERANCE_WEIGHT;

    MatchResult {
        profile_id: candidate.profile_id,
        profile_name: candidate.profile_name.clone(),
        description: candidate.description.clone(),
        match_percentage: round_to(match_percentage, 1),
        tolerance_score: round_to(tolerance, 1),
        combined_score: round_to(combined, 1),
        distance: round_to(euclidean_distance(&query, &means), 2),
        recommendation: Recommendation::from_score(combined),
    }
}

/// Scores every candidate with a usable signature and ranks them by combined
/// score, highest first. Ties keep candidate order.
pub fn match_profiles(query: &SensorReadings, candidates: &[ProfileCandidate]) -> MatchReport {
    let mut report = MatchReport::default();
    for candidate in candidates {
        match &candidate.signature {
            JsonField::Decoded(signature) => {
                report
                    .matches
                    .push(score_profile(query, candidate, signature));
            }
            JsonField::Missing => {
                warn!(
                    "Skipping blend profile {} without signature",
                    candidate.profile_id
                );
                report.skipped += 1;
            }
            JsonField::Malformed(err) => {
                warn!(
                    "Skipping blend profile {} with malformed signature: {}",
                    candidate.profile_id, err
                );
                report.skipped += 1;
            }
        }
    }

    report
        .matches
        .sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    report
}
