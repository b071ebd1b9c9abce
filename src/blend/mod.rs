mod matcher;
mod models;
mod schema;
mod signature;
mod sqlite_blend_store;

pub use matcher::{
    cosine_similarity, euclidean_distance, match_profiles, score_profile, tolerance_score,
    MatchReport, MatchResult, Recommendation, RecommendationLocale,
};
pub use models::*;
pub use schema::BLEND_VERSIONED_SCHEMAS;
pub use signature::build_signature;
pub use sqlite_blend_store::SqliteBlendStore;

use anyhow::Result;

/// Storage of blend profiles, scoped by device.
pub trait BlendStore: Send + Sync {
    /// Stores a profile with its first sample batch and their signature.
    /// Fails when `samples` is empty.
    fn create_profile(
        &self,
        device_id: &str,
        profile_name: &str,
        description: &str,
        samples: &[NewBlendSample],
    ) -> Result<CreatedProfile>;

    /// Adds a sample and recomputes the signature over all samples of the
    /// profile. Returns `None` when the device has no such profile.
    fn add_sample(
        &self,
        device_id: &str,
        profile_id: i64,
        sample: &NewBlendSample,
    ) -> Result<Option<AddedSample>>;

    fn get_profile(&self, device_id: &str, profile_id: i64) -> Result<Option<BlendProfile>>;
    /// Profiles of a device with their samples, oldest first.
    fn list_profiles(&self, device_id: &str) -> Result<Vec<BlendProfile>>;
    /// Profiles of a device in matcher form, without samples.
    fn list_candidates(&self, device_id: &str) -> Result<Vec<ProfileCandidate>>;
    /// Deletes a profile and, by cascade, its samples.
    fn delete_profile(&self, device_id: &str, profile_id: i64) -> Result<bool>;
}
