//! Canonical profile attributes produced by the normalizer.

use serde::Serialize;

/// One user's attributes after reconciling the LinkedIn data shapes.
///
/// Every field is optional: `None` means "not known from this login".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedProfile {
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
    pub profile_picture: Option<String>,
    pub location: Option<String>,
    pub experience: Option<Vec<serde_json::Value>>,
    pub education: Option<Vec<serde_json::Value>>,
}

impl NormalizedProfile {
    /// Fill the gaps in `self` from `fallback`. Values already present win.
    pub fn or(self, fallback: NormalizedProfile) -> NormalizedProfile {
        NormalizedProfile {
            external_id: self.external_id.or(fallback.external_id),
            full_name: self.full_name.or(fallback.full_name),
            email: self.email.or(fallback.email),
            headline: self.headline.or(fallback.headline),
            profile_url: self.profile_url.or(fallback.profile_url),
            profile_picture: self.profile_picture.or(fallback.profile_picture),
            location: self.location.or(fallback.location),
            experience: self.experience.or(fallback.experience),
            education: self.education.or(fallback.education),
        }
    }
}
