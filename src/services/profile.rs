// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile normalization.
//!
//! LinkedIn hands us user data in two shapes:
//! - the legacy REST shape (`/v2/me` plus `/v2/emailAddress`), available when
//!   the token carries the legacy profile scopes
//! - the OpenID Connect identity token, decoded without signature checks
//!
//! Each shape has one pure mapping onto [`NormalizedProfile`]; sources are
//! merged in order so earlier sources take precedence.

use crate::models::NormalizedProfile;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const PROFILE_URL_PREFIX: &str = "https://www.linkedin.com/in/";

/// `GET /v2/me` response.
///
/// Every field is parsed on its own: a field with an unexpected shape reads
/// as absent instead of rejecting the whole profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrimaryProfile {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub localized_first_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub localized_last_name: Option<String>,
    /// Plain string, or a localized object `{localized, preferredLocale}`
    #[serde(deserialize_with = "lenient")]
    pub headline: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub localized_headline: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub vanity_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub profile_picture: Option<ProfilePicture>,
    #[serde(deserialize_with = "lenient")]
    pub location_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub positions: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient")]
    pub educations: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePicture {
    #[serde(rename = "displayImage~")]
    pub display_image: Option<DisplayImage>,
}

/// Image variants, sorted smallest to largest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayImage {
    #[serde(default)]
    pub elements: Vec<ImageVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageVariant {
    #[serde(default)]
    pub identifiers: Vec<ImageIdentifier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageIdentifier {
    #[serde(default, deserialize_with = "lenient")]
    pub identifier: Option<String>,
}

/// `GET /v2/emailAddress?q=members&projection=(elements*(handle~))` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailAddressResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub elements: Vec<EmailElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailElement {
    #[serde(rename = "handle~", default, deserialize_with = "lenient")]
    pub handle: Option<EmailHandle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailHandle {
    #[serde(rename = "emailAddress", default, deserialize_with = "lenient")]
    pub email_address: Option<String>,
}

impl EmailAddressResponse {
    pub fn primary_email(&self) -> Option<String> {
        self.elements
            .first()
            .and_then(|e| e.handle.as_ref())
            .and_then(|h| non_empty(h.email_address.as_deref()))
    }
}

/// Claims of interest in a LinkedIn identity token. OIDC and legacy claim
/// names are both accepted; a claim of the wrong type reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdTokenClaims {
    #[serde(deserialize_with = "lenient")]
    pub sub: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub given_name: Option<String>,
    #[serde(rename = "givenName", deserialize_with = "lenient")]
    pub given_name_legacy: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub family_name: Option<String>,
    #[serde(rename = "familyName", deserialize_with = "lenient")]
    pub family_name_legacy: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email_address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub preferred_username: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub picture: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub picture_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub headline: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub profile: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub positions: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient")]
    pub education: Option<Vec<Value>>,
}

/// Deserialize a field, mapping a value of the wrong shape to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`] for lists: unreadable input becomes an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Text of a plain string or a LinkedIn localized field.
///
/// For `{"localized": {"en_US": ..}, "preferredLocale": {"language": "en",
/// "country": "US"}}` the preferred locale wins, then any localization.
fn localized_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s.as_str())),
        Value::Object(map) => {
            let localized = map.get("localized")?.as_object()?;
            let preferred = map.get("preferredLocale").and_then(|locale| {
                let language = locale.get("language")?.as_str()?;
                let country = locale.get("country")?.as_str()?;
                localized.get(&format!("{language}_{country}"))
            });
            preferred
                .into_iter()
                .chain(localized.values())
                .find_map(|v| non_empty(v.as_str()))
        }
        _ => None,
    }
}

/// Where a set of profile attributes came from.
#[derive(Debug, Clone)]
pub enum ProfileSource {
    /// Legacy REST profile and the separately fetched email address.
    Primary {
        profile: PrimaryProfile,
        email: Option<String>,
    },
    /// Claims decoded from the OIDC identity token.
    IdentityToken(IdTokenClaims),
}

impl ProfileSource {
    pub fn normalize(&self) -> NormalizedProfile {
        match self {
            ProfileSource::Primary { profile, email } => from_primary(profile, email.as_deref()),
            ProfileSource::IdentityToken(claims) => from_id_token(claims),
        }
    }
}

/// Merge sources in priority order into one profile.
pub fn normalize(sources: &[ProfileSource]) -> NormalizedProfile {
    sources
        .iter()
        .map(ProfileSource::normalize)
        .fold(NormalizedProfile::default(), NormalizedProfile::or)
}

fn from_primary(profile: &PrimaryProfile, email: Option<&str>) -> NormalizedProfile {
    let first = profile.localized_first_name.as_deref().unwrap_or_default();
    let last = profile.localized_last_name.as_deref().unwrap_or_default();

    NormalizedProfile {
        external_id: non_empty(profile.id.as_deref()),
        full_name: join_name(first, last),
        email: non_empty(email),
        headline: localized_text(profile.headline.as_ref())
            .or_else(|| non_empty(profile.localized_headline.as_deref())),
        profile_url: non_empty(profile.vanity_name.as_deref())
            .map(|vanity| format!("{PROFILE_URL_PREFIX}{vanity}")),
        profile_picture: largest_picture(profile),
        location: non_empty(profile.location_name.as_deref()),
        experience: profile.positions.clone(),
        education: profile.educations.clone(),
    }
}

/// Identifier of the last (largest) display image variant.
fn largest_picture(profile: &PrimaryProfile) -> Option<String> {
    profile
        .profile_picture
        .as_ref()?
        .display_image
        .as_ref()?
        .elements
        .last()?
        .identifiers
        .first()
        .and_then(|id| non_empty(id.identifier.as_deref()))
}

fn from_id_token(claims: &IdTokenClaims) -> NormalizedProfile {
    let given = non_empty(claims.given_name.as_deref())
        .or_else(|| non_empty(claims.given_name_legacy.as_deref()));
    let family = non_empty(claims.family_name.as_deref())
        .or_else(|| non_empty(claims.family_name_legacy.as_deref()));

    // Split a display name only for the parts the token did not give us.
    let name = non_empty(claims.name.as_deref()).unwrap_or_else(|| {
        join_name(
            given.as_deref().unwrap_or_default(),
            family.as_deref().unwrap_or_default(),
        )
        .unwrap_or_default()
    });
    let words: Vec<&str> = name.split(' ').collect();
    let first = given.unwrap_or_else(|| words[0].to_string());
    let last = family.unwrap_or_else(|| words[1..].join(" "));

    NormalizedProfile {
        external_id: non_empty(claims.sub.as_deref())
            .or_else(|| non_empty(claims.user_id.as_deref())),
        full_name: join_name(&first, &last),
        email: non_empty(claims.email.as_deref())
            .or_else(|| non_empty(claims.email_address.as_deref()))
            .or_else(|| non_empty(claims.preferred_username.as_deref())),
        headline: localized_text(claims.headline.as_ref()),
        profile_url: non_empty(claims.profile.as_deref()),
        profile_picture: non_empty(claims.picture.as_deref())
            .or_else(|| non_empty(claims.picture_url.as_deref()))
            .or_else(|| non_empty(claims.image.as_deref())),
        location: non_empty(claims.location.as_deref()),
        experience: claims.positions.clone(),
        education: claims.education.clone(),
    }
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// Only used to enrich a login whose authenticity was already established by
/// the server-to-server token exchange.
pub fn decode_id_token(token: &str) -> Option<IdTokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn join_name(first: &str, last: &str) -> Option<String> {
    non_empty(Some(format!("{first} {last}").trim()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id_token(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn primary(value: Value) -> PrimaryProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_primary_profile() {
        let profile = primary(json!({
            "id": "abc123",
            "localizedFirstName": "Ada",
            "localizedLastName": "Lovelace",
            "vanityName": "ada",
            "headline": "Analyst",
        }));
        let source = ProfileSource::Primary {
            profile,
            email: Some("ada@example.com".to_string()),
        };

        let normalized = normalize(&[source]);

        assert_eq!(normalized.external_id.as_deref(), Some("abc123"));
        assert_eq!(normalized.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            normalized.profile_url.as_deref(),
            Some("https://www.linkedin.com/in/ada")
        );
        assert_eq!(normalized.email.as_deref(), Some("ada@example.com"));
        assert_eq!(normalized.headline.as_deref(), Some("Analyst"));
    }

    #[test]
    fn test_primary_picture_uses_largest_variant() {
        let profile = primary(json!({
            "id": "abc123",
            "profilePicture": {
                "displayImage~": {
                    "elements": [
                        { "identifiers": [{ "identifier": "https://media/100.jpg" }] },
                        { "identifiers": [{ "identifier": "https://media/200.jpg" }] },
                        { "identifiers": [{ "identifier": "https://media/800.jpg" }] }
                    ]
                }
            }
        }));

        let normalized = ProfileSource::Primary {
            profile,
            email: None,
        }
        .normalize();

        assert_eq!(
            normalized.profile_picture.as_deref(),
            Some("https://media/800.jpg")
        );
    }

    #[test]
    fn test_email_response_first_element() {
        let response: EmailAddressResponse = serde_json::from_value(json!({
            "elements": [
                { "handle~": { "emailAddress": "ada@example.com" }, "handle": "urn:li:emailAddress:1" }
            ]
        }))
        .unwrap();
        assert_eq!(response.primary_email().as_deref(), Some("ada@example.com"));

        let empty = EmailAddressResponse::default();
        assert_eq!(empty.primary_email(), None);
    }

    #[test]
    fn test_identity_token_fallback() {
        let token = id_token(json!({
            "given_name": "Ada",
            "family_name": "Lovelace",
            "email": "a@x.com"
        }));
        let claims = decode_id_token(&token).expect("payload should decode");

        let normalized = normalize(&[ProfileSource::IdentityToken(claims)]);

        assert_eq!(normalized.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(normalized.email.as_deref(), Some("a@x.com"));
        assert_eq!(normalized.profile_url, None);
        assert_eq!(normalized.headline, None);
        assert_eq!(normalized.external_id, None);
    }

    #[test]
    fn test_identity_token_legacy_names_and_aliases() {
        let claims: IdTokenClaims = serde_json::from_value(json!({
            "user_id": "u-7",
            "givenName": "Grace",
            "name": "Grace Brewster Hopper",
            "preferred_username": "grace@example.com",
            "picture_url": "https://media/grace.jpg"
        }))
        .unwrap();

        let normalized = ProfileSource::IdentityToken(claims).normalize();

        assert_eq!(normalized.external_id.as_deref(), Some("u-7"));
        assert_eq!(normalized.full_name.as_deref(), Some("Grace Brewster Hopper"));
        assert_eq!(normalized.email.as_deref(), Some("grace@example.com"));
        assert_eq!(
            normalized.profile_picture.as_deref(),
            Some("https://media/grace.jpg")
        );
    }

    #[test]
    fn test_identity_token_name_only() {
        let claims: IdTokenClaims = serde_json::from_value(json!({
            "sub": "s-1",
            "name": "Alan Turing"
        }))
        .unwrap();

        let normalized = ProfileSource::IdentityToken(claims).normalize();
        assert_eq!(normalized.full_name.as_deref(), Some("Alan Turing"));
    }

    #[test]
    fn test_primary_takes_precedence_and_token_fills_gaps() {
        let profile = primary(json!({
            "id": "abc123",
            "localizedFirstName": "Ada",
            "localizedLastName": "Lovelace",
            "locationName": "London"
        }));
        let claims: IdTokenClaims = serde_json::from_value(json!({
            "sub": "other",
            "name": "Someone Else",
            "location": "Paris",
            "picture": "https://media/token.jpg",
            "headline": "Mathematician"
        }))
        .unwrap();

        let normalized = normalize(&[
            ProfileSource::Primary {
                profile,
                email: None,
            },
            ProfileSource::IdentityToken(claims),
        ]);

        assert_eq!(normalized.external_id.as_deref(), Some("abc123"));
        assert_eq!(normalized.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(normalized.location.as_deref(), Some("London"));
        assert_eq!(normalized.headline.as_deref(), Some("Mathematician"));
        assert_eq!(
            normalized.profile_picture.as_deref(),
            Some("https://media/token.jpg")
        );
    }

    #[test]
    fn test_decode_id_token_rejects_garbage() {
        assert!(decode_id_token("").is_none());
        assert!(decode_id_token("only-one-part").is_none());
        assert!(decode_id_token("a.!!!.c").is_none());
        assert!(decode_id_token(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("[1,2]"))).is_none());
    }

    #[test]
    fn test_no_sources_yields_empty_profile() {
        assert_eq!(normalize(&[]), NormalizedProfile::default());
    }

    #[test]
    fn test_primary_localized_headline_object() {
        let profile = primary(json!({
            "id": "li-123",
            "localizedFirstName": "Ada",
            "localizedLastName": "Lovelace",
            "headline": {
                "localized": { "fr_FR": "Analyste", "en_US": "Analyst" },
                "preferredLocale": { "country": "US", "language": "en" }
            },
            "localizedHeadline": "Ignored"
        }));

        let normalized = ProfileSource::Primary {
            profile,
            email: None,
        }
        .normalize();

        assert_eq!(normalized.external_id.as_deref(), Some("li-123"));
        assert_eq!(normalized.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(normalized.headline.as_deref(), Some("Analyst"));
    }

    #[test]
    fn test_primary_wrong_typed_fields_keep_identity() {
        let profile = primary(json!({
            "id": "li-123",
            "localizedFirstName": "Ada",
            "headline": { "unexpected": true },
            "localizedHeadline": "Analyst",
            "locationName": { "localized": {} },
            "positions": { "elements": [] },
            "educations": "none",
            "profilePicture": "not-an-object"
        }));

        let normalized = ProfileSource::Primary {
            profile,
            email: None,
        }
        .normalize();

        assert_eq!(normalized.external_id.as_deref(), Some("li-123"));
        assert_eq!(normalized.full_name.as_deref(), Some("Ada"));
        assert_eq!(normalized.headline.as_deref(), Some("Analyst"));
        assert_eq!(normalized.location, None);
        assert_eq!(normalized.experience, None);
        assert_eq!(normalized.education, None);
        assert_eq!(normalized.profile_picture, None);
    }

    #[test]
    fn test_identity_token_wrong_typed_claims() {
        let token = id_token(json!({
            "sub": "s-1",
            "name": "Alan Turing",
            "email": ["a@x.com"],
            "email_address": "alan@example.com",
            "headline": { "localized": { "en_GB": "Codebreaker" } },
            "positions": "n/a"
        }));
        let claims = decode_id_token(&token).expect("payload should decode");

        let normalized = ProfileSource::IdentityToken(claims).normalize();

        assert_eq!(normalized.external_id.as_deref(), Some("s-1"));
        assert_eq!(normalized.email.as_deref(), Some("alan@example.com"));
        assert_eq!(normalized.headline.as_deref(), Some("Codebreaker"));
        assert_eq!(normalized.experience, None);
    }
}
