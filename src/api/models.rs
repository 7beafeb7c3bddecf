//! Wire types for the scavenger-hunt backend API
//!
//! Field names mirror the backend's JSON (snake_case). Optional fields
//! use serde defaults so older or partial responses still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How rare a plant species is within the trail area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Trail difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Expert,
}

/// Marker position within the AR scene. `z` defaults to 0 for 2D maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// Anonymous per-device identity scoping all progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    /// Server-tracked; outside client scope but returned on fetch.
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

/// Immutable plant reference data attached to a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub facts: Vec<String>,
    pub rarity: Rarity,
    pub habitat: String,
    pub conservation_status: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A tappable AR marker associated with one plant. `discovered` reflects
/// the requesting session's state when a `session_id` was supplied to
/// the listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: u32,
    pub name: String,
    pub position: Position,
    pub plant: Plant,
    pub color: String,
    #[serde(default)]
    pub trail_id: String,
    #[serde(default)]
    pub discovered_count: u32,
    #[serde(default)]
    pub discovered: bool,
}

/// An ordered collection of checkpoints forming one AR experience route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub distance: String,
    pub duration: String,
    pub description: String,
    pub checkpoint_ids: Vec<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Achievement definition. Unlock state is server-driven; the client
/// only learns of unlocks through discovery responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub condition_value: u32,
    #[serde(default)]
    pub points: u32,
}

/// The recorded event of a session finding a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub id: String,
    pub session_id: String,
    pub checkpoint_id: u32,
    pub plant_id: String,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<Position>,
}

/// Per-session progress fragment carried inside a discovery response.
/// Fields absent from the response stay `None` and are left untouched
/// when the aggregator merges the fragment into its cached snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressDelta {
    #[serde(default)]
    pub checkpoints_discovered: Option<Vec<u32>>,
    #[serde(default)]
    pub total_checkpoints: Option<u32>,
    #[serde(default)]
    pub completed_trails: Option<Vec<String>>,
    #[serde(default)]
    pub plants_collected: Option<u32>,
    #[serde(default)]
    pub achievements_unlocked: Option<Vec<String>>,
    #[serde(default)]
    pub time_spent: Option<u32>,
}

/// Authoritative progress snapshot from `GET /progress/{session_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSummary {
    #[serde(default)]
    pub session_id: String,
    pub total_discoveries: u32,
    pub total_checkpoints: u32,
    pub completion_percentage: f32,
    pub achievements_count: u32,
    #[serde(default)]
    pub trails_completed: u32,
    #[serde(default)]
    pub time_spent: u32,
    pub plants_collected: u32,
    #[serde(default)]
    pub rarity_breakdown: HashMap<String, u32>,
}

/// Result of `POST /discoveries`. `success: false` is the server's
/// idempotent rejection (already discovered / invalid checkpoint),
/// not a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub discovery: Option<Discovery>,
    #[serde(default)]
    pub achievement_unlocked: Option<Achievement>,
    #[serde(default)]
    pub progress: Option<ProgressDelta>,
}

/// Per-session AR preferences, stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArSettings {
    pub session_id: String,
    #[serde(default = "default_true")]
    pub camera_enabled: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
    #[serde(default = "default_true")]
    pub show_hints: bool,
    #[serde(default = "default_sensitivity")]
    pub marker_detection_sensitivity: f32,
    #[serde(default = "default_render_quality")]
    pub render_quality: String,
}

fn default_true() -> bool {
    true
}

fn default_sensitivity() -> f32 {
    0.7
}

fn default_render_quality() -> String {
    "high".to_string()
}

impl ArSettings {
    pub fn for_session(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            camera_enabled: true,
            sound_enabled: true,
            vibration_enabled: true,
            show_hints: true,
            marker_detection_sensitivity: default_sensitivity(),
            render_quality: default_render_quality(),
        }
    }
}

/// Uploaded trail map metadata. `image_data` is base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapImage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_data: String,
    pub image_type: String,
    pub trail_id: String,
}

/// Response from `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_deserializes_with_defaults() {
        let json = r##"{
            "id": 3,
            "name": "Orchid Point",
            "position": {"x": 0.0, "y": 0.0},
            "plant": {
                "name": "Wild Orchid",
                "scientific_name": "Vanda hookeriana",
                "description": "An epiphytic orchid.",
                "facts": ["Blooms year-round"],
                "rarity": "Rare",
                "habitat": "Rainforest canopy",
                "conservation_status": "Protected"
            },
            "color": "#a855f7"
        }"##;

        let checkpoint: Checkpoint = serde_json::from_str(json).unwrap();
        assert_eq!(checkpoint.id, 3);
        assert!(!checkpoint.discovered);
        assert_eq!(checkpoint.position.z, 0.0);
        assert_eq!(checkpoint.plant.rarity, Rarity::Rare);
    }

    #[test]
    fn test_discovery_response_without_optional_fields() {
        let json = r#"{"success": false, "message": "Already discovered"}"#;

        let response: DiscoveryResponse = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        assert!(response.achievement_unlocked.is_none());
        assert!(response.progress.is_none());
    }

    #[test]
    fn test_rarity_round_trips_as_plain_string() {
        assert_eq!(
            serde_json::to_string(&Rarity::Legendary).unwrap(),
            "\"Legendary\""
        );
        let parsed: Rarity = serde_json::from_str("\"Common\"").unwrap();
        assert_eq!(parsed, Rarity::Common);
    }
}
