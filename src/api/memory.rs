//! In-memory backend
//!
//! A deterministic [`Backend`] implementation used by the test suite and
//! by the offline demo mode of the binary. Ships with the Bukit Kiara
//! sample trail so the engine can run end-to-end without a server.
//!
//! Test knobs: `set_offline` makes every call fail the way a transport
//! error would, and `set_latency` delays discovery handling so in-flight
//! behavior can be observed.

use crate::api::models::*;
use crate::api::Backend;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<String, Session>,
    plants: Vec<Plant>,
    checkpoints: Vec<Checkpoint>,
    trails: Vec<Trail>,
    achievements: Vec<Achievement>,
    /// Discovered checkpoint ids per session.
    discoveries: HashMap<String, HashSet<u32>>,
    settings: HashMap<String, ArSettings>,
    maps: HashMap<String, MapImage>,
}

/// In-memory [`Backend`] with optional failure injection.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
    latency: Mutex<Duration>,
    discover_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            offline: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
            discover_calls: AtomicUsize::new(0),
        }
    }

    /// Backend pre-seeded with the Bukit Kiara sample trail: five plant
    /// checkpoints and two discovery-count achievements.
    pub fn with_sample_data() -> Self {
        let backend = Self::new();
        {
            let mut state = backend.state.lock().unwrap();
            state.plants = sample_plants();
            state.checkpoints = sample_checkpoints(&state.plants);
            state.trails = vec![Trail {
                id: "trail-bukit-kiara".to_string(),
                name: "Bukit Kiara Loop".to_string(),
                difficulty: Difficulty::Moderate,
                distance: "3.2 km".to_string(),
                duration: "90 min".to_string(),
                description: "A loop through secondary rainforest with five plant checkpoints."
                    .to_string(),
                checkpoint_ids: state.checkpoints.iter().map(|c| c.id).collect(),
                image_url: None,
            }];
            state.achievements = vec![
                Achievement {
                    id: "ach-first-discovery".to_string(),
                    name: "First Discovery".to_string(),
                    description: "Discover your first plant checkpoint".to_string(),
                    icon: "🌱".to_string(),
                    condition: "discover_plants".to_string(),
                    condition_value: 1,
                    points: 10,
                },
                Achievement {
                    id: "ach-plant-collector".to_string(),
                    name: "Plant Collector".to_string(),
                    description: "Discover five plant checkpoints".to_string(),
                    icon: "🌿".to_string(),
                    condition: "discover_plants".to_string(),
                    condition_value: 5,
                    points: 50,
                },
            ];
        }
        backend
    }

    /// Make every subsequent call fail like a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay discovery handling, keeping requests observably in flight.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Number of discovery requests that reached the backend.
    pub fn discover_calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    /// Drop a session server-side, as if it expired.
    pub fn forget_session(&self, session_id: &str) {
        self.state.lock().unwrap().sessions.remove(session_id);
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Generic("connection refused".to_string()));
        }
        Ok(())
    }

    fn not_found(what: &str) -> AppError {
        AppError::Api {
            status: 404,
            message: format!("{} not found", what),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_session(&self, device_id: &str) -> Result<Session> {
        self.check_online()?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            created_at: Utc::now(),
            last_active: Some(Utc::now()),
        };

        let mut state = self.state.lock().unwrap();
        state.sessions.insert(session.id.clone(), session.clone());
        state
            .discoveries
            .insert(session.id.clone(), HashSet::new());

        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Session> {
        self.check_online()?;
        self.state
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Session"))
    }

    async fn list_plants(&self) -> Result<Vec<Plant>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().plants.clone())
    }

    async fn get_plant(&self, plant_id: &str) -> Result<Plant> {
        self.check_online()?;
        self.state
            .lock()
            .unwrap()
            .plants
            .iter()
            .find(|p| p.id == plant_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Plant"))
    }

    async fn list_checkpoints(
        &self,
        trail_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Vec<Checkpoint>> {
        self.check_online()?;

        let state = self.state.lock().unwrap();
        let discovered = session_id
            .and_then(|id| state.discoveries.get(id))
            .cloned()
            .unwrap_or_default();

        Ok(state
            .checkpoints
            .iter()
            .filter(|c| trail_id.map_or(true, |t| c.trail_id == t))
            .map(|c| {
                let mut checkpoint = c.clone();
                checkpoint.discovered = discovered.contains(&c.id);
                checkpoint
            })
            .collect())
    }

    async fn get_checkpoint(
        &self,
        checkpoint_id: u32,
        session_id: Option<&str>,
    ) -> Result<Checkpoint> {
        self.check_online()?;

        let state = self.state.lock().unwrap();
        let mut checkpoint = state
            .checkpoints
            .iter()
            .find(|c| c.id == checkpoint_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Checkpoint"))?;

        if let Some(session_id) = session_id {
            checkpoint.discovered = state
                .discoveries
                .get(session_id)
                .map_or(false, |set| set.contains(&checkpoint_id));
        }

        Ok(checkpoint)
    }

    async fn discover_checkpoint(
        &self,
        session_id: &str,
        checkpoint_id: u32,
    ) -> Result<DiscoveryResponse> {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.check_online()?;
        self.discover_calls.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();

        if !state.sessions.contains_key(session_id) {
            return Err(Self::not_found("Session"));
        }

        let Some(checkpoint) = state
            .checkpoints
            .iter()
            .find(|c| c.id == checkpoint_id)
            .cloned()
        else {
            return Ok(DiscoveryResponse {
                success: false,
                message: "Invalid checkpoint".to_string(),
                discovery: None,
                achievement_unlocked: None,
                progress: None,
            });
        };

        let discovered = state
            .discoveries
            .entry(session_id.to_string())
            .or_default();

        if !discovered.insert(checkpoint_id) {
            return Ok(DiscoveryResponse {
                success: false,
                message: "Already discovered".to_string(),
                discovery: None,
                achievement_unlocked: None,
                progress: None,
            });
        }

        let count = discovered.len() as u32;
        let mut discovered_ids: Vec<u32> = discovered.iter().copied().collect();
        discovered_ids.sort_unstable();

        let unlocked_ids: Vec<String> = state
            .achievements
            .iter()
            .filter(|a| a.condition_value <= count)
            .map(|a| a.id.clone())
            .collect();
        // An achievement whose threshold was crossed by this discovery is
        // reported as newly unlocked.
        let newly_unlocked = state
            .achievements
            .iter()
            .find(|a| a.condition_value == count)
            .cloned();

        let total_checkpoints = state.checkpoints.len() as u32;
        let discovery = Discovery {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            checkpoint_id,
            plant_id: checkpoint.plant.id.clone(),
            discovered_at: Utc::now(),
            location: Some(checkpoint.position),
        };

        Ok(DiscoveryResponse {
            success: true,
            message: format!("Discovered {}!", checkpoint.plant.name),
            discovery: Some(discovery),
            achievement_unlocked: newly_unlocked,
            progress: Some(ProgressDelta {
                checkpoints_discovered: Some(discovered_ids),
                total_checkpoints: Some(total_checkpoints),
                completed_trails: Some(Vec::new()),
                plants_collected: Some(count),
                achievements_unlocked: Some(unlocked_ids),
                time_spent: None,
            }),
        })
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().achievements.clone())
    }

    async fn get_progress(&self, session_id: &str) -> Result<ProgressSummary> {
        self.check_online()?;

        let state = self.state.lock().unwrap();
        if !state.sessions.contains_key(session_id) {
            return Err(Self::not_found("Session"));
        }

        let discovered = state
            .discoveries
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        let total_discoveries = discovered.len() as u32;
        let total_checkpoints = state.checkpoints.len() as u32;
        let achievements_count = state
            .achievements
            .iter()
            .filter(|a| a.condition_value <= total_discoveries)
            .count() as u32;

        let mut rarity_breakdown: HashMap<String, u32> = HashMap::new();
        for checkpoint in state
            .checkpoints
            .iter()
            .filter(|c| discovered.contains(&c.id))
        {
            *rarity_breakdown
                .entry(format!("{:?}", checkpoint.plant.rarity))
                .or_insert(0) += 1;
        }

        Ok(ProgressSummary {
            session_id: session_id.to_string(),
            total_discoveries,
            total_checkpoints,
            completion_percentage: if total_checkpoints == 0 {
                0.0
            } else {
                100.0 * total_discoveries as f32 / total_checkpoints as f32
            },
            achievements_count,
            trails_completed: 0,
            time_spent: 0,
            plants_collected: total_discoveries,
            rarity_breakdown,
        })
    }

    async fn list_trails(&self) -> Result<Vec<Trail>> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().trails.clone())
    }

    async fn get_trail(&self, trail_id: &str) -> Result<Trail> {
        self.check_online()?;
        self.state
            .lock()
            .unwrap()
            .trails
            .iter()
            .find(|t| t.id == trail_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Trail"))
    }

    async fn upload_map(
        &self,
        name: &str,
        trail_id: &str,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<MapImage> {
        self.check_online()?;

        let image_type = if file_name.ends_with(".jpg") || file_name.ends_with(".jpeg") {
            "image/jpeg"
        } else {
            "image/png"
        };

        let map = MapImage {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            image_data: String::new(),
            image_type: image_type.to_string(),
            trail_id: trail_id.to_string(),
        };

        self.state
            .lock()
            .unwrap()
            .maps
            .insert(trail_id.to_string(), map.clone());
        Ok(map)
    }

    async fn get_map(&self, trail_id: &str) -> Result<MapImage> {
        self.check_online()?;
        self.state
            .lock()
            .unwrap()
            .maps
            .get(trail_id)
            .cloned()
            .ok_or_else(|| Self::not_found("Map"))
    }

    async fn get_settings(&self, session_id: &str) -> Result<ArSettings> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .settings
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| ArSettings::for_session(session_id)))
    }

    async fn update_settings(
        &self,
        session_id: &str,
        settings: &ArSettings,
    ) -> Result<ArSettings> {
        self.check_online()?;

        let mut stored = settings.clone();
        stored.session_id = session_id.to_string();
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(session_id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        self.check_online()?;
        Ok(HealthResponse {
            message: "Trailhead in-memory backend ready".to_string(),
        })
    }
}

fn sample_plants() -> Vec<Plant> {
    vec![
        Plant {
            id: "plant-birds-nest-fern".to_string(),
            name: "Bird's Nest Fern".to_string(),
            scientific_name: "Asplenium nidus".to_string(),
            description: "A large epiphytic fern native to tropical regions. Its distinctive \
                          nest-like shape helps collect water and organic debris."
                .to_string(),
            facts: vec![
                "Can grow up to 1.5 meters wide".to_string(),
                "Epiphytic - grows on other plants".to_string(),
                "Popular as houseplant".to_string(),
            ],
            rarity: Rarity::Common,
            habitat: "Rainforest understorey".to_string(),
            conservation_status: "Least Concern".to_string(),
            image_url: None,
        },
        Plant {
            id: "plant-giant-bamboo".to_string(),
            name: "Giant Bamboo".to_string(),
            scientific_name: "Dendrocalamus giganteus".to_string(),
            description: "One of the largest bamboo species in the world. It can grow \
                          extremely fast and is used for construction."
                .to_string(),
            facts: vec![
                "Can grow up to 3 feet per day".to_string(),
                "Reaches heights of 100+ feet".to_string(),
                "Stronger than steel in tensile strength".to_string(),
            ],
            rarity: Rarity::Uncommon,
            habitat: "Forest clearings".to_string(),
            conservation_status: "Least Concern".to_string(),
            image_url: None,
        },
        Plant {
            id: "plant-wild-orchid".to_string(),
            name: "Wild Orchid".to_string(),
            scientific_name: "Vanda hookeriana".to_string(),
            description: "A beautiful epiphytic orchid species endemic to Southeast Asia. \
                          Known for its fragrant flowers."
                .to_string(),
            facts: vec![
                "Blooms year-round".to_string(),
                "Requires high humidity".to_string(),
                "Protected species".to_string(),
            ],
            rarity: Rarity::Rare,
            habitat: "Rainforest canopy".to_string(),
            conservation_status: "Protected".to_string(),
            image_url: None,
        },
        Plant {
            id: "plant-meranti-tree".to_string(),
            name: "Meranti Tree".to_string(),
            scientific_name: "Shorea sp.".to_string(),
            description: "A tall tropical hardwood tree, part of the dipterocarp family. \
                          Important for timber and ecosystem."
                .to_string(),
            facts: vec![
                "Can live over 100 years".to_string(),
                "Provides canopy shelter".to_string(),
                "Seeds have wing-like structures".to_string(),
            ],
            rarity: Rarity::Common,
            habitat: "Lowland dipterocarp forest".to_string(),
            conservation_status: "Near Threatened".to_string(),
            image_url: None,
        },
        Plant {
            id: "plant-pitcher-plant".to_string(),
            name: "Tropical Pitcher Plant".to_string(),
            scientific_name: "Nepenthes rafflesiana".to_string(),
            description: "A carnivorous plant with modified leaves that form pitcher-shaped \
                          traps to catch insects."
                .to_string(),
            facts: vec![
                "Carnivorous plant".to_string(),
                "Pitchers can hold 200ml of water".to_string(),
                "Endemic to Southeast Asia".to_string(),
            ],
            rarity: Rarity::Rare,
            habitat: "Nutrient-poor bog".to_string(),
            conservation_status: "Vulnerable".to_string(),
            image_url: None,
        },
    ]
}

fn sample_checkpoints(plants: &[Plant]) -> Vec<Checkpoint> {
    let specs: [(u32, &str, [f32; 3], &str); 5] = [
        (1, "Fern Valley", [-2.0, 0.0, -3.0], "#22c55e"),
        (2, "Bamboo Grove", [2.0, 0.0, -2.0], "#eab308"),
        (3, "Orchid Point", [0.0, 0.0, -5.0], "#a855f7"),
        (4, "Dipterocarp Trail", [-3.0, 0.0, -1.0], "#dc2626"),
        (5, "Pitcher Plant Bog", [3.0, 0.0, -4.0], "#f59e0b"),
    ];

    specs
        .into_iter()
        .zip(plants)
        .map(|((id, name, [x, y, z], color), plant)| Checkpoint {
            id,
            name: name.to_string(),
            position: Position { x, y, z },
            plant: plant.clone(),
            color: color.to_string(),
            trail_id: "trail-bukit-kiara".to_string(),
            discovered_count: 0,
            discovered: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_data_shape() {
        let backend = MemoryBackend::with_sample_data();

        let checkpoints = backend.list_checkpoints(None, None).await.unwrap();
        assert_eq!(checkpoints.len(), 5);
        assert!(checkpoints.iter().all(|c| !c.discovered));

        let trails = backend.list_trails().await.unwrap();
        assert_eq!(trails.len(), 1);
        assert_eq!(trails[0].checkpoint_ids.len(), 5);
    }

    #[tokio::test]
    async fn test_discovery_is_idempotent_server_side() {
        let backend = MemoryBackend::with_sample_data();
        let session = backend.create_session("device_test").await.unwrap();

        let first = backend.discover_checkpoint(&session.id, 3).await.unwrap();
        assert!(first.success);
        assert!(first.achievement_unlocked.is_some());

        let second = backend.discover_checkpoint(&session.id, 3).await.unwrap();
        assert!(!second.success);
        assert_eq!(second.message, "Already discovered");
    }

    #[tokio::test]
    async fn test_map_upload_round_trip() {
        let backend = MemoryBackend::with_sample_data();

        let uploaded = backend
            .upload_map("Bukit Kiara", "trail-bukit-kiara", "map.png", vec![0u8; 16])
            .await
            .unwrap();
        assert_eq!(uploaded.image_type, "image/png");

        let fetched = backend.get_map("trail-bukit-kiara").await.unwrap();
        assert_eq!(fetched.id, uploaded.id);
        assert!(backend.get_map("trail-other").await.is_err());
    }

    #[tokio::test]
    async fn test_offline_mode_fails_calls() {
        let backend = MemoryBackend::with_sample_data();
        backend.set_offline(true);
        assert!(backend.health_check().await.is_err());

        backend.set_offline(false);
        assert!(backend.health_check().await.is_ok());
    }
}
