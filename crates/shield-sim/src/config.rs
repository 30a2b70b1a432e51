//! Runner configuration

use shield_services::TerrainKind;

/// Simulation runner configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Target village
    pub village_id: String,
    /// Terrain class of the region
    pub terrain: TerrainKind,
    /// Run the feed in disaster-drill mode
    pub simulate: bool,
    /// Run horizon in seconds before the runner tears down
    pub run_for_secs: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            village_id: "chitkul".to_string(),
            terrain: TerrainKind::Snow,
            simulate: true,
            run_for_secs: 30,
        }
    }
}

impl SimConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let village_id =
            std::env::var("SHIELD_VILLAGE").unwrap_or_else(|_| "chitkul".to_string());

        let terrain = std::env::var("SHIELD_TERRAIN")
            .ok()
            .and_then(|s| parse_terrain(&s))
            .unwrap_or(TerrainKind::Snow);

        let simulate = std::env::var("SHIELD_SIMULATE")
            .map(|s| s == "true" || s == "1")
            .unwrap_or(true);

        let run_for_secs = std::env::var("SHIELD_RUN_FOR_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Self {
            village_id,
            terrain,
            simulate,
            run_for_secs,
        }
    }
}

fn parse_terrain(s: &str) -> Option<TerrainKind> {
    match s.to_ascii_lowercase().as_str() {
        "flat" => Some(TerrainKind::Flat),
        "hilly" | "rocky" => Some(TerrainKind::Hilly),
        "forest" => Some(TerrainKind::Forest),
        "valley" => Some(TerrainKind::Valley),
        "snow" => Some(TerrainKind::Snow),
        _ => None,
    }
}
