//! Engine Configuration
//!
//! The per-game configuration blob authored in the admin tools, plus the
//! playfield the engine is attached to. Everything is validated up front:
//! a malformed configuration fails construction instead of producing a
//! world with undefined behavior.

use std::collections::BTreeSet;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::state::{ObjectCategory, ObjectPhysics, WorldObject};

/// Default playfield width.
pub const DEFAULT_PLAYFIELD_WIDTH: f64 = 800.0;

/// Default playfield height.
pub const DEFAULT_PLAYFIELD_HEIGHT: f64 = 600.0;

/// Default session length (5 minutes).
pub const DEFAULT_DURATION_SECS: f64 = 300.0;

/// Default gravity (units/s^2, positive is down).
pub const DEFAULT_GRAVITY: f64 = 9.8;

/// Default per-object friction coefficient.
pub const DEFAULT_FRICTION: f64 = 0.1;

/// Default player speed (units/s).
pub const DEFAULT_PLAYER_SPEED: f64 = 200.0;

/// Default player box edge.
pub const DEFAULT_PLAYER_SIZE: f64 = 40.0;

/// Configuration errors. All are fatal at construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No playfield was supplied.
    #[error("missing playfield surface")]
    MissingSurface,

    /// Playfield has a non-positive or non-finite dimension.
    #[error("invalid playfield {width}x{height}")]
    InvalidPlayfield {
        /// Supplied width
        width: f64,
        /// Supplied height
        height: f64,
    },

    /// Configuration blob is not valid JSON for this schema.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A numeric field is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Two objects share an identifier.
    #[error("duplicate object id: {0}")]
    DuplicateObjectId(String),
}

// =============================================================================
// PLAYFIELD
// =============================================================================

/// The surface the session is played on.
///
/// Stands in for the rendering surface: the engine only needs its bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    /// Width in units
    pub width: f64,
    /// Height in units
    pub height: f64,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: DEFAULT_PLAYFIELD_WIDTH,
            height: DEFAULT_PLAYFIELD_HEIGHT,
        }
    }
}

impl Playfield {
    /// Create a playfield.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Validate dimensions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(ConfigError::InvalidPlayfield {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Largest top-left corner that keeps a box of `size` inside.
    #[inline]
    pub fn max_corner(&self, size: Vec2) -> Vec2 {
        Vec2::new(self.width - size.x, self.height - size.y)
    }
}

// =============================================================================
// CONFIG BLOB
// =============================================================================

/// Global physics constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration
    pub gravity: f64,
    /// Friction used by objects that don't set their own
    pub friction: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            friction: DEFAULT_FRICTION,
        }
    }
}

/// Physics block on an object definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectPhysicsDef {
    /// Whether the integrator moves this object
    #[serde(default)]
    pub enabled: bool,
    /// Carried through; the integrator ignores mass
    #[serde(default = "default_mass")]
    pub mass: f64,
    /// Falls back to `PhysicsConfig::friction` when absent
    #[serde(default)]
    pub friction: Option<f64>,
}

fn default_mass() -> f64 {
    1.0
}

/// Object definition as authored in the game editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDef {
    /// Object identifier
    pub id: String,
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Initial horizontal velocity
    #[serde(default)]
    pub velocity_x: f64,
    /// Initial vertical velocity
    #[serde(default)]
    pub velocity_y: f64,
    /// Render color
    #[serde(default = "default_color")]
    pub color: String,
    /// Category tag (`collectible`, `obstacle`, ...)
    #[serde(rename = "type", default)]
    pub category: ObjectCategory,
    /// Optional physics attributes
    #[serde(default)]
    pub physics: Option<ObjectPhysicsDef>,
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

/// Full engine configuration.
///
/// Field names follow the stored `game_config` JSON (camelCase).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Starting world objects
    pub game_objects: Vec<ObjectDef>,
    /// Physics constants
    pub physics: PhysicsConfig,
    /// Session length in seconds
    pub duration_secs: f64,
    /// Player speed in units/s
    pub player_speed: f64,
    /// Player box edge length
    pub player_size: f64,
    /// Score per collectible contact per tick
    pub collectible_reward: u32,
    /// Health lost per obstacle contact per tick
    pub obstacle_damage: u32,
    /// Separation applied to each player on contact
    pub push_force: f64,
    /// Player cap (usually the session's max slots)
    pub max_players: Option<usize>,
    /// Seed for spawn positions and colors
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            game_objects: Vec::new(),
            physics: PhysicsConfig::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            player_speed: DEFAULT_PLAYER_SPEED,
            player_size: DEFAULT_PLAYER_SIZE,
            collectible_reward: 10,
            obstacle_damage: 10,
            push_force: 2.0,
            max_players: None,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration blob.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric field and object definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("durationSecs", self.duration_secs)?;
        non_negative("playerSpeed", self.player_speed)?;
        positive("playerSize", self.player_size)?;
        non_negative("pushForce", self.push_force)?;
        finite("physics.gravity", self.physics.gravity)?;
        non_negative("physics.friction", self.physics.friction)?;

        if self.max_players == Some(0) {
            return Err(invalid("maxPlayers", "must be at least 1"));
        }

        let mut seen = BTreeSet::new();
        for obj in &self.game_objects {
            if !seen.insert(obj.id.as_str()) {
                return Err(ConfigError::DuplicateObjectId(obj.id.clone()));
            }
            let field = |name: &str| format!("gameObjects[{}].{}", obj.id, name);
            finite(&field("x"), obj.x)?;
            finite(&field("y"), obj.y)?;
            positive(&field("width"), obj.width)?;
            positive(&field("height"), obj.height)?;
            finite(&field("velocityX"), obj.velocity_x)?;
            finite(&field("velocityY"), obj.velocity_y)?;
            if let Some(physics) = &obj.physics {
                if let Some(friction) = physics.friction {
                    non_negative(&field("physics.friction"), friction)?;
                }
                finite(&field("physics.mass"), physics.mass)?;
            }
        }

        Ok(())
    }

    /// Session length as a duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs)
    }

    /// Player bounding box.
    pub fn player_box(&self) -> Vec2 {
        Vec2::new(self.player_size, self.player_size)
    }

    /// Build the initial world objects.
    pub fn build_objects(&self) -> Vec<WorldObject> {
        self.game_objects
            .iter()
            .map(|def| WorldObject {
                id: def.id.clone(),
                position: Vec2::new(def.x, def.y),
                size: Vec2::new(def.width, def.height),
                velocity: Vec2::new(def.velocity_x, def.velocity_y),
                color: def.color.clone(),
                category: def.category.clone(),
                physics: def.physics.as_ref().map(|p| ObjectPhysics {
                    enabled: p.enabled,
                    mass: p.mass,
                    friction: p.friction.unwrap_or(self.physics.friction),
                }),
            })
            .collect()
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Host refresh rate when none is configured.
pub const DEFAULT_FRAME_HZ: u32 = 60;

/// How often the runner publishes the leaderboard.
pub const DEFAULT_LEADERBOARD_INTERVAL: Duration = Duration::from_secs(1);

/// Async host settings.
#[derive(Clone, Debug, PartialEq)]
pub struct RunnerConfig {
    /// Frame callbacks per second. Ticks still happen at the logical rate.
    pub frame_hz: u32,
    /// Period of leaderboard updates
    pub leaderboard_interval: Duration,
    /// Update channel capacity; slow subscribers lag past this
    pub update_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            frame_hz: DEFAULT_FRAME_HZ,
            leaderboard_interval: DEFAULT_LEADERBOARD_INTERVAL,
            update_capacity: 256,
        }
    }
}

impl RunnerConfig {
    /// Read `ELDORADO_FRAME_HZ` and `ELDORADO_LEADERBOARD_MS`.
    ///
    /// Missing, unparsable or zero values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        let mut config = Self::default();
        if let Some(hz) = parse("ELDORADO_FRAME_HZ") {
            config.frame_hz = hz.min(u32::MAX as u64) as u32;
        }
        if let Some(ms) = parse("ELDORADO_LEADERBOARD_MS") {
            config.leaderboard_interval = Duration::from_millis(ms);
        }
        config
    }

    /// Time between frame callbacks.
    pub fn frame_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.frame_hz.max(1) as u64)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be greater than zero"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITOR_BLOB: &str = r##"{
        "code": "// ignored",
        "sprites": [],
        "gameObjects": [
            {
                "id": "1700000000000",
                "name": "Object 1",
                "x": 100, "y": 100, "width": 50, "height": 50,
                "sprite": null,
                "type": "rectangle",
                "color": "#3b82f6",
                "physics": { "enabled": true, "mass": 1, "friction": 0.5 }
            },
            {
                "id": "coin",
                "x": 10, "y": 20, "width": 8, "height": 8,
                "type": "collectible"
            }
        ],
        "physics": { "gravity": 9.8, "friction": 0.1 }
    }"##;

    #[test]
    fn test_parse_editor_blob() {
        let config = EngineConfig::from_json(EDITOR_BLOB).unwrap();
        assert_eq!(config.game_objects.len(), 2);
        assert_eq!(config.physics.gravity, 9.8);
        assert_eq!(config.duration_secs, DEFAULT_DURATION_SECS);

        let objects = config.build_objects();
        assert_eq!(objects[0].category, ObjectCategory::Other);
        assert_eq!(objects[0].physics.as_ref().unwrap().friction, 0.5);
        assert_eq!(objects[0].velocity, Vec2::ZERO);
        assert_eq!(objects[1].category, ObjectCategory::Collectible);
        assert!(objects[1].physics.is_none());
    }

    #[test]
    fn test_friction_falls_back_to_global() {
        let json = r#"{
            "gameObjects": [
                { "id": "ball", "x": 0, "y": 0, "width": 5, "height": 5,
                  "physics": { "enabled": true } }
            ],
            "physics": { "gravity": 9.8, "friction": 0.25 }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        let objects = config.build_objects();
        assert_eq!(objects[0].physics.as_ref().unwrap().friction, 0.25);
    }

    #[test]
    fn test_empty_blob_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = EngineConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Malformed(_))));

        let result = EngineConfig::from_json(r#"{ "gameObjects": [ { "id": "x" } ] }"#);
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = EngineConfig::from_json(r#"{ "durationSecs": 0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = EngineConfig::from_json(r#"{ "playerSpeed": -1 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = EngineConfig::from_json(r#"{ "maxPlayers": 0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let json = r#"{ "gameObjects": [
            { "id": "a", "x": 0, "y": 0, "width": 0, "height": 5 }
        ] }"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_duplicate_object_ids_rejected() {
        let json = r#"{ "gameObjects": [
            { "id": "a", "x": 0, "y": 0, "width": 1, "height": 1 },
            { "id": "a", "x": 5, "y": 5, "width": 1, "height": 1 }
        ] }"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(ConfigError::DuplicateObjectId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_playfield_validation() {
        assert!(Playfield::default().validate().is_ok());
        assert!(Playfield::new(0.0, 600.0).validate().is_err());
        assert!(Playfield::new(800.0, f64::NAN).validate().is_err());
        assert_eq!(
            Playfield::default().max_corner(Vec2::new(40.0, 40.0)),
            Vec2::new(760.0, 560.0)
        );
    }

    #[test]
    fn test_runner_config_lookup() {
        let config = RunnerConfig::from_lookup(|key| match key {
            "ELDORADO_FRAME_HZ" => Some("120".to_string()),
            "ELDORADO_LEADERBOARD_MS" => Some(" 250 ".to_string()),
            _ => None,
        });
        assert_eq!(config.frame_hz, 120);
        assert_eq!(config.leaderboard_interval, Duration::from_millis(250));

        let fallback = RunnerConfig::from_lookup(|key| match key {
            "ELDORADO_FRAME_HZ" => Some("0".to_string()),
            _ => Some("soon".to_string()),
        });
        assert_eq!(fallback, RunnerConfig::default());
        assert_eq!(fallback.frame_period(), Duration::from_micros(16_666));
    }
}
