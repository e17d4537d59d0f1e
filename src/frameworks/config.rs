use crate::domain::errors::ConfigError;
use crate::domain::math::Vec2;
use crate::domain::spawner::SpawnRegistry;
use crate::domain::systems::lag_compensation::CompensationPolicy;
use crate::domain::timer::TickRate;
use crate::domain::tuning::{
    ArenaBounds, ArenaTuning, HazardTuning, PlayerTuning, ProjectileTuning,
};
use crate::use_cases::HostSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_rate() -> Result<TickRate, ConfigError> {
    parse_tick_rate(env::var("ARENA_TICK_RATE").ok().as_deref())
}

/// Unparseable or absent values mean the default rate.
pub fn parse_tick_rate(raw: Option<&str>) -> Result<TickRate, ConfigError> {
    match raw.and_then(|v| v.trim().parse::<u32>().ok()) {
        Some(value) if value > MAX_TICK_RATE => Err(ConfigError::TickRateTooHigh {
            value,
            max: MAX_TICK_RATE,
        }),
        Some(value) => TickRate::new(value).ok_or(ConfigError::ZeroTickRate),
        None => Ok(TickRate::DEFAULT),
    }
}

pub fn seed() -> u64 {
    env::var("ARENA_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

pub fn arena_config_path() -> Option<PathBuf> {
    env::var_os("ARENA_CONFIG").map(PathBuf::from)
}

pub fn presentation_interval() -> Duration {
    presentation_interval_from(env::var("ARENA_PRESENTATION_HZ").ok().as_deref())
}

/// Rates are clamped to `1..=MAX_PRESENTATION_HZ`; anything unparseable means 20 Hz.
pub fn presentation_interval_from(raw: Option<&str>) -> Duration {
    let hz = raw
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_PRESENTATION_HZ)
        .clamp(1, MAX_PRESENTATION_HZ);
    Duration::from_secs_f64(1.0 / hz as f64)
}

pub fn match_start_delay() -> Duration {
    let secs = env::var("ARENA_MATCH_START_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(3);
    Duration::from_secs(secs)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const PING_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SEED: u64 = 0x5EED;
pub const MAX_TICK_RATE: u32 = 1000;
pub const DEFAULT_PRESENTATION_HZ: u32 = 20;
pub const MAX_PRESENTATION_HZ: u32 = 240;

/// Arena layout and gameplay tuning, read from a TOML file.
///
/// Every table is optional; missing values fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub spawn_points: Vec<Vec2>,
    pub bounds: ArenaBounds,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub hazard: HazardTuning,
    pub compensation: CompensationPolicy,
    // Ticks of collider history kept for rewound queries.
    pub history_ticks: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            spawn_points: vec![
                Vec2::new(-30.0, -30.0),
                Vec2::new(30.0, -30.0),
                Vec2::new(-30.0, 30.0),
                Vec2::new(30.0, 30.0),
            ],
            bounds: ArenaBounds::default(),
            player: PlayerTuning::default(),
            projectile: ProjectileTuning::default(),
            hazard: HazardTuning::default(),
            compensation: CompensationPolicy::default(),
            history_ticks: 64,
        }
    }
}

impl ArenaConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn tuning(&self) -> ArenaTuning {
        ArenaTuning {
            player: self.player,
            projectile: self.projectile,
            hazard: self.hazard,
            bounds: self.bounds,
        }
    }

    /// Fails on an empty spawn point list.
    pub fn host_settings(&self, seed: u64) -> Result<HostSettings, ConfigError> {
        Ok(HostSettings {
            registry: SpawnRegistry::new(self.spawn_points.clone())?,
            tuning: self.tuning(),
            compensation: self.compensation,
            history_ticks: self.history_ticks,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_the_bundled_arena_file_is_parsed_then_it_yields_valid_host_settings() {
        let config = ArenaConfig::from_toml_str(include_str!("../../config/arena.toml"))
            .expect("bundled config parses");

        assert!(!config.spawn_points.is_empty());
        assert!(config.host_settings(1).is_ok());
    }

    #[test]
    fn when_only_some_values_are_given_then_the_rest_default() {
        let config = ArenaConfig::from_toml_str(
            r#"
            history_ticks = 32

            [player]
            respawn_seconds = 2.0

            [compensation]
            mode = "fixed_ticks"
            ticks = 4
            "#,
        )
        .expect("partial config parses");

        assert_eq!(config.history_ticks, 32);
        assert_eq!(config.player.respawn_seconds, 2.0);
        assert_eq!(config.player.damage_radius, PlayerTuning::default().damage_radius);
        assert_eq!(config.compensation, CompensationPolicy::FixedTicks { ticks: 4 });
        assert_eq!(config.spawn_points.len(), 4);
    }

    #[test]
    fn when_spawn_points_are_empty_then_settings_fail_with_a_config_error() {
        let config = ArenaConfig::from_toml_str("spawn_points = []").expect("parses");
        assert!(matches!(
            config.host_settings(1),
            Err(ConfigError::EmptySpawnRegistry)
        ));
    }

    #[test]
    fn when_the_file_is_malformed_then_a_parse_error_is_returned() {
        assert!(matches!(
            ArenaConfig::from_toml_str("history_ticks = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn when_the_file_is_missing_then_a_read_error_names_it() {
        let err = ArenaConfig::load(Some(Path::new("/nonexistent/arena.toml")))
            .expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/arena.toml"));
    }

    #[test]
    fn when_the_tick_rate_is_out_of_range_then_it_is_rejected() {
        assert_eq!(parse_tick_rate(None).expect("default"), TickRate::DEFAULT);
        assert_eq!(parse_tick_rate(Some("abc")).expect("default"), TickRate::DEFAULT);
        assert_eq!(parse_tick_rate(Some("120")).expect("valid").interval(), Duration::from_secs_f64(1.0 / 120.0));
        assert!(matches!(parse_tick_rate(Some("0")), Err(ConfigError::ZeroTickRate)));
        assert!(matches!(
            parse_tick_rate(Some("4000000000")),
            Err(ConfigError::TickRateTooHigh { value: 4_000_000_000, max: MAX_TICK_RATE })
        ));
    }

    #[test]
    fn when_the_presentation_rate_is_huge_or_zero_then_the_interval_stays_positive() {
        let fastest = Duration::from_secs_f64(1.0 / MAX_PRESENTATION_HZ as f64);

        assert_eq!(presentation_interval_from(Some("4294967295")), fastest);
        assert_eq!(presentation_interval_from(Some("0")), Duration::from_secs(1));
        assert_eq!(presentation_interval_from(None), Duration::from_millis(50));
        assert!(presentation_interval_from(Some("4294967295")) > Duration::ZERO);
    }
}
