use std::env;

use thiserror::Error;

pub const REFERENCE_HZ: f32 = 60.0;
pub const FRAME_MS: f32 = 1000.0 / REFERENCE_HZ;
pub const MAX_DELTA_FRAMES: f32 = 2.0;

pub const BOUNCE_JITTER: f32 = 0.025;
pub const PERTURB_PROBABILITY: f64 = 0.005;
pub const PERTURB_JITTER: f32 = 0.025;

pub const EDGE_ALPHA_MAX: f32 = 0.22;

pub const REDUCED_RADIUS_DELTA: f32 = 0.4;
pub const REDUCED_RADIUS_FLOOR: f32 = 1.8;
pub const REDUCED_SPEED_SCALE: f32 = 0.6;
pub const REDUCED_SPEED_FLOOR: f32 = 0.12;
pub const REDUCED_CONNECT_SCALE: f32 = 0.75;
pub const REDUCED_CONNECT_FLOOR: f32 = 70.0;

pub const DEFAULT_PARTICLE_COUNT: usize = 80;
pub const DEFAULT_CONNECT_RADIUS: f32 = 100.0;
pub const DEFAULT_MAX_SPEED: f32 = 0.5;
pub const DEFAULT_DOT_RADIUS: f32 = 2.5;

/// Logical pixels covered by one terminal cell.
pub const CELL_PX_X: f32 = 8.0;
pub const CELL_PX_Y: f32 = 16.0;

pub const TARGET_FPS: f32 = 60.0;

pub const ENV_COUNT: &str = "PARTICLEFIELD_COUNT";
pub const ENV_CONNECT_RADIUS: &str = "PARTICLEFIELD_CONNECT_RADIUS";
pub const ENV_MAX_SPEED: &str = "PARTICLEFIELD_MAX_SPEED";
pub const ENV_DOT_RADIUS: &str = "PARTICLEFIELD_DOT_RADIUS";
pub const ENV_REDUCED_MOTION: &str = "PARTICLEFIELD_REDUCED_MOTION";
pub const ENV_SEED: &str = "PARTICLEFIELD_SEED";
pub const ENV_LOG: &str = "PARTICLEFIELD_LOG";
pub const DEFAULT_LOG_FILE: &str = "particlefield.log";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("connect_radius must be >= 0, got {0}")]
    NegativeConnectRadius(f32),

    #[error("{name} must be > 0, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("could not parse {var}={value:?}")]
    Parse { var: &'static str, value: String },
}

/// Simulation parameters supplied at construction, before reduced-motion scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    pub particle_count: usize,
    pub connect_radius: f32,
    pub max_speed: f32,
    pub dot_radius: f32,
    pub reduced_motion: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            connect_radius: DEFAULT_CONNECT_RADIUS,
            max_speed: DEFAULT_MAX_SPEED,
            dot_radius: DEFAULT_DOT_RADIUS,
            reduced_motion: false,
        }
    }
}

/// Values the simulator actually runs with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveConfig {
    pub particle_count: usize,
    pub connect_radius: f32,
    pub max_speed: f32,
    pub dot_radius: f32,
    pub perturb: bool,
}

impl FieldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("connect_radius", self.connect_radius),
            ("max_speed", self.max_speed),
            ("dot_radius", self.dot_radius),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        if self.connect_radius < 0.0 {
            return Err(ConfigError::NegativeConnectRadius(self.connect_radius));
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "max_speed",
                value: self.max_speed,
            });
        }
        if self.dot_radius <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "dot_radius",
                value: self.dot_radius,
            });
        }
        Ok(())
    }

    pub fn effective(&self) -> EffectiveConfig {
        if !self.reduced_motion {
            return EffectiveConfig {
                particle_count: self.particle_count,
                connect_radius: self.connect_radius,
                max_speed: self.max_speed,
                dot_radius: self.dot_radius,
                perturb: true,
            };
        }
        EffectiveConfig {
            particle_count: self.particle_count.div_ceil(2),
            connect_radius: (self.connect_radius * REDUCED_CONNECT_SCALE)
                .max(REDUCED_CONNECT_FLOOR),
            max_speed: (self.max_speed * REDUCED_SPEED_SCALE).max(REDUCED_SPEED_FLOOR),
            dot_radius: (self.dot_radius - REDUCED_RADIUS_DELTA).max(REDUCED_RADIUS_FLOOR),
            perturb: false,
        }
    }

    /// Reads overrides from `PARTICLEFIELD_*` variables; `reduced_motion` is
    /// also set when the host passes it in (e.g. from a CLI flag).
    pub fn from_env(reduced_motion: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(reduced_motion, |key| env::var(key).ok())
    }

    fn from_lookup(
        reduced_motion: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = FieldConfig {
            reduced_motion,
            ..FieldConfig::default()
        };
        if let Some(count) = parse_var(&lookup, ENV_COUNT)? {
            config.particle_count = count;
        }
        if let Some(radius) = parse_var(&lookup, ENV_CONNECT_RADIUS)? {
            config.connect_radius = radius;
        }
        if let Some(speed) = parse_var(&lookup, ENV_MAX_SPEED)? {
            config.max_speed = speed;
        }
        if let Some(radius) = parse_var(&lookup, ENV_DOT_RADIUS)? {
            config.dot_radius = radius;
        }
        if let Some(value) = lookup(ENV_REDUCED_MOTION) {
            config.reduced_motion |= parse_flag(ENV_REDUCED_MOTION, &value)?;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn seed_from_env() -> Result<Option<u64>, ConfigError> {
    parse_var(&|key: &str| env::var(key).ok(), ENV_SEED)
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Parse { var, value }),
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Parse {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    mod effective {
        use super::*;

        #[test]
        fn unchanged_without_reduced_motion() {
            let config = FieldConfig::default();
            let eff = config.effective();
            assert_eq!(eff.particle_count, 80);
            assert_eq!(eff.connect_radius, 100.0);
            assert_eq!(eff.max_speed, 0.5);
            assert_eq!(eff.dot_radius, 2.5);
            assert!(eff.perturb);
        }

        #[test]
        fn reduced_motion_scales_all_values() {
            let config = FieldConfig {
                particle_count: 80,
                connect_radius: 100.0,
                max_speed: 0.5,
                dot_radius: 2.5,
                reduced_motion: true,
            };
            let eff = config.effective();
            assert_eq!(eff.particle_count, 40);
            assert!((eff.dot_radius - 2.1).abs() < 1e-6);
            assert!((eff.max_speed - 0.3).abs() < 1e-6);
            assert!((eff.connect_radius - 75.0).abs() < 1e-6);
            assert!(!eff.perturb);
        }

        #[test]
        fn reduced_count_rounds_up() {
            let config = FieldConfig {
                particle_count: 7,
                reduced_motion: true,
                ..FieldConfig::default()
            };
            assert_eq!(config.effective().particle_count, 4);
        }

        #[test]
        fn reduced_values_respect_floors() {
            let config = FieldConfig {
                particle_count: 0,
                connect_radius: 10.0,
                max_speed: 0.1,
                dot_radius: 1.0,
                reduced_motion: true,
            };
            let eff = config.effective();
            assert_eq!(eff.particle_count, 0);
            assert_eq!(eff.connect_radius, REDUCED_CONNECT_FLOOR);
            assert_eq!(eff.max_speed, REDUCED_SPEED_FLOOR);
            assert_eq!(eff.dot_radius, REDUCED_RADIUS_FLOOR);
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn default_is_valid() {
            assert_eq!(FieldConfig::default().validate(), Ok(()));
        }

        #[test]
        fn zero_connect_radius_is_valid() {
            let config = FieldConfig {
                connect_radius: 0.0,
                ..FieldConfig::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn rejects_negative_connect_radius() {
            let config = FieldConfig {
                connect_radius: -1.0,
                ..FieldConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::NegativeConnectRadius(-1.0))
            );
        }

        #[test]
        fn rejects_zero_max_speed() {
            let config = FieldConfig {
                max_speed: 0.0,
                ..FieldConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NotPositive { name: "max_speed", .. })
            ));
        }

        #[test]
        fn rejects_nan() {
            let config = FieldConfig {
                dot_radius: f32::NAN,
                ..FieldConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NotFinite { name: "dot_radius", .. })
            ));
        }
    }

    mod from_lookup {
        use super::*;

        fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn empty_environment_gives_defaults() {
            let config = FieldConfig::from_lookup(false, lookup(&[])).expect("valid");
            assert_eq!(config, FieldConfig::default());
        }

        #[test]
        fn overrides_are_applied() {
            let config = FieldConfig::from_lookup(
                false,
                lookup(&[
                    (ENV_COUNT, "12"),
                    (ENV_CONNECT_RADIUS, "64.5"),
                    (ENV_REDUCED_MOTION, "yes"),
                ]),
            )
            .expect("valid");
            assert_eq!(config.particle_count, 12);
            assert_eq!(config.connect_radius, 64.5);
            assert!(config.reduced_motion);
        }

        #[test]
        fn flag_argument_wins_over_env_false() {
            let config =
                FieldConfig::from_lookup(true, lookup(&[(ENV_REDUCED_MOTION, "0")])).expect("valid");
            assert!(config.reduced_motion);
        }

        #[test]
        fn bad_number_is_parse_error() {
            let err = FieldConfig::from_lookup(false, lookup(&[(ENV_COUNT, "many")]))
                .expect_err("should fail");
            assert_eq!(
                err,
                ConfigError::Parse {
                    var: ENV_COUNT,
                    value: "many".to_string()
                }
            );
        }

        #[test]
        fn invalid_values_fail_validation() {
            let err = FieldConfig::from_lookup(false, lookup(&[(ENV_MAX_SPEED, "-2")]))
                .expect_err("should fail");
            assert!(matches!(err, ConfigError::NotPositive { .. }));
        }
    }
}
