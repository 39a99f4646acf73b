//! Configuration – reads/writes `~/.tickwork/config.toml`.
//!
//! Every field has a default, so a partial file (or none at all) is valid.
//! Device sections list transport candidates in order of preference:
//!
//! ```toml
//! tick_period_ms = 20
//! fault_capacity = 64
//!
//! [[leds.plain]]
//! kind = "usb"
//! address = "USB2"
//!
//! [[leds.plain]]
//! kind = "uart"
//! address = "MXP"
//! bitrate = 230400
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tickwork_hal::DeviceConfig;
use tickwork_kernel::SchedulerConfig;
use tickwork_runtime::RobotConfig;
use tickwork_runtime::subsystems::{LedConfig, ShooterConfig, ShooterPresets};
use tickwork_types::TransportSpec;

/// LED controller transport candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedSection {
    pub animate: Vec<TransportSpec>,
    pub plain: Vec<TransportSpec>,
}

impl Default for LedSection {
    fn default() -> Self {
        let leds = LedConfig::default();
        Self {
            animate: leds.animate.candidates,
            plain: leds.plain.candidates,
        }
    }
}

/// Shooter motor transports and speed presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterSection {
    pub motor: Vec<TransportSpec>,
    pub presets: ShooterPresets,
}

impl Default for ShooterSection {
    fn default() -> Self {
        let shooter = ShooterConfig::default();
        Self {
            motor: shooter.motor.candidates,
            presets: shooter.presets,
        }
    }
}

/// Persisted configuration stored in `~/.tickwork/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Nominal tick period in milliseconds.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Scheduler faults kept for `/status`.
    #[serde(default = "default_fault_capacity")]
    pub fault_capacity: usize,

    #[serde(default)]
    pub leds: LedSection,

    #[serde(default)]
    pub shooter: ShooterSection,

    /// Transports the simulated hardware answers on.  Anything else fails
    /// to open, which is how missing cables are rehearsed.
    #[serde(default = "default_sim_available")]
    pub sim_available: Vec<TransportSpec>,
}

fn default_tick_period_ms() -> u64 {
    20
}
fn default_fault_capacity() -> usize {
    tickwork_kernel::DEFAULT_FAULT_CAPACITY
}
fn default_sim_available() -> Vec<TransportSpec> {
    vec![
        TransportSpec::usb("USB1"),
        TransportSpec::uart("MXP"),
        TransportSpec::can(10),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            fault_capacity: default_fault_capacity(),
            leds: LedSection::default(),
            shooter: ShooterSection::default(),
            sim_available: default_sim_available(),
        }
    }
}

impl Config {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    /// Robot wiring described by this configuration.  Device names are
    /// fixed; only their transports are configurable.
    pub fn robot_config(&self) -> RobotConfig {
        let leds = LedConfig::default();
        let shooter = ShooterConfig::default();
        RobotConfig {
            scheduler: SchedulerConfig {
                fault_capacity: self.fault_capacity,
            },
            leds: LedConfig {
                animate: DeviceConfig::new(leds.animate.name, self.leds.animate.clone()),
                plain: DeviceConfig::new(leds.plain.name, self.leds.plain.clone()),
            },
            shooter: ShooterConfig {
                motor: DeviceConfig::new(shooter.motor.name, self.shooter.motor.clone()),
                presets: self.shooter.presets,
            },
        }
    }
}

/// Return the path to `~/.tickwork/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tickwork").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `TICKWORK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TICKWORK_TICK_MS` | `tick_period_ms` (must be > 0) |
/// | `TICKWORK_FAULT_CAPACITY` | `fault_capacity` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TICKWORK_TICK_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
        && ms > 0
    {
        cfg.tick_period_ms = ms;
    }
    if let Ok(v) = std::env::var("TICKWORK_FAULT_CAPACITY")
        && let Ok(capacity) = v.trim().parse::<usize>()
    {
        cfg.fault_capacity = capacity;
    }
}

/// Save the config to disk, creating `~/.tickwork/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Env-var tests share process state.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
tick_period_ms = 10

[shooter.presets]
outtake = 1.0

[[leds.plain]]
kind = "uart"
address = "MXP"
bitrate = 230400
"#,
        )
        .unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.tick_period_ms, 10);
        assert_eq!(cfg.fault_capacity, 64);
        assert_eq!(cfg.shooter.presets.outtake, 1.0);
        assert_eq!(cfg.shooter.presets.hold, ShooterPresets::default().hold);
        assert_eq!(cfg.leds.plain, vec![TransportSpec::uart_at("MXP", 230_400)]);
        assert_eq!(cfg.leds.animate, vec![TransportSpec::usb("USB1")]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_period_ms = \"fast\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn config_path_points_to_tickwork_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.tickwork/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn env_overrides_tick_period_and_fault_capacity() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: serialised by ENV_LOCK.
        unsafe {
            std::env::set_var("TICKWORK_TICK_MS", "5");
            std::env::set_var("TICKWORK_FAULT_CAPACITY", "8");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("TICKWORK_TICK_MS");
            std::env::remove_var("TICKWORK_FAULT_CAPACITY");
        }
        assert_eq!(cfg.tick_period_ms, 5);
        assert_eq!(cfg.fault_capacity, 8);
    }

    #[test]
    fn env_overrides_ignore_invalid_values() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: serialised by ENV_LOCK.
        unsafe {
            std::env::set_var("TICKWORK_TICK_MS", "0");
            std::env::set_var("TICKWORK_FAULT_CAPACITY", "lots");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("TICKWORK_TICK_MS");
            std::env::remove_var("TICKWORK_FAULT_CAPACITY");
        }
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn robot_config_carries_transports_and_capacity() {
        let mut cfg = Config::default();
        cfg.fault_capacity = 3;
        cfg.shooter.motor = vec![TransportSpec::can(22)];

        let robot = cfg.robot_config();
        assert_eq!(robot.scheduler.fault_capacity, 3);
        assert_eq!(robot.shooter.motor.name, "shooter-motor");
        assert_eq!(robot.shooter.motor.candidates, vec![TransportSpec::can(22)]);
        assert_eq!(robot.leds.plain.candidates.len(), 3);
        assert_eq!(cfg.tick_period(), Duration::from_millis(20));
    }
}
