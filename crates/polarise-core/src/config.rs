//! Configuration loading and typed config structures for Polarise.
//!
//! The canonical configuration lives in `polarise-config.yaml` at the project
//! root. Every tunable the simulation reads (radii, forces, thresholds,
//! rates, durations) is a field here with a default, so an empty file is a
//! valid configuration and individual values can be overridden piecemeal.

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding `session.seed`.
pub const SEED_ENV_VAR: &str = "POLARISE_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot drive the simulation.
    #[error("invalid config: {reason}")]
    Invalid {
        /// Which value was rejected and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `polarise-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Planet geometry.
    #[serde(default)]
    pub planet: PlanetConfig,

    /// Player movement.
    #[serde(default)]
    pub player: PlayerConfig,

    /// NPC population and motion.
    #[serde(default)]
    pub npc: NpcConfig,

    /// Flocking radii and weights.
    #[serde(default)]
    pub flocking: FlockingConfig,

    /// Player-NPC interaction rules.
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Crowd detection.
    #[serde(default)]
    pub crowd: CrowdConfig,

    /// Meter initial values and rates.
    #[serde(default)]
    pub meters: MetersConfig,

    /// Win/lose thresholds and durations.
    #[serde(default)]
    pub win_conditions: WinConditionsConfig,

    /// Score weights.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Police pursuit.
    #[serde(default)]
    pub police: PoliceConfig,

    /// Frame clock and simulation lane.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Headless session bounds.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `POLARISE_SEED` overrides `session.seed` when set to a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`Self::validate`] rejects it.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.session.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the clock or the agents cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("planet.radius", self.planet.radius)?;
        positive("timing.logic_hz", self.timing.logic_hz)?;
        positive("timing.max_frame_dt", self.timing.max_frame_dt)?;
        finite("police.min_altitude", self.police.min_altitude)?;
        finite("police.max_altitude", self.police.max_altitude)?;
        finite("police.max_retreat_distance", self.police.max_retreat_distance)?;
        if self.police.min_altitude > self.police.max_altitude {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "police.min_altitude ({}) exceeds police.max_altitude ({})",
                    self.police.min_altitude, self.police.max_altitude
                ),
            });
        }
        Ok(())
    }

    /// Radius of the player's shell.
    pub fn player_radius(&self) -> f32 {
        self.planet.radius + self.player.surface_offset
    }

    /// Radius of the NPC shell.
    pub fn npc_radius(&self) -> f32 {
        self.planet.radius + self.npc.half_height
    }
}

/// Planet geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanetConfig {
    /// Surface radius.
    #[serde(default = "default_planet_radius")]
    pub radius: f32,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: default_planet_radius(),
        }
    }
}

/// Player movement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// Height of the player's shell above the surface.
    #[serde(default = "default_player_surface_offset")]
    pub surface_offset: f32,

    /// Surface speed in units per second.
    #[serde(default = "default_player_speed")]
    pub speed: f32,

    /// Collision diameter used for player-NPC overlap.
    #[serde(default = "default_player_size")]
    pub size: f32,

    /// Start direction from the planet center; normalised onto the shell.
    #[serde(default = "default_player_start")]
    pub start_direction: [f32; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            surface_offset: default_player_surface_offset(),
            speed: default_player_speed(),
            size: default_player_size(),
            start_direction: default_player_start(),
        }
    }
}

/// NPC population and motion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NpcConfig {
    /// NPCs per mask group.
    #[serde(default = "default_group_size")]
    pub group_size: u32,

    /// Height of the NPC shell above the surface.
    #[serde(default = "default_npc_half_height")]
    pub half_height: f32,

    /// Collision diameter; overlapping NPCs are pushed to this separation.
    #[serde(default = "default_npc_size")]
    pub size: f32,

    /// Members spawn within this arc distance of their group center.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,

    /// Minimum chord distance between group spawn centers.
    #[serde(default = "default_min_group_distance")]
    pub min_group_distance: f32,

    /// Upper bound on spawn-center relaxation passes.
    #[serde(default = "default_relax_iterations")]
    pub relax_max_iterations: u32,

    /// Relaxation stops once a pass moves centers less than this in total.
    #[serde(default = "default_relax_epsilon")]
    pub relax_epsilon: f32,

    /// Base maximum speed.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,

    /// Extra maximum speed scaled by personality energy.
    #[serde(default = "default_speed_variation")]
    pub speed_variation: f32,

    /// Cap on the summed steering force.
    #[serde(default = "default_max_force")]
    pub max_force: f32,

    /// Multiplicative velocity damping per simulation tick.
    #[serde(default = "default_friction")]
    pub friction: f32,

    /// Extra damping applied while idle.
    #[serde(default = "default_idle_damping")]
    pub idle_damping: f32,

    /// Wander targets are picked within this arc distance.
    #[serde(default = "default_wander_radius")]
    pub wander_radius: f32,

    /// A wander target closer than this counts as reached.
    #[serde(default = "default_wander_reach_distance")]
    pub wander_reach_distance: f32,

    /// Magnitude of the random jitter applied outside Wandering.
    #[serde(default = "default_wander_jitter")]
    pub wander_jitter: f32,

    /// Per-second probability of changing state once the dwell time passed.
    #[serde(default = "default_transition_rate")]
    pub transition_rate: f32,

    /// Lower bound of the per-NPC minimum dwell time.
    #[serde(default = "default_min_state_duration")]
    pub min_state_duration: f32,

    /// Upper bound of the per-NPC minimum dwell time.
    #[serde(default = "default_max_state_duration")]
    pub max_state_duration: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            half_height: default_npc_half_height(),
            size: default_npc_size(),
            spawn_radius: default_spawn_radius(),
            min_group_distance: default_min_group_distance(),
            relax_max_iterations: default_relax_iterations(),
            relax_epsilon: default_relax_epsilon(),
            base_speed: default_base_speed(),
            speed_variation: default_speed_variation(),
            max_force: default_max_force(),
            friction: default_friction(),
            idle_damping: default_idle_damping(),
            wander_radius: default_wander_radius(),
            wander_reach_distance: default_wander_reach_distance(),
            wander_jitter: default_wander_jitter(),
            transition_rate: default_transition_rate(),
            min_state_duration: default_min_state_duration(),
            max_state_duration: default_max_state_duration(),
        }
    }
}

/// Flocking radii and weights.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlockingConfig {
    /// Separation considers every NPC within this distance.
    #[serde(default = "default_separation_radius")]
    pub separation_radius: f32,

    /// Alignment considers same-group NPCs within this distance.
    #[serde(default = "default_alignment_radius")]
    pub alignment_radius: f32,

    /// Cohesion considers same-group NPCs within this distance.
    #[serde(default = "default_cohesion_radius")]
    pub cohesion_radius: f32,

    /// Inter-group repulsion considers other-group NPCs within this distance.
    #[serde(default = "default_intergroup_distance")]
    pub intergroup_distance: f32,

    /// The masked player influences NPCs within this distance.
    #[serde(default = "default_influence_radius")]
    pub influence_radius: f32,

    /// Separation weight.
    #[serde(default = "default_separation_weight")]
    pub separation_weight: f32,

    /// Alignment weight.
    #[serde(default = "default_alignment_weight")]
    pub alignment_weight: f32,

    /// Cohesion weight.
    #[serde(default = "default_cohesion_weight")]
    pub cohesion_weight: f32,

    /// Inter-group repulsion weight.
    #[serde(default = "default_intergroup_weight")]
    pub intergroup_weight: f32,

    /// Wander weight.
    #[serde(default = "default_wander_weight")]
    pub wander_weight: f32,

    /// Gathering weight.
    #[serde(default = "default_gathering_weight")]
    pub gathering_weight: f32,

    /// Player influence weight.
    #[serde(default = "default_player_influence_weight")]
    pub player_influence_weight: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            separation_radius: default_separation_radius(),
            alignment_radius: default_alignment_radius(),
            cohesion_radius: default_cohesion_radius(),
            intergroup_distance: default_intergroup_distance(),
            influence_radius: default_influence_radius(),
            separation_weight: default_separation_weight(),
            alignment_weight: default_alignment_weight(),
            cohesion_weight: default_cohesion_weight(),
            intergroup_weight: default_intergroup_weight(),
            wander_weight: default_wander_weight(),
            gathering_weight: default_gathering_weight(),
            player_influence_weight: default_player_influence_weight(),
        }
    }
}

/// Player-NPC interaction rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionConfig {
    /// The player interacts with NPCs within this distance.
    #[serde(default = "default_interaction_radius")]
    pub radius: f32,

    /// Seconds before the same NPC can interact again.
    #[serde(default = "default_interaction_cooldown")]
    pub cooldown: f32,

    /// Outrage removed by a same-mask interaction.
    #[serde(default = "default_same_mask_outrage")]
    pub same_mask_outrage: f32,

    /// Energy gained by a same-mask interaction.
    #[serde(default = "default_same_mask_energy")]
    pub same_mask_energy: f32,

    /// Outrage added by a different-mask interaction.
    #[serde(default = "default_different_mask_outrage")]
    pub different_mask_outrage: f32,

    /// Energy lost by a different-mask interaction.
    #[serde(default = "default_different_mask_energy")]
    pub different_mask_energy: f32,

    /// Change in NPC player-influence per masked interaction.
    #[serde(default = "default_influence_step")]
    pub influence_step: f32,

    /// Fraction of influence removed by a neutral interaction.
    #[serde(default = "default_neutral_influence_decay")]
    pub neutral_influence_decay: f32,

    /// Influence magnitude at which an NPC counts as polarised.
    #[serde(default = "default_polarisation_threshold")]
    pub polarisation_threshold: f32,

    /// Alignment/cohesion multiplier after a same-mask interaction.
    #[serde(default = "default_flocking_boost")]
    pub flocking_boost: f32,

    /// Seconds the flocking boost lasts.
    #[serde(default = "default_flocking_boost_duration")]
    pub flocking_boost_duration: f32,

    /// Separation/repulsion multiplier after a different-mask interaction.
    #[serde(default = "default_separation_boost")]
    pub separation_boost: f32,

    /// Seconds the separation boost lasts.
    #[serde(default = "default_separation_boost_duration")]
    pub separation_boost_duration: f32,

    /// Boosts spread to same-group NPCs within this distance.
    #[serde(default = "default_boost_propagation_radius")]
    pub boost_propagation_radius: f32,

    /// Fraction of the player-NPC overlap corrected per frame.
    #[serde(default = "default_push_strength")]
    pub push_strength: f32,

    /// Velocity added to an NPC pushed by the player.
    #[serde(default = "default_push_velocity")]
    pub push_velocity: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            radius: default_interaction_radius(),
            cooldown: default_interaction_cooldown(),
            same_mask_outrage: default_same_mask_outrage(),
            same_mask_energy: default_same_mask_energy(),
            different_mask_outrage: default_different_mask_outrage(),
            different_mask_energy: default_different_mask_energy(),
            influence_step: default_influence_step(),
            neutral_influence_decay: default_neutral_influence_decay(),
            polarisation_threshold: default_polarisation_threshold(),
            flocking_boost: default_flocking_boost(),
            flocking_boost_duration: default_flocking_boost_duration(),
            separation_boost: default_separation_boost(),
            separation_boost_duration: default_separation_boost_duration(),
            boost_propagation_radius: default_boost_propagation_radius(),
            push_strength: default_push_strength(),
            push_velocity: default_push_velocity(),
        }
    }
}

/// Crowd detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrowdConfig {
    /// NPCs within this distance of the player count toward the crowd.
    #[serde(default = "default_crowd_radius")]
    pub radius: f32,

    /// Minimum nearby NPCs for the player to be in a crowd.
    #[serde(default = "default_min_crowd_size")]
    pub min_size: u32,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            radius: default_crowd_radius(),
            min_size: default_min_crowd_size(),
        }
    }
}

/// Meter initial values and rates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetersConfig {
    /// Outrage at game start.
    #[serde(default = "default_initial_outrage")]
    pub initial_outrage: f32,

    /// Energy at game start.
    #[serde(default = "default_initial_energy")]
    pub initial_energy: f32,

    /// Outrage lost per second while not in a crowd.
    #[serde(default = "default_outrage_decay_rate")]
    pub outrage_decay_rate: f32,

    /// Outrage gained per second in a wrong crowd.
    #[serde(default = "default_wrong_crowd_outrage_rate")]
    pub wrong_crowd_outrage_rate: f32,

    /// Energy lost per second in a wrong crowd.
    #[serde(default = "default_wrong_crowd_energy_drain")]
    pub wrong_crowd_energy_drain: f32,

    /// Outrage lost per second in a correct crowd.
    #[serde(default = "default_correct_crowd_outrage_rate")]
    pub correct_crowd_outrage_rate: f32,

    /// Energy gained per second in a correct crowd.
    #[serde(default = "default_correct_crowd_energy_regen")]
    pub correct_crowd_energy_regen: f32,

    /// Energy lost per second while wearing any mask (0 disables).
    #[serde(default = "default_mask_energy_drain_rate")]
    pub mask_energy_drain_rate: f32,
}

impl Default for MetersConfig {
    fn default() -> Self {
        Self {
            initial_outrage: default_initial_outrage(),
            initial_energy: default_initial_energy(),
            outrage_decay_rate: default_outrage_decay_rate(),
            wrong_crowd_outrage_rate: default_wrong_crowd_outrage_rate(),
            wrong_crowd_energy_drain: default_wrong_crowd_energy_drain(),
            correct_crowd_outrage_rate: default_correct_crowd_outrage_rate(),
            correct_crowd_energy_regen: default_correct_crowd_energy_regen(),
            mask_energy_drain_rate: default_mask_energy_drain_rate(),
        }
    }
}

/// Win/lose thresholds and durations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WinConditionsConfig {
    /// Outrage strictly below this advances the adult timer.
    #[serde(default = "default_adult_threshold")]
    pub adult_threshold: f32,

    /// Seconds below the adult threshold that end the game.
    #[serde(default = "default_adult_time_required")]
    pub adult_time_required: f32,

    /// Outrage at or above this advances the chaos timer.
    #[serde(default = "default_chaos_threshold")]
    pub chaos_threshold: f32,

    /// Seconds at the chaos threshold that end the game.
    #[serde(default = "default_chaos_time_required")]
    pub chaos_time_required: f32,

    /// Seconds with zero energy that end the game.
    #[serde(default = "default_energy_depleted_time_required")]
    pub energy_depleted_time_required: f32,
}

impl Default for WinConditionsConfig {
    fn default() -> Self {
        Self {
            adult_threshold: default_adult_threshold(),
            adult_time_required: default_adult_time_required(),
            chaos_threshold: default_chaos_threshold(),
            chaos_time_required: default_chaos_time_required(),
            energy_depleted_time_required: default_energy_depleted_time_required(),
        }
    }
}

/// Score weights: `game_time * alpha + polarised_people * beta`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringConfig {
    /// Points per second survived.
    #[serde(default = "default_score_alpha")]
    pub alpha: f32,

    /// Points per polarised NPC.
    #[serde(default = "default_score_beta")]
    pub beta: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: default_score_alpha(),
            beta: default_score_beta(),
        }
    }
}

/// Police pursuit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoliceConfig {
    /// Outrage at or above this activates pursuit.
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f32,

    /// Maximum drones alive at once.
    #[serde(default = "default_max_drones")]
    pub max_drones: u32,

    /// Seconds between drone spawns while active.
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f32,

    /// Seconds between new patrol targets while searching.
    #[serde(default = "default_search_interval")]
    pub search_interval: f32,

    /// A drone spots the player within this distance.
    #[serde(default = "default_detection_radius")]
    pub detection_radius: f32,

    /// A pursuing drone catches the player within this distance.
    #[serde(default = "default_catch_radius")]
    pub catch_radius: f32,

    /// Pursuit ends beyond `detection_radius * lose_sight_factor`.
    #[serde(default = "default_lose_sight_factor")]
    pub lose_sight_factor: f32,

    /// Drone cruise speed.
    #[serde(default = "default_drone_speed")]
    pub speed: f32,

    /// Steering acceleration toward the desired velocity.
    #[serde(default = "default_drone_steering")]
    pub steering: f32,

    /// Multiplicative velocity damping per frame.
    #[serde(default = "default_drone_drag")]
    pub drag: f32,

    /// Lowest patrol altitude above the surface.
    #[serde(default = "default_min_altitude")]
    pub min_altitude: f32,

    /// Highest patrol altitude above the surface.
    #[serde(default = "default_max_altitude")]
    pub max_altitude: f32,

    /// Retreating drones are destroyed this far above the surface.
    #[serde(default = "default_max_retreat_distance")]
    pub max_retreat_distance: f32,
}

impl Default for PoliceConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            max_drones: default_max_drones(),
            spawn_interval: default_spawn_interval(),
            search_interval: default_search_interval(),
            detection_radius: default_detection_radius(),
            catch_radius: default_catch_radius(),
            lose_sight_factor: default_lose_sight_factor(),
            speed: default_drone_speed(),
            steering: default_drone_steering(),
            drag: default_drone_drag(),
            min_altitude: default_min_altitude(),
            max_altitude: default_max_altitude(),
            max_retreat_distance: default_max_retreat_distance(),
        }
    }
}

/// Frame clock and simulation lane.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Simulation-lane frequency in hertz.
    #[serde(default = "default_logic_hz")]
    pub logic_hz: f32,

    /// Maximum simulation steps run for a single frame.
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,

    /// Longest frame delta accepted; longer frames are clamped.
    #[serde(default = "default_max_frame_dt")]
    pub max_frame_dt: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            logic_hz: default_logic_hz(),
            max_steps_per_frame: default_max_steps_per_frame(),
            max_frame_dt: default_max_frame_dt(),
        }
    }
}

/// Headless session bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Random seed for spawn placement and NPC behaviour.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Simulated seconds per frame.
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,

    /// Real-time milliseconds slept between frames (0 runs flat out).
    #[serde(default)]
    pub frame_interval_ms: u64,

    /// Maximum frames (0 = unlimited).
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Start a new round after game over instead of ending the session.
    #[serde(default)]
    pub auto_restart: bool,
}

impl SessionConfig {
    /// Override fields from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            frame_dt: default_frame_dt(),
            frame_interval_ms: 0,
            max_frames: default_max_frames(),
            max_real_time_seconds: 0,
            auto_restart: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Log a HUD line every N frames (0 disables).
    #[serde(default = "default_hud_interval_frames")]
    pub hud_interval_frames: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            hud_interval_frames: default_hud_interval_frames(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_planet_radius() -> f32 {
    50.0
}

const fn default_player_surface_offset() -> f32 {
    0.5
}

const fn default_player_speed() -> f32 {
    8.0
}

const fn default_player_size() -> f32 {
    1.0
}

const fn default_player_start() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

const fn default_group_size() -> u32 {
    40
}

const fn default_npc_half_height() -> f32 {
    0.5
}

const fn default_npc_size() -> f32 {
    1.0
}

const fn default_spawn_radius() -> f32 {
    8.0
}

const fn default_min_group_distance() -> f32 {
    30.0
}

const fn default_relax_iterations() -> u32 {
    100
}

const fn default_relax_epsilon() -> f32 {
    0.01
}

const fn default_base_speed() -> f32 {
    2.0
}

const fn default_speed_variation() -> f32 {
    0.5
}

const fn default_max_force() -> f32 {
    5.0
}

const fn default_friction() -> f32 {
    0.95
}

const fn default_idle_damping() -> f32 {
    0.8
}

const fn default_wander_radius() -> f32 {
    6.0
}

const fn default_wander_reach_distance() -> f32 {
    1.0
}

const fn default_wander_jitter() -> f32 {
    0.3
}

const fn default_transition_rate() -> f32 {
    0.3
}

const fn default_min_state_duration() -> f32 {
    2.0
}

const fn default_max_state_duration() -> f32 {
    5.0
}

const fn default_separation_radius() -> f32 {
    2.0
}

const fn default_alignment_radius() -> f32 {
    5.0
}

const fn default_cohesion_radius() -> f32 {
    6.0
}

const fn default_intergroup_distance() -> f32 {
    3.0
}

const fn default_influence_radius() -> f32 {
    10.0
}

const fn default_separation_weight() -> f32 {
    1.5
}

const fn default_alignment_weight() -> f32 {
    1.0
}

const fn default_cohesion_weight() -> f32 {
    1.0
}

const fn default_intergroup_weight() -> f32 {
    2.0
}

const fn default_wander_weight() -> f32 {
    0.5
}

const fn default_gathering_weight() -> f32 {
    0.8
}

const fn default_player_influence_weight() -> f32 {
    2.0
}

const fn default_interaction_radius() -> f32 {
    3.0
}

const fn default_interaction_cooldown() -> f32 {
    0.5
}

const fn default_same_mask_outrage() -> f32 {
    2.0
}

const fn default_same_mask_energy() -> f32 {
    1.0
}

const fn default_different_mask_outrage() -> f32 {
    3.0
}

const fn default_different_mask_energy() -> f32 {
    2.0
}

const fn default_influence_step() -> f32 {
    0.1
}

const fn default_neutral_influence_decay() -> f32 {
    0.1
}

const fn default_polarisation_threshold() -> f32 {
    0.8
}

const fn default_flocking_boost() -> f32 {
    2.0
}

const fn default_flocking_boost_duration() -> f32 {
    3.0
}

const fn default_separation_boost() -> f32 {
    2.5
}

const fn default_separation_boost_duration() -> f32 {
    2.0
}

const fn default_boost_propagation_radius() -> f32 {
    5.0
}

const fn default_push_strength() -> f32 {
    0.5
}

const fn default_push_velocity() -> f32 {
    2.0
}

const fn default_crowd_radius() -> f32 {
    8.0
}

const fn default_min_crowd_size() -> u32 {
    5
}

const fn default_initial_outrage() -> f32 {
    30.0
}

const fn default_initial_energy() -> f32 {
    100.0
}

const fn default_outrage_decay_rate() -> f32 {
    1.0
}

const fn default_wrong_crowd_outrage_rate() -> f32 {
    2.0
}

const fn default_wrong_crowd_energy_drain() -> f32 {
    3.0
}

const fn default_correct_crowd_outrage_rate() -> f32 {
    1.5
}

const fn default_correct_crowd_energy_regen() -> f32 {
    2.0
}

const fn default_mask_energy_drain_rate() -> f32 {
    0.5
}

const fn default_adult_threshold() -> f32 {
    10.0
}

const fn default_adult_time_required() -> f32 {
    30.0
}

const fn default_chaos_threshold() -> f32 {
    100.0
}

const fn default_chaos_time_required() -> f32 {
    10.0
}

const fn default_energy_depleted_time_required() -> f32 {
    5.0
}

const fn default_score_alpha() -> f32 {
    1.0
}

const fn default_score_beta() -> f32 {
    10.0
}

const fn default_activation_threshold() -> f32 {
    90.0
}

const fn default_max_drones() -> u32 {
    5
}

const fn default_spawn_interval() -> f32 {
    2.0
}

const fn default_search_interval() -> f32 {
    4.0
}

const fn default_detection_radius() -> f32 {
    20.0
}

const fn default_catch_radius() -> f32 {
    2.5
}

const fn default_lose_sight_factor() -> f32 {
    1.5
}

const fn default_drone_speed() -> f32 {
    12.0
}

const fn default_drone_steering() -> f32 {
    8.0
}

const fn default_drone_drag() -> f32 {
    0.98
}

const fn default_min_altitude() -> f32 {
    4.0
}

const fn default_max_altitude() -> f32 {
    10.0
}

const fn default_max_retreat_distance() -> f32 {
    60.0
}

const fn default_logic_hz() -> f32 {
    10.0
}

const fn default_max_steps_per_frame() -> u32 {
    5
}

const fn default_max_frame_dt() -> f32 {
    0.25
}

const fn default_seed() -> u64 {
    42
}

const fn default_frame_dt() -> f32 {
    1.0 / 60.0
}

const fn default_max_frames() -> u64 {
    36_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_hud_interval_frames() -> u64 {
    60
}
