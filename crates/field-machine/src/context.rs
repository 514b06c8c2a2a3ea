//! Genre / venue / track-type context and the reference targets derived from it.
//!
//! Context only biases proposal targets and safety ceilings; it never touches
//! the measurement math.

/// Musical genre. Index order matches the UI combo box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Genre {
    #[default]
    Pop,
    Rock,
    Electronic,
    HipHop,
    Jazz,
    Classical,
}

impl Genre {
    pub const ALL: [Genre; 6] = [
        Genre::Pop,
        Genre::Rock,
        Genre::Electronic,
        Genre::HipHop,
        Genre::Jazz,
        Genre::Classical,
    ];

    /// Out-of-range indices fall back to the default.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Genre::Pop => "Pop",
            Genre::Rock => "Rock",
            Genre::Electronic => "Electronic",
            Genre::HipHop => "Hip-Hop",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
        }
    }
}

/// Where the mix will be heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Venue {
    #[default]
    Studio,
    Club,
    Streaming,
    Broadcast,
}

impl Venue {
    pub const ALL: [Venue; 4] = [Venue::Studio, Venue::Club, Venue::Streaming, Venue::Broadcast];

    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Venue::Studio => "Studio",
            Venue::Club => "Club",
            Venue::Streaming => "Streaming",
            Venue::Broadcast => "Broadcast",
        }
    }
}

/// What the plugin instance is inserted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TrackType {
    Vocal,
    Drums,
    Bass,
    #[default]
    Instrument,
    MixBus,
    Master,
}

impl TrackType {
    pub const ALL: [TrackType; 6] = [
        TrackType::Vocal,
        TrackType::Drums,
        TrackType::Bass,
        TrackType::Instrument,
        TrackType::MixBus,
        TrackType::Master,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackType::Vocal => "Vocal",
            TrackType::Drums => "Drums",
            TrackType::Bass => "Bass",
            TrackType::Instrument => "Instrument",
            TrackType::MixBus => "Mix Bus",
            TrackType::Master => "Master",
        }
    }

    /// Buses and masters never get automatic sends.
    pub fn is_bus(self) -> bool {
        matches!(self, TrackType::MixBus | TrackType::Master)
    }
}

/// UI selection supplied before a Learn session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Context {
    pub genre: Genre,
    pub venue: Venue,
    pub track: TrackType,
}

impl Context {
    pub fn new(genre: Genre, venue: Venue, track: TrackType) -> Self {
        Self {
            genre,
            venue,
            track,
        }
    }

    /// Build from combo-box indices.
    pub fn from_indices(genre: usize, venue: usize, track: usize) -> Self {
        Self::new(
            Genre::from_index(genre),
            Venue::from_index(venue),
            TrackType::from_index(track),
        )
    }

    pub fn targets(&self) -> Targets {
        Targets::from_context(self)
    }
}

/// Reference values for one session.
///
/// Width targets are mid/side ratios in [0, 1]; `width_max` is a ceiling on
/// the `width_hi` parameter itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Targets {
    /// Low-band correlation below which the low end counts as unstable.
    pub corr_floor: f64,
    pub width_low: f64,
    pub width_mid: f64,
    pub width_high: f64,
    pub width_max: f32,
    pub slope_target_db: f64,
    pub lf_rumble_max_db: f64,
    pub hf_fizz_max_db: f64,
    pub sibilance_max_db: f64,
    pub depth_min: f64,
    pub depth_max: f64,
    pub duck_depth_db: f64,
    pub duck_attack_ms: f64,
    pub duck_release_ms: f64,
    pub duck_threshold_db: f64,
    pub duck_ratio: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self::from_context(&Context::default())
    }
}

fn gate(max_db: f64) -> f64 {
    (0.5 + max_db / 12.0).clamp(0.05, 0.95)
}

impl Targets {
    pub fn from_context(context: &Context) -> Self {
        let mut t = match context.genre {
            Genre::Pop => Self::base(0.50, (0.10, 0.30, 0.45), 1.6, -3.0, (0.15, 0.45)),
            Genre::Rock => Self::base(0.55, (0.08, 0.28, 0.42), 1.5, -3.0, (0.10, 0.40)),
            Genre::Electronic => Self::base(0.60, (0.05, 0.35, 0.50), 1.8, -2.5, (0.15, 0.50)),
            Genre::HipHop => Self::base(0.65, (0.04, 0.30, 0.45), 1.6, -3.0, (0.10, 0.35)),
            Genre::Jazz => Self::base(0.45, (0.15, 0.32, 0.42), 1.5, -3.5, (0.20, 0.55)),
            Genre::Classical => Self::base(0.40, (0.20, 0.38, 0.48), 1.6, -4.0, (0.25, 0.65)),
        };

        match context.venue {
            Venue::Studio => {}
            Venue::Club => {
                t.corr_floor += 0.10;
                t.width_low = (t.width_low - 0.05).max(0.0);
                t.width_max -= 0.2;
                t.lf_rumble_max_db -= 1.5;
            }
            Venue::Streaming => {
                t.hf_fizz_max_db -= 1.0;
                t.sibilance_max_db -= 0.5;
            }
            Venue::Broadcast => {
                t.corr_floor += 0.05;
                t.width_max -= 0.3;
                t.depth_max -= 0.10;
            }
        }

        match context.track {
            TrackType::Vocal => {
                t.sibilance_max_db -= 2.0;
                t.width_low = (t.width_low - 0.03).max(0.0);
            }
            TrackType::Drums => {
                t.duck_attack_ms = 5.0;
                t.duck_release_ms = 180.0;
            }
            TrackType::Bass => {
                t.width_low = 0.03;
                t.corr_floor += 0.10;
            }
            TrackType::Instrument | TrackType::MixBus | TrackType::Master => {}
        }

        t
    }

    fn base(
        corr_floor: f64,
        (width_low, width_mid, width_high): (f64, f64, f64),
        width_max: f32,
        slope_target_db: f64,
        (depth_min, depth_max): (f64, f64),
    ) -> Self {
        Self {
            corr_floor,
            width_low,
            width_mid,
            width_high,
            width_max,
            slope_target_db,
            lf_rumble_max_db: 1.0,
            hf_fizz_max_db: -2.5,
            sibilance_max_db: -2.0,
            depth_min,
            depth_max,
            duck_depth_db: 6.0,
            duck_attack_ms: 10.0,
            duck_release_ms: 250.0,
            duck_threshold_db: -24.0,
            duck_ratio: 3.0,
        }
    }

    /// Rumble ratio (20-40 Hz vs 80-160 Hz) above which a high-pass is proposed.
    pub fn rumble_gate(&self) -> f64 {
        gate(self.lf_rumble_max_db)
    }

    pub fn fizz_gate(&self) -> f64 {
        gate(self.hf_fizz_max_db)
    }

    pub fn sibilance_gate(&self) -> f64 {
        gate(self.sibilance_max_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_index_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(Genre::from_index(genre.index()), genre);
        }
        for track in TrackType::ALL {
            assert_eq!(TrackType::from_index(track.index()), track);
        }
        assert_eq!(Venue::from_index(99), Venue::Studio);
    }

    #[test]
    fn test_from_indices() {
        let ctx = Context::from_indices(2, 1, 4);
        assert_eq!(ctx.genre, Genre::Electronic);
        assert_eq!(ctx.venue, Venue::Club);
        assert_eq!(ctx.track, TrackType::MixBus);
        assert!(ctx.track.is_bus());
        assert_eq!(ctx.track.name(), "Mix Bus");
    }

    #[test]
    fn test_default_targets() {
        let t = Targets::default();
        assert_eq!(t.slope_target_db, -3.0);
        assert!(t.depth_min < t.depth_max);
        assert!(t.width_max > 1.0);
    }

    #[test]
    fn test_gates_in_range() {
        for genre in Genre::ALL {
            for venue in Venue::ALL {
                for track in TrackType::ALL {
                    let t = Targets::from_context(&Context::new(genre, venue, track));
                    for g in [t.rumble_gate(), t.fizz_gate(), t.sibilance_gate()] {
                        assert!((0.05..=0.95).contains(&g));
                    }
                    assert!(t.depth_min >= 0.0 && t.depth_max <= 1.0);
                    assert!(t.depth_min <= t.depth_max);
                    assert!(t.width_max >= 1.0 && t.width_max <= 2.0);
                }
            }
        }
    }

    #[test]
    fn test_default_gate_values() {
        let t = Targets::default();
        assert_relative_eq!(t.rumble_gate(), 0.5 + 1.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(t.fizz_gate(), 0.5 - 2.5 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(t.sibilance_gate(), 0.5 - 2.0 / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_club_tightens_low_end() {
        let studio = Targets::from_context(&Context::new(Genre::Pop, Venue::Studio, TrackType::Instrument));
        let club = Targets::from_context(&Context::new(Genre::Pop, Venue::Club, TrackType::Instrument));
        assert!(club.corr_floor > studio.corr_floor);
        assert!(club.rumble_gate() < studio.rumble_gate());
    }
}
