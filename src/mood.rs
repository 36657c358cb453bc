//! Mood labels and the audio-feature targets they map to.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Mood used when the request names none, or one we do not know.
pub const DEFAULT_MOOD: Mood = Mood::Energetic;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Calm,
    Energetic,
    Happy,
    Sad,
    Melancholic,
    ConquerTheWorld,
    Random,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Energetic,
        Mood::Calm,
        Mood::Happy,
        Mood::Sad,
        Mood::Melancholic,
        Mood::ConquerTheWorld,
        Mood::Random,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Energetic => "energetic",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Melancholic => "melancholic",
            Self::ConquerTheWorld => "going to conquer the world",
            Self::Random => "random",
        }
    }

    /// Target parameters for this mood. `Random` draws fresh values on every call.
    pub fn profile(self) -> MoodProfile {
        match self {
            Self::Calm => MoodProfile::new(0.2, 0.2).with_tempo(80.0),
            Self::Energetic => MoodProfile::new(0.8, 0.9).with_tempo(150.0),
            Self::Happy => MoodProfile::new(0.9, 0.7),
            Self::Sad => MoodProfile::new(0.1, 0.2),
            Self::Melancholic => MoodProfile::new(0.3, 0.3),
            Self::ConquerTheWorld => MoodProfile::new(0.8, 0.9).with_danceability(0.8),
            Self::Random => {
                let mut rng = rand::rng();
                MoodProfile::new(rng.random_range(0.0..=1.0), rng.random_range(0.0..=1.0))
            }
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown mood: {0:?}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.label() == normalized)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Target audio features passed to the recommendations endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoodProfile {
    pub valence: f32,
    pub energy: f32,
    pub tempo: Option<f32>,
    pub danceability: Option<f32>,
}

impl MoodProfile {
    fn new(valence: f32, energy: f32) -> Self {
        Self {
            valence,
            energy,
            tempo: None,
            danceability: None,
        }
    }

    fn with_tempo(mut self, tempo: f32) -> Self {
        self.tempo = Some(tempo);
        self
    }

    fn with_danceability(mut self, danceability: f32) -> Self {
        self.danceability = Some(danceability);
        self
    }

    /// `target_*` query pairs, only for the parameters this profile sets.
    pub fn query_params(&self) -> Vec<(&'static str, f32)> {
        let mut params = vec![
            ("target_valence", self.valence),
            ("target_energy", self.energy),
        ];
        if let Some(tempo) = self.tempo {
            params.push(("target_tempo", tempo));
        }
        if let Some(danceability) = self.danceability {
            params.push(("target_danceability", danceability));
        }
        params
    }
}

/// Resolve a free-form label to a mood, falling back to [`DEFAULT_MOOD`].
pub fn resolve(label: Option<&str>) -> Mood {
    let Some(label) = label.filter(|l| !l.trim().is_empty()) else {
        return DEFAULT_MOOD;
    };
    label.parse().unwrap_or_else(|e: UnknownMood| {
        tracing::warn!(error = %e, fallback = %DEFAULT_MOOD, "unrecognized mood label");
        DEFAULT_MOOD
    })
}
