use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const METRONOME_SUFFIX: &str = "_metronome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Metronome,
    Mixed,
    BeatGrid,
}

impl Artifact {
    pub const ALL: [Self; 3] = [Self::Metronome, Self::Mixed, Self::BeatGrid];

    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Metronome => ".wav",
            Self::Mixed => "_mixed.wav",
            Self::BeatGrid => "_beat_grid.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNames {
    pub metronome: PathBuf,
    pub mixed: PathBuf,
    pub beat_grid: PathBuf,
}

impl OutputNames {
    #[must_use]
    pub fn for_stem(output_dir: &Path, stem: &str) -> Self {
        Self::for_base(output_dir, &format!("{stem}{METRONOME_SUFFIX}"))
    }

    #[must_use]
    pub fn for_metronome_file(output_dir: &Path, file_name: &Path) -> Self {
        let base = stem_of(file_name).unwrap_or_else(|| "metronome".to_string());
        let mut names = Self::for_base(output_dir, &base);
        if let Some(name) = file_name.file_name() {
            names.metronome = output_dir.join(name);
        }
        names
    }

    #[must_use]
    pub fn path(&self, artifact: Artifact) -> &Path {
        match artifact {
            Artifact::Metronome => &self.metronome,
            Artifact::Mixed => &self.mixed,
            Artifact::BeatGrid => &self.beat_grid,
        }
    }

    fn for_base(output_dir: &Path, base: &str) -> Self {
        let join = |artifact: Artifact| output_dir.join(format!("{base}{}", artifact.suffix()));
        Self {
            metronome: join(Artifact::Metronome),
            mixed: join(Artifact::Mixed),
            beat_grid: join(Artifact::BeatGrid),
        }
    }
}

#[must_use]
pub fn stem_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|value| value.to_str())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
