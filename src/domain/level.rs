//! Course level catalog.

/// One selectable course level
pub struct Level {
  /// Identifier the backend expects (e.g. "초급1")
  pub id: &'static str,
  pub title: &'static str,
  pub topik: &'static str,
  /// Directory holding this level's bundled audio
  pub audio_dir: &'static str,
}

/// All levels, easiest first
pub static LEVELS: [Level; 6] = [
  Level {
    id: "초급1",
    title: "초급 1",
    topik: "TOPIK 1급",
    audio_dir: "level1",
  },
  Level {
    id: "초급2",
    title: "초급 2",
    topik: "TOPIK 2급",
    audio_dir: "level2",
  },
  Level {
    id: "중급1",
    title: "중급 1",
    topik: "TOPIK 3급",
    audio_dir: "level3",
  },
  Level {
    id: "중급2",
    title: "중급 2",
    topik: "TOPIK 4급",
    audio_dir: "level4",
  },
  Level {
    id: "고급1",
    title: "고급 1",
    topik: "TOPIK 5급",
    audio_dir: "level5",
  },
  Level {
    id: "고급2",
    title: "고급 2",
    topik: "TOPIK 6급",
    audio_dir: "level6",
  },
];

/// Look up a level by id
pub fn find_level(id: &str) -> Option<&'static Level> {
  LEVELS.iter().find(|l| l.id == id)
}

/// Audio directory for a level, defaulting to the first level's
pub fn audio_dir_for(id: &str) -> &'static str {
  find_level(id).map(|l| l.audio_dir).unwrap_or(LEVELS[0].audio_dir)
}
