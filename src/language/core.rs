use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    fn from_json(text: &str) -> EngineResult<Self> {
        let mut lang: Language = from_str(text)?;
        lang.words.retain(|w| !w.trim().is_empty());
        if lang.words.is_empty() {
            return Err(EngineError::EmptyWordList);
        }
        Ok(lang)
    }
}

/// Supplies the word list a round draws from.
pub trait WordSource {
    /// The list registered under `id`, never empty.
    fn active_list(&self, id: &str) -> EngineResult<Language>;
}

/// Word lists compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledWords;

impl BundledWords {
    pub fn ids() -> Vec<String> {
        let mut ids: Vec<String> = LANG_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|stem| stem.to_str())
            .map(str::to_string)
            .collect();
        ids.sort();
        ids
    }
}

impl WordSource for BundledWords {
    fn active_list(&self, id: &str) -> EngineResult<Language> {
        let file = LANG_DIR
            .get_file(format!("{id}.json"))
            .ok_or_else(|| EngineError::UnknownWordList(id.to_string()))?;
        let text = file
            .contents_utf8()
            .ok_or_else(|| EngineError::UnknownWordList(id.to_string()))?;
        Language::from_json(text)
    }
}

/// Word lists read from `<dir>/<id>.json` on disk.
#[derive(Debug, Clone)]
pub struct FileWords {
    dir: PathBuf,
}

impl FileWords {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl WordSource for FileWords {
    fn active_list(&self, id: &str) -> EngineResult<Language> {
        let path = self.dir.join(format!("{id}.json"));
        if !path.exists() {
            return Err(EngineError::UnknownWordList(id.to_string()));
        }
        debug!(path = %path.display(), "loading word list from disk");
        Language::from_json(&fs::read_to_string(path)?)
    }
}

/// Tries each source in order, returning the first list found.
pub struct ChainedWords {
    sources: Vec<Box<dyn WordSource>>,
}

impl ChainedWords {
    pub fn new(sources: Vec<Box<dyn WordSource>>) -> Self {
        Self { sources }
    }
}

impl WordSource for ChainedWords {
    fn active_list(&self, id: &str) -> EngineResult<Language> {
        for source in &self.sources {
            match source.active_list(id) {
                Err(EngineError::UnknownWordList(_)) => continue,
                other => return other,
            }
        }
        Err(EngineError::UnknownWordList(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bundled_english() {
        let lang = BundledWords.active_list("english").unwrap();

        assert_eq!(lang.name, "english");
        assert!(!lang.words.is_empty());
        assert!(lang.size > 0);
    }

    #[test]
    fn bundled_ids() {
        let ids = BundledWords::ids();
        assert!(ids.contains(&"english".to_string()));
        assert!(ids.contains(&"programming".to_string()));
    }

    #[test]
    fn unknown_bundled_list() {
        assert!(matches!(
            BundledWords.active_list("klingon"),
            Err(EngineError::UnknownWordList(id)) if id == "klingon"
        ));
    }

    #[test]
    fn language_deserialization_drops_blank_words() {
        let json_data = r#"
        {
            "name": "test",
            "size": 4,
            "words": ["hello", "world", " ", "test"]
        }
        "#;

        let lang = Language::from_json(json_data).unwrap();

        assert_eq!(lang.name, "test");
        assert_eq!(lang.words, vec!["hello", "world", "test"]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let json_data = r#"{ "name": "none", "size": 0, "words": [] }"#;
        assert!(matches!(
            Language::from_json(json_data),
            Err(EngineError::EmptyWordList)
        ));
    }

    #[test]
    fn file_words_and_chain() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pets.json"),
            r#"{ "name": "pets", "size": 2, "words": ["cat", "dog"] }"#,
        )
        .unwrap();

        let chain = ChainedWords::new(vec![
            Box::new(FileWords::new(dir.path())),
            Box::new(BundledWords),
        ]);
        assert_eq!(chain.active_list("pets").unwrap().words, vec!["cat", "dog"]);
        assert_eq!(chain.active_list("english").unwrap().name, "english");
        assert!(chain.active_list("nothing").is_err());
    }
}
