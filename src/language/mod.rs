pub mod core;

pub use self::core::{BundledWords, ChainedWords, FileWords, Language, WordSource};
