use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;

pub const SNAPSHOT_KEY: &str = "BLOBDECK_SNAPSHOT";
pub const PROFILE_KEY: &str = "BLOBDECK_PROFILE";
pub const PROVIDER_KEY: &str = "BLOBDECK_PROVIDER_DID";

pub const DOTENV_FILE: &str = ".env";

/// Values from a `.env` file layered under the process environment.
///
/// The process environment always wins; `.env` entries only fill gaps.
#[derive(Debug, Clone, Default)]
pub struct EnvLayer {
    file: HashMap<String, String>,
    use_process: bool,
}

impl EnvLayer {
    pub fn process_only() -> Self {
        Self {
            file: HashMap::new(),
            use_process: true,
        }
    }

    /// Parses dotenv syntax without touching the process environment.
    pub fn parse(raw: &str) -> Result<Self, dotenvy::Error> {
        Self::from_entries(dotenvy::from_read_iter(raw.as_bytes()))
    }

    /// Reads `.env` from `dir`. A missing file yields a process-only layer.
    pub fn load(dir: &Path) -> Result<Self, dotenvy::Error> {
        match dotenvy::from_path_iter(dir.join(DOTENV_FILE)) {
            Ok(entries) => Self::from_entries(entries),
            Err(dotenvy::Error::Io(error)) if error.kind() == io::ErrorKind::NotFound => {
                Ok(Self::process_only())
            }
            Err(error) => Err(error),
        }
    }

    fn from_entries<R: Read>(entries: dotenvy::Iter<R>) -> Result<Self, dotenvy::Error> {
        let mut file = HashMap::new();
        for entry in entries {
            let (key, value) = entry?;
            if !value.trim().is_empty() {
                file.insert(key, value);
            }
        }

        Ok(Self {
            file,
            use_process: true,
        })
    }

    /// Stops consulting the process environment.
    pub fn isolated(mut self) -> Self {
        self.use_process = false;
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lookup_with(key, |name| std::env::var(name).ok())
    }

    pub fn lookup_with(
        &self,
        key: &str,
        process: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        if self.use_process
            && let Some(value) = process(key).filter(|value| !value.trim().is_empty())
        {
            return Some(value);
        }
        self.file.get(key).cloned()
    }

    pub fn file_keys(&self) -> usize {
        self.file.len()
    }
}
