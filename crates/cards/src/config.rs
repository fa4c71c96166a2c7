use crate::error::ConfigError;

pub const URL_VARS: [&str; 2] = ["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"];
pub const ANON_KEY_VARS: [&str; 2] = ["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"];
pub const DEFAULT_TABLE: &str = "cards";

/// Where the published deck lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
}

impl SourceConfig {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let url = url.trim().trim_end_matches('/');
        let anon_key = anon_key.trim();
        match (url.is_empty(), anon_key.is_empty()) {
            (false, false) => {}
            (true, false) => return Err(ConfigError::Missing(URL_VARS[0].to_owned())),
            (false, true) => return Err(ConfigError::Missing(ANON_KEY_VARS[0].to_owned())),
            (true, true) => return Err(missing_both()),
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(url.to_owned()));
        }
        Ok(Self {
            url: url.to_owned(),
            anon_key: anon_key.to_owned(),
            table: DEFAULT_TABLE.to_owned(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the url and key through `lookup`, trying the primary names first.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let find = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.trim().is_empty())
        };
        match (find(&URL_VARS[..]), find(&ANON_KEY_VARS[..])) {
            (Some(url), Some(anon_key)) => Self::new(&url, &anon_key),
            (None, Some(_)) => Err(ConfigError::Missing(URL_VARS[0].to_owned())),
            (Some(_), None) => Err(ConfigError::Missing(ANON_KEY_VARS[0].to_owned())),
            (None, None) => Err(missing_both()),
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.to_owned();
        self
    }
}

fn missing_both() -> ConfigError {
    ConfigError::Missing(format!("{} / {}", URL_VARS[0], ANON_KEY_VARS[0]))
}
