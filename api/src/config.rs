use serde::Deserialize;

const DEFAULT_PORT: u16 = 3000;

/// Which repository variant backs the services. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

/// Process configuration, read from environment variables
/// (`PORT`, `STORAGE_BACKEND`, `MONGODB_URI`, `MONGODB_DATABASE`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_database")]
    pub mongodb_database: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_mongodb_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongodb_database() -> String {
    "mongodb".to_string()
}

impl ApiConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env()
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ApiConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.mongodb_database, "mongodb");
    }

    #[test]
    fn reads_overrides() {
        let config = ApiConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("STORAGE_BACKEND", "mongodb"),
            ("MONGODB_URI", "mongodb://db:27017"),
            ("MONGODB_DATABASE", "catalog"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Mongodb);
        assert_eq!(config.mongodb_uri, "mongodb://db:27017");
        assert_eq!(config.mongodb_database, "catalog");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ApiConfig::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
        assert!(ApiConfig::from_vars(vars(&[("STORAGE_BACKEND", "postgres")])).is_err());
    }
}
