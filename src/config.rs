use anyhow::Context;
use std::str::FromStr;

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_PASSWORD_HASH_COST: u32 = 12;

#[derive(Debug)]
pub struct Config {
    database_url: String,
    server_port: u16,
    password_hash_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = load_env("DATABASE_URL")?;
        let server_port = load_env_or("SERVER_PORT", DEFAULT_SERVER_PORT)?;
        let password_hash_cost = load_env_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST)?;
        Ok(Self {
            database_url,
            server_port,
            password_hash_cost,
        })
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub const fn password_hash_cost(&self) -> u32 {
        self.password_hash_cost
    }
}

fn load_env<T>(key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val =
        std::env::var(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    parse_env(key, &val)
}

fn load_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(val) => parse_env(key, &val),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to load environment variable {key}"))
        }
    }
}

fn parse_env<T>(key: &str, val: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    val.parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_values() {
        let port: u16 = parse_env("SERVER_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn reports_the_offending_variable() {
        let err = parse_env::<u16>("SERVER_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
