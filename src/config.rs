use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub public_dir: String,
    pub zoho_client_id: String,
    pub zoho_client_secret: String,
    pub zoho_refresh_token: String,
    pub zoho_org_id: String,
    pub zoho_department_id: String,
    pub zoho_contact_id: String,
    pub zoho_accounts_url: String,
    pub zoho_desk_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            public_dir: "public".to_string(),
            zoho_client_id: String::new(),
            zoho_client_secret: String::new(),
            zoho_refresh_token: String::new(),
            zoho_org_id: "22905616".to_string(),
            zoho_department_id: String::new(),
            zoho_contact_id: String::new(),
            zoho_accounts_url: "https://accounts.zoho.com".to_string(),
            zoho_desk_url: "https://desk.zoho.com/api/v1".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = "ristikko-config.toml";
        if !std::path::Path::new(config_path).exists() {
            let default = Config::default();
            let toml = toml::to_string_pretty(&default)?;
            fs::write(config_path, toml)?;
            anyhow::bail!("Created default config at {}. Please edit and restart.", config_path);
        }

        let contents = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_zoho_production() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.zoho_accounts_url, "https://accounts.zoho.com");
        assert_eq!(config.zoho_desk_url, "https://desk.zoho.com/api/v1");
        assert!(config.zoho_refresh_token.is_empty());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config {
            zoho_refresh_token: "1000.abcd".to_string(),
            ..Config::default()
        };
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.zoho_refresh_token, "1000.abcd");
        assert_eq!(parsed.port, config.port);
    }
}
