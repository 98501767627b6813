use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use murmur_gateway::GatewayConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys take their defaults;
    /// set but unparseable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = GatewayConfig::default();

        let host: IpAddr = parse_or(&lookup, "MURMUR_HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port: u16 = parse_or(&lookup, "MURMUR_PORT", 4000)?;
        let addr = SocketAddr::new(host, port);

        let db_path = lookup("MURMUR_DB_PATH")
            .unwrap_or_else(|| "murmur.db".into())
            .into();

        let heartbeat_secs = parse_or(
            &lookup,
            "MURMUR_HEARTBEAT_SECS",
            defaults.heartbeat_interval.as_secs(),
        )?;
        if heartbeat_secs == 0 {
            anyhow::bail!("MURMUR_HEARTBEAT_SECS must be at least 1");
        }

        let gateway = GatewayConfig {
            history_requires_membership: parse_or(
                &lookup,
                "MURMUR_HISTORY_REQUIRES_MEMBERSHIP",
                defaults.history_requires_membership,
            )?,
            max_page_size: parse_or(&lookup, "MURMUR_MAX_PAGE_SIZE", defaults.max_page_size)?,
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
        };

        Ok(Self {
            addr,
            db_path,
            gateway,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:4000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("murmur.db"));
        assert!(!config.gateway.history_requires_membership);
        assert_eq!(config.gateway.max_page_size, 200);
        assert_eq!(config.gateway.heartbeat_interval, Duration::from_secs(15));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("MURMUR_HOST", "127.0.0.1"),
            ("MURMUR_PORT", "9000"),
            ("MURMUR_DB_PATH", "/var/lib/murmur/chat.db"),
            ("MURMUR_HISTORY_REQUIRES_MEMBERSHIP", "true"),
            ("MURMUR_MAX_PAGE_SIZE", "25"),
            ("MURMUR_HEARTBEAT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("/var/lib/murmur/chat.db"));
        assert!(config.gateway.history_requires_membership);
        assert_eq!(config.gateway.max_page_size, 25);
        assert_eq!(config.gateway.heartbeat_interval, Duration::from_secs(5));
    }

    #[test]
    fn ipv6_hosts_are_accepted() {
        let any = config(&[("MURMUR_HOST", "::"), ("MURMUR_PORT", "4100")]).unwrap();
        assert_eq!(any.addr, "[::]:4100".parse().unwrap());

        let loopback = config(&[("MURMUR_HOST", "::1")]).unwrap();
        assert_eq!(loopback.addr, "[::1]:4000".parse().unwrap());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("MURMUR_HOST", "[::1]")]).unwrap_err();
        assert!(err.to_string().contains("MURMUR_HOST"), "{}", err);

        let err = config(&[("MURMUR_PORT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("MURMUR_PORT"), "{}", err);

        let err = config(&[("MURMUR_HISTORY_REQUIRES_MEMBERSHIP", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("MURMUR_HISTORY_REQUIRES_MEMBERSHIP"));

        assert!(config(&[("MURMUR_HEARTBEAT_SECS", "0")]).is_err());
    }
}
