//! Configuração do serviço a partir de variáveis de ambiente

use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use registro_db::DbConfig;

/// Backend de armazenamento do cadastro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Arquivo JSON único
    Json,
    /// Coleção de documentos no SQLite
    Sqlite,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "arquivo" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("backend desconhecido: {other} (use json ou sqlite)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("formato de log desconhecido: {other}")),
        }
    }
}

/// Configuração do serviço
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub backend: Backend,
    /// Arquivo do cadastro quando `backend` é JSON
    pub json_path: PathBuf,
    /// Banco quando `backend` é SQLite
    pub db: DbConfig,
    /// Diretório de arquivos estáticos (CSS, imagens)
    pub static_dir: PathBuf,
    /// Limite de requisições atendidas ao mesmo tempo
    pub max_concurrent_requests: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            backend: Backend::Json,
            json_path: PathBuf::from("data/banco.json"),
            db: DbConfig::default(),
            static_dir: PathBuf::from("public"),
            max_concurrent_requests: 64,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("Valor inválido em {key}={raw}: {e}")),
        _ => Ok(None),
    }
}

impl AppConfig {
    /// Lê a configuração do ambiente do processo
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Aplica as variáveis encontradas por `lookup` sobre os padrões
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = parse_var(&lookup, "REGISTRO_HOST")? {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(backend) = parse_var(&lookup, "REGISTRO_BACKEND")? {
            config.backend = backend;
        }
        if let Some(path) = parse_var(&lookup, "REGISTRO_JSON_PATH")? {
            config.json_path = path;
        }
        if let Some(path) = parse_var(&lookup, "REGISTRO_DB_PATH")? {
            config.db.db_path = path;
        }
        if let Some(max) = parse_var(&lookup, "REGISTRO_DB_MAX_CONNECTIONS")? {
            config.db.max_connections = max;
        }
        if let Some(dir) = parse_var(&lookup, "REGISTRO_STATIC_DIR")? {
            config.static_dir = dir;
        }
        if let Some(limit) = parse_var(&lookup, "REGISTRO_MAX_CONCURRENT_REQUESTS")? {
            config.max_concurrent_requests = limit;
        }
        if let Some(format) = parse_var(&lookup, "REGISTRO_LOG_FORMAT")? {
            config.log_format = format;
        }

        if config.max_concurrent_requests == 0 {
            bail!("REGISTRO_MAX_CONCURRENT_REQUESTS deve ser maior que zero");
        }
        if config.db.max_connections == 0 {
            bail!("REGISTRO_DB_MAX_CONNECTIONS deve ser maior que zero");
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
