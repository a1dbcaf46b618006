//! Runtime configuration: an optional TOML file layered under `LUDOTECA_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, bail};
use config::{ConfigBuilder, builder::DefaultState};
use ludoteca_sync::driver::Schedule;
use serde::Deserialize;

/// Server configuration, deserialised from `ludoteca.toml` and the
/// environment.
#[derive(Deserialize, Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct ServerConfig {
  pub catalogue_sheet:    String,
  pub audit_sheet:        String,
  pub bot_token:          String,
  /// Service-account credential bundle for the backing store.
  pub credentials:        PathBuf,
  pub store_path:         PathBuf,
  pub host:               String,
  pub port:               u16,
  pub tick_minutes:       u64,
  pub min_interval_hours: u64,
  pub required_columns:   usize,
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment, then validate.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = defaults()?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LUDOTECA"));
    Self::build(builder)
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let cfg: Self = builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    for (key, value) in [
      ("catalogue_sheet", &self.catalogue_sheet),
      ("audit_sheet", &self.audit_sheet),
      ("bot_token", &self.bot_token),
    ] {
      if value.trim().is_empty() {
        bail!("configuration key `{key}` must not be empty");
      }
    }

    if self.credentials.as_os_str().is_empty() {
      bail!("configuration key `credentials` must not be empty");
    }
    let meta = std::fs::metadata(&self.credentials).with_context(|| {
      format!("credentials file {:?} is not readable", self.credentials)
    })?;
    if !meta.is_file() || meta.len() == 0 {
      bail!("credentials file {:?} is empty", self.credentials);
    }

    if self.tick_minutes == 0 {
      bail!("tick_minutes must be at least 1");
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn schedule(&self) -> Schedule {
    Schedule {
      tick:         Duration::from_secs(self.tick_minutes * 60),
      min_interval: Duration::from_secs(self.min_interval_hours * 60 * 60),
    }
  }
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
  let builder = config::Config::builder()
    .set_default("store_path", "ludoteca.db")?
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("tick_minutes", 30)?
    .set_default("min_interval_hours", 24)?
    .set_default("required_columns", 8)?;
  Ok(builder)
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  /// A non-empty credentials file unique to this test.
  fn credentials(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("ludoteca-{}-{name}.json", std::process::id()));
    std::fs::write(&path, r#"{"type":"service_account"}"#).unwrap();
    path
  }

  fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
    ServerConfig::build(
      defaults().unwrap().add_source(File::from_str(toml, FileFormat::Toml)),
    )
  }

  #[test]
  fn defaults_fill_optional_keys() {
    let creds = credentials("defaults");
    let cfg = parse(&format!(
      r#"
        catalogue_sheet = "Catalogue"
        audit_sheet     = "Audit"
        bot_token       = "s3cret"
        credentials     = {creds:?}
      "#
    ))
    .unwrap();

    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("ludoteca.db"));
    assert_eq!(cfg.required_columns, 8);
    assert_eq!(cfg.schedule(), Schedule::default());
  }

  #[test]
  fn overrides_are_honoured() {
    let creds = credentials("overrides");
    let cfg = parse(&format!(
      r#"
        catalogue_sheet    = "Catalogue"
        audit_sheet        = "Audit"
        bot_token          = "s3cret"
        credentials        = {creds:?}
        port               = 9000
        tick_minutes       = 5
        min_interval_hours = 1
      "#
    ))
    .unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.schedule().tick, Duration::from_secs(300));
    assert_eq!(cfg.schedule().min_interval, Duration::from_secs(3600));
  }

  #[test]
  fn missing_required_key_is_fatal() {
    let creds = credentials("missing");
    let err = parse(&format!(
      r#"
        catalogue_sheet = "Catalogue"
        audit_sheet     = "Audit"
        credentials     = {creds:?}
      "#
    ));
    assert!(err.is_err());
  }

  #[test]
  fn empty_required_key_is_fatal() {
    let creds = credentials("empty");
    let err = parse(&format!(
      r#"
        catalogue_sheet = "Catalogue"
        audit_sheet     = " "
        bot_token       = "s3cret"
        credentials     = {creds:?}
      "#
    ))
    .unwrap_err();
    assert!(err.to_string().contains("audit_sheet"), "{err}");
  }

  #[test]
  fn credentials_must_exist_and_be_non_empty() {
    let err = parse(
      r#"
        catalogue_sheet = "Catalogue"
        audit_sheet     = "Audit"
        bot_token       = "s3cret"
        credentials     = "/nonexistent/ludoteca/credentials.json"
      "#,
    );
    assert!(err.is_err());

    let empty = std::env::temp_dir()
      .join(format!("ludoteca-{}-blank.json", std::process::id()));
    std::fs::write(&empty, "").unwrap();
    let err = parse(&format!(
      r#"
        catalogue_sheet = "Catalogue"
        audit_sheet     = "Audit"
        bot_token       = "s3cret"
        credentials     = {empty:?}
      "#
    ))
    .unwrap_err();
    assert!(err.to_string().contains("empty"), "{err}");
  }
}
