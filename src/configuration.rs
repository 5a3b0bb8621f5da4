use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::builder::ConfigBuilder;
use config::builder::DefaultState;
use config::Config;
use config::ConfigError;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_bool_from_anything;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Used as the `From` account when no SMTP username is configured
pub const FALLBACK_SENDER: &str = "no-reply@example.com";

/// Global configuration, loaded from `configuration/*.yaml` and the
/// environment. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email: EmailSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    /// Defaults to 4000 (see base.yaml)
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Public address of this server, used to build sandbox preview links. If
    /// unset, it is derived from `host` and the port actually bound.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Origin of the portfolio frontend. If unset, any origin may call the API.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

impl ApplicationSettings {
    pub fn public_url(
        &self,
        bound_port: u16,
    ) -> String {
        match non_blank(self.base_url.as_deref()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                // 0.0.0.0 is fine to bind to, but not to click on
                let host = match self.host.as_str() {
                    "0.0.0.0" => "localhost",
                    h => h,
                };
                format!("http://{host}:{bound_port}")
            }
        }
    }
}

/// Mail transport configuration. All SMTP fields are optional; if any of
/// `host`, `username` or `password` is missing, the sandbox transport is used
/// instead.
#[derive(Deserialize, Clone)]
pub struct EmailSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(
        default = "default_smtp_port",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub port: u16,

    /// `true`: implicit TLS (usually port 465). `false`: plain connection,
    /// upgraded with STARTTLS when the server offers it.
    #[serde(default, deserialize_with = "deserialize_bool_from_anything")]
    pub secure: bool,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<Secret<String>>,

    /// Where contact messages are delivered to
    #[serde(default = "default_contact_to")]
    pub contact_to: String,

    /// Applies separately to verification and to sending
    #[serde(
        default = "default_timeout_milliseconds",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub timeout_milliseconds: u64,
}

fn default_smtp_port() -> u16 { 587 }

fn default_contact_to() -> String { "inbox@example.com".to_string() }

fn default_timeout_milliseconds() -> u64 { 10_000 }

/// The complete set of SMTP credentials; only exists if every required field
/// was provided.
#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub username: String,
    pub password: Secret<String>,
}

impl EmailSettings {
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = non_blank(self.host.as_deref())?;
        let username = non_blank(self.username.as_deref())?;
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().trim().is_empty())?;
        Some(SmtpSettings {
            host: host.to_string(),
            port: self.port,
            secure: self.secure,
            username: username.to_string(),
            password: password.clone(),
        })
    }

    /// The account messages are sent from
    pub fn sender(&self) -> String {
        non_blank(self.username.as_deref())
            .unwrap_or(FALLBACK_SENDER)
            .to_string()
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn uses_fallback_destination(&self) -> bool { self.contact_to == default_contact_to() }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )?;
        Ok(())
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid: {e}")),
        }
    }
}

/// Flat variable names that predate the `APP_` scheme; existing `.env` files
/// for the portfolio still use them. They take precedence over everything
/// else.
const FLAT_VARS: [(&str, &str); 7] = [
    ("PORT", "application.port"),
    ("SMTP_HOST", "email.host"),
    ("SMTP_PORT", "email.port"),
    ("SMTP_SECURE", "email.secure"),
    ("SMTP_USER", "email.username"),
    ("SMTP_PASS", "email.password"),
    ("CONTACT_TO", "email.contact_to"),
];

/// `lookup` is `env::var` outside of tests
fn with_flat_vars(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in FLAT_VARS {
        let value = lookup(var).filter(|v| !v.trim().is_empty());
        builder = builder.set_override_option(key, value)?;
    }
    Ok(builder)
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// environment variables.
///
/// `application` fields must be present in these files, otherwise
/// initialisation will fail immediately, and the server will not start.
/// Missing SMTP fields are not an error; see `EmailSettings`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let builder = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, `serde-aux` is required to parse
            // other types.
            //
            // `APP_EMAIL__CONTACT_TO=me@foo.com` -> `Settings.email.contact_to`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    with_flat_vars(builder, |var| env::var(var).ok())?
        .build()?
        .try_deserialize::<Settings>()
}
