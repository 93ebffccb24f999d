use {
    crate::{logging, Result, SdkError},
    std::{collections::HashMap, env, path::PathBuf, str::FromStr, time::Duration},
};

pub const UPLOAD_DIR_VAR: &str = "CGI_PROBES_UPLOAD_DIR";
pub const LOOP_TICK_MS_VAR: &str = "CGI_PROBES_LOOP_TICK_MS";
pub const LOOP_REPORT_EVERY_VAR: &str = "CGI_PROBES_LOOP_REPORT_EVERY";
pub const LOG_VAR: &str = "CGI_PROBES_LOG";

/// Settings shared by the probes, taken from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub upload_dir: PathBuf,
    pub loop_tick: Duration,
    pub loop_report_every: u64,
    /// `tracing` filter directive for stderr logging.
    pub log_filter: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("/tmp/uploads"),
            loop_tick: Duration::from_secs(1),
            loop_report_every: 10,
            log_filter: "off".to_owned(),
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut config = Self::default();

        if let Some(dir) = vars.get(UPLOAD_DIR_VAR) {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_var::<u64>(&vars, LOOP_TICK_MS_VAR)? {
            config.loop_tick = Duration::from_millis(ms);
        }
        if let Some(every) = parse_var::<u64>(&vars, LOOP_REPORT_EVERY_VAR)? {
            if every == 0 {
                return Err(SdkError::Config {
                    key: LOOP_REPORT_EVERY_VAR,
                    value: every.to_string(),
                });
            }
            config.loop_report_every = every;
        }
        if let Some(filter) = vars.get(LOG_VAR) {
            logging::filter(filter)?;
            config.log_filter = filter.clone();
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<T>> {
    vars.get(key)
        .map(|value| {
            value.trim().parse().map_err(|_| SdkError::Config {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}
