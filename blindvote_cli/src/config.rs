use std::env::var;

/// Default election config location when neither the argument nor the environment name one
pub const DEFAULT_CONFIG_PATH: &str = "./election.json";

pub struct Config {
    pub config_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let config_path = match var("BLINDVOTE_CONFIG") {
            Ok(val) => crate::expand(&val),
            Err(_e) => DEFAULT_CONFIG_PATH.to_owned(),
        };

        Config { config_path }
    }
}
