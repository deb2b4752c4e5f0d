use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde_derive::Deserialize;

use crate::ipset::IpsetCommand;
use crate::{IpsetError, IpsetResult};

#[derive(Debug, Deserialize)]
pub struct Config {
    executable: Option<String>,
    #[serde(default)]
    set_type_aliases: HashMap<String, String>,
}

impl Config {
    pub fn from_file<T: AsRef<Path>>(filename: T) -> io::Result<Config> {
        let mut content = String::new();
        File::open(filename)?.read_to_string(&mut content)?;

        Config::parse(content)
    }

    fn parse<S: ToString>(content: S) -> io::Result<Config> {
        match toml::from_str(&content.to_string()) {
            Ok(value) => {
                Ok(value)
            }
            Err(e) => {
                Err(io::Error::from(e))
            }
        }
    }

    /// Builds a command from this configuration. Aliases must resolve to a
    /// type the command already knows.
    pub fn command(&self) -> IpsetResult<IpsetCommand> {
        let mut command = match &self.executable {
            Some(path) => IpsetCommand::with_executable(path),
            None => IpsetCommand::new(),
        };

        for (alias, canonical) in &self.set_type_aliases {
            let set_type = command
                .set_type(canonical)
                .ok_or_else(|| IpsetError::UnsupportedSetType(canonical.to_string()))?;
            command.register_set_type(alias.to_string(), set_type);
        }

        Ok(command)
    }
}
