use std::collections::HashMap;
use std::fmt::{self, Formatter};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::str;

use log::{debug, warn};
use regex::Regex;

use crate::list::IpsetSet;
use crate::messages::MessageTable;
use crate::{IpsetError, IpsetResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetType {
    HashIp,
}

impl Default for SetType {
    fn default() -> Self {
        SetType::HashIp
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            SetType::HashIp => "hash:ip",
        };

        write!(f, "{}", s)
    }
}

pub struct IpsetCommand {
    executable: PathBuf,
    set_types: HashMap<String, SetType>,
    messages: MessageTable,
}

pub type IpsetCommandOutput = Output;

impl IpsetCommand {
    pub fn new() -> IpsetCommand {
        IpsetCommand::with_executable(PathBuf::from("/usr/sbin/ipset"))
    }

    pub fn with_executable<P: Into<PathBuf>>(executable_path: P) -> IpsetCommand {
        let mut set_types = HashMap::new();
        set_types.insert("hash:ip".to_string(), SetType::HashIp);

        IpsetCommand {
            executable: executable_path.into(),
            set_types,
            messages: MessageTable::default(),
        }
    }

    pub fn with_messages(mut self, messages: MessageTable) -> IpsetCommand {
        self.messages = messages;
        self
    }

    /// Teaches the instance an additional `Type:` spelling. Lookups are
    /// case-insensitive, the name is stored lowercased.
    pub fn register_set_type<S: Into<String>>(&mut self, name: S, set_type: SetType) {
        self.set_types
            .insert(name.into().to_ascii_lowercase(), set_type);
    }

    pub fn set_type(&self, name: &str) -> Option<SetType> {
        self.set_types.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn set_by_name(&self, set_name: &str) -> IpsetResult<IpsetSet> {
        let output = self.exec(vec!["list", set_name])?;

        if let Some(error_line) = IpsetCommand::first_line(output.stderr)? {
            return Err(self.classify_list_error(&error_line, set_name));
        }

        let stdout = IpsetCommand::parse_stream(output.stdout)?;

        // some ipset builds report a missing set on stdout instead of stderr
        if let Some(first_line) = stdout.lines().next() {
            if first_line.contains(self.messages.set_does_not_exist) {
                return Err(IpsetError::SetNotFound(set_name.to_string()));
            }
        }

        IpsetSet::parse(&stdout, &self.set_types)
    }

    pub fn add_member(&self, set_name: &str, member: &str) -> IpsetResult<()> {
        let output = self.exec(vec!["add", set_name, member])?;

        match IpsetCommand::first_line(output.stderr)? {
            None => Ok(()),
            Some(error_line) => Err(self.classify_add_error(&error_line, set_name, member)),
        }
    }

    pub fn remove_member(&self, set_name: &str, member: &str) -> IpsetResult<()> {
        let output = self.exec(vec!["del", set_name, member])?;

        match IpsetCommand::first_line(output.stderr)? {
            None => Ok(()),
            Some(error_line) => Err(self.classify_remove_error(&error_line, set_name, member)),
        }
    }

    pub fn version(&self) -> IpsetResult<String> {
        let output = self.exec(vec!["version"])?;
        let text = IpsetCommand::parse_stream(output.stdout)?;

        IpsetCommand::parse_version(&text)
    }

    fn classify_list_error(&self, error_line: &str, set_name: &str) -> IpsetError {
        if error_line.contains(self.messages.set_does_not_exist) {
            IpsetError::SetNotFound(set_name.to_string())
        } else {
            warn!("unclassified ipset error: {}", error_line);
            IpsetError::UnrecognizedError(error_line.to_string())
        }
    }

    fn classify_add_error(&self, error_line: &str, set_name: &str, member: &str) -> IpsetError {
        if error_line.contains(self.messages.set_does_not_exist) {
            IpsetError::SetNotFound(set_name.to_string())
        } else if error_line.contains(self.messages.element_already_added) {
            IpsetError::AlreadyMember(set_name.to_string(), member.to_string())
        } else if error_line.contains(self.messages.resolve_ipv4_failed) {
            IpsetError::InvalidAddress(member.to_string())
        } else {
            warn!("unclassified ipset error: {}", error_line);
            IpsetError::UnrecognizedError(error_line.to_string())
        }
    }

    fn classify_remove_error(&self, error_line: &str, set_name: &str, member: &str) -> IpsetError {
        if error_line.contains(self.messages.set_does_not_exist) {
            IpsetError::SetNotFound(set_name.to_string())
        } else if error_line.contains(self.messages.element_not_added) {
            IpsetError::NotAMember(set_name.to_string(), member.to_string())
        } else if error_line.contains(self.messages.resolve_ipv4_failed) {
            IpsetError::InvalidAddress(member.to_string())
        } else {
            warn!("unclassified ipset error: {}", error_line);
            IpsetError::UnrecognizedError(error_line.to_string())
        }
    }

    fn parse_version(text: &str) -> IpsetResult<String> {
        match Regex::new(r"ipset v(\d+\.\d+(?:\.\d+)?)")
            .unwrap()
            .captures(text)
        {
            None => Err(IpsetError::MalformedOutput(format!(
                "couldn't find an ipset version in {}",
                text
            ))),
            Some(captures) => match captures.get(1) {
                None => Err(IpsetError::MalformedOutput(format!(
                    "couldn't find an ipset version in {}",
                    text
                ))),
                Some(capture) => Ok(capture.as_str().to_string()),
            },
        }
    }

    fn first_line(stream: Vec<u8>) -> IpsetResult<Option<String>> {
        let text = IpsetCommand::parse_stream(stream)?;

        Ok(text.lines().next().map(str::to_string))
    }

    fn parse_stream(stream: Vec<u8>) -> IpsetResult<String> {
        match str::from_utf8(&stream) {
            Ok(val) => Ok(val.to_string()),
            Err(err) => Err(IpsetError::IOError(err.to_string())),
        }
    }

    fn exec(&self, args: Vec<&str>) -> IpsetResult<IpsetCommandOutput> {
        debug!("running {:?} with {:?}", self.executable, args);

        Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|e| IpsetError::IOError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_classifies_missing_set() {
        let command = IpsetCommand::new();
        let error = command.classify_list_error(
            "ipset v7.1: The set with the given name does not exist",
            "blocklist",
        );

        match error {
            IpsetError::SetNotFound(set_name) => assert_eq!(set_name, "blocklist"),
            other => panic!("expected SetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn add_classifies_missing_set() {
        let command = IpsetCommand::new();
        let error = command.classify_add_error(
            "ipset v7.1: The set with the given name does not exist",
            "blocklist",
            "10.0.0.1",
        );

        match error {
            IpsetError::SetNotFound(set_name) => assert_eq!(set_name, "blocklist"),
            other => panic!("expected SetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn add_classifies_duplicate_member() {
        let command = IpsetCommand::new();
        let error = command.classify_add_error(
            "ipset v7.1: Element cannot be added to the set: it's already added",
            "blocklist",
            "10.0.0.1",
        );

        match error {
            IpsetError::AlreadyMember(set_name, member) => {
                assert_eq!(set_name, "blocklist");
                assert_eq!(member, "10.0.0.1");
            }
            other => panic!("expected AlreadyMember, got {:?}", other),
        }
    }

    #[test]
    fn add_classifies_unresolvable_address() {
        let command = IpsetCommand::new();
        let error = command.classify_add_error(
            "ipset v7.1: Syntax error: cannot parse nowhere.invalid: resolving to IPv4 address failed",
            "blocklist",
            "nowhere.invalid",
        );

        match error {
            IpsetError::InvalidAddress(member) => assert_eq!(member, "nowhere.invalid"),
            other => panic!("expected InvalidAddress, got {:?}", other),
        }
    }

    #[test]
    fn remove_classifies_missing_set() {
        let command = IpsetCommand::new();
        let error = command.classify_remove_error(
            "ipset v7.1: The set with the given name does not exist",
            "blocklist",
            "10.0.0.1",
        );

        match error {
            IpsetError::SetNotFound(set_name) => assert_eq!(set_name, "blocklist"),
            other => panic!("expected SetNotFound, got {:?}", other),
        }
    }

    #[test]
    fn remove_classifies_absent_member() {
        let command = IpsetCommand::new();
        let error = command.classify_remove_error(
            "ipset v7.1: Element cannot be deleted from the set: it's not added",
            "blocklist",
            "10.0.0.1",
        );

        match error {
            IpsetError::NotAMember(set_name, member) => {
                assert_eq!(set_name, "blocklist");
                assert_eq!(member, "10.0.0.1");
            }
            other => panic!("expected NotAMember, got {:?}", other),
        }
    }

    #[test]
    fn unknown_error_text_fails_closed() {
        let command = IpsetCommand::new();
        let line = "ipset v7.1: Kernel support protocol versions 6-7 while userspace supports 6-6";
        let error = command.classify_add_error(line, "blocklist", "10.0.0.1");

        match error {
            IpsetError::UnrecognizedError(raw) => assert_eq!(raw, line),
            other => panic!("expected UnrecognizedError, got {:?}", other),
        }
    }

    #[test]
    fn version_is_extracted_from_banner() {
        let version = IpsetCommand::parse_version("ipset v7.15, protocol version: 7\n").unwrap();

        assert_eq!(version, "7.15");
    }

    #[test]
    fn version_banner_without_number_is_malformed() {
        match IpsetCommand::parse_version("no version here\n") {
            Err(IpsetError::MalformedOutput(_)) => {}
            other => panic!("expected MalformedOutput, got {:?}", other),
        }
    }

    #[test]
    fn missing_executable_surfaces_as_io_error() {
        let command = IpsetCommand::with_executable("/nonexistent/ipset");

        match command.set_by_name("blocklist") {
            Err(IpsetError::IOError(_)) => {}
            other => panic!("expected IOError, got {:?}", other),
        }
    }

    #[test]
    fn registered_types_are_looked_up_case_insensitively() {
        let mut command = IpsetCommand::new();
        command.register_set_type("Hash:IPMark", SetType::HashIp);

        assert_eq!(command.set_type("hash:ipmark"), Some(SetType::HashIp));
        assert_eq!(command.set_type("HASH:IP"), Some(SetType::HashIp));
        assert_eq!(command.set_type("hash:net"), None);
    }
}
