use std::collections::{HashMap, HashSet};
use std::num::ParseIntError;

use crate::ipset::SetType;
use crate::{IpsetError, IpsetResult};

const NAME_PREFIX: &str = "Name: ";
const TYPE_PREFIX: &str = "Type: ";
const REVISION_PREFIX: &str = "Revision: ";
const HEADER_PREFIX: &str = "Header: ";
const SIZE_IN_MEMORY_PREFIX: &str = "Size in memory: ";
const REFERENCES_PREFIX: &str = "References: ";
const MEMBERS_MARKER: &str = "Members:";

/// Snapshot of one set as reported by `ipset list <name>`.
#[derive(Clone, Debug, Default)]
pub struct IpsetSet {
    pub name: String,
    pub set_type: SetType,
    pub revision: u32,
    pub header: String,
    pub size_in_memory: u32,
    pub references: u32,
    pub members: HashSet<String>,
}

impl IpsetSet {
    pub(crate) fn parse(
        stdout: &str,
        set_types: &HashMap<String, SetType>,
    ) -> IpsetResult<IpsetSet> {
        let mut set = IpsetSet::default();
        let mut in_members = false;

        for line in stdout.lines() {
            if in_members {
                set.members.insert(line.to_string());
            } else if line == MEMBERS_MARKER {
                in_members = true;
            } else {
                set.parse_field(line, set_types)?;
            }
        }

        if set.name.is_empty() {
            return Err(IpsetError::MalformedOutput(
                "output carries no Name field".to_string(),
            ));
        }

        Ok(set)
    }

    fn parse_field(
        &mut self,
        line: &str,
        set_types: &HashMap<String, SetType>,
    ) -> IpsetResult<()> {
        if let Some(rest) = line.strip_prefix(NAME_PREFIX) {
            self.name = rest.to_string();
        } else if let Some(rest) = line.strip_prefix(TYPE_PREFIX) {
            self.set_type = match set_types.get(&rest.to_ascii_lowercase()) {
                Some(set_type) => *set_type,
                None => return Err(IpsetError::UnsupportedSetType(rest.to_string())),
            };
        } else if let Some(rest) = line.strip_prefix(REVISION_PREFIX) {
            self.revision = parse_number(rest)?;
        } else if let Some(rest) = line.strip_prefix(HEADER_PREFIX) {
            self.header = rest.to_string();
        } else if let Some(rest) = line.strip_prefix(SIZE_IN_MEMORY_PREFIX) {
            self.size_in_memory = parse_number(rest)?;
        } else if let Some(rest) = line.strip_prefix(REFERENCES_PREFIX) {
            self.references = parse_number(rest)?;
        }
        // unknown header lines belong to a newer ipset, skip them

        Ok(())
    }
}

fn parse_number(value: &str) -> IpsetResult<u32> {
    value
        .parse()
        .map_err(|e: ParseIntError| IpsetError::MalformedOutput(format!("{}: {}", value, e)))
}
