/// Diagnostic wording of one ipset release line.
///
/// ipset has no machine-readable error channel, so failures are classified by
/// substring matching against these phrases. A release that rewords its
/// diagnostics gets a new table here instead of new match arms in the client.
#[derive(Clone, Copy, Debug)]
pub struct MessageTable {
    pub set_does_not_exist: &'static str,
    pub element_already_added: &'static str,
    pub element_not_added: &'static str,
    pub resolve_ipv4_failed: &'static str,
}

impl MessageTable {
    // wording unchanged across the v6/v7 line
    pub const V6_TO_V7: MessageTable = MessageTable {
        set_does_not_exist: "The set with the given name does not exist",
        element_already_added: "Element cannot be added to the set: it's already added",
        element_not_added: "Element cannot be deleted from the set: it's not added",
        resolve_ipv4_failed: "resolving to IPv4 address failed",
    };
}

impl Default for MessageTable {
    fn default() -> Self {
        MessageTable::V6_TO_V7
    }
}
