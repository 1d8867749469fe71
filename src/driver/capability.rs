//! Closed set of protocol contracts a wrapped object can satisfy.

use std::fmt;

/// One protocol contract (interface) of the driver object graph.
///
/// The discriminant is the capability's ordinal; it is stable and used both
/// for [`CapabilityMask`] bits and for capability-set hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Capability {
    DataSource = 0,
    XaDataSource = 1,
    PooledConnection = 2,
    XaConnection = 3,
    Connection = 4,
    Statement = 5,
    PreparedStatement = 6,
    CallableStatement = 7,
    ResultSet = 8,
    RowSet = 9,
    JdbcRowSet = 10,
    CachedRowSet = 11,
    WebRowSet = 12,
    FilteredRowSet = 13,
    JoinRowSet = 14,
}

impl Capability {
    /// Every capability in ordinal order.
    pub const ALL: [Capability; 15] = [
        Capability::DataSource,
        Capability::XaDataSource,
        Capability::PooledConnection,
        Capability::XaConnection,
        Capability::Connection,
        Capability::Statement,
        Capability::PreparedStatement,
        Capability::CallableStatement,
        Capability::ResultSet,
        Capability::RowSet,
        Capability::JdbcRowSet,
        Capability::CachedRowSet,
        Capability::WebRowSet,
        Capability::FilteredRowSet,
        Capability::JoinRowSet,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Contract name as the protocol spells it.
    pub const fn name(self) -> &'static str {
        match self {
            Capability::DataSource => "DataSource",
            Capability::XaDataSource => "XADataSource",
            Capability::PooledConnection => "PooledConnection",
            Capability::XaConnection => "XAConnection",
            Capability::Connection => "Connection",
            Capability::Statement => "Statement",
            Capability::PreparedStatement => "PreparedStatement",
            Capability::CallableStatement => "CallableStatement",
            Capability::ResultSet => "ResultSet",
            Capability::RowSet => "RowSet",
            Capability::JdbcRowSet => "JdbcRowSet",
            Capability::CachedRowSet => "CachedRowSet",
            Capability::WebRowSet => "WebRowSet",
            Capability::FilteredRowSet => "FilteredRowSet",
            Capability::JoinRowSet => "JoinRowSet",
        }
    }

    /// Direct super-contracts.
    pub const fn parents(self) -> &'static [Capability] {
        match self {
            Capability::XaConnection => &[Capability::PooledConnection],
            Capability::PreparedStatement => &[Capability::Statement],
            Capability::CallableStatement => &[Capability::PreparedStatement],
            Capability::RowSet => &[Capability::ResultSet],
            Capability::JdbcRowSet | Capability::CachedRowSet => &[Capability::RowSet],
            Capability::WebRowSet => &[Capability::CachedRowSet],
            Capability::FilteredRowSet | Capability::JoinRowSet => &[Capability::WebRowSet],
            _ => &[],
        }
    }

    /// This capability plus every ancestor.
    pub fn closure(self) -> CapabilityMask {
        let mut mask = CapabilityMask::from(self);
        for parent in self.parents() {
            mask = mask.union(parent.closure());
        }
        mask
    }

    /// Whether an object satisfying `self` also satisfies `other`.
    #[inline]
    pub fn extends(self, other: Capability) -> bool {
        self.closure().contains(other)
    }

    /// Whether this contract belongs to the result-set family.
    #[inline]
    pub fn is_result_set(self) -> bool {
        self.extends(Capability::ResultSet)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CapabilityMask
// ---------------------------------------------------------------------------

/// Bit set of capabilities, one bit per ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilityMask(u16);

impl CapabilityMask {
    pub const EMPTY: CapabilityMask = CapabilityMask(0);

    #[inline]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & (1 << capability.ordinal()) != 0
    }

    #[inline]
    pub const fn with(self, capability: Capability) -> Self {
        CapabilityMask(self.0 | (1 << capability.ordinal()))
    }

    #[inline]
    pub const fn union(self, other: CapabilityMask) -> Self {
        CapabilityMask(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of capabilities in the mask.
    #[inline]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Capabilities in ordinal order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl From<Capability> for CapabilityMask {
    fn from(capability: Capability) -> Self {
        CapabilityMask::EMPTY.with(capability)
    }
}

impl FromIterator<Capability> for CapabilityMask {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(CapabilityMask::EMPTY, CapabilityMask::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_all() {
        for (index, capability) in Capability::ALL.iter().enumerate() {
            assert_eq!(capability.ordinal() as usize, index);
        }
    }

    #[test]
    fn closure_includes_all_ancestors() {
        let closure = Capability::JoinRowSet.closure();
        let expected: CapabilityMask = [
            Capability::JoinRowSet,
            Capability::WebRowSet,
            Capability::CachedRowSet,
            Capability::RowSet,
            Capability::ResultSet,
        ]
        .into_iter()
        .collect();
        assert_eq!(closure, expected);
        assert!(!closure.contains(Capability::JdbcRowSet));
        assert!(!closure.contains(Capability::FilteredRowSet));
    }

    #[test]
    fn statement_family_extends_statement() {
        assert!(Capability::CallableStatement.extends(Capability::Statement));
        assert!(Capability::PreparedStatement.extends(Capability::Statement));
        assert!(!Capability::Statement.extends(Capability::PreparedStatement));
        assert!(Capability::XaConnection.extends(Capability::PooledConnection));
    }

    #[test]
    fn result_set_family() {
        assert!(Capability::FilteredRowSet.is_result_set());
        assert!(Capability::ResultSet.is_result_set());
        assert!(!Capability::Connection.is_result_set());
    }

    #[test]
    fn display_uses_protocol_names() {
        assert_eq!(Capability::XaDataSource.to_string(), "XADataSource");
        assert_eq!(Capability::JoinRowSet.to_string(), "JoinRowSet");
    }

    #[test]
    fn mask_iterates_in_ordinal_order() {
        let mask: CapabilityMask = [Capability::ResultSet, Capability::Connection]
            .into_iter()
            .collect();
        let items: Vec<_> = mask.iter().collect();
        assert_eq!(items, vec![Capability::Connection, Capability::ResultSet]);
        assert_eq!(mask.len(), 2);
    }
}
