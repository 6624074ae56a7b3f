use std::convert::TryInto;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::errors::{ChainError, ChainResult};
use crate::types::{NodeRecord, Proposal, RoleRecord};

pub const STORAGE_SCHEMA_VERSION: u32 = 1;

pub(crate) const CF_ROLES: &str = "roles";
pub(crate) const CF_NODES: &str = "nodes";
pub(crate) const CF_PROPOSALS: &str = "proposals";
pub(crate) const CF_METADATA: &str = "metadata";
const PROPOSAL_SEQ_KEY: &[u8] = b"proposal_seq";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Durable keyed storage for role, node, and proposal records. Pure CRUD
/// plus the monotonic proposal id allocator; transition policy lives in the
/// controller.
pub struct Storage {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

/// Collected writes for one governance transition. Committing through a
/// single batch keeps an entity change and its cascades atomic.
#[derive(Default)]
pub struct GovernanceBatch {
    roles: Vec<RoleRecord>,
    nodes: Vec<NodeRecord>,
    proposals: Vec<Proposal>,
}

impl GovernanceBatch {
    pub fn put_role(&mut self, role: RoleRecord) {
        self.roles.push(role);
    }

    pub fn put_node(&mut self, node: NodeRecord) {
        self.nodes.push(node);
    }

    pub fn put_proposal(&mut self, proposal: Proposal) {
        self.proposals.push(proposal);
    }
}

impl Storage {
    pub fn open(path: &Path) -> ChainResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ROLES, Options::default()),
            ColumnFamilyDescriptor::new(CF_NODES, Options::default()),
            ColumnFamilyDescriptor::new(CF_PROPOSALS, Options::default()),
            ColumnFamilyDescriptor::new(CF_METADATA, Options::default()),
        ];
        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;
        let storage = Self { db: Arc::new(db) };
        storage.ensure_schema_supported()?;
        Ok(storage)
    }

    fn roles_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_ROLES)
            .ok_or_else(|| ChainError::Config("missing roles column family".into()))
    }

    fn nodes_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_NODES)
            .ok_or_else(|| ChainError::Config("missing nodes column family".into()))
    }

    fn proposals_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_PROPOSALS)
            .ok_or_else(|| ChainError::Config("missing proposals column family".into()))
    }

    fn metadata_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_METADATA)
            .ok_or_else(|| ChainError::Config("missing metadata column family".into()))
    }

    fn ensure_schema_supported(&self) -> ChainResult<()> {
        let metadata_cf = self.metadata_cf()?;
        match self.db.get_cf(&metadata_cf, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 4] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ChainError::Config("invalid schema version encoding".into()))?;
                let version = u32::from_be_bytes(bytes);
                if version != STORAGE_SCHEMA_VERSION {
                    return Err(ChainError::Config(format!(
                        "database schema version {version} is not supported (requires {STORAGE_SCHEMA_VERSION})"
                    )));
                }
                Ok(())
            }
            None => {
                self.db.put_cf(
                    &metadata_cf,
                    SCHEMA_VERSION_KEY,
                    STORAGE_SCHEMA_VERSION.to_be_bytes(),
                )?;
                Ok(())
            }
        }
    }

    pub fn put_role(&self, role: &RoleRecord) -> ChainResult<()> {
        let cf = self.roles_cf()?;
        let data = bincode::serialize(role)?;
        self.db.put_cf(&cf, role.address.as_bytes(), data)?;
        Ok(())
    }

    pub fn get_role(&self, address: &str) -> ChainResult<Option<RoleRecord>> {
        let cf = self.roles_cf()?;
        match self.db.get_cf(&cf, address.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    pub fn load_roles(&self) -> ChainResult<Vec<RoleRecord>> {
        let cf = self.roles_cf()?;
        let mut iterator = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut roles = Vec::new();
        while let Some(entry) = iterator.next() {
            let (_key, value) = entry?;
            roles.push(bincode::deserialize::<RoleRecord>(&value)?);
        }
        roles.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(roles)
    }

    pub fn put_node(&self, node: &NodeRecord) -> ChainResult<()> {
        let cf = self.nodes_cf()?;
        let data = bincode::serialize(node)?;
        self.db.put_cf(&cf, node.account.as_bytes(), data)?;
        Ok(())
    }

    pub fn get_node(&self, account: &str) -> ChainResult<Option<NodeRecord>> {
        let cf = self.nodes_cf()?;
        match self.db.get_cf(&cf, account.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    pub fn load_nodes(&self) -> ChainResult<Vec<NodeRecord>> {
        let cf = self.nodes_cf()?;
        let mut iterator = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut nodes = Vec::new();
        while let Some(entry) = iterator.next() {
            let (_key, value) = entry?;
            nodes.push(bincode::deserialize::<NodeRecord>(&value)?);
        }
        nodes.sort_by(|a, b| a.account.cmp(&b.account));
        Ok(nodes)
    }

    pub fn put_proposal(&self, proposal: &Proposal) -> ChainResult<()> {
        let cf = self.proposals_cf()?;
        let data = bincode::serialize(proposal)?;
        self.db.put_cf(&cf, proposal.id.to_be_bytes(), data)?;
        Ok(())
    }

    pub fn get_proposal(&self, id: u64) -> ChainResult<Option<Proposal>> {
        let cf = self.proposals_cf()?;
        match self.db.get_cf(&cf, id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    pub fn load_proposals(&self) -> ChainResult<Vec<Proposal>> {
        let cf = self.proposals_cf()?;
        let mut iterator = self.db.iterator_cf(&cf, IteratorMode::Start);
        let mut proposals = Vec::new();
        while let Some(entry) = iterator.next() {
            let (_key, value) = entry?;
            proposals.push(bincode::deserialize::<Proposal>(&value)?);
        }
        proposals.sort_by_key(|proposal| proposal.id);
        Ok(proposals)
    }

    /// Allocate the next proposal id. Callers serialize mutating access, so
    /// read-increment-write is safe here.
    pub fn next_proposal_id(&self) -> ChainResult<u64> {
        let cf = self.metadata_cf()?;
        let next = match self.db.get_cf(&cf, PROPOSAL_SEQ_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ChainError::Config("invalid proposal sequence encoding".into()))?;
                u64::from_be_bytes(bytes) + 1
            }
            None => 1,
        };
        self.db.put_cf(&cf, PROPOSAL_SEQ_KEY, next.to_be_bytes())?;
        Ok(next)
    }

    /// Write every record collected for one transition in a single batch.
    pub fn commit(&self, batch: GovernanceBatch) -> ChainResult<()> {
        let mut writes = WriteBatch::default();
        let roles_cf = self.roles_cf()?;
        for role in &batch.roles {
            writes.put_cf(&roles_cf, role.address.as_bytes(), bincode::serialize(role)?);
        }
        let nodes_cf = self.nodes_cf()?;
        for node in &batch.nodes {
            writes.put_cf(&nodes_cf, node.account.as_bytes(), bincode::serialize(node)?);
        }
        let proposals_cf = self.proposals_cf()?;
        for proposal in &batch.proposals {
            writes.put_cf(
                &proposals_cf,
                proposal.id.to_be_bytes(),
                bincode::serialize(proposal)?,
            );
        }
        self.db.write(writes)?;
        Ok(())
    }
}

impl Clone for Storage {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
