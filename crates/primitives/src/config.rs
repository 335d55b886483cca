//! Hierarchical quorum configuration of an MCMS contract.
//!
//! A [`Config`] is a tree of groups. Every group has a quorum that is reached by counting the
//! direct signers that approved plus the child groups that reached their own quorum. On chain
//! the tree is stored in a fixed-width flat form ([`FlatConfig`]) of at most [`MAX_GROUPS`]
//! groups with a parent pointer per group.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maximum number of groups (root included) the on-chain representation can hold.
pub const MAX_GROUPS: usize = 32;

/// Maximum number of signers the on-chain representation can hold.
pub const MAX_SIGNERS: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid MCMS config: {groups} groups exceed the maximum of {MAX_GROUPS}")]
    ConfigTooLarge { groups: usize },
    #[error("invalid MCMS config: signer {0} appears more than once")]
    DuplicateSigner(Address),
    #[error("invalid MCMS config: quorum {quorum} is not satisfiable by {members} members")]
    InvalidQuorum { quorum: u8, members: usize },
    #[error("invalid MCMS config: config must have at least one signer or group")]
    EmptyGroup,
    #[error("too many signers: {0} max number is {MAX_SIGNERS}")]
    TooManySigners(usize),
    #[error("recovered signer {0} is not a valid signer in the MCMS config")]
    UnknownSigner(Address),
    #[error("invalid flat config: {0}")]
    InvalidFlatConfig(String),
}

/// Recursive quorum configuration.
///
/// Equality ignores the order of `signers` and of `group_signers`: two configs are equal when
/// they authorize exactly the same sets of signers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Number of satisfied members (signers and sub-groups) required at this node.
    pub quorum: u8,
    /// Direct signers of this node.
    #[serde(default)]
    pub signers: Vec<Address>,
    /// Child groups of this node.
    #[serde(default)]
    pub group_signers: Vec<Self>,
}

impl Config {
    /// Creates a config and validates it.
    pub fn new(
        quorum: u8,
        signers: Vec<Address>,
        group_signers: Vec<Self>,
    ) -> Result<Self, ConfigError> {
        let config = Self { quorum, signers, group_signers };
        config.validate()?;
        Ok(config)
    }

    /// Number of groups in the tree, root included.
    pub fn group_count(&self) -> usize {
        1 + self.group_signers.iter().map(Self::group_count).sum::<usize>()
    }

    /// Checks the size bound, the quorum of every group and the global uniqueness of signers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let groups = self.group_count();
        if groups > MAX_GROUPS {
            return Err(ConfigError::ConfigTooLarge { groups });
        }

        self.validate_group()?;

        let mut seen = HashSet::new();
        let mut duplicate = None;
        self.visit_signers(&mut |signer| {
            if !seen.insert(signer) {
                duplicate.get_or_insert(signer);
            }
        });
        duplicate.map_or(Ok(()), |signer| Err(ConfigError::DuplicateSigner(signer)))
    }

    fn validate_group(&self) -> Result<(), ConfigError> {
        let members = self.signers.len() + self.group_signers.len();
        if members == 0 {
            return Err(ConfigError::EmptyGroup);
        }
        if self.quorum == 0 || usize::from(self.quorum) > members {
            return Err(ConfigError::InvalidQuorum { quorum: self.quorum, members });
        }

        self.group_signers.iter().try_for_each(Self::validate_group)
    }

    fn visit_signers<F>(&self, f: &mut F)
    where
        F: FnMut(Address),
    {
        for signer in &self.signers {
            f(*signer);
        }
        for group in &self.group_signers {
            group.visit_signers(f);
        }
    }

    /// All signers of the tree in depth-first order, deduplicated.
    pub fn all_signers(&self) -> Vec<Address> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.visit_signers(&mut |signer| {
            if seen.insert(signer) {
                out.push(signer);
            }
        });
        out
    }

    /// Whether this group reaches its quorum given the set of approving addresses.
    pub fn evaluate(&self, approvals: &HashSet<Address>) -> bool {
        let signer_approvals =
            self.signers.iter().filter(|signer| approvals.contains(*signer)).count();
        let group_approvals =
            self.group_signers.iter().filter(|group| group.evaluate(approvals)).count();

        signer_approvals + group_approvals >= usize::from(self.quorum)
    }

    /// Checks whether the recovered signers are allowed to set a root.
    ///
    /// Fails if any recovered address is not a member of the tree.
    pub fn can_set_root(&self, recovered: &[Address]) -> Result<bool, ConfigError> {
        let members: HashSet<_> = self.all_signers().into_iter().collect();
        if let Some(unknown) = recovered.iter().find(|signer| !members.contains(*signer)) {
            return Err(ConfigError::UnknownSigner(*unknown));
        }

        Ok(self.evaluate(&recovered.iter().copied().collect()))
    }

    /// Flattens the tree into its on-chain form.
    ///
    /// Groups are numbered depth-first starting with the root at index 0, which is its own
    /// parent. Signers are sorted ascending by address.
    pub fn to_flat(&self) -> Result<FlatConfig, ConfigError> {
        self.validate()?;

        let mut quorums = Vec::with_capacity(MAX_GROUPS);
        let mut parents = Vec::with_capacity(MAX_GROUPS);
        let mut signers = Vec::new();
        self.flatten_into(0, &mut quorums, &mut parents, &mut signers);

        if signers.len() > MAX_SIGNERS {
            return Err(ConfigError::TooManySigners(signers.len()));
        }

        signers.sort_by_key(|(address, _)| *address);

        let mut group_quorums = [0u8; MAX_GROUPS];
        let mut group_parents = [0u8; MAX_GROUPS];
        group_quorums[..quorums.len()].copy_from_slice(&quorums);
        group_parents[..parents.len()].copy_from_slice(&parents);

        Ok(FlatConfig {
            signers: signers
                .into_iter()
                .enumerate()
                .map(|(index, (address, group))| FlatSigner {
                    address,
                    // bounded by MAX_SIGNERS above
                    index: index as u8,
                    group,
                })
                .collect(),
            group_quorums,
            group_parents,
        })
    }

    fn flatten_into(
        &self,
        parent: u8,
        quorums: &mut Vec<u8>,
        parents: &mut Vec<u8>,
        signers: &mut Vec<(Address, u8)>,
    ) {
        // bounded by MAX_GROUPS, checked in validate
        let index = quorums.len() as u8;
        quorums.push(self.quorum);
        parents.push(parent);

        signers.extend(self.signers.iter().map(|signer| (*signer, index)));

        for group in &self.group_signers {
            group.flatten_into(index, quorums, parents, signers);
        }
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        if self.quorum != other.quorum
            || self.signers.len() != other.signers.len()
            || self.group_signers.len() != other.group_signers.len()
        {
            return false;
        }

        let mut counts: HashMap<&Address, usize> = HashMap::new();
        for signer in &self.signers {
            *counts.entry(signer).or_default() += 1;
        }
        for signer in &other.signers {
            match counts.get_mut(signer) {
                Some(count) if *count > 0 => *count -= 1,
                _ => return false,
            }
        }

        // each group on the left must be matched by a distinct group on the right
        let mut matched = vec![false; other.group_signers.len()];
        self.group_signers.iter().all(|group| {
            let found = other
                .group_signers
                .iter()
                .enumerate()
                .find(|(i, candidate)| !matched[*i] && *candidate == group)
                .map(|(i, _)| i);
            match found {
                Some(i) => {
                    matched[i] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for Config {}

/// A signer entry of the flat on-chain config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatSigner {
    pub address: Address,
    /// Position of the signer in the ascending address order.
    pub index: u8,
    /// Index of the group the signer belongs to.
    pub group: u8,
}

/// Fixed-width on-chain representation of a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatConfig {
    pub signers: Vec<FlatSigner>,
    pub group_quorums: [u8; MAX_GROUPS],
    pub group_parents: [u8; MAX_GROUPS],
}

impl FlatConfig {
    /// Rebuilds the nested tree from the flat form.
    ///
    /// Groups with a zero quorum (other than the root) are unused slots. Child groups keep the
    /// relative order of their indices.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let mut groups: Vec<Config> = self
            .group_quorums
            .iter()
            .map(|quorum| Config { quorum: *quorum, ..Default::default() })
            .collect();

        for signer in &self.signers {
            let group = usize::from(signer.group);
            if group >= MAX_GROUPS {
                return Err(ConfigError::InvalidFlatConfig(format!(
                    "signer {} references group {group}",
                    signer.address
                )));
            }
            if group != 0 && self.group_quorums[group] == 0 {
                return Err(ConfigError::InvalidFlatConfig(format!(
                    "signer {} references disabled group {group}",
                    signer.address
                )));
            }
            groups[group].signers.push(signer.address);
        }

        for index in (1..MAX_GROUPS).rev() {
            if self.group_quorums[index] == 0 {
                continue;
            }

            let parent = usize::from(self.group_parents[index]);
            if parent >= index {
                return Err(ConfigError::InvalidFlatConfig(format!(
                    "group {index} has parent {parent}, parents must precede their children"
                )));
            }
            if parent != 0 && self.group_quorums[parent] == 0 {
                return Err(ConfigError::InvalidFlatConfig(format!(
                    "group {index} has disabled parent {parent}"
                )));
            }

            let child = std::mem::take(&mut groups[index]);
            groups[parent].group_signers.insert(0, child);
        }

        let root = groups.swap_remove(0);
        root.validate()?;
        Ok(root)
    }
}
