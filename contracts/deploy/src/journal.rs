//! Deployment Journal
//!
//! Record of scripts already executed on a network, stored as borsh. A
//! script whose tag is journaled is skipped; if its content changed since,
//! running it again is refused.

use borsh::{BorshDeserialize, BorshSerialize};

use stablecoin_common::errors::{StablecoinError, StablecoinResult};

use crate::script::ConfigScript;

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct JournalEntry {
    pub tag: String,
    /// SHA-256 of the script as executed
    pub digest: [u8; 32],
    /// Block time of execution
    pub executed_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DeploymentJournal {
    entries: Vec<JournalEntry>,
}

impl DeploymentJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry(&self, tag: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| entry.tag == tag)
    }

    /// True when `script` ran before with the same content
    pub fn is_executed(&self, script: &ConfigScript) -> StablecoinResult<bool> {
        match self.entry(&script.tag) {
            None => Ok(false),
            Some(entry) if entry.digest == script.digest()? => Ok(true),
            Some(_) => Err(StablecoinError::ScriptChanged { tag: script.tag.clone() }),
        }
    }

    pub fn record(&mut self, script: &ConfigScript, executed_at: u64) -> StablecoinResult<()> {
        let digest = script.digest()?;
        self.entries.retain(|entry| entry.tag != script.tag);
        self.entries.push(JournalEntry {
            tag: script.tag.clone(),
            digest,
            executed_at,
        });
        Ok(())
    }

    pub fn to_bytes(&self) -> StablecoinResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|e| StablecoinError::Encoding { reason: e.to_string() })
    }

    pub fn from_bytes(bytes: &[u8]) -> StablecoinResult<Self> {
        Self::try_from_slice(bytes).map_err(|e| StablecoinError::Encoding { reason: e.to_string() })
    }
}
