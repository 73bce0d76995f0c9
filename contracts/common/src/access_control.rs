//! Access Control Module
//!
//! Role-based permissions shared by every stablecoin contract.
//!
//! ## Key Features
//!
//! - **Named Roles**: role ids are `keccak256` of the role name
//! - **Role Admins**: each role is granted and revoked by its admin role
//! - **Revert Reasons**: failures carry the exact on-chain reason strings

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};

use crate::errors::{StablecoinError, StablecoinResult};
use crate::events::StablecoinEvent;
use crate::types::CallContext;

/// Admin of every role that has no explicit admin
pub const DEFAULT_ADMIN_ROLE: B256 = B256::ZERO;

// ============================================================================
// Types
// ============================================================================

/// Protocol roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Parameter owner of every contract
    Owner,
    /// Governance, may pause
    Gov,
    /// Pushes collateral prices into pools
    PriceOracle,
    /// Collateral and stablecoin adapters
    Adapter,
    LiquidationEngine,
    StabilityFeeCollector,
    ShowStopper,
    PositionManager,
    /// May mint unbacked stablecoin or tokens
    Mintable,
    /// Ledger writes into pool config
    BookKeeper,
    CollateralManager,
}

impl Role {
    /// Every protocol role
    pub const ALL: [Role; 11] = [
        Role::Owner,
        Role::Gov,
        Role::PriceOracle,
        Role::Adapter,
        Role::LiquidationEngine,
        Role::StabilityFeeCollector,
        Role::ShowStopper,
        Role::PositionManager,
        Role::Mintable,
        Role::BookKeeper,
        Role::CollateralManager,
    ];

    /// Role constant name as declared on chain
    pub fn name(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER_ROLE",
            Role::Gov => "GOV_ROLE",
            Role::PriceOracle => "PRICE_ORACLE_ROLE",
            Role::Adapter => "ADAPTER_ROLE",
            Role::LiquidationEngine => "LIQUIDATION_ENGINE_ROLE",
            Role::StabilityFeeCollector => "STABILITY_FEE_COLLECTOR_ROLE",
            Role::ShowStopper => "SHOW_STOPPER_ROLE",
            Role::PositionManager => "POSITION_MANAGER_ROLE",
            Role::Mintable => "MINTABLE_ROLE",
            Role::BookKeeper => "BOOK_KEEPER_ROLE",
            Role::CollateralManager => "COLLATERAL_MANAGER_ROLE",
        }
    }

    /// Label used in `!<label>` revert reasons
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "ownerRole",
            Role::Gov => "govRole",
            Role::PriceOracle => "priceOracleRole",
            Role::Adapter => "adapterRole",
            Role::LiquidationEngine => "liquidationEngineRole",
            Role::StabilityFeeCollector => "stabilityFeeCollectorRole",
            Role::ShowStopper => "showStopperRole",
            Role::PositionManager => "positionManagerRole",
            Role::Mintable => "mintableRole",
            Role::BookKeeper => "bookKeeperRole",
            Role::CollateralManager => "collateralManagerRole",
        }
    }

    /// Role id: `keccak256(name)`
    pub fn id(&self) -> B256 {
        keccak256(self.name())
    }

    pub fn from_id(id: B256) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }

    /// Parse `OWNER_ROLE` or `ownerRole`
    pub fn from_name(name: &str) -> Option<Role> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == name || role.label() == name)
    }
}

/// Role registry of one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlConfig {
    members: BTreeMap<B256, BTreeSet<Address>>,
    admins: BTreeMap<B256, B256>,
}

impl AccessControlConfig {
    /// Deployer receives `OWNER_ROLE` and `DEFAULT_ADMIN_ROLE`; `OWNER_ROLE`
    /// administers every protocol role
    pub fn new(deployer: Address) -> Self {
        let mut config = Self::default();
        let owner = Role::Owner.id();
        for role in Role::ALL {
            config.admins.insert(role.id(), owner);
        }
        config.members.entry(owner).or_default().insert(deployer);
        config.members.entry(DEFAULT_ADMIN_ROLE).or_default().insert(deployer);
        config
    }

    pub fn has_role(&self, role: B256, account: Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(&account))
    }

    /// `has_role` for a protocol role
    pub fn has(&self, role: Role, account: Address) -> bool {
        self.has_role(role.id(), account)
    }

    pub fn get_role_admin(&self, role: B256) -> B256 {
        self.admins.get(&role).copied().unwrap_or(DEFAULT_ADMIN_ROLE)
    }

    fn check_role(&self, role: B256, account: Address) -> StablecoinResult<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(StablecoinError::MissingRole { account, role })
        }
    }

    /// Grant `role`; the sender must hold its admin role
    pub fn grant_role(&mut self, ctx: &mut CallContext, role: B256, account: Address) -> StablecoinResult<()> {
        self.check_role(self.get_role_admin(role), ctx.sender)?;

        if self.members.entry(role).or_default().insert(account) {
            ctx.emit(StablecoinEvent::RoleGranted {
                role,
                account,
                sender: ctx.sender,
                timestamp: ctx.timestamp,
            });
        }
        Ok(())
    }

    /// Revoke `role`; the sender must hold its admin role
    pub fn revoke_role(&mut self, ctx: &mut CallContext, role: B256, account: Address) -> StablecoinResult<()> {
        self.check_role(self.get_role_admin(role), ctx.sender)?;
        self.remove_member(ctx, role, account);
        Ok(())
    }

    /// Drop a role held by the sender
    pub fn renounce_role(&mut self, ctx: &mut CallContext, role: B256, account: Address) -> StablecoinResult<()> {
        if account != ctx.sender {
            return Err(StablecoinError::RenounceForOther);
        }
        self.remove_member(ctx, role, account);
        Ok(())
    }

    fn remove_member(&mut self, ctx: &mut CallContext, role: B256, account: Address) {
        let removed = self
            .members
            .get_mut(&role)
            .is_some_and(|members| members.remove(&account));
        if removed {
            ctx.emit(StablecoinEvent::RoleRevoked {
                role,
                account,
                sender: ctx.sender,
                timestamp: ctx.timestamp,
            });
        }
    }

    /// Change the admin of `role` (owner only)
    pub fn set_role_admin(&mut self, ctx: &mut CallContext, role: B256, admin: B256) -> StablecoinResult<()> {
        self.require_owner(ctx.sender)?;

        let previous_admin = self.get_role_admin(role);
        self.admins.insert(role, admin);
        ctx.emit(StablecoinEvent::RoleAdminChanged {
            role,
            previous_admin,
            new_admin: admin,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// Role ids held by `account`
    pub fn roles_of(&self, account: Address) -> Vec<B256> {
        self.members
            .iter()
            .filter(|(_, members)| members.contains(&account))
            .map(|(role, _)| *role)
            .collect()
    }

    pub fn members_of(&self, role: B256) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    // ============ Guards ============

    /// Fails with `!<role>` unless `account` holds `role`
    pub fn require_role(&self, role: Role, account: Address) -> StablecoinResult<()> {
        if self.has(role, account) {
            Ok(())
        } else {
            Err(StablecoinError::RoleRequired { role })
        }
    }

    pub fn require_owner(&self, account: Address) -> StablecoinResult<()> {
        if self.has(Role::Owner, account) {
            Ok(())
        } else {
            Err(StablecoinError::NotOwner)
        }
    }

    pub fn require_owner_or_gov(&self, account: Address) -> StablecoinResult<()> {
        if self.has(Role::Owner, account) || self.has(Role::Gov, account) {
            Ok(())
        } else {
            Err(StablecoinError::NotOwnerOrGov)
        }
    }
}
