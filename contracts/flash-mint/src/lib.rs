//! Flash Mint Module
//!
//! Lends freshly minted stablecoin for the duration of one call. The loan
//! is minted as unbacked ledger stablecoin, handed to the receiver, and
//! must come back with a fee before the call ends.
//!
//! ## Loan Kinds
//!
//! - **flash_loan** (ERC-3156): ERC-20 stablecoin, withdrawn through the
//!   stablecoin adapter and deposited back afterwards
//! - **book_keeper_flash_loan**: ledger stablecoin (rad), no token round trip
//!
//! ## Atomicity
//!
//! A failing loan restores the ledger, the token and the module, and drops
//! every event the loan emitted.
//!
//! ## Fees
//!
//! `fee = amount * fee_rate / WAD`. Fees accumulate with the module;
//! `convert` moves ERC-20 fees into the ledger and `accrue` sends ledger
//! fees to the system debt engine.

use serde::{Deserialize, Serialize};

use stablecoin_book_keeper::BookKeeper;
use stablecoin_common::{
    constants::{
        flash_mint::DEFAULT_FEE_RATE_WAD,
        precision::RAY,
    },
    errors::{StablecoinError, StablecoinResult},
    events::StablecoinEvent,
    math,
    types::{Address, CallContext, U256},
};

pub mod borrower;

pub use borrower::{
    book_keeper_callback_success, callback_success, BookKeeperFlashBorrower, FlashBorrower, FlashLoanTerms,
    FlashMintDeps,
};

const CONTRACT: &str = "FlashMintModule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMintModule {
    pub address: Address,
    /// ERC-20 stablecoin lent by `flash_loan`
    pub stablecoin: Address,
    pub stablecoin_adapter: Address,
    pub system_debt_engine: Address,
    /// Largest loan [wad]
    pub max: U256,
    /// Fee per unit lent [wad]
    pub fee_rate: U256,
    pub flash_lending_enabled: bool,
    locked: bool,
}

impl FlashMintModule {
    /// Deploy at `address`
    ///
    /// The module lets the stablecoin adapter move its ledger stablecoin
    /// and spend its ERC-20 balance, as the adapter round trip requires.
    pub fn new(
        ctx: &mut CallContext,
        address: Address,
        deps: &mut FlashMintDeps<'_>,
        system_debt_engine: Address,
    ) -> StablecoinResult<Self> {
        let adapter = deps.stablecoin_adapter.address;
        ctx.call_as(address, |ctx| {
            deps.book_keeper.whitelist(ctx, adapter)?;
            deps.stablecoin.approve(ctx, adapter, U256::MAX)
        })?;

        Ok(Self {
            address,
            stablecoin: deps.stablecoin.address,
            stablecoin_adapter: adapter,
            system_debt_engine,
            max: U256::ZERO,
            fee_rate: U256::from(DEFAULT_FEE_RATE_WAD),
            flash_lending_enabled: false,
            locked: false,
        })
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // ============ Owner Setters ============

    pub fn set_max(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper, wad: U256) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        // ledger loans compare against max * RAY
        if wad > U256::MAX / RAY {
            return Err(StablecoinError::FlashCeilingTooHigh);
        }

        self.max = wad;
        self.emit_uint(ctx, "Max", wad);
        Ok(())
    }

    pub fn set_fee_rate(&mut self, ctx: &mut CallContext, book_keeper: &BookKeeper, wad: U256) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;

        self.fee_rate = wad;
        self.emit_uint(ctx, "FeeRate", wad);
        Ok(())
    }

    pub fn set_flash_lending_enabled(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &BookKeeper,
        enabled: bool,
    ) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;

        self.flash_lending_enabled = enabled;
        ctx.emit(StablecoinEvent::BoolParameterSet {
            contract: CONTRACT.into(),
            param: "FlashLendingEnabled".into(),
            value: enabled,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    pub fn set_system_debt_engine(
        &mut self,
        ctx: &mut CallContext,
        book_keeper: &BookKeeper,
        engine: Address,
    ) -> StablecoinResult<()> {
        book_keeper.access_control().require_owner(ctx.sender)?;
        if engine.is_zero() {
            return Err(StablecoinError::ZeroAddress {
                contract: CONTRACT,
                param: "system-debt-engine",
            });
        }

        self.system_debt_engine = engine;
        ctx.emit(StablecoinEvent::AddressParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: "SystemDebtEngine".into(),
            value: engine,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    fn emit_uint(&self, ctx: &mut CallContext, param: &str, value: U256) {
        ctx.emit(StablecoinEvent::UintParameterSet {
            contract: CONTRACT.into(),
            pool: None,
            param: param.into(),
            value,
            timestamp: ctx.timestamp,
        });
    }

    // ============ ERC-3156 Views ============

    /// Largest loan of `token` available right now
    pub fn max_flash_loan(&self, token: Address) -> U256 {
        if token == self.stablecoin && self.flash_lending_enabled && !self.locked {
            self.max
        } else {
            U256::ZERO
        }
    }

    pub fn flash_fee(&self, token: Address, amount: U256) -> StablecoinResult<U256> {
        if token != self.stablecoin {
            return Err(StablecoinError::TokenUnsupported { token });
        }
        math::wmul(amount, self.fee_rate)
    }

    // ============ Flash Loans ============

    fn require_available(&self) -> StablecoinResult<()> {
        if !self.flash_lending_enabled {
            return Err(StablecoinError::FlashLendingDisabled);
        }
        if self.locked {
            return Err(StablecoinError::ReentrantCall);
        }
        Ok(())
    }

    /// Lend `amount` ERC-20 stablecoin to `receiver` for one callback
    pub fn flash_loan(
        &mut self,
        ctx: &mut CallContext,
        deps: &mut FlashMintDeps<'_>,
        receiver: &mut dyn FlashBorrower,
        token: Address,
        amount: U256,
        data: &[u8],
    ) -> StablecoinResult<()> {
        // 1. Validate the request
        self.require_available()?;
        let fee = self.flash_fee(token, amount)?;
        if amount > self.max {
            return Err(StablecoinError::FlashCeilingExceeded {
                requested: amount,
                maximum: self.max,
            });
        }
        let terms = FlashLoanTerms {
            initiator: ctx.sender,
            token,
            amount,
            fee,
        };

        // 2. Run the loan, restoring everything on failure
        let saved = (self.clone(), deps.snapshot(), ctx.checkpoint());
        self.locked = true;
        let result = self.run_flash_loan(ctx, deps, receiver, &terms, data);
        self.locked = false;

        if result.is_err() {
            let (module, contracts, checkpoint) = saved;
            *self = module;
            deps.restore(contracts);
            ctx.revert_to(checkpoint);
        }
        result
    }

    fn run_flash_loan(
        &mut self,
        ctx: &mut CallContext,
        deps: &mut FlashMintDeps<'_>,
        receiver: &mut dyn FlashBorrower,
        terms: &FlashLoanTerms,
        data: &[u8],
    ) -> StablecoinResult<()> {
        let module = self.address;
        let borrower = receiver.address();
        let rad = math::wad_to_rad(terms.amount)?;
        let total = math::add(terms.amount, terms.fee)?;

        // 1. Mint against the module and withdraw to the receiver
        ctx.call_as(module, |ctx| {
            deps.book_keeper.mint_unbacked_stablecoin(ctx, module, module, rad)?;
            deps.stablecoin_adapter
                .withdraw(ctx, deps.book_keeper, deps.stablecoin, borrower, terms.amount)
        })?;
        ctx.emit(StablecoinEvent::FlashLoan {
            receiver: borrower,
            token: terms.token,
            amount: terms.amount,
            fee: terms.fee,
            timestamp: ctx.timestamp,
        });

        // 2. Hand control to the receiver
        let magic = ctx.call_as(module, |ctx| receiver.on_flash_loan(ctx, self, deps, terms, data))?;
        if magic != callback_success() {
            return Err(StablecoinError::FlashCallbackFailed);
        }

        // 3. Pull back principal plus fee and retire the minted debt
        ctx.call_as(module, |ctx| {
            deps.stablecoin.transfer_from(ctx, borrower, module, total)?;
            deps.stablecoin_adapter
                .deposit(ctx, deps.book_keeper, deps.stablecoin, module, total)?;
            deps.book_keeper.settle_system_bad_debt(ctx, rad)
        })
    }

    /// Lend `rad` ledger stablecoin to `receiver` for one callback
    pub fn book_keeper_flash_loan(
        &mut self,
        ctx: &mut CallContext,
        deps: &mut FlashMintDeps<'_>,
        receiver: &mut dyn BookKeeperFlashBorrower,
        rad: U256,
        data: &[u8],
    ) -> StablecoinResult<()> {
        self.require_available()?;
        let maximum = math::mul(self.max, RAY)?;
        if rad > maximum {
            return Err(StablecoinError::FlashCeilingExceeded { requested: rad, maximum });
        }
        let terms = FlashLoanTerms {
            initiator: ctx.sender,
            token: deps.book_keeper.address,
            amount: rad,
            fee: math::wmul(rad, self.fee_rate)?,
        };

        let saved = (self.clone(), deps.snapshot(), ctx.checkpoint());
        self.locked = true;
        let result = self.run_book_keeper_flash_loan(ctx, deps, receiver, &terms, data);
        self.locked = false;

        if result.is_err() {
            let (module, contracts, checkpoint) = saved;
            *self = module;
            deps.restore(contracts);
            ctx.revert_to(checkpoint);
        }
        result
    }

    fn run_book_keeper_flash_loan(
        &mut self,
        ctx: &mut CallContext,
        deps: &mut FlashMintDeps<'_>,
        receiver: &mut dyn BookKeeperFlashBorrower,
        terms: &FlashLoanTerms,
        data: &[u8],
    ) -> StablecoinResult<()> {
        let module = self.address;
        let borrower = receiver.address();
        let previous = deps.book_keeper.stablecoin(module);

        ctx.call_as(module, |ctx| {
            deps.book_keeper.mint_unbacked_stablecoin(ctx, module, borrower, terms.amount)
        })?;
        ctx.emit(StablecoinEvent::BookKeeperFlashLoan {
            receiver: borrower,
            rad: terms.amount,
            fee: terms.fee,
            timestamp: ctx.timestamp,
        });

        let magic = ctx.call_as(module, |ctx| {
            receiver.on_book_keeper_flash_loan(ctx, self, deps, terms, data)
        })?;
        if magic != book_keeper_callback_success() {
            return Err(StablecoinError::FlashCallbackFailed);
        }

        ctx.call_as(module, |ctx| deps.book_keeper.settle_system_bad_debt(ctx, terms.amount))?;
        if deps.book_keeper.stablecoin(module) < math::add(previous, terms.fee)? {
            return Err(StablecoinError::InvalidInput {
                contract: CONTRACT,
                reason: "insufficient-fee",
            });
        }
        Ok(())
    }

    // ============ Fee Handling ============

    /// Deposit the module's ERC-20 stablecoin into the ledger
    pub fn convert(&self, ctx: &mut CallContext, deps: &mut FlashMintDeps<'_>) -> StablecoinResult<()> {
        let module = self.address;
        let balance = deps.stablecoin.balance_of(module);
        ctx.call_as(module, |ctx| {
            deps.stablecoin_adapter
                .deposit(ctx, deps.book_keeper, deps.stablecoin, module, balance)
        })
    }

    /// Send the module's ledger stablecoin to the system debt engine
    pub fn accrue(&self, ctx: &mut CallContext, book_keeper: &mut BookKeeper) -> StablecoinResult<()> {
        let (module, engine) = (self.address, self.system_debt_engine);
        let rad = book_keeper.stablecoin(module);
        ctx.call_as(module, |ctx| book_keeper.move_stablecoin(ctx, module, engine, rad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use stablecoin_adapters::StablecoinAdapter;
    use stablecoin_book_keeper::CollateralPoolConfig;
    use stablecoin_common::{
        constants::precision::{RAD, WAD},
        events::EventType,
        AccessControlConfig, Role,
    };
    use stablecoin_token::Erc20Token;

    fn owner() -> Address {
        Address::with_last_byte(1)
    }

    fn engine() -> Address {
        Address::with_last_byte(0xde)
    }

    fn wad(units: u64) -> U256 {
        WAD * U256::from(units)
    }

    // ============ Borrowers ============

    /// Repays `amount + fee` and records what it was lent
    struct RepayingBorrower {
        address: Address,
        seen: Option<FlashLoanTerms>,
    }

    impl FlashBorrower for RepayingBorrower {
        fn address(&self) -> Address {
            self.address
        }

        fn on_flash_loan(
            &mut self,
            ctx: &mut CallContext,
            _module: &mut FlashMintModule,
            deps: &mut FlashMintDeps<'_>,
            terms: &FlashLoanTerms,
            _data: &[u8],
        ) -> StablecoinResult<B256> {
            self.seen = Some(*terms);
            let module = ctx.sender;
            ctx.call_as(self.address, |ctx| deps.stablecoin.approve(ctx, module, terms.amount + terms.fee))?;
            Ok(callback_success())
        }
    }

    impl BookKeeperFlashBorrower for RepayingBorrower {
        fn address(&self) -> Address {
            self.address
        }

        fn on_book_keeper_flash_loan(
            &mut self,
            ctx: &mut CallContext,
            _module: &mut FlashMintModule,
            deps: &mut FlashMintDeps<'_>,
            terms: &FlashLoanTerms,
            _data: &[u8],
        ) -> StablecoinResult<B256> {
            self.seen = Some(*terms);
            let (module, me) = (ctx.sender, self.address);
            ctx.call_as(me, |ctx| deps.book_keeper.move_stablecoin(ctx, me, module, terms.amount + terms.fee))?;
            Ok(book_keeper_callback_success())
        }
    }

    /// Returns the principal and keeps the fee
    struct PrincipalOnlyBorrower;

    impl BookKeeperFlashBorrower for PrincipalOnlyBorrower {
        fn address(&self) -> Address {
            Address::with_last_byte(0xb2)
        }

        fn on_book_keeper_flash_loan(
            &mut self,
            ctx: &mut CallContext,
            _module: &mut FlashMintModule,
            deps: &mut FlashMintDeps<'_>,
            terms: &FlashLoanTerms,
            _data: &[u8],
        ) -> StablecoinResult<B256> {
            let (module, me) = (ctx.sender, self.address());
            ctx.call_as(me, |ctx| deps.book_keeper.move_stablecoin(ctx, me, module, terms.amount))?;
            Ok(book_keeper_callback_success())
        }
    }

    /// Keeps the loan and answers with `magic`
    struct DefaultingBorrower {
        magic: B256,
    }

    impl FlashBorrower for DefaultingBorrower {
        fn address(&self) -> Address {
            Address::with_last_byte(0xd0)
        }

        fn on_flash_loan(
            &mut self,
            _ctx: &mut CallContext,
            _module: &mut FlashMintModule,
            _deps: &mut FlashMintDeps<'_>,
            _terms: &FlashLoanTerms,
            _data: &[u8],
        ) -> StablecoinResult<B256> {
            Ok(self.magic)
        }
    }

    /// Tries to borrow again from inside the callback
    struct ReentrantBorrower;

    impl FlashBorrower for ReentrantBorrower {
        fn address(&self) -> Address {
            Address::with_last_byte(0xee)
        }

        fn on_flash_loan(
            &mut self,
            ctx: &mut CallContext,
            module: &mut FlashMintModule,
            deps: &mut FlashMintDeps<'_>,
            terms: &FlashLoanTerms,
            data: &[u8],
        ) -> StablecoinResult<B256> {
            let mut inner = DefaultingBorrower { magic: callback_success() };
            module.flash_loan(ctx, deps, &mut inner, terms.token, terms.amount, data)?;
            Ok(callback_success())
        }
    }

    // ============ Fixture ============

    struct Fixture {
        ctx: CallContext,
        book_keeper: BookKeeper,
        stablecoin: Erc20Token,
        adapter: StablecoinAdapter,
        module: FlashMintModule,
    }

    impl Fixture {
        fn new() -> Self {
            let mut ctx = CallContext::new(owner(), 1_000);
            let config = CollateralPoolConfig::new(Address::with_last_byte(0xcc), AccessControlConfig::new(owner()));
            let mut book_keeper = BookKeeper::new(Address::with_last_byte(0xbb), config);
            let mut stablecoin = Erc20Token::stablecoin(Address::with_last_byte(0x5c));
            let adapter = StablecoinAdapter::new(Address::with_last_byte(0x5a), stablecoin.address);
            let module_address = Address::with_last_byte(0xf1);

            for account in [owner(), adapter.address, module_address] {
                book_keeper.access_control_mut().grant_role(&mut ctx, Role::Mintable.id(), account).unwrap();
            }

            let mut deps = FlashMintDeps {
                book_keeper: &mut book_keeper,
                stablecoin: &mut stablecoin,
                stablecoin_adapter: &adapter,
            };
            let mut module = FlashMintModule::new(&mut ctx, module_address, &mut deps, engine()).unwrap();
            module.set_max(&mut ctx, &book_keeper, wad(1_000_000)).unwrap();
            module.set_flash_lending_enabled(&mut ctx, &book_keeper, true).unwrap();

            Self {
                ctx,
                book_keeper,
                stablecoin,
                adapter,
                module,
            }
        }

        /// Give `to` adapter-backed ERC-20 stablecoin
        fn fund(&mut self, to: Address, amount: U256) {
            let Fixture { ctx, book_keeper, stablecoin, adapter, .. } = self;
            let rad = amount * RAY;
            book_keeper.mint_unbacked_stablecoin(ctx, owner(), owner(), rad).unwrap();
            book_keeper.whitelist(ctx, adapter.address).unwrap();
            adapter.withdraw(ctx, book_keeper, stablecoin, to, amount).unwrap();
        }

        fn flash_loan(&mut self, receiver: &mut dyn FlashBorrower, amount: U256) -> StablecoinResult<()> {
            let Fixture { ctx, book_keeper, stablecoin, adapter, module } = self;
            let token = stablecoin.address;
            let mut deps = FlashMintDeps {
                book_keeper,
                stablecoin,
                stablecoin_adapter: adapter,
            };
            module.flash_loan(ctx, &mut deps, receiver, token, amount, b"")
        }

        fn book_keeper_flash_loan(&mut self, receiver: &mut dyn BookKeeperFlashBorrower, rad: U256) -> StablecoinResult<()> {
            let Fixture { ctx, book_keeper, stablecoin, adapter, module } = self;
            let mut deps = FlashMintDeps {
                book_keeper,
                stablecoin,
                stablecoin_adapter: adapter,
            };
            module.book_keeper_flash_loan(ctx, &mut deps, receiver, rad, b"")
        }
    }

    fn borrower() -> RepayingBorrower {
        RepayingBorrower {
            address: Address::with_last_byte(0xb1),
            seen: None,
        }
    }

    // ============ Tests ============

    #[test]
    fn test_flash_loan_repaid_with_fee() {
        let mut f = Fixture::new();
        let mut receiver = borrower();
        // 0.05% of 10
        let fee = wad(10) * U256::from(DEFAULT_FEE_RATE_WAD) / WAD;
        f.fund(receiver.address, fee);

        f.flash_loan(&mut receiver, wad(10)).unwrap();

        let seen = receiver.seen.unwrap();
        assert_eq!(seen.amount, wad(10));
        assert_eq!(seen.fee, fee);
        assert_eq!(seen.initiator, owner());
        assert_eq!(f.stablecoin.balance_of(receiver.address), U256::ZERO);
        assert_eq!(f.book_keeper.system_bad_debt(f.module.address), U256::ZERO);
        assert_eq!(f.book_keeper.stablecoin(f.module.address), fee * RAY);
        assert!(!f.module.is_locked());
        assert_eq!(f.ctx.events.filter_by_type(EventType::FlashLoan).len(), 1);
    }

    #[test]
    fn test_flash_loan_without_repayment_restores_state() {
        let mut f = Fixture::new();
        let (book_keeper, stablecoin, events) = (f.book_keeper.clone(), f.stablecoin.clone(), f.ctx.events.len());
        let mut receiver = DefaultingBorrower { magic: callback_success() };

        let result = f.flash_loan(&mut receiver, wad(10));

        // holds the principal but not the fee
        assert!(matches!(result, Err(StablecoinError::InsufficientBalance { .. })));
        assert_eq!(f.book_keeper, book_keeper);
        assert_eq!(f.stablecoin, stablecoin);
        assert_eq!(f.ctx.events.len(), events);
        assert!(!f.module.is_locked());
    }

    #[test]
    fn test_flash_loan_wrong_magic() {
        let mut f = Fixture::new();
        let mut receiver = DefaultingBorrower { magic: B256::ZERO };

        let result = f.flash_loan(&mut receiver, wad(1));
        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/callback-failed");
        assert_eq!(f.stablecoin.total_supply, U256::ZERO);
    }

    #[test]
    fn test_flash_loan_reentrancy() {
        let mut f = Fixture::new();

        let result = f.flash_loan(&mut ReentrantBorrower, wad(1));
        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/reentrancy-guard");
        assert!(!f.module.is_locked());
    }

    #[test]
    fn test_flash_loan_limits() {
        let mut f = Fixture::new();
        let mut receiver = borrower();

        let result = f.flash_loan(&mut receiver, wad(1_000_001));
        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/ceiling-exceeded");

        let Fixture { ctx, book_keeper, module, .. } = &mut f;
        module.set_flash_lending_enabled(ctx, book_keeper, false).unwrap();
        let result = f.flash_loan(&mut receiver, wad(1));
        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/flash-lending-disabled");
        assert!(receiver.seen.is_none());
    }

    #[test]
    fn test_erc3156_views() {
        let f = Fixture::new();
        let token = f.stablecoin.address;
        let other = Address::with_last_byte(0x99);

        assert_eq!(f.module.max_flash_loan(token), wad(1_000_000));
        assert_eq!(f.module.max_flash_loan(other), U256::ZERO);
        assert_eq!(f.module.flash_fee(token, wad(10_000)).unwrap(), wad(5));

        let result = f.module.flash_fee(other, wad(1));
        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/token-unsupported");
    }

    #[test]
    fn test_set_max_bounds() {
        let mut f = Fixture::new();
        let Fixture { ctx, book_keeper, module, .. } = &mut f;

        let result = module.set_max(ctx, book_keeper, U256::MAX / RAY + U256::from(1u64));
        assert!(matches!(result, Err(StablecoinError::FlashCeilingTooHigh)));

        let result = ctx.call_as(engine(), |ctx| module.set_max(ctx, book_keeper, wad(1)));
        assert_eq!(result.unwrap_err().to_string(), "!ownerRole");
    }

    #[test]
    fn test_book_keeper_flash_loan() {
        let mut f = Fixture::new();
        let mut receiver = borrower();
        let rad = RAD * U256::from(100u64);
        let fee = rad * U256::from(DEFAULT_FEE_RATE_WAD) / WAD;
        let Fixture { ctx, book_keeper, .. } = &mut f;
        book_keeper.mint_unbacked_stablecoin(ctx, owner(), receiver.address, fee).unwrap();

        f.book_keeper_flash_loan(&mut receiver, rad).unwrap();

        assert_eq!(receiver.seen.unwrap().token, f.book_keeper.address);
        assert_eq!(f.book_keeper.stablecoin(f.module.address), fee);
        assert_eq!(f.book_keeper.stablecoin(receiver.address), U256::ZERO);
        assert_eq!(f.ctx.events.filter_by_type(EventType::BookKeeperFlashLoan).len(), 1);
    }

    #[test]
    fn test_book_keeper_flash_loan_without_fee() {
        let mut f = Fixture::new();
        let mut receiver = borrower();
        let before = f.book_keeper.clone();

        let result = f.book_keeper_flash_loan(&mut receiver, RAD);
        assert!(result.is_err());
        assert_eq!(f.book_keeper, before);
    }

    #[test]
    fn test_book_keeper_flash_loan_principal_only() {
        let mut f = Fixture::new();
        let mut receiver = PrincipalOnlyBorrower;
        let rad = RAD * U256::from(100u64);
        let fee = rad * U256::from(DEFAULT_FEE_RATE_WAD) / WAD;
        let Fixture { ctx, book_keeper, .. } = &mut f;
        // could pay the fee but does not
        book_keeper.mint_unbacked_stablecoin(ctx, owner(), receiver.address(), fee).unwrap();
        let (before, events) = (f.book_keeper.clone(), f.ctx.events.len());

        let result = f.book_keeper_flash_loan(&mut receiver, rad);

        assert_eq!(result.unwrap_err().to_string(), "FlashMintModule/insufficient-fee");
        assert_eq!(f.book_keeper, before);
        assert_eq!(f.book_keeper.stablecoin(receiver.address()), fee);
        assert_eq!(f.ctx.events.len(), events);
        assert!(!f.module.is_locked());
    }

    #[test]
    fn test_convert_and_accrue_fees() {
        let mut f = Fixture::new();
        let module = f.module.address;
        f.fund(module, wad(3));

        let Fixture { ctx, book_keeper, stablecoin, adapter, module: flash } = &mut f;
        let mut deps = FlashMintDeps {
            book_keeper,
            stablecoin,
            stablecoin_adapter: adapter,
        };
        flash.convert(ctx, &mut deps).unwrap();
        assert_eq!(f.stablecoin.balance_of(module), U256::ZERO);
        assert_eq!(f.book_keeper.stablecoin(module), RAD * U256::from(3u64));

        let Fixture { ctx, book_keeper, module: flash, .. } = &mut f;
        flash.accrue(ctx, book_keeper).unwrap();
        assert_eq!(f.book_keeper.stablecoin(engine()), RAD * U256::from(3u64));
        assert_eq!(f.book_keeper.stablecoin(module), U256::ZERO);
    }
}
