use concordium_std::*;
pub use sale_utils::{
    error::{ContractError, ContractResult, CustomContractError},
    types::*,
    FAMILY_LOCK_DAYS, FAMILY_SUPPLY, LOCK_ACCOUNT, MIN_CONTRIBUTION_MICRO_CCD,
    OWNERSHIP_LOCK_DAYS, SALE_SOFTCAP, TOTAL_SUPPLY, TRANSFER_LOCK_DAYS,
};

/// The contract state
#[derive(Debug, Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Administrator account, replaced via `transferOwnership`
    pub(crate) admin: AccountAddress,
    /// Account the accepted contribution value is forwarded to
    pub(crate) treasury: AccountAddress,
    /// Sale timetable, fixed at init
    pub(crate) schedule: SaleSchedule,
    /// µEDC issued by purchases. One running counter for all phases
    pub(crate) total_sold: CoinAmount,
    /// µCCD accepted so far; refunds after a soft-cap miss subtract from it
    pub(crate) total_raised: Amount,
    /// Set once by `unlockFamilyCoins`
    pub(crate) family_released: bool,
    /// Coin balances
    pub(crate) balances: StateMap<Address, CoinAmount, S>,
    /// (owner, spender) to remaining allowance
    pub(crate) allowances: StateMap<(Address, Address), CoinAmount, S>,
    /// Cumulative accepted µCCD per contributor, the refund basis
    pub(crate) contributions: StateMap<AccountAddress, Amount, S>,
}

impl<S: HasStateApi> State<S> {
    /// Genesis distribution: the sale stock and project allotment to the
    /// administrator, the family reserve to the sentinel lock account.
    pub(crate) fn new(
        state_builder: &mut StateBuilder<S>,
        admin: AccountAddress,
        treasury: AccountAddress,
        schedule: SaleSchedule,
    ) -> Self {
        let mut state = State {
            admin,
            treasury,
            schedule,
            total_sold: 0u64.into(),
            total_raised: Amount::zero(),
            family_released: false,
            balances: state_builder.new_map(),
            allowances: state_builder.new_map(),
            contributions: state_builder.new_map(),
        };
        state
            .balances
            .insert(Address::Account(admin), (TOTAL_SUPPLY - FAMILY_SUPPLY).into());
        state
            .balances
            .insert(Address::Account(LOCK_ACCOUNT), FAMILY_SUPPLY.into());
        state
    }

    pub(crate) fn balance_of(&self, addr: &Address) -> CoinAmount {
        self.balances.get(addr).map(|v| *v).unwrap_or_else(|| 0u64.into())
    }

    pub(crate) fn allowance(&self, owner: &Address, spender: &Address) -> CoinAmount {
        self.allowances
            .get(&(*owner, *spender))
            .map(|v| *v)
            .unwrap_or_else(|| 0u64.into())
    }

    /// Overwrites any prior allowance, it is not additive.
    pub(crate) fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: CoinAmount) {
        let _ = self.allowances.insert((*owner, *spender), amount);
    }

    /// Caller must have checked the allowance covers `amount`.
    pub(crate) fn consume_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: CoinAmount,
    ) -> ContractResult<()> {
        let mut entry = self
            .allowances
            .entry((*owner, *spender))
            .or_insert_with(|| 0u64.into());
        ensure!(*entry >= amount, CustomContractError::InsufficientAllowance.into());
        *entry -= amount;
        Ok(())
    }

    pub(crate) fn transfer_coins(
        &mut self,
        from: &Address,
        to: &Address,
        amount: CoinAmount,
    ) -> ContractResult<()> {
        ensure!(self.balance_of(from) >= amount, ContractError::InsufficientFunds);
        {
            let mut from_balance = self.balances.entry(*from).or_insert_with(|| 0u64.into());
            *from_balance -= amount;
        }
        let mut to_balance = self.balances.entry(*to).or_insert_with(|| 0u64.into());
        *to_balance += amount;
        Ok(())
    }

    /// Issues sold coins out of the administrator's stock.
    pub(crate) fn issue(&mut self, beneficiary: &Address, coins: CoinAmount) -> ContractResult<()> {
        let stock = Address::Account(self.admin);
        self.transfer_coins(&stock, beneficiary, coins)
    }

    pub(crate) fn record_contribution(
        &mut self,
        buyer: &AccountAddress,
        accepted: Amount,
        coins: CoinAmount,
    ) {
        self.total_sold += coins;
        self.total_raised += accepted;
        let mut contribution = self.contributions.entry(*buyer).or_insert_with(Amount::zero);
        *contribution += accepted;
    }

    pub(crate) fn contribution_of(&self, account: &AccountAddress) -> Amount {
        self.contributions
            .get(account)
            .map(|v| *v)
            .unwrap_or_else(Amount::zero)
    }

    /// Takes the whole refundable contribution, leaving a zero entry so a
    /// repeat claim finds nothing owed.
    pub(crate) fn take_contribution(&mut self, account: &AccountAddress) -> Amount {
        match self.contributions.get_mut(account) {
            Some(mut entry) => {
                let paid = *entry;
                *entry = Amount::zero();
                paid
            }
            None => Amount::zero(),
        }
    }

    /// Moves the entire family reserve to the administrator. The caller
    /// checks authorization and the lock gate.
    pub(crate) fn release_family(&mut self) -> ContractResult<CoinAmount> {
        let locked = self.balance_of(&Address::Account(LOCK_ACCOUNT));
        let admin = Address::Account(self.admin);
        self.transfer_coins(&Address::Account(LOCK_ACCOUNT), &admin, locked)?;
        self.family_released = true;
        Ok(locked)
    }
}

#[cfg(any(feature = "wasm-test", test))]
/// implements PartialEq for `claim_eq` inside test functions.
impl<S: HasStateApi> PartialEq for State<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.admin != other.admin {
            return false;
        }
        if self.treasury != other.treasury {
            return false;
        }
        if self.schedule != other.schedule {
            return false;
        }
        if self.total_sold != other.total_sold {
            return false;
        }
        if self.total_raised != other.total_raised {
            return false;
        }
        if self.family_released != other.family_released {
            return false;
        }
        if self.balances.iter().count() != other.balances.iter().count() {
            return false;
        }
        for (addr, balance) in self.balances.iter() {
            let other_balance = other.balances.get(&addr);
            if other_balance.is_none() {
                return false;
            }
            if *balance != *other_balance.unwrap() {
                return false;
            }
        }
        if self.allowances.iter().count() != other.allowances.iter().count() {
            return false;
        }
        for (key, allowance) in self.allowances.iter() {
            let other_allowance = other.allowances.get(&key);
            if other_allowance.is_none() {
                return false;
            }
            if *allowance != *other_allowance.unwrap() {
                return false;
            }
        }
        if self.contributions.iter().count() != other.contributions.iter().count() {
            return false;
        }
        for (account, paid) in self.contributions.iter() {
            let other_paid = other.contributions.get(&account);
            if other_paid.is_none() {
                return false;
            }
            if *paid != *other_paid.unwrap() {
                return false;
            }
        }
        true
    }
}

/// Sale timetable
#[derive(Debug, Serialize, SchemaType, Clone)]
#[cfg_attr(any(feature = "wasm-test", test), derive(PartialEq))]
pub struct SaleSchedule {
    /// Pre-sale window is [presale_start, presale_end)
    pub(crate) presale_start: Timestamp,
    pub(crate) presale_end: Timestamp,
    /// Public sale window is [sale_start, sale_end), split into weekly tiers
    pub(crate) sale_start: Timestamp,
    pub(crate) sale_end: Timestamp,
}

impl SaleSchedule {
    pub fn new(
        now: Timestamp,
        presale_start: Timestamp,
        presale_end: Timestamp,
        sale_start: Timestamp,
        sale_end: Timestamp,
    ) -> Result<Self, CustomContractError> {
        ensure!(now < presale_start, CustomContractError::InvalidSchedule);
        ensure!(presale_start < presale_end, CustomContractError::InvalidSchedule);
        ensure!(presale_end <= sale_start, CustomContractError::InvalidSchedule);
        ensure!(sale_start < sale_end, CustomContractError::InvalidSchedule);

        Ok(SaleSchedule {
            presale_start,
            presale_end,
            sale_start,
            sale_end,
        })
    }

    pub(crate) fn phase(&self, now: Timestamp) -> SalePhase {
        if now < self.presale_start {
            SalePhase::NotStarted
        } else if now < self.presale_end {
            SalePhase::Presale
        } else if now < self.sale_start {
            SalePhase::Gap
        } else if now < self.sale_end {
            let week = (now.timestamp_millis() - self.sale_start.timestamp_millis())
                / Duration::from_days(7).millis();
            match week {
                0 => SalePhase::SaleWeek1,
                1 => SalePhase::SaleWeek2,
                2 => SalePhase::SaleWeek3,
                // a window longer than four weeks stays on the last tier
                _ => SalePhase::SaleWeek4,
            }
        } else {
            SalePhase::Ended
        }
    }

    pub(crate) fn is_ended(&self, now: Timestamp) -> bool {
        self.sale_end <= now
    }

    fn past_sale_end_by(&self, now: Timestamp, days: u64) -> bool {
        match self.sale_end.checked_add(Duration::from_days(days)) {
            Some(at) => at <= now,
            None => false,
        }
    }

    pub(crate) fn transfers_unlocked(&self, now: Timestamp) -> bool {
        self.past_sale_end_by(now, TRANSFER_LOCK_DAYS)
    }

    pub(crate) fn ownership_unlocked(&self, now: Timestamp) -> bool {
        self.past_sale_end_by(now, OWNERSHIP_LOCK_DAYS)
    }

    pub(crate) fn family_unlocked(&self, now: Timestamp) -> bool {
        self.past_sale_end_by(now, FAMILY_LOCK_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_infrastructure::*;
    use sale_utils::{RATE_WEEK1, RATE_WEEK3};

    const DAY: u64 = 24 * 60 * 60 * 1000;
    const WEEK: u64 = 7 * DAY;

    const ADMIN: AccountAddress = AccountAddress([1u8; 32]);
    const TREASURY: AccountAddress = AccountAddress([2u8; 32]);
    const USER: Address = Address::Account(AccountAddress([10u8; 32]));
    const OTHER: Address = Address::Account(AccountAddress([11u8; 32]));

    fn ts(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    /// Pre-sale [1d, 29d), gap, sale [57d, 85d).
    fn schedule() -> SaleSchedule {
        SaleSchedule::new(ts(0), ts(DAY), ts(DAY + 4 * WEEK), ts(DAY + 8 * WEEK), ts(DAY + 12 * WEEK))
            .unwrap()
    }

    #[test]
    fn test_schedule_ordering() {
        let bad = SaleSchedule::new(ts(0), ts(20), ts(10), ts(30), ts(40));
        assert_eq!(bad, Err(CustomContractError::InvalidSchedule));

        let overlapping = SaleSchedule::new(ts(0), ts(10), ts(30), ts(20), ts(40));
        assert_eq!(overlapping, Err(CustomContractError::InvalidSchedule));

        let empty_sale = SaleSchedule::new(ts(0), ts(10), ts(20), ts(30), ts(30));
        assert_eq!(empty_sale, Err(CustomContractError::InvalidSchedule));

        let started_already = SaleSchedule::new(ts(10), ts(10), ts(20), ts(30), ts(40));
        assert_eq!(started_already, Err(CustomContractError::InvalidSchedule));

        // presale may touch the sale directly, without a gap
        let touching = SaleSchedule::new(ts(0), ts(10), ts(20), ts(20), ts(40));
        assert!(touching.is_ok());
    }

    #[test]
    fn test_phase_boundaries() {
        let s = schedule();
        assert_eq!(s.phase(ts(DAY - 1)), SalePhase::NotStarted);
        assert_eq!(s.phase(ts(DAY)), SalePhase::Presale);
        assert_eq!(s.phase(ts(DAY + 4 * WEEK - 1)), SalePhase::Presale);
        assert_eq!(s.phase(ts(DAY + 4 * WEEK)), SalePhase::Gap);
        assert_eq!(s.phase(ts(DAY + 8 * WEEK - 1)), SalePhase::Gap);
        assert_eq!(s.phase(ts(DAY + 8 * WEEK)), SalePhase::SaleWeek1);
        assert_eq!(s.phase(ts(DAY + 9 * WEEK - 1)), SalePhase::SaleWeek1);
        assert_eq!(s.phase(ts(DAY + 9 * WEEK)), SalePhase::SaleWeek2);
        assert_eq!(s.phase(ts(DAY + 10 * WEEK)), SalePhase::SaleWeek3);
        assert_eq!(s.phase(ts(DAY + 11 * WEEK)), SalePhase::SaleWeek4);
        assert_eq!(s.phase(ts(DAY + 12 * WEEK - 1)), SalePhase::SaleWeek4);
        assert_eq!(s.phase(ts(DAY + 12 * WEEK)), SalePhase::Ended);
    }

    #[test]
    fn test_week_rates_differ() {
        let s = schedule();
        let week1 = s.phase(ts(DAY + 8 * WEEK)).rate().unwrap();
        let week3 = s.phase(ts(DAY + 10 * WEEK)).rate().unwrap();
        assert_eq!(week1, RATE_WEEK1);
        assert_eq!(week3, RATE_WEEK3);
        assert_ne!(week1, week3);
    }

    #[test]
    fn test_long_sale_stays_on_week4_tier() {
        // six week sale window
        let s = SaleSchedule::new(ts(0), ts(10), ts(20), ts(WEEK), ts(7 * WEEK)).unwrap();
        assert_eq!(s.phase(ts(WEEK + 5 * WEEK)), SalePhase::SaleWeek4);
        assert_eq!(s.phase(ts(7 * WEEK)), SalePhase::Ended);
    }

    #[test]
    fn test_gate_boundaries() {
        let s = schedule();
        let end = DAY + 12 * WEEK;
        assert!(!s.transfers_unlocked(ts(end + 14 * DAY - 1)));
        assert!(s.transfers_unlocked(ts(end + 14 * DAY)));
        assert!(!s.ownership_unlocked(ts(end + 30 * DAY - 1)));
        assert!(s.ownership_unlocked(ts(end + 30 * DAY)));
        assert!(!s.family_unlocked(ts(end + 180 * DAY - 1)));
        assert!(s.family_unlocked(ts(end + 180 * DAY)));
    }

    fn sum_of_balances<S: HasStateApi>(state: &State<S>) -> u64 {
        state.balances.iter().map(|(_, v)| v.0).sum()
    }

    #[test]
    fn test_genesis_distribution() {
        let mut state_builder = TestStateBuilder::new();
        let state = State::new(&mut state_builder, ADMIN, TREASURY, schedule());

        assert_eq!(
            state.balance_of(&Address::Account(ADMIN)).0,
            TOTAL_SUPPLY - FAMILY_SUPPLY
        );
        assert_eq!(state.balance_of(&Address::Account(LOCK_ACCOUNT)).0, FAMILY_SUPPLY);
        assert_eq!(sum_of_balances(&state), TOTAL_SUPPLY);
        assert!(!state.family_released);
        assert_eq!(state.total_sold.0, 0);
        assert_eq!(state.total_raised, Amount::zero());
    }

    #[test]
    fn test_transfer_coins_checks_balance() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, ADMIN, TREASURY, schedule());

        let err = state.transfer_coins(&USER, &OTHER, 1u64.into());
        assert_eq!(err, Err(ContractError::InsufficientFunds));

        state.transfer_coins(&Address::Account(ADMIN), &USER, 500u64.into()).unwrap();
        state.transfer_coins(&USER, &OTHER, 200u64.into()).unwrap();
        assert_eq!(state.balance_of(&USER).0, 300);
        assert_eq!(state.balance_of(&OTHER).0, 200);
        assert_eq!(sum_of_balances(&state), TOTAL_SUPPLY);
    }

    #[test]
    fn test_allowance_overwrite_and_consume() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, ADMIN, TREASURY, schedule());

        state.set_allowance(&USER, &OTHER, 100u64.into());
        assert_eq!(state.allowance(&USER, &OTHER).0, 100);

        // approve overwrites, it does not add
        state.set_allowance(&USER, &OTHER, 40u64.into());
        assert_eq!(state.allowance(&USER, &OTHER).0, 40);

        let err = state.consume_allowance(&USER, &OTHER, 41u64.into());
        assert_eq!(err, Err(CustomContractError::InsufficientAllowance.into()));
        assert_eq!(state.allowance(&USER, &OTHER).0, 40);

        state.consume_allowance(&USER, &OTHER, 15u64.into()).unwrap();
        assert_eq!(state.allowance(&USER, &OTHER).0, 25);
    }

    #[test]
    fn test_release_family_moves_whole_reserve() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, ADMIN, TREASURY, schedule());

        let released = state.release_family().unwrap();
        assert_eq!(released.0, FAMILY_SUPPLY);
        assert!(state.family_released);
        assert_eq!(state.balance_of(&Address::Account(LOCK_ACCOUNT)).0, 0);
        assert_eq!(state.balance_of(&Address::Account(ADMIN)).0, TOTAL_SUPPLY);
        assert_eq!(sum_of_balances(&state), TOTAL_SUPPLY);
    }

    #[test]
    fn test_contribution_bookkeeping() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, ADMIN, TREASURY, schedule());
        let buyer = AccountAddress([10u8; 32]);

        state.record_contribution(&buyer, Amount::from_micro_ccd(500), 1000u64.into());
        state.record_contribution(&buyer, Amount::from_micro_ccd(300), 600u64.into());
        assert_eq!(state.contribution_of(&buyer), Amount::from_micro_ccd(800));
        assert_eq!(state.total_sold.0, 1600);
        assert_eq!(state.total_raised, Amount::from_micro_ccd(800));

        let taken = state.take_contribution(&buyer);
        assert_eq!(taken, Amount::from_micro_ccd(800));
        assert_eq!(state.contribution_of(&buyer), Amount::zero());
        // a second take finds nothing owed
        assert_eq!(state.take_contribution(&buyer), Amount::zero());
    }
}
