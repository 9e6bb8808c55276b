use crate::{test_infrastructure::*, *};

pub(crate) const ADMIN_ACC: AccountAddress = AccountAddress([1u8; 32]);
pub(crate) const TREASURY_ACC: AccountAddress = AccountAddress([2u8; 32]);
pub(crate) const BUYER_ACC: AccountAddress = AccountAddress([10u8; 32]);
pub(crate) const BUYER2_ACC: AccountAddress = AccountAddress([11u8; 32]);
pub(crate) const RECEIVER_ACC: AccountAddress = AccountAddress([12u8; 32]);

pub(crate) const DAY: u64 = 24 * 60 * 60 * 1000;
pub(crate) const WEEK: u64 = 7 * DAY;

/// Pre-sale [T0, T0+28d), a four week gap, sale [T0+56d, T0+84d).
pub(crate) const T0: u64 = 1_000_000;
pub(crate) const PRESALE_START: u64 = T0;
pub(crate) const PRESALE_END: u64 = T0 + 4 * WEEK;
pub(crate) const SALE_START: u64 = T0 + 8 * WEEK;
pub(crate) const SALE_END: u64 = T0 + 12 * WEEK;

pub(crate) fn ts(millis: u64) -> Timestamp {
    Timestamp::from_timestamp_millis(millis)
}

pub(crate) fn min_contribution() -> Amount {
    Amount::from_micro_ccd(MIN_CONTRIBUTION_MICRO_CCD)
}

pub(crate) fn test_schedule() -> SaleSchedule {
    SaleSchedule::new(
        ts(0),
        ts(PRESALE_START),
        ts(PRESALE_END),
        ts(SALE_START),
        ts(SALE_END),
    )
    .unwrap_abort()
}

pub(crate) fn initial_state<S: HasStateApi>(state_builder: &mut StateBuilder<S>) -> State<S> {
    State::new(state_builder, ADMIN_ACC, TREASURY_ACC, test_schedule())
}

pub(crate) fn new_host() -> TestHost<State<TestStateApi>> {
    let mut state_builder = TestStateBuilder::new();
    let state = initial_state(&mut state_builder);
    TestHost::new(state, state_builder)
}

pub(crate) fn receive_ctx<'a>(sender: AccountAddress, slot_millis: u64) -> TestReceiveContext<'a> {
    let mut ctx = TestReceiveContext::empty();
    ctx.set_self_address(ContractAddress::new(0, 0));
    ctx.set_owner(ADMIN_ACC);
    ctx.set_sender(Address::Account(sender));
    ctx.set_metadata_slot_time(ts(slot_millis));
    ctx
}

/// Drives `buy` the way the chain would: the payment is on the contract
/// balance when the entrypoint runs.
pub(crate) fn call_buy(
    host: &mut TestHost<State<TestStateApi>>,
    buyer: AccountAddress,
    beneficiary: Address,
    value: Amount,
    slot_millis: u64,
) -> (ContractResult<()>, TestLogger) {
    let params_bytes = to_bytes(&beneficiary);
    let mut ctx = receive_ctx(buyer, slot_millis);
    ctx.set_parameter(&params_bytes);
    host.set_self_balance(value);
    let mut logger = TestLogger::init();
    let result = contract_buy(&ctx, host, value, &mut logger);
    (result, logger)
}

pub(crate) fn call_deposit(
    host: &mut TestHost<State<TestStateApi>>,
    sender: AccountAddress,
    value: Amount,
    slot_millis: u64,
) -> (ContractResult<()>, TestLogger) {
    let ctx = receive_ctx(sender, slot_millis);
    host.set_self_balance(value);
    let mut logger = TestLogger::init();
    let result = contract_deposit(&ctx, host, value, &mut logger);
    (result, logger)
}

pub(crate) fn sum_of_balances<S: HasStateApi>(state: &State<S>) -> u64 {
    state.balances.iter().map(|(_, v)| v.0).sum()
}

mod admin;
mod contributor;
mod treasury;

#[concordium_cfg_test]
mod test_init {
    use super::*;

    fn init_parameter() -> InitParams {
        InitParams {
            presale_start: ts(PRESALE_START),
            presale_end: ts(PRESALE_END),
            sale_start: ts(SALE_START),
            sale_end: ts(SALE_END),
            treasury: TREASURY_ACC,
        }
    }

    #[concordium_test]
    fn test_init_distributes_supply() {
        let params_bytes = to_bytes(&init_parameter());
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN_ACC);
        ctx.set_metadata_slot_time(ts(0));
        ctx.set_parameter(&params_bytes);

        let mut state_builder = TestStateBuilder::new();
        let state = contract_init(&ctx, &mut state_builder).expect_report("init should succeed");

        claim_eq!(state.admin, ADMIN_ACC);
        claim_eq!(state.treasury, TREASURY_ACC);
        claim!(!state.family_released);
        claim_eq!(state.total_sold.0, 0);
        claim_eq!(state.total_raised, Amount::zero());
        claim_eq!(
            state.balance_of(&Address::Account(ADMIN_ACC)).0,
            TOTAL_SUPPLY - FAMILY_SUPPLY
        );
        claim_eq!(
            state.balance_of(&Address::Account(LOCK_ACCOUNT)).0,
            FAMILY_SUPPLY
        );
        claim_eq!(sum_of_balances(&state), TOTAL_SUPPLY);
    }

    #[concordium_test]
    fn test_init_rejects_unordered_schedule() {
        // sale starts before the pre-sale ends
        let mut params = init_parameter();
        params.sale_start = ts(PRESALE_END - 1);
        let params_bytes = to_bytes(&params);

        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN_ACC);
        ctx.set_metadata_slot_time(ts(0));
        ctx.set_parameter(&params_bytes);

        let mut state_builder = TestStateBuilder::new();
        let result = contract_init(&ctx, &mut state_builder);
        claim!(result.is_err(), "init must reject an unordered schedule");
    }

    #[concordium_test]
    fn test_init_rejects_started_presale() {
        let params_bytes = to_bytes(&init_parameter());
        let mut ctx = TestInitContext::empty();
        ctx.set_init_origin(ADMIN_ACC);
        ctx.set_metadata_slot_time(ts(PRESALE_START));
        ctx.set_parameter(&params_bytes);

        let mut state_builder = TestStateBuilder::new();
        let result = contract_init(&ctx, &mut state_builder);
        claim!(result.is_err(), "init must reject a schedule already running");
    }
}
