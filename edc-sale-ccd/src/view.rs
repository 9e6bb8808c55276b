use crate::state::{State, *};
use concordium_std::*;

#[derive(Debug, Serialize, SchemaType)]
struct ViewResponse {
    admin: AccountAddress,
    treasury: AccountAddress,
    schedule: SaleSchedule,
    total_sold: CoinAmount,
    total_raised: Amount,
    family_released: bool,
    current_phase: SalePhase,
    current_rate: Option<CoinRate>,
}

#[receive(contract = "edc_sale_ccd", name = "view", return_value = "ViewResponse")]
fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<ViewResponse> {
    let state = host.state();
    let phase = state.schedule.phase(ctx.metadata().slot_time());

    Ok(ViewResponse {
        admin: state.admin,
        treasury: state.treasury,
        schedule: state.schedule.clone(),
        total_sold: state.total_sold,
        total_raised: state.total_raised,
        family_released: state.family_released,
        current_phase: phase,
        current_rate: phase.rate(),
    })
}

// ------------------------------------------

#[receive(
    contract = "edc_sale_ccd",
    name = "totalSupply",
    return_value = "CoinAmount"
)]
fn contract_total_supply<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<CoinAmount> {
    Ok(TOTAL_SUPPLY.into())
}

#[receive(
    contract = "edc_sale_ccd",
    name = "balanceOf",
    parameter = "Address",
    return_value = "CoinAmount"
)]
fn contract_balance_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<CoinAmount> {
    let addr: Address = ctx.parameter_cursor().get()?;
    Ok(host.state().balance_of(&addr))
}

/// Parameter type for the contract function `allowance`.
#[derive(Debug, Serialize, SchemaType)]
pub struct AllowanceParams {
    pub owner: Address,
    pub spender: Address,
}

#[receive(
    contract = "edc_sale_ccd",
    name = "allowance",
    parameter = "AllowanceParams",
    return_value = "CoinAmount"
)]
fn contract_allowance<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<CoinAmount> {
    let params: AllowanceParams = ctx.parameter_cursor().get()?;
    Ok(host.state().allowance(&params.owner, &params.spender))
}

/// The accepted contribution of an account, the amount `claimRefund`
/// would pay back after a soft-cap miss.
#[receive(
    contract = "edc_sale_ccd",
    name = "contributionOf",
    parameter = "AccountAddress",
    return_value = "Amount"
)]
fn contract_contribution_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Amount> {
    let account: AccountAddress = ctx.parameter_cursor().get()?;
    Ok(host.state().contribution_of(&account))
}

// ------------------------------------------

#[receive(
    contract = "edc_sale_ccd",
    name = "currentPhase",
    return_value = "SalePhase"
)]
fn contract_current_phase<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<SalePhase> {
    Ok(host.state().schedule.phase(ctx.metadata().slot_time()))
}

/// The issuance rate right now, `None` while no purchase phase is open.
#[receive(
    contract = "edc_sale_ccd",
    name = "currentRate",
    return_value = "Option<CoinRate>"
)]
fn contract_current_rate<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Option<CoinRate>> {
    Ok(host
        .state()
        .schedule
        .phase(ctx.metadata().slot_time())
        .rate())
}

/// Parameter type for the conversion helpers.
#[derive(Debug, Serialize, SchemaType)]
pub struct ConvertParams {
    pub value: Amount,
    pub rate: CoinRate,
}

#[receive(
    contract = "edc_sale_ccd",
    name = "coinsFromValue",
    parameter = "ConvertParams",
    return_value = "CoinAmount"
)]
fn contract_coins_from_value<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<CoinAmount> {
    let params: ConvertParams = ctx.parameter_cursor().get()?;
    Ok(coins_from_value(params.value, params.rate)?)
}

/// Parameter type for the contract function `valueForCoins`.
#[derive(Debug, Serialize, SchemaType)]
pub struct CoinValueParams {
    pub coins: CoinAmount,
    pub rate: CoinRate,
}

#[receive(
    contract = "edc_sale_ccd",
    name = "valueForCoins",
    parameter = "CoinValueParams",
    return_value = "Amount"
)]
fn contract_value_for_coins<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Amount> {
    let params: CoinValueParams = ctx.parameter_cursor().get()?;
    Ok(value_for_coins(params.coins, params.rate)?)
}
